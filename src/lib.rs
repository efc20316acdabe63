//! formgate — access & visibility engine for a form-platform admin client.
//!
//! Pure decision functions (the CRUD permission matrix, per-record share
//! visibility, row gating) plus session-scoped viewed/unread and
//! badge-count bookkeeping, built over a host-implemented record API.
//! Permission and visibility denials are normal outcomes, never errors;
//! only transport-level failures surface, and only as degraded-tooling
//! advisories.

pub mod access;
pub mod api;
pub mod badges;
pub mod config;
pub mod errors;
pub mod models;
pub mod session;
pub mod utils;

pub use access::directory::{AdminCheck, RoleDirectory};
pub use access::evaluator::{evaluate, PermissionMatrix};
pub use access::visibility::{can_see_row, filter_visible, is_record_visible};
pub use api::{RecordApi, RecordQuery, ViewedEvent};
pub use badges::counts::{BadgeAggregator, BadgeCount, CategoryTotals};
pub use badges::ledger::ViewedLedger;
pub use config::{EngineConfig, WriteMode};
pub use errors::{EngineError, EngineResult};
pub use models::form::{AccessRule, AccessType, FormDefinition, FormSettings, GroupPermissionRule};
pub use models::record::Record;
pub use models::role::{apply_role_flags, Role, RoleIndex};
pub use models::user::User;
pub use session::SessionState;
