//! Access decisions.
//!
//! Three layers, deliberately separate:
//! - [`directory`]: the cached role list and the administrator check
//! - [`evaluator`]: the coarse CRUD-by-scope permission matrix per form
//! - [`visibility`]: per-record share visibility and the row access gate
//!
//! The evaluator governs "can the user use this form at all"; the row gate
//! governs "is this one row shown in a filtered list". Callers compose the
//! two rather than conflating them.

pub mod directory;
pub mod evaluator;
pub mod visibility;

pub use directory::{AdminCheck, RoleDirectory};
pub use evaluator::{evaluate, PermissionMatrix};
pub use visibility::{can_see_row, filter_visible, is_record_visible};
