//! The record-API seam. The engine consumes a generic role/form/record API
//! implemented by the host over its own transport; nothing here performs
//! network I/O.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::evaluator::PermissionMatrix;
use crate::errors::EngineResult;
use crate::models::form::FormDefinition;
use crate::models::record::Record;
use crate::models::role::Role;
use crate::models::user::User;

/// Query parameters for record listing and counting — the subset of the
/// platform's list API the engine relies on.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordQuery {
    pub limit: Option<u64>,
    pub sort: Option<String>,
    /// Restrict to records owned by this user id.
    pub owner: Option<String>,
    /// Field projection; empty means full payloads.
    pub select: Vec<String>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add the owner filter exactly when the matrix grants own-scope read
    /// but not read-all.
    pub fn scoped_by_ownership(mut self, matrix: &PermissionMatrix, user: &User) -> Self {
        if matrix.own_only_read() {
            self.owner = Some(user.id.clone());
        }
        self
    }
}

/// A persisted view event: the current user has opened this record before.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewedEvent {
    pub record_id: String,
    pub event_id: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl ViewedEvent {
    pub fn new(record_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            event_id: event_id.into(),
            created: None,
        }
    }
}

/// The generic record API the engine is built over.
///
/// Implementations map transport failures onto
/// [`EngineError`](crate::errors::EngineError) variants; the 401/403-class
/// variants matter for the role directory's fallback behavior.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// All role definitions for the active project.
    async fn list_roles(&self) -> EngineResult<Vec<Role>>;

    /// Full form definition including the component tree (navigation
    /// payloads omit components).
    async fn fetch_form(&self, path: &str) -> EngineResult<FormDefinition>;

    async fn list_records(&self, path: &str, query: &RecordQuery) -> EngineResult<Vec<Record>>;

    /// Count-only variant; implementations should answer from a range/count
    /// header rather than transferring payloads.
    async fn count_records(&self, path: &str, query: &RecordQuery) -> EngineResult<u64>;

    /// Persist a view event for the current user. Returns the durable event
    /// id. Callers avoid duplicate writes; the API need not reject them.
    async fn create_viewed_event(&self, record_id: &str, form_id: &str) -> EngineResult<String>;

    /// All view events recorded for the current user.
    async fn list_viewed_events(&self) -> EngineResult<Vec<ViewedEvent>>;
}
