//! In-memory `RecordApi` used by the integration tests: seeded fixtures,
//! per-endpoint failure injection, and call counters.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use formgate::{
    EngineError, EngineResult, FormDefinition, Record, RecordApi, RecordQuery, Role, ViewedEvent,
};

/// Which error class an injected failure produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Unauthorized,
    Forbidden,
    Transport,
}

impl Failure {
    fn to_error(self, what: &str) -> EngineError {
        match self {
            Failure::Unauthorized => EngineError::unauthorized(what),
            Failure::Forbidden => EngineError::forbidden(what),
            Failure::Transport => EngineError::transport(what),
        }
    }
}

#[derive(Default)]
pub struct MockApi {
    roles: Mutex<Vec<Role>>,
    forms: Mutex<HashMap<String, FormDefinition>>,
    records: Mutex<HashMap<String, Vec<Record>>>,
    viewed_events: Mutex<Vec<ViewedEvent>>,

    pub role_failure: Mutex<Option<Failure>>,
    /// Paths whose list/count calls fail with a transport error.
    pub failing_paths: Mutex<HashSet<String>>,
    pub viewed_write_failure: Mutex<bool>,
    pub viewed_load_failure: Mutex<bool>,

    pub role_calls: AtomicUsize,
    pub form_fetch_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub count_calls: AtomicUsize,
    pub viewed_writes: AtomicUsize,

    /// Owner filter seen on the most recent list/count call, per path.
    pub last_owner: Mutex<HashMap<String, Option<String>>>,

    next_event_id: AtomicUsize,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_roles(&self, roles: Vec<Role>) {
        *self.roles.lock().unwrap() = roles;
    }

    pub fn add_form(&self, form: FormDefinition) {
        self.forms.lock().unwrap().insert(form.path.clone(), form);
    }

    pub fn add_records(&self, path: &str, records: Vec<Record>) {
        self.records.lock().unwrap().insert(path.to_string(), records);
    }

    pub fn seed_viewed(&self, record_id: &str, event_id: &str) {
        self.viewed_events
            .lock()
            .unwrap()
            .push(ViewedEvent::new(record_id, event_id));
    }

    pub fn fail_roles(&self, failure: Failure) {
        *self.role_failure.lock().unwrap() = Some(failure);
    }

    pub fn fail_path(&self, path: &str) {
        self.failing_paths.lock().unwrap().insert(path.to_string());
    }

    pub fn fail_viewed_writes(&self, fail: bool) {
        *self.viewed_write_failure.lock().unwrap() = fail;
    }

    pub fn fail_viewed_load(&self, fail: bool) {
        *self.viewed_load_failure.lock().unwrap() = fail;
    }

    pub fn viewed_event_count(&self) -> usize {
        self.viewed_events.lock().unwrap().len()
    }

    pub fn last_owner_for(&self, path: &str) -> Option<String> {
        self.last_owner
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .flatten()
    }

    fn filtered_records(&self, path: &str, query: &RecordQuery) -> Vec<Record> {
        let records = self.records.lock().unwrap();
        records
            .get(path)
            .map(|all| {
                all.iter()
                    .filter(|record| match &query.owner {
                        Some(owner) => record.owner.as_deref() == Some(owner.as_str()),
                        None => true,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn note_owner(&self, path: &str, query: &RecordQuery) {
        self.last_owner
            .lock()
            .unwrap()
            .insert(path.to_string(), query.owner.clone());
    }
}

#[async_trait]
impl RecordApi for MockApi {
    async fn list_roles(&self) -> EngineResult<Vec<Role>> {
        self.role_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.role_failure.lock().unwrap() {
            return Err(failure.to_error("role endpoint"));
        }
        Ok(self.roles.lock().unwrap().clone())
    }

    async fn fetch_form(&self, path: &str) -> EngineResult<FormDefinition> {
        self.form_fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.forms
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("form {path}")))
    }

    async fn list_records(&self, path: &str, query: &RecordQuery) -> EngineResult<Vec<Record>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.note_owner(path, query);
        if self.failing_paths.lock().unwrap().contains(path) {
            return Err(EngineError::transport(format!("list {path}")));
        }
        Ok(self.filtered_records(path, query))
    }

    async fn count_records(&self, path: &str, query: &RecordQuery) -> EngineResult<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.note_owner(path, query);
        if self.failing_paths.lock().unwrap().contains(path) {
            return Err(EngineError::transport(format!("count {path}")));
        }
        Ok(self.filtered_records(path, query).len() as u64)
    }

    async fn create_viewed_event(&self, record_id: &str, _form_id: &str) -> EngineResult<String> {
        self.viewed_writes.fetch_add(1, Ordering::SeqCst);
        if *self.viewed_write_failure.lock().unwrap() {
            return Err(EngineError::transport("viewed event write"));
        }
        let event_id = format!("ev{}", self.next_event_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.viewed_events
            .lock()
            .unwrap()
            .push(ViewedEvent::new(record_id, event_id.clone()));
        Ok(event_id)
    }

    async fn list_viewed_events(&self) -> EngineResult<Vec<ViewedEvent>> {
        if *self.viewed_load_failure.lock().unwrap() {
            return Err(EngineError::transport("viewed event list"));
        }
        Ok(self.viewed_events.lock().unwrap().clone())
    }
}

/// Drive queued background tasks (optimistic ledger writes) to completion
/// on the current-thread test runtime.
pub async fn drain_background_tasks() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
