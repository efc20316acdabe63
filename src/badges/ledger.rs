//! Viewed/unread ledger: which records the current user has opened.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::RecordApi;
use crate::config::WriteMode;
use crate::errors::EngineResult;

#[derive(Debug, Default)]
struct LedgerState {
    viewed: HashSet<String>,
    /// record id -> durable view-event id, for server-side dedup.
    event_ids: HashMap<String, String>,
}

/// Session-scoped viewed-record bookkeeping.
///
/// The in-memory set is a monotonically growing superset of durable state
/// within a session; nothing removes entries except [`Self::reset`] at
/// logout (and a strict-mode write failure rolling back its own mark).
/// Check-then-act happens entirely inside one lock acquisition with no
/// await, so rapid repeated calls cannot double-write.
#[derive(Clone)]
pub struct ViewedLedger {
    api: Arc<dyn RecordApi>,
    state: Arc<Mutex<LedgerState>>,
    write_mode: WriteMode,
}

impl ViewedLedger {
    pub fn new(api: Arc<dyn RecordApi>, write_mode: WriteMode) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(LedgerState::default())),
            write_mode,
        }
    }

    /// Populate the viewed set from durable storage. Failures degrade to
    /// "nothing viewed yet": more unread badges, never hidden data.
    pub async fn load(&self) {
        {
            let mut state = self.lock();
            state.viewed.clear();
            state.event_ids.clear();
        }
        match self.api.list_viewed_events().await {
            Ok(events) => {
                let mut state = self.lock();
                for event in events {
                    if event.record_id.is_empty() {
                        continue;
                    }
                    state
                        .event_ids
                        .insert(event.record_id.clone(), event.event_id);
                    state.viewed.insert(event.record_id);
                }
                tracing::debug!(count = state.viewed.len(), "loaded viewed records");
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load viewed records");
            }
        }
    }

    /// Mark a record viewed. Idempotent: returns `Ok(false)` when already
    /// viewed, with no duplicate durable write.
    ///
    /// The in-memory mark lands before any await, so immediately-subsequent
    /// [`Self::is_viewed`] checks are consistent. In `Optimistic` mode the
    /// durable write is fire-and-forget; in `Strict` mode it is awaited and
    /// a failure rolls the mark back.
    pub async fn mark_viewed(&self, record_id: &str, form_id: &str) -> EngineResult<bool> {
        if record_id.is_empty() {
            return Ok(false);
        }
        {
            let mut state = self.lock();
            if !state.viewed.insert(record_id.to_string()) {
                return Ok(false);
            }
        }

        match self.write_mode {
            WriteMode::Optimistic => {
                let ledger = self.clone();
                let record_id = record_id.to_string();
                let form_id = form_id.to_string();
                tokio::spawn(async move {
                    match ledger.api.create_viewed_event(&record_id, &form_id).await {
                        Ok(event_id) => {
                            ledger.lock().event_ids.insert(record_id, event_id);
                        }
                        Err(err) => {
                            tracing::warn!(
                                record_id = %record_id,
                                error = %err,
                                "failed to persist view event"
                            );
                        }
                    }
                });
                Ok(true)
            }
            WriteMode::Strict => {
                match self.api.create_viewed_event(record_id, form_id).await {
                    Ok(event_id) => {
                        self.lock()
                            .event_ids
                            .insert(record_id.to_string(), event_id);
                        Ok(true)
                    }
                    Err(err) => {
                        // Roll the mark back so a retry can re-issue the write.
                        self.lock().viewed.remove(record_id);
                        Err(err)
                    }
                }
            }
        }
    }

    /// Record a view in memory only, with no durable write. Used when the
    /// creator of a new record implicitly counts as having seen it.
    pub(crate) fn mark_local(&self, record_id: &str) {
        if !record_id.is_empty() {
            self.lock().viewed.insert(record_id.to_string());
        }
    }

    pub fn is_viewed(&self, record_id: &str) -> bool {
        self.lock().viewed.contains(record_id)
    }

    pub fn viewed_snapshot(&self) -> HashSet<String> {
        self.lock().viewed.clone()
    }

    pub fn viewed_count(&self) -> usize {
        self.lock().viewed.len()
    }

    /// The durable event id recorded for a viewed record, when known.
    pub fn event_id_for(&self, record_id: &str) -> Option<String> {
        self.lock().event_ids.get(record_id).cloned()
    }

    /// Drop all state. Called at logout.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.viewed.clear();
        state.event_ids.clear();
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().expect("viewed ledger lock poisoned")
    }
}
