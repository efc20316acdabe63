//! Session-scoped state: one owner for every cache the engine keeps.
//!
//! The role cache, viewed set, badge map, and share-panel cache all live
//! here rather than in module-level globals, with a `new`/`reset` lifecycle
//! tied to login/logout so nothing leaks across sessions (or across tests).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::access::directory::{AdminCheck, RoleDirectory};
use crate::access::visibility;
use crate::api::RecordApi;
use crate::badges::counts::BadgeAggregator;
use crate::badges::ledger::ViewedLedger;
use crate::config::EngineConfig;
use crate::errors::EngineResult;
use crate::models::form::FormDefinition;
use crate::models::record::Record;
use crate::models::user::User;

pub struct SessionState {
    config: EngineConfig,
    roles: RoleDirectory,
    ledger: ViewedLedger,
    badges: BadgeAggregator,
    share_panels: Mutex<HashMap<String, bool>>,
}

impl SessionState {
    pub fn new(api: Arc<dyn RecordApi>, config: EngineConfig) -> Self {
        let roles = RoleDirectory::new(Arc::clone(&api), &config);
        let ledger = ViewedLedger::new(Arc::clone(&api), config.write_mode);
        let badges = BadgeAggregator::new(api, ledger.clone(), &config);
        Self {
            config,
            roles,
            ledger,
            badges,
            share_panels: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn roles(&self) -> &RoleDirectory {
        &self.roles
    }

    pub fn ledger(&self) -> &ViewedLedger {
        &self.ledger
    }

    pub fn badges(&self) -> &BadgeAggregator {
        &self.badges
    }

    pub async fn is_administrator(&self, user: &User) -> AdminCheck {
        self.roles.is_administrator(user).await
    }

    /// Share-panel detection, cached per form id — a form's shape does not
    /// change within a session. Payloads without a component tree are not
    /// cached (they cannot answer the question) and report no panel, the
    /// same pass-through the visibility filter applies.
    pub fn has_share_panel(&self, form: &FormDefinition) -> bool {
        if !form.has_components() {
            return false;
        }
        if form.id.is_empty() {
            return form.has_share_panel();
        }
        let mut cache = self.share_panel_cache();
        if let Some(&cached) = cache.get(&form.id) {
            return cached;
        }
        let found = form.has_share_panel();
        cache.insert(form.id.clone(), found);
        found
    }

    /// Row access gate over the cached share-panel detection.
    pub fn can_see_row(
        &self,
        user: &User,
        record: &Record,
        form: &FormDefinition,
        is_admin: bool,
    ) -> bool {
        is_admin
            || visibility::is_owner(user, record)
            || visibility::is_record_visible_with_panel(
                user,
                record,
                self.has_share_panel(form),
                is_admin,
            )
    }

    /// Filter a fetched record list down to the rows the user may see.
    pub fn filter_visible(
        &self,
        user: &User,
        records: Vec<Record>,
        form: &FormDefinition,
        is_admin: bool,
    ) -> Vec<Record> {
        let has_panel = self.has_share_panel(form);
        records
            .into_iter()
            .filter(|record| {
                visibility::is_record_visible_with_panel(user, record, has_panel, is_admin)
            })
            .collect()
    }

    /// Mark a record viewed through the ledger and update its badge.
    pub async fn record_viewed(&self, form_id: &str, record_id: &str) {
        self.badges.on_viewed(form_id, record_id).await;
    }

    /// Direct ledger mark, for callers that manage badges themselves.
    pub async fn mark_viewed(&self, record_id: &str, form_id: &str) -> EngineResult<bool> {
        self.ledger.mark_viewed(record_id, form_id).await
    }

    /// Clear every session cache. Call at logout; the next login starts
    /// from a clean slate.
    pub fn reset(&self) {
        self.roles.clear_cache();
        self.ledger.reset();
        self.badges.reset();
        self.share_panel_cache().clear();
    }

    fn share_panel_cache(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        self.share_panels
            .lock()
            .expect("share panel cache lock poisoned")
    }
}
