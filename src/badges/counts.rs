//! Badge aggregation: per-form and per-category total/unread counts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinSet;

use crate::access::{evaluator, visibility};
use crate::api::{RecordApi, RecordQuery};
use crate::config::EngineConfig;
use crate::errors::EngineResult;
use crate::models::form::FormDefinition;
use crate::models::user::User;

use super::ledger::ViewedLedger;

/// Derived badge numbers for one form. Not stored durably; recomputed in
/// full at session start and maintained incrementally after mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeCount {
    pub total: u64,
    pub unread: u64,
    /// Ids backing the count, when known (share-filtered or id-list paths).
    pub member_ids: Vec<String>,
}

impl BadgeCount {
    pub fn new(total: u64, unread: u64) -> Self {
        Self {
            total,
            unread,
            member_ids: Vec::new(),
        }
    }
}

/// Aggregate totals across a category (tag group) of forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryTotals {
    pub total: u64,
    pub unread: u64,
}

/// Projection of the share-relevant fields, kept minimal so candidate-row
/// fetches stay cheap.
const SHARE_FIELDS_SELECT: [&str; 7] = [
    "_id",
    "owner",
    "data.sharePublic",
    "data.shareRoles",
    "data.shareDepartments",
    "data.shareCommittees",
    "data.shareUsers",
];

/// What a per-form fetch produced; unread is derived afterwards against the
/// ledger so the fetch itself stays side-effect free.
struct FetchedCounts {
    total: u64,
    member_ids: Vec<String>,
}

pub struct BadgeAggregator {
    api: Arc<dyn RecordApi>,
    ledger: ViewedLedger,
    counts: Mutex<HashMap<String, BadgeCount>>,
    initialized: AtomicBool,
    /// Bumped by `reset`; in-flight initializations compare against their
    /// starting value and discard stale completions.
    generation: AtomicU64,
    batch_size: usize,
    list_limit: u64,
}

impl BadgeAggregator {
    pub fn new(api: Arc<dyn RecordApi>, ledger: ViewedLedger, config: &EngineConfig) -> Self {
        Self {
            api,
            ledger,
            counts: Mutex::new(HashMap::new()),
            initialized: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            batch_size: config.badge_batch_size.max(1),
            list_limit: config.list_limit,
        }
    }

    /// Compute counts for every badge-bearing form.
    ///
    /// Per-form fetches run in bounded batches; one form's failure is
    /// logged and isolated, leaving that form's badge at its last-known (or
    /// absent) value. A second call without an intervening [`Self::reset`]
    /// is a cheap no-op over the cached counts. Never returns an error:
    /// badge failures are cosmetic.
    pub async fn init_counts(&self, forms: &[FormDefinition], user: &User, is_admin: bool) {
        if self.initialized.load(Ordering::SeqCst) {
            return;
        }
        let generation = self.generation.load(Ordering::SeqCst);

        self.ledger.load().await;

        let forms: Vec<FormDefinition> = forms
            .iter()
            .filter(|form| !form.hide_badges())
            .cloned()
            .collect();

        for chunk in forms.chunks(self.batch_size) {
            let mut tasks: JoinSet<(String, EngineResult<FetchedCounts>)> = JoinSet::new();
            for form in chunk {
                let api = Arc::clone(&self.api);
                let form = form.clone();
                let user = user.clone();
                let list_limit = self.list_limit;
                tasks.spawn(async move {
                    let form_id = form.id.clone();
                    let fetched =
                        fetch_form_counts(api.as_ref(), &form, &user, is_admin, list_limit).await;
                    (form_id, fetched)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((form_id, Ok(fetched))) => {
                        if self.generation.load(Ordering::SeqCst) != generation {
                            tracing::debug!("discarding stale badge counts after session reset");
                            return;
                        }
                        self.apply_fetched(form_id, fetched);
                    }
                    Ok((form_id, Err(err))) => {
                        tracing::warn!(form_id = %form_id, error = %err, "badge count fetch failed");
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "badge count task failed to run");
                    }
                }
            }
        }

        if self.generation.load(Ordering::SeqCst) == generation {
            self.initialized.store(true, Ordering::SeqCst);
        }
    }

    fn apply_fetched(&self, form_id: String, fetched: FetchedCounts) {
        let viewed = self.ledger.viewed_snapshot();
        let unread = fetched
            .member_ids
            .iter()
            .filter(|id| !viewed.contains(*id))
            .count() as u64;
        self.counts_map().insert(
            form_id,
            BadgeCount {
                total: fetched.total,
                unread,
                member_ids: fetched.member_ids,
            },
        );
    }

    /// Record created: total grows and the creator implicitly has seen
    /// their own submission, so unread stays flat.
    pub fn increment_on_create(&self, form_id: &str, record_id: &str) {
        let mut counts = self.counts_map();
        let Some(entry) = counts.get_mut(form_id) else {
            return;
        };
        entry.total += 1;
        if !record_id.is_empty() {
            entry.member_ids.push(record_id.to_string());
            self.ledger.mark_local(record_id);
        }
    }

    /// Record deleted: total shrinks (floored at zero); unread only drops
    /// when the record was still unread.
    pub fn decrement_on_delete(&self, form_id: &str, record_id: &str) {
        let mut counts = self.counts_map();
        let Some(entry) = counts.get_mut(form_id) else {
            return;
        };
        entry.total = entry.total.saturating_sub(1);
        if !record_id.is_empty() {
            entry.member_ids.retain(|id| id != record_id);
            if !self.ledger.is_viewed(record_id) {
                entry.unread = entry.unread.saturating_sub(1);
            }
        }
    }

    /// Record opened: a first view decrements unread and records the view
    /// through the ledger (which persists it per its write mode).
    pub async fn on_viewed(&self, form_id: &str, record_id: &str) {
        if form_id.is_empty() || record_id.is_empty() {
            return;
        }
        match self.ledger.mark_viewed(record_id, form_id).await {
            Ok(true) => {
                let mut counts = self.counts_map();
                if let Some(entry) = counts.get_mut(form_id) {
                    entry.unread = entry.unread.saturating_sub(1);
                }
            }
            Ok(false) => {}
            Err(err) => {
                // Strict-mode write failure: the mark was rolled back, so
                // the badge stays unread.
                tracing::warn!(record_id = %record_id, error = %err, "view event write failed");
            }
        }
    }

    /// Current counts for one form.
    pub fn counts_for(&self, form_id: &str) -> Option<BadgeCount> {
        self.counts_map().get(form_id).cloned()
    }

    /// Sum per-form counts across a category's forms. Computed on demand;
    /// the per-form map stays the single source of truth.
    pub fn category_totals<I, S>(&self, form_ids: I) -> CategoryTotals
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let counts = self.counts_map();
        let mut totals = CategoryTotals::default();
        for form_id in form_ids {
            if let Some(entry) = counts.get(form_id.as_ref()) {
                totals.total += entry.total;
                totals.unread += entry.unread;
            }
        }
        totals
    }

    /// Seed last-known counts for a form, e.g. restored by the host from a
    /// previous session. Also marks nothing viewed; the ledger is separate.
    pub fn seed_counts(&self, form_id: impl Into<String>, counts: BadgeCount) {
        self.counts_map().insert(form_id.into(), counts);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Drop all counts and invalidate any in-flight initialization. Called
    /// at logout.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.initialized.store(false, Ordering::SeqCst);
        self.counts_map().clear();
    }

    fn counts_map(&self) -> MutexGuard<'_, HashMap<String, BadgeCount>> {
        self.counts.lock().expect("badge counts lock poisoned")
    }
}

/// Per-form count fetch. Share-panel forms pull the share-relevant fields
/// and apply the row gate client-side, so the badge matches what the list
/// view will actually show; plain forms use the count-only endpoint plus an
/// id-list fetch for unread bookkeeping.
async fn fetch_form_counts(
    api: &dyn RecordApi,
    form: &FormDefinition,
    user: &User,
    is_admin: bool,
    list_limit: u64,
) -> EngineResult<FetchedCounts> {
    let path = form.path.trim_start_matches('/');
    let matrix = evaluator::evaluate(user, form, is_admin);
    if !matrix.any_read() {
        return Ok(FetchedCounts {
            total: 0,
            member_ids: Vec::new(),
        });
    }

    // Navigation payloads omit components; fetch the full definition before
    // probing for the share panel.
    let mut full_form = None;
    if !form.has_components() {
        match api.fetch_form(path).await {
            Ok(fetched) => full_form = Some(fetched),
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "could not fetch form definition");
            }
        }
    }
    let form_def = full_form.as_ref().unwrap_or(form);

    if form_def.has_share_panel() {
        let query = RecordQuery::new()
            .with_limit(list_limit)
            .with_select(SHARE_FIELDS_SELECT)
            .scoped_by_ownership(&matrix, user);
        let records = api.list_records(path, &query).await?;
        let visible = visibility::filter_visible(user, records, form_def, is_admin);
        let member_ids: Vec<String> = visible.into_iter().map(|record| record.id).collect();
        Ok(FetchedCounts {
            total: member_ids.len() as u64,
            member_ids,
        })
    } else {
        let count_query = RecordQuery::new()
            .with_limit(1)
            .with_select(["_id"])
            .scoped_by_ownership(&matrix, user);
        let total = api.count_records(path, &count_query).await?;

        let mut member_ids = Vec::new();
        if total > 0 {
            let id_query = RecordQuery::new()
                .with_limit(list_limit)
                .with_select(["_id"])
                .scoped_by_ownership(&matrix, user);
            match api.list_records(path, &id_query).await {
                Ok(records) => {
                    member_ids = records
                        .into_iter()
                        .map(|record| record.id)
                        .filter(|id| !id.is_empty())
                        .collect();
                }
                Err(err) => {
                    tracing::warn!(path = %path, error = %err, "could not fetch ids for unread count");
                }
            }
        }
        Ok(FetchedCounts { total, member_ids })
    }
}
