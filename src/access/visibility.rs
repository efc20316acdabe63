//! Per-record share visibility and the row access gate.
//!
//! Decision order for one record, first match wins:
//! 1. admin
//! 2. owner
//! 3. form declares no share panel -> visible (the coarse matrix already
//!    governed list-level access upstream)
//! 4. `sharePublic`
//! 5. `shareRoles` intersects the user's roles
//! 6. `shareDepartments` intersects the user's departments
//! 7. `shareCommittees` intersects the user's committees
//! 8. `shareUsers` contains the user
//! 9. otherwise private to owner and admins

use crate::models::form::FormDefinition;
use crate::models::record::Record;
use crate::models::user::User;
use crate::utils;

/// Whether one record is visible to a user, independent of the coarse
/// form-level permission matrix.
pub fn is_record_visible(
    user: &User,
    record: &Record,
    form: &FormDefinition,
    is_admin: bool,
) -> bool {
    is_record_visible_with_panel(user, record, form.has_share_panel(), is_admin)
}

/// Core decision with the share-panel flag precomputed; the session layer
/// feeds this from its per-form cache.
pub(crate) fn is_record_visible_with_panel(
    user: &User,
    record: &Record,
    has_share_panel: bool,
    is_admin: bool,
) -> bool {
    if is_admin {
        return true;
    }
    if is_owner(user, record) {
        return true;
    }
    if !has_share_panel {
        return true;
    }
    share_criteria_match(user, record)
}

pub(crate) fn is_owner(user: &User, record: &Record) -> bool {
    !user.id.is_empty() && record.owner.as_deref() == Some(user.id.as_str())
}

fn share_criteria_match(user: &User, record: &Record) -> bool {
    if record.share_public() {
        return true;
    }

    let share_roles = record.share_roles();
    if !share_roles.is_empty() && share_roles.iter().any(|role| user.role_ids.contains(*role)) {
        return true;
    }

    let share_departments = record.share_departments();
    if !share_departments.is_empty()
        && utils::sets_overlap(&user.membership_ids("departments"), &share_departments)
    {
        return true;
    }

    let share_committees = record.share_committees();
    if !share_committees.is_empty()
        && utils::sets_overlap(&user.membership_ids("committees"), &share_committees)
    {
        return true;
    }

    let share_users = record.share_users();
    if !share_users.is_empty() && !user.id.is_empty() && share_users.contains(user.id.as_str()) {
        return true;
    }

    tracing::debug!(user_id = %user.id, record_id = %record.id, "no share criterion matched");
    false
}

/// List-filtering gate: admins, owners, and share-visible records pass.
///
/// Deliberately separate from the permission matrix: the matrix governs
/// form-level and bulk operations, this gate governs one row in a filtered
/// list. Callers compose both.
pub fn can_see_row(user: &User, record: &Record, form: &FormDefinition, is_admin: bool) -> bool {
    is_admin || is_owner(user, record) || is_record_visible(user, record, form, is_admin)
}

/// Filter a fetched record list down to the rows the user may see.
pub fn filter_visible(
    user: &User,
    records: Vec<Record>,
    form: &FormDefinition,
    is_admin: bool,
) -> Vec<Record> {
    let has_panel = form.has_share_panel();
    records
        .into_iter()
        .filter(|record| is_record_visible_with_panel(user, record, has_panel, is_admin))
        .collect()
}
