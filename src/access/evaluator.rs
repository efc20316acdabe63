//! CRUD permission evaluation.
//!
//! Evaluation order:
//! 1. admin override -> full matrix, unconditionally
//! 2. role-based pass over the form's submission access rules
//! 3. group-based pass over resource-membership rules
//! 4. grant per (action, scope) pair = role pass OR group pass
//!
//! Pure and total: malformed rules are treated as non-matching, never as
//! errors.

use std::collections::HashSet;

use crate::models::form::{AccessType, FormDefinition};
use crate::models::user::User;
use crate::utils;

/// The eight-way CRUD-by-scope decision for one (user, form) pair.
///
/// Not persisted; recomputed per request. Deterministic for fixed inputs,
/// so callers may memoize by (user id, form id, admin flag) within a render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionMatrix {
    pub create_all: bool,
    pub create_own: bool,
    pub read_all: bool,
    pub read_own: bool,
    pub update_all: bool,
    pub update_own: bool,
    pub delete_all: bool,
    pub delete_own: bool,
}

impl PermissionMatrix {
    /// The administrator matrix: every pair granted.
    pub fn all_granted() -> Self {
        Self {
            create_all: true,
            create_own: true,
            read_all: true,
            read_own: true,
            update_all: true,
            update_own: true,
            delete_all: true,
            delete_own: true,
        }
    }

    pub fn allows(&self, access: AccessType) -> bool {
        match access {
            AccessType::CreateAll => self.create_all,
            AccessType::CreateOwn => self.create_own,
            AccessType::ReadAll => self.read_all,
            AccessType::ReadOwn => self.read_own,
            AccessType::UpdateAll => self.update_all,
            AccessType::UpdateOwn => self.update_own,
            AccessType::DeleteAll => self.delete_all,
            AccessType::DeleteOwn => self.delete_own,
        }
    }

    fn grant(&mut self, access: AccessType) {
        match access {
            AccessType::CreateAll => self.create_all = true,
            AccessType::CreateOwn => self.create_own = true,
            AccessType::ReadAll => self.read_all = true,
            AccessType::ReadOwn => self.read_own = true,
            AccessType::UpdateAll => self.update_all = true,
            AccessType::UpdateOwn => self.update_own = true,
            AccessType::DeleteAll => self.delete_all = true,
            AccessType::DeleteOwn => self.delete_own = true,
        }
    }

    /// Any read access at all; list fetches short-circuit on `false`.
    pub fn any_read(&self) -> bool {
        self.read_all || self.read_own
    }

    /// Own-scope read without read-all; such readers get owner-scoped
    /// queries.
    pub fn own_only_read(&self) -> bool {
        self.read_own && !self.read_all
    }
}

/// Compute the permission matrix for a user on a form.
pub fn evaluate(user: &User, form: &FormDefinition, is_admin: bool) -> PermissionMatrix {
    if is_admin {
        tracing::debug!(user_id = %user.id, form_id = %form.id, "admin override, full matrix");
        return PermissionMatrix::all_granted();
    }

    let group_granted = group_grants(user, form);

    let mut matrix = PermissionMatrix::default();
    for access in AccessType::ALL {
        if role_grants(user, form, access) || group_granted.contains(&access) {
            matrix.grant(access);
        }
    }
    matrix
}

fn role_grants(user: &User, form: &FormDefinition, access: AccessType) -> bool {
    form.submission_rules().iter().any(|rule| {
        rule.access_type() == Some(access) && !rule.roles.is_disjoint(&user.role_ids)
    })
}

/// Access types granted through resource membership: for each rule, scan
/// the profile fields it names (or the default departments/committees) for
/// a value referencing the rule's resource record; members union the rule's
/// granted types.
fn group_grants(user: &User, form: &FormDefinition) -> HashSet<AccessType> {
    let mut granted = HashSet::new();
    for rule in &form.settings.group_permissions {
        if rule.resource_submission_id.is_empty() {
            continue;
        }
        let belongs = rule.membership_fields_or_default().iter().any(|field| {
            user.profile
                .get(*field)
                .is_some_and(|value| utils::contains_id(value, &rule.resource_submission_id))
        });
        if belongs {
            tracing::debug!(
                user_id = %user.id,
                resource = %rule.resource_submission_id,
                "group membership grant"
            );
            granted.extend(rule.granted());
        }
    }
    granted
}
