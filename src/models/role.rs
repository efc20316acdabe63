use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

// =============================================================================
// ROLE
// =============================================================================

/// A project role as returned by the platform's role endpoint. Immutable
/// once fetched; the [`RoleDirectory`](crate::access::directory::RoleDirectory)
/// owns caching and invalidation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(rename = "machineName")]
    pub machine_name: String,
    /// Members of any role with this flag bypass all scoping.
    pub admin: bool,
    #[serde(rename = "default")]
    pub is_default: bool,
}

impl Role {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_machine_name(mut self, machine_name: impl Into<String>) -> Self {
        self.machine_name = machine_name.into();
        self
    }

    pub fn as_admin(mut self) -> Self {
        self.admin = true;
        self
    }
}

// =============================================================================
// ROLE INDEX
// =============================================================================

/// Lookup maps over a fetched role list: by id and by lowercased machine
/// name (falling back to the title when a role has no machine name).
#[derive(Debug, Clone, Default)]
pub struct RoleIndex {
    by_id: HashMap<String, Role>,
    by_machine_name: HashMap<String, String>,
}

impl RoleIndex {
    pub fn build(roles: &[Role]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_machine_name = HashMap::new();
        for role in roles {
            if role.id.is_empty() {
                continue;
            }
            let key = if role.machine_name.is_empty() {
                role.title.to_lowercase()
            } else {
                role.machine_name.to_lowercase()
            };
            if !key.is_empty() {
                by_machine_name.insert(key, role.id.clone());
            }
            by_id.insert(role.id.clone(), role.clone());
        }
        Self {
            by_id,
            by_machine_name,
        }
    }

    pub fn get(&self, role_id: &str) -> Option<&Role> {
        self.by_id.get(role_id)
    }

    pub fn id_for_machine_name(&self, name: &str) -> Option<&str> {
        self.by_machine_name
            .get(&name.to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

// =============================================================================
// MANAGED ROLE FLAGS
// =============================================================================

/// Apply checkbox-managed role assignments to a role-id set: checked roles
/// are added, unchecked managed roles removed, and roles not managed by the
/// panel pass through untouched.
pub fn apply_role_flags(
    current: &HashSet<String>,
    managed: &HashMap<String, bool>,
) -> HashSet<String> {
    let mut next = current.clone();
    for (role_id, checked) in managed {
        if *checked {
            next.insert(role_id.clone());
        } else {
            next.remove(role_id);
        }
    }
    next
}
