use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils;

/// The acting principal: an authenticated platform user with their role ids
/// and form-defined profile data.
///
/// The engine only ever sees this one explicit type; hosts adapt whatever
/// the session layer returns through [`User::from_record`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(rename = "roles", alias = "roleIds")]
    pub role_ids: HashSet<String>,
    /// Profile fields (`departments`, `committees`, ...) whose shape is
    /// form-defined, so values stay dynamic.
    #[serde(rename = "data", alias = "profile")]
    pub profile: Map<String, Value>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.role_ids = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_profile_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.profile.insert(key.into(), value);
        self
    }

    /// Boundary adapter from a raw platform user submission. Tolerant of
    /// missing roles/data; `None` only when the payload carries no id.
    pub fn from_record(value: &Value) -> Option<Self> {
        let id = utils::id_of(value)?.to_string();
        let role_ids = value
            .get("roles")
            .map(|roles| {
                utils::normalized_ids(roles)
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let profile = value
            .get("data")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Some(Self {
            id,
            role_ids,
            profile,
        })
    }

    pub fn has_role(&self, role_id: &str) -> bool {
        self.role_ids.contains(role_id)
    }

    /// Normalized ids referenced by a profile field (bare id, id object, or
    /// array of either).
    pub fn membership_ids(&self, field: &str) -> HashSet<&str> {
        self.profile
            .get(field)
            .map(utils::normalized_ids)
            .unwrap_or_default()
    }
}
