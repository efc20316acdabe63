use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils;

/// A submission record. Share-relevant fields live under `data` and are all
/// optional; absence means "no sharing declared", which — when the form
/// declares a share panel — leaves the record private to owner and admins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(alias = "ownerId")]
    pub owner: Option<String>,
    #[serde(rename = "form", alias = "formId")]
    pub form_id: String,
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_form(mut self, form_id: impl Into<String>) -> Self {
        self.form_id = form_id.into();
        self
    }

    pub fn with_data_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn share_public(&self) -> bool {
        matches!(self.data.get("sharePublic"), Some(Value::Bool(true)))
    }

    pub fn share_roles(&self) -> HashSet<&str> {
        self.share_ids("shareRoles")
    }

    pub fn share_departments(&self) -> HashSet<&str> {
        self.share_ids("shareDepartments")
    }

    pub fn share_committees(&self) -> HashSet<&str> {
        self.share_ids("shareCommittees")
    }

    pub fn share_users(&self) -> HashSet<&str> {
        self.share_ids("shareUsers")
    }

    fn share_ids(&self, key: &str) -> HashSet<&str> {
        self.data
            .get(key)
            .map(utils::normalized_ids)
            .unwrap_or_default()
    }
}
