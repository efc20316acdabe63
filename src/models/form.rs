use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// =============================================================================
// ACCESS TYPES
// =============================================================================

/// The eight (action, scope) pairs of the platform's submission permission
/// model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    CreateAll,
    CreateOwn,
    ReadAll,
    ReadOwn,
    UpdateAll,
    UpdateOwn,
    DeleteAll,
    DeleteOwn,
}

impl AccessType {
    pub const ALL: [AccessType; 8] = [
        AccessType::CreateAll,
        AccessType::CreateOwn,
        AccessType::ReadAll,
        AccessType::ReadOwn,
        AccessType::UpdateAll,
        AccessType::UpdateOwn,
        AccessType::DeleteAll,
        AccessType::DeleteOwn,
    ];

    /// Parse a wire-format access-type name. Unknown names yield `None`,
    /// which evaluation treats as a non-matching rule.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "create_all" => Some(Self::CreateAll),
            "create_own" => Some(Self::CreateOwn),
            "read_all" => Some(Self::ReadAll),
            "read_own" => Some(Self::ReadOwn),
            "update_all" => Some(Self::UpdateAll),
            "update_own" => Some(Self::UpdateOwn),
            "delete_all" => Some(Self::DeleteAll),
            "delete_own" => Some(Self::DeleteOwn),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateAll => "create_all",
            Self::CreateOwn => "create_own",
            Self::ReadAll => "read_all",
            Self::ReadOwn => "read_own",
            Self::UpdateAll => "update_all",
            Self::UpdateOwn => "update_own",
            Self::DeleteAll => "delete_all",
            Self::DeleteOwn => "delete_own",
        }
    }
}

// =============================================================================
// ACCESS RULES
// =============================================================================

/// A role-based rule from a form's `access`/`submissionAccess` lists.
///
/// `kind` stays a raw string so an unknown or missing type degrades to
/// "rule does not match" instead of failing the whole form parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessRule {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(alias = "roleIds")]
    pub roles: HashSet<String>,
}

impl AccessRule {
    pub fn new(access: AccessType, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            kind: access.as_str().to_string(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn access_type(&self) -> Option<AccessType> {
        AccessType::parse(&self.kind)
    }
}

// =============================================================================
// GROUP PERMISSION RULES
// =============================================================================

/// Profile fields scanned for membership when a rule names none.
pub const DEFAULT_MEMBERSHIP_FIELDS: [&str; 2] = ["departments", "committees"];

/// A resource-scoped ("group") permission rule: users whose profile
/// references the rule's resource record are granted the listed access
/// types, independent of their roles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupPermissionRule {
    /// Id of the resource record (e.g. a department submission) whose
    /// members this rule covers.
    #[serde(rename = "resource", alias = "resourceSubmissionId")]
    pub resource_submission_id: String,
    /// Profile fields to scan for membership; empty means the default
    /// departments/committees scan.
    #[serde(
        rename = "fieldName",
        alias = "membershipFieldNames",
        deserialize_with = "one_or_many_strings"
    )]
    pub membership_fields: Vec<String>,
    /// Raw access-type names granted to members; unknown names never match.
    #[serde(rename = "access", alias = "grantedAccessTypes")]
    pub access: Vec<String>,
}

impl GroupPermissionRule {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_submission_id: resource_id.into(),
            ..Self::default()
        }
    }

    pub fn with_membership_fields(
        mut self,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.membership_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_access(mut self, access: impl IntoIterator<Item = AccessType>) -> Self {
        self.access = access.into_iter().map(|a| a.as_str().to_string()).collect();
        self
    }

    pub fn membership_fields_or_default(&self) -> Vec<&str> {
        if self.membership_fields.is_empty() {
            DEFAULT_MEMBERSHIP_FIELDS.to_vec()
        } else {
            self.membership_fields.iter().map(String::as_str).collect()
        }
    }

    /// Access types this rule grants, with unknown names dropped.
    pub fn granted(&self) -> impl Iterator<Item = AccessType> + '_ {
        self.access.iter().filter_map(|name| AccessType::parse(name))
    }
}

// =============================================================================
// FORM SETTINGS
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Forms flagged here are skipped by badge initialization.
    #[serde(rename = "hideBadges")]
    pub hide_badges: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// Group-permission rules, normalized to a list at the boundary (the
    /// wire shape may be a single object or an array).
    #[serde(
        rename = "groupPermissions",
        alias = "groupPermissionRules",
        deserialize_with = "one_or_many_rules"
    )]
    pub group_permissions: Vec<GroupPermissionRule>,
    pub ui: UiSettings,
}

// =============================================================================
// FORM DEFINITION
// =============================================================================

/// Marker component key that opts a form into per-record share settings.
pub const SHARE_PANEL_KEY: &str = "shareSettings";

/// A form definition as served by the platform. Only the fields the engine
/// depends on are modeled; the component tree stays dynamic and is probed
/// solely for the share-settings marker panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormDefinition {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub path: String,
    pub title: String,
    pub access: Vec<AccessRule>,
    /// `None` when the definition carries no submission-level list at all,
    /// in which case `access` governs. An empty list is still a list.
    #[serde(rename = "submissionAccess", alias = "submissionAccessRules")]
    pub submission_access: Option<Vec<AccessRule>>,
    pub settings: FormSettings,
    /// `None` when the payload omitted components (navigation listings do);
    /// `Some` once the full definition is loaded.
    pub components: Option<Vec<Value>>,
}

impl FormDefinition {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_submission_access(mut self, rules: impl IntoIterator<Item = AccessRule>) -> Self {
        self.submission_access = Some(rules.into_iter().collect());
        self
    }

    pub fn with_group_permissions(
        mut self,
        rules: impl IntoIterator<Item = GroupPermissionRule>,
    ) -> Self {
        self.settings.group_permissions = rules.into_iter().collect();
        self
    }

    /// Attach a component tree containing the share-settings marker panel.
    pub fn with_share_panel(mut self) -> Self {
        let mut components = self.components.unwrap_or_default();
        components.push(serde_json::json!({"key": SHARE_PANEL_KEY, "type": "panel"}));
        self.components = Some(components);
        self
    }

    /// Attach an empty component tree, marking the definition as fully
    /// loaded without any share panel.
    pub fn with_components(mut self, components: Vec<Value>) -> Self {
        self.components = Some(components);
        self
    }

    /// Rules governing submission-level access, falling back to the
    /// form-level list only when the submission list is absent entirely.
    pub fn submission_rules(&self) -> &[AccessRule] {
        self.submission_access.as_deref().unwrap_or(&self.access)
    }

    /// Whether the component tree was part of this payload. Navigation
    /// listings omit it; callers needing share detection refetch first.
    pub fn has_components(&self) -> bool {
        self.components.is_some()
    }

    /// Whether the form declares the per-record share-settings panel.
    /// Component-less payloads report `false`.
    pub fn has_share_panel(&self) -> bool {
        self.components
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .any(|component| {
                component.get("key").and_then(Value::as_str) == Some(SHARE_PANEL_KEY)
                    && component.get("type").and_then(Value::as_str) == Some("panel")
            })
    }

    pub fn hide_badges(&self) -> bool {
        self.settings.ui.hide_badges
    }
}

// =============================================================================
// ONE-OR-MANY DESERIALIZERS
// =============================================================================

fn one_or_many_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

fn one_or_many_rules<'de, D>(deserializer: D) -> Result<Vec<GroupPermissionRule>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Box<GroupPermissionRule>),
        Many(Vec<GroupPermissionRule>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(rule)) => vec![*rule],
        Some(OneOrMany::Many(rules)) => rules,
        None => Vec::new(),
    })
}
