//! Role directory: session-scoped cache of the project's role definitions
//! and the administrator check with its degraded-auth fallback.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::RecordApi;
use crate::config::EngineConfig;
use crate::errors::EngineResult;
use crate::models::role::{Role, RoleIndex};
use crate::models::user::User;

/// Outcome of an administrator check. Never an error: degraded lookups
/// surface through `warning`, because role-directory unavailability must
/// not block sign-in.
#[derive(Debug, Clone, Default)]
pub struct AdminCheck {
    pub is_admin: bool,
    pub warning: Option<String>,
}

pub struct RoleDirectory {
    api: Arc<dyn RecordApi>,
    cache: Mutex<Option<Vec<Role>>>,
    fallback_admin_role_id: Option<String>,
}

impl RoleDirectory {
    pub fn new(api: Arc<dyn RecordApi>, config: &EngineConfig) -> Self {
        Self {
            api,
            cache: Mutex::new(None),
            fallback_admin_role_id: config.fallback_admin_role_id.clone(),
        }
    }

    /// The cached role list; `force` bypasses the cache.
    ///
    /// 401/403-class failures are re-thrown so [`Self::is_administrator`]
    /// can apply its fallback. Any other failure degrades to an empty,
    /// cached list: the UI loses admin tooling, not sign-in.
    pub async fn fetch_roles(&self, force: bool) -> EngineResult<Vec<Role>> {
        if !force {
            if let Some(cached) = self.cache().clone() {
                return Ok(cached);
            }
        }
        match self.api.list_roles().await {
            Ok(roles) => {
                *self.cache() = Some(roles.clone());
                Ok(roles)
            }
            Err(err) if err.is_auth_error() => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "role fetch failed, degrading to empty role list");
                *self.cache() = Some(Vec::new());
                Ok(Vec::new())
            }
        }
    }

    /// Lookup maps over the current role list.
    pub async fn index(&self, force: bool) -> EngineResult<RoleIndex> {
        let roles = self.fetch_roles(force).await?;
        Ok(RoleIndex::build(&roles))
    }

    pub fn clear_cache(&self) {
        *self.cache() = None;
    }

    /// Whether any of the user's roles carries the administrator flag.
    ///
    /// Always re-reads the directory. On a 401/403 from the role endpoint
    /// the configured fallback admin role id is consulted instead and a
    /// positive result carries an advisory warning.
    pub async fn is_administrator(&self, user: &User) -> AdminCheck {
        if user.role_ids.is_empty() {
            return AdminCheck::default();
        }

        match self.fetch_roles(true).await {
            Ok(roles) => {
                let is_admin = roles
                    .iter()
                    .any(|role| role.admin && user.role_ids.contains(&role.id));
                AdminCheck {
                    is_admin,
                    warning: None,
                }
            }
            Err(err) if err.is_auth_error() => {
                if let Some(fallback) = &self.fallback_admin_role_id {
                    if user.role_ids.contains(fallback) {
                        return AdminCheck {
                            is_admin: true,
                            warning: Some(
                                "Admin status confirmed via fallback role id (role lookup limited)"
                                    .to_string(),
                            ),
                        };
                    }
                }
                // Cannot read roles and no fallback match: not an admin.
                AdminCheck::default()
            }
            Err(err) => {
                tracing::warn!(error = %err, "administrator check failed");
                AdminCheck {
                    is_admin: false,
                    warning: Some("Admin tools unavailable (role lookup failed).".to_string()),
                }
            }
        }
    }

    fn cache(&self) -> MutexGuard<'_, Option<Vec<Role>>> {
        self.cache.lock().expect("role cache lock poisoned")
    }
}
