//! Engine configuration. Constructor-injected at session creation; every
//! knob also has a `FORMGATE_*` environment override.

use std::sync::OnceLock;

use crate::errors::{EngineError, EngineResult};

pub const DEFAULT_BADGE_BATCH_SIZE: usize = 5;
pub const DEFAULT_LIST_LIMIT: u64 = 5000;

/// Durability policy for viewed-record writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// The in-memory mark lands first and the durable write is
    /// fire-and-forget; a write failure is logged, not rolled back.
    #[default]
    Optimistic,
    /// The durable write is awaited and a failure rolls the in-memory mark
    /// back, so a retry can re-issue it.
    Strict,
}

impl WriteMode {
    /// Process-wide mode from `FORMGATE_WRITE_MODE` (`optimistic`/`strict`).
    pub fn from_env() -> Self {
        static MODE: OnceLock<WriteMode> = OnceLock::new();
        *MODE.get_or_init(|| {
            match std::env::var("FORMGATE_WRITE_MODE")
                .unwrap_or_default()
                .to_lowercase()
                .as_str()
            {
                "strict" => WriteMode::Strict,
                _ => WriteMode::Optimistic,
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Role id treated as administrator when the role endpoint refuses the
    /// lookup with 401/403. A deployment-specific escape hatch for
    /// permissions-API limitations; `None` disables the fallback.
    pub fallback_admin_role_id: Option<String>,
    /// Concurrent per-form fetches during badge initialization.
    pub badge_batch_size: usize,
    /// Page cap for id-list and share-field fetches.
    pub list_limit: u64,
    pub write_mode: WriteMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_admin_role_id: None,
            badge_batch_size: DEFAULT_BADGE_BATCH_SIZE,
            list_limit: DEFAULT_LIST_LIMIT,
            write_mode: WriteMode::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback_admin_role(mut self, role_id: impl Into<String>) -> Self {
        self.fallback_admin_role_id = Some(role_id.into());
        self
    }

    pub fn with_badge_batch_size(mut self, size: usize) -> Self {
        self.badge_batch_size = size.max(1);
        self
    }

    pub fn with_list_limit(mut self, limit: u64) -> Self {
        self.list_limit = limit;
        self
    }

    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Configuration from `FORMGATE_*` environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> EngineResult<Self> {
        let fallback_admin_role_id = std::env::var("FORMGATE_FALLBACK_ADMIN_ROLE")
            .ok()
            .filter(|value| !value.is_empty());

        let badge_batch_size = match std::env::var("FORMGATE_BADGE_BATCH") {
            Ok(value) => value.parse::<usize>().map_err(|_| {
                EngineError::configuration("FORMGATE_BADGE_BATCH must be a valid integer")
            })?,
            Err(_) => DEFAULT_BADGE_BATCH_SIZE,
        };

        let list_limit = match std::env::var("FORMGATE_LIST_LIMIT") {
            Ok(value) => value.parse::<u64>().map_err(|_| {
                EngineError::configuration("FORMGATE_LIST_LIMIT must be a valid integer")
            })?,
            Err(_) => DEFAULT_LIST_LIMIT,
        };

        Ok(Self {
            fallback_admin_role_id,
            badge_batch_size: badge_batch_size.max(1),
            list_limit,
            write_mode: WriteMode::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.badge_batch_size, DEFAULT_BADGE_BATCH_SIZE);
        assert_eq!(config.list_limit, DEFAULT_LIST_LIMIT);
        assert_eq!(config.write_mode, WriteMode::Optimistic);
        assert!(config.fallback_admin_role_id.is_none());
    }

    #[test]
    fn batch_size_never_zero() {
        let config = EngineConfig::new().with_badge_batch_size(0);
        assert_eq!(config.badge_batch_size, 1);
    }

    #[test]
    fn builder_chain() {
        let config = EngineConfig::new()
            .with_fallback_admin_role("r-admin")
            .with_list_limit(100)
            .with_write_mode(WriteMode::Strict);
        assert_eq!(config.fallback_admin_role_id.as_deref(), Some("r-admin"));
        assert_eq!(config.list_limit, 100);
        assert_eq!(config.write_mode, WriteMode::Strict);
    }
}
