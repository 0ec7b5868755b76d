//! Cache configuration

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CacheError;

/// Environment variable prefix read by [`CacheConfig::load`]
pub const ENV_PREFIX: &str = "OBJECT_CACHE_";

/// Which concrete backend `wp_cache_init` constructs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local moka-backed cache
    #[default]
    Memory,
    /// No backend; initialization fails with [`CacheError::Disabled`]
    Disabled,
}

/// Configuration for the object cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend to construct on init
    pub backend: BackendKind,
    /// Kill switch; when set, init refuses to install a backend
    pub disabled: bool,
    /// Maximum number of entries in the bounded store
    pub max_capacity: u64,
    /// Upper bound on entry lifetime in seconds, 0 for none
    pub default_ttl: u64,
    /// Prefix prepended to every derived storage key
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            disabled: false,
            max_capacity: 10_000,
            default_ttl: 0,
            key_prefix: String::new(),
        }
    }
}

impl CacheConfig {
    /// Load configuration from defaults overlaid with `OBJECT_CACHE_*` environment variables.
    pub fn load() -> Result<Self, CacheError> {
        let config: CacheConfig = Figment::new()
            .merge(Serialized::defaults(CacheConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;

        debug!(
            "Loaded object cache config: backend={:?} disabled={} max_capacity={}",
            config.backend, config.disabled, config.max_capacity
        );
        Ok(config)
    }

    /// Whether a backend may be constructed at all
    pub fn is_enabled(&self) -> bool {
        !self.disabled && self.backend != BackendKind::Disabled
    }

    /// Upper bound on entry lifetime, if any
    pub fn default_ttl(&self) -> Option<Duration> {
        (self.default_ttl > 0).then(|| Duration::from_secs(self.default_ttl))
    }
}
