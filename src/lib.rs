//! object-cache - Object cache API facade
//!
//! This library exposes the fixed object cache API (`wp_cache_add`,
//! `wp_cache_get`, ...) and routes every call to a single, process-wide
//! backend implementing [`ObjectCache`]:
//! - [`ObjectCacheHandle`] is the explicit context object callers can pass around
//! - `wp_cache_init*` constructs or injects the backend and publishes it
//! - [`MemoryObjectCache`] is the default process-local backend (Moka)
//!
//! The backend is selected once at startup from [`CacheConfig`].

#[cfg(feature = "cli")]
pub mod cli;
mod config;
mod error;
pub mod facade;
mod key;
mod memory_cache;
mod object_cache;

pub use config::{BackendKind, CacheConfig, ENV_PREFIX};
pub use error::CacheError;
pub use facade::{
    ObjectCacheHandle, object_cache, wp_cache_add, wp_cache_add_global_groups,
    wp_cache_add_non_persistent_groups, wp_cache_close, wp_cache_decr, wp_cache_delete,
    wp_cache_flush, wp_cache_forget, wp_cache_get, wp_cache_get_multi, wp_cache_incr,
    wp_cache_init, wp_cache_init_with, wp_cache_init_with_config, wp_cache_remember,
    wp_cache_replace, wp_cache_set, wp_cache_switch_to_blog, wp_cache_try_init_with,
};
pub use key::{CacheKey, DEFAULT_GROUP, GroupKeyFormatter, KeyFormatter, multi_key};
pub use memory_cache::{DEFAULT_BLOG_ID, MemoryObjectCache};
pub use object_cache::{Generator, GroupedKeys, ObjectCache};

// Re-export serde_json for building cache values
pub use serde_json;
