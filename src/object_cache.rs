//! The object cache client contract
//!
//! Any concrete backend implements [`ObjectCache`]; the facade holds one behind
//! an `Arc<dyn ObjectCache>` and forwards every call to it unchanged.

use std::collections::HashMap;

use serde_json::Value;

use crate::CacheKey;

/// Value generator invoked by [`ObjectCache::remember`] on a miss
pub type Generator<'a> = Box<dyn FnOnce() -> Value + 'a>;

/// Groups and the keys to fetch from each, as passed to [`ObjectCache::get_multi`]
pub type GroupedKeys = [(String, Vec<CacheKey>)];

/// Operations every object cache backend must provide.
///
/// `expire` is in seconds as given by the caller; 0 means no explicit expiration.
/// Backends decide what other values mean.
pub trait ObjectCache: Send + Sync + 'static {
    /// Store `data` only if `key` is absent from `group`.
    fn add(&self, key: &CacheKey, data: Value, group: &str, expire: i64) -> bool;

    /// Decrement a numeric value, returning the new value.
    fn decr(&self, key: &CacheKey, offset: i64, group: &str) -> Option<i64>;

    fn delete(&self, key: &CacheKey, group: &str) -> bool;

    fn flush(&self) -> bool;

    /// Look up a value. `Some(Value::Bool(false))` is a stored `false`, distinct from `None`.
    fn get(&self, key: &CacheKey, group: &str, force: bool) -> Option<Value>;

    /// Fetch many keys across groups. Result keys are `"group:key"`; misses map to `false`.
    fn get_multi(&self, groups: &GroupedKeys) -> HashMap<String, Value>;

    /// Increment a numeric value, returning the new value.
    fn incr(&self, key: &CacheKey, offset: i64, group: &str) -> Option<i64>;

    /// Overwrite `key` only if it already exists.
    fn replace(&self, key: &CacheKey, data: Value, group: &str, expire: i64) -> bool;

    fn set(&self, key: &CacheKey, data: Value, group: &str, expire: i64) -> bool;

    /// Change the blog id used to namespace blog-scoped groups.
    fn switch_to_blog(&self, blog_id: i64);

    fn add_global_groups(&self, groups: &[String]);

    fn add_non_persistent_groups(&self, groups: &[String]);

    /// Return the cached value, or store and return what `generator` produces.
    fn remember(
        &self,
        key: &CacheKey,
        generator: Generator<'_>,
        group: &str,
        expire: i64,
    ) -> Value;

    /// Remove and return the cached value, or return `default` if absent.
    fn forget(&self, key: &CacheKey, group: &str, default: Value) -> Value;
}
