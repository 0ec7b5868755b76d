//! Object cache API facade
//!
//! [`ObjectCacheHandle`] is a cheap-to-clone context object wrapping the
//! active [`ObjectCache`] backend. One handle can be published process-wide by
//! the `wp_cache_init*` functions; the `wp_cache_*` free functions read that
//! slot and forward to the handle.
//!
//! Lifecycle of the slot: unset, then set by any init call. Re-initializing
//! replaces the handle; there is no way back to unset.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    BackendKind, CacheConfig, CacheError, CacheKey, MemoryObjectCache, ObjectCache,
    object_cache::Generator,
};

static OBJECT_CACHE: RwLock<Option<ObjectCacheHandle>> = RwLock::new(None);

/// Shared handle to the active object cache backend
#[derive(Clone)]
pub struct ObjectCacheHandle {
    client: Arc<dyn ObjectCache>,
}

impl fmt::Debug for ObjectCacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectCacheHandle").finish_non_exhaustive()
    }
}

impl ObjectCacheHandle {
    pub fn new(client: impl ObjectCache) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn from_arc(client: Arc<dyn ObjectCache>) -> Self {
        Self { client }
    }

    /// Construct the backend selected by `config`.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        if !config.is_enabled() {
            warn!("Object cache disabled by configuration; no backend constructed");
            return Err(CacheError::Disabled);
        }
        match config.backend {
            BackendKind::Memory => Ok(Self::new(MemoryObjectCache::new(config))),
            BackendKind::Disabled => Err(CacheError::Disabled),
        }
    }

    /// The backend this handle forwards to
    pub fn client(&self) -> &Arc<dyn ObjectCache> {
        &self.client
    }

    /// Adds data if `key` does not already exist in `group`.
    pub fn add(
        &self,
        key: impl Into<CacheKey>,
        data: impl Into<Value>,
        group: &str,
        expire: i64,
    ) -> bool {
        self.client
            .add(&key.into(), data.into(), group, expire)
    }

    /// Kept for callers that still close the cache; does nothing.
    pub fn close(&self) -> bool {
        true
    }

    pub fn decr(&self, key: impl Into<CacheKey>, offset: i64, group: &str) -> Option<i64> {
        self.client.decr(&key.into(), offset, group)
    }

    pub fn delete(&self, key: impl Into<CacheKey>, group: &str) -> bool {
        self.client.delete(&key.into(), group)
    }

    pub fn flush(&self) -> bool {
        self.client.flush()
    }

    /// Retrieves a value, or `false` if absent.
    ///
    /// A stored `false` and a miss both return `Value::Bool(false)`; pass
    /// `found` to tell them apart.
    pub fn get(
        &self,
        key: impl Into<CacheKey>,
        group: &str,
        force: bool,
        found: Option<&mut bool>,
    ) -> Value {
        let value = self.client.get(&key.into(), group, force);
        if let Some(found) = found {
            *found = value.is_some();
        }
        value.unwrap_or(Value::Bool(false))
    }

    /// Retrieves keys across groups. Results are keyed `"group:key"`; misses are `false`.
    pub fn get_multi<I, G, KS, K>(&self, groups: I) -> HashMap<String, Value>
    where
        I: IntoIterator<Item = (G, KS)>,
        G: Into<String>,
        KS: IntoIterator<Item = K>,
        K: Into<CacheKey>,
    {
        let groups: Vec<(String, Vec<CacheKey>)> = groups
            .into_iter()
            .map(|(group, keys)| (group.into(), keys.into_iter().map(Into::into).collect()))
            .collect();
        self.client.get_multi(&groups)
    }

    pub fn incr(&self, key: impl Into<CacheKey>, offset: i64, group: &str) -> Option<i64> {
        self.client.incr(&key.into(), offset, group)
    }

    pub fn replace(
        &self,
        key: impl Into<CacheKey>,
        data: impl Into<Value>,
        group: &str,
        expire: i64,
    ) -> bool {
        self.client
            .replace(&key.into(), data.into(), group, expire)
    }

    /// Writes data regardless of whether `key` exists.
    pub fn set(
        &self,
        key: impl Into<CacheKey>,
        data: impl Into<Value>,
        group: &str,
        expire: i64,
    ) -> bool {
        self.client
            .set(&key.into(), data.into(), group, expire)
    }

    pub fn switch_to_blog(&self, blog_id: i64) {
        self.client.switch_to_blog(blog_id);
    }

    pub fn add_global_groups<I, S>(&self, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let groups: Vec<String> = groups.into_iter().map(Into::into).collect();
        self.client.add_global_groups(&groups);
    }

    pub fn add_non_persistent_groups<I, S>(&self, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let groups: Vec<String> = groups.into_iter().map(Into::into).collect();
        self.client.add_non_persistent_groups(&groups);
    }

    /// Returns the cached value, or runs `generator` once to produce, cache and return it.
    pub fn remember<'a, F>(
        &self,
        key: impl Into<CacheKey>,
        generator: F,
        group: &str,
        expire: i64,
    ) -> Value
    where
        F: FnOnce() -> Value + 'a,
    {
        let generator: Generator<'a> = Box::new(generator);
        self.client
            .remember(&key.into(), generator, group, expire)
    }

    /// Removes and returns the cached value, or `default` if absent.
    pub fn forget(&self, key: impl Into<CacheKey>, group: &str, default: Value) -> Value {
        self.client.forget(&key.into(), group, default)
    }
}

fn install(handle: ObjectCacheHandle) {
    let mut slot = OBJECT_CACHE.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        debug!("Replacing process-wide object cache");
    } else {
        debug!("Installing process-wide object cache");
    }
    *slot = Some(handle);
}

/// The process-wide handle, if one has been installed
pub fn object_cache() -> Result<ObjectCacheHandle, CacheError> {
    OBJECT_CACHE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or(CacheError::NotInitialized)
}

/// Sets up the process-wide object cache from `OBJECT_CACHE_*` configuration.
pub fn wp_cache_init() -> Result<(), CacheError> {
    let config = CacheConfig::load()?;
    wp_cache_init_with_config(&config)
}

/// Sets up the process-wide object cache with the backend selected by `config`.
///
/// On error the previously installed handle, if any, stays in place.
pub fn wp_cache_init_with_config(config: &CacheConfig) -> Result<(), CacheError> {
    install(ObjectCacheHandle::from_config(config)?);
    Ok(())
}

/// Installs `client` as the process-wide object cache.
pub fn wp_cache_init_with(client: impl ObjectCache) {
    install(ObjectCacheHandle::new(client));
}

/// Builds a backend with `build` and installs it; construction errors propagate as
/// [`CacheError::Backend`] and leave the slot untouched.
pub fn wp_cache_try_init_with<C, E, F>(build: F) -> Result<(), CacheError>
where
    C: ObjectCache,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    F: FnOnce() -> Result<C, E>,
{
    let client = build().map_err(|e| CacheError::Backend(e.into()))?;
    install(ObjectCacheHandle::new(client));
    Ok(())
}

pub fn wp_cache_add(
    key: impl Into<CacheKey>,
    data: impl Into<Value>,
    group: &str,
    expire: i64,
) -> Result<bool, CacheError> {
    Ok(object_cache()?.add(key, data, group, expire))
}

/// Always true, whether or not the cache was initialized.
pub fn wp_cache_close() -> bool {
    true
}

pub fn wp_cache_decr(
    key: impl Into<CacheKey>,
    offset: i64,
    group: &str,
) -> Result<Option<i64>, CacheError> {
    Ok(object_cache()?.decr(key, offset, group))
}

pub fn wp_cache_delete(key: impl Into<CacheKey>, group: &str) -> Result<bool, CacheError> {
    Ok(object_cache()?.delete(key, group))
}

pub fn wp_cache_flush() -> Result<bool, CacheError> {
    Ok(object_cache()?.flush())
}

pub fn wp_cache_get(
    key: impl Into<CacheKey>,
    group: &str,
    force: bool,
    found: Option<&mut bool>,
) -> Result<Value, CacheError> {
    Ok(object_cache()?.get(key, group, force, found))
}

pub fn wp_cache_get_multi<I, G, KS, K>(groups: I) -> Result<HashMap<String, Value>, CacheError>
where
    I: IntoIterator<Item = (G, KS)>,
    G: Into<String>,
    KS: IntoIterator<Item = K>,
    K: Into<CacheKey>,
{
    Ok(object_cache()?.get_multi(groups))
}

pub fn wp_cache_incr(
    key: impl Into<CacheKey>,
    offset: i64,
    group: &str,
) -> Result<Option<i64>, CacheError> {
    Ok(object_cache()?.incr(key, offset, group))
}

pub fn wp_cache_replace(
    key: impl Into<CacheKey>,
    data: impl Into<Value>,
    group: &str,
    expire: i64,
) -> Result<bool, CacheError> {
    Ok(object_cache()?.replace(key, data, group, expire))
}

pub fn wp_cache_set(
    key: impl Into<CacheKey>,
    data: impl Into<Value>,
    group: &str,
    expire: i64,
) -> Result<bool, CacheError> {
    Ok(object_cache()?.set(key, data, group, expire))
}

pub fn wp_cache_switch_to_blog(blog_id: i64) -> Result<(), CacheError> {
    object_cache()?.switch_to_blog(blog_id);
    Ok(())
}

pub fn wp_cache_add_global_groups<I, S>(groups: I) -> Result<(), CacheError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    object_cache()?.add_global_groups(groups);
    Ok(())
}

pub fn wp_cache_add_non_persistent_groups<I, S>(groups: I) -> Result<(), CacheError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    object_cache()?.add_non_persistent_groups(groups);
    Ok(())
}

pub fn wp_cache_remember<F>(
    key: impl Into<CacheKey>,
    generator: F,
    group: &str,
    expire: i64,
) -> Result<Value, CacheError>
where
    F: FnOnce() -> Value,
{
    Ok(object_cache()?.remember(key, generator, group, expire))
}

pub fn wp_cache_forget(
    key: impl Into<CacheKey>,
    group: &str,
    default: Value,
) -> Result<Value, CacheError> {
    Ok(object_cache()?.forget(key, group, default))
}
