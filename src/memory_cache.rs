//! Process-local object cache backend
//!
//! Two tiers, both in this process:
//! - a bounded Moka cache for regular groups, with per-entry expiry
//! - an unbounded map for non-persistent groups, never evicted for capacity
//!
//! Storage keys are derived by a [`KeyFormatter`], which scopes regular groups
//! to the current blog and shares global groups across blogs.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex, MutexGuard, PoisonError, RwLock,
        atomic::{AtomicI64, Ordering},
    },
    time::{Duration, Instant},
};

use moka::{Expiry, sync::Cache};
use serde_json::Value;
use tracing::debug;

use crate::{
    CacheConfig, CacheKey, GroupKeyFormatter, KeyFormatter, ObjectCache,
    key::multi_key,
    object_cache::{Generator, GroupedKeys},
};

/// Blog id used until `switch_to_blog` is called
pub const DEFAULT_BLOG_ID: i64 = 1;

#[derive(Debug, Clone)]
struct StoredValue {
    value: Value,
    ttl: Option<Duration>,
    stored_at: Instant,
}

impl StoredValue {
    fn new(value: Value, ttl: Option<Duration>) -> Self {
        Self {
            value,
            ttl,
            stored_at: Instant::now(),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(self.stored_at) >= ttl)
    }
}

/// Expire each entry after its own TTL; overwrites restart the clock.
struct PerEntryExpiry;

impl Expiry<String, StoredValue> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Resolve the lifetime of an entry from the caller's `expire` and the configured cap.
///
/// Negative values mean the entry is already expired and yield a zero TTL.
fn entry_ttl(expire: i64, cap: Option<Duration>) -> Option<Duration> {
    let requested = match u64::try_from(expire) {
        Err(_) => return Some(Duration::ZERO),
        Ok(0) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
    };
    match (requested, cap) {
        (Some(requested), Some(cap)) => Some(requested.min(cap)),
        (requested, cap) => requested.or(cap),
    }
}

/// Parse a stored value as an integer counter
fn as_counter(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Minimum time between sweeps of expired non-persistent entries
const LOCAL_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// In-process [`ObjectCache`] implementation
pub struct MemoryObjectCache<KF: KeyFormatter = GroupKeyFormatter> {
    store: Cache<String, StoredValue>,
    local: RwLock<HashMap<String, StoredValue>>,
    last_local_sweep: Mutex<Instant>,
    global_groups: RwLock<HashSet<String>>,
    non_persistent_groups: RwLock<HashSet<String>>,
    blog_id: AtomicI64,
    ttl_cap: Option<Duration>,
    key_formatter: KF,
    /// Serializes every mutation so read-modify-write operations stay atomic
    write_lock: Mutex<()>,
}

impl MemoryObjectCache<GroupKeyFormatter> {
    /// Create a cache using the default `{prefix}{blog}:{group}:{key}` layout
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_key_formatter(config, GroupKeyFormatter::new(config.key_prefix.clone()))
    }
}

impl<KF: KeyFormatter> MemoryObjectCache<KF> {
    pub fn with_key_formatter(config: &CacheConfig, key_formatter: KF) -> Self {
        let store = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryExpiry)
            .build();

        debug!(
            "Created memory object cache (max_capacity={}, ttl_cap={:?})",
            config.max_capacity,
            config.default_ttl()
        );

        Self {
            store,
            local: RwLock::new(HashMap::new()),
            last_local_sweep: Mutex::new(Instant::now()),
            global_groups: RwLock::new(HashSet::new()),
            non_persistent_groups: RwLock::new(HashSet::new()),
            blog_id: AtomicI64::new(DEFAULT_BLOG_ID),
            ttl_cap: config.default_ttl(),
            key_formatter,
            write_lock: Mutex::new(()),
        }
    }

    /// Current blog id used for blog-scoped groups
    pub fn blog_id(&self) -> i64 {
        self.blog_id.load(Ordering::SeqCst)
    }

    pub fn is_global_group(&self, group: &str) -> bool {
        self.global_groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(group)
    }

    pub fn is_non_persistent_group(&self, group: &str) -> bool {
        self.non_persistent_groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(group)
    }

    /// Storage key for `(group, key)` under the current blog
    pub fn storage_key(&self, key: &CacheKey, group: &str) -> String {
        if self.is_global_group(group) {
            self.key_formatter.format_global_key(group, key)
        } else {
            self.key_formatter.format_key(self.blog_id(), group, key)
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self, key: &CacheKey, group: &str) -> Option<Value> {
        let storage_key = self.storage_key(key, group);
        if self.is_non_persistent_group(group) {
            return self.read_local(&storage_key);
        }
        self.store.get(&storage_key).map(|stored| stored.value)
    }

    fn read_local(&self, storage_key: &str) -> Option<Value> {
        let now = Instant::now();
        {
            let local = self.local.read().unwrap_or_else(PoisonError::into_inner);
            match local.get(storage_key) {
                None => return None,
                Some(stored) if !stored.is_expired(now) => return Some(stored.value.clone()),
                Some(_) => {}
            }
        }

        let mut local = self.local.write().unwrap_or_else(PoisonError::into_inner);
        if local
            .get(storage_key)
            .is_some_and(|stored| stored.is_expired(now))
        {
            debug!("Dropping expired non-persistent entry: {}", storage_key);
            local.remove(storage_key);
        }
        None
    }

    /// Store an entry in the tier owning `group`. A zero TTL drops the entry instead.
    fn store_entry(&self, group: &str, storage_key: String, stored: StoredValue) {
        let expired = stored.ttl == Some(Duration::ZERO);
        if self.is_non_persistent_group(group) {
            let now = Instant::now();
            let mut local = self.local.write().unwrap_or_else(PoisonError::into_inner);
            if self.local_sweep_due(now) {
                let before = local.len();
                local.retain(|_, stored| !stored.is_expired(now));
                debug!(
                    "Swept {} expired non-persistent entries",
                    before - local.len()
                );
            }
            if expired {
                local.remove(&storage_key);
            } else {
                local.insert(storage_key, stored);
            }
        } else if expired {
            self.store.invalidate(&storage_key);
        } else {
            self.store.insert(storage_key, stored);
        }
    }

    fn local_sweep_due(&self, now: Instant) -> bool {
        let mut last = self
            .last_local_sweep
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if now.saturating_duration_since(*last) >= LOCAL_SWEEP_INTERVAL {
            *last = now;
            true
        } else {
            false
        }
    }

    fn write(&self, key: &CacheKey, data: Value, group: &str, expire: i64) {
        let stored = StoredValue::new(data, entry_ttl(expire, self.ttl_cap));
        self.store_entry(group, self.storage_key(key, group), stored);
    }

    fn remove(&self, key: &CacheKey, group: &str) -> Option<Value> {
        let storage_key = self.storage_key(key, group);
        if self.is_non_persistent_group(group) {
            let mut local = self.local.write().unwrap_or_else(PoisonError::into_inner);
            return local
                .remove(&storage_key)
                .filter(|stored| !stored.is_expired(Instant::now()))
                .map(|stored| stored.value);
        }
        self.store.remove(&storage_key).map(|stored| stored.value)
    }

    /// Keep the remaining lifetime of a counter when rewriting it
    fn remaining_ttl(&self, key: &CacheKey, group: &str) -> Option<Duration> {
        let storage_key = self.storage_key(key, group);
        let stored = if self.is_non_persistent_group(group) {
            self.local
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&storage_key)
                .cloned()
        } else {
            self.store.get(&storage_key)
        }?;
        let ttl = stored.ttl?;
        Some(ttl.saturating_sub(stored.stored_at.elapsed()))
    }

    fn adjust(&self, key: &CacheKey, offset: i64, group: &str) -> Option<i64> {
        let _guard = self.lock_writes();
        let current = self.read(key, group)?;
        let Some(current) = as_counter(&current) else {
            debug!("Cannot adjust non-numeric value for key: {}", key);
            return None;
        };
        let updated = current.checked_add(offset)?;

        let stored = StoredValue::new(Value::from(updated), self.remaining_ttl(key, group));
        self.store_entry(group, self.storage_key(key, group), stored);
        Some(updated)
    }
}

fn extend_groups(set: &RwLock<HashSet<String>>, groups: &[String]) {
    set.write()
        .unwrap_or_else(PoisonError::into_inner)
        .extend(groups.iter().cloned());
}

impl<KF: KeyFormatter> ObjectCache for MemoryObjectCache<KF> {
    fn add(&self, key: &CacheKey, data: Value, group: &str, expire: i64) -> bool {
        let _guard = self.lock_writes();
        if self.read(key, group).is_some() {
            debug!("Add skipped, key exists: {}", key);
            return false;
        }
        self.write(key, data, group, expire);
        true
    }

    fn decr(&self, key: &CacheKey, offset: i64, group: &str) -> Option<i64> {
        self.adjust(key, offset.checked_neg()?, group)
    }

    fn delete(&self, key: &CacheKey, group: &str) -> bool {
        let _guard = self.lock_writes();
        self.remove(key, group).is_some()
    }

    fn flush(&self) -> bool {
        let _guard = self.lock_writes();
        self.store.invalidate_all();
        self.local
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("Flushed memory object cache");
        true
    }

    fn get(&self, key: &CacheKey, group: &str, force: bool) -> Option<Value> {
        if force {
            debug!("Forced lookup for key {} served from memory", key);
        }
        let value = self.read(key, group);
        if value.is_some() {
            debug!("Cache hit for key: {} (group: {})", key, group);
        } else {
            debug!("Cache miss for key: {} (group: {})", key, group);
        }
        value
    }

    fn get_multi(&self, groups: &GroupedKeys) -> HashMap<String, Value> {
        groups
            .iter()
            .flat_map(|(group, keys)| {
                keys.iter().map(move |key| {
                    let value = self.get(key, group, false).unwrap_or(Value::Bool(false));
                    (multi_key(group, key), value)
                })
            })
            .collect()
    }

    fn incr(&self, key: &CacheKey, offset: i64, group: &str) -> Option<i64> {
        self.adjust(key, offset, group)
    }

    fn replace(&self, key: &CacheKey, data: Value, group: &str, expire: i64) -> bool {
        let _guard = self.lock_writes();
        if self.read(key, group).is_none() {
            return false;
        }
        self.write(key, data, group, expire);
        true
    }

    fn set(&self, key: &CacheKey, data: Value, group: &str, expire: i64) -> bool {
        let _guard = self.lock_writes();
        self.write(key, data, group, expire);
        true
    }

    fn switch_to_blog(&self, blog_id: i64) {
        debug!("Switching object cache to blog {}", blog_id);
        self.blog_id.store(blog_id, Ordering::SeqCst);
    }

    fn add_global_groups(&self, groups: &[String]) {
        debug!("Adding global groups: {:?}", groups);
        extend_groups(&self.global_groups, groups);
    }

    fn add_non_persistent_groups(&self, groups: &[String]) {
        debug!("Adding non-persistent groups: {:?}", groups);
        extend_groups(&self.non_persistent_groups, groups);
    }

    fn remember(
        &self,
        key: &CacheKey,
        generator: Generator<'_>,
        group: &str,
        expire: i64,
    ) -> Value {
        if let Some(value) = self.get(key, group, false) {
            return value;
        }
        // The generator may call back into the cache, so it runs unlocked.
        let value = generator();
        self.set(key, value.clone(), group, expire);
        value
    }

    fn forget(&self, key: &CacheKey, group: &str, default: Value) -> Value {
        let _guard = self.lock_writes();
        self.remove(key, group).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache() -> MemoryObjectCache {
        MemoryObjectCache::new(&CacheConfig::default())
    }

    fn key(k: &str) -> CacheKey {
        CacheKey::from(k)
    }

    #[test]
    fn test_entry_ttl() {
        assert_eq!(entry_ttl(0, None), None);
        assert_eq!(entry_ttl(60, None), Some(Duration::from_secs(60)));
        assert_eq!(
            entry_ttl(0, Some(Duration::from_secs(30))),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            entry_ttl(60, Some(Duration::from_secs(30))),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            entry_ttl(10, Some(Duration::from_secs(30))),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_entry_ttl_out_of_range() {
        assert_eq!(entry_ttl(-1, None), Some(Duration::ZERO));
        assert_eq!(entry_ttl(-30, Some(Duration::from_secs(30))), Some(Duration::ZERO));
        assert_eq!(
            entry_ttl(5_000_000_000, None),
            Some(Duration::from_secs(5_000_000_000))
        );
    }

    #[test]
    fn test_stored_value_expiry() {
        let stored = StoredValue::new(json!(1), Some(Duration::from_secs(5)));
        assert!(!stored.is_expired(stored.stored_at));
        assert!(stored.is_expired(stored.stored_at + Duration::from_secs(5)));
        let forever = StoredValue::new(json!(1), None);
        assert!(!forever.is_expired(forever.stored_at + Duration::from_secs(86_400)));
    }

    #[test]
    fn test_add_only_when_absent() {
        let cache = cache();
        assert!(cache.add(&key("a"), json!("first"), "", 0));
        assert!(!cache.add(&key("a"), json!("second"), "", 0));
        assert_eq!(cache.get(&key("a"), "", false), Some(json!("first")));
    }

    #[test]
    fn test_replace_only_when_present() {
        let cache = cache();
        assert!(!cache.replace(&key("a"), json!(1), "g", 0));
        assert_eq!(cache.get(&key("a"), "g", false), None);
        cache.set(&key("a"), json!(1), "g", 0);
        assert!(cache.replace(&key("a"), json!(2), "g", 0));
        assert_eq!(cache.get(&key("a"), "g", false), Some(json!(2)));
    }

    #[test]
    fn test_set_overwrites() {
        let cache = cache();
        assert!(cache.set(&key("a"), json!(1), "", 0));
        assert!(cache.set(&key("a"), json!(2), "", 0));
        assert_eq!(cache.get(&key("a"), "", false), Some(json!(2)));
    }

    #[test]
    fn test_stored_false_is_found() {
        let cache = cache();
        cache.set(&key("flag"), json!(false), "", 0);
        assert_eq!(cache.get(&key("flag"), "", false), Some(Value::Bool(false)));
        assert_eq!(cache.get(&key("other"), "", false), None);
    }

    #[test]
    fn test_groups_partition_keys() {
        let cache = cache();
        cache.set(&key("a"), json!("one"), "g1", 0);
        cache.set(&key("a"), json!("two"), "g2", 0);
        assert_eq!(cache.get(&key("a"), "g1", false), Some(json!("one")));
        assert_eq!(cache.get(&key("a"), "g2", false), Some(json!("two")));
        assert_eq!(cache.get(&key("a"), "", false), None);
    }

    #[test]
    fn test_delete() {
        let cache = cache();
        cache.set(&key("a"), json!(1), "", 0);
        assert!(cache.delete(&key("a"), ""));
        assert!(!cache.delete(&key("a"), ""));
    }

    #[test]
    fn test_incr_decr() {
        let cache = cache();
        assert_eq!(cache.incr(&key("n"), 1, ""), None);

        cache.set(&key("n"), json!(5), "", 0);
        assert_eq!(cache.incr(&key("n"), 1, ""), Some(6));
        assert_eq!(cache.incr(&key("n"), 10, ""), Some(16));
        assert_eq!(cache.decr(&key("n"), 20, ""), Some(-4));
        assert_eq!(cache.get(&key("n"), "", false), Some(json!(-4)));

        cache.set(&key("s"), json!("7"), "", 0);
        assert_eq!(cache.incr(&key("s"), 1, ""), Some(8));
        assert_eq!(cache.get(&key("s"), "", false), Some(json!(8)));

        cache.set(&key("word"), json!("seven"), "", 0);
        assert_eq!(cache.incr(&key("word"), 1, ""), None);
        assert_eq!(cache.get(&key("word"), "", false), Some(json!("seven")));

        cache.set(&key("max"), json!(i64::MAX), "", 0);
        assert_eq!(cache.incr(&key("max"), 1, ""), None);
    }

    #[test]
    fn test_flush_clears_both_tiers() {
        let cache = cache();
        cache.add_non_persistent_groups(&["runtime".to_owned()]);
        cache.set(&key("a"), json!(1), "", 0);
        cache.set(&key("b"), json!(2), "runtime", 0);
        assert!(cache.flush());
        assert_eq!(cache.get(&key("a"), "", false), None);
        assert_eq!(cache.get(&key("b"), "runtime", false), None);
    }

    #[test]
    fn test_get_multi() {
        let cache = cache();
        cache.set(&key("a"), json!("g1a"), "g1", 0);
        cache.set(&key("a"), json!("g2a"), "g2", 0);

        let result = cache.get_multi(&[
            ("g1".to_owned(), vec![key("a"), key("b")]),
            ("g2".to_owned(), vec![key("a")]),
        ]);

        assert_eq!(result.len(), 3);
        assert_eq!(result["g1:a"], json!("g1a"));
        assert_eq!(result["g1:b"], json!(false));
        assert_eq!(result["g2:a"], json!("g2a"));
    }

    #[test]
    fn test_switch_to_blog_scopes_keys() {
        let cache = cache();
        cache.add_global_groups(&["users".to_owned()]);
        cache.set(&key("a"), json!("blog1"), "posts", 0);
        cache.set(&key("u"), json!("shared"), "users", 0);

        cache.switch_to_blog(2);
        assert_eq!(cache.blog_id(), 2);
        assert_eq!(cache.get(&key("a"), "posts", false), None);
        assert_eq!(cache.get(&key("u"), "users", false), Some(json!("shared")));

        cache.switch_to_blog(DEFAULT_BLOG_ID);
        assert_eq!(cache.get(&key("a"), "posts", false), Some(json!("blog1")));
    }

    #[test]
    fn test_non_persistent_groups_bypass_store() {
        let cache = cache();
        cache.add_non_persistent_groups(&["counts".to_owned()]);
        cache.set(&key("a"), json!(1), "counts", 0);

        assert!(
            cache
                .store
                .get(&cache.storage_key(&key("a"), "counts"))
                .is_none()
        );
        assert_eq!(cache.get(&key("a"), "counts", false), Some(json!(1)));
        assert_eq!(cache.incr(&key("a"), 2, "counts"), Some(3));
        assert_eq!(cache.forget(&key("a"), "counts", Value::Null), json!(3));
        assert_eq!(cache.get(&key("a"), "counts", false), None);
    }

    #[test]
    fn test_remember() {
        let cache = cache();
        let mut calls = 0;
        let value = cache.remember(
            &key("r"),
            Box::new(|| {
                calls += 1;
                json!("generated")
            }),
            "g",
            60,
        );
        assert_eq!(value, json!("generated"));
        assert_eq!(calls, 1);

        let value = cache.remember(
            &key("r"),
            Box::new(|| {
                calls += 1;
                json!("again")
            }),
            "g",
            60,
        );
        assert_eq!(value, json!("generated"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_forget() {
        let cache = cache();
        assert_eq!(cache.forget(&key("f"), "", json!("fallback")), json!("fallback"));
        cache.set(&key("f"), json!("stored"), "", 0);
        assert_eq!(cache.forget(&key("f"), "", json!("fallback")), json!("stored"));
        assert_eq!(cache.get(&key("f"), "", false), None);
    }

    #[test]
    fn test_key_prefix() {
        let config = CacheConfig {
            key_prefix: "site:".to_owned(),
            ..CacheConfig::default()
        };
        let cache = MemoryObjectCache::new(&config);
        assert_eq!(cache.storage_key(&key("a"), "g"), "site:1:g:a");
    }

    const PAST_TTL: Duration = Duration::from_millis(1100);

    #[test]
    fn test_negative_expire_leaves_nothing_stored() {
        let cache = cache();
        cache.add_non_persistent_groups(&["runtime".to_owned()]);
        cache.set(&key("a"), json!(1), "", 0);
        cache.set(&key("b"), json!(2), "runtime", 0);

        assert!(cache.set(&key("a"), json!(10), "", -1));
        assert!(cache.set(&key("b"), json!(20), "runtime", -1));

        assert_eq!(cache.get(&key("a"), "", false), None);
        assert_eq!(cache.get(&key("b"), "runtime", false), None);
        assert!(cache.local.read().unwrap().is_empty());
    }

    #[test]
    fn test_persistent_entry_expires() {
        let cache = cache();
        cache.set(&key("short"), json!("v"), "", 1);
        cache.set(&key("long"), json!("v"), "", 0);
        assert_eq!(cache.get(&key("short"), "", false), Some(json!("v")));

        std::thread::sleep(PAST_TTL);
        assert_eq!(cache.get(&key("short"), "", false), None);
        assert_eq!(cache.get(&key("long"), "", false), Some(json!("v")));
    }

    #[test]
    fn test_non_persistent_entry_expires_and_is_dropped() {
        let cache = cache();
        cache.add_non_persistent_groups(&["runtime".to_owned()]);
        cache.set(&key("a"), json!("v"), "runtime", 1);
        assert_eq!(cache.get(&key("a"), "runtime", false), Some(json!("v")));

        std::thread::sleep(PAST_TTL);
        assert_eq!(cache.get(&key("a"), "runtime", false), None);
        assert!(cache.local.read().unwrap().is_empty());
    }

    #[test]
    fn test_expired_non_persistent_entries_swept_on_write() {
        let cache = cache();
        cache.add_non_persistent_groups(&["runtime".to_owned()]);
        for i in 0..1_000 {
            cache.set(&CacheKey::from(i), json!(i), "runtime", 1);
        }
        assert_eq!(cache.local.read().unwrap().len(), 1_000);

        std::thread::sleep(PAST_TTL);
        for i in 1_000..1_010 {
            cache.set(&CacheKey::from(i), json!(i), "runtime", 0);
        }
        assert_eq!(cache.local.read().unwrap().len(), 10);
    }

    #[test]
    fn test_counter_keeps_remaining_ttl() {
        let cache = cache();
        cache.add_non_persistent_groups(&["runtime".to_owned()]);
        cache.set(&key("n"), json!(1), "", 1);
        cache.set(&key("m"), json!(1), "runtime", 1);
        cache.set(&key("forever"), json!(1), "", 0);

        assert_eq!(cache.incr(&key("n"), 1, ""), Some(2));
        assert_eq!(cache.decr(&key("m"), 1, "runtime"), Some(0));
        assert_eq!(cache.incr(&key("forever"), 1, ""), Some(2));

        std::thread::sleep(PAST_TTL);
        assert_eq!(cache.get(&key("n"), "", false), None);
        assert_eq!(cache.get(&key("m"), "runtime", false), None);
        assert_eq!(cache.get(&key("forever"), "", false), Some(json!(2)));
    }

    #[test]
    fn test_default_ttl_caps_entries() {
        let config = CacheConfig {
            default_ttl: 1,
            ..CacheConfig::default()
        };
        let cache = MemoryObjectCache::new(&config);
        cache.set(&key("unbounded"), json!(1), "", 0);
        cache.set(&key("long"), json!(1), "", 3600);

        std::thread::sleep(PAST_TTL);
        assert_eq!(cache.get(&key("unbounded"), "", false), None);
        assert_eq!(cache.get(&key("long"), "", false), None);
    }

    #[test]
    fn test_delete_is_not_undone_by_concurrent_incr() {
        let cache = cache();
        cache.set(&key("n"), json!(0), "", 0);

        std::thread::scope(|scope| {
            let incrementer = scope.spawn(|| {
                let mut applied = 0u32;
                while applied < 1_000_000 && cache.incr(&key("n"), 1, "").is_some() {
                    applied += 1;
                }
            });

            while cache.get(&key("n"), "", false) == Some(json!(0)) {
                std::thread::yield_now();
            }
            assert!(cache.delete(&key("n"), ""));
            incrementer.join().unwrap();
        });

        assert_eq!(cache.get(&key("n"), "", false), None);
    }
}
