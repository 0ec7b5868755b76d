//! Cache keys and storage key derivation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name used for the unnamed group when rendering storage keys
pub const DEFAULT_GROUP: &str = "default";

/// A cache key as supplied by callers: either a string or an integer literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Int(i) => write!(f, "{i}"),
            CacheKey::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        CacheKey::Str(s.to_owned())
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        CacheKey::Str(s)
    }
}

impl From<&String> for CacheKey {
    fn from(s: &String) -> Self {
        CacheKey::Str(s.clone())
    }
}

impl From<i64> for CacheKey {
    fn from(i: i64) -> Self {
        CacheKey::Int(i)
    }
}

impl From<i32> for CacheKey {
    fn from(i: i32) -> Self {
        CacheKey::Int(i.into())
    }
}

impl From<u32> for CacheKey {
    fn from(i: u32) -> Self {
        CacheKey::Int(i.into())
    }
}

/// Key under which `get_multi` reports a value: `"group:key"`
pub fn multi_key(group: &str, key: &CacheKey) -> String {
    format!("{group}:{key}")
}

/// Trait for deriving backend storage keys from `(group, key)` pairs
pub trait KeyFormatter: Send + Sync + 'static {
    /// Build the storage key for a key in a blog-scoped group
    fn format_key(&self, blog_id: i64, group: &str, key: &CacheKey) -> String;

    /// Build the storage key for a key in a group shared across blogs
    fn format_global_key(&self, group: &str, key: &CacheKey) -> String;
}

/// Default formatter: `{prefix}{blog_id}:{group}:{key}` or `{prefix}global:{group}:{key}`
#[derive(Debug, Clone, Default)]
pub struct GroupKeyFormatter {
    prefix: String,
}

impl GroupKeyFormatter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

fn group_name(group: &str) -> &str {
    if group.is_empty() {
        DEFAULT_GROUP
    } else {
        group
    }
}

impl KeyFormatter for GroupKeyFormatter {
    fn format_key(&self, blog_id: i64, group: &str, key: &CacheKey) -> String {
        format!("{}{}:{}:{}", self.prefix, blog_id, group_name(group), key)
    }

    fn format_global_key(&self, group: &str, key: &CacheKey) -> String {
        format!("{}global:{}:{}", self.prefix, group_name(group), key)
    }
}
