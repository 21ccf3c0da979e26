//! In-memory, TTL-bounded cache sitting in front of storage lookups.
//!
//! Keys are structured strings (`sem:{ownerId}:{hash}`, `mem:{id}`,
//! `stats:{ownerId}`) so a whole family of entries can be invalidated
//! by prefix without the cache needing to know what a "memory" is.

use moka::sync::Cache;
use std::time::Duration;

use crate::strategies::content_hash;

/// Builds the cache key for a single memory lookup.
pub fn memory_key(id: &str) -> String {
    format!("mem:{id}")
}

/// Builds the cache key for a semantic search result, keyed by owner
/// and a hash of the query text so distinct queries don't collide.
pub fn semantic_key(owner_id: &str, query: &str) -> String {
    format!("sem:{owner_id}:{}", content_hash(query.as_bytes()))
}

/// Builds the cache key for an owner's aggregate statistics.
pub fn stats_key(owner_id: &str) -> String {
    format!("stats:{owner_id}")
}

/// A generic TTL + size-bounded cache for JSON-serializable engine
/// results.
pub struct EngineCache {
    entries: Cache<String, String>,
}

impl EngineCache {
    pub fn new(cfg: &crate::config::CacheConfig) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(cfg.max_capacity)
                .time_to_live(Duration::from_secs(cfg.ttl_seconds))
                .build(),
        }
    }

    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|raw| serde_json::from_str(&raw).ok())
    }

    pub fn set<T: serde::Serialize>(&self, key: &str, value: &T) {
        if let Ok(raw) = serde_json::to_string(value) {
            self.entries.insert(key.to_string(), raw);
        }
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
    }

    /// Invalidates every entry whose key starts with `prefix`. Used to
    /// drop cached semantic search results and stats for one owner
    /// after a mutation, without needing a separate index of keys.
    pub fn invalidate_prefix(&self, prefix: &str) {
        let prefix = prefix.to_string();
        self.entries.invalidate_entries_if(move |k, _v| k.starts_with(&prefix)).ok();
    }

    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> crate::config::CacheConfig {
        crate::config::CacheConfig {
            ttl_seconds: 3600,
            max_capacity: 100,
        }
    }

    #[test]
    fn set_and_get_roundtrips() {
        let cache = EngineCache::new(&cfg());
        cache.set(&memory_key("abc"), &42i64);
        assert_eq!(cache.get::<i64>(&memory_key("abc")), Some(42));
    }

    #[test]
    fn invalidate_prefix_clears_matching_keys_only() {
        let cache = EngineCache::new(&cfg());
        cache.set(&semantic_key("u1", "q1"), &"a".to_string());
        cache.set(&semantic_key("u2", "q1"), &"b".to_string());
        cache.run_pending_tasks();

        cache.invalidate_prefix("sem:u1:");
        cache.run_pending_tasks();

        assert_eq!(cache.get::<String>(&semantic_key("u1", "q1")), None);
        assert_eq!(cache.get::<String>(&semantic_key("u2", "q1")), Some("b".to_string()));
    }

    #[test]
    fn semantic_key_is_stable_for_same_query() {
        assert_eq!(semantic_key("u1", "hello"), semantic_key("u1", "hello"));
        assert_ne!(semantic_key("u1", "hello"), semantic_key("u1", "world"));
    }
}
