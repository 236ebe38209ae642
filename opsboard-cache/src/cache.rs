//! In-memory TTL cache for query results.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Cache entry with TTL.
#[derive(Clone)]
struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default TTL in seconds
    pub default_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 3600,
        }
    }
}

/// In-memory cache mapping string keys to values with a TTL.
///
/// Thread-safe. Entries leave the cache only through expiry or explicit
/// invalidation; there is no size-based eviction, because keys form a small
/// enumerable set of query shapes. Expiry is lazy: an entry past its TTL is
/// treated as absent and removed the next time `get` touches it, so no
/// background sweeper is needed.
pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    config: CacheConfig,
}

impl<T: Clone> TtlCache<T> {
    /// Creates a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Gets a cached value if it exists and has not expired.
    ///
    /// An expired entry is evicted here rather than left for a sweeper; the
    /// expiry is re-checked after taking the write lock so the check and the
    /// removal are atomic.
    pub fn get(&self, key: &str) -> Option<T> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(e) if !e.is_expired() => return Some(e.value.clone()),
                Some(_) => {} // expired; fall through to evict
            }
        }

        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| e.is_expired()) {
            entries.remove(key);
        }
        None
    }

    /// Caches a value with the default TTL, overwriting any existing entry.
    pub fn set(&self, key: &str, value: T) {
        self.set_with_ttl(key, value, Duration::from_secs(self.config.default_ttl_seconds));
    }

    /// Caches a value with a custom TTL, overwriting any existing entry.
    pub fn set_with_ttl(&self, key: &str, value: T, ttl: Duration) {
        self.entries.write().insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Removes a cached entry; no-op when the key is absent.
    pub fn invalidate(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Removes every entry whose key starts with the given prefix.
    ///
    /// This is the family-invalidation primitive: a mutating operation
    /// evicts the whole query family, filtered variants included, rather
    /// than ever risking a stale post-mutation read.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Returns the number of cached entries, expired-but-unevicted included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns cache statistics.
    ///
    /// Point-in-time diagnostic; unlike `get`, it does not evict, so the
    /// expired count can transiently exceed zero.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| e.is_expired()).count();
        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len().saturating_sub(expired),
        }
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently in the map.
    pub total_entries: usize,
    /// Entries past their TTL but not yet evicted.
    pub expired_entries: usize,
    /// Entries still within their TTL.
    pub valid_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_set_get() {
        let cache = TtlCache::new();
        cache.set("users:all", "payload".to_string());
        assert_eq!(cache.get("users:all").as_deref(), Some("payload"));
    }

    #[test]
    fn test_cache_miss() {
        let cache: TtlCache<String> = TtlCache::new();
        assert!(cache.get("nonexistent").is_none());
    }

    #[test]
    fn test_cache_overwrite() {
        let cache = TtlCache::new();
        cache.set("users:all", 1u32);
        cache.set("users:all", 2u32);
        assert_eq!(cache.get("users:all"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_invalidate() {
        let cache = TtlCache::new();
        cache.set("users:all", 1u32);
        cache.invalidate("users:all");
        assert!(cache.get("users:all").is_none());

        // Invalidating an absent key is a no-op
        cache.invalidate("users:all");
    }

    #[test]
    fn test_cache_clear() {
        let cache = TtlCache::new();
        cache.set("users:all", 1u32);
        cache.set("domains", 2u32);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("users:all").is_none());
        assert!(cache.get("domains").is_none());
    }

    #[test]
    fn test_cache_ttl_expiration() {
        let cache = TtlCache::new();
        cache.set_with_ttl("users:all", 1u32, Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("users:all").is_none());
    }

    #[test]
    fn test_get_evicts_expired_entry() {
        let cache = TtlCache::new();
        cache.set_with_ttl("users:all", 1u32, Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(cache.len(), 1);
        assert!(cache.get("users:all").is_none());
        // The touch removed the expired entry
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_stats_does_not_evict() {
        let cache = TtlCache::new();
        cache.set_with_ttl("users:all", 1u32, Duration::from_millis(1));
        cache.set("domains", 2u32);
        std::thread::sleep(Duration::from_millis(10));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.valid_entries, 1);
        // Stats is a read-only diagnostic
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_expired_entry_not_counted_valid() {
        let cache = TtlCache::new();
        cache.set_with_ttl("users:all", 1u32, Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));

        assert!(cache.get("users:all").is_none());
        let stats = cache.stats();
        assert_eq!(stats.valid_entries, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_invalidate_prefix_spares_unrelated_keys() {
        let cache = TtlCache::new();
        cache.set("users:all", 1u32);
        cache.set("users:example.com", 2u32);
        cache.set("domains", 3u32);

        let removed = cache.invalidate_prefix("users:");
        assert_eq!(removed, 2);
        assert!(cache.get("users:all").is_none());
        assert!(cache.get("users:example.com").is_none());
        assert_eq!(cache.get("domains"), Some(3));
    }

    #[test]
    fn test_invalidate_prefix_without_matches() {
        let cache = TtlCache::new();
        cache.set("domains", 1u32);
        assert_eq!(cache.invalidate_prefix("users:"), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;

        let cache = Arc::new(TtlCache::new());
        let mut handles = Vec::new();

        for i in 0..8u32 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                let key = format!("users:{i}");
                cache.set(&key, i);
                assert_eq!(cache.get(&key), Some(i));
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 8);
    }
}
