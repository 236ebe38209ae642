//! Cache-fronted query layer and invalidation coordinator.
//!
//! Cache keys encode query identity: a family prefix plus any filter
//! suffix, so distinct filter values never collide and a whole family can be
//! evicted by prefix after a mutation.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, instrument};

use opsboard_cache::{CacheConfig, CacheStats, TtlCache};
use opsboard_core::error::Result;
use opsboard_core::types::Aggregate;

/// Family prefix for user-listing queries.
pub const USERS_FAMILY: &str = "users:";
/// Family prefix for infrastructure-listing queries.
pub const INFRA_FAMILY: &str = "infra:";
/// Key for the verified-domain listing.
pub const DOMAINS_KEY: &str = "domains";
/// Key for the unfiltered infrastructure listing.
pub const INFRA_KEY: &str = "infra:all";

/// Builds the cache key for a user listing, filtered or not.
pub fn users_key(domain: Option<&str>) -> String {
    match domain {
        Some(domain) => format!("{USERS_FAMILY}{domain}"),
        None => format!("{USERS_FAMILY}all"),
    }
}

/// Fronts cacheable inventory queries with the TTL cache.
///
/// On a hit the stored aggregate is returned without touching any provider;
/// on a miss the compute closure runs once, its result is stored, and then
/// returned. Concurrent misses on a cold key may each compute independently;
/// the underlying providers are idempotent reads, so this is an accepted
/// simplification.
///
/// These four operations (`get_or_compute`, `invalidate_family`,
/// `clear_all`, `stats`) are the entire boundary the rest of the application
/// needs.
pub struct CachedQueries {
    cache: TtlCache<Aggregate>,
}

impl CachedQueries {
    /// Creates a query layer with default cache configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a query layer with custom cache configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            cache: TtlCache::with_config(config),
        }
    }

    /// Returns the cached aggregate for `key`, or computes, stores, and
    /// returns it.
    ///
    /// `ttl` of `None` uses the configured default. A failed computation is
    /// not cached; the next call retries.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<Aggregate>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Aggregate>>,
    {
        if let Some(hit) = self.cache.get(key) {
            debug!(key, "Cache hit");
            return Ok(hit);
        }

        debug!(key, "Cache miss; computing");
        let fresh = compute().await?;

        match ttl {
            Some(ttl) => self.cache.set_with_ttl(key, fresh.clone(), ttl),
            None => self.cache.set(key, fresh.clone()),
        }

        Ok(fresh)
    }

    /// Evicts every cached query in a family, filtered variants included.
    ///
    /// Called after any mutation touching the family's resources. Coarse on
    /// purpose: evicting more than strictly necessary is cheap, while ever
    /// serving stale post-mutation data is not.
    #[instrument(skip(self))]
    pub fn invalidate_family(&self, prefix: &str) -> usize {
        let removed = self.cache.invalidate_prefix(prefix);
        debug!(prefix, removed, "Invalidated query family");
        removed
    }

    /// Evicts everything.
    pub fn clear_all(&self) {
        self.cache.clear();
    }

    /// Point-in-time cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for CachedQueries {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use opsboard_core::error::OpsboardError;
    use opsboard_core::types::{Record, SOURCE_DIRECTORY};

    fn sample_aggregate(tag: &str) -> Aggregate {
        Aggregate::from_records(vec![Record::new(tag, tag, SOURCE_DIRECTORY)])
    }

    #[test]
    fn test_users_key_encodes_filter() {
        assert_eq!(users_key(None), "users:all");
        assert_eq!(users_key(Some("example.com")), "users:example.com");
    }

    #[tokio::test]
    async fn test_compute_runs_once_per_miss() {
        let queries = CachedQueries::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let aggregate = queries
                .get_or_compute("users:all", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(sample_aggregate("alice"))
                })
                .await
                .unwrap();
            assert_eq!(aggregate.total, 1);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_compute_is_not_cached() {
        let queries = CachedQueries::new();
        let calls = AtomicUsize::new(0);

        let result = queries
            .get_or_compute("users:all", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(OpsboardError::request("directory", "boom"))
            })
            .await;
        assert!(result.is_err());

        let aggregate = queries
            .get_or_compute("users:all", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(sample_aggregate("alice"))
            })
            .await
            .unwrap();

        assert_eq!(aggregate.total, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mutation_invalidation_forces_recompute() {
        let queries = CachedQueries::new();

        let before = queries
            .get_or_compute("users:all", None, || async { Ok(sample_aggregate("old")) })
            .await
            .unwrap();
        assert_eq!(before.items[0].id, "old");

        // Simulates the post-mutation invalidation path.
        queries.invalidate_family(USERS_FAMILY);

        let after = queries
            .get_or_compute("users:all", None, || async { Ok(sample_aggregate("new")) })
            .await
            .unwrap();
        assert_eq!(after.items[0].id, "new");
    }

    #[tokio::test]
    async fn test_family_invalidation_spares_unrelated_keys() {
        let queries = CachedQueries::new();

        for key in ["users:all", "users:example.com", DOMAINS_KEY] {
            queries
                .get_or_compute(key, None, || async { Ok(sample_aggregate(key)) })
                .await
                .unwrap();
        }

        let removed = queries.invalidate_family(USERS_FAMILY);
        assert_eq!(removed, 2);

        // Domains listing survives and does not recompute.
        let domains = queries
            .get_or_compute(DOMAINS_KEY, None, || async {
                panic!("domains should still be cached")
            })
            .await
            .unwrap();
        assert_eq!(domains.items[0].id, DOMAINS_KEY);
    }

    #[tokio::test]
    async fn test_custom_ttl_expires() {
        let queries = CachedQueries::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            queries
                .get_or_compute(INFRA_KEY, Some(Duration::from_millis(1)), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(sample_aggregate("web"))
                })
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_all_and_stats() {
        let queries = CachedQueries::new();

        queries
            .get_or_compute("users:all", None, || async { Ok(sample_aggregate("a")) })
            .await
            .unwrap();
        queries
            .get_or_compute(DOMAINS_KEY, None, || async { Ok(sample_aggregate("d")) })
            .await
            .unwrap();

        let stats = queries.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 2);

        queries.clear_all();
        assert_eq!(queries.stats().total_entries, 0);
    }
}
