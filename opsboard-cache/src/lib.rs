//! TTL cache for Opsboard query results.
//!
//! Generic in-memory cache with per-entry expiration, prefix invalidation,
//! and lazy expiry.

mod cache;

pub use cache::{CacheConfig, CacheStats, TtlCache};
