//! Multi-provider aggregation core for Opsboard.
//!
//! Two pieces live here:
//!
//! - [`Aggregator`] - fans one inventory query out to every configured
//!   provider concurrently, tolerates individual provider failure, and
//!   merges the survivors into one [`opsboard_core::Aggregate`].
//! - [`CachedQueries`] - fronts cacheable queries with the TTL cache and
//!   coordinates coarse family invalidation after mutations.

mod aggregator;
mod queries;

pub use aggregator::{Aggregator, AggregatorConfig};
pub use queries::{
    users_key, CachedQueries, DOMAINS_KEY, INFRA_FAMILY, INFRA_KEY, USERS_FAMILY,
};
