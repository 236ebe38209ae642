//! Concurrent fan-out over inventory providers.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use opsboard_core::traits::Provider;
use opsboard_core::types::{Aggregate, Record};

/// Aggregator configuration.
#[derive(Clone, Debug)]
pub struct AggregatorConfig {
    /// Deadline applied to each provider call independently.
    pub provider_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(15),
        }
    }
}

/// Fans an inventory query out to every provider concurrently and merges the
/// successful results.
///
/// The central guarantee is failure isolation: a provider that errors, times
/// out, or panics contributes zero records and never aborts or cancels its
/// siblings. Partial data is preferred over total failure, so even all
/// providers failing yields an empty aggregate rather than an error. Callers
/// that need a sole provider's failure surfaced (the directory queries) call
/// that provider directly instead of going through here.
pub struct Aggregator {
    providers: Vec<Arc<dyn Provider>>,
    config: AggregatorConfig,
}

impl Aggregator {
    /// Creates an aggregator over the given providers with default
    /// configuration.
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self::with_config(providers, AggregatorConfig::default())
    }

    /// Creates an aggregator with custom configuration.
    pub fn with_config(providers: Vec<Arc<dyn Provider>>, config: AggregatorConfig) -> Self {
        Self { providers, config }
    }

    /// Number of configured providers.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Fetches from every provider concurrently and merges the results.
    ///
    /// Results keep provider iteration order (then within-provider order)
    /// regardless of which call finishes first. When a domain filter is
    /// given it is also applied uniformly to the merged records, so filter
    /// semantics do not depend on which provider produced a record.
    #[instrument(skip(self))]
    pub async fn collect(&self, domain: Option<&str>) -> Aggregate {
        let timeout = self.config.provider_timeout;
        let mut tasks = JoinSet::new();

        for (index, provider) in self.providers.iter().enumerate() {
            let provider = Arc::clone(provider);
            let domain = domain.map(str::to_string);
            tasks.spawn(async move {
                let name = provider.name();
                let result = tokio::time::timeout(timeout, provider.fetch(domain.as_deref())).await;
                (index, name, result)
            });
        }

        // Indexed slots keep merge order independent of completion order.
        let mut slots: Vec<Option<Vec<Record>>> = vec![None; self.providers.len()];

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, name, Ok(Ok(records)))) => {
                    debug!(provider = name, count = records.len(), "Provider fetch succeeded");
                    slots[index] = Some(records);
                }
                Ok((_, name, Ok(Err(err)))) => {
                    warn!(provider = name, error = %err, "Provider fetch failed; continuing without it");
                }
                Ok((_, name, Err(_))) => {
                    warn!(
                        provider = name,
                        timeout_secs = timeout.as_secs(),
                        "Provider fetch timed out; continuing without it"
                    );
                }
                Err(err) => {
                    warn!(error = %err, "Provider task aborted; continuing without it");
                }
            }
        }

        let mut items: Vec<Record> = slots.into_iter().flatten().flatten().collect();
        if let Some(domain) = domain {
            items.retain(|record| record.matches_domain(domain));
        }

        let aggregate = Aggregate::from_records(items);
        debug!(
            total = aggregate.total,
            monthly_cost = aggregate.monthly_cost,
            "Aggregation complete"
        );
        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use opsboard_core::error::{OpsboardError, Result};
    use opsboard_core::types::{SOURCE_DIGITALOCEAN, SOURCE_GODADDY};

    struct StaticProvider {
        name: &'static str,
        records: Vec<Record>,
        delay: Duration,
    }

    impl StaticProvider {
        fn new(name: &'static str, records: Vec<Record>) -> Self {
            Self {
                name,
                records,
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl Provider for StaticProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, _domain: Option<&str>) -> Result<Vec<Record>> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.records.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self, _domain: Option<&str>) -> Result<Vec<Record>> {
            Err(OpsboardError::request("failing", "connection refused"))
        }
    }

    struct PanickingProvider;

    #[async_trait]
    impl Provider for PanickingProvider {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn fetch(&self, _domain: Option<&str>) -> Result<Vec<Record>> {
            panic!("provider bug");
        }
    }

    fn droplets(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                Record::new(format!("d-{i}"), format!("web-{i}"), SOURCE_DIGITALOCEAN)
                    .with_monthly_cost(6.0)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_survivors() {
        let aggregator = Aggregator::new(vec![
            Arc::new(StaticProvider::new("static", droplets(3))),
            Arc::new(FailingProvider),
        ]);

        let aggregate = aggregator.collect(None).await;
        assert_eq!(aggregate.total, 3);
        assert_eq!(aggregate.items.len(), 3);
    }

    #[tokio::test]
    async fn test_all_failing_yields_empty_aggregate() {
        let aggregator = Aggregator::new(vec![
            Arc::new(FailingProvider) as Arc<dyn Provider>,
            Arc::new(FailingProvider),
        ]);

        let aggregate = aggregator.collect(None).await;
        assert_eq!(aggregate.total, 0);
        assert!(aggregate.items.is_empty());
        assert_eq!(aggregate.monthly_cost, 0.0);
    }

    #[tokio::test]
    async fn test_failed_provider_contributes_no_cost() {
        let aggregator = Aggregator::new(vec![
            Arc::new(StaticProvider::new("static", droplets(2))),
            Arc::new(FailingProvider),
        ]);

        let aggregate = aggregator.collect(None).await;
        assert!((aggregate.monthly_cost - 12.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_merge_keeps_provider_order() {
        // The first provider is slower; its records must still come first.
        let slow = StaticProvider::new(
            "slow",
            vec![Record::new("first", "first", SOURCE_DIGITALOCEAN)],
        )
        .with_delay(Duration::from_millis(50));
        let fast = StaticProvider::new(
            "fast",
            vec![Record::new("second", "second", SOURCE_GODADDY)],
        );

        let aggregator = Aggregator::new(vec![Arc::new(slow), Arc::new(fast)]);
        let aggregate = aggregator.collect(None).await;

        assert_eq!(aggregate.items[0].id, "first");
        assert_eq!(aggregate.items[1].id, "second");
    }

    #[tokio::test]
    async fn test_hung_provider_is_timed_out() {
        let hung = StaticProvider::new("hung", droplets(5)).with_delay(Duration::from_secs(60));
        let aggregator = Aggregator::with_config(
            vec![
                Arc::new(hung) as Arc<dyn Provider>,
                Arc::new(StaticProvider::new("static", droplets(1))),
            ],
            AggregatorConfig {
                provider_timeout: Duration::from_millis(50),
            },
        );

        let aggregate = aggregator.collect(None).await;
        assert_eq!(aggregate.total, 1);
    }

    #[tokio::test]
    async fn test_panicking_provider_does_not_taint_siblings() {
        let aggregator = Aggregator::new(vec![
            Arc::new(PanickingProvider) as Arc<dyn Provider>,
            Arc::new(StaticProvider::new("static", droplets(2))),
        ]);

        let aggregate = aggregator.collect(None).await;
        assert_eq!(aggregate.total, 2);
    }

    #[tokio::test]
    async fn test_domain_filter_applied_uniformly() {
        let records = vec![
            Record::new("example.com", "example.com", SOURCE_GODADDY).with_domain("example.com"),
            Record::new("other.org", "other.org", SOURCE_GODADDY).with_domain("other.org"),
            Record::new("d-1", "web-1", SOURCE_DIGITALOCEAN),
        ];
        let aggregator = Aggregator::new(vec![Arc::new(StaticProvider::new("static", records))]);

        let aggregate = aggregator.collect(Some("example.com")).await;
        assert_eq!(aggregate.total, 1);
        assert_eq!(aggregate.items[0].id, "example.com");
    }

    #[tokio::test]
    async fn test_no_providers_yields_empty() {
        let aggregator = Aggregator::new(Vec::new());
        let aggregate = aggregator.collect(None).await;
        assert_eq!(aggregate.total, 0);
    }
}
