//! AWS EC2 inventory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use opsboard_core::error::Result;
use opsboard_core::traits::Provider;
use opsboard_core::types::{Record, SOURCE_AWS};

/// AWS client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Region
    pub region: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: "us-east-1".into(),
        }
    }
}

impl AwsConfig {
    /// Returns true when both key halves are present.
    pub fn is_configured(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

/// AWS EC2 provider.
///
/// Participates in the fan-out so the wiring is exercised, but reports an
/// empty inventory: the EC2 Query API needs SigV4 request signing before
/// DescribeInstances can be issued.
pub struct AwsProvider {
    config: AwsConfig,
}

impl AwsProvider {
    /// Creates a provider with the given configuration.
    pub fn with_config(config: AwsConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Provider for AwsProvider {
    fn name(&self) -> &'static str {
        SOURCE_AWS
    }

    #[instrument(skip(self, _domain))]
    async fn fetch(&self, _domain: Option<&str>) -> Result<Vec<Record>> {
        if !self.config.is_configured() {
            warn!("AWS credentials not configured; reporting empty inventory");
            return Ok(Vec::new());
        }

        // TODO: issue DescribeInstances once a SigV4 signer is in place.
        info!(region = %self.config.region, "EC2 inventory not wired up yet; reporting empty");
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_reports_empty() {
        let provider = AwsProvider::with_config(AwsConfig::default());
        assert!(provider.fetch(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_configured_still_reports_empty() {
        let provider = AwsProvider::with_config(AwsConfig {
            access_key_id: "AKIA".into(),
            secret_access_key: "secret".into(),
            ..Default::default()
        });
        assert_eq!(provider.name(), SOURCE_AWS);
        assert!(provider.fetch(None).await.unwrap().is_empty());
    }
}
