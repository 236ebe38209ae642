//! GoDaddy registered-domain inventory.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use opsboard_core::error::{OpsboardError, Result};
use opsboard_core::traits::Provider;
use opsboard_core::types::{Record, SOURCE_GODADDY};

/// Default API base URL.
const DEFAULT_API_URL: &str = "https://api.godaddy.com";

/// GoDaddy client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoDaddyConfig {
    /// API key
    pub api_key: String,
    /// API secret
    pub api_secret: String,
    /// API base URL
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for GoDaddyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            api_url: DEFAULT_API_URL.into(),
            timeout_seconds: 30,
        }
    }
}

impl GoDaddyConfig {
    /// Creates a configuration with the given key pair.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ..Default::default()
        }
    }

    /// Returns true when both key and secret are present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

/// GoDaddy domain provider.
pub struct GoDaddyProvider {
    config: GoDaddyConfig,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct GdDomain {
    domain: String,
    status: String,
    expires: Option<String>,
    #[serde(rename = "renewAuto")]
    renew_auto: Option<bool>,
}

impl GdDomain {
    fn into_record(self) -> Record {
        let mut record = Record::new(self.domain.clone(), self.domain.clone(), SOURCE_GODADDY)
            .with_domain(self.domain)
            .with_attr("status", self.status);

        if let Some(expires) = self.expires {
            record = record.with_attr("expires", expires);
        }
        if let Some(renew_auto) = self.renew_auto {
            record = record.with_attr("renew_auto", renew_auto);
        }

        record
    }
}

impl GoDaddyProvider {
    /// Creates a provider with the given configuration.
    pub fn with_config(config: GoDaddyConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }
}

#[async_trait]
impl Provider for GoDaddyProvider {
    fn name(&self) -> &'static str {
        SOURCE_GODADDY
    }

    /// Lists registered domains.
    ///
    /// Registrar entries carry their own name as the domain field, so a
    /// domain-filtered aggregation matches the registration itself.
    #[instrument(skip(self, _domain))]
    async fn fetch(&self, _domain: Option<&str>) -> Result<Vec<Record>> {
        if !self.config.is_configured() {
            warn!("GoDaddy credentials not configured; reporting empty inventory");
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/domains", self.config.api_url);
        let response = self
            .http_client
            .get(&url)
            .header(
                "Authorization",
                format!("sso-key {}:{}", self.config.api_key, self.config.api_secret),
            )
            .send()
            .await
            .map_err(|e| OpsboardError::request(SOURCE_GODADDY, e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(OpsboardError::auth(SOURCE_GODADDY, "API key rejected"));
        }
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OpsboardError::request(
                SOURCE_GODADDY,
                format!("{url} returned {status}: {text}"),
            ));
        }

        let domains: Vec<GdDomain> = response
            .json()
            .await
            .map_err(|e| OpsboardError::response(SOURCE_GODADDY, e))?;

        let records: Vec<Record> = domains.into_iter().map(GdDomain::into_record).collect();
        debug!(count = records.len(), "Listed registered domains");
        Ok(records)
    }
}
