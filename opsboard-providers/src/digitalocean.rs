//! DigitalOcean droplet inventory.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use opsboard_core::error::{OpsboardError, Result};
use opsboard_core::traits::Provider;
use opsboard_core::types::{Record, SOURCE_DIGITALOCEAN};

/// Default API base URL.
const DEFAULT_API_URL: &str = "https://api.digitalocean.com/v2";

/// DigitalOcean client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DigitalOceanConfig {
    /// Personal access token
    pub token: String,
    /// API base URL
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DigitalOceanConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: DEFAULT_API_URL.into(),
            timeout_seconds: 30,
        }
    }
}

impl DigitalOceanConfig {
    /// Creates a configuration with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    /// Returns true when the access token is present.
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty()
    }
}

/// DigitalOcean droplet provider.
pub struct DigitalOceanProvider {
    config: DigitalOceanConfig,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct DropletsPage {
    #[serde(default = "Vec::new")]
    droplets: Vec<Droplet>,
    #[serde(default)]
    links: Links,
}

#[derive(Default, Deserialize)]
struct Links {
    #[serde(default)]
    pages: Pages,
}

#[derive(Default, Deserialize)]
struct Pages {
    next: Option<String>,
}

#[derive(Deserialize)]
struct Droplet {
    id: u64,
    name: String,
    status: String,
    region: Option<DropletRegion>,
    size: Option<DropletSize>,
}

#[derive(Deserialize)]
struct DropletRegion {
    slug: String,
}

#[derive(Deserialize)]
struct DropletSize {
    slug: String,
    price_monthly: Option<f64>,
}

impl Droplet {
    fn into_record(self) -> Record {
        let mut record = Record::new(self.id.to_string(), self.name, SOURCE_DIGITALOCEAN)
            .with_attr("status", self.status);

        if let Some(region) = self.region {
            record = record.with_attr("region", region.slug);
        }
        if let Some(size) = self.size {
            record = record.with_attr("size", size.slug);
            if let Some(price) = size.price_monthly {
                record = record.with_monthly_cost(price);
            }
        }

        record
    }
}

impl DigitalOceanProvider {
    /// Creates a provider with the given configuration.
    pub fn with_config(config: DigitalOceanConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    async fn get_page(&self, url: &str) -> Result<DropletsPage> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| OpsboardError::request(SOURCE_DIGITALOCEAN, e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(OpsboardError::auth(
                SOURCE_DIGITALOCEAN,
                "access token rejected",
            ));
        }
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OpsboardError::request(
                SOURCE_DIGITALOCEAN,
                format!("{url} returned {status}: {text}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| OpsboardError::response(SOURCE_DIGITALOCEAN, e))
    }
}

#[async_trait]
impl Provider for DigitalOceanProvider {
    fn name(&self) -> &'static str {
        SOURCE_DIGITALOCEAN
    }

    /// Lists all droplets, following page links.
    ///
    /// Droplets have no mail domain, so a domain filter is left to the
    /// aggregator's uniform post-merge pass.
    #[instrument(skip(self, _domain))]
    async fn fetch(&self, _domain: Option<&str>) -> Result<Vec<Record>> {
        if !self.config.is_configured() {
            warn!("DigitalOcean token not configured; reporting empty inventory");
            return Ok(Vec::new());
        }

        let mut url = format!("{}/droplets?per_page=200", self.config.api_url);
        let mut records = Vec::new();

        loop {
            let page = self.get_page(&url).await?;
            records.extend(page.droplets.into_iter().map(Droplet::into_record));

            match page.links.pages.next {
                Some(next) => url = next,
                None => break,
            }
        }

        debug!(count = records.len(), "Listed droplets");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_provider(server: &MockServer) -> DigitalOceanProvider {
        DigitalOceanProvider::with_config(DigitalOceanConfig {
            token: "do-token".into(),
            api_url: server.uri(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_fetch_maps_droplets() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/droplets"))
            .and(header("authorization", "Bearer do-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "droplets": [
                    {
                        "id": 1234,
                        "name": "web-1",
                        "status": "active",
                        "region": { "slug": "nyc3" },
                        "size": { "slug": "s-1vcpu-1gb", "price_monthly": 6.0 },
                    },
                    {
                        "id": 5678,
                        "name": "db-1",
                        "status": "off",
                        "region": { "slug": "ams3" },
                        "size": { "slug": "s-2vcpu-4gb", "price_monthly": 24.0 },
                    },
                ],
                "links": {},
            })))
            .mount(&server)
            .await;

        let records = test_provider(&server).fetch(None).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1234");
        assert_eq!(records[0].source, SOURCE_DIGITALOCEAN);
        assert_eq!(records[0].monthly_cost, Some(6.0));
        assert_eq!(records[0].attrs["region"], "nyc3");
        assert_eq!(records[1].attrs["status"], "off");
    }

    #[tokio::test]
    async fn test_fetch_follows_page_links() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/droplets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "droplets": [
                    { "id": 1, "name": "web-1", "status": "active" },
                ],
                "links": { "pages": { "next": format!("{}/droplets-page-2", server.uri()) } },
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/droplets-page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "droplets": [
                    { "id": 2, "name": "web-2", "status": "active" },
                ],
            })))
            .mount(&server)
            .await;

        let records = test_provider(&server).fetch(None).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, "2");
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/droplets"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = test_provider(&server).fetch(None).await.unwrap_err();
        assert!(matches!(err, OpsboardError::ProviderAuth { .. }));
        assert!(err.is_provider_error());
    }

    #[tokio::test]
    async fn test_unconfigured_reports_empty() {
        let provider = DigitalOceanProvider::with_config(DigitalOceanConfig::default());
        let records = provider.fetch(None).await.unwrap();
        assert!(records.is_empty());
    }
}
