//! App state: providers, aggregator, cache-fronted queries, advisor, audit.

use std::path::PathBuf;
use std::sync::Arc;

use opsboard_advisor::{Advisor, AdvisorConfig};
use opsboard_audit::MemoryAuditLog;
use opsboard_cache::CacheConfig;
use opsboard_core::traits::{AuditSink, Provider};
use opsboard_inventory::{Aggregator, CachedQueries};
use opsboard_providers::{
    AwsConfig, AwsProvider, DigitalOceanConfig, DigitalOceanProvider, DirectoryConfig,
    GoDaddyConfig, GoDaddyProvider, GraphDirectory,
};

/// Server configuration, collected from the environment.
#[derive(Clone, Debug, Default)]
pub struct ApiConfig {
    /// Identity directory credentials
    pub directory: DirectoryConfig,
    /// DigitalOcean credentials
    pub digitalocean: DigitalOceanConfig,
    /// AWS credentials
    pub aws: AwsConfig,
    /// GoDaddy credentials
    pub godaddy: GoDaddyConfig,
    /// Advisor credentials
    pub advisor: AdvisorConfig,
    /// Query cache configuration
    pub cache: CacheConfig,
    /// Comma-separated CORS origins; empty or "*" allows any
    pub cors_origins: String,
    /// Audit log file; in-memory when unset
    pub audit_log_path: Option<PathBuf>,
}

impl ApiConfig {
    /// Builds the configuration from environment variables, loading `.env`
    /// first when present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut directory = DirectoryConfig::new(
            env_or_default("MICROSOFT_TENANT_ID"),
            env_or_default("MICROSOFT_CLIENT_ID"),
            env_or_default("MICROSOFT_CLIENT_SECRET"),
        );
        if let Ok(url) = std::env::var("MICROSOFT_GRAPH_URL") {
            directory.graph_url = url;
        }

        let mut aws = AwsConfig {
            access_key_id: env_or_default("AWS_ACCESS_KEY_ID"),
            secret_access_key: env_or_default("AWS_SECRET_ACCESS_KEY"),
            ..Default::default()
        };
        if let Ok(region) = std::env::var("AWS_REGION") {
            aws.region = region;
        }

        let advisor = AdvisorConfig {
            api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            ..Default::default()
        };

        let mut cache = CacheConfig::default();
        if let Some(ttl) = std::env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            cache.default_ttl_seconds = ttl;
        }

        Self {
            directory,
            digitalocean: DigitalOceanConfig::new(env_or_default("DO_TOKEN")),
            aws,
            godaddy: GoDaddyConfig::new(
                env_or_default("GODADDY_API_KEY"),
                env_or_default("GODADDY_API_SECRET"),
            ),
            advisor,
            cache,
            cors_origins: std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".into()),
            audit_log_path: std::env::var("AUDIT_LOG_PATH").ok().map(PathBuf::from),
        }
    }
}

fn env_or_default(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

/// Shared application state, injected into every handler as an `Arc`.
pub struct AppState {
    /// Server configuration.
    pub config: ApiConfig,
    /// Identity directory client (the single-provider query path).
    pub directory: GraphDirectory,
    /// Infrastructure fan-out over the cloud and registrar providers.
    pub aggregator: Aggregator,
    /// Cache-fronted query layer.
    pub queries: CachedQueries,
    /// AI advisory client.
    pub advisor: Advisor,
    /// Audit sink for mutations.
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    /// Creates state with an in-memory audit log.
    pub fn new(config: ApiConfig) -> Self {
        Self::with_audit(config, Arc::new(MemoryAuditLog::new()))
    }

    /// Creates state with the given audit sink.
    pub fn with_audit(config: ApiConfig, audit: Arc<dyn AuditSink>) -> Self {
        let providers: Vec<Arc<dyn Provider>> = vec![
            Arc::new(DigitalOceanProvider::with_config(config.digitalocean.clone())),
            Arc::new(AwsProvider::with_config(config.aws.clone())),
            Arc::new(GoDaddyProvider::with_config(config.godaddy.clone())),
        ];

        Self {
            directory: GraphDirectory::with_config(config.directory.clone()),
            aggregator: Aggregator::new(providers),
            queries: CachedQueries::with_config(config.cache.clone()),
            advisor: Advisor::with_config(config.advisor.clone()),
            audit,
            config,
        }
    }
}
