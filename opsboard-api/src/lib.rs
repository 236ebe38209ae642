//! # Opsboard API Server
//!
//! REST API for the Opsboard dashboard, designed to be consumed by the
//! dashboard frontend.
//!
//! ## Endpoints
//!
//! - `GET /api/domains` - Verified directory domains
//! - `GET /api/users?domain=` - Directory accounts with license spend
//! - `POST /api/users` - Create an account
//! - `POST /api/users/:id/disable` - Disable an account
//! - `DELETE /api/users/:id` - Delete an account
//! - `GET /api/infrastructure` - Merged cloud and registrar inventory
//! - `POST /api/analyze-users` - AI cleanup analysis
//! - `POST /api/ask` - Free-form advisory question
//! - `GET /api/cache/stats`, `POST /api/cache/clear` - Cache diagnostics
//! - `GET /api/audit` - Recent audit entries
//!
//! ## Example
//!
//! ```rust,ignore
//! use opsboard_api::{ApiServer, ApiConfig};
//!
//! let server = ApiServer::new(ApiConfig::from_env());
//! server.run(([0, 0, 0, 0], 8000)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{ApiConfig, AppState};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use opsboard_audit::FileAuditLog;
use opsboard_core::error::Result;

/// API server for Opsboard.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server with an in-memory audit log.
    pub fn new(config: ApiConfig) -> Self {
        Self {
            state: Arc::new(AppState::new(config)),
        }
    }

    /// Creates a server from the given configuration, opening the file audit
    /// log when one is configured.
    pub async fn from_config(config: ApiConfig) -> Result<Self> {
        let state = match &config.audit_log_path {
            Some(path) => {
                let audit = FileAuditLog::new(path).await?;
                info!(path = ?path, "Using file audit log");
                AppState::with_audit(config.clone(), Arc::new(audit))
            }
            None => AppState::new(config),
        };

        Ok(Self {
            state: Arc::new(state),
        })
    }

    /// Creates the router with all routes and layers configured.
    pub fn router(&self) -> Router {
        create_router(self.state.clone())
            .layer(cors_layer(&self.state.config.cors_origins))
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Opsboard API server listening on {}", addr);

        axum::serve(listener, self.router()).await
    }
}

/// Builds the CORS layer from the comma-separated origin list; empty or "*"
/// allows any origin.
fn cors_layer(origins: &str) -> CorsLayer {
    let trimmed = origins.trim();
    if trimmed.is_empty() || trimmed == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let list: Vec<HeaderValue> = trimmed
        .split(',')
        .filter_map(|origin| match origin.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = origin.trim(), "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(list)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Starts the API server with configuration from the environment.
pub async fn start_server(port: u16) -> Result<()> {
    let config = ApiConfig::from_env();
    let server = ApiServer::from_config(config).await?;
    server.run(([0, 0, 0, 0], port)).await?;
    Ok(())
}
