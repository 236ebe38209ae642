//! Error types for Opsboard.
//!
//! This module provides the error hierarchy using `thiserror`. Provider
//! failures carry the provider tag so the aggregation layer can report which
//! collaborator degraded without aborting the others.

use thiserror::Error;

/// Result type alias using `OpsboardError`.
pub type Result<T> = std::result::Result<T, OpsboardError>;

/// Main error type for all Opsboard operations.
#[derive(Debug, Error)]
pub enum OpsboardError {
    // ═══════════════════════════════════════════════════════════════════════════
    // PROVIDER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Authentication against an external provider failed.
    #[error("{provider} authentication failed: {reason}")]
    ProviderAuth {
        /// Provider tag (e.g. "directory", "digitalocean")
        provider: String,
        /// What went wrong
        reason: String,
    },

    /// A provider request failed at the transport level.
    #[error("{provider} request failed: {reason}")]
    ProviderRequest {
        /// Provider tag
        provider: String,
        /// What went wrong
        reason: String,
    },

    /// A provider returned a payload that could not be interpreted.
    #[error("{provider} returned an invalid response: {reason}")]
    ProviderResponse {
        /// Provider tag
        provider: String,
        /// What went wrong
        reason: String,
    },

    /// A provider call exceeded its deadline.
    #[error("{provider} timed out after {seconds}s")]
    ProviderTimeout {
        /// Provider tag
        provider: String,
        /// Deadline that was exceeded
        seconds: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // DIRECTORY ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Directory account not found.
    #[error("user not found: {0}")]
    UserNotFound(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The audit log rejected or failed to persist an entry.
    #[error("audit log error: {0}")]
    Audit(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required credential or setting is absent.
    #[error("configuration error: {0}")]
    Config(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl OpsboardError {
    /// Builds a [`OpsboardError::ProviderAuth`].
    pub fn auth(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::ProviderAuth {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds a [`OpsboardError::ProviderRequest`].
    pub fn request(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::ProviderRequest {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds a [`OpsboardError::ProviderResponse`].
    pub fn response(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::ProviderResponse {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            OpsboardError::ProviderRequest { .. } | OpsboardError::ProviderTimeout { .. }
        )
    }

    /// Returns true if this is a provider-side failure that the fan-out
    /// isolates to a single collaborator.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            OpsboardError::ProviderAuth { .. }
                | OpsboardError::ProviderRequest { .. }
                | OpsboardError::ProviderResponse { .. }
                | OpsboardError::ProviderTimeout { .. }
        )
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, OpsboardError::Validation(_))
    }
}
