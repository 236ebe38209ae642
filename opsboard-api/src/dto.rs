//! DTOs for API requests and responses.
//!
//! Directory users, domains, and create-user requests go over the wire in
//! their core form; this module holds the shapes that exist only at the API
//! boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use opsboard_cache::CacheStats;
use opsboard_core::types::{AuditEntry, DirectoryUser, Record};

/// Query parameters for the user listing.
#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    /// Restrict the listing to one mail domain
    pub domain: Option<String>,
}

/// Response for the user listing.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    /// The accounts
    pub users: Vec<DirectoryUser>,
    /// Number of accounts
    pub total: usize,
    /// Estimated monthly license spend
    pub monthly_cost: f64,
}

/// Confirmation for a mutation without a richer payload.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    /// Whether the action was applied
    pub success: bool,
    /// Human-readable confirmation
    pub message: String,
}

/// One infrastructure item.
#[derive(Debug, Serialize)]
pub struct InfraItemDto {
    /// Provider-scoped identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Provider tag
    pub source: String,
    /// Monthly cost, when the provider bills monthly
    pub monthly_cost: Option<f64>,
    /// Provider-specific detail fields
    pub details: Map<String, Value>,
}

impl From<Record> for InfraItemDto {
    fn from(record: Record) -> Self {
        Self {
            id: record.id,
            name: record.name,
            source: record.source,
            monthly_cost: record.monthly_cost,
            details: record.attrs,
        }
    }
}

/// Response for the infrastructure listing.
#[derive(Debug, Serialize)]
pub struct InfrastructureResponse {
    /// The merged inventory
    pub items: Vec<InfraItemDto>,
    /// Number of items
    pub total: usize,
    /// Summed monthly cost of the inventory
    pub monthly_cost: f64,
}

/// Response for the account analysis.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// Full advisory text
    pub response: String,
    /// Lines recommending an action on a specific account
    pub recommendations: Vec<String>,
}

/// Request for a free-form advisory question.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// The question
    pub question: String,
    /// Optional context forwarded verbatim
    pub context: Option<Value>,
}

/// Response for a free-form advisory question.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// The advisory answer
    pub response: String,
}

/// Query parameters for the audit listing.
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    /// Maximum entries to return (default 50)
    pub limit: Option<usize>,
}

/// Response for the audit listing.
#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    /// Most recent entries, newest first
    pub entries: Vec<AuditEntry>,
    /// Total entries recorded
    pub total: u64,
}

/// Response for the cache diagnostics endpoint.
#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    /// Entries currently cached
    pub total_entries: usize,
    /// Entries still within their TTL
    pub valid_entries: usize,
    /// Entries past their TTL but not yet evicted
    pub expired_entries: usize,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            total_entries: stats.total_entries,
            valid_entries: stats.valid_entries,
            expired_entries: stats.expired_entries,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Entries currently in the query cache
    pub cache_entries: usize,
}
