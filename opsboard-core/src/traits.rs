//! Common traits for Opsboard.
//!
//! These traits define the capability seams between the aggregation core and
//! its external collaborators, enabling modularity and testing.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AuditEntry, AuditEvent, Record};

// ═══════════════════════════════════════════════════════════════════════════════
// PROVIDER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for an external inventory source.
///
/// One implementation exists per external system (identity directory, each
/// cloud backend, the domain registrar). Each is independently constructed
/// and independently fallible: the aggregator isolates one provider's failure
/// from the others.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable tag identifying this provider (also used as the `source` field
    /// on the records it produces).
    fn name(&self) -> &'static str;

    /// Fetches the provider's inventory, optionally scoped to a mail/DNS
    /// domain for providers that can filter natively.
    ///
    /// Returns records in the provider's own stable order. A provider with
    /// missing credentials should log a warning and return an empty listing
    /// rather than fail, so partially configured deployments still aggregate.
    async fn fetch(&self, domain: Option<&str>) -> Result<Vec<Record>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUDIT SINK TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for audit-log persistence.
///
/// Invoked by mutating handlers after a successful provider mutation. Not
/// consumed by the cache or aggregator.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends an event to the log.
    ///
    /// Returns the assigned entry ID.
    async fn record(&self, event: AuditEvent) -> Result<u64>;

    /// Returns the most recent entries, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>>;

    /// Returns the total number of entries.
    async fn count(&self) -> Result<u64>;
}
