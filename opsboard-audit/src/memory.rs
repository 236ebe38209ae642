//! In-memory audit log.
//!
//! Fast, thread-safe storage suitable for development, testing, and
//! deployments that do not need the trail to survive a restart.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use opsboard_core::error::Result;
use opsboard_core::traits::AuditSink;
use opsboard_core::types::{AuditEntry, AuditEvent};

/// In-memory audit log with sequential ids.
#[derive(Debug)]
pub struct MemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
    next_id: AtomicU64,
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuditLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Appends an event synchronously and returns the stored entry.
    ///
    /// The file sink builds on this to serialize exactly what was stored.
    pub fn push(&self, event: AuditEvent) -> AuditEntry {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let entry = AuditEntry::from_event(id, event);
        self.entries.write().push(entry.clone());
        entry
    }

    /// Restores previously persisted entries, keeping id assignment ahead of
    /// the highest replayed id.
    pub fn import(&self, entries: Vec<AuditEntry>) {
        let mut store = self.entries.write();
        for entry in entries {
            let current = self.next_id.load(Ordering::SeqCst);
            if entry.id >= current {
                self.next_id.store(entry.id + 1, Ordering::SeqCst);
            }
            store.push(entry);
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn record(&self, event: AuditEvent) -> Result<u64> {
        let entry = self.push(event);
        debug!(id = entry.id, action = %entry.action, "Recorded audit entry");
        Ok(entry.id)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let entries = self.entries.read();
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.entries.read().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(action: &str, resource_id: &str) -> AuditEvent {
        AuditEvent::new(
            action,
            "user",
            resource_id,
            "system",
            format!("{action} on {resource_id}"),
        )
    }

    #[tokio::test]
    async fn test_record_assigns_sequential_ids() {
        let log = MemoryAuditLog::new();

        let id1 = log.record(make_event("create_user", "u-1")).await.unwrap();
        let id2 = log.record(make_event("disable_user", "u-2")).await.unwrap();

        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
        assert_eq!(log.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_recent_is_newest_first() {
        let log = MemoryAuditLog::new();
        log.record(make_event("create_user", "u-1")).await.unwrap();
        log.record(make_event("disable_user", "u-2")).await.unwrap();
        log.record(make_event("delete_user", "u-3")).await.unwrap();

        let recent = log.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, "delete_user");
        assert_eq!(recent[1].action, "disable_user");
    }

    #[tokio::test]
    async fn test_import_keeps_ids_ahead() {
        let log = MemoryAuditLog::new();
        log.import(vec![
            AuditEntry::from_event(5, make_event("create_user", "u-5")),
            AuditEntry::from_event(6, make_event("delete_user", "u-6")),
        ]);

        let id = log.record(make_event("disable_user", "u-7")).await.unwrap();
        assert_eq!(id, 7);
        assert_eq!(log.len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_record() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let log = Arc::new(MemoryAuditLog::new());
        let mut tasks = JoinSet::new();

        for i in 0..50u32 {
            let log = log.clone();
            tasks.spawn(async move {
                log.record(make_event("create_user", &format!("u-{i}")))
                    .await
                    .unwrap()
            });
        }

        let mut ids = Vec::new();
        while let Some(result) = tasks.join_next().await {
            ids.push(result.unwrap());
        }

        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);
        assert_eq!(log.count().await.unwrap(), 50);
    }
}
