//! File-backed audit log with persistence.
//!
//! Stores one JSON entry per line. The file is replayed into memory on open
//! and each new entry is appended immediately, so the trail survives
//! restarts without a separate flush step.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use opsboard_core::error::{OpsboardError, Result};
use opsboard_core::traits::AuditSink;
use opsboard_core::types::{AuditEntry, AuditEvent};

use crate::MemoryAuditLog;

/// File-backed audit log.
///
/// Uses a memory log internally for queries; the file is the durable copy.
pub struct FileAuditLog {
    path: PathBuf,
    memory: MemoryAuditLog,
}

impl FileAuditLog {
    /// Opens the audit log at the given path.
    ///
    /// An existing file is replayed; a missing file is created on the first
    /// record.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let log = Self {
            path,
            memory: MemoryAuditLog::new(),
        };

        if log.path.exists() {
            log.load().await?;
        }

        Ok(log)
    }

    /// Replays the file into the in-memory index.
    #[instrument(skip(self))]
    async fn load(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path).await?;

        let mut entries = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: AuditEntry = serde_json::from_str(line).map_err(|e| {
                OpsboardError::Audit(format!(
                    "corrupt entry at {}:{}: {e}",
                    self.path.display(),
                    number + 1
                ))
            })?;
            entries.push(entry);
        }

        info!(count = entries.len(), path = ?self.path, "Replayed audit log");
        self.memory.import(entries);
        Ok(())
    }

    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}

#[async_trait]
impl AuditSink for FileAuditLog {
    async fn record(&self, event: AuditEvent) -> Result<u64> {
        let entry = self.memory.push(event);
        self.append(&entry).await?;
        debug!(id = entry.id, action = %entry.action, "Persisted audit entry");
        Ok(entry.id)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        self.memory.recent(limit).await
    }

    async fn count(&self) -> Result<u64> {
        self.memory.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

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
    async fn test_new_empty_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let log = FileAuditLog::new(&path).await.unwrap();
        assert!(log.is_empty());
        assert!(!path.exists()); // File not created until the first record
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        {
            let log = FileAuditLog::new(&path).await.unwrap();
            log.record(make_event("create_user", "u-1")).await.unwrap();
            log.record(make_event("disable_user", "u-2")).await.unwrap();
        }

        let log = FileAuditLog::new(&path).await.unwrap();
        assert_eq!(log.len(), 2);

        let recent = log.recent(10).await.unwrap();
        assert_eq!(recent[0].action, "disable_user");
        assert_eq!(recent[1].action, "create_user");
    }

    #[tokio::test]
    async fn test_ids_continue_after_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        {
            let log = FileAuditLog::new(&path).await.unwrap();
            log.record(make_event("create_user", "u-1")).await.unwrap();
        }

        let log = FileAuditLog::new(&path).await.unwrap();
        let id = log.record(make_event("delete_user", "u-2")).await.unwrap();
        assert_eq!(id, 2);
    }

    #[tokio::test]
    async fn test_corrupt_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        fs::write(&path, "not json\n").await.unwrap();

        let result = FileAuditLog::new(&path).await;
        assert!(matches!(result, Err(OpsboardError::Audit(_))));
    }

    #[tokio::test]
    async fn test_blank_lines_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        {
            let log = FileAuditLog::new(&path).await.unwrap();
            log.record(make_event("create_user", "u-1")).await.unwrap();
        }
        // A trailing blank line must not break replay
        let mut contents = fs::read_to_string(&path).await.unwrap();
        contents.push('\n');
        fs::write(&path, contents).await.unwrap();

        let log = FileAuditLog::new(&path).await.unwrap();
        assert_eq!(log.len(), 1);
    }
}
