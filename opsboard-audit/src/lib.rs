//! Audit-log sinks for Opsboard.
//!
//! Mutating handlers record who did what to which resource through the
//! [`opsboard_core::AuditSink`] capability. Two implementations:
//!
//! - [`MemoryAuditLog`] - in-memory, for development and tests
//! - [`FileAuditLog`] - append-only JSONL file, replayed on startup

mod file;
mod memory;

pub use file::FileAuditLog;
pub use memory::MemoryAuditLog;
