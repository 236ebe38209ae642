//! # Opsboard Core
//!
//! Core types, errors, and traits for the Opsboard administrative dashboard
//! backend.
//!
//! This crate provides the foundational building blocks used by all other
//! Opsboard crates:
//!
//! - **Types**: Provider-agnostic inventory records, aggregates, directory
//!   accounts, and audit entries
//! - **Errors**: Comprehensive error types with context
//! - **Traits**: The `Provider` and `AuditSink` capabilities consumed by the
//!   aggregation core
//!
//! ## Example
//!
//! ```rust
//! use opsboard_core::{Aggregate, Record, SOURCE_DIGITALOCEAN};
//!
//! let record = Record::new("1234", "web-1", SOURCE_DIGITALOCEAN).with_monthly_cost(6.0);
//! let aggregate = Aggregate::from_records(vec![record]);
//! assert_eq!(aggregate.total, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{OpsboardError, Result};
pub use traits::*;
pub use types::*;
