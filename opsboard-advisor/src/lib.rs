//! AI-assisted advisory for Opsboard.
//!
//! Wraps the Claude Messages API to analyze directory accounts for cleanup
//! candidates and to answer free-form administrative questions.

mod advisor;

pub use advisor::{Advisor, AdvisorConfig, Analysis};
