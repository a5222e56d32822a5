//! Meltview Common Utilities
//!
//! Shared infrastructure for all Meltview crates:
//! - Error types and result aliases
//! - Timing utilities for stream synchronization and export frame rates
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
