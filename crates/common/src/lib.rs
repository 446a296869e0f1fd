//! gazekit Common Utilities
//!
//! Shared infrastructure for all gazekit crates:
//! - Error types and result aliases
//! - Session clock for timestamping gaze streams
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
