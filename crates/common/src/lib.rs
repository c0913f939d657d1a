//! Invigil Common Utilities
//!
//! Shared infrastructure for all Invigil crates:
//! - Error types and result aliases
//! - Session clock and elapsed-time formatting
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
