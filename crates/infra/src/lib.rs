//! # Blobmeter Infrastructure
//!
//! Process-facing plumbing around the metering engine.
//!
//! This crate contains:
//! - Configuration loading from files and `BLOBMETER_*` environment variables
//! - The `tracing` subscriber bootstrap
//!
//! ## Architecture
//! - Depends on `blobmeter-common` and `blobmeter-domain`
//! - Contains the "impure" code (filesystem, environment, global subscriber)

pub mod config;
pub mod logging;

// Re-export commonly used items
pub use config::{load, load_from_env, load_from_file};
pub use logging::init as init_logging;
