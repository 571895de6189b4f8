//! Configuration loading
//!
//! Builds a validated [`blobmeter_domain::MeterConfig`] from a config file
//! or from environment variables.

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, load_from_lookup, probe_config_paths};
