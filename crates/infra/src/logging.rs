//! Tracing subscriber bootstrap
//!
//! `RUST_LOG` wins when set; otherwise the configured level is used as the
//! filter directive.

use blobmeter_common::{CommonError, CommonResult};
use blobmeter_domain::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// # Errors
/// Returns `CommonError::Config` for an unparsable level and
/// `CommonError::Internal` when a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> CommonResult<()> {
    let filter = env_filter(&config.level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let installed = if config.json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|e| CommonError::internal_with_context(e.to_string(), "logging::init"))?;

    tracing::debug!(level = %config.level, json = config.json, "Logging initialized");
    Ok(())
}

/// Filter from `RUST_LOG`, falling back to `level`.
pub fn env_filter(level: &str) -> CommonResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => filter_for_level(level),
    }
}

/// Filter from an explicit directive string such as `info` or
/// `blobmeter_core=debug,warn`.
pub fn filter_for_level(level: &str) -> CommonResult<EnvFilter> {
    EnvFilter::try_new(level.trim())
        .map_err(|e| CommonError::config_field("logging.level", format!("{level:?}: {e}")))
}
