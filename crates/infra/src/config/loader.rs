//! Configuration loader
//!
//! Loads the engine configuration from a file or from environment variables.
//!
//! ## Loading Strategy
//! 1. An explicit file named by `BLOBMETER_CONFIG`
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//! 3. Otherwise environment variables layered over the defaults
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `BLOBMETER_CONFIG`: path to a `.toml` or `.json` config file
//! - `BLOBMETER_AGGREGATE_SCOPE`: prefix of per-tenant aggregate counters
//! - `BLOBMETER_PUT_SCOPE`: prefix of per-request PUT counters
//! - `BLOBMETER_GET_SCOPE`: prefix of per-request GET counters
//! - `BLOBMETER_PERSISTED_PUT_TIME`: `exclude_retries` or `include_retries`
//! - `BLOBMETER_COUNTER_SET`: `full`, `basic`, or a comma list of groups
//! - `BLOBMETER_DEFAULT_TENANT`: dotted key, e.g. `DEFAULT.DEFAULT`
//! - `BLOBMETER_LOG_LEVEL`: filter used when `RUST_LOG` is unset
//! - `BLOBMETER_LOG_JSON`: emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./blobmeter.toml` or `./blobmeter.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use blobmeter_domain::{
    BlobMeterError, CounterSet, MeterConfig, PersistedTimePolicy, Result, TenantKey,
};

pub const CONFIG_PATH_VAR: &str = "BLOBMETER_CONFIG";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["blobmeter.toml", "blobmeter.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `BlobMeterError::Config` if the chosen source cannot be read or
/// parsed, or if the resulting configuration fails validation.
pub fn load() -> Result<MeterConfig> {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_VAR) {
        return load_from_file(Some(PathBuf::from(explicit)));
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::debug!("No config file found, using environment");
            load_from_env()
        }
    }
}

/// Load configuration from `BLOBMETER_*` environment variables
///
/// Unset variables keep their default value.
///
/// # Errors
/// Returns `BlobMeterError::Config` if a variable holds an invalid value.
pub fn load_from_env() -> Result<MeterConfig> {
    let config = load_from_lookup(|key| std::env::var(key).ok())?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Layer values from `lookup` over [`MeterConfig::default`].
///
/// `lookup` maps a variable name to its value, so tests can supply a map
/// instead of mutating the process environment.
pub fn load_from_lookup<F>(lookup: F) -> Result<MeterConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = MeterConfig::default();

    if let Some(scope) = lookup("BLOBMETER_AGGREGATE_SCOPE") {
        config.naming.aggregate_scope = scope;
    }
    if let Some(scope) = lookup("BLOBMETER_PUT_SCOPE") {
        config.naming.put_scope = scope;
    }
    if let Some(scope) = lookup("BLOBMETER_GET_SCOPE") {
        config.naming.get_scope = scope;
    }
    if let Some(policy) = lookup("BLOBMETER_PERSISTED_PUT_TIME") {
        config.persisted_put_time = policy.parse::<PersistedTimePolicy>().map_err(|e| {
            BlobMeterError::Config(format!("Invalid BLOBMETER_PERSISTED_PUT_TIME: {e}"))
        })?;
    }
    if let Some(set) = lookup("BLOBMETER_COUNTER_SET") {
        config.counters = set
            .parse::<CounterSet>()
            .map_err(|e| BlobMeterError::Config(format!("Invalid BLOBMETER_COUNTER_SET: {e}")))?;
    }
    if let Some(tenant) = lookup("BLOBMETER_DEFAULT_TENANT") {
        let key = tenant.parse::<TenantKey>().map_err(|e| {
            BlobMeterError::Config(format!("Invalid BLOBMETER_DEFAULT_TENANT: {e}"))
        })?;
        config.default_tenant = key.into();
    }
    if let Some(level) = lookup("BLOBMETER_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("BLOBMETER_LOG_JSON") {
        config.logging.json = parse_bool(&json);
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected
/// by file extension.
///
/// # Errors
/// Returns `BlobMeterError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or the configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<MeterConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BlobMeterError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BlobMeterError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BlobMeterError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content, by the extension of `path`.
fn parse_config(contents: &str, path: &Path) -> Result<MeterConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BlobMeterError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BlobMeterError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(BlobMeterError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// Returns the first file that exists, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    probe_in(&dirs)
}

/// First existing config file across `dirs`, in directory order.
pub fn probe_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
