//! Configuration structures
//!
//! Every section has a default, so an empty TOML or JSON document is a
//! valid configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AGGREGATE_SCOPE, DEFAULT_GET_SCOPE, DEFAULT_LOG_LEVEL, DEFAULT_PUT_SCOPE,
    DEFAULT_TENANT_PART, NAME_SEPARATOR,
};
use crate::counter_set::CounterSet;
use crate::errors::{BlobMeterError, Result};
use crate::tenant::TenantKey;

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub naming: NamingConfig,
    pub counters: CounterSet,
    pub persisted_put_time: PersistedTimePolicy,
    /// Parts of the key used when a caller supplies none.
    pub default_tenant: Vec<String>,
    pub logging: LoggingConfig,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            naming: NamingConfig::default(),
            counters: CounterSet::default(),
            persisted_put_time: PersistedTimePolicy::default(),
            default_tenant: vec![DEFAULT_TENANT_PART.to_string(), DEFAULT_TENANT_PART.to_string()],
            logging: LoggingConfig::default(),
        }
    }
}

impl MeterConfig {
    /// Key used for requests that do not name a tenant.
    pub fn default_tenant_key(&self) -> Result<TenantKey> {
        TenantKey::from_parts(&self.default_tenant)
    }

    /// Reject configurations the engine cannot name counters with.
    pub fn validate(&self) -> Result<()> {
        self.naming.validate()?;
        self.default_tenant_key().map_err(|e| {
            BlobMeterError::Config(format!("default_tenant {:?}: {e}", self.default_tenant))
        })?;
        if self.logging.level.trim().is_empty() {
            return Err(BlobMeterError::Config("logging.level must not be empty".into()));
        }
        Ok(())
    }
}

/// Scope prefixes for counter names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Prefix of permanent per-tenant counters
    pub aggregate_scope: String,
    /// Prefix of per-request PUT counters
    pub put_scope: String,
    /// Prefix of per-request GET counters
    pub get_scope: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            aggregate_scope: DEFAULT_AGGREGATE_SCOPE.to_string(),
            put_scope: DEFAULT_PUT_SCOPE.to_string(),
            get_scope: DEFAULT_GET_SCOPE.to_string(),
        }
    }
}

impl NamingConfig {
    fn validate(&self) -> Result<()> {
        for (field, scope) in [
            ("naming.aggregate_scope", &self.aggregate_scope),
            ("naming.put_scope", &self.put_scope),
            ("naming.get_scope", &self.get_scope),
        ] {
            if scope.is_empty() {
                return Err(BlobMeterError::Config(format!("{field} must not be empty")));
            }
            if scope.contains(NAME_SEPARATOR) {
                return Err(BlobMeterError::Config(format!(
                    "{field} '{scope}' must not contain '{NAME_SEPARATOR}'"
                )));
            }
        }
        Ok(())
    }
}

/// Whether time spent on failed PUT segments counts as persisted time.
///
/// Applies to the aggregate's persisted put time and to the PUT throughput
/// sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistedTimePolicy {
    /// Only successful segment time is persisted time
    #[default]
    ExcludeRetries,
    /// Failed segment time is added as well
    IncludeRetries,
}

crate::impl_snake_case_conversions!(PersistedTimePolicy {
    ExcludeRetries => "exclude_retries",
    IncludeRetries => "include_retries",
});

/// Logging settings consumed by the subscriber bootstrap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}
