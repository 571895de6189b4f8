//! Domain constants
//!
//! Centralized location for naming and default values shared by every
//! layer of the metering engine.

// Counter naming
pub const NAME_SEPARATOR: char = '.';
pub const REQUEST_ID_SEPARATOR: char = '-';

// Scope prefixes
pub const DEFAULT_AGGREGATE_SCOPE: &str = "blobmeter";
pub const DEFAULT_PUT_SCOPE: &str = "PutToBackend";
pub const DEFAULT_GET_SCOPE: &str = "GetFromBackend";

// Tenant keys
pub const DEFAULT_TENANT_PART: &str = "DEFAULT";
pub const AWS_PROVIDER_KEY: &str = "AWS_METRICS";
pub const AZURE_PROVIDER_KEY: &str = "AZURE_METRICS";
pub const MAX_TENANT_KEY_PARTS: usize = 2;

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";
