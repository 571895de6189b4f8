//! Error types used throughout the domain layer

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Blobmeter domain validation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BlobMeterError {
    #[error("Invalid tenant key: {0}")]
    InvalidTenantKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Blobmeter domain operations
pub type Result<T> = std::result::Result<T, BlobMeterError>;
