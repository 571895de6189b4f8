//! Engine error type
//!
//! Bookkeeping faults (a duplicate registration, a directory that refuses a
//! counter) surface here so the directory contract can report them, but the
//! engine itself logs and absorbs them. Only context construction returns
//! errors to callers.

use blobmeter_common::{ErrorClassification, ErrorSeverity};
use blobmeter_domain::BlobMeterError;

/// Metrics engine error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    /// A counter with this name is already registered; the existing one is kept
    #[error("Counter already registered: {name}")]
    DuplicateCounter {
        /// Full dotted counter name
        name: String,
    },

    /// The directory backend rejected an operation
    #[error("Counter directory failure for '{name}': {reason}")]
    Directory {
        /// Full dotted counter name
        name: String,
        /// Backend specific reason
        reason: String,
    },

    /// Invalid tenant key or configuration
    #[error(transparent)]
    Domain(#[from] BlobMeterError),
}

/// Result type for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;

impl ErrorClassification for MetricsError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DuplicateCounter { .. } => ErrorSeverity::Warning,
            Self::Directory { .. } => ErrorSeverity::Warning,
            Self::Domain(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }
}
