//! Common error types and utilities shared by Blobmeter crates
//!
//! This module provides the error infrastructure that the outer layers
//! (logging bootstrap, binaries) build on: the `ErrorClassification` trait,
//! a unified severity scale and the few error variants those layers raise.
//!
//! Module-specific errors should **compose** with `CommonError` rather than
//! duplicating its variants:
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum LoaderError {
//!     #[error("no config file in {0}")]
//!     Missing(String),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//! ```
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | Counter already gone |
//! | **Warning** | Degraded but operational | Duplicate counter registration |
//! | **Error** | Failure requiring attention | Invalid configuration |
//! | **Critical** | Integrity at risk | Subscriber installed twice |

use std::fmt;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Error variants shared by the outer layers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommonError {
    /// Configuration-related errors
    #[error("Configuration error{}: {message}", qualifier("field", .field))]
    Config { message: String, field: Option<String> },

    /// Internal errors that shouldn't normally occur
    #[error("Internal error{}: {message}", qualifier("", .context))]
    Internal { message: String, context: Option<String> },
}

fn qualifier(kind: &str, value: &Option<String>) -> String {
    match (value, kind.is_empty()) {
        (Some(value), true) => format!(" in '{value}'"),
        (Some(value), false) => format!(" in {kind} '{value}'"),
        (None, _) => String::new(),
    }
}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config { .. } => ErrorSeverity::Error,
            Self::Internal { .. } => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

impl CommonError {
    /// Create a configuration error with field context
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Create an internal error with context
    pub fn internal_with_context<S: Into<String>, C: Into<String>>(message: S, context: C) -> Self {
        Self::Internal { message: message.into(), context: Some(context.into()) }
    }
}

/// Standard interface for classifying errors
///
/// All error types in the workspace implement this so that callers can make
/// logging and retry decisions without matching on concrete variants.
pub trait ErrorClassification {
    /// Check if this error is retryable
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;
}

/// Emit `error` as a tracing event whose level follows its severity.
///
/// `subject` names what the error is about (a counter name, a file path).
#[cfg(feature = "observability")]
pub fn log_classified<E>(subject: &str, error: &E, message: &'static str)
where
    E: ErrorClassification + fmt::Display + ?Sized,
{
    let severity = error.severity();
    let retryable = error.is_retryable();
    match severity {
        ErrorSeverity::Info => {
            tracing::debug!(subject, %severity, retryable, error = %error, "{message}");
        }
        ErrorSeverity::Warning => {
            tracing::warn!(subject, %severity, retryable, error = %error, "{message}");
        }
        ErrorSeverity::Error | ErrorSeverity::Critical => {
            tracing::error!(subject, %severity, retryable, error = %error, "{message}");
        }
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
