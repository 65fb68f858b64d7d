//! Error taxonomy shared by every parcelbase crate.
//!
//! Callers need to distinguish three broad outcomes of a backend call:
//! "retry won't help" (permission, validation), "transient" (timeout, network),
//! and "doesn't exist" (not found). [`CoreError::is_retryable`] encodes that
//! distinction for the retry loop.

use thiserror::Error;

/// Errors produced by the data access and session layers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An operation exceeded its deadline.
    #[error("Timeout: {message}")]
    Timeout {
        /// Human-readable description of what timed out.
        message: String,
    },

    /// A transient network-level failure (connection refused, reset, DNS).
    #[error("Network error: {message}")]
    Network {
        /// Description of the network failure.
        message: String,
    },

    /// The requested entity does not exist (or is not active/visible).
    #[error("Not found: {entity}/{id}")]
    NotFound {
        /// Entity kind, e.g. `"packages"` or `"profiles"`.
        entity: String,
        /// Identifier that failed to resolve.
        id: String,
    },

    /// The backend rejected the request for lack of permission.
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Description of the rejection.
        message: String,
    },

    /// Malformed input caught before any network call was made.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what failed validation.
        message: String,
    },

    /// An opaque failure reported by the backing store.
    #[error("Storage error: {message}")]
    Storage {
        /// Backend-supplied message, passed through unchanged.
        message: String,
    },

    /// The application configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid invalidation pattern.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Message substrings that mark an opaque storage error as transient.
///
/// The backend client library reports transport failures as plain strings;
/// these are the markers it uses for timeouts and connectivity problems.
const TRANSIENT_MARKERS: [&str; 4] = ["timeout", "network", "fetch", "connection"];

impl CoreError {
    /// Create a new `Timeout` error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a new `Network` error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new `NotFound` error.
    #[must_use]
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a new `PermissionDenied` error.
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether a retry has any chance of succeeding.
    ///
    /// Timeouts and network failures are retryable. Opaque storage errors are
    /// retryable only when their message carries a transport-failure marker;
    /// auth and validation rejections never are.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Storage { message } => {
                let lower = message.to_lowercase();
                TRANSIENT_MARKERS.iter().any(|m| lower.contains(m))
            }
            _ => false,
        }
    }

    /// Get the error category for logging/monitoring.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Network { .. } => ErrorCategory::Network,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::PermissionDenied { .. } => ErrorCategory::Permission,
            Self::Validation { .. } | Self::Json(_) => ErrorCategory::Validation,
            Self::Storage { .. } => ErrorCategory::Storage,
            Self::Configuration(_) | Self::Regex(_) => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for monitoring and classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Timeout,
    Network,
    NotFound,
    Permission,
    Validation,
    Storage,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Network => write!(f, "network"),
            Self::NotFound => write!(f, "not_found"),
            Self::Permission => write!(f, "permission"),
            Self::Validation => write!(f, "validation"),
            Self::Storage => write!(f, "storage"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Convenience result type for parcelbase operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_retryable() {
        let err = CoreError::timeout("request timed out");
        assert!(err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Timeout);
    }

    #[test]
    fn test_network_is_retryable() {
        let err = CoreError::network("connection reset");
        assert!(err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_permission_denied_is_not_retryable() {
        let err = CoreError::permission_denied("row level security");
        assert!(!err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Permission);
    }

    #[test]
    fn test_not_found_is_not_retryable() {
        let err = CoreError::not_found("profiles", "user-1");
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Not found: profiles/user-1");
    }

    #[test]
    fn test_validation_is_not_retryable() {
        assert!(!CoreError::validation("file too large").is_retryable());
    }

    #[test]
    fn test_storage_error_message_sniffing() {
        assert!(CoreError::storage("fetch failed").is_retryable());
        assert!(CoreError::storage("Network unreachable").is_retryable());
        assert!(CoreError::storage("upstream request timeout").is_retryable());
        assert!(CoreError::storage("connection closed").is_retryable());
        assert!(!CoreError::storage("duplicate key violation").is_retryable());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Json(_)));
        assert!(!err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_regex_error_conversion() {
        let regex_err = regex::Regex::new("[").unwrap_err();
        let err: CoreError = regex_err.into();
        assert!(matches!(err, CoreError::Regex(_)));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_error_message_formats() {
        let err = CoreError::timeout("package fetch timed out");
        assert_eq!(err.to_string(), "Timeout: package fetch timed out");

        let err = CoreError::permission_denied("no access");
        assert_eq!(err.to_string(), "Permission denied: no access");
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Timeout.to_string(), "timeout");
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
        assert_eq!(ErrorCategory::Permission.to_string(), "permission");
    }
}
