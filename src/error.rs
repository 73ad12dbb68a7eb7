//! Error types for layer popups.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use layer_popup::{Error, Result};
//!
//! async fn example(popups: &PopupManager) -> Result<()> {
//!     let element = popups.opener("login", "/login.html")?.load().await?;
//!     println!("popup ready: {element:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Construction`], [`Error::InvalidArgument`] |
//! | Lifecycle | [`Error::Timeout`], [`Error::Cancelled`], [`Error::ElementNotFound`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::PopupId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the popup manager is built without a required collaborator.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Popup opener construction error.
    ///
    /// Returned synchronously when the target id or URL is empty.
    #[error("Construction error: {message}")]
    Construction {
        /// Description of the missing argument.
        message: String,
    },

    /// Invalid argument.
    ///
    /// Returned when a context is extended with a non-object source.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Operation timeout.
    ///
    /// Returned when a readiness condition does not hold within the timeout.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds allowed before timeout.
        timeout_ms: u64,
    },

    /// Wait cancelled before it settled.
    #[error("Cancelled: {operation}")]
    Cancelled {
        /// Description of the cancelled operation.
        operation: String,
    },

    /// Popup target element not found.
    ///
    /// Returned when a custom readiness predicate resolves but the document
    /// has no element with the target id.
    #[error("Element not found: target={target_id}")]
    ElementNotFound {
        /// Target id that was looked up.
        target_id: PopupId,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a construction error.
    #[inline]
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a cancellation error.
    #[inline]
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(target_id: PopupId) -> Self {
        Self::ElementNotFound { target_id }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this error was raised while constructing an opener.
    #[inline]
    #[must_use]
    pub fn is_construction_error(&self) -> bool {
        matches!(self, Self::Construction { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed when `load()` is called again.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Cancelled { .. } | Self::ElementNotFound { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::construction("target id is required");
        assert_eq!(err.to_string(), "Construction error: target id is required");
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::timeout("popup readiness", 5000);
        assert_eq!(err.to_string(), "Timeout after 5000ms: popup readiness");
    }

    #[test]
    fn test_element_not_found_display() {
        let id = PopupId::new("dialog").expect("non-empty id");
        let err = Error::element_not_found(id);
        assert_eq!(err.to_string(), "Element not found: target=dialog");
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::timeout("wait", 1000);
        let other_err = Error::config("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_construction_error() {
        assert!(Error::construction("url is required").is_construction_error());
        assert!(!Error::invalid_argument("x").is_construction_error());
    }

    #[test]
    fn test_is_recoverable() {
        let timeout_err = Error::timeout("test", 1000);
        let cancelled_err = Error::cancelled("test");
        let config_err = Error::config("test");

        assert!(timeout_err.is_recoverable());
        assert!(cancelled_err.is_recoverable());
        assert!(!config_err.is_recoverable());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
