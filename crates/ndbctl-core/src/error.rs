//! Unified error handling for ndbctl-core
//!
//! Every failure surfaces to the caller; nothing here is retried or
//! swallowed. The helper predicates let callers branch on the category
//! without matching on individual variants.
//!
//! # Example
//!
//! ```rust
//! use ndbctl_core::CoreError;
//!
//! let err = CoreError::Api { status: 404, message: "dbserver not found".to_string() };
//! assert!(err.is_not_found());
//! assert!(!err.is_retryable());
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for NDB operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// The NDB API answered with a non-success status
    #[error("NDB API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport failure talking to the NDB API
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body could not be decoded
    #[error("Failed to decode NDB response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The service accepted a request but handed back no operation id
    #[error("error: operation ID is an empty string ({action})")]
    MissingOperationId { action: String },

    /// Polling did not observe a terminal state before the deadline
    #[error(
        "Timed out after {timeout:?} waiting for operation {operation_id} on db server {entity_id}"
    )]
    OperationTimeout {
        operation_id: String,
        entity_id: String,
        timeout: Duration,
    },

    /// The operation reached the FAILED terminal state
    #[error("Operation {operation_id} on db server {entity_id} failed: {message}")]
    OperationFailed {
        operation_id: String,
        entity_id: String,
        message: String,
        percentage_complete: Option<String>,
    },

    /// Invalid input combination caught while building a request
    #[error("Validation error: {0}")]
    Validation(String),

    /// The state writer rejected a value
    #[error("Failed to set '{attribute}': {reason}")]
    State { attribute: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    fn status(&self) -> Option<u16> {
        match self {
            CoreError::Api { status, .. } => Some(*status),
            CoreError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(s) if (500..600).contains(&s))
    }

    /// Returns true if this is a timeout, either HTTP or operation polling
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::Http(e) => e.is_timeout(),
            CoreError::OperationTimeout { .. } => true,
            _ => false,
        }
    }

    /// Returns true if this is a rate limiting error (429)
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Returns true if this is a conflict/precondition error (409/412)
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(409) | Some(412))
    }

    /// Returns true if this is a bad request error (400) or a local validation failure
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, CoreError::Validation(_)) || self.status() == Some(400)
    }

    /// Returns true if the remote operation itself failed
    #[must_use]
    pub fn is_operation_failed(&self) -> bool {
        matches!(self, CoreError::OperationFailed { .. })
    }

    /// Returns true if this error is potentially retryable by the caller
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_server_error() || self.is_rate_limited() || self.is_timeout()
    }
}
