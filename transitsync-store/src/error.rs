//! Store error types.

use thiserror::Error;
use transitsync_fetch::FetchError;

/// Message carried by [`StoreError::Network`].
pub const NETWORK_ERROR_MESSAGE: &str = "Network error";

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connectivity failure or timeout.
    #[error("{0}")]
    Network(String),

    /// Upstream failure other than connectivity.
    #[error("{message}")]
    Fetch {
        /// Message of the underlying failure.
        message: String,
        /// HTTP status code, if the failure came from a response.
        code: Option<u16>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns true for connectivity failures.
    pub fn is_network_error(&self) -> bool {
        matches!(self, StoreError::Network(_))
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Network(_) | StoreError::Io(_) => true,
            StoreError::Fetch { code, .. } => matches!(code, Some(429 | 500..=599)),
            _ => false,
        }
    }

    /// Returns the HTTP status code, if any.
    pub fn code(&self) -> Option<u16> {
        match self {
            StoreError::Fetch { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<FetchError> for StoreError {
    fn from(err: FetchError) -> Self {
        if err.is_transport() {
            return StoreError::Network(NETWORK_ERROR_MESSAGE.to_string());
        }
        StoreError::Fetch {
            code: err.status(),
            message: err.to_string(),
        }
    }
}
