//! Fetch error types.

use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for a single upstream request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connectivity failure or timeout.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Rate limited by the upstream API (HTTP 429).
    #[error("Rate limited, resets at {reset_at:?}")]
    RateLimited {
        /// Unix epoch seconds at which the limit resets, if advertised.
        reset_at: Option<i64>,
    },

    /// Any other non-2xx response.
    #[error("HTTP {status}: {message}")]
    Http {
        /// Response status code.
        status: u16,
        /// Reason phrase or response body.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be built or used.
    #[error("Client error: {0}")]
    Client(String),
}

impl FetchError {
    /// Returns true for connectivity failures and timeouts.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true for HTTP 429 responses.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns the HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
            FetchError::Transport(err.to_string())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            FetchError::Client(err.to_string())
        }
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        FetchError::InvalidUrl(err.to_string())
    }
}

impl From<transitsync_core::CoreError> for FetchError {
    fn from(err: transitsync_core::CoreError) -> Self {
        FetchError::Decode(err.to_string())
    }
}

// ============================================================================
// Page Error
// ============================================================================

/// Failure of a paginated list load.
///
/// List loads keep the distinction between transport failures and rate
/// limiting because retry timing depends on it; everything else collapses
/// into [`PageError::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// Connectivity failure or timeout; retryable.
    #[error("Network error: {0}")]
    Transport(String),

    /// HTTP 429 from the upstream API.
    #[error("{message}")]
    RateLimited {
        /// Unix epoch seconds at which the limit resets, if advertised.
        reset_at: Option<i64>,
        /// Human-readable message.
        message: String,
    },

    /// Any other failure.
    #[error("{0}")]
    Unknown(String),
}

impl PageError {
    /// Classifies a request failure for a list load.
    ///
    /// `now` is the current Unix epoch time in seconds; it picks the
    /// rate-limit message.
    pub fn from_fetch(err: FetchError, now: i64) -> Self {
        match err {
            FetchError::Transport(message) => Self::Transport(message),
            FetchError::RateLimited { reset_at } => Self::RateLimited {
                reset_at,
                message: rate_limit_message(reset_at, now).to_string(),
            },
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns true for rate-limit failures.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns the reset time of a rate-limit failure.
    pub fn reset_at(&self) -> Option<i64> {
        match self {
            Self::RateLimited { reset_at, .. } => *reset_at,
            _ => None,
        }
    }
}

/// Builds the message attached to a rate-limit failure.
///
/// `now` is the current Unix epoch time in seconds.
pub fn rate_limit_message(reset_at: Option<i64>, now: i64) -> &'static str {
    match reset_at {
        None => "Rate limit exceeded. Please try again later.",
        Some(reset) if reset - now <= 0 => "Rate limit exceeded. Please try again soon.",
        Some(_) => "Rate limit has been reset. Please try again.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessor() {
        assert_eq!(FetchError::RateLimited { reset_at: None }.status(), Some(429));
        assert_eq!(
            FetchError::Http {
                status: 503,
                message: "Service Unavailable".to_string()
            }
            .status(),
            Some(503)
        );
        assert_eq!(FetchError::Transport("reset".to_string()).status(), None);
    }

    #[test]
    fn test_rate_limit_message() {
        assert_eq!(
            rate_limit_message(None, 100),
            "Rate limit exceeded. Please try again later."
        );
        assert_eq!(
            rate_limit_message(Some(100), 100),
            "Rate limit exceeded. Please try again soon."
        );
        assert_eq!(
            rate_limit_message(Some(170), 165),
            "Rate limit has been reset. Please try again."
        );
    }

    #[test]
    fn test_page_error_classification() {
        assert_eq!(
            PageError::from_fetch(FetchError::Transport("timed out".to_string()), 0),
            PageError::Transport("timed out".to_string())
        );
        assert_eq!(
            PageError::from_fetch(FetchError::RateLimited { reset_at: Some(170) }, 165),
            PageError::RateLimited {
                reset_at: Some(170),
                message: "Rate limit has been reset. Please try again.".to_string()
            }
        );

        let err = PageError::from_fetch(
            FetchError::Http {
                status: 500,
                message: "Internal Server Error".to_string(),
            },
            0,
        );
        assert_eq!(
            err,
            PageError::Unknown("HTTP 500: Internal Server Error".to_string())
        );
        assert!(matches!(
            PageError::from_fetch(FetchError::Decode("eof".to_string()), 0),
            PageError::Unknown(_)
        ));
    }

    #[test]
    fn test_page_error_reset_at() {
        let err = PageError::RateLimited {
            reset_at: Some(170),
            message: "x".to_string(),
        };
        assert!(err.is_rate_limited());
        assert_eq!(err.reset_at(), Some(170));
        assert_eq!(PageError::Unknown("x".to_string()).reset_at(), None);
    }
}
