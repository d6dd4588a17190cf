//! Client error types.

use std::time::Duration;

use thiserror::Error;

/// Client error type.
///
/// Every public operation either succeeds or fails with exactly one of these
/// variants, so callers can match broadly or on a specific kind.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or rejected credentials (HTTP 401/403, or an empty token).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A filter argument or identifier was rejected before any request.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Human-readable reason.
        message: String,
        /// Name of the offending argument.
        field: String,
    },

    /// The transport could not reach the server.
    #[error("Network error: {0}")]
    Network(String),

    /// The transport gave up after the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The server returned HTTP 429.
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        /// Error message, including the `Retry-After` value when present.
        message: String,
        /// Parsed `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// The server returned HTTP 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other unsuccessful or undecodable response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the server.
        message: String,
        /// Raw error body, when it was JSON.
        body: Option<serde_json::Value>,
    },

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a validation error for the named argument.
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.into(),
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Authentication(_))
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimit { .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }

    /// Check if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns true if the request may succeed when attempted again.
    ///
    /// Network faults, timeouts, rate limiting and 5xx responses are
    /// transient. Everything else fails the same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Timeout(_) | Error::RateLimit { .. }
        ) || self.is_server_error()
    }

    /// Get the retry-after duration if this is a rate limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status code this error was mapped from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::NotFound(_) => Some(404),
            Error::RateLimit { .. } => Some(429),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error body returned by the Graph API.
///
/// ```json
/// {"error": {"message": "...", "type": "...", "code": 100}}
/// ```
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

/// Parse a Retry-After header value given in seconds.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
