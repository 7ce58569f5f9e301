//! Error types for the api-relay runtime.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Unified error type covering configuration, argument classification,
/// transport, and HTTP-level failures.
///
/// Variants are intentionally coarse-grained so that callers can match on
/// error *category* (e.g. retryable vs permanent) rather than on
/// transport-specific details.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid or missing runtime/definition configuration (unmapped
    /// environment, malformed override, etc.).
    #[error("Configuration error: {0}")]
    Config(String),

    /// More than two positional arguments were passed to a generated
    /// endpoint. A programming error, never retried.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A connection-level failure from the HTTP client (DNS, TLS, reset).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body could not be parsed.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A non-2xx response, annotated with the server error identifier,
    /// numeric status, and status text.
    #[error("HTTP {status} {status_text}")]
    Http {
        status: u16,
        status_text: String,
        error_id: Option<String>,
        message: Option<String>,
    },

    /// A query was invoked while disabled and no cached value was available.
    #[error("Query disabled: {0}")]
    Disabled(String),
}

impl ApiError {
    /// Returns `true` for 401/403 responses.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Http { status: 401 | 403, .. })
    }

    /// Returns `true` for transient errors that may succeed on a refetch:
    /// transport failures, 429, and 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }

    /// The numeric HTTP status, when this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server-supplied error identifier, when one was decoded.
    pub fn error_id(&self) -> Option<&str> {
        match self {
            Self::Http { error_id, .. } => error_id.as_deref(),
            _ => None,
        }
    }
}
