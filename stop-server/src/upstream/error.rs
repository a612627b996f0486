//! Stop API error types.

use std::fmt;

/// Failure of the underlying HTTP exchange, before any response classification.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No complete response within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS or body read failure
    #[error("HTTP request failed")]
    Http(#[source] reqwest::Error),

    /// Response body larger than the transport accepts
    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl TransportError {
    /// Map a reqwest error, separating out timeouts.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Http(err)
        }
    }
}

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure, timeout, 403 or a bot-protection block page.
    Connection,
    /// The upstream does not know the stop (404).
    InvalidStop,
    /// Anything else: bad status, wrong content type, malformed payload.
    Api,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Connection => f.write_str("connection error"),
            ErrorKind::InvalidStop => f.write_str("invalid stop"),
            ErrorKind::Api => f.write_str("API error"),
        }
    }
}

/// Errors from fetching a stop.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Could not reach the upstream
    #[error("error connecting to stop API")]
    Connection(#[source] TransportError),

    /// Upstream answered 403
    #[error("access denied by stop API (403 Forbidden)")]
    Forbidden,

    /// Upstream served an HTML block page instead of data
    #[error("access denied by stop API (blocked by protection)")]
    Blocked,

    /// Upstream does not know this stop
    #[error("stop {0} not found")]
    InvalidStop(String),

    /// Upstream returned a status other than 200
    #[error("API returned status {status}")]
    Status { status: u16 },

    /// Upstream returned something other than JSON
    #[error("API returned unexpected content type {content_type:?}")]
    ContentType { content_type: String },

    /// Body could not be parsed as JSON
    #[error("failed to parse JSON response")]
    Json(#[source] serde_json::Error),

    /// JSON parsed but does not have the expected shape
    #[error("invalid response: {0}")]
    InvalidPayload(String),

    /// Client could not be constructed
    #[error("client configuration error: {0}")]
    Client(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Connection(_) | ApiError::Forbidden | ApiError::Blocked => {
                ErrorKind::Connection
            }
            ApiError::InvalidStop(_) => ErrorKind::InvalidStop,
            ApiError::Status { .. }
            | ApiError::ContentType { .. }
            | ApiError::Json(_)
            | ApiError::InvalidPayload(_)
            | ApiError::Client(_) => ErrorKind::Api,
        }
    }

    /// Whether the next scheduled poll may succeed without reconfiguration.
    pub fn is_transient(&self) -> bool {
        self.kind() != ErrorKind::InvalidStop
    }

    /// HTTP status carried by the error, if the upstream answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status } => Some(*status),
            ApiError::InvalidStop(_) => Some(404),
            ApiError::Forbidden => Some(403),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Connection(err)
    }
}
