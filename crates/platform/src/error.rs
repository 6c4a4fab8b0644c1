//! Error types for platform API operations.
//!
//! Errors are categorized so callers can tell an already-satisfied deletion
//! (404) from a genuine remote failure, and a transient transport problem
//! from a definitive rejection.

use thiserror::Error;

/// Errors that can occur while talking to the platform API.
#[derive(Debug, Error)]
pub enum Error {
    /// Non-2xx response other than 404
    #[error("HTTP {status} from {path}: {body}")]
    Http {
        /// Request path that failed
        path: String,
        /// Response status code
        status: u16,
        /// Response body, best effort
        body: String,
    },

    /// 404 response
    #[error("not found: {path}")]
    NotFound { path: String },

    /// Connection, TLS or timeout failure before a response arrived
    #[error("transport error for {path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// Response body was not the JSON we expected
    #[error("invalid response from {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Response was missing a field the caller relies on
    #[error("response from {path} is missing field `{field}`")]
    MissingField { path: String, field: &'static str },
}

impl Error {
    /// Whether this error is a 404, an already-satisfied deletion.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

/// Result type for platform API operations.
pub type Result<T> = std::result::Result<T, Error>;
