//! Error types for collaborator adapters.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by external collaborators.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request could not be sent or read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Remote service answered with an error status.
    #[error("{service} returned {status}: {body}")]
    Status {
        /// Service that failed.
        service: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// A session-bound call was made before `login`.
    #[error("not logged in")]
    NotLoggedIn,

    /// Remote response did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Required external tool is not installed.
    #[error("tool not found: {0}")]
    ToolMissing(String),

    /// Text recognition failed.
    #[error("text recognition failed for {path}: {message}")]
    Recognition {
        /// Image that could not be read.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Local file system error.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid endpoint URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
