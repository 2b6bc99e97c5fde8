//! Error types for deployaudit-core

use thiserror::Error;

/// Result type alias for deployaudit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for deployaudit operations
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status returned by the API after retries
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Resource does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body was not JSON or did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Repository identifier is not `owner/name`
    #[error("Invalid repository: {0}")]
    InvalidRepository(String),

    /// Timestamp could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors may embed the request URL but never headers
        Error::Http(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

/// Fieldless error category for zero-cost pattern matching.
///
/// Single byte representation (`#[repr(u8)]`), `Copy`, no allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Transport error
    Http,
    /// API status error
    Api,
    /// Resource not found
    NotFound,
    /// Decode error
    Decode,
    /// Configuration error
    Config,
    /// Invalid repository identifier
    InvalidRepository,
    /// Invalid timestamp
    InvalidTimestamp,
    /// I/O operation error
    Io,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind. Zero allocation, returns a Copy enum.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(_) => ErrorKind::Http,
            Error::Api { .. } => ErrorKind::Api,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Decode(_) => ErrorKind::Decode,
            Error::Config(_) => ErrorKind::Config,
            Error::InvalidRepository(_) => ErrorKind::InvalidRepository,
            Error::InvalidTimestamp(_) => ErrorKind::InvalidTimestamp,
            Error::Io(_) => ErrorKind::Io,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Borrow the error message. Zero allocation.
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Error::Http(msg)
            | Error::NotFound(msg)
            | Error::Decode(msg)
            | Error::Config(msg)
            | Error::InvalidRepository(msg)
            | Error::InvalidTimestamp(msg)
            | Error::Other(msg) => msg,
            Error::Api { body, .. } => body,
            Error::Io(_) => "I/O error",
        }
    }

    /// HTTP status carried by the error, if any
    pub const fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::NotFound(_) => Some(404),
            _ => None,
        }
    }
}
