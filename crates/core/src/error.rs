//! Error types for folderfort-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for folderfort-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for folderfort-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// Caller supplied an unusable argument (empty names, malformed URLs)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The remote service answered with an unexpected status code
    #[error("{operation} rejected (HTTP {status}): {body}")]
    RemoteRejected {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Local filesystem error tied to a path
    #[error("IO error on {}: {source}", path.display())]
    LocalPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON from the remote service
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,

    /// Cancelled by user
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Build a `RemoteRejected` error from a raw response body.
    pub fn rejected(operation: &'static str, status: u16, body: &[u8]) -> Self {
        Error::RemoteRejected {
            operation,
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Network(err.to_string())
        } else if err.is_request() || err.is_builder() {
            Error::HttpClient(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_keeps_body_verbatim() {
        let err = Error::rejected("upload", 422, b"{\"message\":\"quota exceeded\"}");
        match &err {
            Error::RemoteRejected { operation, status, body } => {
                assert_eq!(*operation, "upload");
                assert_eq!(*status, 422);
                assert_eq!(body, "{\"message\":\"quota exceeded\"}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "upload rejected (HTTP 422): {\"message\":\"quota exceeded\"}"
        );
    }
}
