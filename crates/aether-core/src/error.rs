//! Error types for the Aether search client.

use thiserror::Error;

/// Result type alias using Aether's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Aether client operations.
///
/// The first four variants mirror the failure taxonomy of the session:
/// probe and suggest failures are absorbed by the caller, search failures
/// surface inline, upload failures surface as an acknowledgment.
#[derive(Error, Debug)]
pub enum Error {
    /// Health probe failed (network error, timeout, non-2xx)
    #[error("Probe error: {0}")]
    Probe(String),

    /// Autocomplete request failed or returned a malformed body
    #[error("Suggest error: {0}")]
    Suggest(String),

    /// Search request failed or returned a malformed body
    #[error("Search error: {0}")]
    Search(String),

    /// Document upload failed
    #[error("Upload error: {0}")]
    Upload(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_probe() {
        let err = Error::Probe("connection refused".to_string());
        assert_eq!(err.to_string(), "Probe error: connection refused");
    }

    #[test]
    fn test_error_display_search() {
        let err = Error::Search("HTTP 502".to_string());
        assert_eq!(err.to_string(), "Search error: HTTP 502");
    }

    #[test]
    fn test_error_display_upload() {
        let err = Error::Upload("payload too large".to_string());
        assert_eq!(err.to_string(), "Upload error: payload too large");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("no such file"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
