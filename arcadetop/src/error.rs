//! Error types for the live feed, the HTTP API, and local persistence.

use thiserror::Error;

/// Failures observed at the network boundary. None of these are fatal:
/// the connector and dashboard absorb them and surface only connectivity.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("connector is not running")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        FeedError::Transport(e.to_string())
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        FeedError::Request(e.to_string())
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Malformed(e.to_string())
    }
}

/// Local key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid store contents: {0}")]
    Json(#[from] serde_json::Error),
}
