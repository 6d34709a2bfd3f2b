//! Error types for PageWatch
//!
//! This module defines the error types used throughout the crate.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

/// The primary error type for PageWatch operations.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Configuration-related errors (missing bot token, malformed config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page retrieval failures
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Channel errors (Telegram API failures, bad chat ids, etc.)
    #[error("Channel error: {0}")]
    Channel(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client setup errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Transport-level failure while fetching a watched page.
///
/// The sweep maps every variant to an absent result, so callers only need
/// the distinction for logging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    /// Classify a reqwest error for the given URL.
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            FetchError::Timeout { url }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                url,
                status: status.as_u16(),
            }
        } else if err.is_body() || err.is_decode() {
            FetchError::Body {
                url,
                message: err.to_string(),
            }
        } else {
            FetchError::Transport {
                url,
                message: err.to_string(),
            }
        }
    }

    /// The URL the failed request targeted.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url }
            | FetchError::Status { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Body { url, .. } => url,
        }
    }
}

/// A specialized `Result` type for PageWatch operations.
pub type Result<T> = std::result::Result<T, WatchError>;
