//! Error types for the playlist API client.

use karaoke_core::KaraokeError;
use thiserror::Error;

/// Errors that can occur when talking to the playlist API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API answered with a non-success status
    #[error("HTTP error {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body is not the expected JSON
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Invalid base URL
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Result type for API client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<ApiError> for KaraokeError {
    fn from(error: ApiError) -> Self {
        KaraokeError::network(error.to_string())
    }
}
