//! Transport errors for outbound HTTP requests

use thiserror::Error;

/// Errors that can occur while talking to a live streaming platform
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Request timed out after the specified duration (in seconds)
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Connection, DNS or protocol level failure
    #[error("Network error: {message}")]
    Network { message: String },

    /// Response body could not be decoded
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {message}")]
    Build { message: String },
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        FetchError::Network {
            message: message.into(),
        }
    }
}
