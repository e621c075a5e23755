use super::Provider;
use crate::fetch::FetchError;
use thiserror::Error;

/// Errors raised while resolving the stream of a live room
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// The platform does not know the room
    #[error("{provider} room {room} does not exist")]
    RoomNotFound { provider: Provider, room: String },

    /// The room exists but is not broadcasting
    #[error("{provider} room {room} is not live")]
    Offline { provider: Provider, room: String },

    /// Douyu refused the preview API and requires the signed web API
    #[error("douyu room {room} requires a signed request (preview error {code})")]
    SignatureRequired { room: String, code: i64 },

    /// The platform answered with something we could not interpret
    #[error("Unexpected response from {provider}: {message}")]
    UnexpectedResponse { provider: Provider, message: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ExtractError {
    pub fn unexpected(provider: Provider, message: impl Into<String>) -> Self {
        ExtractError::UnexpectedResponse {
            provider,
            message: message.into(),
        }
    }
}
