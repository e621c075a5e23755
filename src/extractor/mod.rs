//! Per-room stream resolution with caching, failover and auto refresh
//!
//! [`RoomExtractor`] wraps a platform [`StreamSource`](crate::providers::StreamSource)
//! with the state of one room. The server only sees rooms through the
//! object-safe [`RoomResolver`] trait, handed out by the [`RoomRegistry`].

mod refresh;
mod registry;
mod room;

pub use refresh::RefreshTimer;
pub use registry::{ExtractorSettings, RoomRegistry};
pub use room::RoomExtractor;

use crate::providers::{ExtractError, PlaylistOutcome, Provider, Quality, StreamTarget};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait RoomResolver: Send + Sync {
    fn provider(&self) -> Provider;

    fn room(&self) -> &str;

    /// Resolves the stream for `quality`, extracting first when nothing is cached
    ///
    /// `Ok(None)` means the platform answered but has no stream for the request.
    /// An error is only returned while the room has never produced a stream;
    /// afterwards failed extractions fall back to the last valid streams.
    async fn resolve(&self, quality: &Quality) -> Result<Option<StreamTarget>, ExtractError>;

    /// Re-extracts unconditionally; failures are logged and kept as failover state
    async fn refresh(&self);

    async fn report(&self, outcome: PlaylistOutcome);

    async fn last_refresh(&self) -> Option<DateTime<Utc>>;
}
