//! Live streaming platforms and the contract every platform source fulfils
//!
//! A [`StreamSource`] knows how to ask one platform for the current streams of
//! a room ([`StreamSource::extract`]) and how to pick the stream a client asked
//! for out of the last extraction ([`StreamSource::select`]). Extraction goes
//! over the network and is cached per room by the extractor; selection is
//! local and runs on every request.

pub mod bilibili;
pub mod douyu;
mod error;
pub mod huya;

pub use bilibili::{BilibiliSource, BilibiliStreams};
pub use douyu::{DouyuSource, DouyuStreams};
pub use error::ExtractError;
pub use huya::{HuyaCdn, HuyaCursor, HuyaSource, HuyaStreams};

use async_trait::async_trait;
use std::fmt;

/// Supported live streaming platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provider {
    Bilibili,
    Douyu,
    Huya,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Bilibili => "bilibili",
            Provider::Douyu => "douyu",
            Provider::Huya => "huya",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bilibili" => Some(Provider::Bilibili),
            "douyu" => Some(Provider::Douyu),
            "huya" => Some(Provider::Huya),
            _ => None,
        }
    }

    pub fn all_variants() -> &'static [Self] {
        &[Provider::Bilibili, Provider::Douyu, Provider::Huya]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stream variant requested through the optional last path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quality {
    Default,
    /// Force a fresh extraction, then behave as `Default`
    Refresh,
    /// Move to the next CDN where the platform offers several
    SwitchCdn,
    Named(String),
}

impl Quality {
    pub fn parse(segment: Option<&str>) -> Self {
        match segment {
            None | Some("") => Quality::Default,
            Some("refresh") => Quality::Refresh,
            Some("switch_cdn") => Quality::SwitchCdn,
            Some(name) => Quality::Named(name.to_string()),
        }
    }

    pub fn is_refresh(&self) -> bool {
        matches!(self, Quality::Refresh)
    }

    pub fn named(&self) -> Option<&str> {
        match self {
            Quality::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Default => f.write_str("default"),
            Quality::Refresh => f.write_str("refresh"),
            Quality::SwitchCdn => f.write_str("switch_cdn"),
            Quality::Named(name) => f.write_str(name),
        }
    }
}

/// What the server should do with a resolved stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTarget {
    /// Send the client straight to the stream url
    Redirect(String),
    /// Fetch the HLS playlist and rewrite its segments against `base_url`
    Playlist { url: String, base_url: String },
}

impl StreamTarget {
    pub fn url(&self) -> &str {
        match self {
            StreamTarget::Redirect(url) => url,
            StreamTarget::Playlist { url, .. } => url,
        }
    }
}

/// Feedback from proxying a playlist back to the room that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistOutcome {
    /// The playlist could not be fetched at all
    Unreachable,
    /// The CDN rejected the signed url
    Forbidden,
}

#[async_trait]
pub trait StreamSource: Send + Sync + 'static {
    type Streams: Clone + fmt::Debug + Send + Sync + 'static;
    type Cursor: Default + Send + 'static;

    fn provider(&self) -> Provider;

    async fn extract(&self, room: &str) -> Result<Self::Streams, ExtractError>;

    fn is_usable(streams: &Self::Streams) -> bool;

    fn select(
        &self,
        streams: &Self::Streams,
        cursor: &mut Self::Cursor,
        quality: &Quality,
    ) -> Option<StreamTarget>;

    fn report(&self, _cursor: &mut Self::Cursor, _outcome: PlaylistOutcome) {}

    /// Runs after a successful extraction replaced the cached streams
    fn streams_replaced(&self, _cursor: &mut Self::Cursor) {}
}

/// Current unix time in milliseconds
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
