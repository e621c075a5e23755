//! real-url-proxy - resolve the real stream url of live streaming rooms
//!
//! Live streaming platforms hide their stream urls behind short-lived,
//! signed addresses. This crate runs a small HTTP server that players can
//! point at a stable address such as `http://host:5000/huya/11342412`; the
//! server resolves the room's current stream and either redirects the player
//! to it or proxies the HLS playlist.
//!
//! # Core Concepts
//!
//! - **Providers**: platform specific [`StreamSource`]s for Bilibili, Douyu
//!   and Huya that turn a room id into stream urls
//! - **Rooms**: a [`RoomExtractor`] caches the streams of one room, keeps the
//!   last working streams as failover and refreshes them in the background
//! - **Server**: the axum router mapping `/<provider>/<room>[/<quality>]` to
//!   redirects or proxied playlists
//!
//! # Example Usage
//!
//! ```no_run
//! use real_url_proxy::{ProxyConfig, ProxyServer, ReqwestClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ProxyConfig::default();
//! config.validate()?;
//!
//! let http = Arc::new(ReqwestClient::new(config.request_timeout())?);
//! ProxyServer::new(config, http).start().await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod extractor;
pub mod fetch;
pub mod playlist;
pub mod providers;
pub mod server;
pub mod util;

pub use config::{ConfigError, ProxyConfig};
pub use extractor::{RoomExtractor, RoomRegistry, RoomResolver};
pub use fetch::{FetchError, HttpClient, ReqwestClient};
pub use providers::{ExtractError, Provider, Quality, StreamSource, StreamTarget};
pub use server::{build_router, AppState, ProxyServer};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
