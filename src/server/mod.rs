//! HTTP surface of the proxy
//!
//! `GET /<provider>/<room>[/<quality>]` answers with a redirect to the live
//! stream, or with a rewritten HLS playlist for providers whose CDNs serve
//! relative segment paths. Every response carries permissive CORS headers so
//! web players can use the proxy directly.

pub mod handlers;
pub mod state;

pub use state::AppState;

use crate::config::ProxyConfig;
use crate::fetch::HttpClient;
use axum::http::{header, HeaderName, HeaderValue};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Builds the router with all routes and response layers
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/:provider/:room", get(handlers::stream))
        .route("/:provider/:room/:quality", get(handlers::stream_with_quality))
        .fallback(handlers::fallback)
        .with_state(state)
        .layer(cors_header(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            "*",
        ))
        .layer(cors_header(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            "GET",
        ))
        .layer(cors_header(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            "Content-Type, Content-Length, Authorization",
        ))
        .layer(TraceLayer::new_for_http())
}

fn cors_header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

pub struct ProxyServer {
    config: ProxyConfig,
    state: AppState,
}

impl ProxyServer {
    pub fn new(config: ProxyConfig, http: Arc<dyn HttpClient>) -> Self {
        let state = AppState::new(&config, http);
        Self { config, state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Binds the configured address and serves until Ctrl-C
    pub async fn start(&self) -> anyhow::Result<()> {
        let addr = self.config.bind_addr()?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;

        info!("Serving HTTP on {} port {}...", addr.ip(), addr.port());
        if self.config.refresh_interval_secs == 0 {
            info!("Auto refresh disabled");
        } else {
            info!("Auto refresh every {} seconds", self.config.refresh_interval_secs);
        }

        axum::serve(listener, build_router(self.state.clone()))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        info!("Server stopped.");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
