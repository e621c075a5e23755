use super::state::AppState;
use crate::extractor::RoomResolver;
use crate::fetch::HttpRequest;
use crate::playlist::{fallback_playlist, rewrite_segments};
use crate::providers::{PlaylistOutcome, Provider, Quality, StreamTarget};
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

const HLS_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
const NOT_FOUND_CONTENT_TYPE: &str = "text/html; charset=gb2312";

pub async fn stream(
    State(state): State<AppState>,
    Path((provider, room)): Path<(String, String)>,
) -> Response {
    serve_stream(&state, &provider, &room, Quality::Default).await
}

pub async fn stream_with_quality(
    State(state): State<AppState>,
    Path((provider, room, quality)): Path<(String, String, String)>,
) -> Response {
    serve_stream(&state, &provider, &room, Quality::parse(Some(&quality))).await
}

async fn serve_stream(state: &AppState, provider: &str, room: &str, quality: Quality) -> Response {
    info!(provider, room, quality = %quality, "Stream requested");

    let Some(provider) = Provider::from_name(provider) else {
        return not_found();
    };

    let resolver = state.registry.get_or_create(provider, room).await;
    let target = match resolver.resolve(&quality).await {
        Ok(Some(target)) => target,
        Ok(None) => return not_found(),
        Err(e) => {
            error!("Failed to extract {} real url! Error: {}", provider, e);
            // Err means the room never produced a stream
            state.registry.evict(&resolver).await;
            return not_found();
        }
    };

    match target {
        StreamTarget::Redirect(url) => redirect(&url),
        StreamTarget::Playlist { url, base_url } => {
            proxy_playlist(state, resolver.as_ref(), &url, &base_url).await
        }
    }
}

async fn proxy_playlist(
    state: &AppState,
    resolver: &dyn RoomResolver,
    url: &str,
    base_url: &str,
) -> Response {
    let request = HttpRequest::get(url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .mobile();

    let (status, body) = match state.http.send(request).await {
        Ok(resp) => {
            if resp.status == StatusCode::FORBIDDEN.as_u16() {
                warn!(provider = %resolver.provider(), room = resolver.room(), "Playlist request forbidden, expiring signed urls");
                resolver.report(PlaylistOutcome::Forbidden).await;
            }
            let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, rewrite_segments(&resp.body, base_url))
        }
        Err(e) => {
            warn!(provider = %resolver.provider(), room = resolver.room(), error = %e, "Failed to fetch playlist, switching CDN");
            resolver.report(PlaylistOutcome::Unreachable).await;
            (StatusCode::OK, fallback_playlist(url))
        }
    };

    (status, [(header::CONTENT_TYPE, HLS_CONTENT_TYPE)], body).into_response()
}

fn redirect(url: &str) -> Response {
    match HeaderValue::from_str(url) {
        Ok(location) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response(),
        Err(_) => {
            error!("Resolved url is not a valid Location header: {}", url);
            not_found()
        }
    }
}

pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, NOT_FOUND_CONTENT_TYPE)],
        "Not Found",
    )
        .into_response()
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let rooms: BTreeMap<String, usize> = state
        .registry
        .counts()
        .await
        .into_iter()
        .map(|(provider, count)| (provider.to_string(), count))
        .collect();

    Json(serde_json::json!({
        "status": "healthy",
        "version": crate::VERSION,
        "rooms": rooms,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn fallback() -> Response {
    not_found()
}
