//! Router integration tests
//!
//! Drives the full axum router against `MockHttpClient`:
//! - redirects and CORS headers
//! - room caching, `refresh` and failover to the last working stream
//! - Huya playlist proxying, CDN switching and upstream status passthrough
//! - the 404 page and the health endpoint

mod support;

use axum::http::{header, StatusCode};
use real_url_proxy::fetch::{FetchError, MockHttpClient, MockResponse};
use real_url_proxy::{build_router, AppState};
use std::sync::Arc;
use support::*;
use tower::ServiceExt;

fn bilibili_mock() -> Arc<MockHttpClient> {
    let http = Arc::new(MockHttpClient::new());
    http.respond("room_init", bilibili_room_init(1));
    http.respond("getRoomPlayInfo", bilibili_play_info(BILIBILI_HLS));
    http
}

fn huya_mock() -> Arc<MockHttpClient> {
    let http = Arc::new(MockHttpClient::new());
    http.respond("m.huya.com", MockResponse::ok(huya_room_page()));
    http
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_bilibili_redirects_with_cors_headers() {
    let app = app(bilibili_mock());

    let response = app.oneshot(get("/bilibili/6")).await.unwrap();

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), BILIBILI_HLS);

    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type, Content-Length, Authorization"
    );
}

#[tokio::test]
async fn test_unknown_provider_is_not_found() {
    let app = app(Arc::new(MockHttpClient::new()));

    for uri in ["/twitch/1", "/", "/huya"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=gb2312"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(body_string(response).await, "Not Found");
    }
}

#[tokio::test]
async fn test_rooms_are_cached_until_refresh() {
    let http = Arc::new(MockHttpClient::new());
    http.respond("room_init", bilibili_room_init(1));
    http.respond("getRoomPlayInfo", bilibili_play_info(BILIBILI_HLS));
    http.respond("getRoomPlayInfo", bilibili_play_info(BILIBILI_HLS_NEXT));
    let app = app(http.clone());

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/bilibili/6")).await.unwrap();
        assert_eq!(location(&response), BILIBILI_HLS);
    }
    assert_eq!(http.request_count("getRoomPlayInfo"), 1);

    let response = app.clone().oneshot(get("/bilibili/6/refresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), BILIBILI_HLS_NEXT);
    assert_eq!(http.request_count("getRoomPlayInfo"), 2);

    let response = app.oneshot(get("/bilibili/6")).await.unwrap();
    assert_eq!(location(&response), BILIBILI_HLS_NEXT);
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_valid_stream() {
    let http = Arc::new(MockHttpClient::new());
    http.respond("room_init", bilibili_room_init(1));
    http.respond("room_init", bilibili_room_init(0));
    http.respond("getRoomPlayInfo", bilibili_play_info(BILIBILI_HLS));
    let app = app(http.clone());

    let response = app.clone().oneshot(get("/bilibili/6")).await.unwrap();
    assert_eq!(location(&response), BILIBILI_HLS);

    let response = app.oneshot(get("/bilibili/6/refresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), BILIBILI_HLS);
    assert_eq!(http.request_count("room_init"), 2);
}

#[tokio::test]
async fn test_offline_room_is_not_found() {
    let http = Arc::new(MockHttpClient::new());
    http.respond("m.douyu.com", MockResponse::ok(DOUYU_ROOM_PAGE));
    http.respond("hlsH5Preview", douyu_preview(104));
    let state = AppState::new(&test_config(), http.clone());
    let app = build_router(state.clone());

    let response = app.clone().oneshot(get("/douyu/288016")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(state.registry.is_empty().await);

    // Nothing was cached, so the next request extracts again
    let response = app.oneshot(get("/douyu/288016")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(http.request_count("hlsH5Preview"), 2);
}

#[tokio::test]
async fn test_unknown_bilibili_room_is_not_found() {
    let http = Arc::new(MockHttpClient::new());
    http.respond("room_init", bilibili_unknown_room());
    let state = AppState::new(&test_config(), http.clone());
    let app = build_router(state.clone());

    let response = app.oneshot(get("/bilibili/999999999")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(http.request_count("getRoomPlayInfo"), 0);
    assert!(state.registry.is_empty().await);
}

#[tokio::test]
async fn test_room_with_streams_stays_tracked_after_failure() {
    let http = Arc::new(MockHttpClient::new());
    http.respond("room_init", bilibili_room_init(1));
    http.respond("room_init", bilibili_room_init(0));
    http.respond("getRoomPlayInfo", bilibili_play_info(BILIBILI_HLS));
    let state = AppState::new(&test_config(), http.clone());
    let app = build_router(state.clone());

    app.clone().oneshot(get("/bilibili/6")).await.unwrap();
    let response = app.oneshot(get("/bilibili/6/refresh")).await.unwrap();

    assert_eq!(location(&response), BILIBILI_HLS);
    assert_eq!(state.registry.len().await, 1);
}

#[tokio::test]
async fn test_douyu_named_variants() {
    let http = Arc::new(MockHttpClient::new());
    http.respond("m.douyu.com", MockResponse::ok(DOUYU_ROOM_PAGE));
    http.respond("hlsH5Preview", douyu_preview(0));
    let app = app(http.clone());

    let response = app.clone().oneshot(get("/douyu/288016")).await.unwrap();
    assert_eq!(
        location(&response),
        "http://dyscdnali1.douyucdn.cn/live/288016rlols5.flv?uuid="
    );

    let response = app.clone().oneshot(get("/douyu/288016/x-p2p")).await.unwrap();
    assert_eq!(
        location(&response),
        "http://tx2play1.douyucdn.cn/live/288016rlols5.xs?uuid="
    );

    let response = app.oneshot(get("/douyu/288016/4k")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(http.request_count("hlsH5Preview"), 1);
}

#[tokio::test]
async fn test_huya_playlist_is_proxied_from_preferred_cdn() {
    let http = huya_mock();
    http.respond("tx.hls.huya.com", MockResponse::ok(HUYA_PLAYLIST));
    let app = app(http.clone());

    let response = app.oneshot(get("/huya/11342412")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let body = body_string(response).await;
    assert!(body.starts_with("#EXTM3U\n"));
    assert!(body.contains("\nhttp://tx.hls.huya.com/src/1199-yy/1700.ts\n"));
    assert!(body.contains("\nhttp://tx.hls.huya.com/src/1199-yy/1701.ts\n"));
    assert_eq!(http.request_count("tx.hls.huya.com"), 1);
    assert_eq!(http.request_count("al.hls.huya.com"), 0);

    let playlist_request = http
        .requests()
        .into_iter()
        .find(|r| r.url.contains("tx.hls.huya.com"))
        .unwrap();
    assert!(playlist_request.url.contains("/1199-yy.m3u8?wsSecret="));
    assert!(!playlist_request.url.contains("wsSecret=stale"));
}

#[tokio::test]
async fn test_huya_unreachable_cdn_serves_fallback_and_switches() {
    let http = huya_mock();
    http.respond(
        "tx.hls.huya.com",
        MockResponse::error(FetchError::Timeout { seconds: 30 }),
    );
    http.respond("al.hls.huya.com", MockResponse::ok(HUYA_PLAYLIST));
    let app = app(http.clone());

    let response = app.clone().oneshot(get("/huya/11342412")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.starts_with("#EXTM3U\n#EXT-X-STREAM-INF:"));
    assert!(body.contains("http://tx.hls.huya.com/src/1199-yy.m3u8?wsSecret="));

    let response = app.oneshot(get("/huya/11342412")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("http://al.hls.huya.com/src/1199-yy/1700.ts"));
    assert_eq!(http.request_count("m.huya.com"), 1);
}

#[tokio::test]
async fn test_huya_refresh_signs_new_anti_codes() {
    let http = Arc::new(MockHttpClient::new());
    http.respond("m.huya.com", MockResponse::ok(huya_room_page_at("65f1a2b3")));
    http.respond("m.huya.com", MockResponse::ok(huya_room_page_at("65f1b000")));
    http.respond("tx.hls.huya.com", MockResponse::ok(HUYA_PLAYLIST));
    let app = app(http.clone());

    let playlist_urls = || -> Vec<String> {
        http.requests()
            .into_iter()
            .filter(|r| r.url.contains("tx.hls.huya.com"))
            .map(|r| r.url)
            .collect()
    };

    app.clone().oneshot(get("/huya/11342412")).await.unwrap();
    let response = app.oneshot(get("/huya/11342412/refresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let urls = playlist_urls();
    assert_eq!(urls.len(), 2);
    assert!(urls[0].contains("wsTime=65f1a2b3"));
    assert!(urls[1].contains("wsTime=65f1b000"));
    assert_eq!(http.request_count("m.huya.com"), 2);
}

#[tokio::test]
async fn test_huya_switch_cdn() {
    let http = huya_mock();
    http.respond("tx.hls.huya.com", MockResponse::ok(HUYA_PLAYLIST));
    http.respond("al.hls.huya.com", MockResponse::ok(HUYA_PLAYLIST));
    let app = app(http.clone());

    let response = app.oneshot(get("/huya/11342412/switch_cdn")).await.unwrap();
    let body = body_string(response).await;

    assert!(body.contains("http://al.hls.huya.com/src/1199-yy/1700.ts"));
    assert_eq!(http.request_count("tx.hls.huya.com"), 0);
}

#[tokio::test]
async fn test_huya_forbidden_status_is_passed_through() {
    let http = huya_mock();
    http.respond("tx.hls.huya.com", MockResponse::status(403, "forbidden"));
    let app = app(http.clone());

    let response = app.clone().oneshot(get("/huya/11342412")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_string(response).await, "forbidden");

    // The cursor stays on the same CDN, only the signature is renewed
    let response = app.oneshot(get("/huya/11342412")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(http.request_count("tx.hls.huya.com"), 2);
    assert_eq!(http.request_count("m.huya.com"), 1);
}

#[tokio::test]
async fn test_health_reports_tracked_rooms() {
    let app = app(bilibili_mock());

    app.clone().oneshot(get("/bilibili/6")).await.unwrap();
    app.clone().oneshot(get("/bilibili/7")).await.unwrap();
    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], real_url_proxy::VERSION);
    assert_eq!(json["rooms"]["bilibili"], 2);
}
