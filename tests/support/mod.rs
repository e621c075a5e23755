//! Shared fixtures for integration tests
//!
//! Canned platform responses shaped like the real Bilibili, Douyu and Huya
//! APIs, served through `MockHttpClient`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use real_url_proxy::fetch::{MockHttpClient, MockResponse};
use real_url_proxy::{build_router, AppState, ProxyConfig};
use serde_json::json;
use std::sync::Arc;

pub const BILIBILI_HLS: &str = "https://cn-gotcha03.bilivideo.com/live-bvc/live_7734200.m3u8?expires=3";
pub const BILIBILI_HLS_NEXT: &str = "https://cn-gotcha04.bilivideo.com/live-bvc/live_7734200.m3u8?expires=4";

pub fn test_config() -> ProxyConfig {
    ProxyConfig {
        refresh_interval_secs: 0,
        ..ProxyConfig::builtin()
    }
}

pub fn app(http: Arc<MockHttpClient>) -> axum::Router {
    build_router(AppState::new(&test_config(), http))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn bilibili_room_init(live_status: i64) -> MockResponse {
    MockResponse::json(json!({
        "code": 0,
        "msg": "ok",
        "message": "ok",
        "data": {"room_id": 7734200, "short_id": 6, "live_status": live_status}
    }))
}

/// `room_init` answer for a room id Bilibili does not know
pub fn bilibili_unknown_room() -> MockResponse {
    MockResponse::json(json!({
        "code": 60004,
        "msg": "房间不存在",
        "message": "房间不存在",
        "data": []
    }))
}

pub fn bilibili_play_info(hls_url: &str) -> MockResponse {
    let (host, rest) = hls_url.split_at(hls_url.find("/live-bvc").unwrap());
    let (base_url, extra) = rest.split_at(rest.find('?').unwrap() + 1);
    MockResponse::json(json!({
        "code": 0,
        "message": "0",
        "data": {
            "room_id": 7734200,
            "playurl_info": {
                "playurl": {
                    "stream": [{
                        "protocol_name": "http_hls",
                        "format": [{
                            "format_name": "ts",
                            "codec": [{
                                "codec_name": "avc",
                                "base_url": base_url,
                                "url_info": [{"host": host, "extra": extra}]
                            }]
                        }]
                    }]
                }
            }
        }
    }))
}

pub const DOUYU_ROOM_PAGE: &str =
    r#"<script>var $ROOM = {"rid":288016,"vipId":0,"roomName":"lol"}</script>"#;

pub fn douyu_preview(error: i64) -> MockResponse {
    if error == 0 {
        MockResponse::json(json!({
            "error": 0,
            "msg": "ok",
            "data": {"rtmp_cdn": "ws", "rtmp_live": "288016rlols5_4000.m3u8?wsAuth=abc"}
        }))
    } else {
        MockResponse::json(json!({"error": error, "msg": "failed", "data": ""}))
    }
}

pub const HUYA_WS_TIME: &str = "65f1a2b3";

pub fn huya_anti_code() -> String {
    huya_anti_code_at(HUYA_WS_TIME)
}

pub fn huya_anti_code_at(ws_time: &str) -> String {
    let fm = STANDARD.encode("DWq8BcJ3h6DJt6TY_$0_$1_$2_$3");
    let fm: String = url::form_urlencoded::byte_serialize(fm.as_bytes()).collect();
    format!(
        "wsSecret=stale&wsTime={}&fm={}&ctype=huya_live&fs=bgct&t=100",
        ws_time, fm
    )
}

/// Mobile room page listing the AL and TX CDNs, in that order
pub fn huya_room_page() -> String {
    huya_room_page_at(HUYA_WS_TIME)
}

/// Room page whose anti-codes expire at `ws_time`
pub fn huya_room_page_at(ws_time: &str) -> String {
    let cdn = |cdn_type: &str, host: &str| {
        json!({
            "sCdnType": cdn_type,
            "sStreamName": "1199-yy",
            "sHlsUrl": format!("http://{}/src", host),
            "sHlsUrlSuffix": "m3u8",
            "sHlsAntiCode": huya_anti_code_at(ws_time)
        })
    };
    let init = json!({
        "roomInfo": {
            "eLiveStatus": 2,
            "tLiveInfo": {
                "tLiveStreamInfo": {
                    "vStreamInfo": {
                        "value": [cdn("AL", "al.hls.huya.com"), cdn("TX", "tx.hls.huya.com")]
                    }
                }
            }
        }
    });
    format!(
        "<html><script>window.HNF_GLOBAL_INIT = {};</script></html>",
        init
    )
}

pub const HUYA_PLAYLIST: &str = "#EXTM3U\n\
    #EXT-X-VERSION:3\n\
    #EXT-X-TARGETDURATION:2\n\
    #EXTINF:2.000,\n\
    1199-yy/1700.ts\n\
    #EXTINF:2.000,\n\
    1199-yy/1701.ts\n";
