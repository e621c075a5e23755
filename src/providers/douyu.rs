//! Douyu live rooms
//!
//! Uses the H5 preview endpoint, which only needs an md5 `auth` header
//! instead of the signature computed by Douyu's obfuscated page script.
//! Rooms that the preview endpoint refuses are reported as
//! [`ExtractError::SignatureRequired`].

use super::{now_millis, ExtractError, Provider, Quality, StreamSource, StreamTarget};
use crate::fetch::{HttpClient, HttpRequest};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

const MOBILE_ROOM_URL: &str = "https://m.douyu.com/";
const PREVIEW_URL: &str = "https://playweb.douyucdn.cn/lapi/live/hlsH5Preview/";
const DEVICE_ID: &str = "10000000000000000000000000001501";

const PREVIEW_OK: i64 = 0;
const PREVIEW_ROOM_NOT_FOUND: i64 = 102;
const PREVIEW_OFFLINE: i64 = 104;

/// Stream urls keyed by variant name (`flv`, `x-p2p`, ...)
pub type DouyuStreams = BTreeMap<String, String>;

fn room_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"rid":(\d{1,8}),"vipId"#).expect("valid regex"))
}

fn stream_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,8}[0-9a-zA-Z]+)_?\d{0,4}(/playlist|.m3u8)").expect("valid regex"))
}

pub struct DouyuSource {
    http: Arc<dyn HttpClient>,
}

impl DouyuSource {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    /// Maps vanity room names to the numeric room id
    async fn resolve_room_id(&self, room: &str) -> Result<String, ExtractError> {
        let url = format!("{}{}", MOBILE_ROOM_URL, room);
        let resp = self.http.send(HttpRequest::get(url).mobile()).await?;

        room_id_regex()
            .captures(&resp.body)
            .map(|c| c[1].to_string())
            .ok_or_else(|| ExtractError::RoomNotFound {
                provider: Provider::Douyu,
                room: room.to_string(),
            })
    }

    async fn preview(&self, rid: &str, now_ms: i64) -> Result<PreviewResponse, ExtractError> {
        let auth = format!("{:x}", md5::compute(format!("{}{}", rid, now_ms / 1000)));
        let request = HttpRequest::post(format!("{}{}", PREVIEW_URL, rid))
            .header("rid", rid)
            .header("time", now_ms.to_string())
            .header("auth", auth)
            .form("rid", rid)
            .form("did", DEVICE_ID)
            .mobile();

        let resp = self.http.send(request).await?;
        Ok(resp.json()?)
    }
}

#[async_trait]
impl StreamSource for DouyuSource {
    type Streams = DouyuStreams;
    type Cursor = ();

    fn provider(&self) -> Provider {
        Provider::Douyu
    }

    async fn extract(&self, room: &str) -> Result<DouyuStreams, ExtractError> {
        let rid = self.resolve_room_id(room).await?;
        let preview = self.preview(&rid, now_millis()).await?;
        debug!(rid = %rid, error = preview.error, "douyu preview answered");

        match preview.error {
            PREVIEW_OK => {}
            PREVIEW_ROOM_NOT_FOUND => {
                return Err(ExtractError::RoomNotFound {
                    provider: Provider::Douyu,
                    room: room.to_string(),
                })
            }
            PREVIEW_OFFLINE => {
                return Err(ExtractError::Offline {
                    provider: Provider::Douyu,
                    room: room.to_string(),
                })
            }
            code => {
                return Err(ExtractError::SignatureRequired {
                    room: room.to_string(),
                    code,
                })
            }
        }

        let rtmp_live = preview
            .data
            .and_then(|d| d.rtmp_live)
            .ok_or_else(|| ExtractError::unexpected(Provider::Douyu, "preview without rtmp_live"))?;
        let key = stream_key(&rtmp_live).ok_or_else(|| {
            ExtractError::unexpected(
                Provider::Douyu,
                format!("no stream key in {}", rtmp_live),
            )
        })?;

        Ok(streams_for_key(&key))
    }

    fn is_usable(streams: &DouyuStreams) -> bool {
        !streams.is_empty()
    }

    fn select(
        &self,
        streams: &DouyuStreams,
        _cursor: &mut (),
        quality: &Quality,
    ) -> Option<StreamTarget> {
        let url = match quality.named() {
            Some(name) => streams.get(name),
            None => ["flv", "2000p", "900p"]
                .iter()
                .find_map(|name| streams.get(*name)),
        };
        url.cloned().map(StreamTarget::Redirect)
    }
}

fn stream_key(rtmp_live: &str) -> Option<String> {
    stream_key_regex()
        .captures(rtmp_live)
        .map(|c| c[1].to_string())
}

fn streams_for_key(key: &str) -> DouyuStreams {
    let mut streams = DouyuStreams::new();
    streams.insert(
        "flv".to_string(),
        format!("http://dyscdnali1.douyucdn.cn/live/{}.flv?uuid=", key),
    );
    streams.insert(
        "x-p2p".to_string(),
        format!("http://tx2play1.douyucdn.cn/live/{}.xs?uuid=", key),
    );
    streams
}

#[derive(Debug, Deserialize)]
struct PreviewResponse {
    error: i64,
    #[serde(default, deserialize_with = "lenient_data")]
    data: Option<PreviewData>,
}

#[derive(Debug, Deserialize)]
struct PreviewData {
    rtmp_live: Option<String>,
}

/// The endpoint answers `"data": ""` or `"data": []` on errors
fn lenient_data<'de, D>(deserializer: D) -> Result<Option<PreviewData>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
