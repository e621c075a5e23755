//! Bilibili live rooms
//!
//! Resolution takes two calls: `room_init` maps short room ids to the
//! canonical id and reports the live status, then `getRoomPlayInfo` lists the
//! available streams grouped by protocol, container format and codec.

use super::{ExtractError, Provider, Quality, StreamSource, StreamTarget};
use crate::fetch::{HttpClient, HttpRequest};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const ROOM_INIT_URL: &str = "https://api.live.bilibili.com/room/v1/Room/room_init";
const PLAY_INFO_URL: &str = "https://api.live.bilibili.com/xlive/web-room/v2/index/getRoomPlayInfo";
const LIVE_STATUS_LIVE: i64 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BilibiliStreams {
    pub hls_url: Option<String>,
    pub flv_url: Option<String>,
}

pub struct BilibiliSource {
    http: Arc<dyn HttpClient>,
}

impl BilibiliSource {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    async fn room_init(&self, room: &str) -> Result<i64, ExtractError> {
        let resp = self
            .http
            .send(HttpRequest::get(ROOM_INIT_URL).query("id", room).mobile())
            .await?;
        let mut init: ApiResponse<RoomInit> = resp.json()?;

        let data = match (init.code, init.data.take()) {
            (0, Some(data)) => data,
            _ => {
                debug!(code = init.code, msg = init.message(), "bilibili room_init rejected room {}", room);
                return Err(ExtractError::RoomNotFound {
                    provider: Provider::Bilibili,
                    room: room.to_string(),
                });
            }
        };

        if data.live_status != LIVE_STATUS_LIVE {
            return Err(ExtractError::Offline {
                provider: Provider::Bilibili,
                room: room.to_string(),
            });
        }

        Ok(data.room_id)
    }

    async fn play_info(&self, room_id: i64) -> Result<PlayInfo, ExtractError> {
        let request = HttpRequest::get(PLAY_INFO_URL)
            .query("room_id", room_id)
            .query("protocol", "0,1")
            .query("format", "0,1,2")
            .query("codec", "0,1")
            .query("qn", 10000)
            .query("platform", "h5")
            .query("ptype", 8)
            .mobile();

        let resp = self.http.send(request).await?;
        let mut info: ApiResponse<PlayInfo> = resp.json()?;

        match (info.code, info.data.take()) {
            (0, Some(data)) => Ok(data),
            (code, _) => Err(ExtractError::unexpected(
                Provider::Bilibili,
                format!("getRoomPlayInfo returned code {}: {}", code, info.message()),
            )),
        }
    }
}

#[async_trait]
impl StreamSource for BilibiliSource {
    type Streams = BilibiliStreams;
    type Cursor = ();

    fn provider(&self) -> Provider {
        Provider::Bilibili
    }

    async fn extract(&self, room: &str) -> Result<BilibiliStreams, ExtractError> {
        let room_id = self.room_init(room).await?;
        let info = self.play_info(room_id).await?;
        let streams = collect_streams(&info);

        if !Self::is_usable(&streams) {
            return Err(ExtractError::Offline {
                provider: Provider::Bilibili,
                room: room.to_string(),
            });
        }
        Ok(streams)
    }

    fn is_usable(streams: &BilibiliStreams) -> bool {
        streams.hls_url.is_some() || streams.flv_url.is_some()
    }

    fn select(
        &self,
        streams: &BilibiliStreams,
        _cursor: &mut (),
        _quality: &Quality,
    ) -> Option<StreamTarget> {
        streams
            .hls_url
            .clone()
            .or_else(|| streams.flv_url.clone())
            .map(StreamTarget::Redirect)
    }
}

fn collect_streams(info: &PlayInfo) -> BilibiliStreams {
    let Some(playurl) = info
        .playurl_info
        .as_ref()
        .and_then(|p| p.playurl.as_ref())
    else {
        return BilibiliStreams::default();
    };

    let find = |protocol: &str, format: &str| {
        playurl
            .stream
            .iter()
            .filter(|s| s.protocol_name == protocol)
            .flat_map(|s| s.format.iter())
            .filter(|f| f.format_name == format)
            .flat_map(|f| f.codec.iter())
            .find_map(StreamCodec::url)
    };

    BilibiliStreams {
        hls_url: find("http_hls", "ts").or_else(|| find("http_hls", "fmp4")),
        flv_url: find("http_stream", "flv"),
    }
}

/// Envelope shared by the live APIs
///
/// `room_init` sends both `msg` and `message`; failures send `"data": []`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct ApiResponse<T: DeserializeOwned> {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    msg: String,
    #[serde(default, deserialize_with = "lenient_data")]
    data: Option<T>,
}

impl<T: DeserializeOwned> ApiResponse<T> {
    fn message(&self) -> &str {
        if self.message.is_empty() {
            &self.msg
        } else {
            &self.message
        }
    }
}

/// Only an object carries data; `[]`, `""` and `null` mean none
fn lenient_data<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    match serde_json::Value::deserialize(deserializer)? {
        value @ serde_json::Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
struct RoomInit {
    room_id: i64,
    live_status: i64,
}

#[derive(Debug, Deserialize)]
struct PlayInfo {
    playurl_info: Option<PlayUrlInfo>,
}

#[derive(Debug, Deserialize)]
struct PlayUrlInfo {
    playurl: Option<PlayUrl>,
}

#[derive(Debug, Deserialize)]
struct PlayUrl {
    #[serde(default)]
    stream: Vec<StreamEntry>,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    protocol_name: String,
    #[serde(default)]
    format: Vec<StreamFormat>,
}

#[derive(Debug, Deserialize)]
struct StreamFormat {
    format_name: String,
    #[serde(default)]
    codec: Vec<StreamCodec>,
}

#[derive(Debug, Deserialize)]
struct StreamCodec {
    base_url: String,
    #[serde(default)]
    url_info: Vec<UrlInfo>,
}

impl StreamCodec {
    fn url(&self) -> Option<String> {
        self.url_info
            .first()
            .map(|info| format!("{}{}{}", info.host, self.base_url, info.extra))
    }
}

#[derive(Debug, Deserialize)]
struct UrlInfo {
    host: String,
    #[serde(default)]
    extra: String,
}
