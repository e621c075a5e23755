//! Huya live rooms
//!
//! The mobile room page embeds the full room state as `HNF_GLOBAL_INIT`,
//! including one stream entry per CDN. Every entry carries an anti-code query
//! string from which a short-lived `wsSecret` has to be derived before the CDN
//! accepts the playlist request. Huya's CDNs answer with relative segment
//! paths, so the playlist is proxied and rewritten instead of redirected.

use super::{now_millis, ExtractError, PlaylistOutcome, Provider, Quality, StreamSource, StreamTarget};
use crate::fetch::{HttpClient, HttpRequest};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

const MOBILE_ROOM_URL: &str = "https://m.huya.com/";
const LIVE_STATUS_LIVE: i64 = 2;
const PLATFORM_ID: u32 = 100;
const SDK_VERSION: &str = "2110211124";
const DEFAULT_CTYPE: &str = "huya_live";

/// Uid used by the Huya web player for anonymous viewers
pub const DEFAULT_UID: u64 = 1_463_993_859_134;

fn global_init_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)window\.HNF_GLOBAL_INIT\s*=\s*(.*?)\s*</script>").expect("valid regex")
    })
}

/// One CDN offering the room's stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuyaCdn {
    pub cdn_type: String,
    pub stream_name: String,
    pub base_url: String,
    pub suffix: String,
    pub anti_code: String,
}

impl HuyaCdn {
    /// Unsigned playlist url, as published by the room page
    pub fn hls_url(&self) -> String {
        format!(
            "{}/{}.{}?{}",
            self.base_url, self.stream_name, self.suffix, self.anti_code
        )
    }
}

pub type HuyaStreams = Vec<HuyaCdn>;

/// Per-room CDN choice and signed url cache
#[derive(Debug, Default)]
pub struct HuyaCursor {
    /// `None` selects the last CDN, which the room page lists as the preferred one
    cdn_index: Option<usize>,
    signed: Vec<String>,
    signed_at: Option<Instant>,
    signed_ratio: Option<String>,
}

impl HuyaCursor {
    pub fn cdn_index(&self) -> Option<usize> {
        self.cdn_index
    }

    fn advance(&mut self) {
        self.cdn_index = Some(self.cdn_index.map_or(0, |i| i + 1));
    }

    fn expire(&mut self) {
        self.signed_at = None;
    }

    fn needs_signing(&self, ttl: Duration, cdn_count: usize, ratio: Option<&str>) -> bool {
        match self.signed_at {
            None => true,
            Some(at) => {
                at.elapsed() > ttl
                    || self.signed.len() != cdn_count
                    || self.signed_ratio.as_deref() != ratio
            }
        }
    }

    fn index_for(&mut self, count: usize) -> usize {
        match self.cdn_index {
            None => count - 1,
            Some(i) if i >= count => {
                self.cdn_index = Some(0);
                0
            }
            Some(i) => i,
        }
    }
}

pub struct HuyaSource {
    http: Arc<dyn HttpClient>,
    uid: u64,
    url_ttl: Duration,
}

impl HuyaSource {
    pub fn new(http: Arc<dyn HttpClient>, uid: u64, url_ttl: Duration) -> Self {
        Self { http, uid, url_ttl }
    }
}

#[async_trait]
impl StreamSource for HuyaSource {
    type Streams = HuyaStreams;
    type Cursor = HuyaCursor;

    fn provider(&self) -> Provider {
        Provider::Huya
    }

    async fn extract(&self, room: &str) -> Result<HuyaStreams, ExtractError> {
        let url = format!("{}{}", MOBILE_ROOM_URL, room);
        let resp = self.http.send(HttpRequest::get(url).mobile()).await?;
        let streams = parse_room_page(room, &resp.body)?;
        debug!(room, cdns = streams.len(), "huya room page parsed");
        Ok(streams)
    }

    fn is_usable(streams: &HuyaStreams) -> bool {
        !streams.is_empty()
    }

    fn select(
        &self,
        streams: &HuyaStreams,
        cursor: &mut HuyaCursor,
        quality: &Quality,
    ) -> Option<StreamTarget> {
        if streams.is_empty() {
            return None;
        }
        if matches!(quality, Quality::SwitchCdn) {
            cursor.advance();
        }

        let ratio = quality
            .named()
            .filter(|q| !q.is_empty() && q.bytes().all(|b| b.is_ascii_digit()));

        if cursor.needs_signing(self.url_ttl, streams.len(), ratio) {
            let now_ms = now_millis();
            cursor.signed = streams
                .iter()
                .map(|cdn| sign_stream(cdn, self.uid, now_ms, ratio))
                .collect();
            cursor.signed_at = Some(Instant::now());
            cursor.signed_ratio = ratio.map(str::to_string);
        }

        let index = cursor.index_for(streams.len());
        Some(StreamTarget::Playlist {
            url: cursor.signed[index].clone(),
            base_url: streams[index].base_url.clone(),
        })
    }

    fn report(&self, cursor: &mut HuyaCursor, outcome: PlaylistOutcome) {
        match outcome {
            PlaylistOutcome::Unreachable => cursor.advance(),
            PlaylistOutcome::Forbidden => cursor.expire(),
        }
    }

    /// Signatures belong to the anti-codes they were computed from
    fn streams_replaced(&self, cursor: &mut HuyaCursor) {
        cursor.expire();
    }
}

/// Derives the signed playlist url of a CDN entry
///
/// Falls back to the unsigned url when the anti-code lacks the `fm` template.
pub fn sign_stream(cdn: &HuyaCdn, uid: u64, now_ms: i64, ratio: Option<&str>) -> String {
    let params: Vec<(String, String)> = url::form_urlencoded::parse(cdn.anti_code.as_bytes())
        .into_owned()
        .collect();
    let param = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    let prefix = param("fm")
        .and_then(|fm| STANDARD.decode(fm.replace(' ', "+")).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|template| template.split('_').next().map(str::to_string));

    let (Some(prefix), Some(ws_time)) = (prefix, param("wsTime")) else {
        return cdn.hls_url();
    };

    let ctype = param("ctype").unwrap_or(DEFAULT_CTYPE);
    let fs = param("fs").unwrap_or_default();
    let seqid = uid as i64 + now_ms;
    let hash = format!(
        "{:x}",
        md5::compute(format!("{}|{}|{}", seqid, ctype, PLATFORM_ID))
    );
    let secret = format!(
        "{:x}",
        md5::compute(format!(
            "{}_{}_{}_{}_{}",
            prefix, uid, cdn.stream_name, hash, ws_time
        ))
    );

    let mut url = format!(
        "{}/{}.{}?wsSecret={}&wsTime={}&seqid={}&ctype={}&ver=1&fs={}&u={}&t={}&sv={}",
        cdn.base_url,
        cdn.stream_name,
        cdn.suffix,
        secret,
        ws_time,
        seqid,
        ctype,
        fs,
        uid,
        PLATFORM_ID,
        SDK_VERSION
    );
    if let Some(ratio) = ratio {
        url.push_str("&ratio=");
        url.push_str(ratio);
    }
    url
}

fn parse_room_page(room: &str, page: &str) -> Result<HuyaStreams, ExtractError> {
    let json = global_init_regex()
        .captures(page)
        .map(|c| c[1].trim_end_matches(';').to_string())
        .ok_or_else(|| ExtractError::unexpected(Provider::Huya, "room page without HNF_GLOBAL_INIT"))?;

    let init: GlobalInit = serde_json::from_str(&json).map_err(|e| {
        ExtractError::unexpected(Provider::Huya, format!("invalid HNF_GLOBAL_INIT: {}", e))
    })?;

    let offline = || ExtractError::Offline {
        provider: Provider::Huya,
        room: room.to_string(),
    };

    let info = init.room_info.ok_or_else(offline)?;
    if info.live_status != LIVE_STATUS_LIVE {
        return Err(offline());
    }

    let streams: HuyaStreams = info
        .live_info
        .and_then(|l| l.stream_info)
        .and_then(|s| s.streams)
        .map(|list| list.value)
        .unwrap_or_default()
        .into_iter()
        .filter(|s| !s.hls_url.is_empty() && !s.stream_name.is_empty())
        .map(|s| HuyaCdn {
            cdn_type: s.cdn_type,
            stream_name: s.stream_name,
            base_url: s.hls_url,
            suffix: s.hls_suffix,
            anti_code: s.hls_anti_code,
        })
        .collect();

    if streams.is_empty() {
        return Err(offline());
    }
    Ok(streams)
}

#[derive(Debug, Deserialize)]
struct GlobalInit {
    #[serde(rename = "roomInfo")]
    room_info: Option<RoomInfo>,
}

#[derive(Debug, Deserialize)]
struct RoomInfo {
    #[serde(rename = "eLiveStatus", default)]
    live_status: i64,
    #[serde(rename = "tLiveInfo")]
    live_info: Option<LiveInfo>,
}

#[derive(Debug, Deserialize)]
struct LiveInfo {
    #[serde(rename = "tLiveStreamInfo")]
    stream_info: Option<LiveStreamInfo>,
}

#[derive(Debug, Deserialize)]
struct LiveStreamInfo {
    #[serde(rename = "vStreamInfo")]
    streams: Option<ValueList<StreamInfo>>,
}

#[derive(Debug, Deserialize)]
struct ValueList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StreamInfo {
    #[serde(rename = "sCdnType", default)]
    cdn_type: String,
    #[serde(rename = "sStreamName", default)]
    stream_name: String,
    #[serde(rename = "sHlsUrl", default)]
    hls_url: String,
    #[serde(rename = "sHlsUrlSuffix", default = "default_suffix")]
    hls_suffix: String,
    #[serde(rename = "sHlsAntiCode", default)]
    hls_anti_code: String,
}

fn default_suffix() -> String {
    "m3u8".to_string()
}
