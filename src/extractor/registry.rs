use super::{RoomExtractor, RoomResolver};
use crate::config::ProxyConfig;
use crate::fetch::HttpClient;
use crate::providers::{BilibiliSource, DouyuSource, HuyaSource, Provider};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Knobs shared by every room the registry creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorSettings {
    /// Zero disables auto refresh
    pub refresh_interval: Duration,
    pub url_cache_ttl: Duration,
    pub huya_uid: u64,
}

impl From<&ProxyConfig> for ExtractorSettings {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            refresh_interval: Duration::from_secs(config.refresh_interval_secs),
            url_cache_ttl: Duration::from_secs(config.url_cache_ttl_secs),
            huya_uid: config.huya_uid,
        }
    }
}

/// Lazily created rooms, one per (provider, room id)
pub struct RoomRegistry {
    http: Arc<dyn HttpClient>,
    settings: ExtractorSettings,
    rooms: RwLock<HashMap<(Provider, String), Arc<dyn RoomResolver>>>,
}

impl RoomRegistry {
    pub fn new(http: Arc<dyn HttpClient>, settings: ExtractorSettings) -> Self {
        Self {
            http,
            settings,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    pub async fn get_or_create(&self, provider: Provider, room: &str) -> Arc<dyn RoomResolver> {
        let key = (provider, room.to_string());
        if let Some(existing) = self.rooms.read().await.get(&key) {
            return existing.clone();
        }

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(key)
            .or_insert_with(|| {
                debug!(%provider, room, "Tracking new room");
                self.create(provider, room)
            })
            .clone()
    }

    fn create(&self, provider: Provider, room: &str) -> Arc<dyn RoomResolver> {
        let interval = self.settings.refresh_interval;
        match provider {
            Provider::Bilibili => {
                RoomExtractor::new(BilibiliSource::new(self.http.clone()), room, interval)
            }
            Provider::Douyu => {
                RoomExtractor::new(DouyuSource::new(self.http.clone()), room, interval)
            }
            Provider::Huya => RoomExtractor::new(
                HuyaSource::new(
                    self.http.clone(),
                    self.settings.huya_uid,
                    self.settings.url_cache_ttl,
                ),
                room,
                interval,
            ),
        }
    }

    /// Stops tracking `resolver` if it is still the registered instance
    ///
    /// Used for rooms that never produced a stream, so unknown room ids do not
    /// keep a refresh timer polling upstream.
    pub async fn evict(&self, resolver: &Arc<dyn RoomResolver>) -> bool {
        let key = (resolver.provider(), resolver.room().to_string());
        let mut rooms = self.rooms.write().await;
        if !rooms.get(&key).is_some_and(|r| Arc::ptr_eq(r, resolver)) {
            return false;
        }
        rooms.remove(&key);
        debug!(provider = %key.0, room = %key.1, "Evicted room without streams");
        true
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    /// Room count per provider
    pub async fn counts(&self) -> HashMap<Provider, usize> {
        let rooms = self.rooms.read().await;
        let mut counts = HashMap::new();
        for (provider, _) in rooms.keys() {
            *counts.entry(*provider).or_insert(0) += 1;
        }
        counts
    }
}
