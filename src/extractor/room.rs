use super::refresh::RefreshTimer;
use super::RoomResolver;
use crate::providers::{ExtractError, PlaylistOutcome, Provider, Quality, StreamSource, StreamTarget};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Stream state of a single live room
///
/// Extraction results are cached until the auto-refresh timer fires or a
/// client asks for `refresh`. A failed extraction keeps serving the last
/// streams that worked and retries after half the refresh interval.
pub struct RoomExtractor<S: StreamSource> {
    room: String,
    source: S,
    state: Mutex<RoomState<S>>,
    timer: RefreshTimer,
}

struct RoomState<S: StreamSource> {
    streams: Option<S::Streams>,
    last_valid: Option<S::Streams>,
    last_refresh: Option<DateTime<Utc>>,
    cursor: S::Cursor,
}

impl<S: StreamSource> RoomExtractor<S> {
    /// Creates the room and, for a non-zero interval, its refresh timer
    pub fn new(source: S, room: impl Into<String>, refresh_interval: Duration) -> Arc<Self> {
        let room = room.into();
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let target: Weak<dyn RoomResolver> = weak.clone();
            Self {
                room,
                source,
                state: Mutex::new(RoomState {
                    streams: None,
                    last_valid: None,
                    last_refresh: None,
                    cursor: S::Cursor::default(),
                }),
                timer: RefreshTimer::start(refresh_interval, target),
            }
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn timer(&self) -> &RefreshTimer {
        &self.timer
    }

    /// Runs one extraction and applies the failover rules
    ///
    /// Returns the extraction error, if any, after the state has already
    /// fallen back to the last valid streams.
    async fn extract_locked(&self, state: &mut RoomState<S>) -> Result<(), ExtractError> {
        let provider = self.source.provider();
        let result = match self.source.extract(&self.room).await {
            Ok(streams) if S::is_usable(&streams) => Ok(streams),
            Ok(_) => Err(ExtractError::Offline {
                provider,
                room: self.room.clone(),
            }),
            Err(e) => Err(e),
        };

        let outcome = match result {
            Ok(streams) => {
                info!(%provider, room = %self.room, "extracted url: {:?}", streams);
                state.last_valid = Some(streams.clone());
                state.streams = Some(streams);
                self.source.streams_replaced(&mut state.cursor);
                Ok(())
            }
            Err(e) => {
                info!(%provider, room = %self.room, "failed to extract real url");
                warn!(%provider, room = %self.room, error = %e, "Extraction failed");
                state.streams = state.last_valid.clone();
                Err(e)
            }
        };

        state.last_refresh = Some(Utc::now());
        self.timer.arm(outcome.is_err());
        outcome
    }
}

#[async_trait]
impl<S: StreamSource> RoomResolver for RoomExtractor<S> {
    fn provider(&self) -> Provider {
        self.source.provider()
    }

    fn room(&self) -> &str {
        &self.room
    }

    async fn resolve(&self, quality: &Quality) -> Result<Option<StreamTarget>, ExtractError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if state.streams.is_none() || quality.is_refresh() {
            if let Err(e) = self.extract_locked(state).await {
                if state.streams.is_none() {
                    return Err(e);
                }
            }
        }

        let Some(streams) = state.streams.as_ref() else {
            return Ok(None);
        };
        Ok(self.source.select(streams, &mut state.cursor, quality))
    }

    async fn refresh(&self) {
        let mut state = self.state.lock().await;
        let _ = self.extract_locked(&mut state).await;
    }

    async fn report(&self, outcome: PlaylistOutcome) {
        let mut state = self.state.lock().await;
        self.source.report(&mut state.cursor, outcome);
    }

    async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_refresh
    }
}
