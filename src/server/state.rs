use crate::config::ProxyConfig;
use crate::extractor::{ExtractorSettings, RoomRegistry};
use crate::fetch::HttpClient;
use std::sync::Arc;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub http: Arc<dyn HttpClient>,
}

impl AppState {
    pub fn new(config: &ProxyConfig, http: Arc<dyn HttpClient>) -> Self {
        let registry = RoomRegistry::new(http.clone(), ExtractorSettings::from(config));
        Self {
            registry: Arc::new(registry),
            http,
        }
    }
}
