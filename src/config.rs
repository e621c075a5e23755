//! Configuration management for real-url-proxy
//!
//! Settings are loaded from environment variables with sensible defaults and
//! then overridden by command-line flags.
//!
//! # Environment Variables
//!
//! - `REAL_URL_PROXY_HOST`: Bind address - default: "0.0.0.0"
//! - `REAL_URL_PROXY_PORT`: Bind port - default: "5000"
//! - `REAL_URL_PROXY_REFRESH`: Auto refresh interval in seconds, 0 disables - default: "7200"
//! - `REAL_URL_PROXY_LOG_FILE`: Daily rotated log file - default: unset
//! - `REAL_URL_PROXY_LOG_LEVEL`: Logging level - default: "info"
//! - `REAL_URL_PROXY_LOG_JSON`: JSON log output (true|false) - default: "false"
//! - `REAL_URL_PROXY_REQUEST_TIMEOUT`: Upstream timeout in seconds - default: "30"
//! - `REAL_URL_PROXY_URL_CACHE_TTL`: Lifetime of signed Huya urls in seconds - default: "120"
//! - `REAL_URL_PROXY_HUYA_UID`: Viewer uid used to sign Huya urls - default: "1463993859134"
//!
//! # Example
//!
//! ```no_run
//! use real_url_proxy::ProxyConfig;
//!
//! let config = ProxyConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("Binding {}", config.bind_addr().unwrap());
//! ```

use crate::cli::CliArgs;
use crate::providers::huya::DEFAULT_UID;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 7200;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_URL_CACHE_TTL_SECS: u64 = 120;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid bind address {addr}: {error}")]
    InvalidAddress { addr: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,

    /// Auto refresh interval of every room, 0 disables it
    pub refresh_interval_secs: u64,

    pub log_file: Option<PathBuf>,
    pub log_level: String,
    pub log_json: bool,

    /// Timeout for every upstream request, including proxied playlists
    pub request_timeout_secs: u64,

    pub url_cache_ttl_secs: u64,
    pub huya_uid: u64,
}

impl Default for ProxyConfig {
    /// Loads the configuration from `REAL_URL_PROXY_*` environment variables
    fn default() -> Self {
        let builtin = Self::builtin();

        Self {
            host: env::var("REAL_URL_PROXY_HOST").unwrap_or(builtin.host),
            port: env_parse("REAL_URL_PROXY_PORT").unwrap_or(builtin.port),
            refresh_interval_secs: env_parse("REAL_URL_PROXY_REFRESH")
                .unwrap_or(builtin.refresh_interval_secs),
            log_file: env::var("REAL_URL_PROXY_LOG_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            log_level: env::var("REAL_URL_PROXY_LOG_LEVEL")
                .unwrap_or(builtin.log_level)
                .to_lowercase(),
            log_json: env_parse("REAL_URL_PROXY_LOG_JSON").unwrap_or(builtin.log_json),
            request_timeout_secs: env_parse("REAL_URL_PROXY_REQUEST_TIMEOUT")
                .unwrap_or(builtin.request_timeout_secs),
            url_cache_ttl_secs: env_parse("REAL_URL_PROXY_URL_CACHE_TTL")
                .unwrap_or(builtin.url_cache_ttl_secs),
            huya_uid: env_parse("REAL_URL_PROXY_HUYA_UID").unwrap_or(builtin.huya_uid),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl ProxyConfig {
    /// Built-in defaults, ignoring the environment
    pub fn builtin() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            log_file: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            url_cache_ttl_secs: DEFAULT_URL_CACHE_TTL_SECS,
            huya_uid: DEFAULT_UID,
        }
    }

    /// Applies command-line flags on top of the loaded configuration
    pub fn apply_args(mut self, args: &CliArgs) -> Self {
        if let Some(host) = &args.host {
            self.host = host.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(refresh) = args.refresh {
            self.refresh_interval_secs = refresh;
        }
        if let Some(log) = &args.log {
            self.log_file = Some(log.clone());
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.to_lowercase();
        } else if args.verbose {
            self.log_level = "debug".to_string();
        } else if args.quiet {
            self.log_level = "error".to_string();
        }
        if args.json_logs {
            self.log_json = true;
        }
        self
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any value is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ValidationFailed(
                "Port must be between 1 and 65535".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if self.url_cache_ttl_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Url cache ttl must be at least 1 second".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        self.bind_addr().map(|_| ())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidAddress {
            addr: addr.clone(),
            error: e.to_string(),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
