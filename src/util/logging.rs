//! Structured logging setup for real-url-proxy
//!
//! Console output goes to stderr through `tracing-subscriber`. When a log
//! file is configured, a second plain-text layer writes into a
//! [`RollingFile`] rotated once per day.
//!
//! # Example
//!
//! ```no_run
//! use real_url_proxy::util::{init_logging, LoggingConfig};
//! use tracing::Level;
//!
//! let mut config = LoggingConfig::with_level(Level::DEBUG);
//! config.log_file = Some("/app/proxy.log".into());
//! init_logging(config).expect("log file should be writable");
//!
//! tracing::info!(port = 5000, "Serving HTTP");
//! ```

use super::rolling::{RollingFile, DEFAULT_BACKUPS};
use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, Once};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format on the console
    pub use_json: bool,

    /// Include the module target (e.g., real_url_proxy::server) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Include thread ID and name in logs
    pub include_thread_ids: bool,

    /// Additional daily rotated log file
    pub log_file: Option<PathBuf>,

    /// Number of rotated log files to keep
    pub file_backups: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
            log_file: None,
            file_backups: DEFAULT_BACKUPS,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with full metadata, for log collectors
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self::with_level(Level::DEBUG)
    }
}

/// Parses a log level from a string
///
/// Unknown values fall back to `Level::INFO`.
///
/// ```
/// use real_url_proxy::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();

    if env::var("RUST_LOG").is_err() {
        let crate_directive = format!("real_url_proxy={}", level);
        for directive in [crate_directive.as_str(), "h2=warn", "hyper=warn", "reqwest=warn", "tower_http=info"] {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }
    }
    filter
}

/// Initializes the logging system with the provided configuration
///
/// Only the first call installs a subscriber; later calls are ignored.
///
/// # Errors
///
/// Returns the I/O error if the log file cannot be opened.
pub fn init_logging(config: LoggingConfig) -> io::Result<()> {
    let file = match &config.log_file {
        Some(path) => Some(RollingFile::open(path, config.file_backups)?),
        None => None,
    };

    INIT.call_once(|| {
        let file_layer = file.map(|file| {
            fmt::layer()
                .with_ansi(false)
                .with_target(config.include_target)
                .with_writer(Mutex::new(file))
        });

        let console_layer = if config.use_json {
            fmt::layer()
                .json()
                .with_target(config.include_target)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread_ids)
                .with_thread_names(config.include_thread_ids)
                .with_writer(io::stderr)
                .boxed()
        } else {
            fmt::layer()
                .with_target(config.include_target)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread_ids)
                .with_thread_names(config.include_thread_ids)
                .with_writer(io::stderr)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(build_filter(config.level))
            .with(console_layer)
            .with(file_layer)
            .init();
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_case_insensitive() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("invalid"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);
        assert!(config.include_target);
        assert!(config.log_file.is_none());
        assert_eq!(config.file_backups, 3);
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert!(config.use_json);
        assert!(config.include_location);
        assert!(config.include_thread_ids);
    }

    #[test]
    fn test_development_config() {
        let config = LoggingConfig::development();
        assert_eq!(config.level, Level::DEBUG);
        assert!(!config.use_json);
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let config = LoggingConfig {
            log_file: Some(blocker.join("proxy.log")),
            ..Default::default()
        };
        assert!(init_logging(config).is_err());
    }
}
