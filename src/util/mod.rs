//! Utility modules for real-url-proxy
//!
//! - Structured logging setup and configuration
//! - Daily rotated log files

pub mod logging;
pub mod rolling;

pub use logging::{init_logging, parse_level, LoggingConfig};
pub use rolling::RollingFile;
