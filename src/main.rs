use real_url_proxy::cli::CliArgs;
use real_url_proxy::util::{init_logging, parse_level, LoggingConfig};
use real_url_proxy::{ProxyConfig, ProxyServer, ReqwestClient, VERSION};

use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let config = ProxyConfig::default().apply_args(&args);

    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        std::process::exit(2);
    }

    let logging = LoggingConfig {
        level: parse_level(&config.log_level),
        use_json: config.log_json,
        log_file: config.log_file.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(logging) {
        eprintln!(
            "Failed to open log file {}: {}",
            config.log_file.as_deref().unwrap_or(Path::new("")).display(),
            e
        );
        std::process::exit(2);
    }

    debug!("real-url-proxy v{} starting", VERSION);
    debug!("Configuration: {:?}", config);

    std::process::exit(run(config).await);
}

async fn run(config: ProxyConfig) -> i32 {
    let http = match ReqwestClient::new(config.request_timeout()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    match ProxyServer::new(config, http).start().await {
        Ok(()) => 0,
        Err(e) => {
            error!("Server failed: {}", e);
            1
        }
    }
}
