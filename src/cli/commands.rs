use clap::Parser;
use std::path::PathBuf;

/// A proxy server to get the real url of live providers
#[derive(Parser, Debug, Clone)]
#[command(
    name = "real-url-proxy",
    about = "A proxy server to get the real url of live providers",
    version,
    long_about = "real-url-proxy resolves the current stream url of Bilibili, Douyu and Huya \
                  live rooms. Point a player at http://<host>:<port>/<provider>/<room> and it \
                  is redirected to the live stream (Huya playlists are proxied).\n\n\
                  Examples:\n  \
                  real-url-proxy -p 5000\n  \
                  real-url-proxy -p 5000 -r 3600 -l /app/proxy.log\n  \
                  curl -i http://localhost:5000/bilibili/6"
)]
pub struct CliArgs {
    #[arg(
        short = 'p',
        long,
        value_name = "PORT",
        help = "Binding port of HTTP server [default: 5000]"
    )]
    pub port: Option<u16>,

    #[arg(
        short = 'r',
        long,
        value_name = "SECONDS",
        help = "Auto refresh interval in seconds, 0 means disable auto refresh [default: 7200]"
    )]
    pub refresh: Option<u64>,

    #[arg(short = 'l', long, value_name = "FILE", help = "Log file path name")]
    pub log: Option<PathBuf>,

    #[arg(long, value_name = "HOST", help = "Binding address [default: 0.0.0.0]")]
    pub host: Option<String>,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(short = 'v', long, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}
