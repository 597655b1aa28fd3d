//! Server configuration via CLI args and environment variables.

use std::time::Duration;

use clap::Parser;

use edgeguard_http::HttpConfig;
use edgeguard_service::GatekeeperConfig;

/// Edge gatekeeper: filters bots and proxies humans to a backend pool.
#[derive(Parser, Debug, Clone)]
#[command(name = "edgeguard-server", version, about)]
pub struct Config {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0", env = "EDGEGUARD_HOST")]
    pub host: String,

    /// Bind port.
    #[arg(long, default_value_t = 8080, env = "EDGEGUARD_PORT")]
    pub port: u16,

    /// Backend base URLs (comma-separated).
    #[arg(long, env = "EDGEGUARD_BACKENDS", value_delimiter = ',', required = true)]
    pub backends: Vec<String>,

    /// Redis URL for the shared counter store. Omit for an in-process store
    /// (single instance only).
    #[arg(long, env = "EDGEGUARD_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Rate window in seconds.
    #[arg(long, default_value_t = 10, env = "EDGEGUARD_RATE_WINDOW")]
    pub rate_window: u64,

    /// Requests per window still classified as human.
    #[arg(long, default_value_t = 20, env = "EDGEGUARD_RATE_THRESHOLD")]
    pub rate_threshold: u64,

    /// User-Agent substrings that mark a caller as automated (comma-separated).
    #[arg(
        long,
        env = "EDGEGUARD_BOT_PATTERNS",
        value_delimiter = ',',
        default_value = "bot,crawler,spider,curl,wget,python,automation"
    )]
    pub bot_patterns: Vec<String>,

    /// Headers trusted to carry the client address, in priority order.
    #[arg(
        long,
        env = "EDGEGUARD_CLIENT_IP_HEADERS",
        value_delimiter = ',',
        default_value = "x-real-ip,x-forwarded-for"
    )]
    pub client_ip_headers: Vec<String>,

    /// Prefix of the per-address rate keys.
    #[arg(long, default_value = "rate:", env = "EDGEGUARD_RATE_KEY_PREFIX")]
    pub rate_key_prefix: String,

    /// Key of the live stats bucket.
    #[arg(long, default_value = "stats:live", env = "EDGEGUARD_STATS_BUCKET")]
    pub stats_bucket: String,

    /// Also record stats into per-UTC-hour buckets.
    #[arg(long, env = "EDGEGUARD_HOURLY_STATS")]
    pub hourly_stats: bool,

    /// `error` field of the 403 body.
    #[arg(
        long,
        default_value = "access denied",
        env = "EDGEGUARD_REJECTION_MESSAGE"
    )]
    pub rejection_message: String,

    /// Bound on every counter store call, in milliseconds.
    #[arg(long, default_value_t = 2000, env = "EDGEGUARD_STORE_TIMEOUT_MS")]
    pub store_timeout_ms: u64,

    /// Backend connect and read timeout in seconds.
    #[arg(long, default_value_t = 10, env = "EDGEGUARD_BACKEND_TIMEOUT")]
    pub backend_timeout: u64,

    /// Largest request body buffered for forwarding.
    #[arg(long, default_value_t = 10 * 1024 * 1024, env = "EDGEGUARD_MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    /// CORS allowed origins for the stats endpoints (comma-separated). Empty for no CORS.
    #[arg(long, env = "EDGEGUARD_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Log level.
    #[arg(long, default_value = "info", env = "EDGEGUARD_LOG_LEVEL")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[arg(long, default_value = "text", env = "EDGEGUARD_LOG_FORMAT")]
    pub log_format: String,
}

impl Config {
    /// Parses configuration from CLI args and env vars.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn gatekeeper_config(&self) -> GatekeeperConfig {
        GatekeeperConfig {
            backends: self.backends.clone(),
            rate_window_secs: self.rate_window,
            rate_threshold: self.rate_threshold,
            bot_patterns: self.bot_patterns.clone(),
            rate_key_prefix: self.rate_key_prefix.clone(),
            stats_bucket: self.stats_bucket.clone(),
            hourly_stats: self.hourly_stats,
        }
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            client_ip_headers: self.client_ip_headers.clone(),
            rejection_message: self.rejection_message.clone(),
            cors_origins: self.cors_origins.clone(),
            backend_timeout: Duration::from_secs(self.backend_timeout),
            max_body_bytes: self.max_body_bytes,
        }
    }
}
