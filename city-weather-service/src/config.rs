use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub struct Config {
    pub port: u16,
    pub open_meteo_url: String,
    pub cities_file: PathBuf,
    pub cache_capacity: usize,
    /// `None` keeps cached temperatures until they are evicted by capacity
    pub cache_ttl: Option<Duration>,
    pub upstream_timeout: Duration,
    pub upstream_max_retries: u32,
    pub update_concurrency: usize,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            open_meteo_url: env::var("OPEN_METEO_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com/v1/forecast".to_string()),
            cities_file: env::var("CITIES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("europe.csv")),
            cache_capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|c| c.parse().ok())
                .unwrap_or(100),
            cache_ttl: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            upstream_timeout: Duration::from_secs(
                env::var("UPSTREAM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(30),
            ),
            upstream_max_retries: env::var("UPSTREAM_MAX_RETRIES")
                .ok()
                .and_then(|r| r.parse().ok())
                .unwrap_or(0),
            update_concurrency: env::var("UPDATE_CONCURRENCY")
                .ok()
                .and_then(|c| c.parse().ok())
                .unwrap_or(1),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
        }
    }
}
