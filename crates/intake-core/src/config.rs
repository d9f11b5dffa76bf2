//! Configuration module
//!
//! All settings come from environment variables with defaults suitable for
//! local development. Configuration is loaded once at startup; the scan
//! settings are snapshotted into each job at submission time rather than
//! read live during processing.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Defaults
const SERVER_PORT: u16 = 4000;
const MAX_UPLOAD_SIZE_MB: usize = 10;
const SCAN_DELAY_MS: u64 = 3000;
const UPLOAD_RATE_MAX_EVENTS: usize = 5;
const UPLOAD_RATE_INTERVAL_SECS: u64 = 60;
const UPLOAD_QUEUE_CAPACITY: usize = 256;
const TRUSTED_PROXY_COUNT: usize = 1;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    /// Root directory uploads are stored under; created on demand.
    pub storage_root: PathBuf,
    pub max_upload_size_bytes: usize,
    /// Whether the worker simulates the antivirus scan pause.
    pub simulate_scan: bool,
    pub scan_delay_ms: u64,
    pub rate_limit_max_events: usize,
    pub rate_limit_interval_secs: u64,
    pub queue_capacity: usize,
    /// Number of proxies in front of the service trusted to set
    /// X-Forwarded-For.
    pub trusted_proxy_count: usize,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            storage_root: PathBuf::from(
                env::var("STORAGE_ROOT").unwrap_or_else(|_| "uploads".to_string()),
            ),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            simulate_scan: env::var("SIMULATE_SCAN")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            scan_delay_ms: env::var("SCAN_DELAY_MS")
                .unwrap_or_else(|_| SCAN_DELAY_MS.to_string())
                .parse()
                .unwrap_or(SCAN_DELAY_MS),
            rate_limit_max_events: env::var("UPLOAD_RATE_MAX_EVENTS")
                .unwrap_or_else(|_| UPLOAD_RATE_MAX_EVENTS.to_string())
                .parse()
                .unwrap_or(UPLOAD_RATE_MAX_EVENTS),
            rate_limit_interval_secs: env::var("UPLOAD_RATE_INTERVAL_SECS")
                .unwrap_or_else(|_| UPLOAD_RATE_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_RATE_INTERVAL_SECS),
            queue_capacity: env::var("UPLOAD_QUEUE_CAPACITY")
                .unwrap_or_else(|_| UPLOAD_QUEUE_CAPACITY.to_string())
                .parse::<usize>()
                .unwrap_or(UPLOAD_QUEUE_CAPACITY)
                .max(1),
            trusted_proxy_count: env::var("TRUSTED_PROXY_COUNT")
                .unwrap_or_else(|_| TRUSTED_PROXY_COUNT.to_string())
                .parse()
                .unwrap_or(TRUSTED_PROXY_COUNT),
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("STORAGE_ROOT must not be empty"));
        }
        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be at least 1"));
        }
        if self.rate_limit_max_events == 0 {
            return Err(anyhow::anyhow!("UPLOAD_RATE_MAX_EVENTS must be at least 1"));
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }

    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_interval_secs)
    }
}

impl Default for Config {
    /// Defaults mirroring `from_env` with no environment overrides applied.
    /// Used by tests; production code goes through [`Config::from_env`].
    fn default() -> Self {
        Config {
            server_port: SERVER_PORT,
            storage_root: PathBuf::from("uploads"),
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            simulate_scan: true,
            scan_delay_ms: SCAN_DELAY_MS,
            rate_limit_max_events: UPLOAD_RATE_MAX_EVENTS,
            rate_limit_interval_secs: UPLOAD_RATE_INTERVAL_SECS,
            queue_capacity: UPLOAD_QUEUE_CAPACITY,
            trusted_proxy_count: TRUSTED_PROXY_COUNT,
            environment: "development".to_string(),
        }
    }
}
