//! Configuration module for blogwatch.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{BlogwatchError, Result};

/// Largest number of bind parameters SQLite accepts in one statement.
const SQLITE_MAX_VARIABLES: usize = 32766;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Scan pipeline settings.
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/blogwatch.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty disables file logging.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/blogwatch.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Scan pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Timeout for feed discovery and feed fetches, in seconds.
    #[serde(default = "default_feed_timeout")]
    pub feed_timeout_secs: u64,
    /// Timeout for the scrape fallback page fetch, in seconds.
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_secs: u64,
    /// Timeout for the Open Graph thumbnail page fetch, in seconds.
    #[serde(default = "default_thumbnail_timeout")]
    pub thumbnail_timeout_secs: u64,
    /// TCP connect timeout, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Number of parallel workers for a full sweep (1 = sequential).
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Maximum URLs per existence-check round-trip.
    #[serde(default = "default_existence_chunk_size")]
    pub existence_chunk_size: usize,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum response body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_feed_timeout() -> u64 {
    30
}

fn default_scrape_timeout() -> u64 {
    30
}

fn default_thumbnail_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_workers() -> usize {
    4
}

fn default_existence_chunk_size() -> usize {
    900
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_body_bytes() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_user_agent() -> String {
    concat!("blogwatch/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            feed_timeout_secs: default_feed_timeout(),
            scrape_timeout_secs: default_scrape_timeout(),
            thumbnail_timeout_secs: default_thumbnail_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            workers: default_workers(),
            existence_chunk_size: default_existence_chunk_size(),
            max_redirects: default_max_redirects(),
            max_body_bytes: default_max_body_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

impl ScanConfig {
    /// Convert to the runtime settings consumed by the scanner.
    pub fn settings(&self) -> ScanSettings {
        ScanSettings {
            feed_timeout: Duration::from_secs(self.feed_timeout_secs),
            scrape_timeout: Duration::from_secs(self.scrape_timeout_secs),
            thumbnail_timeout: Duration::from_secs(self.thumbnail_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            existence_chunk_size: self.existence_chunk_size,
            max_redirects: self.max_redirects,
            max_body_bytes: self.max_body_bytes,
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Runtime settings for a scan, with durations already resolved.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub feed_timeout: Duration,
    pub scrape_timeout: Duration,
    pub thumbnail_timeout: Duration,
    pub connect_timeout: Duration,
    pub existence_chunk_size: usize,
    pub max_redirects: usize,
    pub max_body_bytes: u64,
    pub user_agent: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        ScanConfig::default().settings()
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(BlogwatchError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BlogwatchError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `BLOGWATCH_DB_PATH`: Override the database path
    /// - `BLOGWATCH_WORKERS`: Override the worker count (ignored if not a number)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("BLOGWATCH_DB_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(workers) = std::env::var("BLOGWATCH_WORKERS") {
            if let Ok(workers) = workers.trim().parse() {
                self.scan.workers = workers;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The existence-check chunk size is zero or exceeds SQLite's bind limit
    /// - Any fetch timeout is zero
    pub fn validate(&self) -> Result<()> {
        let chunk = self.scan.existence_chunk_size;
        if chunk == 0 || chunk > SQLITE_MAX_VARIABLES {
            return Err(BlogwatchError::Config(format!(
                "existence_chunk_size must be between 1 and {SQLITE_MAX_VARIABLES}, got {chunk}"
            )));
        }
        let timeouts = [
            ("feed_timeout_secs", self.scan.feed_timeout_secs),
            ("scrape_timeout_secs", self.scan.scrape_timeout_secs),
            ("thumbnail_timeout_secs", self.scan.thumbnail_timeout_secs),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(BlogwatchError::Config(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }
}
