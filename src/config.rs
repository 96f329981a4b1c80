//! Configuration Module
//!
//! Loads the caching subsystem's tunables from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Caching subsystem configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity bound of the volatile cache
    pub max_entries: usize,
    /// Default TTL in milliseconds for entries inserted without one
    pub default_ttl_ms: u64,
    /// Volatile cache sweep interval in seconds
    pub sweep_interval_secs: u64,
    /// Age in seconds after which a stored image is stale
    pub image_expiry_secs: u64,
    /// Minimum time in seconds between two image cleanup passes
    pub image_cleanup_interval_secs: u64,
    /// Timeout in seconds for a single image download
    pub fetch_timeout_secs: u64,
    /// Directory backing the persistent key/value storage
    pub storage_dir: PathBuf,
    /// Diagnostics HTTP port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Volatile cache capacity (default: 100)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in ms (default: 300000)
    /// - `CACHE_SWEEP_INTERVAL_SECS` - Sweep frequency (default: 60)
    /// - `IMAGE_CACHE_EXPIRY_SECS` - Image expiry window (default: 604800)
    /// - `IMAGE_CLEANUP_INTERVAL_SECS` - Image cleanup interval (default: 86400)
    /// - `IMAGE_FETCH_TIMEOUT_SECS` - Image download timeout (default: 30)
    /// - `CACHE_STORAGE_DIR` - Persistent storage directory (default: ./.workforce-cache)
    /// - `SERVER_PORT` - Diagnostics HTTP port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("CACHE_MAX_ENTRIES", defaults.max_entries),
            default_ttl_ms: env_or("CACHE_DEFAULT_TTL_MS", defaults.default_ttl_ms),
            sweep_interval_secs: env_or("CACHE_SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs),
            image_expiry_secs: env_or("IMAGE_CACHE_EXPIRY_SECS", defaults.image_expiry_secs),
            image_cleanup_interval_secs: env_or(
                "IMAGE_CLEANUP_INTERVAL_SECS",
                defaults.image_cleanup_interval_secs,
            ),
            fetch_timeout_secs: env_or("IMAGE_FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs),
            storage_dir: env::var("CACHE_STORAGE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn image_expiry(&self) -> Duration {
        Duration::from_secs(self.image_expiry_secs)
    }

    pub fn image_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.image_cleanup_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 100,
            default_ttl_ms: 5 * 60 * 1000,
            sweep_interval_secs: 60,
            image_expiry_secs: 7 * 24 * 60 * 60,
            image_cleanup_interval_secs: 24 * 60 * 60,
            fetch_timeout_secs: 30,
            storage_dir: PathBuf::from(".workforce-cache"),
            server_port: 3000,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
