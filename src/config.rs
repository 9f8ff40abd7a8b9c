//! Configuration Module
//!
//! Handles loading cache and soak-run configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_EVICTION_TARGET};
use crate::error::{CacheError, Result};

/// Cache and soak-run configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// Size the cache is trimmed to when `max_size` is exceeded
    pub eviction_target: usize,
    /// Seconds between stats reports
    pub stats_interval: u64,
    /// Number of concurrent soak workers
    pub soak_workers: usize,
    /// Requests issued by each soak worker
    pub soak_requests: usize,
    /// Number of distinct keys the soak workers draw from
    pub soak_key_space: usize,
    /// Simulated producer latency in milliseconds
    pub soak_fetch_delay_ms: u64,
    /// Fail every Nth key's fetch (0 = never fail)
    pub soak_failure_every: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `CACHE_EVICTION_TARGET` - Size after an eviction run (default: 300)
    /// - `STATS_INTERVAL` - Stats report frequency in seconds (default: 5)
    /// - `SOAK_WORKERS` - Concurrent soak workers (default: 8)
    /// - `SOAK_REQUESTS` - Requests per worker (default: 10000)
    /// - `SOAK_KEY_SPACE` - Distinct keys requested (default: 2000)
    /// - `SOAK_FETCH_DELAY_MS` - Simulated fetch latency (default: 1)
    /// - `SOAK_FAILURE_EVERY` - Fail every Nth key, 0 disables (default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: env_or("CACHE_MAX_SIZE", defaults.max_size),
            eviction_target: env_or("CACHE_EVICTION_TARGET", defaults.eviction_target),
            stats_interval: env_or("STATS_INTERVAL", defaults.stats_interval),
            soak_workers: env_or("SOAK_WORKERS", defaults.soak_workers),
            soak_requests: env_or("SOAK_REQUESTS", defaults.soak_requests),
            soak_key_space: env_or("SOAK_KEY_SPACE", defaults.soak_key_space),
            soak_fetch_delay_ms: env_or("SOAK_FETCH_DELAY_MS", defaults.soak_fetch_delay_ms),
            soak_failure_every: env_or("SOAK_FAILURE_EVERY", defaults.soak_failure_every),
        }
    }

    /// Checks the values a cache and soak run cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "CACHE_MAX_SIZE must be greater than zero".to_string(),
            ));
        }
        if self.eviction_target == 0 || self.eviction_target > self.max_size {
            return Err(CacheError::InvalidConfig(format!(
                "CACHE_EVICTION_TARGET must be between 1 and {}, got {}",
                self.max_size, self.eviction_target
            )));
        }
        if self.stats_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "STATS_INTERVAL must be greater than zero".to_string(),
            ));
        }
        if self.soak_key_space == 0 {
            return Err(CacheError::InvalidConfig(
                "SOAK_KEY_SPACE must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_CAPACITY,
            eviction_target: DEFAULT_EVICTION_TARGET,
            stats_interval: 5,
            soak_workers: 8,
            soak_requests: 10_000,
            soak_key_space: 2000,
            soak_fetch_delay_ms: 1,
            soak_failure_every: 0,
        }
    }
}
