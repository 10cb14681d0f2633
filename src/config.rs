//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::render::CachingMode;

/// Default store ceiling: 64 MiB of rendered content
pub const DEFAULT_MAX_SIZE: usize = 64 * 1024 * 1024;

/// Default bounded wait for the store lock
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 250;

// == Cache Config ==
/// Tuning knobs for a single `CacheStore`.
///
/// Every `p_*` field is a fraction in `[0, 1]`; out-of-range values are clamped
/// by [`CacheConfig::normalized`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Ceiling in bytes that triggers eviction, None = unbounded
    pub max_size: Option<usize>,
    /// Extra margin the recency/frequency pass tries to leave free
    pub additional_free_space: usize,
    /// Fraction of most recently accessed entries protected from heuristic eviction
    pub p_date: f64,
    /// Fraction of most frequently accessed entries protected from heuristic eviction
    pub p_count: f64,
    /// Fraction of the largest entries considered by the size pass
    pub p_size_remove: f64,
    /// Fraction of soonest-to-expire entries considered by the TTL pass
    pub p_time_remove: f64,
    /// Maximum wait for the store lock before reporting `CacheBusy`
    pub lock_timeout: Duration,
}

impl CacheConfig {
    /// Creates a config with the given ceiling and default fractions.
    pub fn with_max_size(max_size: Option<usize>) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }

    /// Sets the extra free-space margin.
    pub fn additional_free_space(mut self, bytes: usize) -> Self {
        self.additional_free_space = bytes;
        self
    }

    /// Sets the recency/frequency protection fractions.
    pub fn protection(mut self, p_date: f64, p_count: f64) -> Self {
        self.p_date = p_date;
        self.p_count = p_count;
        self
    }

    /// Sets the fractions considered by the size and TTL passes.
    pub fn removal(mut self, p_size_remove: f64, p_time_remove: f64) -> Self {
        self.p_size_remove = p_size_remove;
        self.p_time_remove = p_time_remove;
        self
    }

    /// Sets the lock acquisition timeout.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Returns a copy with every fraction clamped to `[0, 1]`.
    ///
    /// NaN falls back to the default for that knob.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        self.p_date = clamp_fraction(self.p_date, defaults.p_date);
        self.p_count = clamp_fraction(self.p_count, defaults.p_count);
        self.p_size_remove = clamp_fraction(self.p_size_remove, defaults.p_size_remove);
        self.p_time_remove = clamp_fraction(self.p_time_remove, defaults.p_time_remove);
        self
    }

    /// Loads store knobs from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Ceiling in bytes, 0 = unbounded (default: 64 MiB)
    /// - `CACHE_ADDITIONAL_FREE_SPACE` - Margin in bytes (default: 0)
    /// - `CACHE_P_DATE` - Recency protection fraction (default: 0.2)
    /// - `CACHE_P_COUNT` - Frequency protection fraction (default: 0.2)
    /// - `CACHE_P_SIZE_REMOVE` - Size pass fraction (default: 0.5)
    /// - `CACHE_P_TIME_REMOVE` - TTL pass fraction (default: 0.25)
    /// - `CACHE_LOCK_TIMEOUT_MS` - Lock wait in milliseconds (default: 250)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_size = match env_parse::<usize>("CACHE_MAX_SIZE") {
            Some(0) => None,
            Some(bytes) => Some(bytes),
            None => defaults.max_size,
        };

        Self {
            max_size,
            additional_free_space: env_parse("CACHE_ADDITIONAL_FREE_SPACE")
                .unwrap_or(defaults.additional_free_space),
            p_date: env_parse("CACHE_P_DATE").unwrap_or(defaults.p_date),
            p_count: env_parse("CACHE_P_COUNT").unwrap_or(defaults.p_count),
            p_size_remove: env_parse("CACHE_P_SIZE_REMOVE").unwrap_or(defaults.p_size_remove),
            p_time_remove: env_parse("CACHE_P_TIME_REMOVE").unwrap_or(defaults.p_time_remove),
            lock_timeout: env_parse("CACHE_LOCK_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.lock_timeout),
        }
        .normalized()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: Some(DEFAULT_MAX_SIZE),
            additional_free_space: 0,
            p_date: 0.2,
            p_count: 0.2,
            p_size_remove: 0.5,
            p_time_remove: 0.25,
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }
}

// == Server Config ==
/// Process configuration for the demo server binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store knobs
    pub cache: CacheConfig,
    /// Caching mode handed to every root render
    pub default_caching: CachingMode,
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds, 0 disables the sweep
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_*` - See [`CacheConfig::from_env`]
    /// - `CACHE_DEFAULT_CACHEABLE` - Root caching default (default: true)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let default_caching = match env_parse::<bool>("CACHE_DEFAULT_CACHEABLE") {
            Some(true) => CachingMode::Cacheable,
            Some(false) => CachingMode::NotCacheable,
            None => defaults.default_caching,
        };

        Self {
            cache: CacheConfig::from_env(),
            default_caching,
            server_port: env_parse("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: env_parse("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            default_caching: CachingMode::Cacheable,
            server_port: 3000,
            cleanup_interval: 30,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn clamp_fraction(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache.max_size, Some(DEFAULT_MAX_SIZE));
        assert_eq!(config.cache.additional_free_space, 0);
        assert_eq!(config.default_caching, CachingMode::Cacheable);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 30);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_MAX_SIZE");
        env::remove_var("CACHE_P_DATE");
        env::remove_var("CACHE_DEFAULT_CACHEABLE");
        env::remove_var("SERVER_PORT");
        env::remove_var("CLEANUP_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config.cache.max_size, Some(DEFAULT_MAX_SIZE));
        assert_eq!(config.cache.p_date, 0.2);
        assert_eq!(config.default_caching, CachingMode::Cacheable);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 30);
    }

    #[test]
    fn test_normalized_clamps_fractions() {
        let config = CacheConfig::default()
            .protection(1.5, -0.3)
            .removal(f64::NAN, 0.4)
            .normalized();

        assert_eq!(config.p_date, 1.0);
        assert_eq!(config.p_count, 0.0);
        assert_eq!(config.p_size_remove, 0.5);
        assert_eq!(config.p_time_remove, 0.4);
    }

    #[test]
    fn test_builder_setters() {
        let config = CacheConfig::with_max_size(Some(2000))
            .additional_free_space(100)
            .lock_timeout(Duration::from_millis(5));

        assert_eq!(config.max_size, Some(2000));
        assert_eq!(config.additional_free_space, 100);
        assert_eq!(config.lock_timeout, Duration::from_millis(5));
    }
}
