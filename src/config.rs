//! Configuration Module
//!
//! Handles loading and managing resolver configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default primary geocoding endpoint.
pub const DEFAULT_PRIMARY_GEOCODE_URL: &str = "https://geocode.search.hereapi.com/v1/geocode";
/// Default primary routing endpoint.
pub const DEFAULT_PRIMARY_ROUTE_URL: &str = "https://router.hereapi.com/v8/routes";
/// Default keyless fallback geocoding endpoint.
pub const DEFAULT_FALLBACK_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Resolver configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Clone)]
pub struct Config {
    /// Primary provider credential; `None` skips the primary provider entirely
    pub api_key: Option<String>,
    /// Requests allowed per 60s window for the primary provider
    pub rate_limit_per_minute: u32,
    /// Total attempts per outbound call, including the first
    pub retry_attempts: u32,
    /// Base backoff in milliseconds
    pub retry_delay_ms: u64,
    /// Upper bound for a single backoff sleep in milliseconds
    pub retry_max_delay_ms: u64,
    /// Per-request HTTP timeout in seconds
    pub request_timeout: u64,
    /// Geocode cache TTL in seconds
    pub geocode_ttl: u64,
    /// Route cache TTL in seconds
    pub route_ttl: u64,
    /// Maximum number of cache entries
    pub cache_max_size: usize,
    /// Country filter passed to the primary geocoder
    pub geocode_country: String,
    /// Requests allowed per 60s window for the fallback geocoder
    pub fallback_rate_limit: u32,
    /// Fixed delay in milliseconds before every fallback geocoder call
    pub fallback_delay_ms: u64,
    pub primary_geocode_url: String,
    pub primary_route_url: String,
    pub fallback_geocode_url: String,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `API_KEY` - Primary provider key (default: unset)
    /// - `API_RATE_LIMIT` - Requests per minute per resource (default: 100)
    /// - `API_RETRY_ATTEMPTS` - Total attempts (default: 3)
    /// - `API_RETRY_DELAY` - Base backoff in ms (default: 1000)
    /// - `API_RETRY_MAX_DELAY` - Backoff cap in ms (default: 10000)
    /// - `API_TIMEOUT` - Request timeout in seconds (default: 10)
    /// - `GEOCODE_CACHE_TTL` - Seconds (default: 1800)
    /// - `ROUTE_CACHE_TTL` - Seconds (default: 900)
    /// - `CACHE_MAX_SIZE` - Max cache entries (default: 100)
    /// - `GEOCODE_COUNTRY` - Primary country filter (default: countryCode:BRA)
    /// - `FALLBACK_RATE_LIMIT` - Fallback requests per minute (default: 60)
    /// - `FALLBACK_DELAY` - Fallback courtesy delay in ms (default: 1000)
    /// - `PRIMARY_GEOCODE_URL`, `PRIMARY_ROUTE_URL`, `FALLBACK_GEOCODE_URL` - Endpoints
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::var("API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            rate_limit_per_minute: parse_env("API_RATE_LIMIT", defaults.rate_limit_per_minute),
            retry_attempts: parse_env("API_RETRY_ATTEMPTS", defaults.retry_attempts),
            retry_delay_ms: parse_env("API_RETRY_DELAY", defaults.retry_delay_ms),
            retry_max_delay_ms: parse_env("API_RETRY_MAX_DELAY", defaults.retry_max_delay_ms),
            request_timeout: parse_env("API_TIMEOUT", defaults.request_timeout),
            geocode_ttl: parse_env("GEOCODE_CACHE_TTL", defaults.geocode_ttl),
            route_ttl: parse_env("ROUTE_CACHE_TTL", defaults.route_ttl),
            cache_max_size: parse_env("CACHE_MAX_SIZE", defaults.cache_max_size),
            geocode_country: env::var("GEOCODE_COUNTRY").unwrap_or(defaults.geocode_country),
            fallback_rate_limit: parse_env("FALLBACK_RATE_LIMIT", defaults.fallback_rate_limit),
            fallback_delay_ms: parse_env("FALLBACK_DELAY", defaults.fallback_delay_ms),
            primary_geocode_url: env::var("PRIMARY_GEOCODE_URL")
                .unwrap_or(defaults.primary_geocode_url),
            primary_route_url: env::var("PRIMARY_ROUTE_URL").unwrap_or(defaults.primary_route_url),
            fallback_geocode_url: env::var("FALLBACK_GEOCODE_URL")
                .unwrap_or(defaults.fallback_geocode_url),
            server_port: parse_env("SERVER_PORT", defaults.server_port),
        }
    }

    // == Derived Durations ==
    pub fn geocode_ttl(&self) -> Duration {
        Duration::from_secs(self.geocode_ttl)
    }

    pub fn route_ttl(&self) -> Duration {
        Duration::from_secs(self.route_ttl)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            rate_limit_per_minute: 100,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            retry_max_delay_ms: 10_000,
            request_timeout: 10,
            geocode_ttl: 30 * 60,
            route_ttl: 15 * 60,
            cache_max_size: 100,
            geocode_country: "countryCode:BRA".to_string(),
            fallback_rate_limit: 60,
            fallback_delay_ms: 1000,
            primary_geocode_url: DEFAULT_PRIMARY_GEOCODE_URL.to_string(),
            primary_route_url: DEFAULT_PRIMARY_ROUTE_URL.to_string(),
            fallback_geocode_url: DEFAULT_FALLBACK_GEOCODE_URL.to_string(),
            server_port: 3000,
        }
    }
}

// The key must never reach the logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("geocode_ttl", &self.geocode_ttl)
            .field("route_ttl", &self.route_ttl)
            .field("cache_max_size", &self.cache_max_size)
            .field("server_port", &self.server_port)
            .finish_non_exhaustive()
    }
}

/// Reads and parses an environment variable, falling back to `default` when
/// it is missing or unparseable.
fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
