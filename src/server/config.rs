//! Environment-derived configuration.
//!
//! All knobs are read once at startup. Invalid values fall back to their
//! defaults with a warning rather than aborting — a misconfigured cache
//! duration should never keep the service down.
//!
//! | Variable                 | Default                  | Meaning                                |
//! |--------------------------|--------------------------|----------------------------------------|
//! | `CACHE_SIZE`             | 1000                     | Max cached entries                     |
//! | `CACHE_SUCCESS_DURATION` | 24                       | Success TTL in hours (non-negative)    |
//! | `CACHE_ERROR_DURATION`   | 1                        | Error TTL in hours (non-negative)      |
//! | `GITHUB_API_URL`         | `https://api.github.com` | Upstream API base URL                  |
//! | `GITHUB_TOKEN`           | unset                    | Pre-minted bearer token (optional)     |
//! | `TAGS_ENABLED`           | true                     | Whether the tag lookup stage is active |
//!
//! The listen port is handled by the daemon's CLI (`PORT`, default 8000).

use std::time::Duration;

use tracing::warn;

use crate::cache::CacheConfig;

/// Default maximum number of cached entries.
pub const DEFAULT_CACHE_SIZE: usize = 1000;

/// Default success-cache duration in hours.
pub const DEFAULT_SUCCESS_HOURS: u64 = 24;

/// Default error-cache duration in hours.
pub const DEFAULT_ERROR_HOURS: u64 = 1;

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Service configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of cached entries.
    pub cache_size: usize,
    /// Time-to-live for 200 responses.
    pub success_ttl: Duration,
    /// Time-to-live for non-200 responses.
    pub error_ttl: Duration,
    /// Upstream API base URL.
    pub github_api_url: String,
    /// Optional pre-minted bearer token for the upstream API.
    pub github_token: Option<String>,
    /// Whether the tag lookup stage is part of the fallback chain.
    pub tags_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            success_ttl: Duration::from_secs(DEFAULT_SUCCESS_HOURS * 60 * 60),
            error_ttl: Duration::from_secs(DEFAULT_ERROR_HOURS * 60 * 60),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            github_token: None,
            tags_enabled: true,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();

        Self {
            cache_size: parse_size("CACHE_SIZE", var("CACHE_SIZE"), DEFAULT_CACHE_SIZE),
            success_ttl: Duration::from_secs(
                parse_hours(
                    "CACHE_SUCCESS_DURATION",
                    var("CACHE_SUCCESS_DURATION"),
                    DEFAULT_SUCCESS_HOURS,
                ) * 60
                    * 60,
            ),
            error_ttl: Duration::from_secs(
                parse_hours(
                    "CACHE_ERROR_DURATION",
                    var("CACHE_ERROR_DURATION"),
                    DEFAULT_ERROR_HOURS,
                ) * 60
                    * 60,
            ),
            github_api_url: var("GITHUB_API_URL")
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            github_token: var("GITHUB_TOKEN").filter(|token| !token.is_empty()),
            tags_enabled: parse_bool("TAGS_ENABLED", var("TAGS_ENABLED"), true),
        }
    }

    /// Cache configuration derived from the size and TTL settings.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .capacity(self.cache_size)
            .success_ttl(self.success_ttl)
            .error_ttl(self.error_ttl)
    }
}

/// Parse a cache duration in hours: a non-negative integer, anything else
/// falls back to the default with a warning.
fn parse_hours(name: &str, raw: Option<String>, default: u64) -> u64 {
    let Some(raw) = raw else { return default };
    match raw.parse::<i64>() {
        Ok(hours) if hours >= 0 => hours as u64,
        _ => {
            warn!(name, value = %raw, default, "invalid cache duration, using default");
            default
        }
    }
}

/// Parse a positive cache size, warning and falling back on anything else.
fn parse_size(name: &str, raw: Option<String>, default: usize) -> usize {
    let Some(raw) = raw else { return default };
    match raw.parse::<usize>() {
        Ok(size) if size > 0 => size,
        _ => {
            warn!(name, value = %raw, default, "invalid cache size, using default");
            default
        }
    }
}

/// Parse a boolean flag accepting `true`/`false`/`1`/`0`.
fn parse_bool(name: &str, raw: Option<String>, default: bool) -> bool {
    let Some(raw) = raw else { return default };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => true,
        "false" | "0" => false,
        _ => {
            warn!(name, value = %raw, default, "invalid boolean flag, using default");
            default
        }
    }
}
