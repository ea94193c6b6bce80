//! Environment-driven configuration
//!
//! All deployment-owned settings are read once at startup, so a missing API
//! key or base URL fails the process before any upstream call is attempted.

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Articles requested per upstream query
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// How long a subscriber's merged article list stays fresh
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
/// Interval between background cache sweeps
pub const DEFAULT_REFRESH_SECS: u64 = 300;
/// Per-request timeout for upstream calls
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Errors raised while resolving configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    /// An environment variable is set but cannot be parsed
    #[error("environment variable {var} has invalid value '{value}'")]
    InvalidVar { var: &'static str, value: String },
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream provider base URL (no trailing slash)
    pub api_base_url: String,
    /// Upstream provider API key
    pub api_key: String,
    /// Articles requested per upstream query
    pub page_size: u32,
    /// TTL applied to cache entries written by the aggregator
    pub cache_ttl_secs: u64,
    /// Interval between background cache sweeps
    pub refresh_secs: u64,
    /// Timeout applied to every upstream HTTP request
    pub http_timeout_secs: u64,
}

impl Config {
    /// Resolves configuration from the process environment
    ///
    /// # Returns
    /// * `Ok(Config)` when `NEWS_API_URL` and `NEWS_API_SECRET` are set and
    ///   all optional numeric overrides parse
    /// * `Err(ConfigError)` naming the offending variable otherwise
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Resolves configuration through a caller-supplied variable lookup
    ///
    /// Tests use this to exercise the loader without mutating the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = lookup("NEWS_API_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingVar("NEWS_API_URL"))?;
        let api_key = lookup("NEWS_API_SECRET")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingVar("NEWS_API_SECRET"))?;

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_key,
            page_size: parse_or(&lookup, "NEWS_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            cache_ttl_secs: parse_or(&lookup, "NEWS_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
            refresh_secs: parse_or(&lookup, "NEWS_REFRESH_SECS", DEFAULT_REFRESH_SECS)?,
            http_timeout_secs: parse_or(&lookup, "NEWS_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
        })
    }
}

/// Parses an optional numeric variable, falling back to `default` when unset
fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value }),
    }
}
