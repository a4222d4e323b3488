use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::error::AppError;

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://local-business-data.p.rapidapi.com";

/// Longest accepted rate-limit window, one day.
pub const MAX_RATE_LIMIT_WINDOW_SECS: u64 = 86_400;
/// Longest accepted upstream timeout.
pub const MAX_UPSTREAM_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub rapidapi_key: Option<String>,
    pub rapidapi_host: Option<String>,
    pub upstream_base_url: String,
    pub upstream_timeout_secs: u64,
    pub allowed_origin: Option<String>,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub rate_limit_sweep_windows: u32,
    pub redis_url: Option<String>,
}

/// Credentials required for every upstream call.
#[derive(Clone, Copy)]
pub struct UpstreamCredentials<'a> {
    pub api_key: &'a str,
    pub api_host: &'a str,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "::".to_string(),
            server_port: 3000,
            api_base_uri: "/api".to_string(),
            rapidapi_key: None,
            rapidapi_host: None,
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            upstream_timeout_secs: 30,
            allowed_origin: None,
            rate_limit_window_secs: 60,
            rate_limit_requests: 30,
            rate_limit_sweep_windows: 5,
            redis_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Ok(Config {
            server_host: get("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or(get("SERVER_PORT"), "SERVER_PORT", defaults.server_port)?,
            api_base_uri: get("API_BASE_URI").unwrap_or(defaults.api_base_uri),
            rapidapi_key: get("RAPIDAPI_KEY"),
            rapidapi_host: get("RAPIDAPI_HOST"),
            upstream_base_url: get("RAPIDAPI_BASE_URL").unwrap_or(defaults.upstream_base_url),
            upstream_timeout_secs: parse_at_most(
                get("UPSTREAM_TIMEOUT").map(|v| v.trim_end_matches('s').to_string()),
                "UPSTREAM_TIMEOUT",
                defaults.upstream_timeout_secs,
                MAX_UPSTREAM_TIMEOUT_SECS,
            )?,
            allowed_origin: get("ALLOWED_ORIGIN"),
            rate_limit_window_secs: parse_at_most(
                get("RATE_LIMIT_WINDOW").map(|v| v.trim_end_matches('s').to_string()),
                "RATE_LIMIT_WINDOW",
                defaults.rate_limit_window_secs,
                MAX_RATE_LIMIT_WINDOW_SECS,
            )?,
            rate_limit_requests: parse_or(
                get("RATE_LIMIT_REQUESTS"),
                "RATE_LIMIT_REQUESTS",
                defaults.rate_limit_requests,
            )?,
            rate_limit_sweep_windows: parse_or(
                get("RATE_LIMIT_SWEEP_WINDOWS"),
                "RATE_LIMIT_SWEEP_WINDOWS",
                defaults.rate_limit_sweep_windows,
            )?,
            redis_url: get("REDIS_URL"),
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs.min(MAX_RATE_LIMIT_WINDOW_SECS))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs.min(MAX_UPSTREAM_TIMEOUT_SECS))
    }

    /// Resolves the upstream key and host, checked per request rather than at startup.
    ///
    /// The error names the missing variable for the server log only; the
    /// client sees a generic configuration message.
    pub fn upstream_credentials(&self) -> Result<UpstreamCredentials<'_>, AppError> {
        match (self.rapidapi_key.as_deref(), self.rapidapi_host.as_deref()) {
            (Some(api_key), Some(api_host)) => Ok(UpstreamCredentials { api_key, api_host }),
            (None, None) => Err(AppError::Config(
                "RAPIDAPI_KEY and RAPIDAPI_HOST are not set".into(),
            )),
            (None, Some(_)) => Err(AppError::Config("RAPIDAPI_KEY is not set".into())),
            (Some(_), None) => Err(AppError::Config("RAPIDAPI_HOST is not set".into())),
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_at_most(
    raw: Option<String>,
    key: &'static str,
    default: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let value = parse_or(raw, key, default)?;
    if value > max {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        });
    }
    Ok(value)
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("api_base_uri", &self.api_base_uri)
            .field("rapidapi_key", &self.rapidapi_key.as_ref().map(|_| "<redacted>"))
            .field("rapidapi_host", &self.rapidapi_host)
            .field("upstream_base_url", &self.upstream_base_url)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("allowed_origin", &self.allowed_origin)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_sweep_windows", &self.rate_limit_sweep_windows)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
