use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Backend keys are optional: a missing key disables that provider and marks /health degraded.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub rate_limit_enabled: bool,
    /// Requests allowed per client address within one rolling minute.
    pub rate_limit_max_requests: usize,
    pub verbose_logging: bool,
    /// Upper bound on a single provider call, applied on top of the HTTP client's own timeout.
    pub backend_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            rate_limit_enabled: parse_env("RATE_LIMIT_ENABLED", true)?,
            rate_limit_max_requests: parse_env("RATE_LIMIT_MAX_REQUESTS", 10)?,
            verbose_logging: parse_env("VERBOSE_LOGGING", false)?,
            backend_timeout: Duration::from_secs(parse_env("BACKEND_TIMEOUT_SECS", 30)?),
        })
    }

    /// Length of a configured key, 0 when absent. Reported by /health without exposing the key.
    pub fn key_length(key: &Option<String>) -> usize {
        key.as_deref().map(str::len).unwrap_or(0)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            anthropic_api_key: None,
            port: 8080,
            rust_log: "info".to_string(),
            rate_limit_enabled: true,
            rate_limit_max_requests: 10,
            verbose_logging: false,
            backend_timeout: Duration::from_secs(30),
        }
    }
}

/// Blank values are treated the same as unset ones.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
