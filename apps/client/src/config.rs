use std::time::Duration;

use anyhow::{Context, Result};

use crate::jobs::history::DEFAULT_PAGE_SIZE;
use crate::jobs::poller::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};

/// Client configuration loaded from environment variables.
/// Fails at startup if the backend URL is missing or a numeric setting does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub page_size: u32,
    pub http_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let poll_interval_ms: u64 = parse_env_or(
            "SKILLMATCH_POLL_INTERVAL_MS",
            DEFAULT_POLL_INTERVAL.as_millis() as u64,
        )?;
        let max_poll_attempts: u32 =
            parse_env_or("SKILLMATCH_MAX_POLL_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        let page_size: u32 = parse_env_or("SKILLMATCH_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let http_timeout_secs: u64 = parse_env_or("SKILLMATCH_HTTP_TIMEOUT_SECS", 30)?;

        check_limits(max_poll_attempts, page_size)?;

        Ok(Config {
            api_url: require_env("SKILLMATCH_API_URL")?,
            api_token: std::env::var("SKILLMATCH_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_poll_attempts,
            page_size,
            http_timeout: Duration::from_secs(http_timeout_secs),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Polling and paging both need a limit of at least one.
fn check_limits(max_poll_attempts: u32, page_size: u32) -> Result<()> {
    if max_poll_attempts == 0 {
        anyhow::bail!("SKILLMATCH_MAX_POLL_ATTEMPTS must be at least 1");
    }
    if page_size == 0 {
        anyhow::bail!("SKILLMATCH_PAGE_SIZE must be at least 1");
    }
    Ok(())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_setting(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_setting<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a valid number, got '{raw}'"))
}
