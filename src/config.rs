//! Configuration loader for the `greenhouse-dashboard` binary.
//!
//! All runtime settings come from environment variables (with optional
//! `.env` support provided by the caller) and are collected here once, so
//! the rest of the crate never calls `env::var` directly.
//!
use std::{env, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Result};

use crate::time_range::TimeRange;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

pub const DEFAULT_BASE_URL: &str = "https://api.thingspeak.com";

/// Placeholder key shipped in sample `.env` files; treated as unset.
const PLACEHOLDER_API_KEY: &str = "YOUR_READ_API_KEY";

/// How the feed request limits the returned window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedQuery {
    /// `?days=N`, taken from the selected display range.
    DaysBack,
    /// `?results=N`, a fixed entry count.
    ResultCount(u32),
}

/// How each refresh is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable cards and sparklines.
    #[default]
    Text,
    /// One JSON document per refresh.
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => bail!("Invalid DASHBOARD_OUTPUT '{}' (expected 'text' or 'json')", other),
        }
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Feed API base URL, without trailing slash.
    pub base_url: String,

    /// Public channel identifier.
    pub channel_id: String,

    /// Read API key, only needed for private channels.
    pub read_api_key: Option<String>,

    pub feed_query: FeedQuery,

    /// Period of the automatic refresh.
    pub refresh_interval: Duration,

    /// Range shown at startup.
    pub default_range: TimeRange,

    pub output: OutputFormat,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `THINGSPEAK_CHANNEL_ID` – channel to poll
///
/// Optional:
/// - `THINGSPEAK_READ_API_KEY` – read key (default: none)
/// - `THINGSPEAK_BASE_URL` – API base (default: `https://api.thingspeak.com`)
/// - `FEED_QUERY` – `days` or `results` (default: `days`)
/// - `FEED_RESULTS` – entry count for `results` (default: 8000)
/// - `REFRESH_INTERVAL_SECS` – auto-refresh period (default: 300)
/// - `DEFAULT_TIME_RANGE` – `24h`, `7d`, `30d` or `1y` (default: `24h`)
/// - `DASHBOARD_OUTPUT` – `text` or `json` (default: `text`)
pub fn load_from_env() -> Result<Config> {
    // ---
    let channel_id = require_env!("THINGSPEAK_CHANNEL_ID");
    let base_url = env::var("THINGSPEAK_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string();
    let read_api_key = env::var("THINGSPEAK_READ_API_KEY").ok();
    let refresh_secs = parse_env_u32!("REFRESH_INTERVAL_SECS", 300);
    let feed_results = parse_env_u32!("FEED_RESULTS", 8000);
    let feed_query = env::var("FEED_QUERY").unwrap_or_else(|_| "days".to_string());
    let default_range = env::var("DEFAULT_TIME_RANGE")
        .ok()
        .map(|v| v.parse::<TimeRange>())
        .transpose()?
        .unwrap_or_default();

    let output = env::var("DASHBOARD_OUTPUT")
        .ok()
        .map(|v| v.parse::<OutputFormat>())
        .transpose()?
        .unwrap_or_default();

    let mut cfg = Config::new(
        base_url,
        channel_id,
        read_api_key,
        &feed_query,
        feed_results,
        refresh_secs,
        default_range,
    )?;
    cfg.output = output;
    Ok(cfg)
}

impl Config {
    /// Validate raw settings into a `Config`.
    pub fn new(
        base_url: String,
        channel_id: String,
        read_api_key: Option<String>,
        feed_query: &str,
        feed_results: u32,
        refresh_secs: u32,
        default_range: TimeRange,
    ) -> Result<Config> {
        // ---
        if channel_id.trim().is_empty() {
            bail!("THINGSPEAK_CHANNEL_ID must not be empty");
        }
        if refresh_secs == 0 {
            bail!("REFRESH_INTERVAL_SECS must be greater than zero");
        }

        let feed_query = match feed_query.trim() {
            "days" => FeedQuery::DaysBack,
            "results" => FeedQuery::ResultCount(feed_results),
            other => bail!("Invalid FEED_QUERY '{}' (expected 'days' or 'results')", other),
        };

        let read_api_key = read_api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != PLACEHOLDER_API_KEY);

        Ok(Config {
            base_url,
            channel_id: channel_id.trim().to_string(),
            read_api_key,
            feed_query,
            refresh_interval: Duration::from_secs(u64::from(refresh_secs)),
            default_range,
            output: OutputFormat::default(),
        })
    }

    /// Log the loaded configuration with the API key masked.
    pub fn log_config(&self) {
        // ---
        let masked_key = match &self.read_api_key {
            Some(key) if key.chars().count() > 4 => {
                format!("{}****", key.chars().take(4).collect::<String>())
            }
            Some(_) => "****".to_string(),
            None => "(none)".to_string(),
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  THINGSPEAK_BASE_URL     : {}", self.base_url);
        tracing::info!("  THINGSPEAK_CHANNEL_ID   : {}", self.channel_id);
        tracing::info!("  THINGSPEAK_READ_API_KEY : {}", masked_key);
        tracing::info!("  FEED_QUERY              : {:?}", self.feed_query);
        tracing::info!("  REFRESH_INTERVAL_SECS   : {}", self.refresh_interval.as_secs());
        tracing::info!("  DEFAULT_TIME_RANGE      : {}", self.default_range);
        tracing::info!("  DASHBOARD_OUTPUT        : {:?}", self.output);
    }
}
