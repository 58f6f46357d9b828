//! Environment-driven configuration.
//!
//! Values are read from the process environment (optionally seeded from a
//! `.env` file by the binary). Missing or unparseable values fall back to
//! their defaults.

use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DEX_API_BASE: &str = "https://api.dexscreener.com";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 20;
pub const DEFAULT_CANDLE_LIMIT: usize = 300;
pub const DEFAULT_PRE_ALERT_BARS: f64 = 5.0;

/// Chains accepted by the upstream search and candle endpoints.
pub const SUPPORTED_CHAINS: [&str; 11] = [
    "solana", "bsc", "eth", "base", "polygon", "arbitrum", "avax", "fantom", "optimism", "ton",
    "osmosis",
];

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Deployment environment name (`production`, `sandbox`, ...).
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

pub fn get_port() -> u16 {
    env_parse("PORT").unwrap_or(DEFAULT_PORT)
}

pub fn get_dex_api_base() -> String {
    env::var("DEX_API_BASE")
        .ok()
        .map(|v| v.trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_DEX_API_BASE.to_string())
}

pub fn get_upstream_timeout() -> Duration {
    Duration::from_secs(
        env_parse("UPSTREAM_TIMEOUT_SECONDS").unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECONDS),
    )
}

pub fn get_candle_limit() -> usize {
    env_parse::<usize>("CANDLE_LIMIT")
        .filter(|&l| l > 0)
        .unwrap_or(DEFAULT_CANDLE_LIMIT)
}

pub fn get_pre_alert_bars() -> f64 {
    env_parse::<f64>("PRE_ALERT_BARS")
        .filter(|b| b.is_finite() && *b > 0.0)
        .unwrap_or(DEFAULT_PRE_ALERT_BARS)
}

/// Settings the HTTP layer needs on every request.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub candle_limit: usize,
    pub pre_alert_bars: f64,
}

impl ApiSettings {
    pub fn from_env() -> Self {
        Self {
            candle_limit: get_candle_limit(),
            pre_alert_bars: get_pre_alert_bars(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            candle_limit: DEFAULT_CANDLE_LIMIT,
            pre_alert_bars: DEFAULT_PRE_ALERT_BARS,
        }
    }
}
