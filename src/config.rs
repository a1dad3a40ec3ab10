use std::time::Duration;

use crate::error::{AppError, Result};

/// Fallback pass interval (seconds) when the configured value is zero, negative or unparsable.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Longest accepted pass interval (one year). Larger values are capped.
pub const MAX_INTERVAL_SECS: u64 = 365 * 24 * 3_600;

/// Upper bound on rows returned by a single history read.
pub const HISTORY_LIMIT: i64 = 200;

/// How long shutdown waits for the scheduler task after cancellation (seconds).
pub const SHUTDOWN_GRACE_SECS: u64 = 15;

/// Synthetic seed range for products with no history (inclusive).
pub const SEED_PRICE_MIN: u32 = 100;
pub const SEED_PRICE_MAX: u32 = 999;

/// Maximum relative move per pass, in either direction.
pub const MAX_PRICE_DELTA: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Seconds between update passes (PRICE_UPDATE_INTERVAL_SECS). <= 0 means default.
    pub interval_secs: i64,
    /// Fixed seed for the price walk (PRICE_SEED). None seeds from OS entropy.
    pub price_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "prices.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            interval_secs: std::env::var("PRICE_UPDATE_INTERVAL_SECS")
                .unwrap_or_else(|_| DEFAULT_INTERVAL_SECS.to_string())
                .parse::<i64>()
                .unwrap_or(0),
            price_seed: match std::env::var("PRICE_SEED") {
                Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                    AppError::Config("PRICE_SEED must be an unsigned integer".to_string())
                })?),
                Err(_) => None,
            },
        })
    }

    pub fn interval(&self) -> Duration {
        effective_interval(self.interval_secs)
    }
}

/// Configured seconds, or the 60s default when the value is not positive.
/// Capped at `MAX_INTERVAL_SECS` so tick deadlines never overflow the clock.
pub fn effective_interval(secs: i64) -> Duration {
    if secs <= 0 {
        Duration::from_secs(DEFAULT_INTERVAL_SECS)
    } else {
        Duration::from_secs((secs as u64).min(MAX_INTERVAL_SECS))
    }
}
