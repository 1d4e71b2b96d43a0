//! Environment-driven configuration
//!
//! Every setting has a default so a bare `cargo run` works against the public
//! Binance API with an in-memory ledger. Values that are present but malformed
//! are reported as [`ConfigError`] instead of silently falling back.

use crate::models::{Coin, CoinUniverse};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MODELS_DIR: &str = "models";
pub const DEFAULT_BINANCE_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_MISFIRE_GRACE_SECONDS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid coin entry '{0}', expected CODE:SYMBOL")]
    InvalidCoin(String),
    #[error("COINS must name at least one coin")]
    NoCoins,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub port: u16,
    /// Absent means forecasts are kept in memory only.
    pub database_url: Option<String>,
    pub models_dir: PathBuf,
    pub binance_base_url: String,
    pub market_data_timeout: Duration,
    pub market_data_max_retries: usize,
    pub coins: CoinUniverse,
    pub scheduler_enabled: bool,
    pub misfire_grace: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "sandbox".to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            binance_base_url: DEFAULT_BINANCE_BASE_URL.to_string(),
            market_data_timeout: Duration::from_secs(10),
            market_data_max_retries: 3,
            coins: CoinUniverse::default(),
            scheduler_enabled: true,
            misfire_grace: Duration::from_secs(DEFAULT_MISFIRE_GRACE_SECONDS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Blank values count as unset.
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

        let coins = match get("COINS") {
            Some(raw) => parse_coins(&raw)?,
            None => defaults.coins,
        };

        Ok(Self {
            environment: get("ENVIRONMENT")
                .map(|e| e.to_lowercase())
                .unwrap_or(defaults.environment),
            port: parse_or("PORT", get("PORT"), defaults.port)?,
            database_url: get("DATABASE_URL"),
            models_dir: get("MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),
            binance_base_url: get("BINANCE_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.binance_base_url),
            market_data_timeout: Duration::from_secs(parse_or(
                "MARKET_DATA_TIMEOUT_SECONDS",
                get("MARKET_DATA_TIMEOUT_SECONDS"),
                defaults.market_data_timeout.as_secs(),
            )?),
            market_data_max_retries: parse_or(
                "MARKET_DATA_MAX_RETRIES",
                get("MARKET_DATA_MAX_RETRIES"),
                defaults.market_data_max_retries,
            )?,
            coins,
            scheduler_enabled: match get("SCHEDULER_ENABLED") {
                Some(raw) => parse_bool("SCHEDULER_ENABLED", &raw)?,
                None => defaults.scheduler_enabled,
            },
            misfire_grace: Duration::from_secs(parse_or(
                "MISFIRE_GRACE_SECONDS",
                get("MISFIRE_GRACE_SECONDS"),
                DEFAULT_MISFIRE_GRACE_SECONDS,
            )?),
        })
    }

    /// `ENVIRONMENT` of `production` or `prod`.
    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }
}

/// Parse `CODE:SYMBOL` pairs separated by commas, e.g. `BTC:BTCUSDT,ETH:ETHUSDT`.
pub fn parse_coins(raw: &str) -> Result<CoinUniverse, ConfigError> {
    let mut coins: Vec<Coin> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (code, symbol) = entry
            .split_once(':')
            .map(|(c, s)| (c.trim(), s.trim()))
            .filter(|(c, s)| !c.is_empty() && !s.is_empty())
            .ok_or_else(|| ConfigError::InvalidCoin(entry.to_string()))?;

        if coins.iter().any(|c| c.code.eq_ignore_ascii_case(code)) {
            continue;
        }
        coins.push(Coin::new(code.to_uppercase(), symbol.to_uppercase()));
    }

    if coins.is_empty() {
        return Err(ConfigError::NoCoins);
    }
    Ok(CoinUniverse::new(coins))
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
