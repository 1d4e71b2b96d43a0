//! Market data provider interface.

use crate::models::{Candle, Timeframe};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum MarketDataError {
    #[error("market data request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("market data endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed market data: {0}")]
    Parse(String),
    #[error("insufficient history for {symbol}/{interval}: got {got} candles, need {required}")]
    InsufficientHistory {
        symbol: String,
        interval: Timeframe,
        got: usize,
        required: usize,
    },
    #[error("market data unavailable: {0}")]
    Unavailable(String),
}

impl MarketDataError {
    /// Errors worth retrying: transport failures and server-side statuses.
    pub fn is_transient(&self) -> bool {
        match self {
            MarketDataError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            MarketDataError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Get up to `limit` most recent candles, oldest first
    async fn get_candles(
        &self,
        symbol: &str,
        interval: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError>;
}

/// Provider serving preloaded candles, for offline runs and tests.
///
/// Symbols marked as failing return `MarketDataError::Unavailable`.
#[derive(Default)]
pub struct InMemoryMarketDataProvider {
    candles: RwLock<HashMap<(String, Timeframe), Vec<Candle>>>,
    failing: RwLock<HashSet<String>>,
}

impl InMemoryMarketDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, symbol: &str, interval: Timeframe, mut candles: Vec<Candle>) {
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        self.candles
            .write()
            .await
            .insert((symbol.to_string(), interval), candles);
    }

    pub async fn fail_symbol(&self, symbol: &str) {
        self.failing.write().await.insert(symbol.to_string());
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryMarketDataProvider {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        if self.failing.read().await.contains(symbol) {
            return Err(MarketDataError::Unavailable(format!(
                "{symbol} is marked as failing"
            )));
        }

        let candles = self.candles.read().await;
        let series = candles
            .get(&(symbol.to_string(), interval))
            .ok_or_else(|| MarketDataError::Unavailable(format!("no candles for {symbol}/{interval}")))?;
        let start = series.len().saturating_sub(limit);
        Ok(series[start..].to_vec())
    }
}
