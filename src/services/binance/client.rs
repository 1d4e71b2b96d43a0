//! Binance REST client for kline snapshots

use crate::models::{Candle, Timeframe};
use crate::services::market_data::MarketDataError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Largest `limit` the klines endpoint accepts.
pub const MAX_KLINES_LIMIT: usize = 1000;

#[derive(Clone)]
pub struct BinanceRestClient {
    base_url: String,
    client: reqwest::Client,
}

impl BinanceRestClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/v3/klines`, one attempt.
    pub async fn klines(
        &self,
        symbol: &str,
        interval: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = limit.clamp(1, MAX_KLINES_LIMIT).to_string();

        debug!(symbol = %symbol, interval = %interval, limit = %limit, "BinanceRestClient: fetching klines");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        parse_klines(&payload)
    }
}

/// Parse the klines payload: an array of arrays whose prices are strings.
pub fn parse_klines(payload: &Value) -> Result<Vec<Candle>, MarketDataError> {
    let rows = payload
        .as_array()
        .ok_or_else(|| MarketDataError::Parse("klines payload is not an array".to_string()))?;

    let mut candles = rows
        .iter()
        .enumerate()
        .map(|(i, row)| parse_kline_row(i, row))
        .collect::<Result<Vec<_>, _>>()?;

    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by_key(|c| c.timestamp);
    Ok(candles)
}

fn parse_kline_row(index: usize, row: &Value) -> Result<Candle, MarketDataError> {
    let fields = row
        .as_array()
        .filter(|f| f.len() >= 6)
        .ok_or_else(|| MarketDataError::Parse(format!("kline {index} is not an array of at least 6 fields")))?;

    let open_time = fields[0]
        .as_i64()
        .ok_or_else(|| MarketDataError::Parse(format!("kline {index} has no open time")))?;
    let timestamp = DateTime::<Utc>::from_timestamp_millis(open_time)
        .ok_or_else(|| MarketDataError::Parse(format!("kline {index} open time {open_time} out of range")))?;

    Ok(Candle::new(
        number(&fields[1], index, "open")?,
        number(&fields[2], index, "high")?,
        number(&fields[3], index, "low")?,
        number(&fields[4], index, "close")?,
        number(&fields[5], index, "volume")?,
        timestamp,
    ))
}

fn number(value: &Value, index: usize, field: &str) -> Result<f64, MarketDataError> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| MarketDataError::Parse(format!("kline {index} has invalid {field}: {value}")))
}
