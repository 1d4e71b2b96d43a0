use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a forecast relative to the current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Downtrend,
}

impl Trend {
    /// Uptrend only when the forecast is strictly above the current price.
    pub fn from_prices(current_price: f64, predicted_price: f64) -> Self {
        if predicted_price > current_price {
            Trend::Uptrend
        } else {
            Trend::Downtrend
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Uptrend => "Uptrend",
            Trend::Downtrend => "Downtrend",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Uptrend" => Some(Trend::Uptrend),
            "Downtrend" => Some(Trend::Downtrend),
            _ => None,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absolute percentage move from `current` to `predicted`.
pub fn change_pct(current_price: f64, predicted_price: f64) -> f64 {
    if current_price == 0.0 {
        return 0.0;
    }
    ((predicted_price - current_price) / current_price * 100.0).abs()
}

/// A forecast about to be appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPrediction {
    pub coin: String,
    pub timeframe: String,
    pub current_price: f64,
    pub predicted_price: f64,
    pub trend: Trend,
}

impl NewPrediction {
    pub fn new(
        coin: impl Into<String>,
        timeframe: impl Into<String>,
        current_price: f64,
        predicted_price: f64,
    ) -> Self {
        Self {
            coin: coin.into(),
            timeframe: timeframe.into(),
            current_price,
            predicted_price,
            trend: Trend::from_prices(current_price, predicted_price),
        }
    }
}

/// A stored forecast. Rows are never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub coin: String,
    pub timeframe: String,
    pub current_price: f64,
    pub predicted_price: f64,
    pub trend: Trend,
    pub created_at: DateTime<Utc>,
}
