//! Candle → feature table transformation.

use crate::features::schema::FEATURE_COUNT;
use crate::indicators::momentum::{calculate_macd_series_default, calculate_rsi_series_default};
use crate::indicators::trend::calculate_sma_series;
use crate::indicators::volatility::calculate_bollinger_series_default;
use crate::common::math;
use crate::models::Candle;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Candles the slow EMA needs before MACD settles.
pub const MACD_WARMUP: usize = 26;
/// Longest rolling window (MA 20 / Bollinger 20).
pub const ROLLING_WARMUP: usize = 20;

/// One engineered row, fields in `FEATURE_COLUMNS` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub price_change: f64,
    pub volatility: f64,
    pub ma_5: f64,
    pub ma_10: f64,
    pub ma_20: f64,
    pub macd: f64,
    pub rsi: f64,
    pub bb_position: f64,
    pub volume_change: f64,
    pub price_position: f64,
}

impl FeatureRow {
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.close,
            self.open,
            self.high,
            self.low,
            self.volume,
            self.price_change,
            self.volatility,
            self.ma_5,
            self.ma_10,
            self.ma_20,
            self.macd,
            self.rsi,
            self.bb_position,
            self.volume_change,
            self.price_position,
        ]
    }
}

/// Engineered features for a candle sequence, oldest row first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }

    /// Row-major `len × 15` matrix of the feature values.
    pub fn to_matrix(&self) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((self.rows.len(), FEATURE_COUNT));
        for (i, row) in self.rows.iter().enumerate() {
            for (j, value) in row.to_array().into_iter().enumerate() {
                matrix[[i, j]] = value;
            }
        }
        matrix
    }
}

pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Engineer the 15-column feature table.
    ///
    /// Leading candles whose indicators are still warming up are dropped, so a
    /// short input yields an empty table rather than an error.
    pub fn engineer(candles: &[Candle]) -> FeatureTable {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        let price_change = math::pct_change(&closes);
        let volume_change = math::pct_change(&volumes);
        let ma_5 = calculate_sma_series(&closes, 5);
        let ma_10 = calculate_sma_series(&closes, 10);
        let ma_20 = calculate_sma_series(&closes, 20);
        let macd = calculate_macd_series_default(&closes);
        let rsi = calculate_rsi_series_default(&closes);
        let bands = calculate_bollinger_series_default(&closes);

        let mut rows = Vec::with_capacity(candles.len().saturating_sub(ROLLING_WARMUP - 1));
        for (i, candle) in candles.iter().enumerate() {
            let (
                Some(price_change),
                Some(volume_change),
                Some(ma_5),
                Some(ma_10),
                Some(ma_20),
                Some(rsi),
                Some(bands),
            ) = (
                price_change[i],
                volume_change[i],
                ma_5[i],
                ma_10[i],
                ma_20[i],
                rsi[i],
                bands[i],
            )
            else {
                continue;
            };

            rows.push(FeatureRow {
                timestamp: candle.timestamp,
                close: candle.close,
                open: candle.open,
                high: candle.high,
                low: candle.low,
                volume: candle.volume,
                price_change,
                volatility: volatility(candle),
                ma_5,
                ma_10,
                ma_20,
                macd: macd[i],
                rsi,
                bb_position: bands.position(candle.close),
                volume_change,
                price_position: price_position(candle),
            });
        }

        FeatureTable { rows }
    }
}

/// Candle range as a percentage of the close.
fn volatility(candle: &Candle) -> f64 {
    if candle.close == 0.0 {
        return 0.0;
    }
    (candle.high - candle.low) / candle.close * 100.0
}

/// Close position inside the candle range; a flat candle sits at 0.5.
fn price_position(candle: &Candle) -> f64 {
    let range = candle.high - candle.low;
    if range == 0.0 {
        return 0.5;
    }
    (candle.close - candle.low) / range
}
