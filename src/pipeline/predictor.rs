//! Prediction pipeline: fetch → features → dynamic scaling → window → model.

use super::model::{ModelError, SequenceModel};
use super::normalizer::fit_transform;
use super::registry::ModelRegistry;
use super::window::{last_window, window_ending_at, HISTORY_LOOKBACK, MIN_HISTORY, PREDICT_LOOKBACK, WINDOW};
use crate::features::{FeatureEngineer, FeatureTable};
use crate::models::{Candle, Timeframe, UnknownTimeframe};
use crate::services::market_data::{MarketDataError, MarketDataProvider};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Upper bound on points produced by one history request.
pub const MAX_HISTORY_LIMIT: usize = 500;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("coin '{0}' is not supported")]
    UnsupportedCoin(String),
    #[error(transparent)]
    UnsupportedTimeframe(#[from] UnknownTimeframe),
    #[error("data unavailable: {0}")]
    DataUnavailable(#[from] MarketDataError),
    #[error("model inference failed: {0}")]
    Model(#[from] ModelError),
}

impl PredictionError {
    /// Structurally invalid requests, as opposed to runtime failures.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            PredictionError::UnsupportedCoin(_) | PredictionError::UnsupportedTimeframe(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePrediction {
    pub current_price: f64,
    pub predicted_price: f64,
}

/// Per-point forecasts over recent history plus one future point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionHistory {
    pub times: Vec<DateTime<Utc>>,
    pub actual_prices: Vec<f64>,
    pub predicted_prices: Vec<f64>,
    pub current: f64,
    pub predicted: f64,
}

pub struct Predictor {
    provider: Arc<dyn MarketDataProvider>,
    registry: Arc<ModelRegistry>,
}

impl Predictor {
    pub fn new(provider: Arc<dyn MarketDataProvider>, registry: Arc<ModelRegistry>) -> Self {
        Self { provider, registry }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn provider(&self) -> &Arc<dyn MarketDataProvider> {
        &self.provider
    }

    /// Forecast the next close for `symbol`.
    ///
    /// With no model registered for the timeframe the last close is echoed
    /// back as the forecast.
    pub async fn predict(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<PricePrediction, PredictionError> {
        let candles = self.fetch(symbol, timeframe, WINDOW + PREDICT_LOOKBACK).await?;
        let table = engineer_checked(symbol, timeframe, &candles)?;
        let current_price = table.last().map(|r| r.close).unwrap_or_default();

        let Some(entry) = self.registry.get(timeframe).await else {
            debug!(
                symbol = %symbol,
                timeframe = %timeframe,
                "Predictor: no model for {}, echoing current price",
                timeframe
            );
            return Ok(PricePrediction {
                current_price,
                predicted_price: current_price,
            });
        };

        let model = entry.model.clone();
        let predicted_price = run_blocking(move || predict_last(model.as_ref(), &table)).await?;

        Ok(PricePrediction {
            current_price,
            predicted_price,
        })
    }

    /// Forecast every one of the last `history_limit` points from the window
    /// before it, then one point past the end of the series.
    ///
    /// Costs one model call per point; `history_limit` is clamped to
    /// `1..=MAX_HISTORY_LIMIT`.
    pub async fn predict_with_history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        history_limit: usize,
    ) -> Result<PredictionHistory, PredictionError> {
        let history_limit = history_limit.clamp(1, MAX_HISTORY_LIMIT);
        let candles = self
            .fetch(symbol, timeframe, history_limit + WINDOW + HISTORY_LOOKBACK)
            .await?;
        let table = engineer_checked(symbol, timeframe, &candles)?;

        let Some(entry) = self.registry.get(timeframe).await else {
            return Ok(echo_history(&table, history_limit));
        };

        let model = entry.model.clone();
        run_blocking(move || predict_history(model.as_ref(), &table, history_limit, timeframe)).await
    }

    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, PredictionError> {
        let candles = self.provider.get_candles(symbol, timeframe, limit).await?;
        if candles.len() < MIN_HISTORY {
            return Err(MarketDataError::InsufficientHistory {
                symbol: symbol.to_string(),
                interval: timeframe,
                got: candles.len(),
                required: MIN_HISTORY,
            }
            .into());
        }
        Ok(candles)
    }
}

fn engineer_checked(
    symbol: &str,
    timeframe: Timeframe,
    candles: &[Candle],
) -> Result<FeatureTable, PredictionError> {
    let table = FeatureEngineer::engineer(candles);
    if table.len() < WINDOW {
        return Err(MarketDataError::InsufficientHistory {
            symbol: symbol.to_string(),
            interval: timeframe,
            got: candles.len(),
            required: MIN_HISTORY,
        }
        .into());
    }
    Ok(table)
}

/// Run CPU-bound inference on the blocking pool.
async fn run_blocking<T, F>(task: F) -> Result<T, PredictionError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PredictionError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ModelError::Runtime(format!("inference task failed: {e}")))?
}

fn predict_last(model: &dyn SequenceModel, table: &FeatureTable) -> Result<f64, PredictionError> {
    let (scaler, scaled) = fit_transform(table.to_matrix().view());
    let window = last_window(&scaled).ok_or_else(short_table)?;
    let output = model.predict(window)?;
    Ok(scaler.inverse_close(output))
}

fn predict_history(
    model: &dyn SequenceModel,
    table: &FeatureTable,
    history_limit: usize,
    timeframe: Timeframe,
) -> Result<PredictionHistory, PredictionError> {
    let (scaler, scaled) = fit_transform(table.to_matrix().view());
    let rows = table.rows();
    let start = WINDOW.max(rows.len().saturating_sub(history_limit));

    let mut times = Vec::with_capacity(rows.len() - start + 1);
    let mut actual_prices = Vec::with_capacity(rows.len() - start + 1);
    let mut predicted_prices = Vec::with_capacity(rows.len() - start + 1);

    for (i, row) in rows.iter().enumerate().skip(start) {
        let window = window_ending_at(&scaled, i).ok_or_else(short_table)?;
        let output = model.predict(window)?;
        times.push(row.timestamp);
        actual_prices.push(row.close);
        predicted_prices.push(scaler.inverse_close(output));
    }

    let last = rows.last().ok_or_else(short_table)?;
    let window = last_window(&scaled).ok_or_else(short_table)?;
    let predicted = scaler.inverse_close(model.predict(window)?);

    times.push(last.timestamp + timeframe.duration());
    actual_prices.push(last.close);
    predicted_prices.push(predicted);

    Ok(PredictionHistory {
        times,
        actual_prices,
        predicted_prices,
        current: last.close,
        predicted,
    })
}

/// History view when no model is registered: actual prices double as forecasts.
fn echo_history(table: &FeatureTable, history_limit: usize) -> PredictionHistory {
    let rows = table.rows();
    let start = rows.len().saturating_sub(history_limit);
    let tail = &rows[start..];

    let actual_prices: Vec<f64> = tail.iter().map(|r| r.close).collect();
    let current = actual_prices.last().copied().unwrap_or_default();

    PredictionHistory {
        times: tail.iter().map(|r| r.timestamp).collect(),
        predicted_prices: actual_prices.clone(),
        actual_prices,
        current,
        predicted: current,
    }
}

fn short_table() -> PredictionError {
    ModelError::Runtime(format!("feature table shorter than window of {WINDOW}")).into()
}
