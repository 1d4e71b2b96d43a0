//! SMA (Simple Moving Average) indicator

use crate::common::math;

/// Calculate the rolling SMA series for a period
pub fn calculate_sma_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    math::rolling_mean(closes, period)
}
