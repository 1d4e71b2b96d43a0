//! EMA (Exponential Moving Average) indicator

use crate::common::math;

/// Calculate the EMA series for a span
pub fn calculate_ema_series(closes: &[f64], span: usize) -> Vec<f64> {
    math::ema_series(closes, span)
}
