//! MACD (Moving Average Convergence Divergence) line

use crate::indicators::trend::calculate_ema_series;

pub const DEFAULT_FAST_SPAN: usize = 12;
pub const DEFAULT_SLOW_SPAN: usize = 26;

/// Calculate the MACD line series
///
/// MACD = EMA(fast) - EMA(slow), both seeded with the first close, so the line
/// is defined for every input value.
pub fn calculate_macd_series(closes: &[f64], fast_span: usize, slow_span: usize) -> Vec<f64> {
    let fast = calculate_ema_series(closes, fast_span);
    let slow = calculate_ema_series(closes, slow_span);
    fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect()
}

/// Calculate MACD with default spans (12, 26)
pub fn calculate_macd_series_default(closes: &[f64]) -> Vec<f64> {
    calculate_macd_series(closes, DEFAULT_FAST_SPAN, DEFAULT_SLOW_SPAN)
}
