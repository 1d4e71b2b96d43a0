//! RSI (Relative Strength Index) indicator

use crate::common::math;

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Calculate the RSI series over closing prices
///
/// RSI = 100 - (100 / (1 + RS))
/// RS = rolling mean of gains / rolling mean of losses over `period` deltas
///
/// Zero average loss reads as 100 when there were gains and as a neutral 50
/// when price did not move at all.
pub fn calculate_rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let deltas = math::diff(closes);
    let mut rsi = vec![None; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return rsi;
    }

    for i in period..closes.len() {
        let window = &deltas[i + 1 - period..=i];
        let mut gain_sum = 0.0;
        let mut loss_sum = 0.0;
        for delta in window.iter().flatten() {
            if *delta > 0.0 {
                gain_sum += delta;
            } else {
                loss_sum += delta.abs();
            }
        }
        let avg_gain = gain_sum / period as f64;
        let avg_loss = loss_sum / period as f64;
        rsi[i] = Some(rsi_from_averages(avg_gain, avg_loss));
    }
    rsi
}

/// Calculate RSI series with default period (14)
pub fn calculate_rsi_series_default(closes: &[f64]) -> Vec<Option<f64>> {
    calculate_rsi_series(closes, DEFAULT_RSI_PERIOD)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { 100.0 } else { 50.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
