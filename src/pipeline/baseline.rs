//! Naive "previous close" baseline, for comparing against model error.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaselineMetrics {
    pub mae: f64,
    pub rmse: f64,
}

/// Error of forecasting each close with the one before it.
///
/// Returns `None` for fewer than two closes.
pub fn naive_baseline(closes: &[f64]) -> Option<BaselineMetrics> {
    if closes.len() < 2 {
        return None;
    }

    let errors: Vec<f64> = closes.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let n = errors.len() as f64;
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();

    Some(BaselineMetrics { mae, rmse })
}
