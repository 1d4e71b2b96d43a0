//! Fixed-length windows over scaled feature rows.

use crate::features::{MACD_WARMUP, ROLLING_WARMUP};
use ndarray::{s, Array2, ArrayView2};

/// Feature rows fed to the model per prediction.
pub const WINDOW: usize = 20;

/// Candle history callers should request before the first full window.
pub const MIN_HISTORY: usize = MACD_WARMUP + ROLLING_WARMUP + WINDOW;

/// Extra candles fetched on top of `WINDOW` for a single prediction.
pub const PREDICT_LOOKBACK: usize = 100;

/// Extra candles fetched on top of `history_limit + WINDOW` for the history view.
pub const HISTORY_LOOKBACK: usize = 50;

/// The last `WINDOW` rows, or `None` when fewer rows exist.
pub fn last_window(scaled: &Array2<f64>) -> Option<ArrayView2<'_, f64>> {
    window_ending_at(scaled, scaled.nrows())
}

/// The `WINDOW` rows strictly before `end`.
pub fn window_ending_at(scaled: &Array2<f64>, end: usize) -> Option<ArrayView2<'_, f64>> {
    if end < WINDOW || end > scaled.nrows() {
        return None;
    }
    Some(scaled.slice(s![end - WINDOW..end, ..]))
}

/// Flatten a window row-major into `f32`s for runtimes that take raw buffers.
pub fn flatten_f32(window: ArrayView2<'_, f64>) -> Vec<f32> {
    window.iter().map(|v| *v as f32).collect()
}
