//! Bollinger Bands indicator

use crate::common::math;

pub const DEFAULT_BB_PERIOD: usize = 20;
pub const DEFAULT_BB_STD_DEV: f64 = 2.0;

/// Band values for one candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Where `price` sits between the bands: 0 at the lower band, 1 at the
    /// upper band. Can leave [0, 1]. Collapsed bands read as the midpoint.
    pub fn position(&self, price: f64) -> f64 {
        let width = self.upper - self.lower;
        if width > 0.0 {
            (price - self.lower) / width
        } else {
            0.5
        }
    }
}

/// Calculate the Bollinger Bands series
///
/// Middle Band = SMA(period)
/// Upper Band = Middle + (std_dev * sample standard deviation)
/// Lower Band = Middle - (std_dev * sample standard deviation)
pub fn calculate_bollinger_series(
    closes: &[f64],
    period: usize,
    std_dev: f64,
) -> Vec<Option<BollingerBands>> {
    let middle = math::rolling_mean(closes, period);
    let std = math::rolling_std(closes, period);

    middle
        .iter()
        .zip(std.iter())
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(BollingerBands {
                upper: m + std_dev * s,
                middle: *m,
                lower: m - std_dev * s,
            }),
            _ => None,
        })
        .collect()
}

/// Calculate Bollinger Bands with default parameters (20 SMA, 2σ)
pub fn calculate_bollinger_series_default(closes: &[f64]) -> Vec<Option<BollingerBands>> {
    calculate_bollinger_series(closes, DEFAULT_BB_PERIOD, DEFAULT_BB_STD_DEV)
}
