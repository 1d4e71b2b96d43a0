//! Per-call min-max scaling.
//!
//! A scaler is fitted on exactly the slice handed to it and dropped with the
//! call, which lets one model serve symbols of very different price levels.

use crate::features::CLOSE_COLUMN;
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Min-max scaler onto [0, 1], fitted column by column.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    data_min: Array1<f64>,
    /// Column range with zero ranges replaced by 1
    scale: Array1<f64>,
}

impl MinMaxScaler {
    /// Fit on a `rows × columns` slice.
    ///
    /// A constant column keeps a unit range so it scales to 0 instead of
    /// dividing by zero.
    pub fn fit(data: ArrayView2<'_, f64>) -> Self {
        let columns = data.ncols();
        let mut data_min = Array1::<f64>::zeros(columns);
        let mut scale = Array1::<f64>::ones(columns);

        for (j, column) in data.axis_iter(Axis(1)).enumerate() {
            let min = column.iter().copied().fold(f64::INFINITY, f64::min);
            let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if !min.is_finite() || !max.is_finite() {
                continue;
            }
            data_min[j] = min;
            let range = max - min;
            scale[j] = if range == 0.0 { 1.0 } else { range };
        }

        Self { data_min, scale }
    }

    pub fn width(&self) -> usize {
        self.data_min.len()
    }

    pub fn transform(&self, data: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut scaled = data.to_owned();
        for mut row in scaled.axis_iter_mut(Axis(0)) {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (*value - self.data_min[j]) / self.scale[j];
            }
        }
        scaled
    }

    /// Map one scaled row back to feature space.
    pub fn inverse_transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, value)| value * self.scale[j] + self.data_min[j])
            .collect()
    }

    pub fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut restored = data.to_owned();
        for mut row in restored.axis_iter_mut(Axis(0)) {
            for (j, value) in row.iter_mut().enumerate() {
                *value = *value * self.scale[j] + self.data_min[j];
            }
        }
        restored
    }

    /// Price-space close for a scaled model output.
    ///
    /// The output is embedded in an otherwise zero row of feature width and
    /// inverse-transformed, so only the close column's fit matters.
    pub fn inverse_close(&self, scaled_close: f64) -> f64 {
        let mut row = vec![0.0; self.width()];
        match row.get_mut(CLOSE_COLUMN) {
            Some(close) => *close = scaled_close,
            None => return scaled_close,
        }
        self.inverse_transform_row(&row)[CLOSE_COLUMN]
    }
}

/// Fit on `data` and return both the scaler and the scaled copy.
pub fn fit_transform(data: ArrayView2<'_, f64>) -> (MinMaxScaler, Array2<f64>) {
    let scaler = MinMaxScaler::fit(data);
    let scaled = scaler.transform(data);
    (scaler, scaled)
}
