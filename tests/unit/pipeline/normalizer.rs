//! Unit tests for the per-call min-max scaler

use ndarray::{array, Array2};
use pricecast::pipeline::normalizer::{fit_transform, MinMaxScaler};

#[test]
fn test_scaled_values_in_unit_range() {
    let data = array![[10.0, 1.0], [20.0, 3.0], [15.0, 2.0]];
    let (_, scaled) = fit_transform(data.view());
    assert!(scaled.iter().all(|v| (0.0..=1.0).contains(v)));
    assert_eq!(scaled[[0, 0]], 0.0);
    assert_eq!(scaled[[1, 0]], 1.0);
    assert_eq!(scaled[[2, 0]], 0.5);
}

#[test]
fn test_round_trip_reconstructs_input() {
    let data = Array2::from_shape_fn((30, 15), |(i, j)| {
        if j == 3 {
            42.0
        } else {
            (i as f64 * 1.7 + j as f64 * 13.0).sin() * 1000.0 + 30_000.0
        }
    });
    let (scaler, scaled) = fit_transform(data.view());
    let restored = scaler.inverse_transform(scaled.view());
    for (a, b) in data.iter().zip(restored.iter()) {
        assert!((a - b).abs() < 1e-6, "{a} vs {b}");
    }
}

#[test]
fn test_constant_column_scales_to_zero() {
    let data = array![[5.0, 1.0], [5.0, 2.0]];
    let (scaler, scaled) = fit_transform(data.view());
    assert_eq!(scaled[[0, 0]], 0.0);
    assert_eq!(scaled[[1, 0]], 0.0);
    assert_eq!(scaler.inverse_transform_row(&[0.0, 0.0])[0], 5.0);
}

#[test]
fn test_inverse_close_uses_close_column_only() {
    let data = array![[100.0, 7.0, 1.0], [200.0, 9.0, 4.0]];
    let scaler = MinMaxScaler::fit(data.view());
    assert_eq!(scaler.width(), 3);
    assert!((scaler.inverse_close(0.25) - 125.0).abs() < 1e-12);
    assert!((scaler.inverse_close(1.1) - 210.0).abs() < 1e-9);
}
