//! Unit tests for Bollinger Bands

use pricecast::indicators::volatility::{
    calculate_bollinger_series, calculate_bollinger_series_default, BollingerBands,
};

#[test]
fn test_bollinger_warmup() {
    let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
    let bands = calculate_bollinger_series_default(&closes);
    assert!(bands[18].is_none());
    assert!(bands[19].is_some());
}

#[test]
fn test_bollinger_band_ordering() {
    let closes: Vec<f64> = (0..40)
        .map(|i| 100.0 + (i as f64 * 0.5).cos() * 3.0)
        .collect();
    for b in calculate_bollinger_series(&closes, 20, 2.0).into_iter().flatten() {
        assert!(b.upper >= b.middle);
        assert!(b.middle >= b.lower);
    }
}

#[test]
fn test_position_inside_band() {
    let bands = BollingerBands {
        upper: 110.0,
        middle: 100.0,
        lower: 90.0,
    };
    assert_eq!(bands.position(90.0), 0.0);
    assert_eq!(bands.position(100.0), 0.5);
    assert_eq!(bands.position(110.0), 1.0);
}

#[test]
fn test_position_degenerate_band_is_midpoint() {
    let closes = vec![7.0; 20];
    let bands = calculate_bollinger_series_default(&closes)[19].unwrap();
    assert_eq!(bands.position(7.0), 0.5);
}
