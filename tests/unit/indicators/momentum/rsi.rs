//! Unit tests for RSI

use pricecast::indicators::momentum::{calculate_rsi_series, calculate_rsi_series_default};

#[test]
fn test_rsi_undefined_during_warmup() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let rsi = calculate_rsi_series_default(&closes);
    assert_eq!(rsi.len(), closes.len());
    assert!(rsi[..14].iter().all(Option::is_none));
    assert!(rsi[14].is_some());
}

#[test]
fn test_rsi_only_gains_is_100() {
    let closes: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
    let rsi = calculate_rsi_series(&closes, 14);
    assert_eq!(rsi[19], Some(100.0));
}

#[test]
fn test_rsi_flat_series_is_neutral() {
    let closes = vec![50.0; 20];
    let rsi = calculate_rsi_series(&closes, 14);
    assert_eq!(rsi[19], Some(50.0));
}

#[test]
fn test_rsi_bounded() {
    let closes: Vec<f64> = (0..60)
        .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
        .collect();
    for value in calculate_rsi_series_default(&closes).into_iter().flatten() {
        assert!((0.0..=100.0).contains(&value));
    }
}
