//! Unit tests for the shared data models

use chrono::Duration;
use pricecast::models::prediction::change_pct;
use pricecast::models::{CoinUniverse, NewPrediction, Timeframe, Trend};

#[test]
fn test_timeframe_parse_and_display() {
    assert_eq!("5m".parse::<Timeframe>().unwrap(), Timeframe::FiveMinutes);
    assert_eq!("1h".parse::<Timeframe>().unwrap(), Timeframe::OneHour);
    assert_eq!("4h".parse::<Timeframe>().unwrap(), Timeframe::FourHours);
    assert_eq!(Timeframe::FourHours.to_string(), "4h");
    assert!("15m".parse::<Timeframe>().is_err());
}

#[test]
fn test_timeframe_durations() {
    assert_eq!(Timeframe::FiveMinutes.duration(), Duration::minutes(5));
    assert_eq!(Timeframe::OneHour.duration(), Duration::minutes(60));
    assert_eq!(Timeframe::FourHours.duration(), Duration::minutes(240));
}

#[test]
fn test_trend_is_uptrend_only_when_strictly_greater() {
    assert_eq!(Trend::from_prices(100.0, 100.5), Trend::Uptrend);
    assert_eq!(Trend::from_prices(100.0, 99.5), Trend::Downtrend);
    assert_eq!(Trend::from_prices(100.0, 100.0), Trend::Downtrend);
    assert_eq!(Trend::parse("Uptrend"), Some(Trend::Uptrend));
    assert_eq!(Trend::parse("sideways"), None);
}

#[test]
fn test_new_prediction_derives_trend() {
    let prediction = NewPrediction::new("BTC", "1h", 60_000.0, 61_000.0);
    assert_eq!(prediction.trend, Trend::Uptrend);
    assert!((change_pct(60_000.0, 61_000.0) - 1.6666666).abs() < 1e-6);
    assert!((change_pct(100.0, 90.0) - 10.0).abs() < 1e-12);
}

#[test]
fn test_default_coin_universe() {
    let coins = CoinUniverse::default();
    assert_eq!(coins.codes(), vec!["BTC", "ETH"]);
    assert_eq!(coins.by_code("eth").unwrap().symbol, "ETHUSDT");
    assert!(coins.by_code("DOGE").is_none());
}
