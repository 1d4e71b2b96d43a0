//! Unit tests for the in-memory provider and error classification

use chrono::{TimeZone, Utc};
use pricecast::models::{Candle, Timeframe};
use pricecast::services::{InMemoryMarketDataProvider, MarketDataError, MarketDataProvider};
use tokio_test::{assert_err, assert_ok, block_on};

fn candle(hour: u32, close: f64) -> Candle {
    Candle::new(
        close,
        close,
        close,
        close,
        1.0,
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
    )
}

#[test]
fn test_in_memory_provider_returns_newest_slice_oldest_first() {
    let provider = InMemoryMarketDataProvider::new();
    block_on(provider.insert(
        "BTCUSDT",
        Timeframe::OneHour,
        vec![candle(2, 3.0), candle(0, 1.0), candle(1, 2.0), candle(1, 2.0)],
    ));

    let candles = assert_ok!(block_on(provider.get_candles("BTCUSDT", Timeframe::OneHour, 2)));
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    assert_eq!(closes, vec![2.0, 3.0]);

    let all = assert_ok!(block_on(provider.get_candles("BTCUSDT", Timeframe::OneHour, 100)));
    assert_eq!(all.len(), 3);
}

#[test]
fn test_in_memory_provider_unknown_and_failing_symbols() {
    let provider = InMemoryMarketDataProvider::new();
    block_on(provider.insert("ETHUSDT", Timeframe::FiveMinutes, vec![candle(0, 1.0)]));

    let err = assert_err!(block_on(provider.get_candles("ETHUSDT", Timeframe::OneHour, 10)));
    assert!(matches!(err, MarketDataError::Unavailable(_)));

    block_on(provider.fail_symbol("ETHUSDT"));
    let err = assert_err!(block_on(provider.get_candles("ETHUSDT", Timeframe::FiveMinutes, 10)));
    assert!(err.to_string().contains("ETHUSDT"));
}

#[test]
fn test_transient_errors() {
    let server = MarketDataError::Status {
        status: 502,
        body: String::new(),
    };
    let throttled = MarketDataError::Status {
        status: 429,
        body: String::new(),
    };
    let rejected = MarketDataError::Status {
        status: 400,
        body: String::new(),
    };
    assert!(server.is_transient());
    assert!(throttled.is_transient());
    assert!(!rejected.is_transient());
    assert!(!MarketDataError::Parse("bad".to_string()).is_transient());
}
