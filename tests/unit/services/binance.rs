//! Unit tests for kline parsing

use pricecast::services::binance::parse_klines;
use pricecast::services::MarketDataError;
use serde_json::json;

#[test]
fn test_parse_string_encoded_klines() {
    let payload = json!([
        [1_700_000_060_000i64, "101.0", "103.5", "100.0", "102.0", "12.5", 1_700_000_119_999i64, "0", 10, "0", "0", "0"],
        [1_700_000_000_000i64, "100.0", "102.0", "99.5", "101.0", "10.0", 1_700_000_059_999i64, "0", 10, "0", "0", "0"]
    ]);
    let candles = parse_klines(&payload).unwrap();
    assert_eq!(candles.len(), 2);
    // sorted oldest first
    assert_eq!(candles[0].close, 101.0);
    assert_eq!(candles[1].high, 103.5);
    assert_eq!(candles[1].volume, 12.5);
    assert_eq!(candles[0].timestamp.timestamp_millis(), 1_700_000_000_000);
}

#[test]
fn test_parse_dedups_by_open_time() {
    let row = json!([1_700_000_000_000i64, "1", "1", "1", "1", "1"]);
    let candles = parse_klines(&json!([row.clone(), row])).unwrap();
    assert_eq!(candles.len(), 1);
}

#[test]
fn test_parse_rejects_malformed_payloads() {
    assert!(matches!(parse_klines(&json!({"code": -1121})), Err(MarketDataError::Parse(_))));
    assert!(matches!(
        parse_klines(&json!([[1_700_000_000_000i64, "abc", "1", "1", "1", "1"]])),
        Err(MarketDataError::Parse(_))
    ));
    assert!(matches!(parse_klines(&json!([[1, "1"]])), Err(MarketDataError::Parse(_))));
}
