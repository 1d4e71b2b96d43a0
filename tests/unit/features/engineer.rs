//! Unit tests for feature engineering

use chrono::{Duration, TimeZone, Utc};
use pricecast::features::{
    schema_mismatch, schema_tag, FeatureEngineer, FEATURE_COLUMNS, FEATURE_COUNT,
};
use pricecast::models::Candle;

fn create_test_candles(count: usize) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let price = 100.0 + (i as f64 * 0.3).sin() * 4.0 + i as f64 * 0.2;
            Candle::new(
                price - 0.2,
                price + 0.5,
                price - 0.6,
                price,
                1000.0 + (i % 7) as f64 * 25.0,
                start + Duration::hours(i as i64),
            )
        })
        .collect()
}

#[test]
fn test_feature_table_has_fifteen_columns() {
    let table = FeatureEngineer::engineer(&create_test_candles(120));
    let matrix = table.to_matrix();
    assert_eq!(FEATURE_COUNT, 15);
    assert_eq!(matrix.ncols(), 15);
    assert_eq!(matrix.nrows(), table.len());
}

#[test]
fn test_final_row_fully_defined() {
    let table = FeatureEngineer::engineer(&create_test_candles(66));
    let last = table.last().expect("rows after warm-up");
    assert!(last.to_array().iter().all(|v| v.is_finite()));
    assert!(table.to_matrix().iter().all(|v| v.is_finite()));
}

#[test]
fn test_warmup_rows_dropped() {
    let candles = create_test_candles(100);
    let table = FeatureEngineer::engineer(&candles);
    // MA 20 and Bollinger 20 are the first to be defined, at index 19
    assert_eq!(table.len(), 81);
    assert_eq!(table.rows()[0].timestamp, candles[19].timestamp);
    assert_eq!(table.last().unwrap().timestamp, candles[99].timestamp);
}

#[test]
fn test_short_input_yields_empty_table() {
    let table = FeatureEngineer::engineer(&create_test_candles(10));
    assert!(table.is_empty());
}

#[test]
fn test_column_order_is_close_first() {
    let table = FeatureEngineer::engineer(&create_test_candles(40));
    let row = table.rows()[0];
    let values = row.to_array();
    assert_eq!(FEATURE_COLUMNS[0], "close");
    assert_eq!(values[0], row.close);
    assert_eq!(FEATURE_COLUMNS[14], "price_position");
    assert_eq!(values[14], row.price_position);
}

#[test]
fn test_schema_tag_lists_columns_in_order() {
    let tag = schema_tag();
    let columns: Vec<&str> = tag.split(',').collect();
    assert_eq!(columns.len(), FEATURE_COUNT);
    assert_eq!(columns, FEATURE_COLUMNS.to_vec());
}

#[test]
fn test_flat_candle_price_position_is_midpoint() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let candles: Vec<Candle> = (0..30)
        .map(|i| Candle::new(50.0, 50.0, 50.0, 50.0, 10.0, start + Duration::minutes(5 * i)))
        .collect();
    let table = FeatureEngineer::engineer(&candles);
    let last = table.last().unwrap();
    assert_eq!(last.price_position, 0.5);
    assert_eq!(last.bb_position, 0.5);
    assert_eq!(last.volatility, 0.0);
    assert_eq!(last.rsi, 50.0);
}

#[test]
fn test_schema_mismatch_detection() {
    let live: Vec<String> = FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
    assert!(schema_mismatch(&live).is_none());

    let mut swapped = live.clone();
    swapped.swap(1, 2);
    let mismatch = schema_mismatch(&swapped).unwrap();
    assert_eq!(mismatch.position, 1);
    assert_eq!(mismatch.expected, "open");
    assert_eq!(mismatch.found, "high");

    assert!(schema_mismatch(&live[..14]).is_some());
}
