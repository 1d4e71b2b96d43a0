//! Prediction ledger over the in-memory store

use crate::test_utils::FailingStore;
use pricecast::db::{MemoryPredictionStore, PredictionLedger, PredictionQuery, PredictionStore};
use pricecast::metrics::Metrics;
use pricecast::models::{NewPrediction, Trend};
use std::sync::Arc;

async fn seeded_store() -> MemoryPredictionStore {
    let store = MemoryPredictionStore::new();
    let rows = [
        ("BTC", "1h", 100.0, 101.0),
        ("ETH", "1h", 50.0, 49.0),
        ("BTC", "5m", 100.0, 100.0),
        ("BTC", "1h", 102.0, 103.0),
    ];
    for (coin, timeframe, current, predicted) in rows {
        store
            .insert(&NewPrediction::new(coin, timeframe, current, predicted))
            .await
            .unwrap();
    }
    store
}

#[tokio::test]
async fn recent_is_newest_first_with_increasing_ids() {
    let store = seeded_store().await;
    let records = store.recent(&PredictionQuery::default()).await.unwrap();

    assert_eq!(records.len(), 4);
    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);
    assert_eq!(records[0].current_price, 102.0);
    assert_eq!(records[0].trend, Trend::Uptrend);
    // equal prices classify as a downtrend
    assert_eq!(records[1].trend, Trend::Downtrend);
}

#[tokio::test]
async fn recent_applies_filters_and_limit() {
    let store = seeded_store().await;

    let btc_hourly = store
        .recent(&PredictionQuery {
            coin: Some("BTC".to_string()),
            timeframe: Some("1h".to_string()),
            limit: 50,
        })
        .await
        .unwrap();
    assert_eq!(btc_hourly.len(), 2);
    assert!(btc_hourly.iter().all(|r| r.coin == "BTC" && r.timeframe == "1h"));

    let newest = store
        .recent(&PredictionQuery {
            limit: 1,
            ..PredictionQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(newest.len(), 1);
    assert_eq!(newest[0].id, 4);

    let eth = store
        .recent(&PredictionQuery {
            coin: Some("ETH".to_string()),
            ..PredictionQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(eth.len(), 1);
    assert_eq!(eth[0].trend, Trend::Downtrend);
}

#[tokio::test]
async fn ledger_save_reports_outcome() {
    let store = Arc::new(MemoryPredictionStore::new());
    let metrics = Arc::new(Metrics::new().unwrap());

    let ledger = PredictionLedger::new(store.clone(), Some(metrics.clone()));
    assert!(ledger.save("BTC", "4h", 10.0, 12.0, Trend::Uptrend).await);
    assert_eq!(store.len().await, 1);
    assert_eq!(store.all().await[0].timeframe, "4h");

    let broken = PredictionLedger::new(Arc::new(FailingStore), Some(metrics.clone()));
    assert!(!broken.save("BTC", "4h", 10.0, 12.0, Trend::Uptrend).await);
    assert!(!broken.save("ETH", "1h", 10.0, 9.0, Trend::Downtrend).await);
    assert_eq!(metrics.store_failures_total.get(), 2);
}
