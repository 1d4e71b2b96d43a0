//! Process-local prediction ledger, used when no database is configured

use super::{PredictionQuery, PredictionStore, StoreError};
use crate::models::{NewPrediction, PredictionRecord};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryPredictionStore {
    records: RwLock<Vec<PredictionRecord>>,
}

impl MemoryPredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Every record, oldest first.
    pub async fn all(&self) -> Vec<PredictionRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl PredictionStore for MemoryPredictionStore {
    async fn insert(&self, prediction: &NewPrediction) -> Result<PredictionRecord, StoreError> {
        let mut records = self.records.write().await;
        let record = PredictionRecord {
            id: records.len() as i64 + 1,
            coin: prediction.coin.clone(),
            timeframe: prediction.timeframe.clone(),
            current_price: prediction.current_price,
            predicted_price: prediction.predicted_price,
            trend: prediction.trend,
            created_at: Utc::now(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn recent(&self, query: &PredictionQuery) -> Result<Vec<PredictionRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|r| query.coin.as_deref().map_or(true, |c| r.coin == c))
            .filter(|r| query.timeframe.as_deref().map_or(true, |t| r.timeframe == t))
            .take(query.limit)
            .cloned()
            .collect())
    }
}
