//! Append-only prediction ledger

pub mod memory;
pub mod postgres;

pub use memory::MemoryPredictionStore;
pub use postgres::PostgresPredictionStore;

use crate::metrics::Metrics;
use crate::models::{NewPrediction, PredictionRecord, Trend};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] tokio_postgres::Error),
    #[error("database query failed: {0}")]
    Query(#[from] tokio_postgres::Error),
    #[error("invalid prediction row: {0}")]
    InvalidRow(String),
}

/// Filter for reading back recent forecasts, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionQuery {
    pub coin: Option<String>,
    pub timeframe: Option<String>,
    pub limit: usize,
}

impl Default for PredictionQuery {
    fn default() -> Self {
        Self {
            coin: None,
            timeframe: None,
            limit: 50,
        }
    }
}

/// Storage backend for forecasts. Rows are only ever appended.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn insert(&self, prediction: &NewPrediction) -> Result<PredictionRecord, StoreError>;

    async fn recent(&self, query: &PredictionQuery) -> Result<Vec<PredictionRecord>, StoreError>;
}

/// Write side used by the sweeps: failures are logged and counted, never
/// returned, so one bad write cannot stop a batch.
#[derive(Clone)]
pub struct PredictionLedger {
    store: Arc<dyn PredictionStore>,
    metrics: Option<Arc<Metrics>>,
}

impl PredictionLedger {
    pub fn new(store: Arc<dyn PredictionStore>, metrics: Option<Arc<Metrics>>) -> Self {
        Self { store, metrics }
    }

    pub fn store(&self) -> &Arc<dyn PredictionStore> {
        &self.store
    }

    /// Append one forecast. Returns whether the row was written.
    pub async fn save(
        &self,
        coin: &str,
        timeframe: &str,
        current_price: f64,
        predicted_price: f64,
        trend: Trend,
    ) -> bool {
        let prediction = NewPrediction {
            coin: coin.to_string(),
            timeframe: timeframe.to_string(),
            current_price,
            predicted_price,
            trend,
        };

        match self.store.insert(&prediction).await {
            Ok(record) => {
                debug!(
                    id = record.id,
                    coin = %coin,
                    timeframe = %timeframe,
                    "PredictionLedger: saved prediction for {} {}",
                    coin,
                    timeframe
                );
                true
            }
            Err(e) => {
                error!(
                    coin = %coin,
                    timeframe = %timeframe,
                    error = %e,
                    "PredictionLedger: failed to save prediction for {} {}",
                    coin,
                    timeframe
                );
                if let Some(ref metrics) = self.metrics {
                    metrics.store_failures_total.inc();
                }
                false
            }
        }
    }

    pub async fn recent(&self, query: &PredictionQuery) -> Result<Vec<PredictionRecord>, StoreError> {
        self.store.recent(query).await
    }
}
