//! Shared dependencies handed to every sweep

use crate::db::PredictionLedger;
use crate::metrics::Metrics;
use crate::models::CoinUniverse;
use crate::pipeline::Predictor;
use std::sync::Arc;

pub struct JobContext {
    pub predictor: Arc<Predictor>,
    pub ledger: PredictionLedger,
    pub coins: CoinUniverse,
    pub metrics: Option<Arc<Metrics>>,
}

impl JobContext {
    pub fn new(
        predictor: Arc<Predictor>,
        ledger: PredictionLedger,
        coins: CoinUniverse,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            predictor,
            ledger,
            coins,
            metrics,
        }
    }
}
