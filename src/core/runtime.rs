//! Composition root: wires market data, models, ledger and scheduler

use super::listener::LoggingJobListener;
use super::scheduler::{boxed_action, PredictionScheduler, ScheduledJob, SchedulerStatus};
use crate::config::{AppConfig, ConfigError};
use crate::db::{
    MemoryPredictionStore, PostgresPredictionStore, PredictionLedger, PredictionQuery,
    PredictionStore, StoreError,
};
use crate::jobs::{default_jobs, run_all_predictions, run_scope, JobContext, JobError};
use crate::metrics::Metrics;
use crate::models::{Candle, Coin, PredictionRecord, Timeframe};
use crate::pipeline::baseline::{naive_baseline, BaselineMetrics};
use crate::pipeline::registry::RegisteredModelInfo;
use crate::pipeline::{
    ModelError, ModelRegistry, PredictionError, PredictionHistory, PricePrediction, Predictor,
    ReloadOutcome,
};
use crate::services::binance::BinanceRestClient;
use crate::services::market_data::{MarketDataError, MarketDataProvider};
use crate::services::BinanceMarketDataProvider;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Candles pulled for the naive baseline.
pub const BACKTEST_LOOKBACK: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ServiceError {
    pub fn is_bad_request(&self) -> bool {
        matches!(self, ServiceError::Prediction(e) if e.is_bad_request())
    }
}

/// Recent closes for one coin, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct PriceHistory {
    pub coin: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub candles: Vec<Candle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub coin: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub samples: usize,
    #[serde(flatten)]
    pub metrics: BaselineMetrics,
}

pub struct PredictionService {
    context: Arc<JobContext>,
    scheduler: PredictionScheduler,
    metrics: Arc<Metrics>,
}

impl PredictionService {
    /// Build the production graph: Binance klines, models from disk, and a
    /// Postgres ledger when `DATABASE_URL` is set.
    pub async fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let metrics = Arc::new(Metrics::new()?);

        let client = BinanceRestClient::new(&config.binance_base_url, config.market_data_timeout)?;
        let provider: Arc<dyn MarketDataProvider> = Arc::new(
            BinanceMarketDataProvider::new(client).with_max_retries(config.market_data_max_retries),
        );

        let registry = Arc::new(ModelRegistry::new(&config.models_dir));
        let loaded = registry.load_all().await;
        metrics.models_loaded.set(loaded as i64);

        let store: Arc<dyn PredictionStore> = match config.database_url {
            Some(ref url) => Arc::new(PostgresPredictionStore::connect(url).await?),
            None => {
                info!("PredictionService: DATABASE_URL not set, keeping predictions in memory");
                Arc::new(MemoryPredictionStore::new())
            }
        };

        let predictor = Arc::new(Predictor::new(provider, registry));
        let ledger = PredictionLedger::new(store, Some(metrics.clone()));
        let context = Arc::new(JobContext::new(
            predictor,
            ledger,
            config.coins.clone(),
            Some(metrics.clone()),
        ));

        Ok(Self::new(context, metrics, config.misfire_grace)?)
    }

    /// Register the standing jobs against `context`. Nothing runs until `start`.
    pub fn new(
        context: Arc<JobContext>,
        metrics: Arc<Metrics>,
        misfire_grace: Duration,
    ) -> Result<Self, JobError> {
        let mut builder = PredictionScheduler::builder()
            .misfire_grace(misfire_grace)
            .listener(Arc::new(LoggingJobListener::new(Some(metrics.clone()))));

        for job in default_jobs()? {
            let ctx = context.clone();
            let scope = job.scope;
            builder = builder.job(ScheduledJob::new(job.id, job.name, job.trigger, move || {
                let ctx = ctx.clone();
                async move { Ok(run_scope(&ctx, scope).await) }
            }));
        }

        let ctx = context.clone();
        builder = builder.startup(boxed_action(move || {
            let ctx = ctx.clone();
            async move { Ok(run_all_predictions(&ctx).await) }
        }));

        Ok(Self {
            context,
            scheduler: builder.build(),
            metrics,
        })
    }

    pub fn context(&self) -> &Arc<JobContext> {
        &self.context
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn scheduler(&self) -> &PredictionScheduler {
        &self.scheduler
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        self.context.predictor.registry()
    }

    pub fn coins(&self) -> Vec<String> {
        self.context.coins.codes()
    }

    pub async fn start(&self) {
        self.scheduler.start().await;
        if self.scheduler.is_running().await {
            self.metrics.scheduler_running.set(1);
        }
    }

    pub async fn stop(&self) {
        self.scheduler.stop().await;
        self.metrics.scheduler_running.set(0);
    }

    /// Accepts a coin code (`BTC`) or exchange symbol (`BTCUSDT`).
    pub fn resolve_coin(&self, coin: &str) -> Result<Coin, PredictionError> {
        self.context
            .coins
            .by_code(coin)
            .or_else(|| self.context.coins.by_symbol(coin))
            .cloned()
            .ok_or_else(|| PredictionError::UnsupportedCoin(coin.to_string()))
    }

    pub async fn run_prediction(
        &self,
        coin: &str,
        timeframe: &str,
    ) -> Result<PricePrediction, PredictionError> {
        let coin = self.resolve_coin(coin)?;
        let timeframe = Timeframe::from_str(timeframe)?;
        self.context.predictor.predict(&coin.symbol, timeframe).await
    }

    pub async fn run_prediction_with_history(
        &self,
        coin: &str,
        timeframe: &str,
        history_limit: usize,
    ) -> Result<PredictionHistory, PredictionError> {
        let coin = self.resolve_coin(coin)?;
        let timeframe = Timeframe::from_str(timeframe)?;
        self.context
            .predictor
            .predict_with_history(&coin.symbol, timeframe, history_limit)
            .await
    }

    pub async fn price_history(
        &self,
        coin: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<PriceHistory, PredictionError> {
        let coin = self.resolve_coin(coin)?;
        let timeframe = Timeframe::from_str(timeframe)?;
        let candles = self
            .context
            .predictor
            .provider()
            .get_candles(&coin.symbol, timeframe, limit.max(1))
            .await?;
        Ok(PriceHistory {
            coin: coin.code,
            symbol: coin.symbol,
            timeframe,
            candles,
        })
    }

    /// MAE/RMSE of the "previous close" forecaster over recent candles.
    pub async fn backtest(&self, coin: &str, timeframe: &str) -> Result<BacktestReport, PredictionError> {
        let history = self.price_history(coin, timeframe, BACKTEST_LOOKBACK).await?;
        let closes: Vec<f64> = history.candles.iter().map(|c| c.close).collect();
        let metrics = naive_baseline(&closes).ok_or_else(|| {
            MarketDataError::InsufficientHistory {
                symbol: history.symbol.clone(),
                interval: history.timeframe,
                got: closes.len(),
                required: 2,
            }
        })?;
        Ok(BacktestReport {
            coin: history.coin,
            symbol: history.symbol,
            timeframe: history.timeframe,
            samples: closes.len().saturating_sub(1),
            metrics,
        })
    }

    pub async fn recent_predictions(
        &self,
        query: &PredictionQuery,
    ) -> Result<Vec<PredictionRecord>, StoreError> {
        self.context.ledger.recent(query).await
    }

    pub async fn scheduler_status(&self) -> SchedulerStatus {
        self.scheduler.status().await
    }

    pub async fn loaded_models(&self) -> Vec<RegisteredModelInfo> {
        self.registry().snapshot().await
    }

    /// Re-read the artifact for one timeframe and swap it into the registry.
    pub async fn reload_model(&self, timeframe: &str) -> Result<ReloadOutcome, ServiceError> {
        let timeframe = Timeframe::from_str(timeframe).map_err(PredictionError::from)?;
        let outcome = self.registry().reload(timeframe).await;
        self.metrics
            .models_loaded
            .set(self.registry().snapshot().await.len() as i64);
        Ok(outcome?)
    }
}
