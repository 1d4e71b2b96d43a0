//! Shared fixtures for integration tests

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use pricecast::core::http::{create_router, AppState};
use pricecast::core::runtime::PredictionService;
use pricecast::db::{
    MemoryPredictionStore, PredictionLedger, PredictionQuery, PredictionStore, StoreError,
};
use pricecast::features::{FEATURE_COLUMNS, FEATURE_COUNT};
use pricecast::jobs::JobContext;
use pricecast::metrics::Metrics;
use pricecast::models::{Candle, CoinUniverse, NewPrediction, PredictionRecord, Timeframe};
use pricecast::pipeline::model::ArtifactPaths;
use pricecast::pipeline::{LinearModelArtifact, ModelRegistry, Predictor, WINDOW};
use pricecast::services::InMemoryMarketDataProvider;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub fn series_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Strictly increasing closes, one candle per timeframe step.
pub fn rising_candles(count: usize, start_price: f64, timeframe: Timeframe) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let close = start_price + i as f64;
            Candle::new(
                close - 0.5,
                close + 1.0,
                close - 1.0,
                close,
                500.0 + (i % 5) as f64 * 10.0,
                series_start() + timeframe.duration() * i as i32,
            )
        })
        .collect()
}

pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "pricecast-it-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Model forecasting the last scaled close plus `bias`.
pub fn write_linear_model(dir: &Path, timeframe: Timeframe, bias: f64) {
    let mut weights = vec![vec![0.0; FEATURE_COUNT]; WINDOW];
    weights[WINDOW - 1][0] = 1.0;
    let artifact = LinearModelArtifact {
        version: Some(format!("test-{}", timeframe)),
        window: WINDOW,
        feature_columns: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
        weights,
        bias,
    };
    std::fs::write(
        ArtifactPaths::new(dir, timeframe).linear,
        serde_json::to_vec(&artifact).expect("serialize artifact"),
    )
    .expect("write artifact");
}

/// Store whose writes always fail.
pub struct FailingStore;

#[async_trait]
impl PredictionStore for FailingStore {
    async fn insert(&self, _prediction: &NewPrediction) -> Result<PredictionRecord, StoreError> {
        Err(StoreError::InvalidRow("disk full".to_string()))
    }

    async fn recent(&self, _query: &PredictionQuery) -> Result<Vec<PredictionRecord>, StoreError> {
        Ok(Vec::new())
    }
}

/// A prediction service over in-memory candles and ledger.
#[allow(dead_code)]
pub struct TestService {
    pub service: Arc<PredictionService>,
    pub provider: Arc<InMemoryMarketDataProvider>,
    pub store: Arc<MemoryPredictionStore>,
    pub metrics: Arc<Metrics>,
    pub models_dir: PathBuf,
}

impl TestService {
    pub async fn new(name: &str) -> Self {
        let models_dir = scratch_dir(name);
        let provider = Arc::new(InMemoryMarketDataProvider::new());
        let store = Arc::new(MemoryPredictionStore::new());
        let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
        let context = Arc::new(build_context(
            provider.clone(),
            &models_dir,
            store.clone(),
            metrics.clone(),
        ));
        let service = PredictionService::new(context, metrics.clone(), Duration::from_secs(300))
            .expect("default jobs");

        Self {
            service: Arc::new(service),
            provider,
            store,
            metrics,
            models_dir,
        }
    }
}

pub fn build_context(
    provider: Arc<InMemoryMarketDataProvider>,
    models_dir: &Path,
    store: Arc<dyn PredictionStore>,
    metrics: Arc<Metrics>,
) -> JobContext {
    let registry = Arc::new(ModelRegistry::new(models_dir));
    let predictor = Arc::new(Predictor::new(provider, registry));
    JobContext::new(
        predictor,
        PredictionLedger::new(store, Some(metrics.clone())),
        CoinUniverse::default(),
        Some(metrics),
    )
}

/// HTTP shell over a [`TestService`].
#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub inner: TestService,
}

impl TestApp {
    pub async fn new(name: &str) -> Self {
        let inner = TestService::new(name).await;
        let router = create_router(AppState::new(inner.service.clone()));
        let server = TestServer::new(router).expect("start test server");
        Self { server, inner }
    }
}
