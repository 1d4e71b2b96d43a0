//! HTTP endpoint server using Axum

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, Level};

use super::runtime::{PredictionService, ServiceError};
use crate::db::{PredictionQuery, StoreError};
use crate::models::{Timeframe, Trend};
use crate::pipeline::predictor::DEFAULT_HISTORY_LIMIT;
use crate::pipeline::{ModelError, PredictionError};

const DEFAULT_COIN: &str = "BTC";
const DEFAULT_TIMEFRAME: &str = "1h";
const MAX_PREDICTIONS_LIMIT: usize = 500;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub start_time: Arc<Instant>,
}

impl AppState {
    pub fn new(service: Arc<PredictionService>) -> Self {
        Self {
            service,
            start_time: Arc::new(Instant::now()),
        }
    }
}

/// Error body is always `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        let status = match e {
            _ if e.is_bad_request() => StatusCode::BAD_REQUEST,
            PredictionError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        error!(error = %e, "HTTP: prediction store read failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Prediction(inner) => inner.into(),
            ServiceError::Model(ModelError::Schema(_)) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: e.to_string(),
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CoinQuery {
    coin: Option<String>,
    timeframe: Option<String>,
    limit: Option<usize>,
}

impl CoinQuery {
    fn coin(&self) -> &str {
        self.coin.as_deref().unwrap_or(DEFAULT_COIN)
    }

    fn timeframe(&self) -> &str {
        self.timeframe.as_deref().unwrap_or(DEFAULT_TIMEFRAME)
    }
}

#[derive(Debug, Deserialize)]
pub struct ReloadQuery {
    timeframe: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Json(json!({
        "status": "healthy",
        "uptime_seconds": uptime_seconds,
        "service": "pricecast"
    }))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .service
        .metrics()
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let metrics = state.service.metrics().clone();

    metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    metrics.http_requests_in_flight.dec();

    metrics.http_requests_total.inc();
    metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis() as u64,
            "HTTP request error"
        );
    }

    response
}

async fn list_coins(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "coins": state.service.coins() }))
}

async fn list_timeframes() -> Json<Value> {
    let timeframes: Vec<&str> = Timeframe::ALL.iter().map(|tf| tf.as_str()).collect();
    Json(json!({ "timeframes": timeframes }))
}

/// Per-point forecasts over recent history plus the next-step forecast.
async fn predict(
    State(state): State<AppState>,
    Query(params): Query<CoinQuery>,
) -> Result<Json<Value>, ApiError> {
    let coin = state.service.resolve_coin(params.coin())?;
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let history = state
        .service
        .run_prediction_with_history(&coin.code, params.timeframe(), limit)
        .await?;
    let trend = Trend::from_prices(history.current, history.predicted);

    Ok(Json(json!({
        "coin": coin.code,
        "symbol": coin.symbol,
        "timeframe": params.timeframe(),
        "times": history.times,
        "actual_prices": history.actual_prices,
        "predicted_prices": history.predicted_prices,
        "current": history.current,
        "predicted": history.predicted,
        "trend": trend,
    })))
}

async fn price_history(
    State(state): State<AppState>,
    Query(params): Query<CoinQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let history = state
        .service
        .price_history(params.coin(), params.timeframe(), limit)
        .await?;
    let times: Vec<_> = history.candles.iter().map(|c| c.timestamp).collect();
    let prices: Vec<f64> = history.candles.iter().map(|c| c.close).collect();

    Ok(Json(json!({
        "coin": history.coin,
        "symbol": history.symbol,
        "timeframe": history.timeframe,
        "times": times,
        "prices": prices,
    })))
}

/// Stored forecasts, newest first. Filters are optional here.
async fn recent_predictions(
    State(state): State<AppState>,
    Query(params): Query<CoinQuery>,
) -> Result<Json<Value>, ApiError> {
    let coin = match params.coin {
        Some(ref c) => Some(state.service.resolve_coin(c)?.code),
        None => None,
    };
    let timeframe = match params.timeframe {
        Some(ref tf) => Some(
            tf.parse::<Timeframe>()
                .map_err(PredictionError::from)?
                .as_str()
                .to_string(),
        ),
        None => None,
    };
    let query = PredictionQuery {
        coin,
        timeframe,
        limit: params
            .limit
            .unwrap_or(PredictionQuery::default().limit)
            .clamp(1, MAX_PREDICTIONS_LIMIT),
    };

    let records = state.service.recent_predictions(&query).await?;
    Ok(Json(json!({
        "count": records.len(),
        "predictions": records,
    })))
}

async fn backtest(
    State(state): State<AppState>,
    Query(params): Query<CoinQuery>,
) -> Result<Json<Value>, ApiError> {
    let report = state
        .service
        .backtest(params.coin(), params.timeframe())
        .await?;
    Ok(Json(json!(report)))
}

async fn scheduler_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.service.scheduler_status().await))
}

async fn debug_models(State(state): State<AppState>) -> Json<Value> {
    let registry = state.service.registry();
    let models = registry.snapshot().await;
    let status = if models.len() == Timeframe::ALL.len() {
        "OK"
    } else {
        "MODELS_NOT_LOADED"
    };

    Json(json!({
        "models_directory": registry.models_dir().display().to_string(),
        "directory_exists": registry.models_dir().is_dir(),
        "loaded_models": models,
        "models_count": models.len(),
        "status": status,
    }))
}

/// Swap in a freshly written artifact for one timeframe.
async fn reload_model(
    State(state): State<AppState>,
    Query(params): Query<ReloadQuery>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state.service.reload_model(&params.timeframe).await?;
    Ok(Json(json!({
        "timeframe": params.timeframe,
        "result": outcome,
    })))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/coins", get(list_coins))
        .route("/timeframes", get(list_timeframes))
        .route("/predict", get(predict))
        .route("/history", get(price_history))
        .route("/predictions", get(recent_predictions))
        .route("/backtest", get(backtest))
        .route("/scheduler", get(scheduler_status))
        .route("/debug/models", get(debug_models))
        .route("/reload", post(reload_model))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn start_server<F>(
    service: Arc<PredictionService>,
    port: u16,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
