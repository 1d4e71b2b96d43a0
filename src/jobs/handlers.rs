//! Prediction sweeps run by the scheduler
//!
//! A sweep walks (coin, timeframe) units one at a time. A failing unit is
//! logged and counted and the sweep moves on.

use crate::jobs::context::JobContext;
use crate::jobs::types::{JobScope, SweepReport};
use crate::models::{prediction::change_pct, Coin, Timeframe, Trend};
use std::time::Instant;
use tracing::{error, info};

pub async fn run_scope(ctx: &JobContext, scope: JobScope) -> SweepReport {
    match scope {
        JobScope::All => run_all_predictions(ctx).await,
        JobScope::Timeframe(timeframe) => run_prediction_for_timeframe(ctx, timeframe).await,
    }
}

/// Every coin and every timeframe, timeframes in `5m, 1h, 4h` order.
pub async fn run_all_predictions(ctx: &JobContext) -> SweepReport {
    info!(
        coins = ctx.coins.len(),
        "Sweep: full prediction sweep started"
    );
    let mut report = SweepReport::default();
    for timeframe in Timeframe::ALL {
        let partial = run_prediction_for_timeframe(ctx, timeframe).await;
        report.merge(&partial);
    }
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        store_failures = report.store_failures,
        "Sweep: full prediction sweep completed"
    );
    report
}

pub async fn run_prediction_for_timeframe(ctx: &JobContext, timeframe: Timeframe) -> SweepReport {
    info!(timeframe = %timeframe, "Sweep: starting predictions for {}", timeframe);
    let start = Instant::now();
    let mut report = SweepReport::default();

    for coin in ctx.coins.iter() {
        let outcome = run_unit(ctx, coin, timeframe).await;
        match outcome {
            UnitOutcome::Saved => report.succeeded += 1,
            UnitOutcome::StoreFailed => {
                report.succeeded += 1;
                report.store_failures += 1;
            }
            UnitOutcome::Failed => report.failed += 1,
        }
        if let Some(ref metrics) = ctx.metrics {
            metrics.record_unit(timeframe.as_str(), !matches!(outcome, UnitOutcome::Failed));
        }
        tokio::task::yield_now().await;
    }

    report.elapsed = start.elapsed();
    info!(
        timeframe = %timeframe,
        succeeded = report.succeeded,
        failed = report.failed,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Sweep: completed {} predictions: {} success, {} errors",
        timeframe,
        report.succeeded,
        report.failed
    );
    report
}

enum UnitOutcome {
    Saved,
    StoreFailed,
    Failed,
}

async fn run_unit(ctx: &JobContext, coin: &Coin, timeframe: Timeframe) -> UnitOutcome {
    let prediction = match ctx.predictor.predict(&coin.symbol, timeframe).await {
        Ok(p) => p,
        Err(e) => {
            error!(
                coin = %coin.code,
                symbol = %coin.symbol,
                timeframe = %timeframe,
                error = %e,
                "Sweep: failed to process {}/{}",
                coin.code,
                timeframe
            );
            return UnitOutcome::Failed;
        }
    };

    let trend = Trend::from_prices(prediction.current_price, prediction.predicted_price);
    info!(
        coin = %coin.code,
        timeframe = %timeframe,
        current_price = prediction.current_price,
        predicted_price = prediction.predicted_price,
        trend = %trend,
        change_pct = change_pct(prediction.current_price, prediction.predicted_price),
        "Sweep: {}/{} {}",
        coin.code,
        timeframe,
        trend
    );

    let saved = ctx
        .ledger
        .save(
            &coin.code,
            timeframe.as_str(),
            prediction.current_price,
            prediction.predicted_price,
            trend,
        )
        .await;
    if saved {
        UnitOutcome::Saved
    } else {
        UnitOutcome::StoreFailed
    }
}
