//! Job definitions for the prediction sweeps

use crate::core::trigger::JobTrigger;
use crate::models::Timeframe;
use serde::Serialize;
use std::time::Duration;

pub const HOURLY_ALL_PREDICTIONS: &str = "hourly_all_predictions";
pub const FIVE_MINUTE_PREDICTIONS: &str = "5m_predictions";
pub const FOUR_HOUR_PREDICTIONS: &str = "4h_predictions";

/// Top of every hour.
pub const HOURLY_CRON: &str = "0 0 * * * *";
/// Minute 1 of every fourth hour.
pub const FOUR_HOUR_CRON: &str = "0 1 */4 * * *";
pub const FIVE_MINUTE_INTERVAL_MINUTES: i64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid trigger '{expression}': {reason}")]
    InvalidTrigger { expression: String, reason: String },
    #[error("job run panicked: {0}")]
    Panicked(String),
}

/// Which (coin, timeframe) units a job sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobScope {
    /// Every coin, every timeframe, timeframes in order.
    All,
    Timeframe(Timeframe),
}

#[derive(Debug, Clone)]
pub struct JobSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub trigger: JobTrigger,
    pub scope: JobScope,
}

/// The three standing jobs.
pub fn default_jobs() -> Result<Vec<JobSpec>, JobError> {
    Ok(vec![
        JobSpec {
            id: HOURLY_ALL_PREDICTIONS,
            name: "Hourly All Predictions Job",
            trigger: cron_trigger(HOURLY_CRON)?,
            scope: JobScope::All,
        },
        JobSpec {
            id: FIVE_MINUTE_PREDICTIONS,
            name: "5-Minute Predictions Job",
            trigger: JobTrigger::interval(chrono::Duration::minutes(FIVE_MINUTE_INTERVAL_MINUTES)),
            scope: JobScope::Timeframe(Timeframe::FiveMinutes),
        },
        JobSpec {
            id: FOUR_HOUR_PREDICTIONS,
            name: "4-Hour Predictions Job",
            trigger: cron_trigger(FOUR_HOUR_CRON)?,
            scope: JobScope::Timeframe(Timeframe::FourHours),
        },
    ])
}

fn cron_trigger(expression: &str) -> Result<JobTrigger, JobError> {
    JobTrigger::cron(expression).map_err(|e| JobError::InvalidTrigger {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Tally of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub succeeded: usize,
    pub failed: usize,
    pub store_failures: usize,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl SweepReport {
    pub fn merge(&mut self, other: &SweepReport) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.store_failures += other.store_failures;
        self.elapsed += other.elapsed;
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
