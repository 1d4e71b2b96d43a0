//! Job lifecycle events and the default observer

use crate::jobs::SweepReport;
use crate::metrics::Metrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub enum JobEvent {
    Executed {
        job_id: String,
        scheduled_at: DateTime<Utc>,
        duration: Duration,
        report: SweepReport,
    },
    Error {
        job_id: String,
        scheduled_at: DateTime<Utc>,
        error: String,
    },
    /// Fired later than the grace window allows; the run was skipped.
    Missed {
        job_id: String,
        scheduled_at: DateTime<Utc>,
        lateness: Duration,
    },
    /// A previous run of the same job was still in flight; the firing was dropped.
    MaxInstances {
        job_id: String,
        scheduled_at: DateTime<Utc>,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> &str {
        match self {
            JobEvent::Executed { job_id, .. }
            | JobEvent::Error { job_id, .. }
            | JobEvent::Missed { job_id, .. }
            | JobEvent::MaxInstances { job_id, .. } => job_id,
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            JobEvent::Executed { .. } => "executed",
            JobEvent::Error { .. } => "error",
            JobEvent::Missed { .. } => "missed",
            JobEvent::MaxInstances { .. } => "dropped",
        }
    }
}

/// Observer attached to the scheduler. Called from scheduler tasks, so it
/// must not block.
pub trait JobListener: Send + Sync {
    fn on_event(&self, event: &JobEvent);
}

/// Logs every event and feeds the job counters.
pub struct LoggingJobListener {
    metrics: Option<Arc<Metrics>>,
}

impl LoggingJobListener {
    pub fn new(metrics: Option<Arc<Metrics>>) -> Self {
        Self { metrics }
    }
}

impl JobListener for LoggingJobListener {
    fn on_event(&self, event: &JobEvent) {
        match event {
            JobEvent::Executed {
                job_id,
                duration,
                report,
                ..
            } => {
                info!(
                    job_id = %job_id,
                    succeeded = report.succeeded,
                    failed = report.failed,
                    duration_ms = duration.as_millis() as u64,
                    "JobListener: job {} executed successfully",
                    job_id
                );
                if let Some(ref metrics) = self.metrics {
                    metrics
                        .job_run_duration_seconds
                        .with_label_values(&[job_id.as_str()])
                        .observe(duration.as_secs_f64());
                }
            }
            JobEvent::Error { job_id, error, .. } => {
                error!(
                    job_id = %job_id,
                    error = %error,
                    "JobListener: job {} failed with exception: {}",
                    job_id,
                    error
                );
            }
            JobEvent::Missed {
                job_id,
                scheduled_at,
                lateness,
            } => {
                warn!(
                    job_id = %job_id,
                    scheduled_at = %scheduled_at,
                    lateness_secs = lateness.as_secs(),
                    "JobListener: run of job {} missed by {}s, skipping",
                    job_id,
                    lateness.as_secs()
                );
            }
            JobEvent::MaxInstances {
                job_id,
                scheduled_at,
            } => {
                warn!(
                    job_id = %job_id,
                    scheduled_at = %scheduled_at,
                    "JobListener: job {} still running, dropping this firing",
                    job_id
                );
            }
        }

        if let Some(ref metrics) = self.metrics {
            metrics.record_job_run(event.job_id(), event.outcome());
        }
    }
}
