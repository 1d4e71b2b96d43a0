//! Scheduled prediction jobs

pub mod context;
pub mod handlers;
pub mod types;

pub use context::JobContext;
pub use handlers::{run_all_predictions, run_prediction_for_timeframe, run_scope};
pub use types::{
    default_jobs, JobError, JobScope, JobSpec, SweepReport, FIVE_MINUTE_PREDICTIONS,
    FOUR_HOUR_PREDICTIONS, HOURLY_ALL_PREDICTIONS,
};
