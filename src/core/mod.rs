//! Core application primitives (scheduler, composition root, HTTP shell)

pub mod http;
pub mod listener;
pub mod runtime;
pub mod scheduler;
pub mod trigger;

pub use http::{create_router, start_server, AppState};
pub use listener::{JobEvent, JobListener, LoggingJobListener};
pub use runtime::{PredictionService, ServiceError};
pub use scheduler::{
    decide_firing, FiringDecision, PredictionScheduler, ScheduledJob, SchedulerError,
    SchedulerState, SchedulerStatus,
};
pub use trigger::JobTrigger;
