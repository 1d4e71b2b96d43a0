//! In-process scheduler for the prediction sweeps
//!
//! Jobs are registered from their templates on every start and unregistered
//! again on stop. Each registered job gets its own timer task. When a firing comes due the timer
//! collapses any backlog into one run, skips it if it is later than the grace
//! window, drops it if the previous run of that job is still going, and
//! otherwise spawns the run on its own task so the timer never blocks.

use super::listener::{JobEvent, JobListener};
use super::trigger::JobTrigger;
use crate::jobs::{JobError, SweepReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub type JobFuture = Pin<Box<dyn Future<Output = Result<SweepReport, JobError>> + Send>>;
pub type JobAction = Arc<dyn Fn() -> JobFuture + Send + Sync>;

pub const DEFAULT_MISFIRE_GRACE: Duration = Duration::from_secs(300);
/// Every trigger is evaluated in UTC.
pub const SCHEDULER_TIMEZONE: &str = "UTC";

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("unknown job '{0}'")]
    UnknownJob(String),
    #[error("scheduler is not running")]
    NotRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// What happens to a single firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiringDecision {
    Run,
    SkipMisfire { lateness: Duration },
    DropOverlap,
}

/// Decide a firing due at `scheduled_at` that is being looked at `now`.
///
/// Lateness beyond `grace` wins over the overlap check.
pub fn decide_firing(
    scheduled_at: DateTime<Utc>,
    now: DateTime<Utc>,
    grace: Duration,
    in_flight: bool,
) -> FiringDecision {
    let lateness = (now - scheduled_at).to_std().unwrap_or_default();
    if lateness > grace {
        FiringDecision::SkipMisfire { lateness }
    } else if in_flight {
        FiringDecision::DropOverlap
    } else {
        FiringDecision::Run
    }
}

#[derive(Clone)]
pub struct ScheduledJob {
    pub id: String,
    pub name: String,
    pub trigger: JobTrigger,
    action: JobAction,
}

impl ScheduledJob {
    pub fn new<F, Fut>(id: impl Into<String>, name: impl Into<String>, trigger: JobTrigger, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SweepReport, JobError>> + Send + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            trigger,
            action: boxed_action(f),
        }
    }
}

pub fn boxed_action<F, Fut>(f: F) -> JobAction
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SweepReport, JobError>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as JobFuture)
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub id: String,
    pub name: String,
    pub next_run: Option<DateTime<Utc>>,
    pub trigger: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub state: SchedulerState,
    pub timezone: String,
    pub jobs: Vec<JobStatus>,
    pub job_count: usize,
}

struct JobSlot {
    job: ScheduledJob,
    /// Held for the whole of a run; at most one run per job.
    running: Arc<Mutex<()>>,
    next_run: RwLock<Option<DateTime<Utc>>>,
}

struct Shared {
    /// Templates registered on each start.
    templates: Vec<ScheduledJob>,
    listeners: Vec<Arc<dyn JobListener>>,
    misfire_grace: Duration,
    startup: Option<JobAction>,
}

#[derive(Default)]
struct Control {
    shutdown: Option<watch::Sender<bool>>,
    timers: Vec<JoinHandle<()>>,
}

#[derive(Default)]
pub struct SchedulerBuilder {
    jobs: Vec<ScheduledJob>,
    listeners: Vec<Arc<dyn JobListener>>,
    misfire_grace: Option<Duration>,
    startup: Option<JobAction>,
}

impl SchedulerBuilder {
    pub fn job(mut self, job: ScheduledJob) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn listener(mut self, listener: Arc<dyn JobListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn misfire_grace(mut self, grace: Duration) -> Self {
        self.misfire_grace = Some(grace);
        self
    }

    /// Run once to completion during `start`, before the scheduler reports running.
    pub fn startup(mut self, action: JobAction) -> Self {
        self.startup = Some(action);
        self
    }

    pub fn build(self) -> PredictionScheduler {
        PredictionScheduler {
            shared: Arc::new(Shared {
                templates: self.jobs,
                listeners: self.listeners,
                misfire_grace: self.misfire_grace.unwrap_or(DEFAULT_MISFIRE_GRACE),
                startup: self.startup,
            }),
            state: RwLock::new(SchedulerState::Stopped),
            slots: RwLock::new(Vec::new()),
            control: Mutex::new(Control::default()),
        }
    }
}

/// Owned by the composition root; `start` and `stop` may be called any number
/// of times and misuse is a logged no-op.
pub struct PredictionScheduler {
    shared: Arc<Shared>,
    state: RwLock<SchedulerState>,
    /// Registered jobs; empty unless starting or running.
    slots: RwLock<Vec<Arc<JobSlot>>>,
    control: Mutex<Control>,
}

impl PredictionScheduler {
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::default()
    }

    pub async fn state(&self) -> SchedulerState {
        *self.state.read().await
    }

    pub async fn is_running(&self) -> bool {
        self.state().await == SchedulerState::Running
    }

    pub fn misfire_grace(&self) -> Duration {
        self.shared.misfire_grace
    }

    /// Register every job, arm its timer, then run the startup sweep to
    /// completion.
    pub async fn start(&self) {
        let mut control = self.control.lock().await;
        if self.state().await != SchedulerState::Stopped {
            warn!("PredictionScheduler: already running, ignoring start");
            return;
        }
        *self.state.write().await = SchedulerState::Starting;

        let slots: Vec<Arc<JobSlot>> = self
            .shared
            .templates
            .iter()
            .map(|job| {
                Arc::new(JobSlot {
                    job: job.clone(),
                    running: Arc::new(Mutex::new(())),
                    next_run: RwLock::new(None),
                })
            })
            .collect();
        *self.slots.write().await = slots.clone();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let anchor = Utc::now();
        for slot in &slots {
            let handle = tokio::spawn(timer_loop(
                self.shared.clone(),
                slot.clone(),
                anchor,
                shutdown_rx.clone(),
            ));
            control.timers.push(handle);
            info!(
                job_id = %slot.job.id,
                trigger = %slot.job.trigger,
                "PredictionScheduler: added job {} ({})",
                slot.job.name,
                slot.job.trigger
            );
        }
        control.shutdown = Some(shutdown_tx);

        info!(
            job_count = slots.len(),
            timezone = SCHEDULER_TIMEZONE,
            "PredictionScheduler: started with {} jobs",
            slots.len()
        );

        if let Some(ref startup) = self.shared.startup {
            info!("PredictionScheduler: running initial predictions on startup");
            match tokio::spawn(startup()).await {
                Ok(Ok(report)) => info!(
                    succeeded = report.succeeded,
                    failed = report.failed,
                    "PredictionScheduler: initial predictions finished"
                ),
                Ok(Err(e)) => error!(error = %e, "PredictionScheduler: initial predictions failed"),
                Err(e) => error!(error = %e, "PredictionScheduler: initial predictions panicked"),
            }
        }

        *self.state.write().await = SchedulerState::Running;
    }

    /// Stop firing, wait for in-flight runs to finish, then unregister every
    /// job.
    pub async fn stop(&self) {
        let mut control = self.control.lock().await;
        if self.state().await != SchedulerState::Running {
            warn!("PredictionScheduler: was not running, ignoring stop");
            return;
        }
        *self.state.write().await = SchedulerState::Stopping;

        if let Some(shutdown) = control.shutdown.take() {
            let _ = shutdown.send(true);
        }
        for timer in control.timers.drain(..) {
            if let Err(e) = timer.await {
                warn!(error = %e, "PredictionScheduler: timer task ended abnormally");
            }
        }
        let slots = std::mem::take(&mut *self.slots.write().await);
        for slot in &slots {
            let _idle = slot.running.lock().await;
            debug!(job_id = %slot.job.id, "PredictionScheduler: removed job {}", slot.job.id);
        }

        *self.state.write().await = SchedulerState::Stopped;
        info!("PredictionScheduler: stopped");
    }

    /// Fire `job_id` as if its trigger came due at `scheduled_at`.
    pub async fn fire_at(
        &self,
        job_id: &str,
        scheduled_at: DateTime<Utc>,
    ) -> Result<FiringDecision, SchedulerError> {
        // held until the run is spawned so `stop` cannot slip in between
        let state = self.state.read().await;
        if *state != SchedulerState::Running {
            return Err(SchedulerError::NotRunning);
        }
        let slots = self.slots.read().await;
        let slot = slots
            .iter()
            .find(|slot| slot.job.id == job_id)
            .ok_or_else(|| SchedulerError::UnknownJob(job_id.to_string()))?;
        Ok(self.shared.dispatch(slot, scheduled_at, Utc::now()))
    }

    pub async fn fire(&self, job_id: &str) -> Result<FiringDecision, SchedulerError> {
        self.fire_at(job_id, Utc::now()).await
    }

    /// Registered jobs with their next firing. Empty while stopped.
    pub async fn status(&self) -> SchedulerStatus {
        let state = self.state.read().await;
        let slots = self.slots.read().await;
        let registered = matches!(*state, SchedulerState::Starting | SchedulerState::Running);
        let mut jobs = Vec::new();
        if registered {
            for slot in slots.iter() {
                jobs.push(JobStatus {
                    id: slot.job.id.clone(),
                    name: slot.job.name.clone(),
                    next_run: *slot.next_run.read().await,
                    trigger: slot.job.trigger.to_string(),
                });
            }
        }
        SchedulerStatus {
            running: *state == SchedulerState::Running,
            state: *state,
            timezone: SCHEDULER_TIMEZONE.to_string(),
            job_count: jobs.len(),
            jobs,
        }
    }
}

impl Shared {
    fn dispatch(
        self: &Arc<Self>,
        slot: &Arc<JobSlot>,
        scheduled_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> FiringDecision {
        let permit = slot.running.clone().try_lock_owned().ok();
        let decision = decide_firing(scheduled_at, now, self.misfire_grace, permit.is_none());

        match decision {
            FiringDecision::Run => {
                if let Some(permit) = permit {
                    self.spawn_run(slot.clone(), scheduled_at, permit);
                }
            }
            FiringDecision::SkipMisfire { lateness } => self.emit(&JobEvent::Missed {
                job_id: slot.job.id.clone(),
                scheduled_at,
                lateness,
            }),
            FiringDecision::DropOverlap => self.emit(&JobEvent::MaxInstances {
                job_id: slot.job.id.clone(),
                scheduled_at,
            }),
        }
        decision
    }

    fn spawn_run(
        self: &Arc<Self>,
        slot: Arc<JobSlot>,
        scheduled_at: DateTime<Utc>,
        permit: OwnedMutexGuard<()>,
    ) {
        let shared = self.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let started = Instant::now();
            debug!(job_id = %slot.job.id, "PredictionScheduler: running job {}", slot.job.id);

            let event = match tokio::spawn((slot.job.action)()).await {
                Ok(Ok(report)) => JobEvent::Executed {
                    job_id: slot.job.id.clone(),
                    scheduled_at,
                    duration: started.elapsed(),
                    report,
                },
                Ok(Err(e)) => JobEvent::Error {
                    job_id: slot.job.id.clone(),
                    scheduled_at,
                    error: e.to_string(),
                },
                Err(e) => JobEvent::Error {
                    job_id: slot.job.id.clone(),
                    scheduled_at,
                    error: JobError::Panicked(e.to_string()).to_string(),
                },
            };
            shared.emit(&event);
        });
    }

    fn emit(&self, event: &JobEvent) {
        for listener in &self.listeners {
            listener.on_event(event);
        }
    }
}

async fn timer_loop(
    shared: Arc<Shared>,
    slot: Arc<JobSlot>,
    anchor: DateTime<Utc>,
    mut shutdown: watch::Receiver<bool>,
) {
    let trigger = &slot.job.trigger;
    let mut next = trigger.next_after(anchor, anchor);

    loop {
        let Some(due) = next else {
            warn!(job_id = %slot.job.id, "PredictionScheduler: no further firings for {}", slot.job.id);
            break;
        };
        *slot.next_run.write().await = Some(due);

        let wait = (due - Utc::now()).to_std().unwrap_or_default();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.changed() => break,
        }

        let now = Utc::now();
        let scheduled_at = trigger.coalesce(due, now, anchor);
        if scheduled_at > due {
            debug!(
                job_id = %slot.job.id,
                "PredictionScheduler: coalesced missed firings of {}",
                slot.job.id
            );
        }
        shared.dispatch(&slot, scheduled_at, now);
        next = trigger.next_after(now.max(scheduled_at), anchor);
    }
}
