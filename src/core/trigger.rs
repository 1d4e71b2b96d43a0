//! Firing-time calculation for scheduled jobs

use chrono::{DateTime, Duration, Utc};
use cron::Schedule;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub enum JobTrigger {
    /// Six-field cron expression (`sec min hour dom month dow`), evaluated in UTC.
    Cron {
        expression: String,
        schedule: Box<Schedule>,
    },
    /// Fires every `period`, counted from the moment the scheduler started.
    Interval { period: Duration },
}

impl JobTrigger {
    pub fn cron(expression: &str) -> Result<Self, cron::error::Error> {
        let schedule = Schedule::from_str(expression)?;
        Ok(JobTrigger::Cron {
            expression: expression.to_string(),
            schedule: Box::new(schedule),
        })
    }

    pub fn interval(period: Duration) -> Self {
        JobTrigger::Interval { period }
    }

    /// First firing strictly after `after`. `anchor` is the scheduler start
    /// time and only matters for interval triggers.
    pub fn next_after(
        &self,
        after: DateTime<Utc>,
        anchor: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match self {
            JobTrigger::Cron { schedule, .. } => schedule.after(&after).next(),
            JobTrigger::Interval { period } => {
                let step = period.num_milliseconds();
                if step <= 0 {
                    return None;
                }
                let elapsed = (after - anchor).num_milliseconds();
                let k = if elapsed < 0 { 1 } else { elapsed / step + 1 };
                Some(anchor + Duration::milliseconds(step * k))
            }
        }
    }

    /// Collapse every firing due at or before `now`, starting from `first_due`,
    /// into the latest one.
    pub fn coalesce(
        &self,
        first_due: DateTime<Utc>,
        now: DateTime<Utc>,
        anchor: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let mut latest = first_due;
        while let Some(next) = self.next_after(latest, anchor) {
            if next > now {
                break;
            }
            latest = next;
        }
        latest
    }
}

impl fmt::Display for JobTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobTrigger::Cron { expression, .. } => write!(f, "cron[{}]", expression),
            JobTrigger::Interval { period } => {
                let secs = period.num_seconds();
                write!(
                    f,
                    "interval[{}:{:02}:{:02}]",
                    secs / 3600,
                    (secs % 3600) / 60,
                    secs % 60
                )
            }
        }
    }
}
