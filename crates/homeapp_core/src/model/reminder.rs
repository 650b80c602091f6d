//! Deferred one-shot reminder jobs.
//!
//! # Invariants
//! - A job moves `Pending -> Fired` exactly once and never back.
//! - The payload is limited to the task id and title captured at scheduling
//!   time; fire-time decisions re-read the task instead of trusting it.

use crate::model::task::TaskId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity assigned by the job store when a reminder is registered.
pub type ReminderJobId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderJobState {
    Pending,
    Fired,
}

/// One persisted reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderJob {
    pub id: ReminderJobId,
    pub task_id: TaskId,
    pub title: String,
    /// Unix epoch milliseconds at which the job becomes due.
    pub fire_at_ms: i64,
    /// Unix epoch milliseconds at which the job was registered.
    pub created_at_ms: i64,
    pub state: ReminderJobState,
    pub fired_at_ms: Option<i64>,
}

impl ReminderJob {
    /// Creates a pending job due `delay_ms` after `now_ms`.
    pub fn pending(task_id: TaskId, title: impl Into<String>, now_ms: i64, delay_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            title: title.into(),
            fire_at_ms: now_ms.saturating_add(delay_ms),
            created_at_ms: now_ms,
            state: ReminderJobState::Pending,
            fired_at_ms: None,
        }
    }

    /// Delay between registration and the due time.
    pub fn delay_ms(&self) -> i64 {
        self.fire_at_ms - self.created_at_ms
    }

    pub fn is_due(&self, now_ms: i64) -> bool {
        self.state == ReminderJobState::Pending && self.fire_at_ms <= now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::{ReminderJob, ReminderJobState};
    use uuid::Uuid;

    #[test]
    fn job_is_due_from_fire_time_until_it_fires() {
        let mut job = ReminderJob::pending(Uuid::new_v4(), "Buy milk", 1_000, 500);
        assert_eq!(job.delay_ms(), 500);
        assert!(!job.is_due(1_499));
        assert!(job.is_due(1_500));
        assert!(job.is_due(9_000));

        job.state = ReminderJobState::Fired;
        job.fired_at_ms = Some(1_500);
        assert!(!job.is_due(9_000));
    }
}
