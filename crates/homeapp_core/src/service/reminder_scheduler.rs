//! Deadline reminder scheduling and firing.
//!
//! # Responsibility
//! - Turn a task deadline into a persisted one-shot reminder job.
//! - Sweep due jobs from a background tokio loop and fire them.
//! - Re-validate the task at fire time before notifying.
//!
//! # Invariants
//! - Deadlines at or before "now" are never scheduled.
//! - A job is claimed (marked fired) before it is fired, so it notifies at
//!   most once even when sweeps overlap.
//! - Firing never retries and never reports failure upward.

use crate::config::HomeLabels;
use crate::model::reminder::{ReminderJob, ReminderJobId};
use crate::model::task::Task;
use crate::notify::{NotificationChannel, Notifier, ReminderNotification, DEADLINE_CHANNEL_ID};
use crate::repo::datetime::{local_now, now_epoch_millis};
use crate::repo::reminder_repo::{ReminderJobRepository, SqliteReminderJobRepository};
use crate::repo::RepoResult;
use crate::service::home_repository::HomeRepository;
use chrono::NaiveDateTime;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Maximum jobs fired by one sweep.
const MAX_JOBS_PER_SWEEP: u32 = 64;
/// Fired jobs are kept this long for diagnostics before pruning.
const FIRED_RETENTION_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Result of asking for a reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled {
        job_id: ReminderJobId,
        delay: Duration,
    },
    /// Deadline already passed; nothing was stored.
    SkippedPastDeadline,
}

/// What happened when a job fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    Notified,
    /// Task was deleted before the deadline.
    TaskMissing,
    /// Task was completed before the deadline.
    TaskDone,
    /// Task lookup failed; the job is still consumed.
    LookupFailed,
    /// Notification surface rejected the reminder; the job is still consumed.
    NotifyFailed,
}

/// Computes the wait until `deadline`, or `None` when it is not in the future.
pub fn reminder_delay(deadline: NaiveDateTime, now: NaiveDateTime) -> Option<Duration> {
    let delay = deadline - now;
    if delay <= chrono::Duration::zero() {
        return None;
    }
    delay.to_std().ok()
}

/// Durable one-shot reminder scheduler.
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    repository: HomeRepository,
    notifier: Arc<dyn Notifier>,
    channel: NotificationChannel,
    overdue_title: String,
    poll_interval: Duration,
    wake: Notify,
}

impl ReminderScheduler {
    pub fn new(
        repository: HomeRepository,
        notifier: Arc<dyn Notifier>,
        labels: &HomeLabels,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                repository,
                notifier,
                channel: NotificationChannel {
                    id: DEADLINE_CHANNEL_ID.to_string(),
                    name: labels.channel_name.clone(),
                    description: labels.channel_description.clone(),
                },
                overdue_title: labels.overdue_title.clone(),
                poll_interval,
                wake: Notify::new(),
            }),
        }
    }

    /// Schedules a reminder for `task` relative to the current time.
    pub fn schedule(&self, task: &Task) -> RepoResult<ScheduleOutcome> {
        self.schedule_at(task, local_now(), now_epoch_millis())
    }

    /// Schedules a reminder for `task` relative to an explicit "now".
    ///
    /// `now_local` and `now_ms` must describe the same instant.
    pub fn schedule_at(
        &self,
        task: &Task,
        now_local: NaiveDateTime,
        now_ms: i64,
    ) -> RepoResult<ScheduleOutcome> {
        let Some(delay) = reminder_delay(task.deadline, now_local) else {
            debug!(
                "event=reminder_schedule module=reminder status=skipped reason=past_deadline task_id={}",
                task.id
            );
            return Ok(ScheduleOutcome::SkippedPastDeadline);
        };

        let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
        let job = ReminderJob::pending(task.id, task.title.clone(), now_ms, delay_ms);
        self.inner
            .repository
            .store()
            .with_conn(|conn| SqliteReminderJobRepository::new(conn).insert_job(&job))?;
        self.inner.wake.notify_one();

        info!(
            "event=reminder_schedule module=reminder status=ok job_id={} task_id={} delay_ms={}",
            job.id, task.id, delay_ms
        );
        Ok(ScheduleOutcome::Scheduled {
            job_id: job.id,
            delay,
        })
    }

    /// Lists jobs that have not fired yet, soonest first.
    pub fn pending_jobs(&self) -> RepoResult<Vec<ReminderJob>> {
        self.inner
            .repository
            .store()
            .with_conn(|conn| SqliteReminderJobRepository::new(conn).list_pending())
    }

    /// Fires every job due at `now_ms` and prunes old fired jobs.
    pub fn run_due(&self, now_ms: i64) -> RepoResult<Vec<(ReminderJobId, FireOutcome)>> {
        let store = self.inner.repository.store();
        let due = store
            .with_conn(|conn| SqliteReminderJobRepository::new(conn).list_due(now_ms, MAX_JOBS_PER_SWEEP))?;

        let mut outcomes = Vec::with_capacity(due.len());
        for job in due.into_iter().filter(|job| job.is_due(now_ms)) {
            let claimed = store
                .with_conn(|conn| SqliteReminderJobRepository::new(conn).mark_fired(job.id, now_ms))?;
            if !claimed {
                continue;
            }
            outcomes.push((job.id, self.fire(&job)));
        }

        let pruned = store.with_conn(|conn| {
            SqliteReminderJobRepository::new(conn)
                .prune_fired_before(now_ms.saturating_sub(FIRED_RETENTION_MS))
        })?;
        if pruned > 0 {
            debug!("event=reminder_prune module=reminder status=ok removed={pruned}");
        }

        Ok(outcomes)
    }

    /// Fires one job: re-checks the task and notifies when it is still open.
    pub fn fire(&self, job: &ReminderJob) -> FireOutcome {
        let outcome = match self.inner.repository.find_task(job.task_id) {
            Err(err) => {
                error!(
                    "event=reminder_fire module=reminder status=error job_id={} error={}",
                    job.id, err
                );
                FireOutcome::LookupFailed
            }
            Ok(None) => FireOutcome::TaskMissing,
            Ok(Some(task)) if task.is_done => FireOutcome::TaskDone,
            Ok(Some(_)) => self.notify(job),
        };
        info!(
            "event=reminder_fire module=reminder status=done job_id={} task_id={} outcome={:?}",
            job.id, job.task_id, outcome
        );
        outcome
    }

    fn notify(&self, job: &ReminderJob) -> FireOutcome {
        let notifier = &self.inner.notifier;
        let notification = ReminderNotification {
            channel_id: self.inner.channel.id.clone(),
            title: self.inner.overdue_title.clone(),
            body: job.title.clone(),
        };
        let result = notifier
            .ensure_channel(&self.inner.channel)
            .and_then(|()| notifier.notify(&notification));
        match result {
            Ok(()) => FireOutcome::Notified,
            Err(err) => {
                warn!(
                    "event=reminder_notify module=reminder status=error job_id={} error={}",
                    job.id, err
                );
                FireOutcome::NotifyFailed
            }
        }
    }

    /// Time to sleep before the next sweep.
    fn next_sleep(&self, now_ms: i64) -> Duration {
        let poll = self.inner.poll_interval;
        let next = self
            .inner
            .repository
            .store()
            .with_conn(|conn| SqliteReminderJobRepository::new(conn).next_fire_at());
        match next {
            Ok(Some(fire_at)) => {
                let wait_ms = u64::try_from(fire_at.saturating_sub(now_ms)).unwrap_or(0);
                poll.min(Duration::from_millis(wait_ms))
            }
            Ok(None) => poll,
            Err(err) => {
                error!("event=reminder_loop module=reminder status=error error={err}");
                poll
            }
        }
    }

    /// Spawns the background sweep loop. Overdue jobs left from a previous
    /// run fire on the first iteration.
    pub fn spawn(&self) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            info!("event=reminder_loop module=reminder status=start");
            loop {
                if let Err(err) = scheduler.run_due(now_epoch_millis()) {
                    error!("event=reminder_sweep module=reminder status=error error={err}");
                }
                let sleep_for = scheduler.next_sleep(now_epoch_millis());
                tokio::select! {
                    () = tokio::time::sleep(sleep_for) => {}
                    () = scheduler.inner.wake.notified() => {}
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::reminder_delay;
    use chrono::{Duration, NaiveDate};
    use std::time::Duration as StdDuration;

    #[test]
    fn delay_is_positive_only_for_future_deadlines() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid date");

        assert_eq!(
            reminder_delay(now + Duration::hours(1), now),
            Some(StdDuration::from_millis(3_600_000))
        );
        assert_eq!(reminder_delay(now, now), None);
        assert_eq!(reminder_delay(now - Duration::minutes(5), now), None);
    }
}
