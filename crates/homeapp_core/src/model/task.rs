//! Task entity and its completion lifecycle.
//!
//! # Invariants
//! - `completed_at.is_some() == is_done` for every task created through
//!   `Task::new` and transitioned through `Task::toggled`.
//! - `deadline` is local civil time; no zone is attached.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a task.
pub type TaskId = Uuid;

/// A household chore with a deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub deadline: NaiveDateTime,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
}

/// Status pair written by a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCompletion {
    pub is_done: bool,
    pub completed_at: Option<NaiveDateTime>,
}

impl Task {
    /// Creates an open task with a freshly generated identity.
    pub fn new(title: impl Into<String>, deadline: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            deadline,
            is_done: false,
            completed_at: None,
        }
    }

    /// Computes the status this task moves to when toggled at `now`.
    ///
    /// Becoming done stamps `now`; reopening clears the completion time.
    pub fn toggled(&self, now: NaiveDateTime) -> TaskCompletion {
        let is_done = !self.is_done;
        TaskCompletion {
            is_done,
            completed_at: is_done.then_some(now),
        }
    }

    /// Returns whether the deadline has passed at `now` without completion.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        !self.is_done && self.deadline <= now
    }
}

/// Formats a deadline for display, e.g. `5 March 14:30`.
pub fn format_deadline(deadline: NaiveDateTime) -> String {
    deadline.format("%-d %B %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_deadline, Task};
    use chrono::NaiveDate;

    fn at(hour: u32, min: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 5)
            .and_then(|d| d.and_hms_opt(hour, min, 0))
            .expect("valid date")
    }

    #[test]
    fn toggled_stamps_and_clears_completion() {
        let task = Task::new("Buy milk", at(18, 0));
        let done = task.toggled(at(12, 0));
        assert!(done.is_done);
        assert_eq!(done.completed_at, Some(at(12, 0)));

        let reopened = Task {
            is_done: done.is_done,
            completed_at: done.completed_at,
            ..task.clone()
        }
        .toggled(at(13, 0));
        assert!(!reopened.is_done);
        assert_eq!(reopened.completed_at, None);
    }

    #[test]
    fn overdue_only_when_open_and_past_deadline() {
        let mut task = Task::new("Water plants", at(9, 0));
        assert!(task.is_overdue(at(9, 0)));
        assert!(!task.is_overdue(at(8, 59)));
        task.is_done = true;
        assert!(!task.is_overdue(at(10, 0)));
    }

    #[test]
    fn format_deadline_uses_day_month_time() {
        assert_eq!(format_deadline(at(14, 30)), "5 March 14:30");
    }
}
