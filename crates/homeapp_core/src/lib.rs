//! Core domain logic for the household task tracker.
//! This crate is the single source of truth for member/task invariants,
//! reminder scheduling and screen state.

pub mod app;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod remote;
pub mod repo;
pub mod service;
pub mod store;

pub use app::{HomeApp, HomeError};
pub use config::{HomeConfig, HomeLabels};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::advice::Advice;
pub use model::member::{FamilyMember, MemberId};
pub use model::reminder::{ReminderJob, ReminderJobId, ReminderJobState};
pub use model::task::{format_deadline, Task, TaskCompletion, TaskId};
pub use notify::{
    LogNotifier, NotificationChannel, Notifier, NotifyError, QueueNotifier, ReminderNotification,
    DEADLINE_CHANNEL_ID,
};
pub use remote::advice_client::{AdviceError, AdviceSource, HttpAdviceClient};
pub use repo::{RepoError, RepoResult};
pub use service::home_controller::{HomeController, HomeState};
pub use service::home_repository::HomeRepository;
pub use service::members_feed::{MembersFeed, MembersSnapshot, MembersSubscription};
pub use service::reminder_scheduler::{
    reminder_delay, FireOutcome, ReminderScheduler, ScheduleOutcome,
};
pub use store::SharedStore;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
