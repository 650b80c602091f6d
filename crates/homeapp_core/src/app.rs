//! Composition root.
//!
//! Builds the store, repository, scheduler and controller explicitly and
//! hands them to each other through constructors.

use crate::config::HomeConfig;
use crate::db::DbError;
use crate::notify::Notifier;
use crate::remote::advice_client::{AdviceError, AdviceSource, HttpAdviceClient};
use crate::service::home_controller::HomeController;
use crate::service::home_repository::HomeRepository;
use crate::service::reminder_scheduler::ReminderScheduler;
use crate::store::SharedStore;
use log::info;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Startup failures.
#[derive(Debug, thiserror::Error)]
pub enum HomeError {
    #[error("store unavailable: {0}")]
    Db(#[from] DbError),
    #[error("advice client unavailable: {0}")]
    Advice(#[from] AdviceError),
}

/// Running household core.
///
/// Dropping it stops the controller actor and the reminder sweep loop.
pub struct HomeApp {
    config: HomeConfig,
    repository: HomeRepository,
    scheduler: ReminderScheduler,
    controller: HomeController,
    reminder_loop: JoinHandle<()>,
}

impl HomeApp {
    /// Opens the configured database, builds the HTTP advice client and
    /// starts every background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: HomeConfig, notifier: Arc<dyn Notifier>) -> Result<Self, HomeError> {
        let store = SharedStore::open(&config.db_path)?;
        let advice = HttpAdviceClient::new(&config.advice_base_url, config.advice_timeout)?;
        Ok(Self::start_with(config, store, Arc::new(advice), notifier))
    }

    /// Starts the core over caller-provided collaborators.
    pub fn start_with(
        config: HomeConfig,
        store: SharedStore,
        advice: Arc<dyn AdviceSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let repository = HomeRepository::new(store, advice, config.members_idle_grace)
            .with_strict_names(config.reject_empty_member_names);
        let scheduler = ReminderScheduler::new(
            repository.clone(),
            notifier,
            &config.labels,
            config.reminder_poll_interval,
        );
        let reminder_loop = scheduler.spawn();
        let controller = HomeController::start(repository.clone(), scheduler.clone(), &config.labels);

        info!(
            "event=home_start module=app status=ok strict_names={} poll_interval_ms={}",
            config.reject_empty_member_names,
            config.reminder_poll_interval.as_millis()
        );

        Self {
            config,
            repository,
            scheduler,
            controller,
            reminder_loop,
        }
    }

    pub fn config(&self) -> &HomeConfig {
        &self.config
    }

    pub fn repository(&self) -> &HomeRepository {
        &self.repository
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    pub fn controller(&self) -> &HomeController {
        &self.controller
    }

    /// Stops the reminder loop and the controller. Pending jobs stay stored
    /// and fire on the next start.
    pub fn shutdown(&self) {
        self.reminder_loop.abort();
        self.controller.shutdown();
        info!("event=home_stop module=app status=ok");
    }
}

impl Drop for HomeApp {
    fn drop(&mut self) {
        self.reminder_loop.abort();
    }
}
