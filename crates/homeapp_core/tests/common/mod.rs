#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use homeapp_core::{
    Advice, AdviceError, AdviceSource, HomeLabels, HomeRepository, QueueNotifier,
    ReminderScheduler, SharedStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Advice source answering from a fixed script.
pub struct StubAdvice {
    text: Option<String>,
    calls: AtomicUsize,
}

impl StubAdvice {
    pub fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            text: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdviceSource for StubAdvice {
    async fn fetch_advice(&self) -> Result<Advice, AdviceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.text {
            Some(text) => Ok(Advice::new(text.clone())),
            None => Err(AdviceError::Status(503)),
        }
    }
}

pub fn memory_repository() -> HomeRepository {
    repository_over(SharedStore::open_in_memory().unwrap())
}

pub fn repository_over(store: SharedStore) -> HomeRepository {
    HomeRepository::new(store, StubAdvice::ok("unused"), Duration::from_millis(50))
}

pub fn repository_with_grace(idle_grace: Duration) -> HomeRepository {
    HomeRepository::new(
        SharedStore::open_in_memory().unwrap(),
        StubAdvice::ok("unused"),
        idle_grace,
    )
}

pub fn scheduler_for(repository: &HomeRepository) -> (ReminderScheduler, Arc<QueueNotifier>) {
    let notifier = Arc::new(QueueNotifier::new());
    let scheduler = ReminderScheduler::new(
        repository.clone(),
        notifier.clone(),
        &HomeLabels::default(),
        Duration::from_secs(30),
    );
    (scheduler, notifier)
}

pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .unwrap()
}
