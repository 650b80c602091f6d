//! Reminder notification contract.
//!
//! # Responsibility
//! - Describe the `deadlines` channel and the reminder notification shape.
//! - Provide in-process notifier backends; the platform surface that actually
//!   draws notifications lives outside the core.
//!
//! # Invariants
//! - `ensure_channel` is idempotent.
//! - Notification bodies carry the task title only.

use log::info;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Channel/category id used for every deadline reminder.
pub const DEADLINE_CHANNEL_ID: &str = "deadlines";

/// Notification channel/category registration, always at the platform's
/// default importance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// One user-visible reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderNotification {
    pub channel_id: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification channel `{0}` is not registered")]
    UnknownChannel(String),
    #[error("notification surface unavailable: {0}")]
    Unavailable(String),
}

/// Platform notification surface.
pub trait Notifier: Send + Sync {
    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotifyError>;
    fn notify(&self, notification: &ReminderNotification) -> Result<(), NotifyError>;
}

/// Notifier that only writes a metadata log line.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotifyError> {
        info!(
            "event=notify_channel module=notify status=ok channel_id={}",
            channel.id
        );
        Ok(())
    }

    fn notify(&self, notification: &ReminderNotification) -> Result<(), NotifyError> {
        info!(
            "event=notify_emit module=notify status=ok channel_id={} body_len={}",
            notification.channel_id,
            notification.body.chars().count()
        );
        Ok(())
    }
}

/// Notifier that queues notifications for a UI layer to drain and display.
#[derive(Debug, Default)]
pub struct QueueNotifier {
    channels: Mutex<BTreeSet<String>>,
    pending: Mutex<Vec<ReminderNotification>>,
}

impl QueueNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every queued notification, oldest first.
    pub fn drain(&self) -> Vec<ReminderNotification> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn has_channel(&self, channel_id: &str) -> bool {
        self.channels.lock().contains(channel_id)
    }
}

impl Notifier for QueueNotifier {
    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotifyError> {
        self.channels.lock().insert(channel.id.clone());
        Ok(())
    }

    fn notify(&self, notification: &ReminderNotification) -> Result<(), NotifyError> {
        if !self.has_channel(&notification.channel_id) {
            return Err(NotifyError::UnknownChannel(notification.channel_id.clone()));
        }
        self.pending.lock().push(notification.clone());
        Ok(())
    }
}
