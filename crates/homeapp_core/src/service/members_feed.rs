//! Observable member list shared by all subscribers.
//!
//! # Responsibility
//! - Re-read the full member/task snapshot whenever the store reports a
//!   family change and fan it out to subscribers.
//! - Start the read pipeline lazily and stop it once nobody has listened for
//!   longer than the idle grace window.
//!
//! # Invariants
//! - At most one pipeline runs per feed.
//! - Store changes are re-read and fanned out during the idle grace window
//!   too, so a subscriber arriving inside it sees every later write.
//! - A subscriber always receives the latest loaded snapshot first.
//! - Pipeline teardown and new subscriptions are serialized by one lock, so a
//!   subscriber never attaches to a pipeline that is shutting down.

use crate::model::member::FamilyMember;
use crate::repo::RepoResult;
use crate::store::SharedStore;
use log::{debug, error};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Immutable member list emitted by the feed.
pub type MembersSnapshot = Arc<Vec<FamilyMember>>;

/// Reads the current member list from the store.
pub type MembersLoader = Arc<dyn Fn(&SharedStore) -> RepoResult<Vec<FamilyMember>> + Send + Sync>;

type SnapshotSender = Arc<watch::Sender<Option<MembersSnapshot>>>;

/// Cold, shared, replaying member-list stream.
#[derive(Clone)]
pub struct MembersFeed {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    store: SharedStore,
    loader: MembersLoader,
    idle_grace: Duration,
    pipeline: Mutex<Option<SnapshotSender>>,
    starts: AtomicU64,
}

impl MembersFeed {
    pub fn new(store: SharedStore, loader: MembersLoader, idle_grace: Duration) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                store,
                loader,
                idle_grace,
                pipeline: Mutex::new(None),
                starts: AtomicU64::new(0),
            }),
        }
    }

    /// Subscribes to member snapshots, starting the pipeline if needed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self) -> MembersSubscription {
        let mut pipeline = self.inner.pipeline.lock();
        let sender = match pipeline.as_ref() {
            Some(sender) => Arc::clone(sender),
            None => {
                let (tx, _) = watch::channel(None);
                let sender = Arc::new(tx);
                *pipeline = Some(Arc::clone(&sender));
                let generation = self.inner.starts.fetch_add(1, Ordering::SeqCst) + 1;
                debug!("event=members_feed module=service status=start generation={generation}");
                tokio::spawn(run_pipeline(Arc::clone(&self.inner), Arc::clone(&sender)));
                sender
            }
        };

        let mut rx = sender.subscribe();
        rx.mark_changed();
        MembersSubscription { rx }
    }

    /// Returns whether a read pipeline is currently running.
    pub fn is_active(&self) -> bool {
        self.inner.pipeline.lock().is_some()
    }

    /// Number of pipelines started over the feed lifetime.
    pub fn pipeline_starts(&self) -> u64 {
        self.inner.starts.load(Ordering::SeqCst)
    }
}

/// One subscriber's view of the feed.
pub struct MembersSubscription {
    rx: watch::Receiver<Option<MembersSnapshot>>,
}

impl MembersSubscription {
    /// Waits for the next snapshot this subscriber has not seen yet.
    ///
    /// Returns `None` only when the pipeline is gone.
    pub async fn next(&mut self) -> Option<MembersSnapshot> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            if let Some(snapshot) = self.rx.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }

    /// Latest loaded snapshot, if the pipeline has produced one.
    pub fn latest(&self) -> Option<MembersSnapshot> {
        self.rx.borrow().clone()
    }
}

async fn run_pipeline(inner: Arc<FeedInner>, sender: SnapshotSender) {
    let mut changes = inner.store.subscribe_changes();
    changes.borrow_and_update();
    publish(&inner, &sender);

    // Armed while nobody listens; store changes keep flowing meanwhile.
    let idle = tokio::time::sleep(inner.idle_grace);
    tokio::pin!(idle);
    let mut idle_armed = false;

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                changes.borrow_and_update();
                publish(&inner, &sender);
                if idle_armed && sender.receiver_count() > 0 {
                    idle_armed = false;
                }
            }
            () = sender.closed(), if !idle_armed => {
                idle.as_mut().reset(Instant::now() + inner.idle_grace);
                idle_armed = true;
            }
            () = &mut idle, if idle_armed => {
                idle_armed = false;
                if try_stop(&inner, &sender) {
                    break;
                }
            }
        }
    }
}

fn publish(inner: &FeedInner, sender: &SnapshotSender) {
    match (inner.loader)(&inner.store) {
        Ok(members) => {
            sender.send_replace(Some(Arc::new(members)));
        }
        Err(err) => {
            // Keep the previous snapshot; the next change triggers a retry.
            error!("event=members_feed module=service status=error error={err}");
        }
    }
}

fn try_stop(inner: &FeedInner, sender: &SnapshotSender) -> bool {
    let mut pipeline = inner.pipeline.lock();
    if sender.receiver_count() > 0 {
        return false;
    }
    if pipeline
        .as_ref()
        .is_some_and(|current| Arc::ptr_eq(current, sender))
    {
        *pipeline = None;
    }
    debug!("event=members_feed module=service status=stopped reason=idle");
    true
}
