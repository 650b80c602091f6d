//! Shared handle over the single SQLite connection.
//!
//! # Responsibility
//! - Serialize every statement through one connection.
//! - Publish a monotonically increasing change version after family writes,
//!   which drives re-reads of the members feed.
//!
//! # Invariants
//! - The connection lock is never held across an `.await`.
//! - The change version only grows; reminder-queue writes do not bump it.

use crate::db::{open_db, open_db_in_memory, DbResult};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle to the durable record store.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    conn: Mutex<Connection>,
    changes: watch::Sender<u64>,
}

impl SharedStore {
    /// Opens (and migrates) a file-backed store.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens (and migrates) an in-memory store.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(StoreInner {
                conn: Mutex::new(conn),
                changes,
            }),
        }
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> T) -> T {
        let mut conn = self.inner.conn.lock();
        f(&mut conn)
    }

    /// Marks member/task rows as changed.
    pub fn notify_family_changed(&self) {
        self.inner.changes.send_modify(|version| *version += 1);
    }

    /// Current change version.
    pub fn version(&self) -> u64 {
        *self.inner.changes.borrow()
    }

    /// Subscribes to change-version bumps.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }
}
