//! Household repository: domain-level read/write contract.
//!
//! # Responsibility
//! - Translate between storage rows (epoch millis) and domain entities
//!   (local date-times).
//! - Expose the narrow member/task write operations and the observable
//!   member list.
//! - Fetch daily advice through the injected `AdviceSource`.
//!
//! # Invariants
//! - Every successful member/task mutation bumps the store change version,
//!   so observers re-read.
//! - `add_task` never persists a completed task.
//! - Operations on absent ids are silent no-ops.

use crate::model::advice::Advice;
use crate::model::member::{FamilyMember, MemberId};
use crate::model::task::{Task, TaskId};
use crate::remote::advice_client::{AdviceError, AdviceSource};
use crate::repo::datetime::{from_epoch_millis, to_epoch_millis};
use crate::repo::family_repo::{
    FamilyRepository, MemberDeletion, MemberRow, MemberWithTasks, SqliteFamilyRepository, TaskRow,
};
use crate::repo::{RepoError, RepoResult};
use crate::service::members_feed::{MembersFeed, MembersSubscription};
use crate::store::SharedStore;
use chrono::NaiveDateTime;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

/// Domain repository shared by the controller and the reminder scheduler.
#[derive(Clone)]
pub struct HomeRepository {
    store: SharedStore,
    advice: Arc<dyn AdviceSource>,
    feed: MembersFeed,
    reject_empty_names: bool,
}

impl HomeRepository {
    /// Creates a repository whose members feed tears down after `idle_grace`
    /// without subscribers.
    pub fn new(store: SharedStore, advice: Arc<dyn AdviceSource>, idle_grace: Duration) -> Self {
        let feed = MembersFeed::new(store.clone(), Arc::new(load_members), idle_grace);
        Self {
            store,
            advice,
            feed,
            reject_empty_names: false,
        }
    }

    /// Enables rejection of empty (or whitespace-only) member names.
    pub fn with_strict_names(mut self, reject_empty_names: bool) -> Self {
        self.reject_empty_names = reject_empty_names;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn members_feed(&self) -> &MembersFeed {
        &self.feed
    }

    /// Subscribes to the ordered member list with nested tasks.
    pub fn observe_members(&self) -> MembersSubscription {
        self.feed.subscribe()
    }

    /// Reads the current member list once.
    pub fn members_snapshot(&self) -> RepoResult<Vec<FamilyMember>> {
        load_members(&self.store)
    }

    /// Looks up one task directly by id.
    pub fn find_task(&self, task_id: TaskId) -> RepoResult<Option<Task>> {
        let row = self
            .store
            .with_conn(|conn| SqliteFamilyRepository::new(conn).get_task(task_id))?;
        row.map(task_from_row).transpose()
    }

    /// Stores a new member with a fresh identity.
    pub fn add_member(&self, name: &str) -> RepoResult<MemberId> {
        if self.reject_empty_names && name.trim().is_empty() {
            return Err(RepoError::Validation(
                "member name must not be empty".to_string(),
            ));
        }

        let member = FamilyMember::new(name);
        let row = MemberRow {
            id: member.id,
            name: member.name,
        };
        self.store
            .with_conn(|conn| SqliteFamilyRepository::new(conn).insert_member(&row))?;
        self.store.notify_family_changed();
        info!(
            "event=member_add module=repo status=ok member_id={}",
            row.id
        );
        Ok(row.id)
    }

    /// Deletes a member together with all of its tasks.
    pub fn remove_member(&self, member_id: MemberId) -> RepoResult<MemberDeletion> {
        let deletion = self
            .store
            .with_conn(|conn| SqliteFamilyRepository::new(conn).delete_member(member_id))?;
        if deletion.member_removed {
            self.store.notify_family_changed();
            info!(
                "event=member_remove module=repo status=ok member_id={} tasks_removed={}",
                member_id, deletion.tasks_removed
            );
        } else {
            debug!("event=member_remove module=repo status=noop member_id={member_id}");
        }
        Ok(deletion)
    }

    /// Stores `task` under `member_id` as not done, whatever its status says.
    pub fn add_task(&self, member_id: MemberId, task: &Task) -> RepoResult<()> {
        let row = TaskRow {
            id: task.id,
            member_id,
            title: task.title.clone(),
            deadline_ms: to_epoch_millis(task.deadline),
            is_done: false,
            completed_at_ms: None,
        };
        self.store
            .with_conn(|conn| SqliteFamilyRepository::new(conn).insert_task(&row))?;
        self.store.notify_family_changed();
        info!(
            "event=task_add module=repo status=ok task_id={} member_id={}",
            task.id, member_id
        );
        Ok(())
    }

    /// Deletes one task. Returns `false` when it did not exist.
    pub fn remove_task(&self, task_id: TaskId) -> RepoResult<bool> {
        let removed = self
            .store
            .with_conn(|conn| SqliteFamilyRepository::new(conn).delete_task(task_id))?;
        if removed {
            self.store.notify_family_changed();
        }
        debug!(
            "event=task_remove module=repo status={} task_id={task_id}",
            if removed { "ok" } else { "noop" }
        );
        Ok(removed)
    }

    /// Overwrites the status fields of one task with caller-supplied values.
    pub fn toggle_task(
        &self,
        task_id: TaskId,
        is_done: bool,
        completed_at: Option<NaiveDateTime>,
    ) -> RepoResult<bool> {
        let completed_at_ms = completed_at.map(to_epoch_millis);
        let updated = self.store.with_conn(|conn| {
            SqliteFamilyRepository::new(conn).update_task_status(task_id, is_done, completed_at_ms)
        })?;
        if updated {
            self.store.notify_family_changed();
        }
        debug!(
            "event=task_toggle module=repo status={} task_id={task_id} is_done={is_done}",
            if updated { "ok" } else { "noop" }
        );
        Ok(updated)
    }

    /// Fetches one advice text. One round trip, no retry.
    pub async fn fetch_advice(&self) -> Result<Advice, AdviceError> {
        self.advice.fetch_advice().await
    }
}

fn load_members(store: &SharedStore) -> RepoResult<Vec<FamilyMember>> {
    let rows = store.with_conn(|conn| SqliteFamilyRepository::new(conn).list_members_with_tasks())?;
    rows.into_iter().map(member_from_row).collect()
}

fn member_from_row(row: MemberWithTasks) -> RepoResult<FamilyMember> {
    let tasks = row
        .tasks
        .into_iter()
        .map(task_from_row)
        .collect::<RepoResult<Vec<_>>>()?;
    Ok(FamilyMember {
        id: row.member.id,
        name: row.member.name,
        tasks,
    })
}

fn task_from_row(row: TaskRow) -> RepoResult<Task> {
    Ok(Task {
        id: row.id,
        title: row.title,
        deadline: from_epoch_millis(row.deadline_ms)?,
        is_done: row.is_done,
        completed_at: row.completed_at_ms.map(from_epoch_millis).transpose()?,
    })
}
