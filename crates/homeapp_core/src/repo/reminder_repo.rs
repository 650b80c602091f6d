//! Durable reminder job queue contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist pending one-shot reminder jobs so they survive restarts.
//! - Answer sweep queries (`due`, `next fire time`) for the scheduler loop.
//!
//! # Invariants
//! - `mark_fired` only transitions jobs that are still pending.
//! - Jobs are not tied to task rows; deleting a task leaves its job intact.

use crate::model::reminder::{ReminderJob, ReminderJobId, ReminderJobState};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const JOB_SELECT_SQL: &str = "SELECT
    id,
    taskId,
    title,
    fireAt,
    createdAt,
    state,
    firedAt
FROM reminder_jobs";

/// Repository interface for reminder jobs.
pub trait ReminderJobRepository {
    fn insert_job(&self, job: &ReminderJob) -> RepoResult<()>;
    /// Lists pending jobs ordered by due time.
    fn list_pending(&self) -> RepoResult<Vec<ReminderJob>>;
    /// Lists pending jobs due at `now_ms`, oldest first, at most `limit`.
    fn list_due(&self, now_ms: i64, limit: u32) -> RepoResult<Vec<ReminderJob>>;
    /// Earliest due time among pending jobs.
    fn next_fire_at(&self) -> RepoResult<Option<i64>>;
    /// Returns `false` when the job was missing or already fired.
    fn mark_fired(&self, job_id: ReminderJobId, fired_at_ms: i64) -> RepoResult<bool>;
    /// Deletes fired jobs that fired before `cutoff_ms`.
    fn prune_fired_before(&self, cutoff_ms: i64) -> RepoResult<usize>;
}

/// SQLite-backed reminder job repository.
pub struct SqliteReminderJobRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReminderJobRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_jobs(&self, sql: &str, bind: impl rusqlite::Params) -> RepoResult<Vec<ReminderJob>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut jobs = Vec::new();
        while let Some(row) = rows.next()? {
            jobs.push(parse_job_row(row)?);
        }
        Ok(jobs)
    }
}

impl ReminderJobRepository for SqliteReminderJobRepository<'_> {
    fn insert_job(&self, job: &ReminderJob) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO reminder_jobs (
                id,
                taskId,
                title,
                fireAt,
                createdAt,
                state,
                firedAt
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                job.id.to_string(),
                job.task_id.to_string(),
                job.title.as_str(),
                job.fire_at_ms,
                job.created_at_ms,
                job_state_to_db(job.state),
                job.fired_at_ms,
            ],
        )?;
        Ok(())
    }

    fn list_pending(&self) -> RepoResult<Vec<ReminderJob>> {
        self.query_jobs(
            &format!("{JOB_SELECT_SQL} WHERE state = 'pending' ORDER BY fireAt ASC, rowid ASC;"),
            [],
        )
    }

    fn list_due(&self, now_ms: i64, limit: u32) -> RepoResult<Vec<ReminderJob>> {
        self.query_jobs(
            &format!(
                "{JOB_SELECT_SQL}
                 WHERE state = 'pending'
                   AND fireAt <= ?1
                 ORDER BY fireAt ASC, rowid ASC
                 LIMIT ?2;"
            ),
            params![now_ms, i64::from(limit)],
        )
    }

    fn next_fire_at(&self) -> RepoResult<Option<i64>> {
        let next = self.conn.query_row(
            "SELECT MIN(fireAt) FROM reminder_jobs WHERE state = 'pending';",
            [],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(next)
    }

    fn mark_fired(&self, job_id: ReminderJobId, fired_at_ms: i64) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE reminder_jobs
             SET
                state = 'fired',
                firedAt = ?2
             WHERE id = ?1
               AND state = 'pending';",
            params![job_id.to_string(), fired_at_ms],
        )?;
        Ok(changed > 0)
    }

    fn prune_fired_before(&self, cutoff_ms: i64) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM reminder_jobs WHERE state = 'fired' AND firedAt < ?1;",
            [cutoff_ms],
        )?;
        Ok(removed)
    }
}

fn parse_job_row(row: &Row<'_>) -> RepoResult<ReminderJob> {
    let id_text: String = row.get("id")?;
    let task_text: String = row.get("taskId")?;
    let state_text: String = row.get("state")?;
    let state = parse_job_state(&state_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid job state `{state_text}` in reminder_jobs.state"
        ))
    })?;

    Ok(ReminderJob {
        id: parse_uuid(&id_text, "reminder_jobs.id")?,
        task_id: parse_uuid(&task_text, "reminder_jobs.taskId")?,
        title: row.get("title")?,
        fire_at_ms: row.get("fireAt")?,
        created_at_ms: row.get("createdAt")?,
        state,
        fired_at_ms: row.get("firedAt")?,
    })
}

fn job_state_to_db(state: ReminderJobState) -> &'static str {
    match state {
        ReminderJobState::Pending => "pending",
        ReminderJobState::Fired => "fired",
    }
}

fn parse_job_state(value: &str) -> Option<ReminderJobState> {
    match value {
        "pending" => Some(ReminderJobState::Pending),
        "fired" => Some(ReminderJobState::Fired),
        _ => None,
    }
}
