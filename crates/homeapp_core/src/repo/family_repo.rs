//! Member/task record contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide row-level CRUD over `members` and `tasks`.
//! - Own the one-to-many join that nests task rows under member rows.
//! - Own cascade deletion of a member and its tasks.
//!
//! # Invariants
//! - Members and tasks are returned in insertion (`rowid`) order.
//! - `delete_member` removes the member and every task whose `memberId`
//!   matches, inside one immediate transaction, and nothing else.
//! - `insert_task` always stores `isDone=0` and `completedAt=NULL`.

use crate::model::member::MemberId;
use crate::model::task::TaskId;
use crate::repo::{bool_to_int, int_to_bool, parse_uuid, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashMap;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    memberId,
    title,
    deadline,
    isDone,
    completedAt
FROM tasks";

/// Storage shape of a `members` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    pub id: MemberId,
    pub name: String,
}

/// Storage shape of a `tasks` row. Times are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub member_id: MemberId,
    pub title: String,
    pub deadline_ms: i64,
    pub is_done: bool,
    pub completed_at_ms: Option<i64>,
}

/// A member row with its task rows nested in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberWithTasks {
    pub member: MemberRow,
    pub tasks: Vec<TaskRow>,
}

/// Outcome of a cascading member delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberDeletion {
    pub member_removed: bool,
    pub tasks_removed: usize,
}

/// Repository interface for member/task rows.
pub trait FamilyRepository {
    /// Lists every member with nested tasks.
    fn list_members_with_tasks(&self) -> RepoResult<Vec<MemberWithTasks>>;
    /// Gets one task row by id.
    fn get_task(&self, task_id: TaskId) -> RepoResult<Option<TaskRow>>;
    fn insert_member(&self, member: &MemberRow) -> RepoResult<()>;
    /// Deletes one member and all of its tasks atomically.
    fn delete_member(&mut self, member_id: MemberId) -> RepoResult<MemberDeletion>;
    /// Inserts a task as not done, ignoring the status fields of `task`.
    fn insert_task(&self, task: &TaskRow) -> RepoResult<()>;
    /// Returns `false` when no row matched.
    fn delete_task(&self, task_id: TaskId) -> RepoResult<bool>;
    /// Overwrites only `isDone` and `completedAt`. Returns `false` when no
    /// row matched.
    fn update_task_status(
        &self,
        task_id: TaskId,
        is_done: bool,
        completed_at_ms: Option<i64>,
    ) -> RepoResult<bool>;
}

/// SQLite-backed member/task repository.
pub struct SqliteFamilyRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteFamilyRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl FamilyRepository for SqliteFamilyRepository<'_> {
    fn list_members_with_tasks(&self) -> RepoResult<Vec<MemberWithTasks>> {
        let mut members = Vec::new();
        let mut index_by_id: HashMap<MemberId, usize> = HashMap::new();

        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM members ORDER BY rowid ASC;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            let id = parse_uuid(&id_text, "members.id")?;
            index_by_id.insert(id, members.len());
            members.push(MemberWithTasks {
                member: MemberRow {
                    id,
                    name: row.get("name")?,
                },
                tasks: Vec::new(),
            });
        }

        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let task = parse_task_row(row)?;
            // Orphans can only exist if foreign keys were disabled externally.
            if let Some(&index) = index_by_id.get(&task.member_id) {
                members[index].tasks.push(task);
            }
        }

        Ok(members)
    }

    fn get_task(&self, task_id: TaskId) -> RepoResult<Option<TaskRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([task_id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_task_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert_member(&self, member: &MemberRow) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO members (id, name) VALUES (?1, ?2);",
            params![member.id.to_string(), member.name.as_str()],
        )?;
        Ok(())
    }

    fn delete_member(&mut self, member_id: MemberId) -> RepoResult<MemberDeletion> {
        let id_text = member_id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM members WHERE id = ?1;",
                [id_text.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if !exists {
            return Ok(MemberDeletion::default());
        }

        let tasks_removed = tx.execute(
            "DELETE FROM tasks WHERE memberId = ?1;",
            [id_text.as_str()],
        )?;
        let members_removed = tx.execute("DELETE FROM members WHERE id = ?1;", [id_text.as_str()])?;
        tx.commit()?;

        Ok(MemberDeletion {
            member_removed: members_removed > 0,
            tasks_removed,
        })
    }

    fn insert_task(&self, task: &TaskRow) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO tasks (
                id,
                memberId,
                title,
                deadline,
                isDone,
                completedAt
            ) VALUES (?1, ?2, ?3, ?4, 0, NULL);",
            params![
                task.id.to_string(),
                task.member_id.to_string(),
                task.title.as_str(),
                task.deadline_ms,
            ],
        )?;
        Ok(())
    }

    fn delete_task(&self, task_id: TaskId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [task_id.to_string()])?;
        Ok(changed > 0)
    }

    fn update_task_status(
        &self,
        task_id: TaskId,
        is_done: bool,
        completed_at_ms: Option<i64>,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                isDone = ?2,
                completedAt = ?3
             WHERE id = ?1;",
            params![task_id.to_string(), bool_to_int(is_done), completed_at_ms],
        )?;
        Ok(changed > 0)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<TaskRow> {
    let id_text: String = row.get("id")?;
    let member_text: String = row.get("memberId")?;
    Ok(TaskRow {
        id: parse_uuid(&id_text, "tasks.id")?,
        member_id: parse_uuid(&member_text, "tasks.memberId")?,
        title: row.get("title")?,
        deadline_ms: row.get("deadline")?,
        is_done: int_to_bool(row.get("isDone")?, "tasks.isDone")?,
        completed_at_ms: row.get("completedAt")?,
    })
}
