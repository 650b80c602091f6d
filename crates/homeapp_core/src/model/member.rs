//! Family member entity.

use crate::model::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a family member.
pub type MemberId = Uuid;

/// One household member and the tasks they own, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: MemberId,
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl FamilyMember {
    /// Creates a member with a freshly generated identity and no tasks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    /// Returns the owned task with the given id, if any.
    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }
}

/// Finds a task across all members of a snapshot.
pub fn find_task(members: &[FamilyMember], task_id: TaskId) -> Option<&Task> {
    members.iter().find_map(|member| member.task(task_id))
}
