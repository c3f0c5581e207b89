/// Task model
///
/// Tasks are the leaves of the board tree. A task's `list_id` is the
/// authoritative record of where it lives; the owning list's `task_ids`
/// carries its position.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     list_id UUID NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// List the task currently lives in
    pub list_id: Uuid,

    /// Display title
    pub title: String,

    /// Completion flag
    pub completed: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// New tasks always start out incomplete.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub list_id: Uuid,
    pub title: String,
}

impl Task {
    /// Builds a new task record with a fresh id
    pub fn new(data: CreateTask) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            list_id: data.list_id,
            title: data.title,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of relocating a task
#[derive(Debug, Clone)]
pub struct TaskMove {
    /// Task after the move (`list_id` points at the destination)
    pub task: Task,

    /// List the task was actually taken from
    pub from_list_id: Uuid,

    /// List the task was inserted into
    pub to_list_id: Uuid,

    /// Final position within the destination list
    pub position: usize,
}
