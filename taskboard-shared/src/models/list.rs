/// List model
///
/// A list belongs to one board and holds an ordered array of task ids.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE lists (
///     id UUID PRIMARY KEY,
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     task_ids UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::Task;

/// List record as persisted
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BoardList {
    /// Unique list ID
    pub id: Uuid,

    /// Owning board
    pub board_id: Uuid,

    /// Display title
    pub title: String,

    /// Task ids in display order
    pub task_ids: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new list
#[derive(Debug, Clone)]
pub struct CreateList {
    pub board_id: Uuid,
    pub title: String,
}

impl BoardList {
    /// Builds a new, empty list record with a fresh id
    pub fn new(data: CreateList) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            board_id: data.board_id,
            title: data.title,
            task_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Resolves this list against a set of loaded tasks
    ///
    /// Tasks appear in `task_ids` order; ids with no loaded task are skipped.
    pub fn resolve(&self, tasks: &[Task]) -> ListView {
        let tasks = self
            .task_ids
            .iter()
            .filter_map(|id| tasks.iter().find(|task| task.id == *id).cloned())
            .collect();

        ListView {
            id: self.id,
            title: self.title.clone(),
            board_id: self.board_id,
            tasks,
        }
    }
}

/// List with its tasks resolved, in display order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub id: Uuid,
    pub title: String,
    pub board_id: Uuid,
    pub tasks: Vec<Task>,
}
