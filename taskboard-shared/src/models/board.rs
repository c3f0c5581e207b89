/// Board model
///
/// A board is owned by exactly one user and holds an ordered array of list ids.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id UUID PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     list_ids UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::list::ListView;

/// Board record as persisted
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    /// Unique board ID
    pub id: Uuid,

    /// Owning user; immutable after creation
    pub user_id: Uuid,

    /// Display title
    pub title: String,

    /// List ids in display order
    pub list_ids: Vec<Uuid>,

    /// When the board was created
    pub created_at: DateTime<Utc>,

    /// When the board was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new board
#[derive(Debug, Clone)]
pub struct CreateBoard {
    /// Owning user
    pub user_id: Uuid,

    /// Display title
    pub title: String,
}

impl Board {
    /// Builds a new, empty board record with a fresh id
    pub fn new(data: CreateBoard) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            title: data.title,
            list_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Board with its lists and their tasks resolved, in display order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub id: Uuid,
    pub title: String,
    pub user_id: Uuid,
    pub lists: Vec<ListView>,
}

impl BoardView {
    /// Gets the task ids of every list, in order, keyed by list position
    ///
    /// Mostly useful for asserting arrangements in tests.
    pub fn task_ids(&self) -> Vec<Vec<Uuid>> {
        self.lists
            .iter()
            .map(|list| list.tasks.iter().map(|task| task.id).collect())
            .collect()
    }

    /// Finds a resolved list on this board
    pub fn list(&self, list_id: Uuid) -> Option<&ListView> {
        self.lists.iter().find(|list| list.id == list_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let user_id = Uuid::new_v4();
        let board = Board::new(CreateBoard {
            user_id,
            title: "Roadmap".to_string(),
        });

        assert_eq!(board.user_id, user_id);
        assert_eq!(board.title, "Roadmap");
        assert!(board.list_ids.is_empty());
        assert_eq!(board.created_at, board.updated_at);
    }

    #[test]
    fn test_board_view_serializes_camel_case() {
        let view = BoardView {
            id: Uuid::new_v4(),
            title: "Roadmap".to_string(),
            user_id: Uuid::new_v4(),
            lists: Vec::new(),
        };

        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("userId"));
        assert!(json.contains("\"lists\":[]"));
    }
}
