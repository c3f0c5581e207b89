/// Domain records for Taskboard
///
/// Boards, lists and tasks are independent records linked by id. Ordering is
/// carried by id arrays on the parent (`Board::list_ids`, `BoardList::task_ids`),
/// never by a position column on the child.
///
/// # Models
///
/// - `user`: User accounts (owner at the root of every ownership chain)
/// - `board`: Boards and the fully resolved `BoardView`
/// - `list`: Lists and the resolved `ListView`
/// - `task`: Tasks
///
/// # Example
///
/// ```
/// use taskboard_shared::models::EntityKind;
///
/// assert_eq!(EntityKind::List.to_string(), "List");
/// ```

pub mod board;
pub mod list;
pub mod task;
pub mod user;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use board::{Board, BoardView, CreateBoard};
pub use list::{BoardList, CreateList, ListView};
pub use task::{CreateTask, Task, TaskMove};
pub use user::{CreateUser, User};

/// Kind of entity, used for error reporting and ownership lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Board,
    List,
    Task,
}

impl EntityKind {
    /// Gets kind as a lowercase string (used in log fields)
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Board => "board",
            EntityKind::List => "list",
            EntityKind::Task => "task",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Board => "Board",
            EntityKind::List => "List",
            EntityKind::Task => "Task",
        };
        f.write_str(name)
    }
}
