/// Persistence port for boards, lists and tasks
///
/// `BoardStore` is the only shared state in the system. Operations are simple
/// id-based lookups plus a handful of multi-record writes that each adapter
/// applies atomically:
///
/// - creating a list or task also appends its id to the parent's sequence
/// - deleting a list or task also detaches its id from the parent's sequence
/// - deleting a board or list cascades to its children
/// - relocating a task rewrites both lists and the task's reference together
///
/// # Adapters
///
/// - [`memory::InMemoryStore`]: owned process state behind a lock
/// - [`postgres::PgStore`]: PostgreSQL via sqlx
///
/// # Example
///
/// ```
/// use taskboard_shared::models::{CreateBoard, CreateUser};
/// use taskboard_shared::store::{memory::InMemoryStore, BoardStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryStore::new();
/// let user = store
///     .create_user(CreateUser {
///         username: "admin".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     })
///     .await?;
///
/// let board = store
///     .create_board(CreateBoard { user_id: user.id, title: "Roadmap".to_string() })
///     .await?;
/// assert!(board.list_ids.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Board, BoardList, CreateBoard, CreateList, CreateTask, CreateUser, EntityKind, Task, TaskMove,
    User,
};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store adapters
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A referenced record does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    /// A uniqueness constraint was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// In-memory state lock was poisoned by a panicking writer
    #[error("Store lock poisoned: {0}")]
    Poisoned(String),
}

impl StoreError {
    pub fn not_found(kind: EntityKind, id: Uuid) -> Self {
        StoreError::NotFound { kind, id }
    }
}

/// Partial update for a task; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

/// Persistence contract for the board tree
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Checks that the backing store is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Stores a new user
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the username is taken.
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Stores a new board with an empty list sequence
    async fn create_board(&self, data: CreateBoard) -> StoreResult<Board>;

    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>>;

    /// Returns all boards owned by a user, oldest first
    async fn boards_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Board>>;

    /// Replaces a board's title; `None` if the board does not exist
    async fn rename_board(&self, id: Uuid, title: &str) -> StoreResult<Option<Board>>;

    /// Deletes a board with all of its lists and their tasks
    ///
    /// Returns false if the board did not exist.
    async fn delete_board(&self, id: Uuid) -> StoreResult<bool>;

    /// Stores a new list and appends it to its board's sequence
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the board does not exist.
    async fn create_list(&self, data: CreateList) -> StoreResult<BoardList>;

    async fn find_list(&self, id: Uuid) -> StoreResult<Option<BoardList>>;

    /// Loads the given lists in no particular order; unknown ids are skipped
    async fn find_lists(&self, ids: &[Uuid]) -> StoreResult<Vec<BoardList>>;

    async fn rename_list(&self, id: Uuid, title: &str) -> StoreResult<Option<BoardList>>;

    /// Detaches a list from its board and deletes it with its tasks
    async fn delete_list(&self, id: Uuid) -> StoreResult<bool>;

    /// Stores a new task and appends it to its list's sequence
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the list does not exist.
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Loads the given tasks in no particular order; unknown ids are skipped
    async fn find_tasks(&self, ids: &[Uuid]) -> StoreResult<Vec<Task>>;

    /// Applies a partial update; identity and ordering are never touched
    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>>;

    /// Flips a task's completion flag in a single write
    async fn toggle_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Detaches a task from its list and deletes it
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    /// Moves a task into `dest_list_id` at `index` (clamped)
    ///
    /// The task's current `list_id` is used as the source. Removal from the
    /// source, insertion into the destination and the task's new reference are
    /// applied as one unit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the task or the destination list
    /// does not exist.
    async fn relocate_task(
        &self,
        task_id: Uuid,
        dest_list_id: Uuid,
        index: i64,
    ) -> StoreResult<TaskMove>;
}
