//! PostgreSQL board store.
//!
//! Ordering lives in `UUID[]` columns (`boards.list_ids`, `lists.task_ids`).
//! Child rows reference their parent with `ON DELETE CASCADE`, so deleting a
//! board or list removes its descendants. Every write that touches more than
//! one row runs in a transaction.
//!
//! # Example
//!
//! ```no_run
//! use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
//! use taskboard_shared::store::{postgres::PgStore, BoardStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig {
//!     url: std::env::var("DATABASE_URL")?,
//!     ..Default::default()
//! })
//! .await?;
//!
//! let store = PgStore::new(pool);
//! store.ping().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{BoardStore, StoreError, StoreResult, UpdateTask};
use crate::db::pool::health_check;
use crate::models::{
    Board, BoardList, CreateBoard, CreateList, CreateTask, CreateUser, EntityKind, Task, TaskMove,
    User,
};
use crate::relocation::relocate;

/// Board store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets the underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique-constraint violations to [`StoreError::Conflict`]
fn conflict_or_database(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if let Some(constraint) = db_err.constraint() {
            return StoreError::Conflict(format!("Constraint violation: {}", constraint));
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl BoardStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let user = User::new(data);

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_or_database)?;

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_board(&self, data: CreateBoard) -> StoreResult<Board> {
        let board = Board::new(data);

        let board = sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (id, user_id, title, list_ids, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, title, list_ids, created_at, updated_at
            "#,
        )
        .bind(board.id)
        .bind(board.user_id)
        .bind(&board.title)
        .bind(&board.list_ids)
        .bind(board.created_at)
        .bind(board.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(board)
    }

    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            SELECT id, user_id, title, list_ids, created_at, updated_at
            FROM boards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(board)
    }

    async fn boards_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Board>> {
        let boards = sqlx::query_as::<_, Board>(
            r#"
            SELECT id, user_id, title, list_ids, created_at, updated_at
            FROM boards
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(boards)
    }

    async fn rename_board(&self, id: Uuid, title: &str) -> StoreResult<Option<Board>> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards
            SET title = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, title, list_ids, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(board)
    }

    async fn delete_board(&self, id: Uuid) -> StoreResult<bool> {
        // lists and tasks go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_list(&self, data: CreateList) -> StoreResult<BoardList> {
        let list = BoardList::new(data);
        let mut tx = self.pool.begin().await?;

        let appended = sqlx::query(
            r#"
            UPDATE boards
            SET list_ids = array_append(list_ids, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(list.board_id)
        .bind(list.id)
        .execute(&mut *tx)
        .await?;

        if appended.rows_affected() == 0 {
            return Err(StoreError::not_found(EntityKind::Board, list.board_id));
        }

        let list = sqlx::query_as::<_, BoardList>(
            r#"
            INSERT INTO lists (id, board_id, title, task_ids, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, board_id, title, task_ids, created_at, updated_at
            "#,
        )
        .bind(list.id)
        .bind(list.board_id)
        .bind(&list.title)
        .bind(&list.task_ids)
        .bind(list.created_at)
        .bind(list.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(list)
    }

    async fn find_list(&self, id: Uuid) -> StoreResult<Option<BoardList>> {
        let list = sqlx::query_as::<_, BoardList>(
            r#"
            SELECT id, board_id, title, task_ids, created_at, updated_at
            FROM lists
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(list)
    }

    async fn find_lists(&self, ids: &[Uuid]) -> StoreResult<Vec<BoardList>> {
        let lists = sqlx::query_as::<_, BoardList>(
            r#"
            SELECT id, board_id, title, task_ids, created_at, updated_at
            FROM lists
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(lists)
    }

    async fn rename_list(&self, id: Uuid, title: &str) -> StoreResult<Option<BoardList>> {
        let list = sqlx::query_as::<_, BoardList>(
            r#"
            UPDATE lists
            SET title = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, board_id, title, task_ids, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(list)
    }

    async fn delete_list(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let board_id: Option<Uuid> =
            sqlx::query_scalar("DELETE FROM lists WHERE id = $1 RETURNING board_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(board_id) = board_id else {
            return Ok(false);
        };

        sqlx::query(
            r#"
            UPDATE boards
            SET list_ids = array_remove(list_ids, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(board_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let task = Task::new(data);
        let mut tx = self.pool.begin().await?;

        let appended = sqlx::query(
            r#"
            UPDATE lists
            SET task_ids = array_append(task_ids, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(task.list_id)
        .bind(task.id)
        .execute(&mut *tx)
        .await?;

        if appended.rows_affected() == 0 {
            return Err(StoreError::not_found(EntityKind::List, task.list_id));
        }

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, list_id, title, completed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, list_id, title, completed, created_at, updated_at
            "#,
        )
        .bind(task.id)
        .bind(task.list_id)
        .bind(&task.title)
        .bind(task.completed)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, list_id, title, completed, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn find_tasks(&self, ids: &[Uuid]) -> StoreResult<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, list_id, title, completed, created_at, updated_at
            FROM tasks
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                completed = COALESCE($3, completed),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, list_id, title, completed, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.completed)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn toggle_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET completed = NOT completed, updated_at = NOW()
            WHERE id = $1
            RETURNING id, list_id, title, completed, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let list_id: Option<Uuid> =
            sqlx::query_scalar("DELETE FROM tasks WHERE id = $1 RETURNING list_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(list_id) = list_id else {
            return Ok(false);
        };

        sqlx::query(
            r#"
            UPDATE lists
            SET task_ids = array_remove(task_ids, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(list_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn relocate_task(
        &self,
        task_id: Uuid,
        dest_list_id: Uuid,
        index: i64,
    ) -> StoreResult<TaskMove> {
        let mut tx = self.pool.begin().await?;

        let source_list_id: Uuid =
            sqlx::query_scalar("SELECT list_id FROM tasks WHERE id = $1 FOR UPDATE")
                .bind(task_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| StoreError::not_found(EntityKind::Task, task_id))?;

        // Lock both lists in id order so opposing moves cannot deadlock
        let lists = sqlx::query_as::<_, BoardList>(
            r#"
            SELECT id, board_id, title, task_ids, created_at, updated_at
            FROM lists
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(vec![source_list_id, dest_list_id])
        .fetch_all(&mut *tx)
        .await?;

        let task_ids_of = |list_id: Uuid| {
            lists
                .iter()
                .find(|list| list.id == list_id)
                .map(|list| list.task_ids.clone())
                .ok_or_else(|| StoreError::not_found(EntityKind::List, list_id))
        };

        let mut dest_ids = task_ids_of(dest_list_id)?;

        let position = if source_list_id == dest_list_id {
            relocate(&mut dest_ids, None, task_id, index)
        } else {
            let mut source_ids = task_ids_of(source_list_id)?;
            let position = relocate(&mut source_ids, Some(&mut dest_ids), task_id, index);

            sqlx::query("UPDATE lists SET task_ids = $2, updated_at = NOW() WHERE id = $1")
                .bind(source_list_id)
                .bind(source_ids)
                .execute(&mut *tx)
                .await?;

            position
        };

        sqlx::query("UPDATE lists SET task_ids = $2, updated_at = NOW() WHERE id = $1")
            .bind(dest_list_id)
            .bind(dest_ids)
            .execute(&mut *tx)
            .await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET list_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, list_id, title, completed, created_at, updated_at
            "#,
        )
        .bind(task_id)
        .bind(dest_list_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            task_id = %task_id,
            from_list_id = %source_list_id,
            to_list_id = %dest_list_id,
            position,
            "Task relocated"
        );

        Ok(TaskMove {
            task,
            from_list_id: source_list_id,
            to_list_id: dest_list_id,
            position,
        })
    }
}
