/// Board operations exposed through the query endpoint
///
/// [`BoardService`] is the single place where the query operations are
/// implemented. Every operation follows the same shape:
///
/// 1. require an authenticated caller
/// 2. require that the caller owns the target (see [`crate::auth::authorization`])
/// 3. call the store
/// 4. return the resolved result
///
/// Entities that do not exist and entities owned by someone else produce the
/// same [`ServiceError::NotFound`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskboard_shared::auth::middleware::AuthContext;
/// use taskboard_shared::auth::password::HashCost;
/// use taskboard_shared::service::BoardService;
/// use taskboard_shared::store::memory::InMemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = BoardService::new(
///     Arc::new(InMemoryStore::new()),
///     "an-example-secret-of-at-least-32-bytes",
/// )
/// .with_hash_cost(HashCost::minimal());
///
/// let session = service.register("alice", "Sup3r$ecret").await?;
/// let auth = AuthContext::from_jwt(session.user.id);
///
/// let board = service.add_board(&auth, "Roadmap").await?;
/// assert_eq!(service.boards(&auth).await?[0].id, board.id);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::authorization::{require_owner, AuthzError, EntityRef};
use crate::auth::jwt::{self, Claims, JwtError};
use crate::auth::middleware::AuthContext;
use crate::auth::password::{self, HashCost, PasswordError};
use crate::models::{
    Board, BoardView, CreateBoard, CreateList, CreateTask, CreateUser, EntityKind, ListView, Task,
    User,
};
use crate::store::{BoardStore, StoreError, UpdateTask};

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Username length bounds, counted in characters after trimming
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;

/// Errors surfaced to callers of [`BoardService`]
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Operation needs a user but the request is anonymous
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Entity is missing or not owned by the caller
    #[error("{0} not found")]
    NotFound(EntityKind),

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Input rejected before reaching the store
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Username already registered
    #[error("Username is already taken")]
    UsernameTaken,

    /// Password hashing or verification failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Token could not be issued
    #[error(transparent)]
    Token(#[from] JwtError),

    /// Store failure
    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, .. } => ServiceError::NotFound(kind),
            other => ServiceError::Store(other),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotAuthorized(kind) => ServiceError::NotFound(kind),
            AuthzError::Store(e) => e.into(),
        }
    }
}

/// Token plus the user it was issued for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

/// Arguments of a task move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTask {
    pub task_id: Uuid,
    /// List the caller believes holds the task; the task's own list wins
    pub source_list_id: Uuid,
    pub dest_list_id: Uuid,
    /// Clamped into `[0, len]` of the destination after removal
    pub new_index: i64,
}

/// Board operations scoped to the calling user
#[derive(Clone)]
pub struct BoardService {
    store: Arc<dyn BoardStore>,
    jwt_secret: Arc<str>,
    token_ttl: Duration,
    hash_cost: HashCost,
}

impl BoardService {
    pub fn new(store: Arc<dyn BoardStore>, jwt_secret: impl Into<String>) -> Self {
        Self {
            store,
            jwt_secret: Arc::from(jwt_secret.into()),
            token_ttl: Duration::hours(jwt::DEFAULT_TTL_HOURS),
            hash_cost: HashCost::default(),
        }
    }

    /// Sets the lifetime of issued tokens
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Sets the Argon2id cost used for new accounts
    pub fn with_hash_cost(mut self, cost: HashCost) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn store(&self) -> &Arc<dyn BoardStore> {
        &self.store
    }

    /// Exchanges a username and password for a token
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidCredentials` for an unknown username or a
    /// wrong password; the two are not distinguished.
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<AuthPayload> {
        let Some(user) = self.store.find_user_by_username(username).await? else {
            warn!(username = %username, "Login attempt for unknown user");
            return Err(ServiceError::InvalidCredentials);
        };

        if !password::verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        self.issue(user)
    }

    /// Creates an account and logs it in
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a username outside 3-50
    /// characters after trimming or a weak password, and
    /// `ServiceError::UsernameTaken` if the name is in use.
    pub async fn register(&self, username: &str, password: &str) -> ServiceResult<AuthPayload> {
        let username = username.trim();
        let length = username.chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&length) {
            return Err(ServiceError::validation(
                "username",
                format!(
                    "Username must be {}-{} characters",
                    USERNAME_MIN_LEN, USERNAME_MAX_LEN
                ),
            ));
        }
        password::validate_password_strength(password)
            .map_err(|message| ServiceError::validation("password", message))?;

        if self.store.find_user_by_username(username).await?.is_some() {
            return Err(ServiceError::UsernameTaken);
        }

        let password_hash = password::hash_password_with(password, self.hash_cost)?;
        let user = self
            .store
            .create_user(CreateUser {
                username: username.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ServiceError::UsernameTaken,
                other => other.into(),
            })?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        self.issue(user)
    }

    /// Returns the calling user, or `None` for anonymous callers
    pub async fn me(&self, auth: &AuthContext) -> ServiceResult<Option<User>> {
        match auth.user_id {
            Some(user_id) => Ok(self.store.find_user(user_id).await?),
            None => Ok(None),
        }
    }

    fn issue(&self, user: User) -> ServiceResult<AuthPayload> {
        let claims = Claims::with_expiration(user.id, self.token_ttl);
        let token = jwt::create_token(&claims, &self.jwt_secret)?;
        Ok(AuthPayload { token, user })
    }

    /// Lists every board of the caller, fully resolved, oldest first
    pub async fn boards(&self, auth: &AuthContext) -> ServiceResult<Vec<BoardView>> {
        let user_id = require_user(auth)?;
        let boards = self.store.boards_for_user(user_id).await?;

        let mut views = Vec::with_capacity(boards.len());
        for board in &boards {
            views.push(self.board_view(board).await?);
        }
        Ok(views)
    }

    pub async fn add_board(&self, auth: &AuthContext, title: &str) -> ServiceResult<BoardView> {
        let user_id = require_user(auth)?;
        let title = normalize_title(title)?;

        let board = self
            .store
            .create_board(CreateBoard { user_id, title })
            .await?;

        info!(user_id = %user_id, board_id = %board.id, "Board created");
        self.board_view(&board).await
    }

    pub async fn update_board(
        &self,
        auth: &AuthContext,
        id: Uuid,
        title: &str,
    ) -> ServiceResult<BoardView> {
        let user_id = require_user(auth)?;
        let title = normalize_title(title)?;
        require_owner(self.store.as_ref(), user_id, EntityRef::Board(id)).await?;

        let board = self
            .store
            .rename_board(id, &title)
            .await?
            .ok_or(ServiceError::NotFound(EntityKind::Board))?;

        info!(user_id = %user_id, board_id = %id, "Board renamed");
        self.board_view(&board).await
    }

    /// Deletes a board with its lists and tasks
    pub async fn delete_board(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<bool> {
        let user_id = require_user(auth)?;
        require_owner(self.store.as_ref(), user_id, EntityRef::Board(id)).await?;

        let deleted = self.store.delete_board(id).await?;
        info!(user_id = %user_id, board_id = %id, deleted, "Board deleted");
        Ok(deleted)
    }

    pub async fn add_list(
        &self,
        auth: &AuthContext,
        board_id: Uuid,
        title: &str,
    ) -> ServiceResult<ListView> {
        let user_id = require_user(auth)?;
        let title = normalize_title(title)?;
        require_owner(self.store.as_ref(), user_id, EntityRef::Board(board_id)).await?;

        let list = self.store.create_list(CreateList { board_id, title }).await?;

        info!(user_id = %user_id, board_id = %board_id, list_id = %list.id, "List created");
        Ok(list.resolve(&[]))
    }

    pub async fn update_list(
        &self,
        auth: &AuthContext,
        id: Uuid,
        title: &str,
    ) -> ServiceResult<ListView> {
        let user_id = require_user(auth)?;
        let title = normalize_title(title)?;
        require_owner(self.store.as_ref(), user_id, EntityRef::List(id)).await?;

        let list = self
            .store
            .rename_list(id, &title)
            .await?
            .ok_or(ServiceError::NotFound(EntityKind::List))?;
        let tasks = self.store.find_tasks(&list.task_ids).await?;

        info!(user_id = %user_id, list_id = %id, "List renamed");
        Ok(list.resolve(&tasks))
    }

    /// Deletes a list with its tasks and detaches it from its board
    pub async fn delete_list(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<bool> {
        let user_id = require_user(auth)?;
        require_owner(self.store.as_ref(), user_id, EntityRef::List(id)).await?;

        let deleted = self.store.delete_list(id).await?;
        info!(user_id = %user_id, list_id = %id, deleted, "List deleted");
        Ok(deleted)
    }

    pub async fn add_task(
        &self,
        auth: &AuthContext,
        list_id: Uuid,
        title: &str,
    ) -> ServiceResult<Task> {
        let user_id = require_user(auth)?;
        let title = normalize_title(title)?;
        require_owner(self.store.as_ref(), user_id, EntityRef::List(list_id)).await?;

        let task = self.store.create_task(CreateTask { list_id, title }).await?;

        info!(user_id = %user_id, list_id = %list_id, task_id = %task.id, "Task created");
        Ok(task)
    }

    /// Replaces a task's title; completion is untouched
    pub async fn update_task(
        &self,
        auth: &AuthContext,
        id: Uuid,
        title: &str,
    ) -> ServiceResult<Task> {
        let user_id = require_user(auth)?;
        let title = normalize_title(title)?;
        require_owner(self.store.as_ref(), user_id, EntityRef::Task(id)).await?;

        let task = self
            .store
            .update_task(
                id,
                UpdateTask {
                    title: Some(title),
                    completed: None,
                },
            )
            .await?
            .ok_or(ServiceError::NotFound(EntityKind::Task))?;

        info!(user_id = %user_id, task_id = %id, "Task renamed");
        Ok(task)
    }

    pub async fn delete_task(&self, auth: &AuthContext, id: Uuid) -> ServiceResult<bool> {
        let user_id = require_user(auth)?;
        require_owner(self.store.as_ref(), user_id, EntityRef::Task(id)).await?;

        let deleted = self.store.delete_task(id).await?;
        info!(user_id = %user_id, task_id = %id, deleted, "Task deleted");
        Ok(deleted)
    }

    pub async fn toggle_task_completion(
        &self,
        auth: &AuthContext,
        task_id: Uuid,
    ) -> ServiceResult<Task> {
        let user_id = require_user(auth)?;
        require_owner(self.store.as_ref(), user_id, EntityRef::Task(task_id)).await?;

        let task = self
            .store
            .toggle_task(task_id)
            .await?
            .ok_or(ServiceError::NotFound(EntityKind::Task))?;

        info!(user_id = %user_id, task_id = %task_id, completed = task.completed, "Task toggled");
        Ok(task)
    }

    /// Moves a task to a position in the same or another list
    ///
    /// Both the task and the destination list must belong to the caller.
    /// Returns every board of the caller after the move.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound(Task)` or `ServiceError::NotFound(List)`
    /// when either side is missing or foreign.
    pub async fn move_task(
        &self,
        auth: &AuthContext,
        args: MoveTask,
    ) -> ServiceResult<Vec<BoardView>> {
        let user_id = require_user(auth)?;
        require_owner(self.store.as_ref(), user_id, EntityRef::Task(args.task_id)).await?;
        require_owner(self.store.as_ref(), user_id, EntityRef::List(args.dest_list_id)).await?;

        let moved = self
            .store
            .relocate_task(args.task_id, args.dest_list_id, args.new_index)
            .await?;

        if moved.from_list_id != args.source_list_id {
            warn!(
                task_id = %args.task_id,
                claimed_source = %args.source_list_id,
                actual_source = %moved.from_list_id,
                "Stale source list on task move"
            );
        }

        info!(
            user_id = %user_id,
            task_id = %args.task_id,
            from_list_id = %moved.from_list_id,
            to_list_id = %moved.to_list_id,
            position = moved.position,
            "Task moved"
        );

        self.boards(auth).await
    }

    async fn board_view(&self, board: &Board) -> ServiceResult<BoardView> {
        let lists = self.store.find_lists(&board.list_ids).await?;
        let task_ids: Vec<Uuid> = lists
            .iter()
            .flat_map(|list| list.task_ids.iter().copied())
            .collect();
        let tasks = self.store.find_tasks(&task_ids).await?;

        let lists = board
            .list_ids
            .iter()
            .filter_map(|id| lists.iter().find(|list| list.id == *id))
            .map(|list| list.resolve(&tasks))
            .collect();

        Ok(BoardView {
            id: board.id,
            title: board.title.clone(),
            user_id: board.user_id,
            lists,
        })
    }
}

fn require_user(auth: &AuthContext) -> ServiceResult<Uuid> {
    auth.user_id.ok_or(ServiceError::NotAuthenticated)
}

/// Trims a title and rejects it if nothing is left
fn normalize_title(title: &str) -> ServiceResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::validation("title", "Title must not be blank"));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Inbox ").unwrap(), "Inbox");
        assert!(matches!(
            normalize_title("   "),
            Err(ServiceError::Validation { ref field, .. }) if field == "title"
        ));
    }

    #[test]
    fn test_authz_error_folds_into_not_found() {
        let err: ServiceError = AuthzError::NotAuthorized(EntityKind::List).into();
        assert!(matches!(err, ServiceError::NotFound(EntityKind::List)));
        assert_eq!(err.to_string(), "List not found");
    }

    #[test]
    fn test_store_not_found_keeps_kind() {
        let err: ServiceError = StoreError::not_found(EntityKind::Board, Uuid::new_v4()).into();
        assert!(matches!(err, ServiceError::NotFound(EntityKind::Board)));

        let err: ServiceError = StoreError::Poisoned("boom".to_string()).into();
        assert!(matches!(err, ServiceError::Store(_)));
    }

    #[test]
    fn test_require_user() {
        assert!(matches!(
            require_user(&AuthContext::anonymous()),
            Err(ServiceError::NotAuthenticated)
        ));

        let user_id = Uuid::new_v4();
        assert_eq!(require_user(&AuthContext::from_jwt(user_id)).unwrap(), user_id);
    }

    #[test]
    fn test_move_task_deserializes_camel_case() {
        let args: MoveTask = serde_json::from_value(serde_json::json!({
            "taskId": Uuid::nil(),
            "sourceListId": Uuid::nil(),
            "destListId": Uuid::nil(),
            "newIndex": -3
        }))
        .unwrap();

        assert_eq!(args.new_index, -3);
    }
}
