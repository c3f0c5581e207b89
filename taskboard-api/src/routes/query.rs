/// Query endpoint
///
/// Every board operation goes through one endpoint. The body names the
/// operation and carries its variables next to it:
///
/// ```text
/// POST /v1/query
/// Authorization: Bearer <token>   (optional)
///
/// { "operation": "moveTask", "taskId": "...", "sourceListId": "...",
///   "destListId": "...", "newIndex": 0 }
/// ```
///
/// Success responses wrap the operation's result:
///
/// ```json
/// { "data": [ { "id": "...", "title": "Sprint", "userId": "...", "lists": [] } ] }
/// ```
///
/// Failures use the error envelope from [`crate::error`].

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::{BoardView, ListView, Task, User},
    service::{AuthPayload, BoardService, MoveTask},
};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

/// Username and password presented at login
///
/// Only presence is checked; anything else is answered as invalid
/// credentials by the service.
#[derive(Debug, Deserialize, Validate)]
pub struct Login {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Username and password for a new account
#[derive(Debug, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 128, message = "Password must be 1-128 characters"))]
    pub password: String,
}

/// A title for a new board
#[derive(Debug, Deserialize, Validate)]
pub struct NewBoard {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
}

/// A new title for an existing entity
#[derive(Debug, Deserialize, Validate)]
pub struct Rename {
    pub id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ById {
    pub id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewList {
    pub board_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub list_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleTask {
    pub task_id: Uuid,
}

/// One query operation with its variables
#[derive(Debug, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum Operation {
    Login(Login),
    Register(Credentials),
    Me,
    Boards,
    AddBoard(NewBoard),
    UpdateBoard(Rename),
    DeleteBoard(ById),
    AddList(NewList),
    UpdateList(Rename),
    DeleteList(ById),
    AddTask(NewTask),
    UpdateTask(Rename),
    DeleteTask(ById),
    ToggleTaskCompletion(ToggleTask),
    MoveTask(MoveTask),
}

impl Operation {
    /// Operation name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Login(_) => "login",
            Operation::Register(_) => "register",
            Operation::Me => "me",
            Operation::Boards => "boards",
            Operation::AddBoard(_) => "addBoard",
            Operation::UpdateBoard(_) => "updateBoard",
            Operation::DeleteBoard(_) => "deleteBoard",
            Operation::AddList(_) => "addList",
            Operation::UpdateList(_) => "updateList",
            Operation::DeleteList(_) => "deleteList",
            Operation::AddTask(_) => "addTask",
            Operation::UpdateTask(_) => "updateTask",
            Operation::DeleteTask(_) => "deleteTask",
            Operation::ToggleTaskCompletion(_) => "toggleTaskCompletion",
            Operation::MoveTask(_) => "moveTask",
        }
    }

    /// Runs the `validator` rules of the operation's variables
    pub fn validate(&self) -> ApiResult<()> {
        match self {
            Operation::Login(vars) => vars.validate()?,
            Operation::Register(vars) => vars.validate()?,
            Operation::AddBoard(vars) => vars.validate()?,
            Operation::UpdateBoard(vars) | Operation::UpdateList(vars) | Operation::UpdateTask(vars) => {
                vars.validate()?
            }
            Operation::AddList(vars) => vars.validate()?,
            Operation::AddTask(vars) => vars.validate()?,
            Operation::Me
            | Operation::Boards
            | Operation::DeleteBoard(_)
            | Operation::DeleteList(_)
            | Operation::DeleteTask(_)
            | Operation::ToggleTaskCompletion(_)
            | Operation::MoveTask(_) => {}
        }
        Ok(())
    }
}

/// Result of an operation
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryData {
    Auth(AuthPayload),
    User(Option<User>),
    Boards(Vec<BoardView>),
    Board(BoardView),
    List(ListView),
    Task(Task),
    Deleted(bool),
}

/// Success envelope
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub data: QueryData,
}

/// Query handler
///
/// # Errors
///
/// - 400 if the body is not a known operation with well-typed variables
/// - 422 if a variable breaks a validation rule
/// - 401/404/409/500 as mapped from the operation's error
pub async fn execute(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<Operation>, JsonRejection>,
) -> ApiResult<Json<QueryResponse>> {
    let Json(operation) = payload?;
    operation.validate()?;

    debug!(
        operation = operation.name(),
        user_id = ?auth.user_id,
        "Executing query"
    );

    let data = run(&state.service, &auth, operation).await?;
    Ok(Json(QueryResponse { data }))
}

async fn run(
    service: &BoardService,
    auth: &AuthContext,
    operation: Operation,
) -> Result<QueryData, ApiError> {
    let data = match operation {
        Operation::Login(c) => QueryData::Auth(service.login(&c.username, &c.password).await?),
        Operation::Register(c) => {
            QueryData::Auth(service.register(&c.username, &c.password).await?)
        }
        Operation::Me => QueryData::User(service.me(auth).await?),
        Operation::Boards => QueryData::Boards(service.boards(auth).await?),
        Operation::AddBoard(v) => QueryData::Board(service.add_board(auth, &v.title).await?),
        Operation::UpdateBoard(v) => {
            QueryData::Board(service.update_board(auth, v.id, &v.title).await?)
        }
        Operation::DeleteBoard(v) => QueryData::Deleted(service.delete_board(auth, v.id).await?),
        Operation::AddList(v) => {
            QueryData::List(service.add_list(auth, v.board_id, &v.title).await?)
        }
        Operation::UpdateList(v) => {
            QueryData::List(service.update_list(auth, v.id, &v.title).await?)
        }
        Operation::DeleteList(v) => QueryData::Deleted(service.delete_list(auth, v.id).await?),
        Operation::AddTask(v) => QueryData::Task(service.add_task(auth, v.list_id, &v.title).await?),
        Operation::UpdateTask(v) => {
            QueryData::Task(service.update_task(auth, v.id, &v.title).await?)
        }
        Operation::DeleteTask(v) => QueryData::Deleted(service.delete_task(auth, v.id).await?),
        Operation::ToggleTaskCompletion(v) => {
            QueryData::Task(service.toggle_task_completion(auth, v.task_id).await?)
        }
        Operation::MoveTask(args) => QueryData::Boards(service.move_task(auth, args).await?),
    };

    Ok(data)
}
