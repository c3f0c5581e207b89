//! In-memory board store.
//!
//! All state lives inside the store instance behind one `RwLock`, so each
//! operation (including relocation) is atomic with respect to every other.
//! Cloning the store shares the same state.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{BoardStore, StoreError, StoreResult, UpdateTask};
use crate::models::{
    Board, BoardList, CreateBoard, CreateList, CreateTask, CreateUser, EntityKind, Task, TaskMove,
    User,
};
use crate::relocation::relocate;

/// Thread-safe in-memory store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    boards: HashMap<Uuid, Board>,
    lists: HashMap<Uuid, BoardList>,
    tasks: HashMap<Uuid, Task>,
    /// Board ids in creation order
    board_order: Vec<Uuid>,
}

impl InMemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|err| StoreError::Poisoned(err.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|err| StoreError::Poisoned(err.to_string()))
    }
}

impl MemoryState {
    fn remove_list_cascade(&mut self, list_id: Uuid) -> Option<BoardList> {
        let list = self.lists.remove(&list_id)?;
        for task_id in &list.task_ids {
            self.tasks.remove(task_id);
        }
        // Tasks whose id went missing from the sequence still belong to the list
        self.tasks.retain(|_, task| task.list_id != list_id);
        Some(list)
    }
}

#[async_trait]
impl BoardStore for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.username == data.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                data.username
            )));
        }

        let user = User::new(data);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.read()?;
        Ok(state
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_board(&self, data: CreateBoard) -> StoreResult<Board> {
        let mut state = self.write()?;
        let board = Board::new(data);
        state.board_order.push(board.id);
        state.boards.insert(board.id, board.clone());
        Ok(board)
    }

    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>> {
        Ok(self.read()?.boards.get(&id).cloned())
    }

    async fn boards_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Board>> {
        let state = self.read()?;
        Ok(state
            .board_order
            .iter()
            .filter_map(|id| state.boards.get(id))
            .filter(|board| board.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn rename_board(&self, id: Uuid, title: &str) -> StoreResult<Option<Board>> {
        let mut state = self.write()?;
        Ok(state.boards.get_mut(&id).map(|board| {
            board.title = title.to_string();
            board.updated_at = Utc::now();
            board.clone()
        }))
    }

    async fn delete_board(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;
        let Some(board) = state.boards.remove(&id) else {
            return Ok(false);
        };

        state.board_order.retain(|board_id| *board_id != id);

        let mut list_ids = board.list_ids.clone();
        list_ids.extend(
            state
                .lists
                .values()
                .filter(|list| list.board_id == id && !board.list_ids.contains(&list.id))
                .map(|list| list.id),
        );
        for list_id in list_ids {
            state.remove_list_cascade(list_id);
        }

        Ok(true)
    }

    async fn create_list(&self, data: CreateList) -> StoreResult<BoardList> {
        let mut state = self.write()?;
        let board = state
            .boards
            .get_mut(&data.board_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Board, data.board_id))?;

        let list = BoardList::new(data);
        board.list_ids.push(list.id);
        board.updated_at = Utc::now();
        state.lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn find_list(&self, id: Uuid) -> StoreResult<Option<BoardList>> {
        Ok(self.read()?.lists.get(&id).cloned())
    }

    async fn find_lists(&self, ids: &[Uuid]) -> StoreResult<Vec<BoardList>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.lists.get(id).cloned())
            .collect())
    }

    async fn rename_list(&self, id: Uuid, title: &str) -> StoreResult<Option<BoardList>> {
        let mut state = self.write()?;
        Ok(state.lists.get_mut(&id).map(|list| {
            list.title = title.to_string();
            list.updated_at = Utc::now();
            list.clone()
        }))
    }

    async fn delete_list(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;
        let Some(list) = state.remove_list_cascade(id) else {
            return Ok(false);
        };

        if let Some(board) = state.boards.get_mut(&list.board_id) {
            board.list_ids.retain(|list_id| *list_id != id);
            board.updated_at = Utc::now();
        }

        Ok(true)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut state = self.write()?;
        let list = state
            .lists
            .get_mut(&data.list_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::List, data.list_id))?;

        let task = Task::new(data);
        list.task_ids.push(task.id);
        list.updated_at = Utc::now();
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn find_tasks(&self, ids: &[Uuid]) -> StoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.tasks.get(id).cloned())
            .collect())
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        let mut state = self.write()?;
        Ok(state.tasks.get_mut(&id).map(|task| {
            if let Some(title) = data.title {
                task.title = title;
            }
            if let Some(completed) = data.completed {
                task.completed = completed;
            }
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn toggle_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let mut state = self.write()?;
        Ok(state.tasks.get_mut(&id).map(|task| {
            task.completed = !task.completed;
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;
        let Some(task) = state.tasks.remove(&id) else {
            return Ok(false);
        };

        if let Some(list) = state.lists.get_mut(&task.list_id) {
            list.task_ids.retain(|task_id| *task_id != id);
            list.updated_at = Utc::now();
        }

        Ok(true)
    }

    async fn relocate_task(
        &self,
        task_id: Uuid,
        dest_list_id: Uuid,
        index: i64,
    ) -> StoreResult<TaskMove> {
        let mut state = self.write()?;
        let state = &mut *state;

        let source_list_id = state
            .tasks
            .get(&task_id)
            .map(|task| task.list_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, task_id))?;

        if !state.lists.contains_key(&dest_list_id) {
            return Err(StoreError::not_found(EntityKind::List, dest_list_id));
        }

        let now = Utc::now();
        let position = if source_list_id == dest_list_id {
            let list = state
                .lists
                .get_mut(&dest_list_id)
                .ok_or_else(|| StoreError::not_found(EntityKind::List, dest_list_id))?;
            let position = relocate(&mut list.task_ids, None, task_id, index);
            list.updated_at = now;
            position
        } else {
            // A source list that vanished leaves nothing to detach from
            let mut source_ids = state
                .lists
                .get(&source_list_id)
                .map(|list| list.task_ids.clone())
                .unwrap_or_default();
            let dest = state
                .lists
                .get_mut(&dest_list_id)
                .ok_or_else(|| StoreError::not_found(EntityKind::List, dest_list_id))?;
            let position = relocate(&mut source_ids, Some(&mut dest.task_ids), task_id, index);
            dest.updated_at = now;

            if let Some(source) = state.lists.get_mut(&source_list_id) {
                source.task_ids = source_ids;
                source.updated_at = now;
            }
            position
        };

        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, task_id))?;
        task.list_id = dest_list_id;
        task.updated_at = now;

        Ok(TaskMove {
            task: task.clone(),
            from_list_id: source_list_id,
            to_list_id: dest_list_id,
            position,
        })
    }
}
