/// Ownership checks for boards, lists and tasks
///
/// Every board belongs to one user. Lists and tasks have no owner column of
/// their own; their owner is found by walking the parent links:
///
/// ```text
/// Task -> List -> Board -> User
/// ```
///
/// A broken link anywhere along the chain means the entity has no owner and
/// is treated as missing.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::{require_owner, EntityRef};
/// use taskboard_shared::store::BoardStore;
/// use uuid::Uuid;
///
/// async fn check(store: &dyn BoardStore, user_id: Uuid, list_id: Uuid) -> bool {
///     require_owner(store, user_id, EntityRef::List(list_id)).await.is_ok()
/// }
/// ```

use tracing::warn;
use uuid::Uuid;

use crate::models::EntityKind;
use crate::store::{BoardStore, StoreError};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Entity is missing or belongs to someone else
    #[error("Not authorized to access this {0}")]
    NotAuthorized(EntityKind),

    /// Store failed while walking the ownership chain
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A reference to an entity whose owner can be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Board(Uuid),
    List(Uuid),
    Task(Uuid),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Board(_) => EntityKind::Board,
            EntityRef::List(_) => EntityKind::List,
            EntityRef::Task(_) => EntityKind::Task,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            EntityRef::Board(id) | EntityRef::List(id) | EntityRef::Task(id) => *id,
        }
    }
}

/// Result of walking the ownership chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerLookup {
    Found(Uuid),
    NotFound,
}

/// Resolves the user that transitively owns `entity`
///
/// # Errors
///
/// Only store failures are errors; a missing link is `OwnerLookup::NotFound`.
pub async fn resolve_owner(
    store: &dyn BoardStore,
    entity: EntityRef,
) -> Result<OwnerLookup, StoreError> {
    let board_id = match entity {
        EntityRef::Board(id) => id,
        EntityRef::List(id) => match store.find_list(id).await? {
            Some(list) => list.board_id,
            None => return Ok(OwnerLookup::NotFound),
        },
        EntityRef::Task(id) => {
            let Some(task) = store.find_task(id).await? else {
                return Ok(OwnerLookup::NotFound);
            };
            match store.find_list(task.list_id).await? {
                Some(list) => list.board_id,
                None => return Ok(OwnerLookup::NotFound),
            }
        }
    };

    Ok(match store.find_board(board_id).await? {
        Some(board) => OwnerLookup::Found(board.user_id),
        None => OwnerLookup::NotFound,
    })
}

/// Requires that `user_id` owns `entity`
///
/// Missing and foreign entities produce the same error; only the log line
/// tells them apart.
///
/// # Errors
///
/// Returns `AuthzError::NotAuthorized` with the entity's kind, or
/// `AuthzError::Store` if the lookup failed.
pub async fn require_owner(
    store: &dyn BoardStore,
    user_id: Uuid,
    entity: EntityRef,
) -> Result<(), AuthzError> {
    match resolve_owner(store, entity).await? {
        OwnerLookup::Found(owner) if owner == user_id => Ok(()),
        OwnerLookup::Found(owner) => {
            warn!(
                user_id = %user_id,
                owner_id = %owner,
                kind = entity.kind().as_str(),
                entity_id = %entity.id(),
                "Access to foreign entity denied"
            );
            Err(AuthzError::NotAuthorized(entity.kind()))
        }
        OwnerLookup::NotFound => {
            warn!(
                user_id = %user_id,
                kind = entity.kind().as_str(),
                entity_id = %entity.id(),
                "Access to missing entity denied"
            );
            Err(AuthzError::NotAuthorized(entity.kind()))
        }
    }
}
