use mcc_rs_proto::error::ProtoError;
use mcc_rs_proto::types::EntityId;
use mcc_rs_world::WorldError;

use crate::identity::{Rank, SessionId};

/// Entity id pool misuse.
#[derive(Debug, thiserror::Error)]
pub enum AllocError {
    #[error("no free entity id (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("entity id {0} is not assigned")]
    NotAssigned(EntityId),

    #[error("capacity {0} is outside 1..=127")]
    InvalidCapacity(usize),
}

/// Errors from world membership and editing.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("you need rank {required} to join this world")]
    PermissionDenied { required: Rank },

    #[error("world is full ({capacity} players)")]
    WorldFull { capacity: usize },

    #[error("session {0} is already in this world")]
    AlreadyMember(SessionId),

    #[error("session {0} is not in this world")]
    NotMember(SessionId),

    #[error("a bulk edit is already in progress")]
    BulkEditActive,

    #[error("no bulk edit in progress")]
    NoBulkEdit,

    #[error(transparent)]
    Alloc(#[from] AllocError),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Proto(#[from] ProtoError),
}

impl SyncError {
    /// Policy denials are reported to the requester; everything else ends
    /// the offending connection.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            SyncError::PermissionDenied { .. }
                | SyncError::WorldFull { .. }
                | SyncError::Alloc(AllocError::CapacityExceeded { .. })
        )
    }
}

/// Errors from the world registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no world named '{0}'")]
    UnknownWorld(String),

    #[error("a world named '{0}' already exists")]
    WorldExists(String),

    #[error("invalid world name '{0}'")]
    InvalidName(String),

    #[error("you are already in '{0}'")]
    AlreadyThere(String),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
