//! Game logic: identities, entity ids and multiplayer world synchronization.

pub mod entity_id;
pub mod error;
pub mod identity;
pub mod multiplayer;
pub mod peers;
pub mod worlds;

pub use entity_id::EntityAllocator;
pub use error::{AllocError, RegistryError, SyncError};
pub use identity::{Identity, JoinMode, Rank, SessionId};
pub use multiplayer::{EditOutcome, MultiplayerWorld, PreparedJoin, WorldPolicy};
pub use peers::Peers;
pub use worlds::Worlds;
