//! Authoritative membership and edit broadcasting for one world.
//!
//! Every mutation happens on the caller's task and is turned into packets
//! for the other members through [`Peers`]. Nothing here blocks or locks.

use std::collections::{BTreeMap, BTreeSet};

use mcc_rs_proto::compression;
use mcc_rs_proto::extension::Extension;
use mcc_rs_proto::packets::{
    BulkBlockUpdate, DespawnPlayer, HackControl, LevelDataChunk, LevelFinalize, MakeSelection,
    PositionAndOrientation, RemoveBlockDefinition, RemoveSelection, SelectionColor, ServerPacket,
    SetBlock, SpawnPlayer,
};
use mcc_rs_proto::types::{BlockPos, EntityId, Orientation, PlayerPos};
use mcc_rs_world::{block, BlockDefinition, BlockDefinitions, World, WorldError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::entity_id::EntityAllocator;
use crate::error::SyncError;
use crate::identity::{Identity, JoinMode, Rank, SessionId};
use crate::peers::Peers;

/// Who may enter and edit a world, and how many at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldPolicy {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub join_rank: Rank,
    #[serde(default)]
    pub build_rank: Rank,
}

fn default_capacity() -> usize {
    32
}

impl Default for WorldPolicy {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            join_rank: Rank::Guest,
            build_rank: Rank::Guest,
        }
    }
}

/// A session currently in the world.
#[derive(Debug, Clone)]
pub struct Member {
    pub identity: Identity,
    pub entity_id: EntityId,
    pub mode: JoinMode,
    pub position: PlayerPos,
    pub orientation: Orientation,
    selections: BTreeSet<u8>,
}

/// A checked join whose level is ready to stream.
#[derive(Debug)]
pub struct PreparedJoin {
    identity: Identity,
    level: Vec<u8>,
}

impl Member {
    pub fn is_participant(&self) -> bool {
        self.mode == JoinMode::Participant
    }

    fn spawn_packet(&self) -> ServerPacket {
        ServerPacket::SpawnPlayer(SpawnPlayer {
            entity_id: self.entity_id,
            name: self.identity.name.clone(),
            position: self.position,
            orientation: self.orientation,
        })
    }
}

/// What happened to a single-block edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Stored and broadcast.
    Applied,
    /// Stored; broadcast deferred until the bulk edit finalizes.
    Queued,
    /// Block already had that value.
    Unchanged,
    /// Refused; the requester was sent the authoritative block.
    Denied,
}

/// Updates collected during a bulk edit, in first-issue order.
#[derive(Debug, Default)]
struct PendingEdits {
    updates: Vec<(u32, u8)>,
    slots: BTreeMap<u32, usize>,
}

impl PendingEdits {
    fn push(&mut self, index: u32, block: u8) {
        match self.slots.get(&index) {
            Some(&slot) => self.updates[slot].1 = block,
            None => {
                self.slots.insert(index, self.updates.len());
                self.updates.push((index, block));
            }
        }
    }
}

pub struct MultiplayerWorld {
    name: String,
    world: World,
    definitions: BlockDefinitions,
    members: BTreeMap<SessionId, Member>,
    entities: EntityAllocator,
    policy: WorldPolicy,
    locked: bool,
    hacks: HackControl,
    pending: Option<PendingEdits>,
    compression_level: u32,
}

impl MultiplayerWorld {
    pub fn new(name: impl Into<String>, world: World, policy: WorldPolicy) -> Result<Self, SyncError> {
        Ok(Self {
            name: name.into(),
            world,
            definitions: BlockDefinitions::default(),
            members: BTreeMap::new(),
            entities: EntityAllocator::new(policy.capacity)?,
            policy,
            locked: false,
            hacks: HackControl::default(),
            pending: None,
            compression_level: compression::DEFAULT_LEVEL,
        })
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn definitions(&self) -> &BlockDefinitions {
        &self.definitions
    }

    pub fn policy(&self) -> WorldPolicy {
        self.policy
    }

    pub fn member(&self, session: SessionId) -> Option<&Member> {
        self.members.get(&session)
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn entities(&self) -> &EntityAllocator {
        &self.entities
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_bulk_active(&self) -> bool {
        self.pending.is_some()
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Checks a join without side effects, in the order `join` applies them.
    pub fn check_join(&self, identity: &Identity) -> Result<(), SyncError> {
        if identity.rank < self.policy.join_rank {
            return Err(SyncError::PermissionDenied {
                required: self.policy.join_rank,
            });
        }
        if self.members.len() >= self.entities.capacity() {
            return Err(SyncError::WorldFull {
                capacity: self.entities.capacity(),
            });
        }
        if self.members.contains_key(&identity.session) {
            return Err(SyncError::AlreadyMember(identity.session));
        }
        Ok(())
    }

    /// Run the join checks and compress the level for the joiner's client.
    ///
    /// Nothing changes until the result is passed to
    /// [`join_prepared`](Self::join_prepared).
    pub fn prepare_join(&self, peers: &impl Peers, identity: &Identity) -> Result<PreparedJoin, SyncError> {
        self.check_join(identity)?;
        let view = peers.client_blocks(identity.session);
        let blocks = view.translate_all(self.world.blocks(), &self.definitions);
        let level = compression::compress_level(&blocks, self.compression_level)?;
        Ok(PreparedJoin {
            identity: identity.clone(),
            level,
        })
    }

    /// Add `identity` to the world and bring its client up to date.
    ///
    /// The joiner receives the level, its own avatar and every participant.
    /// Existing participants receive the joiner only if it participates.
    pub fn join(
        &mut self,
        peers: &mut impl Peers,
        identity: &Identity,
        mode: JoinMode,
    ) -> Result<EntityId, SyncError> {
        let prepared = self.prepare_join(&*peers, identity)?;
        self.join_prepared(peers, prepared, mode)
    }

    /// Finish a join started with [`prepare_join`](Self::prepare_join).
    ///
    /// The checks are repeated, since membership may have changed since.
    pub fn join_prepared(
        &mut self,
        peers: &mut impl Peers,
        prepared: PreparedJoin,
        mode: JoinMode,
    ) -> Result<EntityId, SyncError> {
        let PreparedJoin { identity, level } = prepared;
        self.check_join(&identity)?;
        let who = identity.session;

        let entity_id = self.entities.allocate()?;
        let member = Member {
            identity,
            entity_id,
            mode,
            position: PlayerPos::from_block(self.world.spawn()),
            orientation: Orientation::default(),
            selections: BTreeSet::new(),
        };

        self.send_level(peers, who, &level);
        if peers.supports(who, Extension::HackControl) {
            peers.send(who, &ServerPacket::HackControl(self.hacks));
        }
        peers.send(
            who,
            &ServerPacket::SpawnPlayer(SpawnPlayer {
                entity_id: EntityId::SELF,
                name: member.identity.name.clone(),
                position: member.position,
                orientation: member.orientation,
            }),
        );

        let joiner_spawn = member.spawn_packet();
        for other in self.members.values().filter(|m| m.is_participant()) {
            peers.send(who, &other.spawn_packet());
            if mode == JoinMode::Participant {
                peers.send(other.identity.session, &joiner_spawn);
            }
        }

        debug!(
            world = %self.name,
            player = %member.identity.name,
            %entity_id,
            ?mode,
            "Joined world"
        );
        self.members.insert(who, member);
        Ok(entity_id)
    }

    fn send_level(&self, peers: &mut impl Peers, who: SessionId, compressed: &[u8]) {
        if peers.supports(who, Extension::BlockDefinitions) {
            for def in self.definitions.iter() {
                peers.send(who, &ServerPacket::DefineBlock(def.to_packet()));
            }
        }
        peers.send(who, &ServerPacket::LevelInitialize);
        for chunk in LevelDataChunk::split(compressed) {
            peers.send(who, &ServerPacket::LevelDataChunk(chunk));
        }
        let dims = self.world.dimensions();
        peers.send(
            who,
            &ServerPacket::LevelFinalize(LevelFinalize {
                x: dims.x,
                y: dims.y,
                z: dims.z,
            }),
        );
    }

    /// Remove a member, release its entity id and tidy up its client.
    pub fn leave(&mut self, peers: &mut impl Peers, session: SessionId) -> Result<Member, SyncError> {
        let member = self
            .members
            .remove(&session)
            .ok_or(SyncError::NotMember(session))?;

        let released = self.entities.release(member.entity_id);
        debug_assert!(released.is_ok(), "entity id pool out of sync: {released:?}");
        if let Err(e) = released {
            error!(world = %self.name, player = %member.identity.name, "Entity id release failed: {e}");
        }

        let despawn = ServerPacket::DespawnPlayer(DespawnPlayer {
            entity_id: member.entity_id,
        });
        for other in self.members.values().filter(|m| m.is_participant()) {
            if member.is_participant() {
                peers.send(other.identity.session, &despawn);
            }
            peers.send(
                session,
                &ServerPacket::DespawnPlayer(DespawnPlayer {
                    entity_id: other.entity_id,
                }),
            );
        }

        if peers.supports(session, Extension::HackControl) {
            peers.send(session, &ServerPacket::HackControl(HackControl::default()));
        }
        if peers.supports(session, Extension::SelectionCuboid) {
            for &selection_id in &member.selections {
                peers.send(
                    session,
                    &ServerPacket::RemoveSelection(RemoveSelection { selection_id }),
                );
            }
        }

        debug!(world = %self.name, player = %member.identity.name, "Left world");
        Ok(member)
    }

    /// Record a member's new position and show it to other participants.
    pub fn update_position(
        &mut self,
        peers: &mut impl Peers,
        session: SessionId,
        position: PlayerPos,
        orientation: Orientation,
    ) -> Result<(), SyncError> {
        let member = self
            .members
            .get_mut(&session)
            .ok_or(SyncError::NotMember(session))?;
        member.position = position;
        member.orientation = orientation;
        if !member.is_participant() {
            return Ok(());
        }

        let packet = ServerPacket::Position(PositionAndOrientation {
            entity_id: member.entity_id,
            position,
            orientation,
        });
        for other in self.members.values() {
            if other.identity.session != session && other.is_participant() {
                peers.send(other.identity.session, &packet);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Block edits
    // -----------------------------------------------------------------------

    /// Apply a member's block edit.
    ///
    /// Denied edits (rank below the build rank, locked world, unknown block,
    /// out of bounds) leave the world untouched; the requester alone is sent
    /// the block it should be seeing.
    pub fn set_block(
        &mut self,
        peers: &mut impl Peers,
        session: SessionId,
        pos: BlockPos,
        block: u8,
    ) -> Result<EditOutcome, SyncError> {
        let rank = self
            .members
            .get(&session)
            .ok_or(SyncError::NotMember(session))?
            .identity
            .rank;

        let Some(current) = self.world.get(pos) else {
            debug!(world = %self.name, %session, %pos, "Edit outside world ignored");
            return Ok(EditOutcome::Denied);
        };

        if rank < self.policy.build_rank
            || self.locked
            || !block::is_placeable(block, &self.definitions)
        {
            let shown = peers.client_blocks(session).translate(current, &self.definitions);
            peers.send(
                session,
                &ServerPacket::SetBlock(SetBlock {
                    position: pos,
                    block: shown,
                }),
            );
            return Ok(EditOutcome::Denied);
        }

        if current == block {
            return Ok(EditOutcome::Unchanged);
        }
        self.apply(peers, pos, block, Some(session))
    }

    /// Server-side edit with no permission check; every member is told.
    pub fn place_block(
        &mut self,
        peers: &mut impl Peers,
        pos: BlockPos,
        block: u8,
    ) -> Result<EditOutcome, SyncError> {
        if !block::is_placeable(block, &self.definitions) {
            return Err(WorldError::UnknownBlock(block).into());
        }
        let current = self.world.get(pos).ok_or(WorldError::OutOfBounds(pos))?;
        if current == block {
            return Ok(EditOutcome::Unchanged);
        }
        self.apply(peers, pos, block, None)
    }

    fn apply(
        &mut self,
        peers: &mut impl Peers,
        pos: BlockPos,
        block: u8,
        except: Option<SessionId>,
    ) -> Result<EditOutcome, SyncError> {
        let index = self
            .world
            .dimensions()
            .index(pos)
            .ok_or(WorldError::OutOfBounds(pos))?;
        self.world.set(pos, block)?;

        if let Some(pending) = self.pending.as_mut() {
            pending.push(index as u32, block);
            return Ok(EditOutcome::Queued);
        }

        for &id in self.members.keys() {
            if Some(id) == except {
                continue;
            }
            let shown = peers.client_blocks(id).translate(block, &self.definitions);
            peers.send(
                id,
                &ServerPacket::SetBlock(SetBlock {
                    position: pos,
                    block: shown,
                }),
            );
        }
        trace!(world = %self.name, %pos, block, "Block set");
        Ok(EditOutcome::Applied)
    }

    pub fn begin_bulk_edit(&mut self) -> Result<(), SyncError> {
        if self.pending.is_some() {
            return Err(SyncError::BulkEditActive);
        }
        self.pending = Some(PendingEdits::default());
        Ok(())
    }

    /// Flush queued edits to every member. Returns how many blocks changed.
    pub fn finalize_bulk_edit(&mut self, peers: &mut impl Peers) -> Result<usize, SyncError> {
        let pending = self.pending.take().ok_or(SyncError::NoBulkEdit)?;
        let dims = self.world.dimensions();

        for &id in self.members.keys() {
            let view = peers.client_blocks(id);
            let updates: Vec<(u32, u8)> = pending
                .updates
                .iter()
                .map(|&(index, b)| (index, view.translate(b, &self.definitions)))
                .collect();

            if peers.supports(id, Extension::BulkBlockUpdate) {
                for batch in BulkBlockUpdate::batches(&updates) {
                    peers.send(id, &ServerPacket::BulkBlockUpdate(batch));
                }
            } else {
                for &(index, block) in &updates {
                    if let Some(position) = dims.position(index as usize) {
                        peers.send(id, &ServerPacket::SetBlock(SetBlock { position, block }));
                    }
                }
            }
        }

        debug!(world = %self.name, count = pending.updates.len(), "Bulk edit flushed");
        Ok(pending.updates.len())
    }

    /// Fill the cuboid spanned by `a` and `b` (inclusive) as one bulk edit.
    pub fn fill(
        &mut self,
        peers: &mut impl Peers,
        a: BlockPos,
        b: BlockPos,
        block: u8,
    ) -> Result<usize, SyncError> {
        for corner in [a, b] {
            if !self.world.dimensions().contains(corner) {
                return Err(WorldError::OutOfBounds(corner).into());
            }
        }
        if !block::is_placeable(block, &self.definitions) {
            return Err(WorldError::UnknownBlock(block).into());
        }

        self.begin_bulk_edit()?;
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for z in a.z.min(b.z)..=a.z.max(b.z) {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    let pos = BlockPos::new(x, y, z);
                    if self.world.get(pos) != Some(block) {
                        self.apply(peers, pos, block, None)?;
                    }
                }
            }
        }
        self.finalize_bulk_edit(peers)
    }

    // -----------------------------------------------------------------------
    // Extension state
    // -----------------------------------------------------------------------

    pub fn define_block(&mut self, peers: &mut impl Peers, def: BlockDefinition) -> Result<(), SyncError> {
        let packet = ServerPacket::DefineBlock(def.to_packet());
        self.definitions.define(def)?;
        self.send_to_supporting(peers, Extension::BlockDefinitions, &packet);
        Ok(())
    }

    pub fn remove_block_definition(&mut self, peers: &mut impl Peers, id: u8) -> Result<(), SyncError> {
        self.definitions.remove(id)?;
        let packet = ServerPacket::RemoveBlockDefinition(RemoveBlockDefinition { block_id: id });
        self.send_to_supporting(peers, Extension::BlockDefinitions, &packet);
        Ok(())
    }

    pub fn hack_control(&self) -> HackControl {
        self.hacks
    }

    pub fn set_hack_control(&mut self, peers: &mut impl Peers, hacks: HackControl) {
        self.hacks = hacks;
        self.send_to_supporting(peers, Extension::HackControl, &ServerPacket::HackControl(hacks));
    }

    /// Highlight a cuboid for one member. Returns false if its client
    /// cannot show selections.
    #[allow(clippy::too_many_arguments)]
    pub fn make_selection(
        &mut self,
        peers: &mut impl Peers,
        session: SessionId,
        selection_id: u8,
        label: &str,
        start: BlockPos,
        end: BlockPos,
        color: SelectionColor,
    ) -> Result<bool, SyncError> {
        let member = self
            .members
            .get_mut(&session)
            .ok_or(SyncError::NotMember(session))?;
        if !peers.supports(session, Extension::SelectionCuboid) {
            return Ok(false);
        }
        member.selections.insert(selection_id);
        peers.send(
            session,
            &ServerPacket::MakeSelection(MakeSelection {
                selection_id,
                label: label.to_string(),
                start,
                end,
                color,
            }),
        );
        Ok(true)
    }

    pub fn remove_selection(
        &mut self,
        peers: &mut impl Peers,
        session: SessionId,
        selection_id: u8,
    ) -> Result<bool, SyncError> {
        let member = self
            .members
            .get_mut(&session)
            .ok_or(SyncError::NotMember(session))?;
        if !member.selections.remove(&selection_id) {
            return Ok(false);
        }
        peers.send(
            session,
            &ServerPacket::RemoveSelection(RemoveSelection { selection_id }),
        );
        Ok(true)
    }

    fn send_to_supporting(&self, peers: &mut impl Peers, ext: Extension, packet: &ServerPacket) {
        for &id in self.members.keys() {
            if peers.supports(id, ext) {
                peers.send(id, packet);
            }
        }
    }
}
