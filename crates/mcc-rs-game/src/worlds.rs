//! Named worlds and which one each session is in.

use std::collections::{BTreeMap, HashMap};

use mcc_rs_proto::types::EntityId;
use mcc_rs_world::World;
use tracing::{info, warn};

use crate::error::RegistryError;
use crate::identity::{Identity, JoinMode, SessionId};
use crate::multiplayer::{Member, MultiplayerWorld, WorldPolicy};
use crate::peers::Peers;

/// Every loaded world, keyed by lower-cased name.
///
/// Also tracks the single world each session belongs to.
pub struct Worlds {
    worlds: BTreeMap<String, MultiplayerWorld>,
    locations: HashMap<SessionId, String>,
    main: String,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 32
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

impl Worlds {
    /// A registry whose main world is `main`.
    pub fn new(main: MultiplayerWorld) -> Result<Self, RegistryError> {
        if !valid_name(main.name()) {
            return Err(RegistryError::InvalidName(main.name().to_string()));
        }
        let main_key = key(main.name());
        let mut worlds = BTreeMap::new();
        worlds.insert(main_key.clone(), main);
        Ok(Self {
            worlds,
            locations: HashMap::new(),
            main: main_key,
        })
    }

    pub fn main_name(&self) -> &str {
        self.worlds
            .get(&self.main)
            .map_or(self.main.as_str(), |w| w.name())
    }

    pub fn create(&mut self, name: &str, world: World, policy: WorldPolicy) -> Result<&mut MultiplayerWorld, RegistryError> {
        if !valid_name(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        let world = MultiplayerWorld::new(name, world, policy)?;
        self.insert(world)
    }

    /// Register an already built world under its own name.
    pub fn insert(&mut self, world: MultiplayerWorld) -> Result<&mut MultiplayerWorld, RegistryError> {
        if !valid_name(world.name()) {
            return Err(RegistryError::InvalidName(world.name().to_string()));
        }
        let k = key(world.name());
        if self.worlds.contains_key(&k) {
            return Err(RegistryError::WorldExists(world.name().to_string()));
        }
        info!(world = world.name(), "Created world");
        Ok(self.worlds.entry(k).or_insert(world))
    }

    pub fn get(&self, name: &str) -> Option<&MultiplayerWorld> {
        self.worlds.get(&key(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut MultiplayerWorld> {
        self.worlds.get_mut(&key(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MultiplayerWorld> {
        self.worlds.values()
    }

    /// World the session is currently in.
    pub fn world_of(&self, session: SessionId) -> Option<&MultiplayerWorld> {
        self.locations
            .get(&session)
            .and_then(|k| self.worlds.get(k))
    }

    pub fn world_of_mut(&mut self, session: SessionId) -> Option<&mut MultiplayerWorld> {
        let k = self.locations.get(&session)?;
        self.worlds.get_mut(k)
    }

    /// Join a session that is not yet in any world.
    pub fn join(
        &mut self,
        peers: &mut impl Peers,
        name: &str,
        identity: &Identity,
        mode: JoinMode,
    ) -> Result<EntityId, RegistryError> {
        if let Some(current) = self.world_of(identity.session) {
            return Err(RegistryError::AlreadyThere(current.name().to_string()));
        }
        let k = key(name);
        let world = self
            .worlds
            .get_mut(&k)
            .ok_or_else(|| RegistryError::UnknownWorld(name.to_string()))?;
        let id = world.join(peers, identity, mode)?;
        self.locations.insert(identity.session, k);
        Ok(id)
    }

    /// Move a session to another world.
    ///
    /// The target's checks and level are done before the session leaves its
    /// current world, so a refused move leaves the session where it was. If
    /// the target still refuses after the leave, the session goes back.
    pub fn transfer(
        &mut self,
        peers: &mut impl Peers,
        name: &str,
        identity: &Identity,
        mode: JoinMode,
    ) -> Result<EntityId, RegistryError> {
        let k = key(name);
        let target = self
            .worlds
            .get(&k)
            .ok_or_else(|| RegistryError::UnknownWorld(name.to_string()))?;
        if self.locations.get(&identity.session) == Some(&k) {
            return Err(RegistryError::AlreadyThere(target.name().to_string()));
        }
        let prepared = target.prepare_join(&*peers, identity)?;

        let source = self.locations.get(&identity.session).cloned();
        let previous = self.leave(peers, identity.session)?;
        let Some(target) = self.worlds.get_mut(&k) else {
            return Err(RegistryError::UnknownWorld(name.to_string()));
        };
        match target.join_prepared(peers, prepared, mode) {
            Ok(id) => {
                self.locations.insert(identity.session, k);
                Ok(id)
            }
            Err(e) => {
                if let (Some(source), Some(member)) = (source, previous) {
                    if let Err(back) = self.join(peers, &source, identity, member.mode) {
                        warn!(player = %identity.name, world = %source, "Could not return player after failed move: {back}");
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Take the session out of whatever world it is in.
    pub fn leave(&mut self, peers: &mut impl Peers, session: SessionId) -> Result<Option<Member>, RegistryError> {
        let Some(k) = self.locations.remove(&session) else {
            return Ok(None);
        };
        match self.worlds.get_mut(&k) {
            Some(world) => Ok(Some(world.leave(peers, session)?)),
            None => Ok(None),
        }
    }
}
