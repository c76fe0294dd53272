//! Per-world custom block definitions.

use std::collections::BTreeMap;

use mcc_rs_proto::packets::DefineBlock;
use serde::{Deserialize, Serialize};

use crate::block::{self, MAX_CUSTOM};
use crate::error::WorldError;

/// Lowest id that can carry a definition.
pub const MIN_DEFINED: u8 = MAX_CUSTOM + 1;
/// Highest id that can carry a definition; 255 is reserved.
pub const MAX_DEFINED: u8 = 254;

/// A block added to a world at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub id: u8,
    pub name: String,
    /// Built-in block shown to clients that cannot load definitions.
    pub fallback: u8,
    #[serde(default = "default_solidity")]
    pub solidity: u8,
    #[serde(default = "default_speed")]
    pub movement_speed: u8,
    #[serde(default = "default_texture")]
    pub top_texture: u8,
    #[serde(default = "default_texture")]
    pub side_texture: u8,
    #[serde(default = "default_texture")]
    pub bottom_texture: u8,
    #[serde(default)]
    pub transmits_light: bool,
    #[serde(default = "default_walk_sound")]
    pub walk_sound: u8,
    #[serde(default)]
    pub full_bright: bool,
    #[serde(default = "default_shape")]
    pub shape: u8,
    #[serde(default)]
    pub block_draw: u8,
    #[serde(default)]
    pub fog: [u8; 4],
}

fn default_solidity() -> u8 {
    2
}
fn default_speed() -> u8 {
    128
}
fn default_texture() -> u8 {
    1
}
fn default_walk_sound() -> u8 {
    1
}
fn default_shape() -> u8 {
    16
}

impl BlockDefinition {
    /// A solid, full-height, stone-textured block.
    pub fn new(id: u8, name: impl Into<String>, fallback: u8) -> Self {
        Self {
            id,
            name: name.into(),
            fallback,
            solidity: default_solidity(),
            movement_speed: default_speed(),
            top_texture: default_texture(),
            side_texture: default_texture(),
            bottom_texture: default_texture(),
            transmits_light: false,
            walk_sound: default_walk_sound(),
            full_bright: false,
            shape: default_shape(),
            block_draw: 0,
            fog: [0; 4],
        }
    }

    pub fn to_packet(&self) -> DefineBlock {
        DefineBlock {
            block_id: self.id,
            name: self.name.clone(),
            solidity: self.solidity,
            movement_speed: self.movement_speed,
            top_texture: self.top_texture,
            side_texture: self.side_texture,
            bottom_texture: self.bottom_texture,
            transmits_light: self.transmits_light,
            walk_sound: self.walk_sound,
            full_bright: self.full_bright,
            shape: self.shape,
            block_draw: self.block_draw,
            fog_density: self.fog[0],
            fog_r: self.fog[1],
            fog_g: self.fog[2],
            fog_b: self.fog[3],
        }
    }
}

/// Definitions registered in one world, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct BlockDefinitions {
    defs: BTreeMap<u8, BlockDefinition>,
}

impl BlockDefinitions {
    /// Register or replace a definition. Returns the one it replaced.
    pub fn define(&mut self, def: BlockDefinition) -> Result<Option<BlockDefinition>, WorldError> {
        if !(MIN_DEFINED..=MAX_DEFINED).contains(&def.id) {
            return Err(WorldError::UndefinableBlock(def.id));
        }
        if def.fallback > block::MAX_CUSTOM {
            return Err(WorldError::InvalidFallback {
                block: def.id,
                fallback: def.fallback,
            });
        }
        Ok(self.defs.insert(def.id, def))
    }

    pub fn remove(&mut self, id: u8) -> Result<BlockDefinition, WorldError> {
        self.defs.remove(&id).ok_or(WorldError::UnknownBlock(id))
    }

    pub fn get(&self, id: u8) -> Option<&BlockDefinition> {
        self.defs.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockDefinition> {
        self.defs.values()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_reserved_ids() {
        let mut defs = BlockDefinitions::default();
        assert!(matches!(
            defs.define(BlockDefinition::new(12, "Sand2", 1)),
            Err(WorldError::UndefinableBlock(12))
        ));
        assert!(matches!(
            defs.define(BlockDefinition::new(255, "Nope", 1)),
            Err(WorldError::UndefinableBlock(255))
        ));
    }

    #[test]
    fn fallback_must_be_builtin() {
        let mut defs = BlockDefinitions::default();
        assert!(matches!(
            defs.define(BlockDefinition::new(70, "Loop", 80)),
            Err(WorldError::InvalidFallback { block: 70, fallback: 80 })
        ));
    }

    #[test]
    fn define_replace_remove() {
        let mut defs = BlockDefinitions::default();
        assert!(defs.define(BlockDefinition::new(66, "A", 1)).unwrap().is_none());
        let old = defs.define(BlockDefinition::new(66, "B", 2)).unwrap().unwrap();
        assert_eq!(old.name, "A");
        assert_eq!(defs.get(66).unwrap().name, "B");
        assert_eq!(defs.remove(66).unwrap().name, "B");
        assert!(matches!(defs.remove(66), Err(WorldError::UnknownBlock(66))));
        assert!(defs.is_empty());
    }

    #[test]
    fn packet_carries_fields() {
        let mut def = BlockDefinition::new(80, "Lamp", 20);
        def.full_bright = true;
        def.fog = [4, 10, 20, 30];
        let pkt = def.to_packet();
        assert_eq!(pkt.block_id, 80);
        assert_eq!(pkt.name, "Lamp");
        assert!(pkt.full_bright);
        assert_eq!(pkt.shape, 16);
        assert_eq!((pkt.fog_density, pkt.fog_b), (4, 30));
    }

    #[test]
    fn deserialize_with_defaults() {
        let def: BlockDefinition =
            toml::from_str("id = 90\nname = \"Glow\"\nfallback = 20\nfull_bright = true\n")
                .unwrap();
        assert_eq!(def.movement_speed, 128);
        assert!(def.full_bright);
    }
}
