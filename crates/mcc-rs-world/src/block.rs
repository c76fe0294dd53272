//! Classic block ids and per-client block translation.
//!
//! Ids `0..=49` are understood by every client. `50..=65` are the
//! CustomBlocks set, each with a classic fallback. Ids from `66` up only
//! exist through a [`BlockDefinition`](crate::BlockDefinition).

use crate::definition::BlockDefinitions;

pub const AIR: u8 = 0;
pub const STONE: u8 = 1;
pub const GRASS: u8 = 2;
pub const DIRT: u8 = 3;
pub const COBBLESTONE: u8 = 4;
pub const PLANKS: u8 = 5;
pub const SAPLING: u8 = 6;
pub const BEDROCK: u8 = 7;
pub const WATER: u8 = 8;
pub const STILL_WATER: u8 = 9;
pub const LAVA: u8 = 10;
pub const STILL_LAVA: u8 = 11;
pub const SAND: u8 = 12;
pub const GRAVEL: u8 = 13;
pub const LOG: u8 = 17;
pub const LEAVES: u8 = 18;
pub const GLASS: u8 = 20;
pub const WOOL_WHITE: u8 = 36;
pub const BROWN_MUSHROOM: u8 = 39;
pub const IRON: u8 = 42;
pub const SLAB: u8 = 44;
pub const OBSIDIAN: u8 = 49;

/// Highest id of the original block set.
pub const MAX_CLASSIC: u8 = OBSIDIAN;
/// Highest id of the CustomBlocks level 1 set.
pub const MAX_CUSTOM: u8 = 65;

/// Classic replacement for a CustomBlocks id, shown to clients without the
/// extension. Returns the input for anything outside `50..=65`.
pub fn custom_fallback(block: u8) -> u8 {
    match block {
        50 => SLAB,           // cobblestone slab
        51 => BROWN_MUSHROOM, // rope
        52 => SAND,           // sandstone
        53 => AIR,            // snow
        54 => LAVA,           // fire
        55 => 33,             // light pink wool
        56 => 25,             // forest green wool
        57 => DIRT,           // brown wool
        58 => 29,             // deep blue wool
        59 => 28,             // turquoise wool
        60 => GLASS,          // ice
        61 => IRON,           // ceramic tile
        62 => OBSIDIAN,       // magma
        63 => WOOL_WHITE,     // pillar
        64 => PLANKS,         // crate
        65 => STONE,          // stone brick
        other => other,
    }
}

/// What one client can render, decided by its negotiated capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientBlocks {
    /// Agreed CustomBlocks support level, 0 if none.
    pub custom_level: u8,
    /// Whether the client agreed BlockDefinitions.
    pub definitions: bool,
}

impl ClientBlocks {
    /// Client that understands every block this server knows.
    pub const FULL: ClientBlocks = ClientBlocks {
        custom_level: 1,
        definitions: true,
    };

    /// Id this client should be sent in place of `block`.
    pub fn translate(self, block: u8, defs: &BlockDefinitions) -> u8 {
        let block = if block > MAX_CUSTOM {
            match defs.get(block) {
                Some(_) if self.definitions => return block,
                Some(def) => def.fallback,
                None => STONE,
            }
        } else {
            block
        };
        if block > MAX_CLASSIC && self.custom_level == 0 {
            custom_fallback(block)
        } else {
            block
        }
    }

    /// Translate a whole block array, as streamed on world join.
    pub fn translate_all(self, blocks: &[u8], defs: &BlockDefinitions) -> Vec<u8> {
        if self.custom_level > 0 && (self.definitions || defs.is_empty()) {
            return blocks.to_vec();
        }
        blocks.iter().map(|&b| self.translate(b, defs)).collect()
    }
}

/// Whether `block` may be placed in a world with these definitions.
pub fn is_placeable(block: u8, defs: &BlockDefinitions) -> bool {
    block <= MAX_CUSTOM || defs.get(block).is_some()
}
