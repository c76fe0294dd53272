//! Flat world generator.
//!
//! Layers, bottom to top:
//! - Y = 0: Bedrock
//! - Y = 1 .. ground: Dirt
//! - Y = ground: Grass
//! - above: Air
//!
//! `ground` is one below half the world height.

use mcc_rs_proto::types::BlockPos;

use crate::block::{AIR, BEDROCK, DIRT, GRASS};
use crate::error::WorldError;
use crate::world::{Dimensions, World};

/// Generate a flat world; spawn is centred on the grass surface.
pub fn generate_flat(dims: Dimensions) -> Result<World, WorldError> {
    let ground = (dims.y / 2 - 1).max(0);
    let layer = dims.x.max(0) as usize * dims.z.max(0) as usize;

    let mut blocks = Vec::with_capacity(dims.volume());
    for y in 0..dims.y {
        let block = match y {
            0 => BEDROCK,
            y if y < ground => DIRT,
            y if y == ground => GRASS,
            _ => AIR,
        };
        blocks.extend(std::iter::repeat(block).take(layer));
    }

    let spawn_y = (ground + 1).min(dims.y - 1);
    World::from_blocks(dims, blocks, BlockPos::new(dims.x / 2, spawn_y, dims.z / 2))
}
