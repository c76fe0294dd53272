//! Flat in-memory block grid.

use mcc_rs_proto::types::BlockPos;
use serde::{Deserialize, Serialize};

use crate::block::AIR;
use crate::error::WorldError;

/// World size in blocks along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Dimensions {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    pub fn volume(&self) -> usize {
        self.x.max(0) as usize * self.y.max(0) as usize * self.z.max(0) as usize
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        (0..self.x).contains(&pos.x) && (0..self.y).contains(&pos.y) && (0..self.z).contains(&pos.z)
    }

    /// Flat index of `pos`: `(y * Z + z) * X + x`.
    pub fn index(&self, pos: BlockPos) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        let (x, y, z) = (pos.x as usize, pos.y as usize, pos.z as usize);
        Some((y * self.z as usize + z) * self.x as usize + x)
    }

    /// Inverse of [`Dimensions::index`].
    pub fn position(&self, index: usize) -> Option<BlockPos> {
        if index >= self.volume() {
            return None;
        }
        let (sx, sz) = (self.x as usize, self.z as usize);
        Some(BlockPos::new(
            (index % sx) as i16,
            (index / (sx * sz)) as i16,
            ((index / sx) % sz) as i16,
        ))
    }

    fn validate(self) -> Result<Self, WorldError> {
        if self.x <= 0 || self.y <= 0 || self.z <= 0 || self.volume() > i32::MAX as usize {
            return Err(WorldError::InvalidDimensions {
                x: self.x,
                y: self.y,
                z: self.z,
            });
        }
        Ok(self)
    }
}

/// A block grid with a spawn point.
#[derive(Debug, Clone)]
pub struct World {
    dims: Dimensions,
    blocks: Vec<u8>,
    spawn: BlockPos,
    dirty: bool,
}

impl World {
    /// An all-air world with spawn at the centre.
    pub fn new(dims: Dimensions) -> Result<Self, WorldError> {
        let dims = dims.validate()?;
        Ok(Self {
            dims,
            blocks: vec![AIR; dims.volume()],
            spawn: BlockPos::new(dims.x / 2, dims.y / 2, dims.z / 2),
            dirty: false,
        })
    }

    pub fn from_blocks(dims: Dimensions, blocks: Vec<u8>, spawn: BlockPos) -> Result<Self, WorldError> {
        let dims = dims.validate()?;
        if blocks.len() != dims.volume() {
            return Err(WorldError::BlockDataLength {
                expected: dims.volume(),
                actual: blocks.len(),
            });
        }
        if !dims.contains(spawn) {
            return Err(WorldError::OutOfBounds(spawn));
        }
        Ok(Self {
            dims,
            blocks,
            spawn,
            dirty: false,
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    pub fn get(&self, pos: BlockPos) -> Option<u8> {
        self.dims.index(pos).map(|i| self.blocks[i])
    }

    /// Store `block` at `pos`, returning the block it replaced.
    pub fn set(&mut self, pos: BlockPos, block: u8) -> Result<u8, WorldError> {
        let index = self.dims.index(pos).ok_or(WorldError::OutOfBounds(pos))?;
        let old = std::mem::replace(&mut self.blocks[index], block);
        if old != block {
            self.dirty = true;
        }
        Ok(old)
    }

    pub fn spawn(&self) -> BlockPos {
        self.spawn
    }

    pub fn set_spawn(&mut self, pos: BlockPos) -> Result<(), WorldError> {
        if !self.dims.contains(pos) {
            return Err(WorldError::OutOfBounds(pos));
        }
        self.spawn = pos;
        self.dirty = true;
        Ok(())
    }

    /// Whether the grid changed since the last [`World::mark_clean`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
