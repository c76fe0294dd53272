//! Coordinate and identity types shared by packets and the world model.

use std::fmt;

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::codec::{self, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

// ---------------------------------------------------------------------------
// BlockPos
// ---------------------------------------------------------------------------

/// Integer grid coordinate of a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl BlockPos {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }
}

impl ProtoEncode for BlockPos {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
        Ok(())
    }
}

impl ProtoDecode for BlockPos {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        codec::ensure(buf, 6)?;
        Ok(Self {
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
        })
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// PlayerPos
// ---------------------------------------------------------------------------

/// Fixed-point player coordinate: 32 units per block, Y measured at eye height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlayerPos {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl PlayerPos {
    /// Units per block.
    pub const SCALE: i16 = 32;
    /// Offset from the feet block to the eyes, in fixed-point units.
    pub const EYE_HEIGHT: i16 = 51;

    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Position of a player standing in `block`.
    pub fn from_block(block: BlockPos) -> Self {
        Self {
            x: block.x.saturating_mul(Self::SCALE),
            y: block
                .y
                .saturating_mul(Self::SCALE)
                .saturating_add(Self::EYE_HEIGHT),
            z: block.z.saturating_mul(Self::SCALE),
        }
    }

    /// Block containing this position, rounding every axis down.
    ///
    /// The eye-height offset is not removed, so this is not the inverse of
    /// [`PlayerPos::from_block`] on the Y axis.
    pub fn to_block(self) -> BlockPos {
        BlockPos {
            x: self.x.div_euclid(Self::SCALE),
            y: self.y.div_euclid(Self::SCALE),
            z: self.z.div_euclid(Self::SCALE),
        }
    }
}

impl ProtoEncode for PlayerPos {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
        Ok(())
    }
}

impl ProtoDecode for PlayerPos {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        codec::ensure(buf, 6)?;
        Ok(Self {
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
        })
    }
}

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// Yaw and pitch, each scaled to 256 steps per full turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Orientation {
    pub yaw: u8,
    pub pitch: u8,
}

impl ProtoEncode for Orientation {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_u8(self.yaw);
        buf.put_u8(self.pitch);
        Ok(())
    }
}

impl ProtoDecode for Orientation {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        codec::ensure(buf, 2)?;
        Ok(Self {
            yaw: buf.get_u8(),
            pitch: buf.get_u8(),
        })
    }
}

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Per-world player entity id. `-1` always means the receiving client itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub i8);

impl EntityId {
    /// Self-reference used when a client is told about its own avatar.
    pub const SELF: EntityId = EntityId(-1);

    pub fn is_self(self) -> bool {
        self == Self::SELF
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn from_block_scales_and_adds_eye_height() {
        let pos = PlayerPos::from_block(BlockPos::new(10, 33, 2));
        assert_eq!(pos, PlayerPos::new(320, 33 * 32 + 51, 64));
    }

    #[test]
    fn to_block_rounds_down() {
        let pos = PlayerPos::new(335, 100, -1);
        assert_eq!(pos.to_block(), BlockPos::new(10, 3, -1));
    }

    #[test]
    fn to_block_keeps_eye_offset() {
        let feet = BlockPos::new(4, 8, 4);
        let back = PlayerPos::from_block(feet).to_block();
        assert_eq!(back.x, 4);
        assert_eq!(back.z, 4);
        // 51/32 of eye height rounds down to one extra block
        assert_eq!(back.y, 9);
    }

    #[test]
    fn block_pos_wire_layout() {
        let mut buf = BytesMut::new();
        BlockPos::new(1, -2, 300).proto_encode(&mut buf).unwrap();
        assert_eq!(&buf[..], &[0x00, 0x01, 0xFF, 0xFE, 0x01, 0x2C]);
        let back = BlockPos::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(back, BlockPos::new(1, -2, 300));
    }

    #[test]
    fn self_entity_id() {
        assert!(EntityId::SELF.is_self());
        assert!(!EntityId(0).is_self());
    }
}
