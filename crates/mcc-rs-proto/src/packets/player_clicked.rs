//! PlayerClicked (0x22) — Client → Server, PlayerClick extension only.

use bytes::{Buf, BufMut};

use super::FixedPacket;
use crate::codec::{self, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{BlockPos, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerClicked {
    /// 0 left, 1 right, 2 middle.
    pub button: u8,
    /// 0 pressed, 1 released.
    pub action: u8,
    pub yaw: i16,
    pub pitch: i16,
    /// Targeted entity, or 255 (`-1`) for none.
    pub target_entity: EntityId,
    /// Targeted block; `(-1, -1, -1)` for none.
    pub target_block: BlockPos,
    /// Face of the targeted block, 255 for none.
    pub target_face: u8,
}

impl FixedPacket for PlayerClicked {
    const ID: u8 = super::id::PLAYER_CLICKED;
    const SIZE: usize = 15;
}

impl ProtoEncode for PlayerClicked {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_u8(self.button);
        buf.put_u8(self.action);
        buf.put_i16(self.yaw);
        buf.put_i16(self.pitch);
        buf.put_i8(self.target_entity.0);
        self.target_block.proto_encode(buf)?;
        buf.put_u8(self.target_face);
        Ok(())
    }
}

impl ProtoDecode for PlayerClicked {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            button: codec::read_u8(buf)?,
            action: codec::read_u8(buf)?,
            yaw: codec::read_i16(buf)?,
            pitch: codec::read_i16(buf)?,
            target_entity: EntityId(codec::read_i8(buf)?),
            target_block: BlockPos::proto_decode(buf)?,
            target_face: codec::read_u8(buf)?,
        })
    }
}
