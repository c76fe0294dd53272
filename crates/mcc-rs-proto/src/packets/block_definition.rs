//! BlockDefinitions packets: DefineBlock (0x23), RemoveBlockDefinition (0x24).

use bytes::{Buf, BufMut};

use super::FixedPacket;
use crate::codec::{self, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// DefineBlock (0x23) — Server → Client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineBlock {
    pub block_id: u8,
    pub name: String,
    /// 0 walk-through, 1 swim-through, 2 solid.
    pub solidity: u8,
    /// Logarithmic speed, 128 is normal.
    pub movement_speed: u8,
    pub top_texture: u8,
    pub side_texture: u8,
    pub bottom_texture: u8,
    pub transmits_light: bool,
    pub walk_sound: u8,
    pub full_bright: bool,
    /// 0 for sprites, otherwise the block height in sixteenths.
    pub shape: u8,
    pub block_draw: u8,
    pub fog_density: u8,
    pub fog_r: u8,
    pub fog_g: u8,
    pub fog_b: u8,
}

impl FixedPacket for DefineBlock {
    const ID: u8 = super::id::DEFINE_BLOCK;
    const SIZE: usize = 80;
}

impl ProtoEncode for DefineBlock {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_u8(self.block_id);
        codec::write_string(buf, &self.name);
        buf.put_u8(self.solidity);
        buf.put_u8(self.movement_speed);
        buf.put_u8(self.top_texture);
        buf.put_u8(self.side_texture);
        buf.put_u8(self.bottom_texture);
        buf.put_u8(self.transmits_light as u8);
        buf.put_u8(self.walk_sound);
        buf.put_u8(self.full_bright as u8);
        buf.put_u8(self.shape);
        buf.put_u8(self.block_draw);
        buf.put_u8(self.fog_density);
        buf.put_u8(self.fog_r);
        buf.put_u8(self.fog_g);
        buf.put_u8(self.fog_b);
        Ok(())
    }
}

impl ProtoDecode for DefineBlock {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            block_id: codec::read_u8(buf)?,
            name: codec::read_string(buf)?,
            solidity: codec::read_u8(buf)?,
            movement_speed: codec::read_u8(buf)?,
            top_texture: codec::read_u8(buf)?,
            side_texture: codec::read_u8(buf)?,
            bottom_texture: codec::read_u8(buf)?,
            transmits_light: codec::read_bool(buf)?,
            walk_sound: codec::read_u8(buf)?,
            full_bright: codec::read_bool(buf)?,
            shape: codec::read_u8(buf)?,
            block_draw: codec::read_u8(buf)?,
            fog_density: codec::read_u8(buf)?,
            fog_r: codec::read_u8(buf)?,
            fog_g: codec::read_u8(buf)?,
            fog_b: codec::read_u8(buf)?,
        })
    }
}

/// RemoveBlockDefinition (0x24) — Server → Client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveBlockDefinition {
    pub block_id: u8,
}

impl FixedPacket for RemoveBlockDefinition {
    const ID: u8 = super::id::REMOVE_BLOCK_DEFINITION;
    const SIZE: usize = 2;
}

impl ProtoEncode for RemoveBlockDefinition {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_u8(self.block_id);
        Ok(())
    }
}

impl ProtoDecode for RemoveBlockDefinition {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            block_id: codec::read_u8(buf)?,
        })
    }
}
