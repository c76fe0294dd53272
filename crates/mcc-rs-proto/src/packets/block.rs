//! Block change packets: SetBlockRequest, SetBlock, BulkBlockUpdate.

use bytes::{Buf, BufMut};

use super::FixedPacket;
use crate::codec::{self, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::BlockPos;

/// Whether a client is placing or breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EditMode {
    Destroy = 0,
    Create = 1,
}

impl EditMode {
    fn from_u8(v: u8) -> Result<Self, ProtoError> {
        match v {
            0 => Ok(EditMode::Destroy),
            1 => Ok(EditMode::Create),
            other => Err(ProtoError::InvalidValue {
                field: "edit mode",
                value: other as i64,
            }),
        }
    }
}

/// SetBlock (0x05) — Client → Server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBlockRequest {
    pub position: BlockPos,
    pub mode: EditMode,
    /// Block held by the client; ignored on destroy.
    pub block: u8,
}

impl SetBlockRequest {
    /// Block the request results in: air when destroying.
    pub fn resulting_block(&self) -> u8 {
        match self.mode {
            EditMode::Destroy => 0,
            EditMode::Create => self.block,
        }
    }
}

impl FixedPacket for SetBlockRequest {
    const ID: u8 = super::id::SET_BLOCK_REQUEST;
    const SIZE: usize = 9;
}

impl ProtoEncode for SetBlockRequest {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        self.position.proto_encode(buf)?;
        buf.put_u8(self.mode as u8);
        buf.put_u8(self.block);
        Ok(())
    }
}

impl ProtoDecode for SetBlockRequest {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let position = BlockPos::proto_decode(buf)?;
        let mode = codec::read_u8(buf)?;
        let block = codec::read_u8(buf)?;
        Ok(Self {
            position,
            mode: EditMode::from_u8(mode)?,
            block,
        })
    }
}

/// SetBlock (0x06) — Server → Client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBlock {
    pub position: BlockPos,
    pub block: u8,
}

impl FixedPacket for SetBlock {
    const ID: u8 = super::id::SET_BLOCK;
    const SIZE: usize = 8;
}

impl ProtoEncode for SetBlock {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        self.position.proto_encode(buf)?;
        buf.put_u8(self.block);
        Ok(())
    }
}

impl ProtoDecode for SetBlock {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            position: BlockPos::proto_decode(buf)?,
            block: codec::read_u8(buf)?,
        })
    }
}

/// BulkBlockUpdate (0x26) — Server → Client.
///
/// Carries 1..=256 `(flat index, block)` pairs. The wire form always holds
/// 256 index slots and 256 block slots; unused slots are zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkBlockUpdate {
    pub entries: Vec<(u32, u8)>,
}

impl BulkBlockUpdate {
    /// Most updates one packet can carry.
    pub const MAX_ENTRIES: usize = 256;

    /// Pack updates into as few packets as possible, preserving order.
    pub fn batches(updates: &[(u32, u8)]) -> Vec<BulkBlockUpdate> {
        updates
            .chunks(Self::MAX_ENTRIES)
            .map(|chunk| BulkBlockUpdate {
                entries: chunk.to_vec(),
            })
            .collect()
    }
}

impl FixedPacket for BulkBlockUpdate {
    const ID: u8 = super::id::BULK_BLOCK_UPDATE;
    const SIZE: usize = 1282;
}

impl ProtoEncode for BulkBlockUpdate {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        let count = self.entries.len();
        if count == 0 || count > Self::MAX_ENTRIES {
            return Err(ProtoError::BulkCount(count));
        }
        buf.put_u8((count - 1) as u8);
        for slot in 0..Self::MAX_ENTRIES {
            buf.put_u32(self.entries.get(slot).map_or(0, |&(index, _)| index));
        }
        for slot in 0..Self::MAX_ENTRIES {
            buf.put_u8(self.entries.get(slot).map_or(0, |&(_, block)| block));
        }
        Ok(())
    }
}

impl ProtoDecode for BulkBlockUpdate {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        codec::ensure(buf, Self::SIZE - 1)?;
        let count = buf.get_u8() as usize + 1;
        let indices: Vec<u32> = (0..Self::MAX_ENTRIES).map(|_| buf.get_u32()).collect();
        let blocks: Vec<u8> = (0..Self::MAX_ENTRIES).map(|_| buf.get_u8()).collect();
        let entries = indices
            .into_iter()
            .zip(blocks)
            .take(count)
            .collect();
        Ok(Self { entries })
    }
}
