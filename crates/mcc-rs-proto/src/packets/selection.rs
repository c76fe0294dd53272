//! SelectionCuboid packets: MakeSelection (0x1a), RemoveSelection (0x1b).

use bytes::{Buf, BufMut};

use super::FixedPacket;
use crate::codec::{self, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::BlockPos;

/// RGBA colour of a selection, one short per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionColor {
    pub r: i16,
    pub g: i16,
    pub b: i16,
    pub a: i16,
}

/// MakeSelection (0x1a) — Server → Client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeSelection {
    pub selection_id: u8,
    pub label: String,
    pub start: BlockPos,
    pub end: BlockPos,
    pub color: SelectionColor,
}

impl FixedPacket for MakeSelection {
    const ID: u8 = super::id::MAKE_SELECTION;
    const SIZE: usize = 86;
}

impl ProtoEncode for MakeSelection {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_u8(self.selection_id);
        codec::write_string(buf, &self.label);
        self.start.proto_encode(buf)?;
        self.end.proto_encode(buf)?;
        buf.put_i16(self.color.r);
        buf.put_i16(self.color.g);
        buf.put_i16(self.color.b);
        buf.put_i16(self.color.a);
        Ok(())
    }
}

impl ProtoDecode for MakeSelection {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            selection_id: codec::read_u8(buf)?,
            label: codec::read_string(buf)?,
            start: BlockPos::proto_decode(buf)?,
            end: BlockPos::proto_decode(buf)?,
            color: SelectionColor {
                r: codec::read_i16(buf)?,
                g: codec::read_i16(buf)?,
                b: codec::read_i16(buf)?,
                a: codec::read_i16(buf)?,
            },
        })
    }
}

/// RemoveSelection (0x1b) — Server → Client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveSelection {
    pub selection_id: u8,
}

impl FixedPacket for RemoveSelection {
    const ID: u8 = super::id::REMOVE_SELECTION;
    const SIZE: usize = 2;
}

impl ProtoEncode for RemoveSelection {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_u8(self.selection_id);
        Ok(())
    }
}

impl ProtoDecode for RemoveSelection {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            selection_id: codec::read_u8(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn make_selection_size() {
        let pkt = MakeSelection {
            selection_id: 2,
            label: "arena".into(),
            start: BlockPos::new(0, 0, 0),
            end: BlockPos::new(9, 9, 9),
            color: SelectionColor {
                r: 255,
                g: 0,
                b: 0,
                a: 128,
            },
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf).unwrap();
        assert_eq!(buf.len(), MakeSelection::SIZE - 1);
        assert_eq!(MakeSelection::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
