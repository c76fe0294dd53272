//! HackControl (0x20) — Server → Client.

use bytes::{Buf, BufMut};

use super::FixedPacket;
use crate::codec::{self, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Movement-assist toggles a client is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HackControl {
    pub flying: bool,
    pub no_clip: bool,
    pub speeding: bool,
    pub spawn_control: bool,
    pub third_person_view: bool,
    /// Jump height in player units, `-1` for the client default.
    pub jump_height: i16,
}

impl Default for HackControl {
    /// Everything allowed, default jump height.
    fn default() -> Self {
        Self {
            flying: true,
            no_clip: true,
            speeding: true,
            spawn_control: true,
            third_person_view: true,
            jump_height: -1,
        }
    }
}

impl FixedPacket for HackControl {
    const ID: u8 = super::id::HACK_CONTROL;
    const SIZE: usize = 8;
}

impl ProtoEncode for HackControl {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_u8(self.flying as u8);
        buf.put_u8(self.no_clip as u8);
        buf.put_u8(self.speeding as u8);
        buf.put_u8(self.spawn_control as u8);
        buf.put_u8(self.third_person_view as u8);
        buf.put_i16(self.jump_height);
        Ok(())
    }
}

impl ProtoDecode for HackControl {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            flying: codec::read_bool(buf)?,
            no_clip: codec::read_bool(buf)?,
            speeding: codec::read_bool(buf)?,
            spawn_control: codec::read_bool(buf)?,
            third_person_view: codec::read_bool(buf)?,
            jump_height: codec::read_i16(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn default_allows_everything() {
        let mut buf = BytesMut::new();
        HackControl::default().proto_encode(&mut buf).unwrap();
        assert_eq!(&buf[..], &[1, 1, 1, 1, 1, 0xFF, 0xFF]);
    }
}
