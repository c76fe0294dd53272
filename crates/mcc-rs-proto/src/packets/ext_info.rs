//! Extension negotiation: ExtInfo, ExtEntry, CustomBlockSupportLevel.

use bytes::{Buf, BufMut};

use super::FixedPacket;
use crate::codec::{self, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// ExtInfo (0x10) — both directions. Announces how many ExtEntry packets follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtInfo {
    pub app_name: String,
    pub extension_count: i16,
}

impl FixedPacket for ExtInfo {
    const ID: u8 = super::id::EXT_INFO;
    const SIZE: usize = 67;
}

impl ProtoEncode for ExtInfo {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        codec::write_string(buf, &self.app_name);
        buf.put_i16(self.extension_count);
        Ok(())
    }
}

impl ProtoDecode for ExtInfo {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            app_name: codec::read_string(buf)?,
            extension_count: codec::read_i16(buf)?,
        })
    }
}

/// ExtEntry (0x11) — both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtEntry {
    pub name: String,
    pub version: i32,
}

impl FixedPacket for ExtEntry {
    const ID: u8 = super::id::EXT_ENTRY;
    const SIZE: usize = 69;
}

impl ProtoEncode for ExtEntry {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        codec::write_string(buf, &self.name);
        buf.put_i32(self.version);
        Ok(())
    }
}

impl ProtoDecode for ExtEntry {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            name: codec::read_string(buf)?,
            version: codec::read_i32(buf)?,
        })
    }
}

/// CustomBlockSupportLevel (0x13) — both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomBlockSupportLevel {
    pub level: u8,
}

impl FixedPacket for CustomBlockSupportLevel {
    const ID: u8 = super::id::CUSTOM_BLOCK_SUPPORT_LEVEL;
    const SIZE: usize = 2;
}

impl ProtoEncode for CustomBlockSupportLevel {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_u8(self.level);
        Ok(())
    }
}

impl ProtoDecode for CustomBlockSupportLevel {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            level: codec::read_u8(buf)?,
        })
    }
}
