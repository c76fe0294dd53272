//! Identification, keep-alive and disconnect packets.

use bytes::{Buf, BufMut};

use super::FixedPacket;
use crate::codec::{self, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// User type byte marking an operator in ServerIdentify / UpdateUserType.
pub const USER_TYPE_OP: u8 = 0x64;

/// Identify (0x00) — Client → Server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identify {
    pub protocol_version: u8,
    pub username: String,
    pub verification_key: String,
    /// Reserved trailer; [`crate::extension::NEGOTIATION_MAGIC`] requests negotiation.
    pub trailer: u8,
}

impl FixedPacket for Identify {
    const ID: u8 = super::id::IDENTIFY;
    const SIZE: usize = 131;
}

impl ProtoEncode for Identify {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_u8(self.protocol_version);
        codec::write_string(buf, &self.username);
        codec::write_string(buf, &self.verification_key);
        buf.put_u8(self.trailer);
        Ok(())
    }
}

impl ProtoDecode for Identify {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            protocol_version: codec::read_u8(buf)?,
            username: codec::read_string(buf)?,
            verification_key: codec::read_string(buf)?,
            trailer: codec::read_u8(buf)?,
        })
    }
}

/// Identify (0x00) — Server → Client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentify {
    pub protocol_version: u8,
    pub server_name: String,
    pub motd: String,
    pub user_type: u8,
}

impl FixedPacket for ServerIdentify {
    const ID: u8 = super::id::IDENTIFY;
    const SIZE: usize = 131;
}

impl ProtoEncode for ServerIdentify {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_u8(self.protocol_version);
        codec::write_string(buf, &self.server_name);
        codec::write_string(buf, &self.motd);
        buf.put_u8(self.user_type);
        Ok(())
    }
}

impl ProtoDecode for ServerIdentify {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            protocol_version: codec::read_u8(buf)?,
            server_name: codec::read_string(buf)?,
            motd: codec::read_string(buf)?,
            user_type: codec::read_u8(buf)?,
        })
    }
}

/// Disconnect (0x0e) — Server → Client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    pub reason: String,
}

impl Disconnect {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl FixedPacket for Disconnect {
    const ID: u8 = super::id::DISCONNECT;
    const SIZE: usize = 65;
}

impl ProtoEncode for Disconnect {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        codec::write_string(buf, &self.reason);
        Ok(())
    }
}

impl ProtoDecode for Disconnect {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            reason: codec::read_string(buf)?,
        })
    }
}

/// UpdateUserType (0x0f) — Server → Client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateUserType {
    pub user_type: u8,
}

impl FixedPacket for UpdateUserType {
    const ID: u8 = super::id::UPDATE_USER_TYPE;
    const SIZE: usize = 2;
}

impl ProtoEncode for UpdateUserType {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_u8(self.user_type);
        Ok(())
    }
}

impl ProtoDecode for UpdateUserType {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            user_type: codec::read_u8(buf)?,
        })
    }
}
