//! Packet definitions for the classic protocol and its extensions.

pub mod block;
pub mod block_definition;
pub mod chat;
pub mod entity;
pub mod ext_info;
pub mod hack_control;
pub mod level;
pub mod login;
pub mod player_clicked;
pub mod selection;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{self, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

pub use block::{BulkBlockUpdate, EditMode, SetBlock, SetBlockRequest};
pub use block_definition::{DefineBlock, RemoveBlockDefinition};
pub use chat::{wrap_message, Message, MessageChannel};
pub use entity::{DespawnPlayer, PositionAndOrientation, SpawnPlayer};
pub use ext_info::{CustomBlockSupportLevel, ExtEntry, ExtInfo};
pub use hack_control::HackControl;
pub use level::{LevelDataChunk, LevelFinalize, LevelInitialize};
pub use login::{Disconnect, Identify, ServerIdentify, UpdateUserType, USER_TYPE_OP};
pub use player_clicked::PlayerClicked;
pub use selection::{MakeSelection, RemoveSelection, SelectionColor};

/// Packet IDs (the first byte of every packet).
pub mod id {
    pub const IDENTIFY: u8 = 0x00;
    pub const PING: u8 = 0x01;
    pub const LEVEL_INITIALIZE: u8 = 0x02;
    pub const LEVEL_DATA_CHUNK: u8 = 0x03;
    pub const LEVEL_FINALIZE: u8 = 0x04;
    pub const SET_BLOCK_REQUEST: u8 = 0x05;
    pub const SET_BLOCK: u8 = 0x06;
    pub const SPAWN_PLAYER: u8 = 0x07;
    pub const POSITION_AND_ORIENTATION: u8 = 0x08;
    pub const DESPAWN_PLAYER: u8 = 0x0C;
    pub const MESSAGE: u8 = 0x0D;
    pub const DISCONNECT: u8 = 0x0E;
    pub const UPDATE_USER_TYPE: u8 = 0x0F;
    pub const EXT_INFO: u8 = 0x10;
    pub const EXT_ENTRY: u8 = 0x11;
    pub const CUSTOM_BLOCK_SUPPORT_LEVEL: u8 = 0x13;
    pub const MAKE_SELECTION: u8 = 0x1A;
    pub const REMOVE_SELECTION: u8 = 0x1B;
    pub const HACK_CONTROL: u8 = 0x20;
    pub const PLAYER_CLICKED: u8 = 0x22;
    pub const DEFINE_BLOCK: u8 = 0x23;
    pub const REMOVE_BLOCK_DEFINITION: u8 = 0x24;
    pub const BULK_BLOCK_UPDATE: u8 = 0x26;
}

/// Protocol version spoken by this server.
pub const PROTOCOL_VERSION: u8 = 7;

/// A packet with a fixed opcode and a fixed total size (opcode included).
pub trait FixedPacket {
    const ID: u8;
    const SIZE: usize;
}

/// Total size of a client → server packet, opcode included.
pub fn client_packet_size(opcode: u8) -> Option<usize> {
    match opcode {
        id::IDENTIFY => Some(Identify::SIZE),
        id::SET_BLOCK_REQUEST => Some(SetBlockRequest::SIZE),
        id::POSITION_AND_ORIENTATION => Some(PositionAndOrientation::SIZE),
        id::MESSAGE => Some(Message::SIZE),
        id::EXT_INFO => Some(ExtInfo::SIZE),
        id::EXT_ENTRY => Some(ExtEntry::SIZE),
        id::CUSTOM_BLOCK_SUPPORT_LEVEL => Some(CustomBlockSupportLevel::SIZE),
        id::PLAYER_CLICKED => Some(PlayerClicked::SIZE),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Any packet a client may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPacket {
    Identify(Identify),
    SetBlock(SetBlockRequest),
    Position(PositionAndOrientation),
    Message(Message),
    ExtInfo(ExtInfo),
    ExtEntry(ExtEntry),
    CustomBlockSupportLevel(CustomBlockSupportLevel),
    PlayerClicked(PlayerClicked),
}

impl ClientPacket {
    /// Decode the body of a client packet whose opcode was already read.
    pub fn decode(opcode: u8, body: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(match opcode {
            id::IDENTIFY => ClientPacket::Identify(Identify::proto_decode(body)?),
            id::SET_BLOCK_REQUEST => ClientPacket::SetBlock(SetBlockRequest::proto_decode(body)?),
            id::POSITION_AND_ORIENTATION => {
                ClientPacket::Position(PositionAndOrientation::proto_decode(body)?)
            }
            id::MESSAGE => ClientPacket::Message(Message::proto_decode(body)?),
            id::EXT_INFO => ClientPacket::ExtInfo(ExtInfo::proto_decode(body)?),
            id::EXT_ENTRY => ClientPacket::ExtEntry(ExtEntry::proto_decode(body)?),
            id::CUSTOM_BLOCK_SUPPORT_LEVEL => {
                ClientPacket::CustomBlockSupportLevel(CustomBlockSupportLevel::proto_decode(body)?)
            }
            id::PLAYER_CLICKED => {
                ClientPacket::PlayerClicked(PlayerClicked::proto_decode(body)?)
            }
            other => return Err(ProtoError::UnknownPacketId(other)),
        })
    }

    pub fn opcode(&self) -> u8 {
        match self {
            ClientPacket::Identify(_) => id::IDENTIFY,
            ClientPacket::SetBlock(_) => id::SET_BLOCK_REQUEST,
            ClientPacket::Position(_) => id::POSITION_AND_ORIENTATION,
            ClientPacket::Message(_) => id::MESSAGE,
            ClientPacket::ExtInfo(_) => id::EXT_INFO,
            ClientPacket::ExtEntry(_) => id::EXT_ENTRY,
            ClientPacket::CustomBlockSupportLevel(_) => id::CUSTOM_BLOCK_SUPPORT_LEVEL,
            ClientPacket::PlayerClicked(_) => id::PLAYER_CLICKED,
        }
    }

    /// Encode with the leading opcode, as a client would.
    pub fn encode(&self) -> Result<Bytes, ProtoError> {
        let mut buf = BytesMut::new();
        match self {
            ClientPacket::Identify(p) => put(&mut buf, p)?,
            ClientPacket::SetBlock(p) => put(&mut buf, p)?,
            ClientPacket::Position(p) => put(&mut buf, p)?,
            ClientPacket::Message(p) => put(&mut buf, p)?,
            ClientPacket::ExtInfo(p) => put(&mut buf, p)?,
            ClientPacket::ExtEntry(p) => put(&mut buf, p)?,
            ClientPacket::CustomBlockSupportLevel(p) => put(&mut buf, p)?,
            ClientPacket::PlayerClicked(p) => put(&mut buf, p)?,
        }
        Ok(buf.freeze())
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Any packet the server may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerPacket {
    Identify(ServerIdentify),
    Ping,
    LevelInitialize,
    LevelDataChunk(LevelDataChunk),
    LevelFinalize(LevelFinalize),
    SetBlock(SetBlock),
    SpawnPlayer(SpawnPlayer),
    Position(PositionAndOrientation),
    DespawnPlayer(DespawnPlayer),
    Message(Message),
    Disconnect(Disconnect),
    UpdateUserType(UpdateUserType),
    ExtInfo(ExtInfo),
    ExtEntry(ExtEntry),
    CustomBlockSupportLevel(CustomBlockSupportLevel),
    MakeSelection(MakeSelection),
    RemoveSelection(RemoveSelection),
    HackControl(HackControl),
    DefineBlock(DefineBlock),
    RemoveBlockDefinition(RemoveBlockDefinition),
    BulkBlockUpdate(BulkBlockUpdate),
}

impl ServerPacket {
    /// Opcode this packet is sent with.
    pub fn opcode(&self) -> u8 {
        match self {
            ServerPacket::Identify(_) => id::IDENTIFY,
            ServerPacket::Ping => id::PING,
            ServerPacket::LevelInitialize => id::LEVEL_INITIALIZE,
            ServerPacket::LevelDataChunk(_) => id::LEVEL_DATA_CHUNK,
            ServerPacket::LevelFinalize(_) => id::LEVEL_FINALIZE,
            ServerPacket::SetBlock(_) => id::SET_BLOCK,
            ServerPacket::SpawnPlayer(_) => id::SPAWN_PLAYER,
            ServerPacket::Position(_) => id::POSITION_AND_ORIENTATION,
            ServerPacket::DespawnPlayer(_) => id::DESPAWN_PLAYER,
            ServerPacket::Message(_) => id::MESSAGE,
            ServerPacket::Disconnect(_) => id::DISCONNECT,
            ServerPacket::UpdateUserType(_) => id::UPDATE_USER_TYPE,
            ServerPacket::ExtInfo(_) => id::EXT_INFO,
            ServerPacket::ExtEntry(_) => id::EXT_ENTRY,
            ServerPacket::CustomBlockSupportLevel(_) => id::CUSTOM_BLOCK_SUPPORT_LEVEL,
            ServerPacket::MakeSelection(_) => id::MAKE_SELECTION,
            ServerPacket::RemoveSelection(_) => id::REMOVE_SELECTION,
            ServerPacket::HackControl(_) => id::HACK_CONTROL,
            ServerPacket::DefineBlock(_) => id::DEFINE_BLOCK,
            ServerPacket::RemoveBlockDefinition(_) => id::REMOVE_BLOCK_DEFINITION,
            ServerPacket::BulkBlockUpdate(_) => id::BULK_BLOCK_UPDATE,
        }
    }

    /// Encode the opcode followed by every field.
    pub fn encode(&self) -> Result<Bytes, ProtoError> {
        let mut buf = BytesMut::new();
        match self {
            ServerPacket::Identify(p) => put(&mut buf, p)?,
            ServerPacket::Ping => buf.put_u8(id::PING),
            ServerPacket::LevelInitialize => put(&mut buf, &LevelInitialize)?,
            ServerPacket::LevelDataChunk(p) => put(&mut buf, p)?,
            ServerPacket::LevelFinalize(p) => put(&mut buf, p)?,
            ServerPacket::SetBlock(p) => put(&mut buf, p)?,
            ServerPacket::SpawnPlayer(p) => put(&mut buf, p)?,
            ServerPacket::Position(p) => put(&mut buf, p)?,
            ServerPacket::DespawnPlayer(p) => put(&mut buf, p)?,
            ServerPacket::Message(p) => put(&mut buf, p)?,
            ServerPacket::Disconnect(p) => put(&mut buf, p)?,
            ServerPacket::UpdateUserType(p) => put(&mut buf, p)?,
            ServerPacket::ExtInfo(p) => put(&mut buf, p)?,
            ServerPacket::ExtEntry(p) => put(&mut buf, p)?,
            ServerPacket::CustomBlockSupportLevel(p) => put(&mut buf, p)?,
            ServerPacket::MakeSelection(p) => put(&mut buf, p)?,
            ServerPacket::RemoveSelection(p) => put(&mut buf, p)?,
            ServerPacket::HackControl(p) => put(&mut buf, p)?,
            ServerPacket::DefineBlock(p) => put(&mut buf, p)?,
            ServerPacket::RemoveBlockDefinition(p) => put(&mut buf, p)?,
            ServerPacket::BulkBlockUpdate(p) => put(&mut buf, p)?,
        }
        Ok(buf.freeze())
    }

    /// Decode one server packet, opcode included.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let opcode = codec::read_u8(buf)?;
        Ok(match opcode {
            id::IDENTIFY => ServerPacket::Identify(ServerIdentify::proto_decode(buf)?),
            id::PING => ServerPacket::Ping,
            id::LEVEL_INITIALIZE => ServerPacket::LevelInitialize,
            id::LEVEL_DATA_CHUNK => ServerPacket::LevelDataChunk(LevelDataChunk::proto_decode(buf)?),
            id::LEVEL_FINALIZE => ServerPacket::LevelFinalize(LevelFinalize::proto_decode(buf)?),
            id::SET_BLOCK => ServerPacket::SetBlock(SetBlock::proto_decode(buf)?),
            id::SPAWN_PLAYER => ServerPacket::SpawnPlayer(SpawnPlayer::proto_decode(buf)?),
            id::POSITION_AND_ORIENTATION => {
                ServerPacket::Position(PositionAndOrientation::proto_decode(buf)?)
            }
            id::DESPAWN_PLAYER => ServerPacket::DespawnPlayer(DespawnPlayer::proto_decode(buf)?),
            id::MESSAGE => ServerPacket::Message(Message::proto_decode(buf)?),
            id::DISCONNECT => ServerPacket::Disconnect(Disconnect::proto_decode(buf)?),
            id::UPDATE_USER_TYPE => ServerPacket::UpdateUserType(UpdateUserType::proto_decode(buf)?),
            id::EXT_INFO => ServerPacket::ExtInfo(ExtInfo::proto_decode(buf)?),
            id::EXT_ENTRY => ServerPacket::ExtEntry(ExtEntry::proto_decode(buf)?),
            id::CUSTOM_BLOCK_SUPPORT_LEVEL => {
                ServerPacket::CustomBlockSupportLevel(CustomBlockSupportLevel::proto_decode(buf)?)
            }
            id::MAKE_SELECTION => ServerPacket::MakeSelection(MakeSelection::proto_decode(buf)?),
            id::REMOVE_SELECTION => {
                ServerPacket::RemoveSelection(RemoveSelection::proto_decode(buf)?)
            }
            id::HACK_CONTROL => ServerPacket::HackControl(HackControl::proto_decode(buf)?),
            id::DEFINE_BLOCK => ServerPacket::DefineBlock(DefineBlock::proto_decode(buf)?),
            id::REMOVE_BLOCK_DEFINITION => {
                ServerPacket::RemoveBlockDefinition(RemoveBlockDefinition::proto_decode(buf)?)
            }
            id::BULK_BLOCK_UPDATE => {
                ServerPacket::BulkBlockUpdate(BulkBlockUpdate::proto_decode(buf)?)
            }
            other => return Err(ProtoError::UnknownPacketId(other)),
        })
    }

    /// Decode every packet in a contiguous outbound stream.
    pub fn decode_all(mut data: Bytes) -> Result<Vec<Self>, ProtoError> {
        let mut packets = Vec::new();
        while data.has_remaining() {
            packets.push(Self::decode(&mut data)?);
        }
        Ok(packets)
    }
}

fn put<P: FixedPacket + ProtoEncode>(buf: &mut BytesMut, packet: &P) -> Result<(), ProtoError> {
    buf.reserve(P::SIZE);
    buf.put_u8(P::ID);
    packet.proto_encode(buf)
}
