//! Player entity packets: SpawnPlayer, DespawnPlayer, PositionAndOrientation.

use bytes::{Buf, BufMut};

use super::FixedPacket;
use crate::codec::{self, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{EntityId, Orientation, PlayerPos};

/// SpawnPlayer (0x07) — Server → Client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnPlayer {
    pub entity_id: EntityId,
    pub name: String,
    pub position: PlayerPos,
    pub orientation: Orientation,
}

impl FixedPacket for SpawnPlayer {
    const ID: u8 = super::id::SPAWN_PLAYER;
    const SIZE: usize = 74;
}

impl ProtoEncode for SpawnPlayer {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_i8(self.entity_id.0);
        codec::write_string(buf, &self.name);
        self.position.proto_encode(buf)?;
        self.orientation.proto_encode(buf)
    }
}

impl ProtoDecode for SpawnPlayer {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            entity_id: EntityId(codec::read_i8(buf)?),
            name: codec::read_string(buf)?,
            position: PlayerPos::proto_decode(buf)?,
            orientation: Orientation::proto_decode(buf)?,
        })
    }
}

/// DespawnPlayer (0x0c) — Server → Client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DespawnPlayer {
    pub entity_id: EntityId,
}

impl FixedPacket for DespawnPlayer {
    const ID: u8 = super::id::DESPAWN_PLAYER;
    const SIZE: usize = 2;
}

impl ProtoEncode for DespawnPlayer {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_i8(self.entity_id.0);
        Ok(())
    }
}

impl ProtoDecode for DespawnPlayer {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            entity_id: EntityId(codec::read_i8(buf)?),
        })
    }
}

/// PositionAndOrientation (0x08) — both directions.
///
/// Clients always send [`EntityId::SELF`]; the server fills in the mover's id
/// when relaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionAndOrientation {
    pub entity_id: EntityId,
    pub position: PlayerPos,
    pub orientation: Orientation,
}

impl FixedPacket for PositionAndOrientation {
    const ID: u8 = super::id::POSITION_AND_ORIENTATION;
    const SIZE: usize = 10;
}

impl ProtoEncode for PositionAndOrientation {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_i8(self.entity_id.0);
        self.position.proto_encode(buf)?;
        self.orientation.proto_encode(buf)
    }
}

impl ProtoDecode for PositionAndOrientation {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            entity_id: EntityId(codec::read_i8(buf)?),
            position: PlayerPos::proto_decode(buf)?,
            orientation: Orientation::proto_decode(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn spawn_roundtrip() {
        let pkt = SpawnPlayer {
            entity_id: EntityId::SELF,
            name: "steve".into(),
            position: PlayerPos::new(64, 83, 64),
            orientation: Orientation { yaw: 64, pitch: 0 },
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf).unwrap();
        assert_eq!(buf.len(), SpawnPlayer::SIZE - 1);
        assert_eq!(buf[0], 0xFF);
        assert_eq!(SpawnPlayer::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn position_wire_layout() {
        let pkt = PositionAndOrientation {
            entity_id: EntityId(3),
            position: PlayerPos::new(1, 2, 3),
            orientation: Orientation { yaw: 4, pitch: 5 },
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf).unwrap();
        assert_eq!(&buf[..], &[3, 0, 1, 0, 2, 0, 3, 4, 5]);
    }
}
