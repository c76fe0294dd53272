//! Level streaming: LevelInitialize, LevelDataChunk, LevelFinalize.

use bytes::{Buf, BufMut};

use super::FixedPacket;
use crate::codec::{self, ProtoDecode, ProtoEncode, ARRAY_LEN};
use crate::error::ProtoError;

/// LevelInitialize (0x02) — Server → Client. No payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInitialize;

impl FixedPacket for LevelInitialize {
    const ID: u8 = super::id::LEVEL_INITIALIZE;
    const SIZE: usize = 1;
}

impl ProtoEncode for LevelInitialize {
    fn proto_encode(&self, _buf: &mut impl BufMut) -> Result<(), ProtoError> {
        Ok(())
    }
}

impl ProtoDecode for LevelInitialize {
    fn proto_decode(_buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self)
    }
}

/// LevelDataChunk (0x03) — Server → Client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDataChunk {
    /// Meaningful bytes in `data`; the rest of the field is zero padding.
    pub data: Vec<u8>,
    pub percent: u8,
}

impl LevelDataChunk {
    /// Slice a compressed level stream into chunk packets.
    pub fn split(compressed: &[u8]) -> Vec<LevelDataChunk> {
        let total = compressed.len().max(1);
        let mut sent = 0usize;
        compressed
            .chunks(ARRAY_LEN)
            .map(|chunk| {
                sent += chunk.len();
                LevelDataChunk {
                    data: chunk.to_vec(),
                    percent: (sent * 100 / total) as u8,
                }
            })
            .collect()
    }
}

impl FixedPacket for LevelDataChunk {
    const ID: u8 = super::id::LEVEL_DATA_CHUNK;
    const SIZE: usize = 1028;
}

impl ProtoEncode for LevelDataChunk {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        if self.data.len() > ARRAY_LEN {
            return Err(ProtoError::ArrayTooLong {
                len: self.data.len(),
                max: ARRAY_LEN,
            });
        }
        buf.put_i16(self.data.len() as i16);
        codec::write_array(buf, &self.data)?;
        buf.put_u8(self.percent);
        Ok(())
    }
}

impl ProtoDecode for LevelDataChunk {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let len = codec::read_i16(buf)?;
        let mut data = codec::read_array(buf)?;
        let percent = codec::read_u8(buf)?;
        if !(0..=ARRAY_LEN as i16).contains(&len) {
            return Err(ProtoError::InvalidValue {
                field: "chunk length",
                value: len as i64,
            });
        }
        data.truncate(len as usize);
        Ok(Self { data, percent })
    }
}

/// LevelFinalize (0x04) — Server → Client. Carries the world dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelFinalize {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl FixedPacket for LevelFinalize {
    const ID: u8 = super::id::LEVEL_FINALIZE;
    const SIZE: usize = 7;
}

impl ProtoEncode for LevelFinalize {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
        Ok(())
    }
}

impl ProtoDecode for LevelFinalize {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            x: codec::read_i16(buf)?,
            y: codec::read_i16(buf)?,
            z: codec::read_i16(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn split_into_field_sized_chunks() {
        let stream = vec![7u8; 2500];
        let chunks = LevelDataChunk::split(&stream);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].data.len(), 1024);
        assert_eq!(chunks[2].data.len(), 452);
        assert_eq!(chunks[0].percent, 40);
        assert_eq!(chunks[2].percent, 100);
        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.data.clone()).collect();
        assert_eq!(joined, stream);
    }

    #[test]
    fn chunk_wire_layout() {
        let chunk = LevelDataChunk {
            data: vec![1, 2, 3],
            percent: 50,
        };
        let mut buf = BytesMut::new();
        chunk.proto_encode(&mut buf).unwrap();
        assert_eq!(buf.len(), LevelDataChunk::SIZE - 1);
        assert_eq!(&buf[..5], &[0, 3, 1, 2, 3]);
        assert_eq!(buf[1026], 50);
        assert_eq!(LevelDataChunk::proto_decode(&mut buf.freeze()).unwrap(), chunk);
    }

    #[test]
    fn oversized_chunk_rejected() {
        let chunk = LevelDataChunk {
            data: vec![0; 1025],
            percent: 0,
        };
        let mut buf = BytesMut::new();
        assert!(chunk.proto_encode(&mut buf).is_err());
        assert!(buf.is_empty());
    }
}
