//! Protocol encoding/decoding traits and fixed-width field helpers.
//!
//! Every field on the wire has a fixed size. Integers are big-endian,
//! strings occupy 64 bytes padded with spaces and byte arrays occupy
//! 1024 bytes padded with zeroes.

use bytes::{Buf, BufMut};

use crate::error::ProtoError;

/// Width of a string field in bytes.
pub const STRING_LEN: usize = 64;

/// Width of a byte array field in bytes.
pub const ARRAY_LEN: usize = 1024;

/// Encode a value onto a buffer.
pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError>;
}

/// Decode a value from a buffer.
///
/// Implementations must consume every declared field, even ones they
/// discard, or the rest of the stream desynchronises.
pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

/// Fail unless `buf` holds at least `needed` bytes.
pub fn ensure(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

pub fn read_u8(buf: &mut impl Buf) -> Result<u8, ProtoError> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

pub fn read_i8(buf: &mut impl Buf) -> Result<i8, ProtoError> {
    ensure(buf, 1)?;
    Ok(buf.get_i8())
}

pub fn read_i16(buf: &mut impl Buf) -> Result<i16, ProtoError> {
    ensure(buf, 2)?;
    Ok(buf.get_i16())
}

pub fn read_i32(buf: &mut impl Buf) -> Result<i32, ProtoError> {
    ensure(buf, 4)?;
    Ok(buf.get_i32())
}

pub fn read_bool(buf: &mut impl Buf) -> Result<bool, ProtoError> {
    Ok(read_u8(buf)? != 0)
}

/// Write a 64-byte string field.
///
/// Characters outside ASCII become `?`. Input longer than the field is
/// truncated, shorter input is right-padded with spaces.
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    let mut written = 0;
    for c in s.chars().take(STRING_LEN) {
        buf.put_u8(if c.is_ascii() { c as u8 } else { b'?' });
        written += 1;
    }
    buf.put_bytes(b' ', STRING_LEN - written);
}

/// Read a 64-byte string field, trimming the trailing space padding.
pub fn read_string(buf: &mut impl Buf) -> Result<String, ProtoError> {
    ensure(buf, STRING_LEN)?;
    let mut raw = [0u8; STRING_LEN];
    buf.copy_to_slice(&mut raw);
    let text: String = raw
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect();
    Ok(text.trim_end_matches(' ').to_string())
}

/// Write a 1024-byte array field, zero-padding short input.
pub fn write_array(buf: &mut impl BufMut, data: &[u8]) -> Result<(), ProtoError> {
    if data.len() > ARRAY_LEN {
        return Err(ProtoError::ArrayTooLong {
            len: data.len(),
            max: ARRAY_LEN,
        });
    }
    buf.put_slice(data);
    buf.put_bytes(0, ARRAY_LEN - data.len());
    Ok(())
}

/// Read a 1024-byte array field.
pub fn read_array(buf: &mut impl Buf) -> Result<Vec<u8>, ProtoError> {
    ensure(buf, ARRAY_LEN)?;
    let mut data = vec![0u8; ARRAY_LEN];
    buf.copy_to_slice(&mut data);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn string_is_space_padded() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "Notch");
        assert_eq!(buf.len(), STRING_LEN);
        assert_eq!(&buf[..5], b"Notch");
        assert!(buf[5..].iter().all(|&b| b == b' '));
        assert_eq!(read_string(&mut buf.freeze()).unwrap(), "Notch");
    }

    #[test]
    fn string_truncates_at_field_width() {
        let long = "a".repeat(65);
        let mut buf = BytesMut::new();
        write_string(&mut buf, &long);
        assert_eq!(buf.len(), STRING_LEN);
        assert_eq!(read_string(&mut buf.freeze()).unwrap(), "a".repeat(64));
    }

    #[test]
    fn string_exactly_field_width() {
        let exact = "b".repeat(64);
        let mut buf = BytesMut::new();
        write_string(&mut buf, &exact);
        assert_eq!(read_string(&mut buf.freeze()).unwrap(), exact);
    }

    #[test]
    fn string_keeps_leading_spaces() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "  hi");
        assert_eq!(read_string(&mut buf.freeze()).unwrap(), "  hi");
    }

    #[test]
    fn string_non_ascii_replaced() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "héllo");
        assert_eq!(read_string(&mut buf.freeze()).unwrap(), "h?llo");
    }

    #[test]
    fn string_buffer_too_short() {
        let mut short = &[b'x'; 10][..];
        assert!(matches!(
            read_string(&mut short),
            Err(ProtoError::BufferTooShort { needed: 64, remaining: 10 })
        ));
    }

    #[test]
    fn array_zero_padded() {
        let mut buf = BytesMut::new();
        write_array(&mut buf, &[1, 2, 3]).unwrap();
        assert_eq!(buf.len(), ARRAY_LEN);
        let data = read_array(&mut buf.freeze()).unwrap();
        assert_eq!(&data[..3], &[1, 2, 3]);
        assert!(data[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn array_rejects_oversized_source() {
        let mut buf = BytesMut::new();
        let err = write_array(&mut buf, &[0u8; 1025]).unwrap_err();
        assert!(matches!(err, ProtoError::ArrayTooLong { len: 1025, max: 1024 }));
        assert!(buf.is_empty());
    }

    #[test]
    fn integers_are_big_endian() {
        let mut buf = BytesMut::new();
        buf.put_i16(0x0102);
        buf.put_i32(-2);
        assert_eq!(&buf[..2], &[0x01, 0x02]);
        let mut frozen = buf.freeze();
        assert_eq!(read_i16(&mut frozen).unwrap(), 0x0102);
        assert_eq!(read_i32(&mut frozen).unwrap(), -2);
        assert!(read_u8(&mut frozen).is_err());
    }
}
