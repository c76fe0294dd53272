//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("byte array of {len} bytes does not fit a {max}-byte field")]
    ArrayTooLong { len: usize, max: usize },

    #[error("bulk update carries {0} entries (expected 1..=256)")]
    BulkCount(usize),

    #[error("unknown packet id: 0x{0:02X}")]
    UnknownPacketId(u8),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: i64 },

    #[error("compression error: {0}")]
    CompressError(String),

    #[error("decompression error: {0}")]
    DecompressError(String),

    #[error("level stream length mismatch: header says {declared}, payload has {actual}")]
    LevelLengthMismatch { declared: usize, actual: usize },
}
