//! Level stream compression.
//!
//! A world is sent as one gzip stream containing a big-endian `u32` block
//! count followed by the raw block array.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::ProtoError;

/// Default gzip level used when the configuration does not override it.
pub const DEFAULT_LEVEL: u32 = 6;

/// Compress a block array into the level stream format.
pub fn compress_level(blocks: &[u8], level: u32) -> Result<Vec<u8>, ProtoError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level.min(9)));
    encoder
        .write_all(&(blocks.len() as u32).to_be_bytes())
        .map_err(|e| ProtoError::CompressError(e.to_string()))?;
    encoder
        .write_all(blocks)
        .map_err(|e| ProtoError::CompressError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ProtoError::CompressError(e.to_string()))
}

/// Decompress a level stream and return the block array it carries.
pub fn decompress_level(data: &[u8]) -> Result<Vec<u8>, ProtoError> {
    let mut decoder = GzDecoder::new(data);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| ProtoError::DecompressError(e.to_string()))?;
    if raw.len() < 4 {
        return Err(ProtoError::BufferTooShort {
            needed: 4,
            remaining: raw.len(),
        });
    }
    let declared = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
    let blocks = raw.split_off(4);
    if blocks.len() != declared {
        return Err(ProtoError::LevelLengthMismatch {
            declared,
            actual: blocks.len(),
        });
    }
    Ok(blocks)
}
