use mcc_rs_proto::types::BlockPos;

/// Errors raised by the world model.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("position {0} is outside the world")]
    OutOfBounds(BlockPos),

    #[error("invalid world dimensions {x}x{y}x{z}")]
    InvalidDimensions { x: i16, y: i16, z: i16 },

    #[error("block data length mismatch: expected {expected}, got {actual}")]
    BlockDataLength { expected: usize, actual: usize },

    #[error("block id {0} cannot be defined")]
    UndefinableBlock(u8),

    #[error("fallback {fallback} for block {block} is not a built-in block")]
    InvalidFallback { block: u8, fallback: u8 },

    #[error("block {0} has no definition")]
    UnknownBlock(u8),
}
