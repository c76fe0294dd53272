//! Classic block-game protocol: fixed-width codec, packet definitions and
//! the level stream format.

pub mod codec;
pub mod compression;
pub mod error;
pub mod extension;
pub mod packets;
pub mod types;
