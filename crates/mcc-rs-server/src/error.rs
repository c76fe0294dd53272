use mcc_rs_game::{RegistryError, SyncError};
use mcc_rs_proto::error::ProtoError;

/// Handshake failures during capability negotiation.
#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    #[error("unexpected packet 0x{0:02x} during extension negotiation")]
    UnexpectedPacket(u8),

    #[error("extension '{0}' declared twice")]
    DuplicateExtension(String),

    #[error("invalid extension count {0}")]
    InvalidCount(i16),
}

/// Anything that ends a connection. The message is sent as the
/// disconnect reason.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Unknown packet 0x{0:02x}")]
    UnknownOpcode(u8),

    #[error("Unsupported protocol version {0}")]
    UnsupportedProtocol(u8),

    #[error("Invalid username")]
    InvalidName,

    #[error("Server is full")]
    ServerFull,

    #[error("Packet not allowed before login")]
    NotLoggedIn,

    #[error("Protocol error: {0}")]
    Proto(#[from] ProtoError),

    #[error("Protocol error: {0}")]
    Negotiation(#[from] NegotiationError),

    #[error("{0}")]
    Sync(#[from] SyncError),

    #[error("{0}")]
    Registry(#[from] RegistryError),
}
