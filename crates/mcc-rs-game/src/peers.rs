//! Outbound seam between world logic and live connections.

use mcc_rs_proto::extension::Extension;
use mcc_rs_proto::packets::ServerPacket;
use mcc_rs_world::ClientBlocks;

use crate::identity::SessionId;

/// Delivers packets to sessions and answers what each one negotiated.
///
/// Sending to a session that no longer exists is a silent no-op.
pub trait Peers {
    fn send(&mut self, to: SessionId, packet: &ServerPacket);

    fn supports(&self, who: SessionId, ext: Extension) -> bool;

    /// Agreed CustomBlocks support level, 0 if not negotiated.
    fn custom_block_level(&self, who: SessionId) -> u8;

    fn client_blocks(&self, who: SessionId) -> ClientBlocks {
        ClientBlocks {
            custom_level: self.custom_block_level(who),
            definitions: self.supports(who, Extension::BlockDefinitions),
        }
    }
}
