//! Capability (extension) negotiation.
//!
//! The server's supported set is an immutable [`CapabilityTable`] built once
//! at start-up and shared by every connection. Each connection runs its own
//! [`Negotiator`], a pure state machine that consumes client packets and
//! returns the packets to send back.

use std::collections::BTreeMap;
use std::sync::Arc;

use mcc_rs_proto::extension::{Extension, CUSTOM_BLOCKS_LEVEL};
use mcc_rs_proto::packets::{
    id, ClientPacket, CustomBlockSupportLevel, ExtEntry, ExtInfo, ServerPacket,
};
use tracing::{debug, trace};

use crate::error::NegotiationError;

/// Extensions this server offers, with the highest version of each.
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    versions: BTreeMap<Extension, i32>,
}

impl CapabilityTable {
    pub fn new(versions: impl IntoIterator<Item = (Extension, i32)>) -> Self {
        Self {
            versions: versions.into_iter().collect(),
        }
    }

    /// Every known extension at its implemented version, minus `disabled`.
    pub fn standard(disabled: &[Extension]) -> Self {
        Self::new(
            Extension::ALL
                .iter()
                .filter(|ext| !disabled.contains(ext))
                .map(|&ext| (ext, ext.version())),
        )
    }

    pub fn version(&self, ext: Extension) -> Option<i32> {
        self.versions.get(&ext).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Extension, i32)> + '_ {
        self.versions.iter().map(|(&ext, &v)| (ext, v))
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Per-extension negotiation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiated {
    /// Sent by the server, not (yet) confirmed by the client.
    Offered,
    Agreed(i32),
}

/// What one connection ended up with. Frozen once negotiation finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NegotiatedCapabilities {
    entries: BTreeMap<Extension, Negotiated>,
    custom_block_level: u8,
}

impl NegotiatedCapabilities {
    /// The empty set used when a client does not negotiate.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn supports(&self, ext: Extension) -> bool {
        matches!(self.entries.get(&ext), Some(Negotiated::Agreed(_)))
    }

    pub fn version(&self, ext: Extension) -> Option<i32> {
        match self.entries.get(&ext) {
            Some(Negotiated::Agreed(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn custom_block_level(&self) -> u8 {
        self.custom_block_level
    }

    /// Agreed extensions with their mutual versions.
    pub fn agreed(&self) -> impl Iterator<Item = (Extension, i32)> + '_ {
        self.entries.iter().filter_map(|(&ext, n)| match n {
            Negotiated::Agreed(v) => Some((ext, *v)),
            Negotiated::Offered => None,
        })
    }
}

/// Where a negotiation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    AwaitClientHeader,
    AwaitClientEntries { remaining: u16 },
    AwaitSupportLevel,
    Done,
}

pub struct Negotiator {
    table: Arc<CapabilityTable>,
    caps: NegotiatedCapabilities,
    state: NegotiationState,
}

impl Negotiator {
    /// Begin negotiating: returns the server header and one entry per
    /// offered extension, each recorded as offered.
    pub fn start(table: Arc<CapabilityTable>, app_name: &str) -> (Self, Vec<ServerPacket>) {
        let mut packets = Vec::with_capacity(table.len() + 1);
        packets.push(ServerPacket::ExtInfo(ExtInfo {
            app_name: app_name.to_string(),
            extension_count: table.len() as i16,
        }));

        let mut caps = NegotiatedCapabilities::none();
        for (ext, version) in table.iter() {
            caps.entries.insert(ext, Negotiated::Offered);
            packets.push(ServerPacket::ExtEntry(ExtEntry {
                name: ext.name().to_string(),
                version,
            }));
        }

        let negotiator = Self {
            table,
            caps,
            state: NegotiationState::AwaitClientHeader,
        };
        (negotiator, packets)
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == NegotiationState::Done
    }

    /// The only opcode accepted in the current state.
    pub fn expected_opcode(&self) -> Option<u8> {
        match self.state {
            NegotiationState::AwaitClientHeader => Some(id::EXT_INFO),
            NegotiationState::AwaitClientEntries { .. } => Some(id::EXT_ENTRY),
            NegotiationState::AwaitSupportLevel => Some(id::CUSTOM_BLOCK_SUPPORT_LEVEL),
            NegotiationState::Done => None,
        }
    }

    /// Feed one client packet. Returns packets to send in reply.
    pub fn handle(&mut self, packet: ClientPacket) -> Result<Vec<ServerPacket>, NegotiationError> {
        match (self.state, packet) {
            (NegotiationState::AwaitClientHeader, ClientPacket::ExtInfo(info)) => {
                debug!(
                    app = %info.app_name,
                    count = info.extension_count,
                    "Client extension header"
                );
                let remaining = u16::try_from(info.extension_count)
                    .map_err(|_| NegotiationError::InvalidCount(info.extension_count))?;
                Ok(self.after_entries(remaining))
            }
            (NegotiationState::AwaitClientEntries { remaining }, ClientPacket::ExtEntry(entry)) => {
                self.confirm(&entry)?;
                Ok(self.after_entries(remaining - 1))
            }
            (NegotiationState::AwaitSupportLevel, ClientPacket::CustomBlockSupportLevel(level)) => {
                self.caps.custom_block_level = level.level.min(CUSTOM_BLOCKS_LEVEL);
                self.state = NegotiationState::Done;
                Ok(Vec::new())
            }
            (_, other) => Err(NegotiationError::UnexpectedPacket(other.opcode())),
        }
    }

    fn confirm(&mut self, entry: &ExtEntry) -> Result<(), NegotiationError> {
        let Some(ext) = Extension::from_name(&entry.name) else {
            trace!(name = %entry.name, "Ignoring unknown extension");
            return Ok(());
        };
        let Some(server_version) = self.table.version(ext) else {
            trace!(name = %entry.name, "Ignoring extension not offered");
            return Ok(());
        };
        match self.caps.entries.get(&ext) {
            Some(Negotiated::Agreed(_)) => Err(NegotiationError::DuplicateExtension(entry.name.clone())),
            _ => {
                let mutual = server_version.min(entry.version);
                self.caps.entries.insert(ext, Negotiated::Agreed(mutual));
                Ok(())
            }
        }
    }

    fn after_entries(&mut self, remaining: u16) -> Vec<ServerPacket> {
        if remaining > 0 {
            self.state = NegotiationState::AwaitClientEntries { remaining };
            return Vec::new();
        }
        if self.caps.supports(Extension::CustomBlocks) {
            self.state = NegotiationState::AwaitSupportLevel;
            vec![ServerPacket::CustomBlockSupportLevel(CustomBlockSupportLevel {
                level: CUSTOM_BLOCKS_LEVEL,
            })]
        } else {
            self.state = NegotiationState::Done;
            Vec::new()
        }
    }

    /// The negotiated set. Only meaningful once [`Negotiator::is_done`].
    pub fn finish(self) -> NegotiatedCapabilities {
        self.caps
    }
}
