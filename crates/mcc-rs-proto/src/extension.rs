//! Optional protocol extensions that client and server may agree on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Trailer byte of the client identification that requests negotiation.
pub const NEGOTIATION_MAGIC: u8 = 0x42;

/// Highest custom block support level this server implements.
pub const CUSTOM_BLOCKS_LEVEL: u8 = 1;

/// A protocol extension known to this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Extension {
    /// Blocks 50..=65 and the support-level sub-exchange.
    CustomBlocks,
    /// Server-defined blocks (0x23 / 0x24).
    BlockDefinitions,
    /// Batched block changes (0x26).
    BulkBlockUpdate,
    /// Named cuboid highlights (0x1a / 0x1b).
    SelectionCuboid,
    /// Movement-assist toggles (0x20).
    HackControl,
    /// Client click events (0x22).
    PlayerClick,
    /// Non-chat message channels.
    MessageTypes,
}

impl Extension {
    pub const ALL: [Extension; 7] = [
        Extension::CustomBlocks,
        Extension::BlockDefinitions,
        Extension::BulkBlockUpdate,
        Extension::SelectionCuboid,
        Extension::HackControl,
        Extension::PlayerClick,
        Extension::MessageTypes,
    ];

    /// Name used in ExtEntry packets.
    pub fn name(self) -> &'static str {
        match self {
            Extension::CustomBlocks => "CustomBlocks",
            Extension::BlockDefinitions => "BlockDefinitions",
            Extension::BulkBlockUpdate => "BulkBlockUpdate",
            Extension::SelectionCuboid => "SelectionCuboid",
            Extension::HackControl => "HackControl",
            Extension::PlayerClick => "PlayerClick",
            Extension::MessageTypes => "MessageTypes",
        }
    }

    /// Look up an extension by its wire name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ext| ext.name() == name)
    }

    /// Highest version of this extension the server implements.
    pub fn version(self) -> i32 {
        1
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for ext in Extension::ALL {
            assert_eq!(Extension::from_name(ext.name()), Some(ext));
        }
    }

    #[test]
    fn unknown_name() {
        assert_eq!(Extension::from_name("EnvColors"), None);
        assert_eq!(Extension::from_name("customblocks"), None);
    }
}
