//! Who a connection is once it has identified.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Process-unique handle for one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Permission level, ordered from least to most privileged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    #[default]
    Guest,
    Builder,
    Operator,
    Admin,
}

impl Rank {
    pub fn name(self) -> &'static str {
        match self {
            Rank::Guest => "guest",
            Rank::Builder => "builder",
            Rank::Operator => "operator",
            Rank::Admin => "admin",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A logged-in player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub session: SessionId,
    pub name: String,
    /// Account this player is bound to; `None` for guests.
    pub account: Option<String>,
    pub rank: Rank,
}

impl Identity {
    pub fn guest(session: SessionId, name: impl Into<String>) -> Self {
        Self {
            session,
            name: name.into(),
            account: None,
            rank: Rank::Guest,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.account.is_none()
    }
}

/// How a session takes part in a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinMode {
    /// Visible to, and sees, other participants.
    Participant,
    /// Sees participants but is visible to no one.
    Observer,
}
