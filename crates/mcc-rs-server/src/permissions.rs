//! Rank assignment from the configured name lists.

use std::collections::HashMap;

use mcc_rs_game::{Identity, Rank, SessionId};

use crate::config::PermissionsSection;

/// Ranks of known accounts, keyed by lower-cased name. Anyone else is a guest.
pub struct Permissions {
    ranks: HashMap<String, Rank>,
}

impl Permissions {
    pub fn from_config(section: &PermissionsSection) -> Self {
        let mut ranks = HashMap::new();
        // Lowest first so a name in several lists keeps its highest rank.
        for (names, rank) in [
            (&section.builders, Rank::Builder),
            (&section.operators, Rank::Operator),
            (&section.admins, Rank::Admin),
        ] {
            for name in names {
                ranks.insert(name.to_ascii_lowercase(), rank);
            }
        }
        Self { ranks }
    }

    pub fn rank_of(&self, name: &str) -> Rank {
        self.ranks
            .get(&name.to_ascii_lowercase())
            .copied()
            .unwrap_or(Rank::Guest)
    }

    /// Identity for a player logging in under `name`.
    pub fn identify(&self, session: SessionId, name: &str) -> Identity {
        let rank = self.rank_of(name);
        if rank == Rank::Guest {
            return Identity::guest(session, name);
        }
        Identity {
            session,
            name: name.to_string(),
            account: Some(name.to_ascii_lowercase()),
            rank,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> PermissionsSection {
        PermissionsSection {
            admins: vec!["Root".into()],
            operators: vec!["alice".into(), "root".into()],
            builders: vec!["bob".into(), "ALICE".into()],
        }
    }

    #[test]
    fn highest_listed_rank_wins() {
        let perms = Permissions::from_config(&section());
        assert_eq!(perms.rank_of("root"), Rank::Admin);
        assert_eq!(perms.rank_of("Alice"), Rank::Operator);
        assert_eq!(perms.rank_of("bob"), Rank::Builder);
        assert_eq!(perms.rank_of("mallory"), Rank::Guest);
    }

    #[test]
    fn listed_players_get_accounts() {
        let perms = Permissions::from_config(&section());
        let bob = perms.identify(SessionId(1), "Bob");
        assert_eq!(bob.account.as_deref(), Some("bob"));
        assert_eq!(bob.name, "Bob");
        let eve = perms.identify(SessionId(2), "eve");
        assert!(eve.is_guest());
        assert_eq!(eve.rank, Rank::Guest);
    }
}
