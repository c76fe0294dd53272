use super::*;

const MAX_NAME_LEN: usize = 16;

fn valid_username(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

impl ConnectionHandler {
    // -----------------------------------------------------------------------
    // Identify and extension handshake
    // -----------------------------------------------------------------------

    pub(super) fn handle_identify(&mut self, id: SessionId, login: Identify) -> Result<(), SessionError> {
        if login.protocol_version != PROTOCOL_VERSION {
            return Err(SessionError::UnsupportedProtocol(login.protocol_version));
        }
        if !valid_username(&login.username) {
            return Err(SessionError::InvalidName);
        }

        let Some(session) = self.sessions.get_mut(&id) else {
            return Ok(());
        };
        debug!(
            session = %id,
            player = %login.username,
            extended = login.trailer == NEGOTIATION_MAGIC,
            "Identify received"
        );

        if login.trailer != NEGOTIATION_MAGIC {
            return self.finish_login(id, login, NegotiatedCapabilities::none());
        }

        let (negotiator, packets) = Negotiator::start(self.capabilities.clone(), SERVER_SOFTWARE);
        for packet in &packets {
            session.send(packet);
        }
        session.login = Some(login);
        session.phase = Phase::Negotiating(negotiator);
        Ok(())
    }

    pub(super) fn handle_negotiation(&mut self, id: SessionId, packet: ClientPacket) -> Result<(), SessionError> {
        let Some(session) = self.sessions.get_mut(&id) else {
            return Ok(());
        };
        let Phase::Negotiating(negotiator) = &mut session.phase else {
            return Err(SessionError::NotLoggedIn);
        };
        let replies = negotiator.handle(packet)?;
        trace!(session = %id, state = ?negotiator.state(), "Negotiation step");
        let done = negotiator.is_done();
        for packet in &replies {
            session.send(packet);
        }
        if !done {
            return Ok(());
        }

        let caps = match std::mem::replace(&mut session.phase, Phase::AwaitIdentify) {
            Phase::Negotiating(negotiator) => negotiator.finish(),
            _ => return Err(SessionError::NotLoggedIn),
        };
        let login = session.login.take().ok_or(SessionError::NotLoggedIn)?;
        self.finish_login(id, login, caps)
    }

    // -----------------------------------------------------------------------
    // Entering the game
    // -----------------------------------------------------------------------

    /// Admit the player: replace any older session under the same name,
    /// enforce the player cap, then join the main world.
    fn finish_login(
        &mut self,
        id: SessionId,
        login: Identify,
        caps: NegotiatedCapabilities,
    ) -> Result<(), SessionError> {
        let name = login.username;
        if let Some(older) = self.session_by_name(&name).filter(|&other| other != id) {
            self.kick(older, "Logged in from another location");
            self.remove_session(older);
        }
        if self.playing_count() >= self.config.server.max_players {
            return Err(SessionError::ServerFull);
        }

        let identity = self.permissions.identify(id, &name);
        let user_type = if identity.rank >= Rank::Operator {
            USER_TYPE_OP
        } else {
            0
        };
        let Some(session) = self.sessions.get_mut(&id) else {
            return Ok(());
        };
        session.send(&ServerPacket::Identify(ServerIdentify {
            protocol_version: PROTOCOL_VERSION,
            server_name: self.config.server.name.clone(),
            motd: self.config.server.motd.clone(),
            user_type,
        }));

        let agreed: Vec<String> = caps
            .agreed()
            .map(|(ext, version)| format!("{}/{version}", ext.name()))
            .collect();
        info!(
            player = %name,
            addr = %session.addr,
            rank = %identity.rank,
            extensions = ?agreed,
            "Player logged in"
        );
        session.enter_play(caps, identity.clone());

        let main = self.worlds.main_name().to_string();
        let mut peers = SessionPeers {
            sessions: &mut self.sessions,
        };
        self.worlds
            .join(&mut peers, &main, &identity, JoinMode::Participant)?;
        self.broadcast(&format!("{name} joined the game"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(valid_username("alice"));
        assert!(valid_username("Bob_the.2nd"));
        assert!(valid_username("a"));
        assert!(!valid_username(""));
        assert!(!valid_username("two words"));
        assert!(!valid_username("seventeen_chars__"));
        assert!(!valid_username("émile"));
    }
}
