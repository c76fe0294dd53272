use super::*;

impl ConnectionHandler {
    pub(super) fn handle_set_block(&mut self, id: SessionId, request: SetBlockRequest) -> Result<(), SessionError> {
        let Some(world) = self.worlds.world_of_mut(id) else {
            return Ok(());
        };
        let mut peers = SessionPeers {
            sessions: &mut self.sessions,
        };
        let outcome = world.set_block(&mut peers, id, request.position, request.resulting_block())?;
        trace!(
            session = %id,
            pos = %request.position,
            mode = ?request.mode,
            ?outcome,
            "Block edit"
        );
        Ok(())
    }

    pub(super) fn handle_position(&mut self, id: SessionId, update: PositionAndOrientation) -> Result<(), SessionError> {
        // The entity id the client sends is always its own (-1); ignore it.
        let Some(world) = self.worlds.world_of_mut(id) else {
            return Ok(());
        };
        let mut peers = SessionPeers {
            sessions: &mut self.sessions,
        };
        world.update_position(&mut peers, id, update.position, update.orientation)?;
        Ok(())
    }

    pub(super) fn handle_message(&mut self, id: SessionId, message: Message) {
        let text = message.text.trim();
        if text.is_empty() {
            return;
        }
        let Some(name) = self.sessions.get(&id).and_then(|s| s.name()).map(str::to_string) else {
            return;
        };

        if let Some(command) = text.strip_prefix('/') {
            info!("{name} issued command: /{command}");
            self.run_player_command(id, command);
            return;
        }

        info!("<{name}> {text}");
        self.broadcast(&format!("{name}: {text}"));
    }

    pub(super) fn handle_player_clicked(&mut self, id: SessionId, click: PlayerClicked) {
        trace!(
            session = %id,
            button = click.button,
            action = click.action,
            target_entity = %click.target_entity,
            target_block = %click.target_block,
            "Player clicked"
        );
    }
}
