//! Session bookkeeping and packet dispatch.
//!
//! [`ConnectionHandler`] owns every session and every world and runs on a
//! single task: socket events come in through [`ConnectionHandler::handle_event`],
//! buffered input is dispatched by [`ConnectionHandler::pump`], and nothing
//! else touches game state.

mod commands;
mod login;
mod play;

use std::collections::BTreeMap;
use std::sync::Arc;

use mcc_rs_game::{
    EditOutcome, JoinMode, MultiplayerWorld, Peers, Rank, RegistryError, SessionId, SyncError,
    Worlds,
};
use mcc_rs_proto::extension::{Extension, NEGOTIATION_MAGIC};
use mcc_rs_proto::packets::{
    ClientPacket, Identify, Message, PlayerClicked, PositionAndOrientation, ServerIdentify,
    ServerPacket, SetBlockRequest, PROTOCOL_VERSION, USER_TYPE_OP,
};
use mcc_rs_proto::types::{BlockPos, EntityId};
use mcc_rs_world::flat_generator::generate_flat;
use mcc_rs_world::Dimensions;
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

use crate::capability::{CapabilityTable, NegotiatedCapabilities, Negotiator};
use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::net::NetEvent;
use crate::permissions::Permissions;
use crate::session::{Phase, Session};

/// Application name sent in the extension header.
pub const SERVER_SOFTWARE: &str = concat!("MCC-RS ", env!("CARGO_PKG_VERSION"));

/// Routes world output to live sessions.
struct SessionPeers<'a> {
    sessions: &'a mut BTreeMap<SessionId, Session>,
}

impl Peers for SessionPeers<'_> {
    fn send(&mut self, to: SessionId, packet: &ServerPacket) {
        if let Some(session) = self.sessions.get_mut(&to) {
            session.send(packet);
        }
    }

    fn supports(&self, who: SessionId, ext: Extension) -> bool {
        self.sessions
            .get(&who)
            .is_some_and(|s| s.caps().supports(ext))
    }

    fn custom_block_level(&self, who: SessionId) -> u8 {
        self.sessions
            .get(&who)
            .map_or(0, |s| s.caps().custom_block_level())
    }
}

pub struct ConnectionHandler {
    config: Arc<ServerConfig>,
    capabilities: Arc<CapabilityTable>,
    permissions: Permissions,
    sessions: BTreeMap<SessionId, Session>,
    worlds: Worlds,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl ConnectionHandler {
    pub fn new(
        config: Arc<ServerConfig>,
        capabilities: Arc<CapabilityTable>,
        shutdown_tx: Arc<watch::Sender<bool>>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let main = build_world(&config, &config.world.name, config.world.dimensions())?;
        let worlds = Worlds::new(main)?;
        info!(
            world = worlds.main_name(),
            extensions = capabilities.len(),
            "Main world ready"
        );
        Ok(Self {
            permissions: Permissions::from_config(&config.permissions),
            config,
            capabilities,
            sessions: BTreeMap::new(),
            worlds,
            shutdown_tx,
        })
    }

    // -----------------------------------------------------------------------
    // Socket events
    // -----------------------------------------------------------------------

    pub fn handle_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::Connected { id, addr, outbound } => {
                info!(session = %id, %addr, "Client connected");
                self.sessions.insert(id, Session::new(id, addr, outbound));
            }
            NetEvent::Data { id, data } => {
                if let Some(session) = self.sessions.get_mut(&id) {
                    session.receive(&data);
                }
            }
            NetEvent::Closed { id } => self.remove_session(id),
        }
    }

    /// Dispatch buffered input. Each pass takes at most one packet from each
    /// session, so one busy client cannot starve the others; passes repeat
    /// until no session has a complete packet. Sessions marked closing are
    /// dropped at the end.
    pub fn pump(&mut self) {
        let ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        loop {
            let mut progressed = false;
            for &id in &ids {
                let next = match self.sessions.get_mut(&id) {
                    Some(s) if !s.is_closing() && s.has_input() => s.next_packet(),
                    _ => continue,
                };
                match next {
                    Ok(Some(packet)) => {
                        progressed = true;
                        if let Err(e) = self.handle_packet(id, packet) {
                            warn!(session = %id, "Dropping session: {e}");
                            self.kick(id, &e.to_string());
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(session = %id, "Bad input: {e}");
                        self.kick(id, &e.to_string());
                    }
                }
            }
            if !progressed {
                break;
            }
        }
        self.reap();
    }

    fn handle_packet(&mut self, id: SessionId, packet: ClientPacket) -> Result<(), SessionError> {
        match packet {
            ClientPacket::Identify(p) => self.handle_identify(id, p),
            p @ (ClientPacket::ExtInfo(_)
            | ClientPacket::ExtEntry(_)
            | ClientPacket::CustomBlockSupportLevel(_)) => self.handle_negotiation(id, p),
            ClientPacket::SetBlock(p) => self.handle_set_block(id, p),
            ClientPacket::Position(p) => self.handle_position(id, p),
            ClientPacket::Message(p) => {
                self.handle_message(id, p);
                Ok(())
            }
            ClientPacket::PlayerClicked(p) => {
                self.handle_player_clicked(id, p);
                Ok(())
            }
        }
    }

    /// Ping every session. Sessions whose queue has filled up or whose
    /// writer has gone are dropped.
    pub fn liveness_tick(&mut self) {
        for session in self.sessions.values_mut() {
            session.send(&ServerPacket::Ping);
        }
        self.reap();
    }

    /// Disconnect everyone.
    pub fn shutdown(&mut self, reason: &str) {
        for session in self.sessions.values_mut() {
            session.disconnect(reason);
        }
        self.reap();
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    pub fn kick(&mut self, id: SessionId, reason: &str) {
        if let Some(session) = self.sessions.get_mut(&id) {
            info!(
                session = %id,
                player = session.name().unwrap_or("-"),
                reason,
                "Disconnecting"
            );
            session.disconnect(reason);
        }
    }

    fn reap(&mut self) {
        let closing: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|s| s.is_closing())
            .map(|s| s.id)
            .collect();
        for id in closing {
            self.remove_session(id);
        }
    }

    /// Take the session out of its world, then forget it.
    fn remove_session(&mut self, id: SessionId) {
        let mut peers = SessionPeers {
            sessions: &mut self.sessions,
        };
        let left = match self.worlds.leave(&mut peers, id) {
            Ok(member) => member.is_some(),
            Err(e) => {
                error!(session = %id, "Failed to leave world: {e}");
                false
            }
        };

        let Some(session) = self.sessions.remove(&id) else {
            return;
        };
        match session.name() {
            Some(name) => {
                info!(player = name, addr = %session.addr, "Player disconnected");
                if left {
                    self.broadcast(&format!("{name} left the game"));
                }
            }
            None => debug!(session = %id, phase = session.phase.name(), "Connection closed before login"),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Chat line to every logged-in session.
    fn broadcast(&mut self, text: &str) {
        for session in self.sessions.values_mut().filter(|s| s.is_playing()) {
            session.chat(text);
        }
    }

    fn session_by_name(&self, name: &str) -> Option<SessionId> {
        self.sessions
            .values()
            .find(|s| s.name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .map(|s| s.id)
    }

    fn playing_count(&self) -> usize {
        self.sessions.values().filter(|s| s.is_playing()).count()
    }

    fn rank_of(&self, id: SessionId) -> Rank {
        self.sessions
            .get(&id)
            .and_then(|s| s.identity())
            .map_or(Rank::Guest, |i| i.rank)
    }

    // -----------------------------------------------------------------------
    // Operations driven by commands
    // -----------------------------------------------------------------------

    /// Chat line to one logged-in player.
    pub fn message(&mut self, to: SessionId, text: &str) -> bool {
        match self.sessions.get_mut(&to) {
            Some(session) if session.is_playing() => {
                session.chat(text);
                true
            }
            _ => false,
        }
    }

    /// Server-side block change, seen by everyone in the world.
    pub fn set_block(
        &mut self,
        world: &str,
        pos: BlockPos,
        block: u8,
    ) -> Result<EditOutcome, RegistryError> {
        let target = self
            .worlds
            .get_mut(world)
            .ok_or_else(|| RegistryError::UnknownWorld(world.to_string()))?;
        let mut peers = SessionPeers {
            sessions: &mut self.sessions,
        };
        Ok(target.place_block(&mut peers, pos, block)?)
    }

    /// Fill a cuboid as one bulk edit. Returns the number of changed blocks.
    pub fn fill(
        &mut self,
        world: &str,
        a: BlockPos,
        b: BlockPos,
        block: u8,
    ) -> Result<usize, RegistryError> {
        let target = self
            .worlds
            .get_mut(world)
            .ok_or_else(|| RegistryError::UnknownWorld(world.to_string()))?;
        let mut peers = SessionPeers {
            sessions: &mut self.sessions,
        };
        let changed = target.fill(&mut peers, a, b, block)?;
        info!(world = target.name(), from = %a, to = %b, block, changed, "Fill");
        Ok(changed)
    }

    /// Move a logged-in player to another world. A refused move leaves the
    /// player where they were.
    pub fn goto(&mut self, id: SessionId, world: &str, mode: JoinMode) -> Result<EntityId, RegistryError> {
        let identity = self
            .sessions
            .get(&id)
            .and_then(|s| s.identity())
            .cloned()
            .ok_or(SyncError::NotMember(id))?;
        let mut peers = SessionPeers {
            sessions: &mut self.sessions,
        };
        let entity_id = self.worlds.transfer(&mut peers, world, &identity, mode)?;
        info!(player = %identity.name, world, ?mode, %entity_id, "Changed world");
        Ok(entity_id)
    }

    /// Build a world from the configured template and register it.
    pub fn create_world(&mut self, name: &str, dims: Dimensions) -> Result<(), Box<dyn std::error::Error>> {
        if self.worlds.get(name).is_some() {
            return Err(RegistryError::WorldExists(name.to_string()).into());
        }
        let world = build_world(&self.config, name, dims)?;
        self.worlds.insert(world)?;
        Ok(())
    }
}

/// Flat world with the configured policy and custom blocks.
fn build_world(
    config: &ServerConfig,
    name: &str,
    dims: Dimensions,
) -> Result<MultiplayerWorld, Box<dyn std::error::Error>> {
    let world = generate_flat(dims)?;
    let mut world = MultiplayerWorld::new(name, world, config.world.policy())?
        .with_compression_level(config.world.compression_level);

    // No members yet, so nothing is sent.
    let mut nobody = BTreeMap::new();
    let mut peers = SessionPeers {
        sessions: &mut nobody,
    };
    for def in &config.world.blocks {
        world.define_block(&mut peers, def.clone())?;
    }
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};
    use mcc_rs_proto::packets::{
        CustomBlockSupportLevel, Disconnect, EditMode, ExtEntry, ExtInfo, SetBlock,
    };
    use mcc_rs_proto::types::{Orientation, PlayerPos};
    use mcc_rs_world::block;
    use tokio::sync::mpsc;

    pub(super) const CONFIG: &str = r#"
        [server]
        name = "Test Server"
        motd = "hello"
        max_players = 3

        [world]
        width = 16
        height = 16
        length = 16
        capacity = 8

        [permissions]
        operators = ["op"]
    "#;

    pub(super) struct Client {
        pub id: SessionId,
        rx: mpsc::Receiver<Bytes>,
    }

    impl Client {
        /// Everything queued for this client so far.
        pub fn drain(&mut self) -> Vec<ServerPacket> {
            let mut packets = Vec::new();
            while let Ok(bytes) = self.rx.try_recv() {
                packets.extend(ServerPacket::decode_all(bytes).unwrap());
            }
            packets
        }

        pub fn chat_lines(&mut self) -> Vec<String> {
            self.drain()
                .into_iter()
                .filter_map(|p| match p {
                    ServerPacket::Message(m) => Some(m.text),
                    _ => None,
                })
                .collect()
        }
    }

    pub(super) fn handler_with(toml_str: &str) -> (ConnectionHandler, watch::Receiver<bool>) {
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        let table = CapabilityTable::standard(&config.extensions.disabled);
        let (tx, rx) = watch::channel(false);
        let handler =
            ConnectionHandler::new(Arc::new(config), Arc::new(table), Arc::new(tx)).unwrap();
        (handler, rx)
    }

    pub(super) fn connect_with_queue(handler: &mut ConnectionHandler, n: u64, queue: usize) -> Client {
        let (tx, rx) = mpsc::channel(queue);
        let id = SessionId(n);
        handler.handle_event(NetEvent::Connected {
            id,
            addr: "127.0.0.1:40000".parse().unwrap(),
            outbound: tx,
        });
        Client { id, rx }
    }

    pub(super) fn connect(handler: &mut ConnectionHandler, n: u64) -> Client {
        connect_with_queue(handler, n, 1024)
    }

    pub(super) fn feed(handler: &mut ConnectionHandler, client: &Client, data: Bytes) {
        handler.handle_event(NetEvent::Data {
            id: client.id,
            data,
        });
        handler.pump();
    }

    pub(super) fn send(handler: &mut ConnectionHandler, client: &Client, packet: ClientPacket) {
        feed(handler, client, packet.encode().unwrap());
    }

    pub(super) fn identify(name: &str, trailer: u8) -> ClientPacket {
        ClientPacket::Identify(Identify {
            protocol_version: PROTOCOL_VERSION,
            username: name.to_string(),
            verification_key: "-".to_string(),
            trailer,
        })
    }

    pub(super) fn login(handler: &mut ConnectionHandler, n: u64, name: &str) -> Client {
        let client = connect(handler, n);
        send(handler, &client, identify(name, 0));
        client
    }

    pub(super) fn chat(text: &str) -> ClientPacket {
        ClientPacket::Message(Message {
            channel: -1,
            text: text.to_string(),
        })
    }

    fn place(x: i16, y: i16, z: i16, block: u8) -> ClientPacket {
        ClientPacket::SetBlock(SetBlockRequest {
            position: BlockPos::new(x, y, z),
            mode: EditMode::Create,
            block,
        })
    }

    fn disconnect_reason(packets: &[ServerPacket]) -> Option<&str> {
        packets.iter().find_map(|p| match p {
            ServerPacket::Disconnect(Disconnect { reason }) => Some(reason.as_str()),
            _ => None,
        })
    }

    #[test]
    fn plain_login_joins_main_world() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut alice = login(&mut handler, 1, "alice");
        let packets = alice.drain();

        match &packets[0] {
            ServerPacket::Identify(ident) => {
                assert_eq!(ident.protocol_version, PROTOCOL_VERSION);
                assert_eq!(ident.server_name, "Test Server");
                assert_eq!(ident.motd, "hello");
                assert_eq!(ident.user_type, 0);
            }
            other => panic!("expected server identify, got {other:?}"),
        }
        assert!(packets.contains(&ServerPacket::LevelInitialize));
        assert!(packets.iter().any(|p| matches!(
            p,
            ServerPacket::LevelFinalize(f) if (f.x, f.y, f.z) == (16, 16, 16)
        )));
        assert!(packets.iter().any(|p| matches!(
            p,
            ServerPacket::SpawnPlayer(s) if s.entity_id == EntityId::SELF
        )));
        assert!(!packets.iter().any(|p| matches!(p, ServerPacket::ExtInfo(_))));

        let main = handler.worlds.get("main").unwrap();
        assert_eq!(main.member_count(), 1);
        assert!(handler.sessions[&alice.id].is_playing());
    }

    #[test]
    fn operators_are_flagged_at_login() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut op = login(&mut handler, 1, "OP");
        match &op.drain()[0] {
            ServerPacket::Identify(ident) => assert_eq!(ident.user_type, USER_TYPE_OP),
            other => panic!("expected server identify, got {other:?}"),
        }
    }

    #[test]
    fn extension_negotiation_over_bytes() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut client = connect(&mut handler, 1);
        send(&mut handler, &client, identify("alice", NEGOTIATION_MAGIC));

        let offered = client.drain();
        match &offered[0] {
            ServerPacket::ExtInfo(info) => {
                assert_eq!(info.app_name, SERVER_SOFTWARE);
                assert_eq!(info.extension_count as usize, handler.capabilities.len());
            }
            other => panic!("expected ExtInfo, got {other:?}"),
        }
        assert_eq!(offered.len(), handler.capabilities.len() + 1);
        assert!(!handler.sessions[&client.id].is_playing());

        // Header and first entry in one read, the second entry split in two.
        let mut data = BytesMut::new();
        for packet in [
            ClientPacket::ExtInfo(ExtInfo {
                app_name: "Test Client".into(),
                extension_count: 2,
            }),
            ClientPacket::ExtEntry(ExtEntry {
                name: "CustomBlocks".into(),
                version: 1,
            }),
        ] {
            data.extend_from_slice(&packet.encode().unwrap());
        }
        feed(&mut handler, &client, data.freeze());
        let second = ClientPacket::ExtEntry(ExtEntry {
            name: "HackControl".into(),
            version: 1,
        })
        .encode()
        .unwrap();
        feed(&mut handler, &client, second.slice(..10));
        assert!(client.drain().is_empty());
        feed(&mut handler, &client, second.slice(10..));

        assert_eq!(
            client.drain(),
            vec![ServerPacket::CustomBlockSupportLevel(CustomBlockSupportLevel {
                level: 1
            })]
        );
        assert!(!handler.sessions[&client.id].is_playing());

        send(
            &mut handler,
            &client,
            ClientPacket::CustomBlockSupportLevel(CustomBlockSupportLevel { level: 1 }),
        );
        let packets = client.drain();
        assert!(matches!(packets[0], ServerPacket::Identify(_)));
        // HackControl is pushed on join once agreed.
        assert!(packets.iter().any(|p| matches!(p, ServerPacket::HackControl(_))));

        let session = &handler.sessions[&client.id];
        assert!(session.is_playing());
        assert!(session.caps().supports(Extension::CustomBlocks));
        assert!(session.caps().supports(Extension::HackControl));
        assert!(!session.caps().supports(Extension::MessageTypes));
        assert_eq!(session.caps().custom_block_level(), 1);
    }

    #[test]
    fn gameplay_packet_during_negotiation_disconnects() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut client = connect(&mut handler, 1);
        send(&mut handler, &client, identify("alice", NEGOTIATION_MAGIC));
        client.drain();

        send(&mut handler, &client, chat("hi"));
        assert_eq!(
            disconnect_reason(&client.drain()),
            Some("Unknown packet 0x0d")
        );
        assert!(handler.sessions.is_empty());
    }

    #[test]
    fn unsupported_protocol_is_rejected() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut client = connect(&mut handler, 1);
        send(
            &mut handler,
            &client,
            ClientPacket::Identify(Identify {
                protocol_version: 6,
                username: "alice".into(),
                verification_key: "-".into(),
                trailer: 0,
            }),
        );
        assert_eq!(
            disconnect_reason(&client.drain()),
            Some("Unsupported protocol version 6")
        );
        assert!(handler.sessions.is_empty());
    }

    #[test]
    fn invalid_name_is_rejected() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut client = connect(&mut handler, 1);
        send(&mut handler, &client, identify("no spaces", 0));
        assert_eq!(disconnect_reason(&client.drain()), Some("Invalid username"));
    }

    #[test]
    fn unknown_opcode_before_login_disconnects() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut client = connect(&mut handler, 1);
        feed(&mut handler, &client, Bytes::from_static(&[0x05, 0, 0]));
        assert_eq!(
            disconnect_reason(&client.drain()),
            Some("Unknown packet 0x05")
        );
        assert!(handler.sessions.is_empty());
    }

    #[test]
    fn disconnect_mid_stream_releases_membership() {
        let (mut handler, _) = handler_with(CONFIG);
        // Level data is queued but never read by the client.
        let alice = login(&mut handler, 1, "alice");
        assert_eq!(handler.worlds.get("main").unwrap().entities().in_use(), 1);

        handler.handle_event(NetEvent::Closed { id: alice.id });
        let main = handler.worlds.get("main").unwrap();
        assert_eq!(main.member_count(), 0);
        assert_eq!(main.entities().in_use(), 0);
        assert!(handler.sessions.is_empty());
        assert!(handler.worlds.world_of(alice.id).is_none());

        let bob = login(&mut handler, 2, "bob");
        let member = handler.worlds.get("main").unwrap().member(bob.id).unwrap();
        assert_eq!(member.entity_id, EntityId(0));
    }

    #[test]
    fn players_see_each_other_chat_and_edits() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut alice = login(&mut handler, 1, "alice");
        let mut bob = login(&mut handler, 2, "bob");

        let alice_saw = alice.drain();
        assert!(alice_saw.iter().any(|p| matches!(
            p,
            ServerPacket::SpawnPlayer(s) if s.name == "bob" && s.entity_id == EntityId(1)
        )));
        assert!(bob.drain().iter().any(|p| matches!(
            p,
            ServerPacket::SpawnPlayer(s) if s.name == "alice" && s.entity_id == EntityId(0)
        )));

        send(&mut handler, &alice, chat("hello there"));
        assert_eq!(bob.chat_lines(), vec!["alice: hello there"]);
        assert_eq!(alice.chat_lines(), vec!["alice: hello there"]);

        send(&mut handler, &alice, place(1, 10, 1, block::STONE));
        assert_eq!(
            bob.drain(),
            vec![ServerPacket::SetBlock(SetBlock {
                position: BlockPos::new(1, 10, 1),
                block: block::STONE,
            })]
        );
        assert!(alice.drain().is_empty());
        let main = handler.worlds.get("main").unwrap();
        assert_eq!(main.world().get(BlockPos::new(1, 10, 1)), Some(block::STONE));

        let moved = ClientPacket::Position(PositionAndOrientation {
            entity_id: EntityId::SELF,
            position: PlayerPos::new(64, 400, 64),
            orientation: Orientation { yaw: 10, pitch: 0 },
        });
        send(&mut handler, &alice, moved);
        assert!(bob.drain().iter().any(|p| matches!(
            p,
            ServerPacket::Position(m) if m.entity_id == EntityId(0)
        )));
        assert!(alice.drain().is_empty());
    }

    #[test]
    fn guests_cannot_build_in_protected_worlds() {
        let config = CONFIG.replace("capacity = 8", "capacity = 8\nbuild_rank = \"builder\"");
        let (mut handler, _) = handler_with(&config);
        let mut alice = login(&mut handler, 1, "alice");
        alice.drain();

        send(&mut handler, &alice, place(1, 10, 1, block::STONE));
        assert_eq!(
            alice.drain(),
            vec![ServerPacket::SetBlock(SetBlock {
                position: BlockPos::new(1, 10, 1),
                block: block::AIR,
            })]
        );
        let main = handler.worlds.get("main").unwrap();
        assert_eq!(main.world().get(BlockPos::new(1, 10, 1)), Some(block::AIR));
    }

    #[test]
    fn second_login_replaces_first() {
        let (mut handler, _) = handler_with(CONFIG);
        let mut first = login(&mut handler, 1, "alice");
        first.drain();
        let second = login(&mut handler, 2, "Alice");

        assert_eq!(
            disconnect_reason(&first.drain()),
            Some("Logged in from another location")
        );
        assert!(!handler.sessions.contains_key(&first.id));
        assert!(handler.sessions[&second.id].is_playing());
        assert_eq!(handler.worlds.get("main").unwrap().member_count(), 1);
    }

    #[test]
    fn server_full_refuses_login() {
        let (mut handler, _) = handler_with(CONFIG);
        let _online: Vec<Client> = [(1, "a"), (2, "b"), (3, "c")]
            .into_iter()
            .map(|(n, name)| login(&mut handler, n, name))
            .collect();
        let mut late = login(&mut handler, 4, "d");
        assert_eq!(disconnect_reason(&late.drain()), Some("Server is full"));
        assert_eq!(handler.playing_count(), 3);
    }

    #[test]
    fn join_denial_at_login_disconnects() {
        let config = CONFIG.replace("capacity = 8", "capacity = 8\njoin_rank = \"operator\"");
        let (mut handler, _) = handler_with(&config);
        let mut guest = login(&mut handler, 1, "alice");
        assert_eq!(
            disconnect_reason(&guest.drain()),
            Some("you need rank operator to join this world")
        );
        assert!(handler.sessions.is_empty());

        let op = login(&mut handler, 2, "op");
        assert!(handler.worlds.world_of(op.id).is_some());
    }

    #[test]
    fn full_send_queue_drops_session() {
        let (mut handler, _) = handler_with(CONFIG);
        let client = connect_with_queue(&mut handler, 1, 1);
        handler.liveness_tick();
        assert!(handler.sessions.contains_key(&client.id));
        handler.liveness_tick();
        assert!(handler.sessions.is_empty());
    }

    #[test]
    fn leaving_player_is_despawned_for_others() {
        let (mut handler, _) = handler_with(CONFIG);
        let alice = login(&mut handler, 1, "alice");
        let mut bob = login(&mut handler, 2, "bob");
        bob.drain();

        handler.handle_event(NetEvent::Closed { id: alice.id });
        let packets = bob.drain();
        assert!(packets.iter().any(|p| matches!(
            p,
            ServerPacket::DespawnPlayer(d) if d.entity_id == EntityId(0)
        )));
        assert!(packets.iter().any(|p| matches!(
            p,
            ServerPacket::Message(m) if m.text == "alice left the game"
        )));
    }
}
