//! One client connection: inbound framing, phase and outbound queue.
//!
//! Bytes arrive from the connection's reader task and are buffered in
//! `inbox`. [`Session::next_packet`] reads an opcode, checks it against the
//! current [`Phase`], and hands back the packet only once every byte of its
//! fixed length is buffered. Until then the opcode stays pending and the
//! session is simply skipped.

use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use mcc_rs_game::{Identity, SessionId};
use mcc_rs_proto::extension::Extension;
use mcc_rs_proto::packets::{
    client_packet_size, id, wrap_message, ClientPacket, Disconnect, Identify, Message,
    MessageChannel, ServerPacket,
};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, trace, warn};

use crate::capability::{NegotiatedCapabilities, Negotiator};
use crate::error::SessionError;

/// Connection phase. Each phase owns the set of opcodes it accepts.
pub enum Phase {
    /// Waiting for the client's Identify.
    AwaitIdentify,
    /// Extension handshake in progress.
    Negotiating(Negotiator),
    /// Logged in; gameplay packets only.
    Playing,
}

impl Phase {
    fn accepts(&self, opcode: u8, caps: &NegotiatedCapabilities) -> bool {
        match self {
            Phase::AwaitIdentify => opcode == id::IDENTIFY,
            Phase::Negotiating(n) => n.expected_opcode() == Some(opcode),
            Phase::Playing => match opcode {
                id::SET_BLOCK_REQUEST | id::POSITION_AND_ORIENTATION | id::MESSAGE => true,
                id::PLAYER_CLICKED => caps.supports(Extension::PlayerClick),
                _ => false,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::AwaitIdentify => "await-identify",
            Phase::Negotiating(_) => "negotiating",
            Phase::Playing => "playing",
        }
    }
}

pub struct Session {
    pub id: SessionId,
    pub addr: SocketAddr,
    inbox: BytesMut,
    pending_opcode: Option<u8>,
    pub phase: Phase,
    caps: NegotiatedCapabilities,
    /// Identify packet held while negotiation runs.
    pub login: Option<Identify>,
    identity: Option<Identity>,
    outbound: mpsc::Sender<Bytes>,
    closing: bool,
}

impl Session {
    pub fn new(id: SessionId, addr: SocketAddr, outbound: mpsc::Sender<Bytes>) -> Self {
        Self {
            id,
            addr,
            inbox: BytesMut::with_capacity(1024),
            pending_opcode: None,
            phase: Phase::AwaitIdentify,
            caps: NegotiatedCapabilities::none(),
            login: None,
            identity: None,
            outbound,
            closing: false,
        }
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    pub fn receive(&mut self, data: &[u8]) {
        self.inbox.extend_from_slice(data);
    }

    /// Whether a call to [`Session::next_packet`] could make progress.
    pub fn has_input(&self) -> bool {
        !self.inbox.is_empty()
    }

    /// Pop the next complete packet, or `None` if more bytes are needed.
    pub fn next_packet(&mut self) -> Result<Option<ClientPacket>, SessionError> {
        let opcode = match self.pending_opcode {
            Some(op) => op,
            None => {
                let Some(&op) = self.inbox.first() else {
                    return Ok(None);
                };
                if !self.phase.accepts(op, &self.caps) {
                    return Err(SessionError::UnknownOpcode(op));
                }
                let _ = self.inbox.split_to(1);
                self.pending_opcode = Some(op);
                op
            }
        };

        let size = client_packet_size(opcode).ok_or(SessionError::UnknownOpcode(opcode))?;
        let body_len = size - 1;
        if self.inbox.len() < body_len {
            trace!(session = %self.id, opcode, have = self.inbox.len(), need = body_len, "Waiting for packet body");
            return Ok(None);
        }

        let mut body = self.inbox.split_to(body_len).freeze();
        self.pending_opcode = None;
        Ok(Some(ClientPacket::decode(opcode, &mut body)?))
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Queue a packet for the writer task. A full or closed queue marks the
    /// session for closing.
    pub fn send(&mut self, packet: &ServerPacket) -> bool {
        if self.closing {
            return false;
        }
        let bytes = match packet.encode() {
            Ok(b) => b,
            Err(e) => {
                error!(session = %self.id, opcode = packet.opcode(), "Failed to encode packet: {e}");
                return false;
            }
        };
        match self.outbound.try_send(bytes) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(session = %self.id, addr = %self.addr, "Send queue full, closing");
                self.closing = true;
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(session = %self.id, "Writer gone, closing");
                self.closing = true;
                false
            }
        }
    }

    /// Send text on a channel, wrapped to fit. Clients without MessageTypes
    /// get the channel's fallback, or nothing.
    pub fn send_message(&mut self, channel: MessageChannel, text: &str) {
        let channel = if self.caps.supports(Extension::MessageTypes) {
            channel
        } else {
            match channel.fallback() {
                Some(c) => c,
                None => return,
            }
        };
        for line in wrap_message(text) {
            self.send(&ServerPacket::Message(Message::on(channel, line)));
        }
    }

    pub fn chat(&mut self, text: &str) {
        self.send_message(MessageChannel::Chat, text);
    }

    /// Tell the client why, then mark the session for removal.
    pub fn disconnect(&mut self, reason: &str) {
        self.send(&ServerPacket::Disconnect(Disconnect::new(reason)));
        self.closing = true;
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    // -----------------------------------------------------------------------
    // Identity and capabilities
    // -----------------------------------------------------------------------

    pub fn caps(&self) -> &NegotiatedCapabilities {
        &self.caps
    }

    /// Freeze the negotiated set and enter gameplay.
    pub fn enter_play(&mut self, caps: NegotiatedCapabilities, identity: Identity) {
        self.caps = caps;
        self.identity = Some(identity);
        self.login = None;
        self.phase = Phase::Playing;
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.name.as_str())
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.phase, Phase::Playing)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mcc_rs_proto::packets::{EditMode, ExtEntry, ExtInfo, PlayerClicked, SetBlockRequest};
    use mcc_rs_proto::types::{BlockPos, EntityId};

    use super::*;
    use crate::capability::CapabilityTable;

    fn session(queue: usize) -> (Session, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(queue);
        let addr: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        (Session::new(SessionId(1), addr, tx), rx)
    }

    fn identify_bytes() -> Bytes {
        ClientPacket::Identify(Identify {
            protocol_version: 7,
            username: "alice".into(),
            verification_key: "-".into(),
            trailer: 0x42,
        })
        .encode()
        .unwrap()
    }

    fn caps_with(exts: &[&str]) -> NegotiatedCapabilities {
        let (mut n, _) = Negotiator::start(Arc::new(CapabilityTable::standard(&[])), "t");
        n.handle(ClientPacket::ExtInfo(ExtInfo {
            app_name: "c".into(),
            extension_count: exts.len() as i16,
        }))
        .unwrap();
        for name in exts {
            n.handle(ClientPacket::ExtEntry(ExtEntry {
                name: name.to_string(),
                version: 1,
            }))
            .unwrap();
        }
        n.finish()
    }

    #[test]
    fn waits_for_full_packet() {
        let (mut s, _rx) = session(4);
        let bytes = identify_bytes();
        s.receive(&bytes[..1]);
        assert!(s.next_packet().unwrap().is_none());
        s.receive(&bytes[1..70]);
        assert!(s.next_packet().unwrap().is_none());
        s.receive(&bytes[70..]);
        match s.next_packet().unwrap() {
            Some(ClientPacket::Identify(id)) => assert_eq!(id.username, "alice"),
            other => panic!("expected identify, got {other:?}"),
        }
        assert!(!s.has_input());
        assert!(s.next_packet().unwrap().is_none());
    }

    #[test]
    fn one_packet_per_call() {
        let (mut s, _rx) = session(4);
        s.enter_play(NegotiatedCapabilities::none(), Identity::guest(SessionId(1), "a"));
        let req = ClientPacket::SetBlock(SetBlockRequest {
            position: BlockPos::new(1, 2, 3),
            mode: EditMode::Create,
            block: 1,
        })
        .encode()
        .unwrap();
        let msg = ClientPacket::Message(Message::chat("hi")).encode().unwrap();
        s.receive(&req);
        s.receive(&msg);
        assert!(matches!(s.next_packet().unwrap(), Some(ClientPacket::SetBlock(_))));
        assert!(s.has_input());
        assert!(matches!(s.next_packet().unwrap(), Some(ClientPacket::Message(m)) if m.text == "hi"));
    }

    #[test]
    fn rejects_opcode_illegal_in_phase() {
        let (mut s, _rx) = session(4);
        s.receive(&[id::SET_BLOCK_REQUEST, 0, 0]);
        assert!(matches!(
            s.next_packet(),
            Err(SessionError::UnknownOpcode(id::SET_BLOCK_REQUEST))
        ));

        let (mut s, _rx) = session(4);
        s.receive(&[0xEE]);
        assert!(matches!(s.next_packet(), Err(SessionError::UnknownOpcode(0xEE))));
    }

    #[test]
    fn player_click_requires_extension() {
        let click = ClientPacket::PlayerClicked(PlayerClicked {
            button: 0,
            action: 0,
            yaw: 0,
            pitch: 0,
            target_entity: EntityId(2),
            target_block: BlockPos::new(0, 0, 0),
            target_face: 0,
        })
        .encode()
        .unwrap();

        let (mut s, _rx) = session(4);
        s.enter_play(caps_with(&[]), Identity::guest(SessionId(1), "a"));
        s.receive(&click);
        assert!(s.next_packet().is_err());

        let (mut s, _rx) = session(4);
        s.enter_play(caps_with(&["PlayerClick"]), Identity::guest(SessionId(1), "a"));
        s.receive(&click);
        assert!(matches!(s.next_packet().unwrap(), Some(ClientPacket::PlayerClicked(_))));
    }

    #[test]
    fn negotiation_phase_follows_negotiator() {
        let (mut s, _rx) = session(4);
        let (n, _) = Negotiator::start(Arc::new(CapabilityTable::standard(&[])), "t");
        s.phase = Phase::Negotiating(n);
        let entry = ClientPacket::ExtEntry(ExtEntry {
            name: "HackControl".into(),
            version: 1,
        })
        .encode()
        .unwrap();
        s.receive(&entry);
        assert!(matches!(s.next_packet(), Err(SessionError::UnknownOpcode(id::EXT_ENTRY))));
    }

    #[test]
    fn full_queue_marks_closing() {
        let (mut s, mut rx) = session(1);
        assert!(s.send(&ServerPacket::Ping));
        assert!(!s.send(&ServerPacket::Ping));
        assert!(s.is_closing());
        assert_eq!(rx.try_recv().unwrap(), ServerPacket::Ping.encode().unwrap());
    }

    #[test]
    fn closed_writer_marks_closing() {
        let (mut s, rx) = session(4);
        drop(rx);
        assert!(!s.send(&ServerPacket::Ping));
        assert!(s.is_closing());
    }

    #[test]
    fn message_channels_fall_back() {
        let (mut s, mut rx) = session(8);
        s.send_message(MessageChannel::Status1, "hidden");
        assert!(rx.try_recv().is_err());
        s.send_message(MessageChannel::Announcement, "shown");
        let bytes = rx.try_recv().unwrap();
        let packets = ServerPacket::decode_all(bytes).unwrap();
        assert_eq!(packets, vec![ServerPacket::Message(Message::chat("shown"))]);

        let (mut s, mut rx) = session(8);
        s.enter_play(caps_with(&["MessageTypes"]), Identity::guest(SessionId(1), "a"));
        s.send_message(MessageChannel::Status1, "top");
        let packets = ServerPacket::decode_all(rx.try_recv().unwrap()).unwrap();
        assert_eq!(
            packets,
            vec![ServerPacket::Message(Message::on(MessageChannel::Status1, "top"))]
        );
    }

    #[test]
    fn disconnect_sends_reason_then_closes() {
        let (mut s, mut rx) = session(4);
        s.disconnect("bye");
        assert!(s.is_closing());
        let packets = ServerPacket::decode_all(rx.try_recv().unwrap()).unwrap();
        assert_eq!(packets, vec![ServerPacket::Disconnect(Disconnect::new("bye"))]);
        assert!(!s.send(&ServerPacket::Ping));
    }
}
