//! Message (0x0d) and message channels.

use bytes::{Buf, BufMut};

use super::FixedPacket;
use crate::codec::{self, ProtoDecode, ProtoEncode, STRING_LEN};
use crate::error::ProtoError;

/// Prefix put in front of wrapped continuation lines.
const CONTINUATION: &str = "> ";

/// Where a client displays a message. Anything but `Chat` needs MessageTypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum MessageChannel {
    Chat = 0,
    Status1 = 1,
    Status2 = 2,
    Status3 = 3,
    BottomRight1 = 11,
    BottomRight2 = 12,
    BottomRight3 = 13,
    Announcement = 100,
}

impl MessageChannel {
    /// Channel to use for a client without MessageTypes, if it should see the
    /// message at all.
    pub fn fallback(self) -> Option<MessageChannel> {
        match self {
            MessageChannel::Chat | MessageChannel::Announcement => Some(MessageChannel::Chat),
            _ => None,
        }
    }
}

/// Message (0x0d) — both directions.
///
/// Clients put `-1` in the first byte; the server uses it for the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub channel: i8,
    pub text: String,
}

impl Message {
    pub fn chat(text: impl Into<String>) -> Self {
        Self {
            channel: MessageChannel::Chat as i8,
            text: text.into(),
        }
    }

    pub fn on(channel: MessageChannel, text: impl Into<String>) -> Self {
        Self {
            channel: channel as i8,
            text: text.into(),
        }
    }
}

impl FixedPacket for Message {
    const ID: u8 = super::id::MESSAGE;
    const SIZE: usize = 66;
}

impl ProtoEncode for Message {
    fn proto_encode(&self, buf: &mut impl BufMut) -> Result<(), ProtoError> {
        buf.put_i8(self.channel);
        codec::write_string(buf, &self.text);
        Ok(())
    }
}

impl ProtoDecode for Message {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            channel: codec::read_i8(buf)?,
            text: codec::read_string(buf)?,
        })
    }
}

/// Split text into lines that fit a string field, breaking on spaces where
/// possible. Continuation lines start with `"> "`.
pub fn wrap_message(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        let mut word = word;
        loop {
            let sep = if current.is_empty() || current == CONTINUATION { 0 } else { 1 };
            let room = STRING_LEN.saturating_sub(current.len() + sep);
            if word.len() <= room {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                break;
            }
            if current.is_empty() || current == CONTINUATION {
                // Word longer than a whole line: hard split.
                let cut = floor_char_boundary(word, room);
                current.push_str(&word[..cut]);
                word = &word[cut..];
            }
            lines.push(std::mem::take(&mut current));
            current.push_str(CONTINUATION);
        }
    }
    if !current.is_empty() && current != CONTINUATION {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
