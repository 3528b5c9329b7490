//! ChatMessage (0x40) — either direction.
//!
//! Client → Server: sender name is omitted (the server stamps it from the
//! session). Server → Client: fully stamped, with the system flag set for
//! join/leave notices.

use bytes::{Buf, BufMut};

use crate::codec::{
    read_opt_string, read_string, write_opt_string, write_string_bounded, ProtoDecode, ProtoEncode,
};
use crate::error::ProtoError;

/// Longest sender name written to the wire, in characters.
pub const MAX_NAME_CHARS: usize = 64;

/// Longest chat message written to the wire, in characters.
pub const MAX_MESSAGE_CHARS: usize = 256;

/// ChatMessage packet.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender_id: u32,
    /// Absent when the client sends; filled in by the server on relay.
    pub sender_name: Option<String>,
    pub message: String,
    /// Sender's wall-clock milliseconds.
    pub timestamp: i64,
    pub system: bool,
}

impl ChatMessage {
    /// Build a server-stamped system notice (joins, leaves, server messages).
    pub fn system(message: impl Into<String>, timestamp: i64) -> Self {
        Self {
            sender_id: 0,
            sender_name: None,
            message: message.into(),
            timestamp,
            system: true,
        }
    }
}

impl ProtoEncode for ChatMessage {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.sender_id);
        match &self.sender_name {
            Some(name) => write_string_bounded(buf, name, MAX_NAME_CHARS),
            None => write_opt_string(buf, None),
        }
        write_string_bounded(buf, &self.message, MAX_MESSAGE_CHARS);
        buf.put_i64(self.timestamp);
        buf.put_u8(self.system as u8);
    }
}

impl ProtoDecode for ChatMessage {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 4)?;
        let sender_id = buf.get_u32();
        let sender_name = read_opt_string(buf)?;
        let message = read_string(buf)?;
        crate::codec::ensure_remaining(buf, 9)?;
        Ok(Self {
            sender_id,
            sender_name,
            message,
            timestamp: buf.get_i64(),
            system: buf.get_u8() != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = ChatMessage {
            sender_id: 5,
            sender_name: Some("Steve".into()),
            message: "hello world".into(),
            timestamp: 1_700_000_000_123,
            system: false,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(ChatMessage::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn roundtrip_absent_name() {
        let pkt = ChatMessage {
            sender_id: 5,
            sender_name: None,
            message: "hi".into(),
            timestamp: 0,
            system: false,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let decoded = ChatMessage::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.sender_name, None);
    }

    #[test]
    fn system_notice() {
        let pkt = ChatMessage::system("Steve joined the game", 42);
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let decoded = ChatMessage::proto_decode(&mut buf.freeze()).unwrap();
        assert!(decoded.system);
        assert_eq!(decoded.sender_id, 0);
        assert_eq!(decoded.message, "Steve joined the game");
    }

    #[test]
    fn oversized_message_truncated_on_write() {
        let pkt = ChatMessage {
            sender_id: 1,
            sender_name: Some("a".repeat(MAX_NAME_CHARS + 10)),
            message: "b".repeat(MAX_MESSAGE_CHARS + 50),
            timestamp: 0,
            system: false,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let decoded = ChatMessage::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.sender_name.unwrap().len(), MAX_NAME_CHARS);
        assert_eq!(decoded.message.len(), MAX_MESSAGE_CHARS);
    }
}
