//! Packet definitions for the voxsync wire protocol.
//!
//! Every kind has a stable one-byte tag; tags are grouped into reserved
//! ranges per category so new kinds can be added without collision. The
//! [`Packet`] sum type is the registry: encode and decode dispatch by
//! exhaustive match, so a missing arm for a new kind is a compile error
//! rather than a silently-skipped branch.

pub mod block_break;
pub mod block_place;
pub mod block_update;
pub mod chat_message;
pub mod chunk_data;
pub mod chunk_request;
pub mod chunk_unload;
pub mod disconnect;
pub mod handshake;
pub mod keep_alive;
pub mod login_request;
pub mod login_response;
pub mod player_despawn;
pub mod player_move;
pub mod player_spawn;

pub use block_break::BlockBreak;
pub use block_place::BlockPlace;
pub use block_update::BlockUpdate;
pub use chat_message::ChatMessage;
pub use chunk_data::{ChunkData, CHUNK_VOLUME};
pub use chunk_request::ChunkRequest;
pub use chunk_unload::ChunkUnload;
pub use disconnect::Disconnect;
pub use handshake::Handshake;
pub use keep_alive::KeepAlive;
pub use login_request::LoginRequest;
pub use login_response::LoginResponse;
pub use player_despawn::PlayerDespawn;
pub use player_move::PlayerMove;
pub use player_spawn::PlayerSpawn;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Wire tags, grouped by reserved range.
pub mod tag {
    // Connection lifecycle: 0x00-0x0F
    pub const HANDSHAKE: u8 = 0x00;
    pub const LOGIN_REQUEST: u8 = 0x01;
    pub const LOGIN_RESPONSE: u8 = 0x02;
    pub const DISCONNECT: u8 = 0x03;
    pub const KEEP_ALIVE: u8 = 0x04;

    // Chunk streaming: 0x10-0x1F
    pub const CHUNK_DATA: u8 = 0x10;
    pub const CHUNK_REQUEST: u8 = 0x11;
    pub const CHUNK_UNLOAD: u8 = 0x12;

    // Player movement and visibility: 0x20-0x2F
    pub const PLAYER_MOVE: u8 = 0x20;
    pub const PLAYER_SPAWN: u8 = 0x21;
    pub const PLAYER_DESPAWN: u8 = 0x22;

    // Block mutation: 0x30-0x3F
    pub const BLOCK_UPDATE: u8 = 0x30;
    pub const BLOCK_PLACE: u8 = 0x31;
    pub const BLOCK_BREAK: u8 = 0x32;

    // Chat: 0x40-0x4F
    pub const CHAT_MESSAGE: u8 = 0x40;
}

/// Current protocol version. Bumped on any wire-incompatible change;
/// mismatch is fatal at handshake.
pub const PROTOCOL_VERSION: i32 = 1;

/// One decoded message of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Handshake(Handshake),
    LoginRequest(LoginRequest),
    LoginResponse(LoginResponse),
    Disconnect(Disconnect),
    KeepAlive(KeepAlive),
    ChunkData(ChunkData),
    ChunkRequest(ChunkRequest),
    ChunkUnload(ChunkUnload),
    PlayerMove(PlayerMove),
    PlayerSpawn(PlayerSpawn),
    PlayerDespawn(PlayerDespawn),
    BlockUpdate(BlockUpdate),
    BlockPlace(BlockPlace),
    BlockBreak(BlockBreak),
    ChatMessage(ChatMessage),
}

impl Packet {
    /// The wire tag for this packet's kind.
    pub fn tag(&self) -> u8 {
        match self {
            Packet::Handshake(_) => tag::HANDSHAKE,
            Packet::LoginRequest(_) => tag::LOGIN_REQUEST,
            Packet::LoginResponse(_) => tag::LOGIN_RESPONSE,
            Packet::Disconnect(_) => tag::DISCONNECT,
            Packet::KeepAlive(_) => tag::KEEP_ALIVE,
            Packet::ChunkData(_) => tag::CHUNK_DATA,
            Packet::ChunkRequest(_) => tag::CHUNK_REQUEST,
            Packet::ChunkUnload(_) => tag::CHUNK_UNLOAD,
            Packet::PlayerMove(_) => tag::PLAYER_MOVE,
            Packet::PlayerSpawn(_) => tag::PLAYER_SPAWN,
            Packet::PlayerDespawn(_) => tag::PLAYER_DESPAWN,
            Packet::BlockUpdate(_) => tag::BLOCK_UPDATE,
            Packet::BlockPlace(_) => tag::BLOCK_PLACE,
            Packet::BlockBreak(_) => tag::BLOCK_BREAK,
            Packet::ChatMessage(_) => tag::CHAT_MESSAGE,
        }
    }

    /// Encode as tag byte + payload (without the frame length prefix).
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_u8(self.tag());
        match self {
            Packet::Handshake(p) => p.proto_encode(&mut buf),
            Packet::LoginRequest(p) => p.proto_encode(&mut buf),
            Packet::LoginResponse(p) => p.proto_encode(&mut buf),
            Packet::Disconnect(p) => p.proto_encode(&mut buf),
            Packet::KeepAlive(p) => p.proto_encode(&mut buf),
            Packet::ChunkData(p) => p.proto_encode(&mut buf),
            Packet::ChunkRequest(p) => p.proto_encode(&mut buf),
            Packet::ChunkUnload(p) => p.proto_encode(&mut buf),
            Packet::PlayerMove(p) => p.proto_encode(&mut buf),
            Packet::PlayerSpawn(p) => p.proto_encode(&mut buf),
            Packet::PlayerDespawn(p) => p.proto_encode(&mut buf),
            Packet::BlockUpdate(p) => p.proto_encode(&mut buf),
            Packet::BlockPlace(p) => p.proto_encode(&mut buf),
            Packet::BlockBreak(p) => p.proto_encode(&mut buf),
            Packet::ChatMessage(p) => p.proto_encode(&mut buf),
        }
        buf.freeze()
    }

    /// Decode one tag byte + payload. An unregistered tag means the stream is
    /// desynchronized; callers must close the connection.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 1)?;
        let tag = buf.get_u8();
        match tag {
            tag::HANDSHAKE => Ok(Packet::Handshake(Handshake::proto_decode(buf)?)),
            tag::LOGIN_REQUEST => Ok(Packet::LoginRequest(LoginRequest::proto_decode(buf)?)),
            tag::LOGIN_RESPONSE => Ok(Packet::LoginResponse(LoginResponse::proto_decode(buf)?)),
            tag::DISCONNECT => Ok(Packet::Disconnect(Disconnect::proto_decode(buf)?)),
            tag::KEEP_ALIVE => Ok(Packet::KeepAlive(KeepAlive::proto_decode(buf)?)),
            tag::CHUNK_DATA => Ok(Packet::ChunkData(ChunkData::proto_decode(buf)?)),
            tag::CHUNK_REQUEST => Ok(Packet::ChunkRequest(ChunkRequest::proto_decode(buf)?)),
            tag::CHUNK_UNLOAD => Ok(Packet::ChunkUnload(ChunkUnload::proto_decode(buf)?)),
            tag::PLAYER_MOVE => Ok(Packet::PlayerMove(PlayerMove::proto_decode(buf)?)),
            tag::PLAYER_SPAWN => Ok(Packet::PlayerSpawn(PlayerSpawn::proto_decode(buf)?)),
            tag::PLAYER_DESPAWN => Ok(Packet::PlayerDespawn(PlayerDespawn::proto_decode(buf)?)),
            tag::BLOCK_UPDATE => Ok(Packet::BlockUpdate(BlockUpdate::proto_decode(buf)?)),
            tag::BLOCK_PLACE => Ok(Packet::BlockPlace(BlockPlace::proto_decode(buf)?)),
            tag::BLOCK_BREAK => Ok(Packet::BlockBreak(BlockBreak::proto_decode(buf)?)),
            tag::CHAT_MESSAGE => Ok(Packet::ChatMessage(ChatMessage::proto_decode(buf)?)),
            other => Err(ProtoError::UnknownPacketId(other)),
        }
    }
}

macro_rules! packet_from {
    ($($inner:ident),+ $(,)?) => {
        $(impl From<$inner> for Packet {
            fn from(p: $inner) -> Self {
                Packet::$inner(p)
            }
        })+
    };
}

packet_from!(
    Handshake,
    LoginRequest,
    LoginResponse,
    Disconnect,
    KeepAlive,
    ChunkData,
    ChunkRequest,
    ChunkUnload,
    PlayerMove,
    PlayerSpawn,
    PlayerDespawn,
    BlockUpdate,
    BlockPlace,
    BlockBreak,
    ChatMessage,
);

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(pkt: Packet) {
        let encoded = pkt.encode();
        let decoded = Packet::decode(&mut encoded.clone()).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn every_kind_roundtrips_through_tag_dispatch() {
        roundtrip(Handshake::new(PROTOCOL_VERSION, "0.1.0").into());
        roundtrip(LoginRequest::new("Steve").into());
        roundtrip(LoginResponse::success(1, 0.0, 70.0, 0.0, 1234).into());
        roundtrip(LoginResponse::failure("Username already taken").into());
        roundtrip(Disconnect::new("bye").into());
        roundtrip(KeepAlive { id: 1, timestamp: 2 }.into());
        roundtrip(ChunkData::new(0, 0, Bytes::from(vec![7u8; CHUNK_VOLUME])).into());
        roundtrip(ChunkRequest { chunk_x: 1, chunk_z: 2 }.into());
        roundtrip(ChunkUnload { chunk_x: 1, chunk_z: 2 }.into());
        roundtrip(
            PlayerMove {
                player_id: 1,
                x: 1.0,
                y: 2.0,
                z: 3.0,
                yaw: 4.0,
                pitch: 5.0,
                on_ground: true,
            }
            .into(),
        );
        roundtrip(
            PlayerSpawn {
                player_id: 1,
                username: "Alex".into(),
                x: 0.0,
                y: 70.0,
                z: 0.0,
                yaw: 0.0,
                pitch: 0.0,
            }
            .into(),
        );
        roundtrip(PlayerDespawn { player_id: 1 }.into());
        roundtrip(BlockUpdate { x: 1, y: 2, z: 3, block_id: 4 }.into());
        roundtrip(BlockPlace { x: 1, y: 2, z: 3, block_id: 4 }.into());
        roundtrip(BlockBreak { x: 1, y: 2, z: 3 }.into());
        roundtrip(
            ChatMessage {
                sender_id: 1,
                sender_name: Some("Steve".into()),
                message: "hi".into(),
                timestamp: 99,
                system: false,
            }
            .into(),
        );
    }

    #[test]
    fn unknown_tag_rejected() {
        let mut raw = BytesMut::new();
        raw.put_u8(0xEE);
        let err = Packet::decode(&mut raw.freeze()).unwrap_err();
        assert!(matches!(err, ProtoError::UnknownPacketId(0xEE)));
    }

    #[test]
    fn tags_are_unique() {
        use std::collections::HashSet;
        let tags = [
            tag::HANDSHAKE,
            tag::LOGIN_REQUEST,
            tag::LOGIN_RESPONSE,
            tag::DISCONNECT,
            tag::KEEP_ALIVE,
            tag::CHUNK_DATA,
            tag::CHUNK_REQUEST,
            tag::CHUNK_UNLOAD,
            tag::PLAYER_MOVE,
            tag::PLAYER_SPAWN,
            tag::PLAYER_DESPAWN,
            tag::BLOCK_UPDATE,
            tag::BLOCK_PLACE,
            tag::BLOCK_BREAK,
            tag::CHAT_MESSAGE,
        ];
        let unique: HashSet<u8> = tags.iter().copied().collect();
        assert_eq!(unique.len(), tags.len());
    }

    #[test]
    fn empty_payload_rejected() {
        let raw = Bytes::new();
        assert!(Packet::decode(&mut raw.clone()).is_err());
    }
}
