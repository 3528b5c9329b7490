//! PlayerSpawn (0x21) — Server → Client.
//!
//! Announces another player entering view: on login the server broadcasts
//! the newcomer to everyone else and replays every existing player to the
//! newcomer.

use bytes::{Buf, BufMut};

use crate::codec::{read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// PlayerSpawn packet.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSpawn {
    pub player_id: u32,
    pub username: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl ProtoEncode for PlayerSpawn {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.player_id);
        write_string(buf, &self.username);
        buf.put_f32(self.x);
        buf.put_f32(self.y);
        buf.put_f32(self.z);
        buf.put_f32(self.yaw);
        buf.put_f32(self.pitch);
    }
}

impl ProtoDecode for PlayerSpawn {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 4)?;
        let player_id = buf.get_u32();
        let username = read_string(buf)?;
        crate::codec::ensure_remaining(buf, 20)?;
        Ok(Self {
            player_id,
            username,
            x: buf.get_f32(),
            y: buf.get_f32(),
            z: buf.get_f32(),
            yaw: buf.get_f32(),
            pitch: buf.get_f32(),
        })
    }
}
