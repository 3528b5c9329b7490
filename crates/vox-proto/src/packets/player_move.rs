//! PlayerMove (0x20) — either direction.
//!
//! Client → Server: the local player's position every client tick.
//! Server → Client: another player's position, rebroadcast verbatim.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// PlayerMove packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerMove {
    pub player_id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}

impl ProtoEncode for PlayerMove {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.player_id);
        buf.put_f32(self.x);
        buf.put_f32(self.y);
        buf.put_f32(self.z);
        buf.put_f32(self.yaw);
        buf.put_f32(self.pitch);
        buf.put_u8(self.on_ground as u8);
    }
}

impl ProtoDecode for PlayerMove {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 25)?;
        Ok(Self {
            player_id: buf.get_u32(),
            x: buf.get_f32(),
            y: buf.get_f32(),
            z: buf.get_f32(),
            yaw: buf.get_f32(),
            pitch: buf.get_f32(),
            on_ground: buf.get_u8() != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = PlayerMove {
            player_id: 3,
            x: 10.5,
            y: 70.0,
            z: -3.25,
            yaw: 181.0,
            pitch: -89.9,
            on_ground: true,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(PlayerMove::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn fixed_size() {
        let pkt = PlayerMove {
            player_id: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            on_ground: false,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(buf.len(), 25);
    }
}
