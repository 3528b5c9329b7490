//! PlayerDespawn (0x22) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// PlayerDespawn packet. Sent when a logged-in player leaves for any reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDespawn {
    pub player_id: u32,
}

impl ProtoEncode for PlayerDespawn {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.player_id);
    }
}

impl ProtoDecode for PlayerDespawn {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 4)?;
        Ok(Self {
            player_id: buf.get_u32(),
        })
    }
}
