//! BlockUpdate (0x30) — Server → Client.
//!
//! Authoritative single-block change, broadcast to every logged-in session
//! including the one whose place/break caused it.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// BlockUpdate packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockUpdate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub block_id: u8,
}

impl ProtoEncode for BlockUpdate {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.x);
        buf.put_i32(self.y);
        buf.put_i32(self.z);
        buf.put_u8(self.block_id);
    }
}

impl ProtoDecode for BlockUpdate {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 13)?;
        Ok(Self {
            x: buf.get_i32(),
            y: buf.get_i32(),
            z: buf.get_i32(),
            block_id: buf.get_u8(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = BlockUpdate {
            x: -100,
            y: 64,
            z: 2048,
            block_id: 9,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(BlockUpdate::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
