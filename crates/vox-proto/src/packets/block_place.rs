//! BlockPlace (0x31) — Client → Server.
//!
//! A placement request. The client does not mutate its mirror until the
//! echoed BlockUpdate arrives.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// BlockPlace packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlace {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub block_id: u8,
}

impl ProtoEncode for BlockPlace {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.x);
        buf.put_i32(self.y);
        buf.put_i32(self.z);
        buf.put_u8(self.block_id);
    }
}

impl ProtoDecode for BlockPlace {
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
        let pkt = BlockPlace {
            x: 1,
            y: 80,
            z: -1,
            block_id: 4,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(BlockPlace::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
