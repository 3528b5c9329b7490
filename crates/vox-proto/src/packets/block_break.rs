//! BlockBreak (0x32) — Client → Server.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// BlockBreak packet. The server answers with a BlockUpdate setting the
/// coordinate to air.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBreak {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ProtoEncode for BlockBreak {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.x);
        buf.put_i32(self.y);
        buf.put_i32(self.z);
    }
}

impl ProtoDecode for BlockBreak {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 12)?;
        Ok(Self {
            x: buf.get_i32(),
            y: buf.get_i32(),
            z: buf.get_i32(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = BlockBreak { x: 0, y: 0, z: 0 };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(BlockBreak::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
