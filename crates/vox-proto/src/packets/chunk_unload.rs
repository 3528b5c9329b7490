//! ChunkUnload (0x12) — Server → Client.
//!
//! Tells the client to free a chunk it was previously sent.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// ChunkUnload packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkUnload {
    pub chunk_x: i32,
    pub chunk_z: i32,
}

impl ProtoEncode for ChunkUnload {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.chunk_x);
        buf.put_i32(self.chunk_z);
    }
}

impl ProtoDecode for ChunkUnload {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 8)?;
        Ok(Self {
            chunk_x: buf.get_i32(),
            chunk_z: buf.get_i32(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = ChunkUnload {
            chunk_x: 5,
            chunk_z: -9,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(ChunkUnload::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
