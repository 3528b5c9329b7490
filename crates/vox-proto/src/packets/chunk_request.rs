//! ChunkRequest (0x11) — Client → Server.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// ChunkRequest packet. The client pulls chunk data; the server never pushes
/// a chunk unrequested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRequest {
    pub chunk_x: i32,
    pub chunk_z: i32,
}

impl ProtoEncode for ChunkRequest {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.chunk_x);
        buf.put_i32(self.chunk_z);
    }
}

impl ProtoDecode for ChunkRequest {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 8)?;
        Ok(Self {
            chunk_x: buf.get_i32(),
            chunk_z: buf.get_i32(),
        })
    }
}
