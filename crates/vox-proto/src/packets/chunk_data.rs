//! ChunkData (0x10) — Server → Client.
//!
//! Full block payload for one chunk column: 16x256x16 block ids, flat, in
//! `x + z*16 + y*256` order. By far the largest packet on the wire.

use bytes::{Buf, BufMut, Bytes};

use crate::codec::{read_byte_array, write_byte_array, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Block count of one chunk column (16 * 256 * 16).
pub const CHUNK_VOLUME: usize = 65_536;

/// ChunkData packet.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkData {
    pub chunk_x: i32,
    pub chunk_z: i32,
    /// One block id per cell, [`CHUNK_VOLUME`] bytes.
    pub blocks: Bytes,
}

impl ChunkData {
    pub fn new(chunk_x: i32, chunk_z: i32, blocks: Bytes) -> Self {
        Self {
            chunk_x,
            chunk_z,
            blocks,
        }
    }
}

impl ProtoEncode for ChunkData {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.chunk_x);
        buf.put_i32(self.chunk_z);
        write_byte_array(buf, &self.blocks);
    }
}

impl ProtoDecode for ChunkData {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 8)?;
        let chunk_x = buf.get_i32();
        let chunk_z = buf.get_i32();
        let blocks = read_byte_array(buf)?;
        Ok(Self {
            chunk_x,
            chunk_z,
            blocks,
        })
    }
}
