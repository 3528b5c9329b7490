//! KeepAlive (0x04) — either direction.
//!
//! Liveness probe. The server sends one periodically; the client echoes it
//! back so either side can measure round-trip latency from the timestamp.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// KeepAlive packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive {
    /// Echo id matching a probe to its reply.
    pub id: i64,
    /// Sender's wall-clock milliseconds at send time.
    pub timestamp: i64,
}

impl ProtoEncode for KeepAlive {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i64(self.id);
        buf.put_i64(self.timestamp);
    }
}

impl ProtoDecode for KeepAlive {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 16)?;
        Ok(Self {
            id: buf.get_i64(),
            timestamp: buf.get_i64(),
        })
    }
}
