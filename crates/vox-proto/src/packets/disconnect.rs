//! Disconnect (0x03) — either direction.
//!
//! Sent by whichever side initiates closing; the reason is surfaced to the
//! user verbatim on the receiving end.

use bytes::{Buf, BufMut};

use crate::codec::{read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Disconnect packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Disconnect {
    pub reason: String,
}

impl Disconnect {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ProtoEncode for Disconnect {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.reason);
    }
}

impl ProtoDecode for Disconnect {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            reason: read_string(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = Disconnect::new("Connection timeout");
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(Disconnect::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
