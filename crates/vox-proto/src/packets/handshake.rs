//! Handshake (0x00) — Client → Server.
//!
//! First packet on a fresh connection. Carries the protocol version; a
//! mismatch is fatal before login is even attempted.

use bytes::{Buf, BufMut};

use crate::codec::{read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Handshake packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Handshake {
    pub protocol_version: i32,
    /// Human-readable client build string, for logs only.
    pub client_version: String,
}

impl Handshake {
    pub fn new(protocol_version: i32, client_version: impl Into<String>) -> Self {
        Self {
            protocol_version,
            client_version: client_version.into(),
        }
    }
}

impl ProtoEncode for Handshake {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.protocol_version);
        write_string(buf, &self.client_version);
    }
}

impl ProtoDecode for Handshake {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 4)?;
        let protocol_version = buf.get_i32();
        let client_version = read_string(buf)?;
        Ok(Self {
            protocol_version,
            client_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = Handshake::new(1, "0.1.0");
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let decoded = Handshake::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn empty_client_version() {
        let pkt = Handshake::new(1, "");
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let decoded = Handshake::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.client_version, "");
    }
}
