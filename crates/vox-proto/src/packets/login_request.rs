//! LoginRequest (0x01) — Client → Server.

use bytes::{Buf, BufMut};

use crate::codec::{read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// LoginRequest packet. Sent after a successful handshake with the display
/// name the client wants to use.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginRequest {
    pub username: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

impl ProtoEncode for LoginRequest {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.username);
    }
}

impl ProtoDecode for LoginRequest {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            username: read_string(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = LoginRequest::new("Steve");
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(LoginRequest::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
