//! LoginResponse (0x02) — Server → Client.
//!
//! On success carries the assigned session id, spawn coordinates and the
//! world seed; on failure a human-readable reason. The two shapes share the
//! tag and diverge on the leading success flag.

use bytes::{Buf, BufMut};

use crate::codec::{read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// LoginResponse packet.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub success: bool,
    pub player_id: u32,
    pub spawn_x: f32,
    pub spawn_y: f32,
    pub spawn_z: f32,
    pub world_seed: i64,
    /// Rejection reason. Empty on success.
    pub reason: String,
}

impl LoginResponse {
    /// Create a success response.
    pub fn success(player_id: u32, spawn_x: f32, spawn_y: f32, spawn_z: f32, world_seed: i64) -> Self {
        Self {
            success: true,
            player_id,
            spawn_x,
            spawn_y,
            spawn_z,
            world_seed,
            reason: String::new(),
        }
    }

    /// Create a failure response with a reason shown verbatim to the user.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            player_id: 0,
            spawn_x: 0.0,
            spawn_y: 0.0,
            spawn_z: 0.0,
            world_seed: 0,
            reason: reason.into(),
        }
    }
}

impl ProtoEncode for LoginResponse {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.success as u8);
        if self.success {
            buf.put_u32(self.player_id);
            buf.put_f32(self.spawn_x);
            buf.put_f32(self.spawn_y);
            buf.put_f32(self.spawn_z);
            buf.put_i64(self.world_seed);
        } else {
            write_string(buf, &self.reason);
        }
    }
}

impl ProtoDecode for LoginResponse {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        crate::codec::ensure_remaining(buf, 1)?;
        let success = buf.get_u8() != 0;
        if success {
            crate::codec::ensure_remaining(buf, 24)?;
            Ok(Self {
                success,
                player_id: buf.get_u32(),
                spawn_x: buf.get_f32(),
                spawn_y: buf.get_f32(),
                spawn_z: buf.get_f32(),
                world_seed: buf.get_i64(),
                reason: String::new(),
            })
        } else {
            Ok(Self::failure(read_string(buf)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip_success() {
        let pkt = LoginResponse::success(1, 0.0, 70.0, 0.0, 1234);
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let decoded = LoginResponse::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, pkt);
        assert!(decoded.reason.is_empty());
    }

    #[test]
    fn roundtrip_failure() {
        let pkt = LoginResponse::failure("Username already taken");
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let decoded = LoginResponse::proto_decode(&mut buf.freeze()).unwrap();
        assert!(!decoded.success);
        assert_eq!(decoded.reason, "Username already taken");
    }

    #[test]
    fn failure_shape_omits_spawn_fields() {
        let ok = LoginResponse::success(1, 0.0, 70.0, 0.0, 0);
        let fail = LoginResponse::failure("no");
        let mut buf_ok = BytesMut::new();
        let mut buf_fail = BytesMut::new();
        ok.proto_encode(&mut buf_ok);
        fail.proto_encode(&mut buf_fail);
        // flag + id + 3 floats + seed vs flag + 4-byte prefix + "no"
        assert_eq!(buf_ok.len(), 25);
        assert_eq!(buf_fail.len(), 7);
    }
}
