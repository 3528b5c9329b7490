//! Protocol encoding/decoding traits and helpers.
//!
//! All multi-byte integers on the wire are big-endian. Strings are an i32
//! byte-length prefix followed by UTF-8 bytes; optional strings reserve a
//! length of -1 to mean "no value". Byte arrays use the same i32 prefix.

use bytes::{Buf, BufMut, Bytes};

use crate::error::ProtoError;

/// Hard ceiling on a decoded string's declared byte length. A peer claiming
/// more than this is corrupt or hostile, not merely verbose.
pub const MAX_STRING_LEN: usize = 1024;

/// Hard ceiling on a decoded byte array's declared length. Sized to admit a
/// full chunk payload with room to spare.
pub const MAX_BYTE_ARRAY_LEN: usize = 1024 * 1024;

/// Encode a value onto a buffer.
pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut);
}

/// Decode a value from a buffer.
pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

pub(crate) fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Write a protocol string (i32 byte-length prefix + UTF-8).
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    buf.put_i32(s.len() as i32);
    buf.put_slice(s.as_bytes());
}

/// Write a protocol string truncated to at most `max_chars` characters.
pub fn write_string_bounded(buf: &mut impl BufMut, s: &str, max_chars: usize) {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => write_string(buf, &s[..idx]),
        None => write_string(buf, s),
    }
}

/// Write an optional protocol string; `None` is encoded as length -1.
pub fn write_opt_string(buf: &mut impl BufMut, s: Option<&str>) {
    match s {
        Some(s) => write_string(buf, s),
        None => buf.put_i32(-1),
    }
}

/// Read a protocol string, enforcing the [`MAX_STRING_LEN`] ceiling.
pub fn read_string(buf: &mut impl Buf) -> Result<String, ProtoError> {
    match read_opt_string(buf)? {
        Some(s) => Ok(s),
        None => Err(ProtoError::NegativeLength(-1)),
    }
}

/// Read an optional protocol string; a length of -1 decodes as `None`.
pub fn read_opt_string(buf: &mut impl Buf) -> Result<Option<String>, ProtoError> {
    ensure_remaining(buf, 4)?;
    let len = buf.get_i32();
    if len == -1 {
        return Ok(None);
    }
    if len < 0 {
        return Err(ProtoError::NegativeLength(len));
    }
    if len as usize > MAX_STRING_LEN {
        return Err(ProtoError::StringTooLong {
            len,
            max: MAX_STRING_LEN,
        });
    }
    let len = len as usize;
    ensure_remaining(buf, len)?;
    let data = buf.copy_to_bytes(len);
    String::from_utf8(data.to_vec())
        .map(Some)
        .map_err(|_| ProtoError::InvalidUtf8)
}

/// Write a length-prefixed byte array.
pub fn write_byte_array(buf: &mut impl BufMut, data: &[u8]) {
    buf.put_i32(data.len() as i32);
    buf.put_slice(data);
}

/// Read a length-prefixed byte array, enforcing the [`MAX_BYTE_ARRAY_LEN`] ceiling.
pub fn read_byte_array(buf: &mut impl Buf) -> Result<Bytes, ProtoError> {
    ensure_remaining(buf, 4)?;
    let len = buf.get_i32();
    if len < 0 {
        return Err(ProtoError::NegativeLength(len));
    }
    if len as usize > MAX_BYTE_ARRAY_LEN {
        return Err(ProtoError::ByteArrayTooLong {
            len,
            max: MAX_BYTE_ARRAY_LEN,
        });
    }
    let len = len as usize;
    ensure_remaining(buf, len)?;
    Ok(buf.copy_to_bytes(len))
}
