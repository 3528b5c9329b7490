//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    #[error("string length {len} exceeds ceiling of {max} bytes")]
    StringTooLong { len: i32, max: usize },

    #[error("byte array length {len} exceeds ceiling of {max} bytes")]
    ByteArrayTooLong { len: i32, max: usize },

    #[error("negative length prefix: {0}")]
    NegativeLength(i32),

    #[error("unknown packet id: 0x{0:02X}")]
    UnknownPacketId(u8),

    #[error("protocol version mismatch: expected {expected}, got {got}")]
    ProtocolVersionMismatch { expected: i32, got: i32 },

    #[error("frame length {len} exceeds maximum of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },

    #[error("zero-length frame")]
    EmptyFrame,

    #[error("stream closed mid-frame")]
    TruncatedFrame,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
