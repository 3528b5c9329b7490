//! Client-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Proto(#[from] vox_proto::ProtoError),

    /// The server rejected the login; the reason is shown verbatim.
    #[error("login rejected: {0}")]
    LoginRejected(String),

    /// The server closed the connection before login completed.
    #[error("disconnected: {0}")]
    Disconnected(String),

    #[error("timed out waiting for login response")]
    LoginTimeout,

    #[error("connection closed before login completed")]
    ConnectionLost,
}
