//! Thin synchronization client: connects, logs in, mirrors server-pushed
//! world state, and smooths remote players for rendering. The server stays
//! authoritative; this side only requests changes and applies echoes.

pub mod client;
pub mod error;
pub mod events;
pub mod remote;

pub use client::{Client, ClientConfig};
pub use error::ClientError;
pub use events::ClientEvent;
pub use remote::RemoteEntity;
