//! Wire protocol for the voxsync multiplayer layer: packet catalog,
//! encode/decode traits, and length-prefixed connection framing.

pub mod codec;
pub mod error;
pub mod frame;
pub mod packets;

pub use error::ProtoError;
pub use packets::{Packet, PROTOCOL_VERSION};
