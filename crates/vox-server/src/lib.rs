//! Authoritative game server: owns the world, validates player actions, and
//! fans state changes out to every connected client.

pub mod config;
pub mod error;
pub mod events;
pub mod server;
pub mod session;

pub use config::ServerConfig;
pub use error::ServerError;
pub use events::ServerEvent;
pub use server::Server;
