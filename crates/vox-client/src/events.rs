//! Events surfaced to the embedding game loop (UI, renderer, mods) from
//! [`Client::update`](crate::Client::update).

use vox_proto::packets::ChatMessage;
use vox_world::ChunkPos;

#[derive(Debug, Clone)]
pub enum ClientEvent {
    PlayerJoined { id: u32, username: String },
    PlayerLeft { id: u32 },
    Chat(ChatMessage),
    ChunkLoaded { pos: ChunkPos },
    ChunkUnloaded { pos: ChunkPos },
    BlockChanged { x: i32, y: i32, z: i32, block_id: u8 },
    /// Terminal: the connection is gone and no retry is attempted.
    Disconnected { reason: String },
}
