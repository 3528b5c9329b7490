//! Events surfaced to collaborators outside the sync core (chat UI, world
//! hooks, presence). Plain channel subscription; no reflective dispatch.

use vox_proto::packets::ChatMessage;

#[derive(Debug, Clone)]
pub enum ServerEvent {
    PlayerJoined { id: u32, username: String },
    PlayerLeft { id: u32, username: String },
    Chat(ChatMessage),
    BlockChanged { x: i32, y: i32, z: i32, block_id: u8 },
}
