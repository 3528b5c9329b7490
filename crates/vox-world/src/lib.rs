//! World state consumed by the sync layer: chunk storage, block access, and
//! the generator seam terrain providers plug into.

pub mod block;
pub mod chunk;
pub mod generator;
mod world;

pub use chunk::{Chunk, ChunkPos, CHUNK_HEIGHT, CHUNK_SIZE, CHUNK_VOLUME};
pub use generator::{ChunkGenerator, FlatGenerator};
pub use world::World;
