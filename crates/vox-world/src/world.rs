//! The world: a chunk map with block-level access.
//!
//! Two modes share one type. A generator-backed world (the server's) creates
//! chunks on demand; a mirror world (the client's) never generates — chunks
//! are absent until inserted from the network, and block writes to absent
//! chunks are dropped.

use std::collections::HashMap;

use crate::chunk::{Chunk, ChunkPos, CHUNK_HEIGHT};
use crate::generator::ChunkGenerator;

pub struct World {
    seed: i64,
    chunks: HashMap<ChunkPos, Chunk>,
    generator: Option<Box<dyn ChunkGenerator>>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("seed", &self.seed)
            .field("chunks", &self.chunks)
            .field("generator", &self.generator.as_ref().map(|_| "..."))
            .finish()
    }
}

impl World {
    /// Create an authoritative world that generates chunks on first access.
    pub fn new(seed: i64, generator: Box<dyn ChunkGenerator>) -> Self {
        Self {
            seed,
            chunks: HashMap::new(),
            generator: Some(generator),
        }
    }

    /// Create a passive mirror that is populated only from received data.
    pub fn mirror(seed: i64) -> Self {
        Self {
            seed,
            chunks: HashMap::new(),
            generator: None,
        }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    pub fn has_chunk(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Fetch a chunk, generating it on a miss. Returns `None` on a mirror
    /// world when the chunk has not arrived.
    pub fn get_or_create_chunk(&mut self, pos: ChunkPos) -> Option<&Chunk> {
        if !self.chunks.contains_key(&pos) {
            let generator = self.generator.as_ref()?;
            let chunk = generator.generate(pos, self.seed);
            self.chunks.insert(pos, chunk);
        }
        self.chunks.get(&pos)
    }

    /// Insert a fully-formed chunk, replacing any existing one at that
    /// position.
    pub fn insert_chunk(&mut self, chunk: Chunk) {
        self.chunks.insert(chunk.pos(), chunk);
    }

    /// Drop a chunk. Returns whether it was present.
    pub fn unload_chunk(&mut self, pos: ChunkPos) -> bool {
        self.chunks.remove(&pos).is_some()
    }

    /// Block id at a world coordinate, or `None` if the chunk is absent or
    /// the y coordinate is out of range.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<u8> {
        if y < 0 || y >= CHUNK_HEIGHT as i32 {
            return None;
        }
        let chunk = self.chunks.get(&ChunkPos::containing(x, z))?;
        Some(chunk.get_block((x & 15) as usize, y as usize, (z & 15) as usize))
    }

    /// Set the block at a world coordinate. On a generator-backed world the
    /// containing chunk is created if needed; on a mirror an absent chunk
    /// means the write is dropped. Returns whether the write landed.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: u8) -> bool {
        if y < 0 || y >= CHUNK_HEIGHT as i32 {
            return false;
        }
        let pos = ChunkPos::containing(x, z);
        let chunk = match self.chunks.entry(pos) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(v) => match self.generator.as_ref() {
                Some(generator) => v.insert(generator.generate(pos, self.seed)),
                None => return false,
            },
        };
        chunk.set_block((x & 15) as usize, y as usize, (z & 15) as usize, id);
        true
    }
}
