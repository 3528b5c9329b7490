//! The generator seam. Terrain providers implement [`ChunkGenerator`]; the
//! sync layer only ever asks the world for a chunk and never generates
//! terrain itself.

use crate::block;
use crate::chunk::{Chunk, ChunkPos, CHUNK_SIZE};

/// Produces a chunk's initial contents on first access.
pub trait ChunkGenerator: Send + Sync {
    fn generate(&self, pos: ChunkPos, seed: i64) -> Chunk;
}

/// Flat layered terrain:
/// - Y = 0: bedrock
/// - Y = 1..surface-1: stone
/// - Y = surface-1: dirt
/// - Y = surface: grass
/// - above: air
pub struct FlatGenerator {
    surface_y: usize,
}

impl FlatGenerator {
    pub fn new(surface_y: usize) -> Self {
        Self { surface_y }
    }
}

impl Default for FlatGenerator {
    fn default() -> Self {
        Self::new(64)
    }
}

impl ChunkGenerator for FlatGenerator {
    fn generate(&self, pos: ChunkPos, _seed: i64) -> Chunk {
        let mut chunk = Chunk::new(pos);
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                chunk.set_block(x, 0, z, block::BEDROCK);
                for y in 1..self.surface_y.saturating_sub(1) {
                    chunk.set_block(x, y, z, block::STONE);
                }
                if self.surface_y >= 2 {
                    chunk.set_block(x, self.surface_y - 1, z, block::DIRT);
                }
                chunk.set_block(x, self.surface_y, z, block::GRASS);
            }
        }
        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers() {
        let chunk = FlatGenerator::new(64).generate(ChunkPos::new(0, 0), 0);
        assert_eq!(chunk.get_block(0, 0, 0), block::BEDROCK);
        assert_eq!(chunk.get_block(8, 30, 8), block::STONE);
        assert_eq!(chunk.get_block(8, 63, 8), block::DIRT);
        assert_eq!(chunk.get_block(8, 64, 8), block::GRASS);
        assert_eq!(chunk.get_block(8, 65, 8), block::AIR);
    }

    #[test]
    fn deterministic_across_positions() {
        let gen = FlatGenerator::default();
        let a = gen.generate(ChunkPos::new(-5, 3), 42);
        let b = gen.generate(ChunkPos::new(100, -7), 42);
        assert_eq!(a.to_bytes(), b.to_bytes());
    }
}
