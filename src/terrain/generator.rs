//! Noise-based procedural terrain generation

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::voxel::block::{BlockId, TERRAIN_BLOCKS};
use crate::voxel::chunk::{Chunk, ChunkCoord, CHUNK_HEIGHT, CHUNK_LENGTH, CHUNK_WIDTH};

/// Parameters controlling terrain generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub frequency: f64,  // Noise frequency per block (smaller = smoother)
    pub block_types: u8, // How many of TERRAIN_BLOCKS chunks draw from
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            frequency: 0.01,
            block_types: 4,
        }
    }
}

/// Heightfield generator. Output depends only on the seed, the parameters and
/// the chunk coordinate.
pub struct TerrainGenerator {
    seed: u32,
    params: TerrainParams,
    noise: Perlin,
}

impl TerrainGenerator {
    /// Create a new terrain generator for a world seed
    pub fn new(seed: u32, params: TerrainParams) -> Self {
        Self {
            seed,
            params,
            noise: Perlin::new(seed),
        }
    }

    /// Get terrain parameters
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Column height in blocks at world block position (x, y)
    pub fn height_at(&self, x: i64, y: i64) -> usize {
        let nx = x as f64 * self.params.frequency;
        let ny = y as f64 * self.params.frequency;

        // Noise value in [-1, 1] mapped to [0, 1]
        let normalized = ((self.noise.get([nx, ny]) + 1.0) / 2.0).clamp(0.0, 1.0);
        (normalized * CHUNK_HEIGHT as f64) as usize
    }

    /// The single block type used for every solid block of a chunk.
    ///
    /// Whole chunks are one material; neighbouring chunks usually differ.
    pub fn block_type_for(&self, coord: ChunkCoord) -> BlockId {
        let types = (self.params.block_types as usize).clamp(1, TERRAIN_BLOCKS.len());
        TERRAIN_BLOCKS[(chunk_hash(self.seed, coord) % types as u64) as usize]
    }

    /// Generate the chunk at `coord`
    pub fn generate_chunk(&self, coord: ChunkCoord) -> Chunk {
        let mut chunk = Chunk::new();
        let block = self.block_type_for(coord);
        let origin_x = coord.x as i64 * CHUNK_LENGTH as i64;
        let origin_y = coord.y as i64 * CHUNK_WIDTH as i64;

        for x in 0..CHUNK_LENGTH {
            for y in 0..CHUNK_WIDTH {
                let top = self.height_at(origin_x + x as i64, origin_y + y as i64);
                chunk.fill_column(x, y, top, block);
            }
        }

        log::trace!("Generated chunk {:?} ({} solid)", coord, chunk.solid_count());
        chunk
    }
}

/// splitmix64 over the seed and both coordinate halves
fn chunk_hash(seed: u32, coord: ChunkCoord) -> u64 {
    let mut z = (seed as u64) << 32
        ^ (coord.x as u32 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (coord.y as u32 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
