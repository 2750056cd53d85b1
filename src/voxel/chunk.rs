//! Chunk system: fixed-size columns of block ids on a horizontal grid

use glam::{IVec3, Vec3};

use crate::voxel::block::{AIR, BlockId, is_solid};

/// Chunk extent along X
pub const CHUNK_LENGTH: usize = 16;
/// Chunk extent along Y
pub const CHUNK_WIDTH: usize = 16;
/// Chunk extent along Z (vertical)
pub const CHUNK_HEIGHT: usize = 256;

/// Blocks in one horizontal layer
pub const CHUNK_LAYER: usize = CHUNK_LENGTH * CHUNK_WIDTH;
/// Blocks in a whole chunk. Also the byte size of the raw block array.
pub const CHUNK_VOLUME: usize = CHUNK_LAYER * CHUNK_HEIGHT;

/// Largest chunk coordinate a world position maps to, on either axis and in
/// either direction. Block coordinates and window offsets around any such
/// chunk stay well inside `i32`.
pub const MAX_CHUNK_COORD: i32 = 1 << 26;

/// Integer coordinate identifying a chunk in the horizontal world grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    /// Create a new chunk coordinate
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing a world position (floor division, so negative
    /// positions map to negative chunks). Clamped to [`MAX_CHUNK_COORD`].
    pub fn from_world_pos(pos: Vec3) -> Self {
        let limit = MAX_CHUNK_COORD as f32;
        Self {
            x: (pos.x / CHUNK_LENGTH as f32).floor().clamp(-limit, limit) as i32,
            y: (pos.y / CHUNK_WIDTH as f32).floor().clamp(-limit, limit) as i32,
        }
    }

    /// Get the world-space origin (minimum corner) of this chunk
    pub fn world_origin(&self) -> Vec3 {
        Vec3::new(
            (self.x as f64 * CHUNK_LENGTH as f64) as f32,
            (self.y as f64 * CHUNK_WIDTH as f64) as f32,
            0.0,
        )
    }

    /// Per-axis (Chebyshev) distance in chunks, saturating at `i32::MAX`
    pub fn chebyshev_distance(&self, other: ChunkCoord) -> i32 {
        let distance = self.x.abs_diff(other.x).max(self.y.abs_diff(other.y));
        i32::try_from(distance).unwrap_or(i32::MAX)
    }
}

/// Split a world position into the chunk containing it and the position
/// relative to that chunk's origin.
///
/// Horizontal coordinates beyond [`MAX_CHUNK_COORD`] chunks are clamped onto
/// the edge of that range first.
pub fn split_world_pos(pos: Vec3) -> (ChunkCoord, Vec3) {
    let max_x = MAX_CHUNK_COORD as f32 * CHUNK_LENGTH as f32;
    let max_y = MAX_CHUNK_COORD as f32 * CHUNK_WIDTH as f32;
    let pos = Vec3::new(pos.x.clamp(-max_x, max_x), pos.y.clamp(-max_y, max_y), pos.z);

    let coord = ChunkCoord::from_world_pos(pos);
    (coord, pos - coord.world_origin())
}

/// A column of `CHUNK_LENGTH x CHUNK_WIDTH x CHUNK_HEIGHT` blocks
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    blocks: Box<[BlockId]>,
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("solid", &self.solid_count())
            .finish()
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunk {
    /// Create a chunk filled with air
    pub fn new() -> Self {
        Self {
            blocks: vec![AIR; CHUNK_VOLUME].into_boxed_slice(),
        }
    }

    /// Flattened index of a local block position
    #[inline]
    pub fn index(x: usize, y: usize, z: usize) -> usize {
        x + y * CHUNK_WIDTH + z * CHUNK_LAYER
    }

    /// Check whether a local position lies inside the chunk
    #[inline]
    pub fn in_bounds(pos: IVec3) -> bool {
        pos.x >= 0 && pos.x < CHUNK_LENGTH as i32 &&
        pos.y >= 0 && pos.y < CHUNK_WIDTH as i32 &&
        pos.z >= 0 && pos.z < CHUNK_HEIGHT as i32
    }

    /// Block at a local position. Panics when out of range.
    pub fn block(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[Self::index(x, y, z)]
    }

    /// Block at a signed local position, `None` outside the chunk
    pub fn block_at(&self, pos: IVec3) -> Option<BlockId> {
        if Self::in_bounds(pos) {
            Some(self.block(pos.x as usize, pos.y as usize, pos.z as usize))
        } else {
            None
        }
    }

    /// Solid test that treats everything outside the chunk as air
    pub fn is_solid_at(&self, pos: IVec3) -> bool {
        self.block_at(pos).is_some_and(is_solid)
    }

    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block: BlockId) {
        self.blocks[Self::index(x, y, z)] = block;
    }

    /// Fill the column `(x, y)` from the floor up to (excluding) `top`
    pub fn fill_column(&mut self, x: usize, y: usize, top: usize, block: BlockId) {
        for z in 0..top.min(CHUNK_HEIGHT) {
            self.set_block(x, y, z, block);
        }
    }

    /// Number of non-air blocks
    pub fn solid_count(&self) -> usize {
        self.blocks.iter().filter(|&&b| is_solid(b)).count()
    }

    /// The raw block array, byte for byte
    pub fn as_bytes(&self) -> &[u8] {
        &self.blocks
    }

    /// Rebuild a chunk from a raw block array. `None` unless the length is
    /// exactly [`CHUNK_VOLUME`].
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != CHUNK_VOLUME {
            return None;
        }
        Some(Self {
            blocks: bytes.to_vec().into_boxed_slice(),
        })
    }
}
