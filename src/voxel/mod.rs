//! Voxel data structures and world queries

pub mod block;
pub mod chunk;
pub mod world;

pub use block::{BlockId, Direction, AIR};
pub use chunk::{
    Chunk, ChunkCoord, split_world_pos,
    CHUNK_HEIGHT, CHUNK_LAYER, CHUNK_LENGTH, CHUNK_VOLUME, CHUNK_WIDTH, MAX_CHUNK_COORD,
};
pub use world::{BlockLookAt, World};
