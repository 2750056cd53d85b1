//! World store: every chunk generated or loaded this session, plus the
//! collision and picking queries that run against them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use glam::{IVec3, Vec3};

use crate::math::{Aabb, Ray, RayHit};
use crate::terrain::{TerrainGenerator, TerrainParams};
use crate::voxel::block::Direction;
use crate::voxel::chunk::{CHUNK_HEIGHT, CHUNK_LENGTH, CHUNK_WIDTH, Chunk, ChunkCoord, split_world_pos};

/// Blocks scanned around the query position by [`World::collides`]
pub const COLLISION_SCAN_RADIUS: i32 = 2;

/// Blocks scanned around the ray origin by [`World::block_look_at`]
pub const LOOK_AT_SCAN_RADIUS: i32 = 3;

/// Outcome of a picking ray
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockLookAt {
    /// Chunk the ray origin lies in
    pub chunk: ChunkCoord,
    /// Local position of the hit block. Meaningless when `hit` is false.
    pub block: IVec3,
    pub hit: bool,
    /// Face of the block the ray entered through
    pub face: Option<Direction>,
}

/// Authoritative owner of all chunks.
///
/// Chunks are generated on first access and never evicted, so memory grows
/// with the explored area.
pub struct World {
    seed: u32,
    generator: TerrainGenerator,
    chunks: RwLock<HashMap<ChunkCoord, Arc<Chunk>>>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("seed", &self.seed)
            .field("chunks", &self.len())
            .finish()
    }
}

impl World {
    /// Create an empty world with default terrain parameters
    pub fn new(seed: u32) -> Self {
        Self::with_params(seed, TerrainParams::default())
    }

    pub fn with_params(seed: u32, params: TerrainParams) -> Self {
        Self {
            seed,
            generator: TerrainGenerator::new(seed, params),
            chunks: RwLock::new(HashMap::new()),
        }
    }

    /// Create a world seeded from the system clock
    pub fn with_random_seed(params: TerrainParams) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let seed = (nanos ^ (nanos >> 32)) as u32;
        log::info!("Creating world with seed {}", seed);
        Self::with_params(seed, params)
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Get the chunk at `coord`, generating and storing it on first access.
    ///
    /// The map lock is only held for the lookup and the insert. When two
    /// callers race on the same missing chunk, the first insert wins and both
    /// get that instance.
    pub fn get_chunk(&self, coord: ChunkCoord) -> Arc<Chunk> {
        let existing = self.read().get(&coord).cloned();
        if let Some(chunk) = existing {
            return chunk;
        }

        let generated = Arc::new(self.generator.generate_chunk(coord));
        self.write().entry(coord).or_insert(generated).clone()
    }

    /// Get a chunk only if it is already present
    pub fn try_get_chunk(&self, coord: ChunkCoord) -> Option<Arc<Chunk>> {
        self.read().get(&coord).cloned()
    }

    /// Insert or replace the chunk at `coord`
    pub fn add_chunk(&self, coord: ChunkCoord, chunk: Arc<Chunk>) {
        self.write().insert(coord, chunk);
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.read().contains_key(&coord)
    }

    /// Number of chunks present
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Coordinates of all present chunks, sorted
    pub fn coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self.read().keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// All present chunks in stable (sorted) order
    pub fn snapshot(&self) -> Vec<(ChunkCoord, Arc<Chunk>)> {
        let mut chunks: Vec<_> = self
            .read()
            .iter()
            .map(|(coord, chunk)| (*coord, chunk.clone()))
            .collect();
        chunks.sort_unstable_by_key(|(coord, _)| *coord);
        chunks
    }

    /// Test a box against solid blocks near `position`.
    ///
    /// `bounds` is relative to `position`. Only the blocks within
    /// [`COLLISION_SCAN_RADIUS`] of the position's block in the chunk that
    /// contains it are checked, so `bounds` must be small.
    pub fn collides(&self, bounds: &Aabb, position: Vec3) -> bool {
        let (coord, local) = split_world_pos(position);
        let chunk = self.get_chunk(coord);
        let local_bounds = bounds.translated(local);

        solid_blocks_around(&chunk, local, COLLISION_SCAN_RADIUS)
            .any(|block| Aabb::unit_block(block).intersects(&local_bounds))
    }

    /// Find the nearest solid block hit by `ray` within
    /// [`LOOK_AT_SCAN_RADIUS`] blocks of its origin.
    pub fn block_look_at(&self, ray: &Ray) -> BlockLookAt {
        let (coord, local) = split_world_pos(ray.origin);
        let chunk = self.get_chunk(coord);
        let local_ray = ray.with_origin(local);

        let mut closest: Option<(RayHit, IVec3)> = None;
        for block in solid_blocks_around(&chunk, local, LOOK_AT_SCAN_RADIUS) {
            let Some(hit) = local_ray.hit_aabb(&Aabb::unit_block(block)) else {
                continue;
            };
            if closest.is_none_or(|(nearest, _)| hit.distance < nearest.distance) {
                closest = Some((hit, block));
            }
        }

        match closest {
            Some((hit, block)) => BlockLookAt {
                chunk: coord,
                block,
                hit: true,
                face: Some(entry_face(&hit, block)),
            },
            None => BlockLookAt {
                chunk: coord,
                block: IVec3::ZERO,
                hit: false,
                face: None,
            },
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ChunkCoord, Arc<Chunk>>> {
        self.chunks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ChunkCoord, Arc<Chunk>>> {
        self.chunks.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Solid blocks of `chunk` in the cube of `radius` around `local`'s block,
/// clipped to the chunk
fn solid_blocks_around(chunk: &Chunk, local: Vec3, radius: i32) -> impl Iterator<Item = IVec3> + '_ {
    // Anything further out than the radius only sees air; clamping keeps
    // the offsets below from overflowing.
    let margin = radius as f32 + 1.0;
    let center = local
        .floor()
        .clamp(
            Vec3::splat(-margin),
            Vec3::new(CHUNK_LENGTH as f32, CHUNK_WIDTH as f32, CHUNK_HEIGHT as f32) + margin,
        )
        .as_ivec3();
    (-radius..=radius).flat_map(move |dx| {
        (-radius..=radius).flat_map(move |dy| {
            (-radius..=radius).filter_map(move |dz| {
                let block = center + IVec3::new(dx, dy, dz);
                chunk.is_solid_at(block).then_some(block)
            })
        })
    })
}

/// Face on the axis the ray entered through. The hit point is snapped onto
/// that plane, so comparing against the low corner is exact. A ray along an
/// edge or through a corner gets the first of the tied axes.
fn entry_face(hit: &RayHit, block: IVec3) -> Direction {
    let low = hit.point[hit.axis] == block[hit.axis] as f32;
    match (hit.axis, low) {
        (0, true) => Direction::Back,
        (0, false) => Direction::Forward,
        (1, true) => Direction::Left,
        (1, false) => Direction::Right,
        (_, true) => Direction::Down,
        (_, false) => Direction::Up,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::chunk::MAX_CHUNK_COORD;

    fn world_with_single_block(coord: ChunkCoord, block: (usize, usize, usize)) -> World {
        let world = World::new(1);
        let mut chunk = Chunk::new();
        chunk.set_block(block.0, block.1, block.2, 3);
        world.add_chunk(coord, Arc::new(chunk));
        world
    }

    fn small_box() -> Aabb {
        Aabb::from_center_half_extent(Vec3::ZERO, Vec3::splat(0.25))
    }

    #[test]
    fn test_get_chunk_memoized() {
        let world = World::new(42);
        let coord = ChunkCoord::new(3, -2);
        let a = world.get_chunk(coord);
        let b = world.get_chunk(coord);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_same_seed_same_chunks() {
        let a = World::new(42);
        let b = World::new(42);
        for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(-7, 11)] {
            assert_eq!(*a.get_chunk(coord), *b.get_chunk(coord));
        }
    }

    #[test]
    fn test_add_chunk_upserts() {
        let world = World::new(1);
        let coord = ChunkCoord::new(0, 0);
        let generated = world.get_chunk(coord);
        world.add_chunk(coord, Arc::new(Chunk::new()));
        let replaced = world.get_chunk(coord);
        assert!(!Arc::ptr_eq(&generated, &replaced));
        assert_eq!(replaced.solid_count(), 0);
    }

    #[test]
    fn test_try_get_does_not_generate() {
        let world = World::new(1);
        assert!(world.try_get_chunk(ChunkCoord::new(5, 5)).is_none());
        assert!(world.is_empty());
    }

    #[test]
    fn test_concurrent_get_chunk_single_instance() {
        let world = Arc::new(World::new(9));
        let coord = ChunkCoord::new(4, 4);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let world = world.clone();
                std::thread::spawn(move || world.get_chunk(coord))
            })
            .collect();
        let chunks: Vec<_> = handles.into_iter().map(|h| h.join().expect("thread panicked")).collect();
        for chunk in &chunks[1..] {
            assert!(Arc::ptr_eq(&chunks[0], chunk));
        }
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_snapshot_sorted() {
        let world = World::new(1);
        for coord in [ChunkCoord::new(2, 0), ChunkCoord::new(-1, 5), ChunkCoord::new(0, -3)] {
            world.get_chunk(coord);
        }
        let coords: Vec<_> = world.snapshot().into_iter().map(|(c, _)| c).collect();
        assert_eq!(coords, vec![ChunkCoord::new(-1, 5), ChunkCoord::new(0, -3), ChunkCoord::new(2, 0)]);
        assert_eq!(world.coords(), coords);
    }

    #[test]
    fn test_collides_with_single_block() {
        let world = world_with_single_block(ChunkCoord::new(0, 0), (5, 5, 5));
        assert!(world.collides(&small_box(), Vec3::new(5.5, 5.5, 5.5)));
        assert!(!world.collides(&small_box(), Vec3::new(7.5, 5.5, 5.5)));
        assert!(!world.collides(&small_box(), Vec3::new(5.5, 5.5, 7.5)));
    }

    #[test]
    fn test_collides_negative_coordinates() {
        let coord = ChunkCoord::new(-1, -1);
        let world = world_with_single_block(coord, (CHUNK_LENGTH - 1, CHUNK_WIDTH - 1, 10));
        // (-0.5, -0.5) lives in the last block column of chunk (-1, -1)
        assert!(world.collides(&small_box(), Vec3::new(-0.5, -0.5, 10.5)));
        assert!(!world.collides(&small_box(), Vec3::new(-0.5, -0.5, 13.5)));
        // Must not wrap into chunk (0, 0)
        assert!(!world.contains(ChunkCoord::new(0, 0)));
    }

    #[test]
    fn test_queries_far_from_origin() {
        let world = World::new(3);
        assert!(!world.collides(&small_box(), Vec3::new(3.0e9, 0.0, 1.0e11)));
        assert!(!world.collides(&small_box(), Vec3::new(-3.0e9, 1.0e11, -1.0e11)));
        assert!(world.contains(ChunkCoord::new(MAX_CHUNK_COORD, 0)));

        let result = world.block_look_at(&Ray::new(Vec3::new(1.0e11, 0.5, 1.0e11), Vec3::NEG_Z));
        assert!(!result.hit);
        assert_eq!(result.chunk, ChunkCoord::new(MAX_CHUNK_COORD, 0));
    }

    #[test]
    fn test_look_at_top_face() {
        let world = world_with_single_block(ChunkCoord::new(0, 0), (5, 5, 5));
        let ray = Ray::new(Vec3::new(5.5, 5.5, 7.5), Vec3::NEG_Z);
        let result = world.block_look_at(&ray);
        assert!(result.hit);
        assert_eq!(result.chunk, ChunkCoord::new(0, 0));
        assert_eq!(result.block, IVec3::new(5, 5, 5));
        assert_eq!(result.face, Some(Direction::Up));
    }

    #[test]
    fn test_look_at_side_faces() {
        let world = world_with_single_block(ChunkCoord::new(0, 0), (5, 5, 5));

        let from_minus_x = world.block_look_at(&Ray::new(Vec3::new(3.5, 5.5, 5.5), Vec3::X));
        assert_eq!(from_minus_x.face, Some(Direction::Back));

        let from_plus_y = world.block_look_at(&Ray::new(Vec3::new(5.5, 7.5, 5.5), Vec3::NEG_Y));
        assert_eq!(from_plus_y.face, Some(Direction::Right));

        let from_below = world.block_look_at(&Ray::new(Vec3::new(5.5, 5.5, 3.2), Vec3::Z));
        assert_eq!(from_below.face, Some(Direction::Down));
    }

    #[test]
    fn test_look_at_face_along_block_edge() {
        let world = world_with_single_block(ChunkCoord::new(0, 0), (5, 5, 5));

        // Straight down the x = 5 edge of the top face
        let down_edge = world.block_look_at(&Ray::new(Vec3::new(5.0, 5.5, 7.5), Vec3::NEG_Z));
        assert!(down_edge.hit);
        assert_eq!(down_edge.face, Some(Direction::Up));

        // Horizontally along the y = 6 edge of the front face
        let along_side = world.block_look_at(&Ray::new(Vec3::new(7.5, 6.0, 5.5), Vec3::NEG_X));
        assert_eq!(along_side.face, Some(Direction::Forward));
    }

    #[test]
    fn test_look_at_picks_nearest() {
        let world = World::new(1);
        let mut chunk = Chunk::new();
        chunk.set_block(5, 5, 5, 1);
        chunk.set_block(5, 5, 3, 1);
        world.add_chunk(ChunkCoord::new(0, 0), Arc::new(chunk));

        let result = world.block_look_at(&Ray::new(Vec3::new(5.5, 5.5, 7.5), Vec3::NEG_Z));
        assert_eq!(result.block, IVec3::new(5, 5, 5));
    }

    #[test]
    fn test_look_at_miss() {
        let world = world_with_single_block(ChunkCoord::new(0, 0), (5, 5, 5));
        let result = world.block_look_at(&Ray::new(Vec3::new(5.5, 5.5, 7.5), Vec3::Z));
        assert!(!result.hit);
        assert_eq!(result.face, None);
    }

    #[test]
    fn test_look_at_out_of_scan_radius() {
        let world = world_with_single_block(ChunkCoord::new(0, 0), (5, 5, 5));
        let result = world.block_look_at(&Ray::new(Vec3::new(5.5, 5.5, 12.5), Vec3::NEG_Z));
        assert!(!result.hit);
    }
}
