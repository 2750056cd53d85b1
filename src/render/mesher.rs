//! Face-culled chunk meshing
//!
//! Every solid block contributes one quad (two triangles) per face whose
//! neighbour is air. Faces on the chunk boundary are always emitted because
//! neighbouring chunks are not consulted, which leaves hidden geometry at
//! chunk seams.

use glam::IVec3;

use crate::render::vertex::Vertex;
use crate::voxel::block::{Direction, is_solid};
use crate::voxel::chunk::{Chunk, CHUNK_HEIGHT, CHUNK_LENGTH, CHUNK_WIDTH};

/// Vertices emitted per visible face
pub const VERTICES_PER_FACE: usize = 6;

/// Texture coordinates of the four template corners
const CORNER_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Triangle corner order within a quad
const QUAD_TRIANGLES: [usize; 6] = [0, 1, 2, 0, 2, 3];

/// Block-local corners of a face, counter-clockwise seen from outside
fn face_corners(direction: Direction) -> [[f32; 3]; 4] {
    match direction {
        Direction::Forward => [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
        Direction::Back => [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
        Direction::Left => [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
        Direction::Right => [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
        Direction::Up => [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
        Direction::Down => [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
    }
}

/// Triangle list for one chunk, in chunk-local coordinates
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub vertices: Vec<Vertex>,
}

impl ChunkMesh {
    pub fn face_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_FACE
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex data ready for a buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    fn push_face(&mut self, block: IVec3, direction: Direction, texture_layer: u32) {
        let corners = face_corners(direction);
        let base = block.as_vec3();
        for &corner in &QUAD_TRIANGLES {
            let [cx, cy, cz] = corners[corner];
            self.vertices.push(Vertex::new(
                [base.x + cx, base.y + cy, base.z + cz],
                CORNER_UVS[corner],
                texture_layer,
            ));
        }
    }
}

/// A face is visible unless the neighbour inside the same chunk is solid
fn face_visible(chunk: &Chunk, block: IVec3, direction: Direction) -> bool {
    let neighbour = block + direction.normal();
    match chunk.block_at(neighbour) {
        Some(id) => !is_solid(id),
        None => true,
    }
}

/// Build the face-culled mesh of a chunk
pub fn mesh_chunk(chunk: &Chunk) -> ChunkMesh {
    let mut mesh = ChunkMesh::default();

    for z in 0..CHUNK_HEIGHT {
        for y in 0..CHUNK_WIDTH {
            for x in 0..CHUNK_LENGTH {
                let id = chunk.block(x, y, z);
                if !is_solid(id) {
                    continue;
                }

                let block = IVec3::new(x as i32, y as i32, z as i32);
                for direction in Direction::ALL {
                    if face_visible(chunk, block, direction) {
                        mesh.push_face(block, direction, id as u32);
                    }
                }
            }
        }
    }

    mesh
}
