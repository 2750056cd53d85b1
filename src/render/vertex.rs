//! Chunk mesh vertex layout

use bytemuck::{Pod, Zeroable};

/// One vertex of a chunk mesh, laid out for direct upload
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Chunk-local position
    pub position: [f32; 3],
    pub uv: [f32; 2],
    /// Block id, used by the shader to pick the texture layer
    pub texture_layer: u32,
}

impl Vertex {
    pub fn new(position: [f32; 3], uv: [f32; 2], texture_layer: u32) -> Self {
        Self { position, uv, texture_layer }
    }
}
