//! Chunk meshing and the render-thread mesh registry

pub mod vertex;
pub mod mesher;
pub mod registry;

pub use vertex::Vertex;
pub use mesher::{ChunkMesh, VERTICES_PER_FACE, mesh_chunk};
pub use registry::{
    ChunkRegistry, MeshBackend, ProcessedOps, RegistryOp, RegistryQueue, RegistryReceiver,
    registry_channel,
};
