//! Terrastream - world streaming and chunk meshing for a voxel block game

pub mod core;
pub mod math;
pub mod voxel;
pub mod terrain;
pub mod render;
pub mod streaming;
pub mod scene;
pub mod engine;
