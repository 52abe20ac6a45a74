//! Rendering side of the voxel pipeline.
//!
//! This module turns chunk data into vertex lists and owns the seam to the graphics
//! API. It never talks to a device itself: uploads and draws go through the
//! [`gpu::GraphicsContext`] the caller provides.

pub mod gpu;
pub mod meshing;
pub mod tasks;
pub mod vertex;

// Re-export commonly used types
pub use gpu::{AllVisible, ChunkMesh, FrustumCulling, GpuBuffer, GraphicsContext, HeadlessGraphics};
pub use vertex::ChunkVertex;
