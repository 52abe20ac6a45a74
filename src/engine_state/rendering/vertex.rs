//! Vertex format produced by the mesher.
//!
//! The layout is `#[repr(C)]` and `Pod` so a vertex list can be handed to a GPU
//! buffer as raw bytes with `bytemuck::cast_slice`.

use cgmath::{Point3, Vector3};

/// A vertex of a chunk mesh.
///
/// # Memory Layout
/// - Position: [f32; 3], chunk-local (12 bytes)
/// - Normal: [f32; 3], one of the six axis unit vectors (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
/// - Ambient Occlusion: f32, 1.0 for unoccluded (4 bytes)
///
/// Total size: 36 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
    pub ao: f32,
}

impl ChunkVertex {
    /// Creates a new vertex.
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, tex_coord: [f32; 2], ao: f32) -> Self {
        ChunkVertex {
            position: position.into(),
            normal: normal.into(),
            tex_coord,
            ao,
        }
    }

    /// Position as a point.
    pub fn position(&self) -> Point3<f32> {
        self.position.into()
    }
}
