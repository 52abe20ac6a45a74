//! # GPU Seam
//!
//! The pipeline does not talk to a graphics API directly. It hands vertex lists
//! to a [`GraphicsContext`] owned by the rendering thread and keeps the returned
//! [`GpuBuffer`] inside a [`ChunkMesh`].
//!
//! ## Ownership
//!
//! A `ChunkMesh` owns at most one buffer. The buffer is created on the first
//! non-empty upload, rewritten in place by later uploads, and released by its
//! `Drop` exactly once. `ChunkMesh` is not `Clone`; moving it moves the buffer.
//!
//! Meshes live next to, not inside, the worker-shared chunk data: the chunk manager
//! keeps them in a map only the rendering thread touches, so a buffer is always
//! released on that thread even if a worker still holds the evicted chunk.
//!
//! [`HeadlessGraphics`] is a CPU-side context that keeps uploads in memory and
//! counts traffic. The headless driver and the tests use it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cgmath::Point3;

use super::vertex::ChunkVertex;

/// A vertex buffer living on the graphics device.
pub trait GpuBuffer {
    /// Replaces the buffer contents with `vertices`.
    fn write(&mut self, vertices: &[ChunkVertex]);
}

/// The graphics-thread operations the pipeline needs.
pub trait GraphicsContext {
    /// Uploads `vertices` into a new buffer.
    fn create_buffer(&mut self, vertices: &[ChunkVertex]) -> Box<dyn GpuBuffer>;

    /// Draws the first `vertex_count` vertices of `buffer` translated by `origin`.
    fn draw(&mut self, buffer: &dyn GpuBuffer, vertex_count: u32, origin: Point3<f32>);
}

/// Visibility test against the current view frustum.
pub trait FrustumCulling {
    /// True when the box `min..max` is at least partially inside the frustum.
    fn contains_bounding_box(&self, min: Point3<f32>, max: Point3<f32>) -> bool;
}

impl<F> FrustumCulling for F
where
    F: Fn(Point3<f32>, Point3<f32>) -> bool,
{
    fn contains_bounding_box(&self, min: Point3<f32>, max: Point3<f32>) -> bool {
        self(min, max)
    }
}

/// A frustum that contains everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct AllVisible;

impl FrustumCulling for AllVisible {
    fn contains_bounding_box(&self, _min: Point3<f32>, _max: Point3<f32>) -> bool {
        true
    }
}

/// The uploaded mesh of one chunk.
#[derive(Default)]
pub struct ChunkMesh {
    buffer: Option<Box<dyn GpuBuffer>>,
    vertex_count: u32,
}

impl ChunkMesh {
    /// Creates a mesh with no buffer and no geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the mesh with `vertices`.
    ///
    /// An empty list is valid and leaves the mesh without geometry; an existing
    /// buffer is kept for reuse. Must be called on the graphics thread.
    pub fn upload(&mut self, context: &mut dyn GraphicsContext, vertices: &[ChunkVertex]) {
        self.vertex_count = vertices.len() as u32;
        if vertices.is_empty() {
            return;
        }
        match self.buffer.as_mut() {
            Some(buffer) => buffer.write(vertices),
            None => self.buffer = Some(context.create_buffer(vertices)),
        }
    }

    /// True when the last upload had vertices.
    pub fn has_geometry(&self) -> bool {
        self.vertex_count > 0
    }

    /// Vertex count of the last upload.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// True once a buffer has been created.
    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    /// Issues a draw at `origin` when there is geometry.
    ///
    /// # Returns
    /// `true` when a draw was issued.
    pub fn draw(&self, context: &mut dyn GraphicsContext, origin: Point3<f32>) -> bool {
        match &self.buffer {
            Some(buffer) if self.has_geometry() => {
                context.draw(buffer.as_ref(), self.vertex_count, origin);
                true
            }
            _ => false,
        }
    }
}

/// CPU-side [`GraphicsContext`] that stores uploads as bytes.
#[derive(Debug, Default)]
pub struct HeadlessGraphics {
    live_buffers: Arc<AtomicUsize>,
    live_bytes: Arc<AtomicUsize>,
    /// Buffers created so far
    pub buffers_created: usize,
    /// Draw calls issued so far
    pub draw_calls: usize,
    /// Vertices submitted by those draw calls
    pub vertices_drawn: u64,
}

impl HeadlessGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers created and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.live_buffers.load(Ordering::SeqCst)
    }

    /// Bytes held by the live buffers.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::SeqCst)
    }
}

struct HeadlessBuffer {
    bytes: Vec<u8>,
    live_buffers: Arc<AtomicUsize>,
    live_bytes: Arc<AtomicUsize>,
}

impl GpuBuffer for HeadlessBuffer {
    fn write(&mut self, vertices: &[ChunkVertex]) {
        self.live_bytes.fetch_sub(self.bytes.len(), Ordering::SeqCst);
        self.bytes.clear();
        self.bytes.extend_from_slice(bytemuck::cast_slice(vertices));
        self.live_bytes.fetch_add(self.bytes.len(), Ordering::SeqCst);
    }
}

impl Drop for HeadlessBuffer {
    fn drop(&mut self) {
        self.live_buffers.fetch_sub(1, Ordering::SeqCst);
        self.live_bytes.fetch_sub(self.bytes.len(), Ordering::SeqCst);
    }
}

impl GraphicsContext for HeadlessGraphics {
    fn create_buffer(&mut self, vertices: &[ChunkVertex]) -> Box<dyn GpuBuffer> {
        self.buffers_created += 1;
        self.live_buffers.fetch_add(1, Ordering::SeqCst);
        let bytes: Vec<u8> = bytemuck::cast_slice(vertices).to_vec();
        self.live_bytes.fetch_add(bytes.len(), Ordering::SeqCst);
        Box::new(HeadlessBuffer {
            bytes,
            live_buffers: self.live_buffers.clone(),
            live_bytes: self.live_bytes.clone(),
        })
    }

    fn draw(&mut self, _buffer: &dyn GpuBuffer, vertex_count: u32, _origin: Point3<f32>) {
        self.draw_calls += 1;
        self.vertices_drawn += vertex_count as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    fn quad() -> Vec<ChunkVertex> {
        vec![ChunkVertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0), [0.0, 0.0], 1.0); 6]
    }

    #[test]
    fn buffer_is_created_lazily_and_reused() {
        let mut graphics = HeadlessGraphics::new();
        let mut mesh = ChunkMesh::new();

        mesh.upload(&mut graphics, &[]);
        assert!(!mesh.has_geometry());
        assert!(!mesh.has_buffer());
        assert_eq!(graphics.buffers_created, 0);

        mesh.upload(&mut graphics, &quad());
        mesh.upload(&mut graphics, &quad());
        assert!(mesh.has_geometry());
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(graphics.buffers_created, 1);

        mesh.upload(&mut graphics, &[]);
        assert!(!mesh.has_geometry());
        assert!(!mesh.draw(&mut graphics, Point3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn buffers_are_released_once_on_drop() {
        let mut graphics = HeadlessGraphics::new();
        let mut mesh = ChunkMesh::new();
        mesh.upload(&mut graphics, &quad());
        assert_eq!(graphics.live_buffers(), 1);

        let moved = mesh;
        assert_eq!(graphics.live_buffers(), 1);
        drop(moved);
        assert_eq!(graphics.live_buffers(), 0);
        assert_eq!(graphics.live_bytes(), 0);
    }

    #[test]
    fn rewrites_replace_the_stored_bytes() {
        let mut graphics = HeadlessGraphics::new();
        let mut mesh = ChunkMesh::new();
        let vertex_size = std::mem::size_of::<ChunkVertex>();

        mesh.upload(&mut graphics, &quad());
        assert_eq!(graphics.live_bytes(), 6 * vertex_size);

        let mut two_quads = quad();
        two_quads.extend(quad());
        mesh.upload(&mut graphics, &two_quads);
        assert_eq!(graphics.live_bytes(), 12 * vertex_size);
        assert_eq!(graphics.buffers_created, 1);
    }

    #[test]
    fn draws_only_with_geometry() {
        let mut graphics = HeadlessGraphics::new();
        let mut mesh = ChunkMesh::new();
        mesh.upload(&mut graphics, &quad());
        assert!(mesh.draw(&mut graphics, Point3::new(16.0, 0.0, 0.0)));
        assert_eq!(graphics.draw_calls, 1);
        assert_eq!(graphics.vertices_drawn, 6);
    }
}
