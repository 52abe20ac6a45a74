//! Task for generating mesh data for chunks in a background thread.
//!
//! This module contains the `ChunkMeshGenerationTask`, which snapshots a chunk,
//! runs the greedy mesher over the snapshot and hands the vertex list to the upload
//! queue. Only the main thread drains that queue, so GPU work never leaves it.

use std::sync::Arc;

use log::{debug, trace};
use web_time::Instant;

use crate::engine_state::{
    rendering::{
        meshing::{greedy_mesh, MeshingOptions},
        vertex::ChunkVertex,
    },
    task_management::{Task, TaskQueue},
    voxels::{
        block::BlockRegistry,
        chunk::{ChunkPos, ChunkState},
        world::World,
    },
};

/// A finished mesh waiting for upload on the main thread.
#[derive(Debug)]
pub struct MeshUpload {
    /// The chunk the mesh belongs to
    pub position: ChunkPos,
    /// Instance of the chunk the mesh was built from
    pub instance: u64,
    /// Revision of the block data the mesh was built from
    pub revision: u64,
    /// Chunk-local vertices, possibly empty
    pub vertices: Vec<ChunkVertex>,
}

/// Everything a meshing task needs besides its chunk position.
///
/// Shared by every meshing task through one `Arc`.
pub struct MeshingContext {
    pub world: World,
    pub registry: Arc<BlockRegistry>,
    pub options: MeshingOptions,
    pub uploads: Arc<TaskQueue<MeshUpload>>,
}

/// A task that generates mesh data for a chunk in a background thread.
///
/// This task is responsible for:
/// 1. Looking the chunk up again and dropping the work if it was evicted
/// 2. Copying the block data and its revision under a short write lock
/// 3. Meshing the copy with the world as the neighbour lookup
/// 4. Queueing the result for upload
pub struct ChunkMeshGenerationTask {
    context: Arc<MeshingContext>,
    position: ChunkPos,
}

impl ChunkMeshGenerationTask {
    /// Creates a new chunk mesh generation task.
    ///
    /// The caller must have set the chunk's mesh-queued flag.
    pub fn new(context: Arc<MeshingContext>, position: ChunkPos) -> Self {
        ChunkMeshGenerationTask { context, position }
    }
}

impl Task for ChunkMeshGenerationTask {
    fn process(self) {
        let context = &self.context;
        let Some(chunk) = context.world.get_chunk_at(self.position) else {
            trace!("Chunk {:?} was evicted before meshing", self.position);
            return;
        };

        let snapshot = {
            let mut chunk = chunk.get_mut();
            chunk.set_mesh_queued(false);
            if !chunk.is_generated() {
                // Reloading; generation will queue a fresh mesh.
                return;
            }
            chunk.clone()
        };

        let start = Instant::now();
        let vertices = greedy_mesh(&snapshot, &context.world, &context.registry, &context.options);
        trace!(
            "Meshed chunk {:?} (revision {}) into {} vertices in {:?}",
            self.position,
            snapshot.revision(),
            vertices.len(),
            start.elapsed()
        );

        {
            let mut chunk = chunk.get_mut();
            if chunk.state() == ChunkState::Generated {
                chunk.set_state(ChunkState::MeshReady);
            }
        }

        let queued = context.uploads.push(MeshUpload {
            position: self.position,
            instance: snapshot.instance(),
            revision: snapshot.revision(),
            vertices,
        });
        if !queued {
            debug!("Dropped mesh of chunk {:?} during shutdown", self.position);
        }
    }
}
