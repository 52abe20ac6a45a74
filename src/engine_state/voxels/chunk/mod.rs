//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a dense 16x256x16 column of block ids,
//! the unit of generation, meshing and streaming.
//!
//! ## Storage
//!
//! Blocks are one byte each, stored x-fastest, then z, then y, so one horizontal
//! layer is a contiguous 256-byte run. Every access is bounds-checked: reads outside
//! the chunk return [`AIR`] and writes outside it are ignored, because voxel queries
//! routinely probe one block past an edge.
//!
//! ## Mesh freshness
//!
//! A chunk does not own GPU data. It tracks whether its mesh is stale with a
//! revision counter: every change bumps `revision`, and uploading a mesh built
//! from revision `r` records `meshed_revision = r`. The chunk is dirty while the
//! two differ, so an edit that lands while a mesh is being built keeps the chunk
//! dirty instead of being lost.
//!
//! Revisions restart for every new chunk, so each chunk also carries a
//! process-unique `instance` id. A chunk evicted and loaded again at the same
//! position gets a new id, and meshes built from the old one can be told apart.

use std::sync::atomic::{AtomicU64, Ordering};

use cgmath::Point3;

use super::block::{BlockId, BlockRegistry, AIR};
use super::generation::SurfaceSampler;

pub mod chunk_position;

pub use chunk_position::ChunkPos;

/// Width and depth of a chunk in blocks.
pub const CHUNK_SIZE: i32 = 16;
/// Height of a chunk (and of the world) in blocks.
pub const CHUNK_HEIGHT: i32 = 256;
/// Number of blocks in one horizontal layer.
pub const CHUNK_LAYER_SIZE: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;
/// Total number of blocks in a chunk.
pub const CHUNK_VOLUME: usize = CHUNK_LAYER_SIZE * CHUNK_HEIGHT as usize;
/// Depth of the filler band below a column's top block.
pub const FILLER_DEPTH: i32 = 3;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Where a resident chunk is in the streaming pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Air-filled, queued for generation
    Loading,
    /// Blocks generated, queued for meshing
    Generated,
    /// Mesh built, queued for upload
    MeshReady,
    /// Mesh uploaded and drawable
    Resident,
}

/// A 16x256x16 cuboid of blocks.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_world::{Chunk, AIR};
///
/// let mut chunk = Chunk::new(Point3::new(0, 0, 0));
/// assert!(chunk.set_block(1, 2, 3, 7));
/// assert_eq!(chunk.get_block(1, 2, 3), 7);
/// assert_eq!(chunk.get_block(-1, 2, 3), AIR);
/// assert!(chunk.is_dirty());
/// ```
#[derive(Clone, Debug)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: ChunkPos,
    blocks: Box<[BlockId]>,
    state: ChunkState,
    instance: u64,
    revision: u64,
    meshed_revision: u64,
    mesh_queued: bool,
}

fn block_index(x: i32, y: i32, z: i32) -> Option<usize> {
    let inside = (0..CHUNK_SIZE).contains(&x)
        && (0..CHUNK_HEIGHT).contains(&y)
        && (0..CHUNK_SIZE).contains(&z);
    inside.then(|| x as usize + (z * CHUNK_SIZE) as usize + y as usize * CHUNK_LAYER_SIZE)
}

impl Chunk {
    /// Creates an air-filled chunk waiting for generation.
    pub fn new(position: ChunkPos) -> Self {
        Self {
            position,
            blocks: vec![AIR; CHUNK_VOLUME].into_boxed_slice(),
            state: ChunkState::Loading,
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            revision: 0,
            meshed_revision: 0,
            mesh_queued: false,
        }
    }

    /// Returns the block at chunk-local (x, y, z), or air outside the chunk.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockId {
        block_index(x, y, z).map_or(AIR, |index| self.blocks[index])
    }

    /// Point form of [`Chunk::get_block`].
    pub fn get_block_at(&self, local: Point3<i32>) -> BlockId {
        self.get_block(local.x, local.y, local.z)
    }

    /// Writes the block at chunk-local (x, y, z).
    ///
    /// # Returns
    /// `true` when the stored value changed, which also marks the chunk dirty.
    /// Writes outside the chunk and writes of the current value return `false`.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        let Some(index) = block_index(x, y, z) else {
            return false;
        };
        if self.blocks[index] == id {
            return false;
        }
        self.blocks[index] = id;
        self.mark_dirty();
        true
    }

    /// Fills every column from `sampler` and marks the chunk dirty.
    ///
    /// Per column: air above the sampled height (or water up to sea level when the
    /// sampler floods), the top block at the height, filler in the
    /// [`FILLER_DEPTH`] blocks below, base block underneath. No mesh is built.
    pub fn generate(&mut self, sampler: &SurfaceSampler) {
        let origin = self.world_origin();
        let water = sampler.water_fill();

        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let sample = sampler.sample_column(origin.x + x, origin.z + z);
                for y in 0..CHUNK_HEIGHT {
                    let id = if y > sample.height {
                        match water {
                            Some((water, level)) if y <= level => water,
                            _ => AIR,
                        }
                    } else if y == sample.height {
                        sample.top
                    } else if y >= sample.height - FILLER_DEPTH {
                        sample.filler
                    } else {
                        sample.base
                    };
                    if let Some(index) = block_index(x, y, z) {
                        self.blocks[index] = id;
                    }
                }
            }
        }

        self.state = ChunkState::Generated;
        self.mark_dirty();
    }

    /// Raw block storage, x-fastest then z then y.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// True when every block is air.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|&id| id == AIR)
    }

    /// World block coordinate of local (0, 0, 0).
    pub fn world_origin(&self) -> Point3<i32> {
        chunk_position::chunk_origin(self.position)
    }

    /// World block coordinate of local (x, y, z).
    pub fn block_world_position(&self, x: i32, y: i32, z: i32) -> Point3<i32> {
        let origin = self.world_origin();
        Point3::new(origin.x + x, origin.y + y, origin.z + z)
    }

    /// Highest y in local column (x, z) holding a solid block.
    pub fn highest_solid_y(&self, x: i32, z: i32, registry: &BlockRegistry) -> Option<i32> {
        (0..CHUNK_HEIGHT)
            .rev()
            .find(|&y| registry.is_solid(self.get_block(x, y, z)))
    }

    /// Current pipeline state.
    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Moves the chunk to `state`.
    pub fn set_state(&mut self, state: ChunkState) {
        self.state = state;
    }

    /// True once generation has filled the chunk.
    pub fn is_generated(&self) -> bool {
        self.state != ChunkState::Loading
    }

    /// Id of this chunk instance, shared by its clones and unique otherwise.
    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// Counter bumped by every change to the block data.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True while the uploaded mesh is older than the block data.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.meshed_revision
    }

    /// Marks the mesh stale, e.g. after a neighbour changed.
    pub fn mark_dirty(&mut self) {
        self.revision += 1;
    }

    /// Records that a mesh built from `revision` was uploaded.
    ///
    /// # Returns
    /// `false` when an equal or newer mesh was already recorded; the caller should
    /// drop the stale mesh.
    pub fn mark_meshed(&mut self, revision: u64) -> bool {
        if revision <= self.meshed_revision {
            return false;
        }
        self.meshed_revision = revision;
        true
    }

    /// True when the chunk is generated, dirty and not yet queued for meshing.
    pub fn needs_mesh(&self) -> bool {
        self.is_generated() && self.is_dirty() && !self.mesh_queued
    }

    /// Flags the chunk as waiting in the meshing queue.
    pub fn set_mesh_queued(&mut self, queued: bool) {
        self.mesh_queued = queued;
    }

    /// True while the chunk waits in the meshing queue.
    pub fn is_mesh_queued(&self) -> bool {
        self.mesh_queued
    }
}
