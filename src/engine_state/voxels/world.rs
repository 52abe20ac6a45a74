//! # World Module
//!
//! This module provides the `World` struct, the shared map of resident chunks, and
//! the [`BlockQuery`] trait through which meshing, collision and debug code read
//! blocks by world coordinate.
//!
//! ## Architecture
//!
//! The world is sparse: only chunks the streaming policy keeps resident are in the
//! map. `World` is a cheap handle (`Clone` shares the same map) so the chunk
//! manager and every worker thread can hold one.
//!
//! ## Locking
//!
//! The map sits behind a single mutex; each chunk sits behind its own read-write
//! lock inside an [`MtResource`]. No code path holds two of these at once: a lookup
//! clones the chunk handle under the map lock, releases it, and only then touches
//! the chunk. Check-then-insert happens in one locked section through the entry
//! API, so a coordinate can never be loaded twice.
//!
//! Block queries take the chunk's read lock. Writers only ever hold a chunk lock for
//! one bounded piece of work (generating it, snapshotting it for meshing, one edit)
//! and never query the world while holding it, so a query waits at most that long.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cgmath::Point3;

use super::block::{BlockId, AIR};
use super::chunk::chunk_position::{chunk_pos_of_block, horizontal_distance, local_of_block};
use super::chunk::{Chunk, ChunkPos};
use crate::core::MtResource;

/// Read access to blocks by world coordinate.
///
/// Implementations return [`AIR`] for any location they know nothing about.
pub trait BlockQuery {
    /// Returns the block at world coordinate `position`.
    fn block_at(&self, position: Point3<i32>) -> BlockId;
}

impl<F> BlockQuery for F
where
    F: Fn(Point3<i32>) -> BlockId,
{
    fn block_at(&self, position: Point3<i32>) -> BlockId {
        self(position)
    }
}

/// A [`BlockQuery`] that sees nothing but air.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmptyNeighbours;

impl BlockQuery for EmptyNeighbours {
    fn block_at(&self, _position: Point3<i32>) -> BlockId {
        AIR
    }
}

/// Shared, sparse map of resident chunks keyed by chunk coordinate.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_world::{BlockQuery, World, AIR};
///
/// let world = World::new();
/// assert!(world.insert_if_absent(Point3::new(-1, 0, 0)));
/// assert!(!world.insert_if_absent(Point3::new(-1, 0, 0)));
///
/// let chunk = world.get_chunk_at(Point3::new(-1, 0, 0)).unwrap();
/// chunk.get_mut().set_block(15, 64, 0, 3);
/// assert_eq!(world.get_block(Point3::new(-1, 64, 0)), 3);
/// assert_eq!(world.block_at(Point3::new(40, 64, 0)), AIR);
/// ```
#[derive(Clone, Default)]
pub struct World {
    chunks: Arc<Mutex<HashMap<ChunkPos, MtResource<Chunk>>>>,
}

impl World {
    /// Creates a new, empty world.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChunkPos, MtResource<Chunk>>> {
        self.chunks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts an air-filled chunk at `position` unless one is already there.
    ///
    /// # Returns
    /// `true` when a new chunk was inserted.
    pub fn insert_if_absent(&self, position: ChunkPos) -> bool {
        let mut chunks = self.lock();
        if chunks.contains_key(&position) {
            return false;
        }
        chunks.insert(position, MtResource::new(Chunk::new(position)));
        true
    }

    /// Inserts every position of `positions` that is not resident yet, in one
    /// locked section.
    ///
    /// # Returns
    /// The positions that were newly inserted, in input order.
    pub fn insert_missing(&self, positions: impl IntoIterator<Item = ChunkPos>) -> Vec<ChunkPos> {
        let mut chunks = self.lock();
        positions
            .into_iter()
            .filter(|&position| {
                if chunks.contains_key(&position) {
                    return false;
                }
                chunks.insert(position, MtResource::new(Chunk::new(position)));
                true
            })
            .collect()
    }

    /// Returns a handle to the chunk at `position`, if resident.
    pub fn get_chunk_at(&self, position: ChunkPos) -> Option<MtResource<Chunk>> {
        self.lock().get(&position).cloned()
    }

    /// Removes every chunk farther than `radius` (Chebyshev, horizontal) from `center`.
    ///
    /// Workers holding a handle to a removed chunk keep it alive until they finish;
    /// their follow-up lookups then miss and the work is dropped.
    ///
    /// # Returns
    /// The removed positions.
    pub fn remove_outside(&self, center: ChunkPos, radius: i32) -> Vec<ChunkPos> {
        let mut removed = Vec::new();
        self.lock().retain(|&position, _| {
            let keep = horizontal_distance(position, center) <= radius;
            if !keep {
                removed.push(position);
            }
            keep
        });
        removed
    }

    /// Positions of all resident chunks, in no particular order.
    pub fn positions(&self) -> Vec<ChunkPos> {
        self.lock().keys().copied().collect()
    }

    /// Handles to all resident chunks, in no particular order.
    pub fn chunks(&self) -> Vec<(ChunkPos, MtResource<Chunk>)> {
        self.lock()
            .iter()
            .map(|(&position, chunk)| (position, chunk.clone()))
            .collect()
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no chunk is resident.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the block at world coordinate `position`.
    ///
    /// Air when the owning chunk is not resident or when `y` is outside the world.
    /// A chunk still waiting for generation is all air.
    pub fn get_block(&self, position: Point3<i32>) -> BlockId {
        let Some(chunk) = self.get_chunk_at(chunk_pos_of_block(position)) else {
            return AIR;
        };
        let block = chunk.get().get_block_at(local_of_block(position));
        block
    }
}

impl BlockQuery for World {
    fn block_at(&self, position: Point3<i32>) -> BlockId {
        self.get_block(position)
    }
}
