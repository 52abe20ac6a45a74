//! # Voxel World Core
//!
//! This module contains the voxel data side of the pipeline: what a block is, how
//! blocks are stored in chunks, how chunks are shared between threads, and how
//! terrain fills them.
//!
//! ## Architecture
//!
//! The voxel system is organized into several key components:
//!
//! * **Block**: Block ids, the registry of block properties, and block faces
//! * **Chunk**: Fixed-size 16x256x16 arrays of blocks plus their pipeline state
//! * **Generation**: Noise layers, the height function and surface classification
//! * **World**: The shared map of resident chunks and world-coordinate block queries
//! * **Tasks**: Chunk generation, run on worker threads or inline
//!
//! ## Performance Considerations
//!
//! * Chunks are loaded and evicted around the viewer by the chunk manager
//! * Generation runs off the main thread in threaded mode
//! * One byte per block keeps a chunk at 64 KiB
//!
//! ## Data Flow
//!
//! 1. The chunk manager inserts an empty chunk and publishes a generation task
//! 2. The task fills the chunk from a surface sampler snapshot
//! 3. The chunk turns dirty, which schedules meshing
//! 4. Edits through the manager dirty the chunk again and the cycle repeats
//!
//! ## Thread Safety
//!
//! * The chunk map sits behind one mutex, each chunk behind its own read-write lock
//! * No code path holds two of these locks at once
//! * Generation only writes the chunk it generates, plus dirty flags of neighbours

pub mod block;
pub mod chunk;
pub mod generation;
pub mod tasks;
pub mod world;
