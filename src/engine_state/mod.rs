//! # Engine State Module
//!
//! The core of the crate: voxel data, terrain generation, meshing, task scheduling
//! and the chunk manager that ties them together.
//!
//! ## Key Components
//!
//! * `chunk_manager` - Residency, scheduling and GPU uploads around a viewer
//! * `config` - Serializable streaming, meshing and terrain settings
//! * `rendering` - Vertex format, GPU seam, greedy meshing and meshing tasks
//! * `task_management` - Task queues and worker pools
//! * `voxels` - Blocks, chunks, the shared world map, generation and its tasks
//!
//! ## Architecture
//!
//! Each subsystem is responsible for one aspect of the pipeline. The
//! `ChunkManager` is the central coordinator: it owns the world map, both worker
//! pools and every uploaded mesh, and is driven once per frame by its caller.
//!
//! ## Performance Considerations
//!
//! * Task-based parallelism for generation and meshing
//! * Greedy meshing to keep vertex counts low
//! * Chunk-based loading and unloading with hysteresis around the viewer

pub mod chunk_manager;
pub mod config;
pub mod rendering;
pub mod task_management;
pub mod voxels;
