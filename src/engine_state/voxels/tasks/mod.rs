//! # Voxel Task System
//!
//! This module contains tasks related to voxel world generation. They run on the
//! generation worker pool, or inline under a per-frame budget.

pub mod chunk_generation_task;

pub use chunk_generation_task::ChunkGenerationTask;
