//! Mesh generation for voxel rendering.
//!
//! This module handles the conversion of voxel data into GPU-friendly vertex lists.
//! The key goals are:
//! 1. Minimize vertex count by merging coplanar faces
//! 2. Never emit a face hidden behind an opaque block, across chunk borders too
//! 3. Keep meshing a pure function of a chunk snapshot so it can run on any thread
//!
//! # Architecture
//! - `mask`: per-slice visibility mask and greedy rectangle extraction
//! - `greedy`: slice walking, face culling, quad emission and ambient occlusion
//!
//! # Performance Considerations
//! - One mask per face direction is allocated and reused for every slice
//! - Empty chunks and empty slices return before any quad work
//! - Neighbour lookups only leave the chunk on its border cells

use serde::{Deserialize, Serialize};

pub mod greedy;
pub mod mask;

pub use greedy::{count_visible_faces, greedy_mesh, triangle_normal};
pub use mask::{FaceMask, MaskQuad};

/// Switches that change the produced geometry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshingOptions {
    /// Darken vertices next to solid blocks. Off by default; every vertex then
    /// carries an occlusion of 1.0.
    pub ambient_occlusion: bool,
}
