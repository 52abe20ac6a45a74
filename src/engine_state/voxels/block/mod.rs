//! # Block Module
//!
//! Block identifiers, per-face texture regions and the registry that maps ids to
//! block properties.
//!
//! Blocks are stored in chunks as bare `BlockId` bytes; everything else about a
//! block (opacity, solidity, which part of the texture atlas each face samples) is
//! looked up in a [`BlockRegistry`] constructed once and shared by reference.

use serde::{Deserialize, Serialize};

pub mod block_registry;
pub mod block_side;

pub use block_registry::BlockRegistry;
pub use block_side::BlockSide;

/// The integer type used to identify block types in chunk storage.
pub type BlockId = u8;

/// The id of the empty block. Always non-opaque and non-solid.
pub const AIR: BlockId = 0;

/// A rectangle of the texture atlas in normalized UV space.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UvRect {
    /// Lower corner (u, v)
    pub min: [f32; 2],
    /// Upper corner (u, v)
    pub max: [f32; 2],
}

impl UvRect {
    /// Creates a rectangle from its two corners.
    pub fn new(min: [f32; 2], max: [f32; 2]) -> Self {
        Self { min, max }
    }

    /// Returns the tile at `(column, row)` of an atlas split into `tiles_per_side`² tiles.
    pub fn atlas_tile(column: u32, row: u32, tiles_per_side: u32) -> Self {
        let step = 1.0 / tiles_per_side.max(1) as f32;
        let min = [column as f32 * step, row as f32 * step];
        Self {
            min,
            max: [min[0] + step, min[1] + step],
        }
    }

    /// Interpolates inside the rectangle; factors of 0 and 1 give the corners.
    pub fn lerp(&self, u: f32, v: f32) -> [f32; 2] {
        [
            self.min[0] + (self.max[0] - self.min[0]) * u,
            self.min[1] + (self.max[1] - self.min[1]) * v,
        ]
    }
}

/// Everything the pipeline knows about one block type.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockDefinition {
    pub id: BlockId,
    pub name: String,
    /// Hides the faces of neighbouring blocks
    pub opaque: bool,
    /// Occupies space for collision and ambient occlusion
    pub solid: bool,
    /// Texture region per face, indexed by [`BlockSide::index`]
    pub face_uvs: [UvRect; 6],
}

impl BlockDefinition {
    /// The definition every unknown id resolves to.
    pub fn air() -> Self {
        Self {
            id: AIR,
            name: "Air".to_string(),
            opaque: false,
            solid: false,
            face_uvs: [UvRect::default(); 6],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_tiles_partition_the_unit_square() {
        let tile = UvRect::atlas_tile(15, 0, 16);
        assert_eq!(tile.min, [15.0 / 16.0, 0.0]);
        assert_eq!(tile.max, [1.0, 1.0 / 16.0]);
    }

    #[test]
    fn lerp_hits_corners() {
        let rect = UvRect::new([0.25, 0.5], [0.5, 0.75]);
        assert_eq!(rect.lerp(0.0, 0.0), rect.min);
        assert_eq!(rect.lerp(1.0, 1.0), rect.max);
    }
}
