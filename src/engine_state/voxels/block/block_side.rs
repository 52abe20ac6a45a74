//! # Block Side Module
//!
//! The six axis-aligned faces of a voxel block, and the axis bookkeeping the
//! greedy mesher needs to walk slices perpendicular to each face.

use cgmath::Vector3;

/// One of the six faces of a block.
///
/// The discriminants are stable and used to index per-face tables such as the
/// UV rectangles of a block definition.
///
/// The order is: [TOP, BOTTOM, NORTH, SOUTH, EAST, WEST]
#[allow(clippy::upper_case_acronyms)]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// Facing positive Y
    TOP = 0,

    /// Facing negative Y
    BOTTOM = 1,

    /// Facing negative Z
    NORTH = 2,

    /// Facing positive Z
    SOUTH = 3,

    /// Facing positive X
    EAST = 4,

    /// Facing negative X
    WEST = 5,
}

/// Index of a component in a 3D coordinate.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    /// Unit vector along this axis.
    pub fn unit(self) -> Vector3<i32> {
        match self {
            Axis::X => Vector3::new(1, 0, 0),
            Axis::Y => Vector3::new(0, 1, 0),
            Axis::Z => Vector3::new(0, 0, 1),
        }
    }
}

impl BlockSide {
    /// Returns all six faces in discriminant order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::TOP,
            BlockSide::BOTTOM,
            BlockSide::NORTH,
            BlockSide::SOUTH,
            BlockSide::EAST,
            BlockSide::WEST,
        ]
    }

    /// Position of this face in per-face tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Integer offset from a block to the neighbour this face looks at.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::NORTH => Vector3::new(0, 0, -1),
            BlockSide::SOUTH => Vector3::new(0, 0, 1),
            BlockSide::EAST => Vector3::new(1, 0, 0),
            BlockSide::WEST => Vector3::new(-1, 0, 0),
        }
    }

    /// Outward unit normal of this face.
    pub fn normal(self) -> Vector3<f32> {
        let offset = self.offset();
        Vector3::new(offset.x as f32, offset.y as f32, offset.z as f32)
    }

    /// True for faces whose normal points along a positive axis.
    pub fn is_positive(self) -> bool {
        matches!(self, BlockSide::TOP | BlockSide::SOUTH | BlockSide::EAST)
    }

    /// Returns `(normal_axis, u_axis, v_axis)` for the slices of this face.
    ///
    /// Slices are taken perpendicular to `normal_axis`; inside a slice the mask is
    /// laid out with `u` as the column axis and `v` as the row axis.
    /// - TOP/BOTTOM: slices along Y, (u, v) = (X, Z)
    /// - NORTH/SOUTH: slices along Z, (u, v) = (X, Y)
    /// - EAST/WEST: slices along X, (u, v) = (Z, Y)
    pub fn axes(self) -> (Axis, Axis, Axis) {
        match self {
            BlockSide::TOP | BlockSide::BOTTOM => (Axis::Y, Axis::X, Axis::Z),
            BlockSide::NORTH | BlockSide::SOUTH => (Axis::Z, Axis::X, Axis::Y),
            BlockSide::EAST | BlockSide::WEST => (Axis::X, Axis::Z, Axis::Y),
        }
    }

    /// Looks a face up by its discriminant.
    pub fn from_index(index: usize) -> Option<BlockSide> {
        BlockSide::all().get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_are_orthogonal_to_offsets() {
        for side in BlockSide::all() {
            let (normal, u, v) = side.axes();
            let offset = side.offset();
            assert_ne!(offset[normal as usize], 0, "{side:?} normal axis");
            assert_eq!(offset[u as usize], 0, "{side:?} u axis");
            assert_eq!(offset[v as usize], 0, "{side:?} v axis");
        }
    }

    #[test]
    fn index_round_trips() {
        for side in BlockSide::all() {
            assert_eq!(BlockSide::from_index(side.index()), Some(side));
        }
        assert_eq!(BlockSide::from_index(6), None);
    }
}
