//! Visibility mask of one slice and the greedy rectangle extraction over it.

use bitvec::prelude::BitVec;

use crate::engine_state::voxels::block::BlockId;

/// A rectangle of same-typed visible mask cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MaskQuad {
    pub u: usize,
    pub v: usize,
    pub width: usize,
    pub height: usize,
    pub block: BlockId,
}

/// Row-major 2D mask of visible faces in one slice.
///
/// `u` indexes columns and `v` rows. Each visible cell carries the id of the block
/// the face belongs to; only cells with equal ids merge.
pub struct FaceMask {
    width: usize,
    height: usize,
    visible: BitVec,
    blocks: Vec<BlockId>,
}

impl FaceMask {
    /// Creates an all-invisible mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            visible: BitVec::repeat(false, width * height),
            blocks: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Marks every cell invisible.
    pub fn clear(&mut self) {
        self.visible.fill(false);
    }

    /// Marks cell (u, v) visible with block `block`.
    pub fn set(&mut self, u: usize, v: usize, block: BlockId) {
        let index = v * self.width + u;
        self.visible.set(index, true);
        self.blocks[index] = block;
    }

    /// Block of cell (u, v) if it is visible.
    pub fn get(&self, u: usize, v: usize) -> Option<BlockId> {
        let index = v * self.width + u;
        self.visible[index].then(|| self.blocks[index])
    }

    /// Number of visible cells.
    pub fn visible_count(&self) -> usize {
        self.visible.count_ones()
    }

    /// True when no cell is visible.
    pub fn is_empty(&self) -> bool {
        self.visible.not_any()
    }

    fn matches(&self, u: usize, v: usize, block: BlockId) -> bool {
        let index = v * self.width + u;
        self.visible[index] && self.blocks[index] == block
    }

    /// Covers every visible cell with maximal rectangles, emitting each one.
    ///
    /// Cells are scanned row-major. From the first unconsumed visible cell the
    /// rectangle grows along `u` while cells match, then along `v` while the whole
    /// run matches in the next row. Its cells are consumed before scanning resumes
    /// right after it. Rectangles never overlap and together cover exactly the cells
    /// that were visible. The mask is empty afterwards.
    pub fn extract_quads(&mut self, mut emit: impl FnMut(MaskQuad)) {
        if self.is_empty() {
            return;
        }

        for v in 0..self.height {
            let mut u = 0;
            while u < self.width {
                let Some(block) = self.get(u, v) else {
                    u += 1;
                    continue;
                };

                let mut width = 1;
                while u + width < self.width && self.matches(u + width, v, block) {
                    width += 1;
                }

                let mut height = 1;
                while v + height < self.height
                    && (u..u + width).all(|cu| self.matches(cu, v + height, block))
                {
                    height += 1;
                }

                for row in v..v + height {
                    let start = row * self.width + u;
                    self.visible[start..start + width].fill(false);
                }

                emit(MaskQuad {
                    u,
                    v,
                    width,
                    height,
                    block,
                });
                u += width;
            }
        }
    }
}
