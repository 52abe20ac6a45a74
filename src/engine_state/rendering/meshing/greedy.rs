//! Greedy meshing implementation for voxel rendering.
//!
//! This module implements the greedy meshing algorithm which combines adjacent coplanar
//! faces of the same block type into larger quads, significantly reducing the number of
//! vertices needed to render a chunk.
//!
//! For each of the six face directions, every slice perpendicular to that direction
//! gets a [`FaceMask`]: a cell is visible when its block is opaque and the block in
//! front of it is not. Lookups past the chunk edge go through a [`BlockQuery`], so a
//! mesh reflects its neighbours as they were when it was built. The mask is then
//! covered with maximal rectangles and each rectangle becomes one quad of six
//! vertices whose UVs stretch across the whole rectangle.

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};

use super::mask::{FaceMask, MaskQuad};
use super::MeshingOptions;
use crate::engine_state::rendering::vertex::ChunkVertex;
use crate::engine_state::voxels::{
    block::{block_side::Axis, BlockId, BlockRegistry, BlockSide, AIR},
    chunk::{Chunk, CHUNK_HEIGHT, CHUNK_SIZE},
    world::BlockQuery,
};

/// Block lookups for one chunk, falling back to the world past its edges.
struct MeshContext<'a> {
    chunk: &'a Chunk,
    neighbours: &'a dyn BlockQuery,
    registry: &'a BlockRegistry,
    origin: Point3<i32>,
}

impl MeshContext<'_> {
    fn block(&self, local: Point3<i32>) -> BlockId {
        if !(0..CHUNK_HEIGHT).contains(&local.y) {
            return AIR;
        }
        if (0..CHUNK_SIZE).contains(&local.x) && (0..CHUNK_SIZE).contains(&local.z) {
            return self.chunk.get_block_at(local);
        }
        self.neighbours.block_at(self.origin + local.to_vec())
    }

    fn is_opaque(&self, local: Point3<i32>) -> bool {
        self.registry.is_opaque(self.block(local))
    }

    fn is_solid(&self, local: Point3<i32>) -> bool {
        self.registry.is_solid(self.block(local))
    }

    /// True when `local` is inside the chunk, opaque, and faces a non-opaque block.
    fn face_visible(&self, local: Point3<i32>, side: BlockSide) -> Option<BlockId> {
        let id = self.chunk.get_block_at(local);
        if !self.registry.is_opaque(id) || self.is_opaque(local + side.offset()) {
            return None;
        }
        Some(id)
    }
}

fn extent(axis: Axis) -> i32 {
    match axis {
        Axis::Y => CHUNK_HEIGHT,
        Axis::X | Axis::Z => CHUNK_SIZE,
    }
}

fn compose(side: BlockSide, slice: i32, u: i32, v: i32) -> Point3<i32> {
    let (normal, u_axis, v_axis) = side.axes();
    let mut position = [0; 3];
    position[normal as usize] = slice;
    position[u_axis as usize] = u;
    position[v_axis as usize] = v;
    position.into()
}

/// Fills `mask` with the visible faces of `side` in `slice`.
fn build_mask(context: &MeshContext, side: BlockSide, slice: i32, mask: &mut FaceMask) {
    mask.clear();
    for v in 0..mask.height() {
        for u in 0..mask.width() {
            let local = compose(side, slice, u as i32, v as i32);
            if let Some(id) = context.face_visible(local, side) {
                mask.set(u, v, id);
            }
        }
    }
}

/// Corner occlusion level in [0, 3] from the three cells around a corner.
fn occlusion_level(side1: bool, side2: bool, corner: bool) -> u8 {
    if side1 && side2 {
        0
    } else {
        3 - (side1 as u8 + side2 as u8 + corner as u8)
    }
}

/// Ambient occlusion of the corner of cell (u, v) that points toward (du, dv).
fn corner_ao(context: &MeshContext, side: BlockSide, layer: i32, u: i32, v: i32, du: i32, dv: i32) -> f32 {
    let solid = |cu, cv| context.is_solid(compose(side, layer, cu, cv));
    let level = occlusion_level(solid(u + du, v), solid(u, v + dv), solid(u + du, v + dv));
    0.5 + 0.5 * (level as f32 / 3.0)
}

/// Appends the two triangles of `quad` to `vertices`.
fn emit_quad(
    context: &MeshContext,
    side: BlockSide,
    slice: i32,
    quad: &MaskQuad,
    options: &MeshingOptions,
    vertices: &mut Vec<ChunkVertex>,
) {
    let (_, u_axis, v_axis) = side.axes();
    let plane = if side.is_positive() { slice + 1 } else { slice };
    let (u0, v0) = (quad.u as i32, quad.v as i32);
    let (u1, v1) = (u0 + quad.width as i32, v0 + quad.height as i32);

    let uv_rect = context.registry.face_uv(quad.block, side);
    let normal = side.normal();
    let layer = slice + side.offset()[side.axes().0 as usize];

    // (u, v, u factor, v factor, occlusion direction)
    let corners = [
        (u0, v0, 0.0, 0.0, (u0, v0, -1, -1)),
        (u1, v0, 1.0, 0.0, (u1 - 1, v0, 1, -1)),
        (u1, v1, 1.0, 1.0, (u1 - 1, v1 - 1, 1, 1)),
        (u0, v1, 0.0, 1.0, (u0, v1 - 1, -1, 1)),
    ]
    .map(|(u, v, fu, fv, (cu, cv, du, dv))| {
        let local = compose(side, plane, u, v);
        let position = Point3::new(local.x as f32, local.y as f32, local.z as f32);
        let ao = if options.ambient_occlusion {
            corner_ao(context, side, layer, cu, cv, du, dv)
        } else {
            1.0
        };
        ChunkVertex::new(position, normal, uv_rect.lerp(fu, fv), ao)
    });

    // Counter-clockwise seen from the side the normal points to.
    let basis = u_axis.unit().cross(v_axis.unit());
    let facing = side.offset();
    let order = if basis.x * facing.x + basis.y * facing.y + basis.z * facing.z > 0 {
        [0, 1, 2, 0, 2, 3]
    } else {
        [0, 2, 1, 0, 3, 2]
    };
    vertices.extend(order.iter().map(|&corner| corners[corner]));
}

/// Builds the greedy mesh of `chunk`.
///
/// # Arguments
/// * `chunk` - The chunk to mesh, borrowed for the duration of the call
/// * `neighbours` - Resolves blocks outside the chunk, in world coordinates
/// * `registry` - Opacity, solidity and UVs of block ids
/// * `options` - Meshing switches such as ambient occlusion
///
/// # Returns
/// Six vertices per merged quad, faces in [`BlockSide::all`] order, chunk-local
/// positions. Empty when nothing is visible.
pub fn greedy_mesh(
    chunk: &Chunk,
    neighbours: &dyn BlockQuery,
    registry: &BlockRegistry,
    options: &MeshingOptions,
) -> Vec<ChunkVertex> {
    let context = MeshContext {
        chunk,
        neighbours,
        registry,
        origin: chunk.world_origin(),
    };

    let mut vertices = Vec::new();
    if chunk.is_empty() {
        return vertices;
    }

    for side in BlockSide::all() {
        let (normal, u_axis, v_axis) = side.axes();
        let mut mask = FaceMask::new(extent(u_axis) as usize, extent(v_axis) as usize);

        for slice in 0..extent(normal) {
            build_mask(&context, side, slice, &mut mask);
            mask.extract_quads(|quad| emit_quad(&context, side, slice, &quad, options, &mut vertices));
        }
    }

    vertices
}

/// Counts the faces a naive per-block mesher would emit for `chunk`.
///
/// Uses the same visibility rule as [`greedy_mesh`], so the greedy mesh always
/// covers exactly this many unit faces.
pub fn count_visible_faces(chunk: &Chunk, neighbours: &dyn BlockQuery, registry: &BlockRegistry) -> usize {
    let context = MeshContext {
        chunk,
        neighbours,
        registry,
        origin: chunk.world_origin(),
    };

    let mut count = 0;
    for y in 0..CHUNK_HEIGHT {
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let local = Point3::new(x, y, z);
                count += BlockSide::all()
                    .into_iter()
                    .filter(|&side| context.face_visible(local, side).is_some())
                    .count();
            }
        }
    }
    count
}

/// Face normal of a triangle, for winding checks.
pub fn triangle_normal(a: &ChunkVertex, b: &ChunkVertex, c: &ChunkVertex) -> Vector3<f32> {
    let (a, b, c) = (a.position(), b.position(), c.position());
    (b - a).cross(c - a).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::world::EmptyNeighbours;

    fn registry() -> BlockRegistry {
        BlockRegistry::with_defaults()
    }

    fn stone(registry: &BlockRegistry) -> BlockId {
        registry.by_name("Stone").unwrap()
    }

    #[test]
    fn empty_chunk_has_no_vertices() {
        let chunk = Chunk::new(Point3::new(0, 0, 0));
        let vertices = greedy_mesh(&chunk, &EmptyNeighbours, &registry(), &MeshingOptions::default());
        assert!(vertices.is_empty());
    }

    #[test]
    fn single_block_has_six_faces() {
        let registry = registry();
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_block(4, 10, 4, stone(&registry));
        let vertices = greedy_mesh(&chunk, &EmptyNeighbours, &registry, &MeshingOptions::default());
        assert_eq!(vertices.len(), 36, "one quad per face");
    }

    #[test]
    fn windings_match_normals() {
        let registry = registry();
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_block(2, 3, 4, stone(&registry));
        chunk.set_block(3, 3, 4, stone(&registry));
        let vertices = greedy_mesh(&chunk, &EmptyNeighbours, &registry, &MeshingOptions::default());

        for triangle in vertices.chunks(3) {
            let computed = triangle_normal(&triangle[0], &triangle[1], &triangle[2]);
            let expected = Vector3::from(triangle[0].normal);
            assert!((computed - expected).magnitude() < 1e-5, "{computed:?} vs {expected:?}");
        }
    }

    #[test]
    fn uvs_stretch_over_merged_quads() {
        let registry = registry();
        let id = stone(&registry);
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        for x in 0..3 {
            chunk.set_block(x, 0, 0, id);
        }
        let vertices = greedy_mesh(&chunk, &EmptyNeighbours, &registry, &MeshingOptions::default());
        let rect = registry.face_uv(id, BlockSide::TOP);
        let top: Vec<_> = vertices.iter().filter(|v| v.normal == [0.0, 1.0, 0.0]).collect();
        assert_eq!(top.len(), 6);
        for vertex in top {
            let at_far_x = vertex.position[0] == 3.0;
            let expected_u = if at_far_x { rect.max[0] } else { rect.min[0] };
            assert!((vertex.tex_coord[0] - expected_u).abs() < 1e-6);
        }
    }

    #[test]
    fn occlusion_levels() {
        assert_eq!(occlusion_level(true, true, false), 0);
        assert_eq!(occlusion_level(true, true, true), 0);
        assert_eq!(occlusion_level(false, false, false), 3);
        assert_eq!(occlusion_level(true, false, true), 1);
        assert_eq!(occlusion_level(false, false, true), 2);
    }

    #[test]
    fn ambient_occlusion_darkens_inner_corners() {
        let registry = registry();
        let id = stone(&registry);
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_block(5, 0, 5, id);
        chunk.set_block(6, 1, 5, id);
        let options = MeshingOptions {
            ambient_occlusion: true,
        };
        let vertices = greedy_mesh(&chunk, &EmptyNeighbours, &registry, &options);

        // Top face of (5, 0, 5) touches the block at (6, 1, 5) along its +x edge.
        let top: Vec<_> = vertices
            .iter()
            .filter(|v| v.normal == [0.0, 1.0, 0.0] && v.position[1] == 1.0)
            .collect();
        assert!(!top.is_empty());
        for vertex in top {
            if vertex.position[0] == 6.0 {
                assert!(vertex.ao < 1.0, "corner next to the wall should darken");
            } else {
                assert_eq!(vertex.ao, 1.0);
            }
        }
    }

    #[test]
    fn transparent_blocks_do_not_hide_faces() {
        let registry = registry();
        let water = registry.by_name("Water").unwrap();
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_block(0, 0, 0, stone(&registry));
        chunk.set_block(0, 1, 0, water);
        let vertices = greedy_mesh(&chunk, &EmptyNeighbours, &registry, &MeshingOptions::default());
        assert_eq!(vertices.len(), 36, "water is neither meshed nor occluding");
    }
}
