/// Integration tests for meshing correctness
/// These tests validate that the greedy mesher covers exactly the visible faces,
/// culls across chunk borders and is deterministic.
use std::collections::HashSet;

use cgmath::{InnerSpace, Point3, Vector3};
use voxel_world::*;

type FaceCell = (usize, i32, i32, i32);

fn stone(registry: &BlockRegistry) -> BlockId {
    registry.by_name("Stone").expect("default registry has stone")
}

fn side_of(vertex: &ChunkVertex) -> BlockSide {
    let normal = Vector3::from(vertex.normal);
    BlockSide::all()
        .into_iter()
        .find(|side| side.normal() == normal)
        .expect("normals are axis aligned")
}

/// Unit faces covered by the mesh, as (side, block x, block y, block z).
fn covered_faces(vertices: &[ChunkVertex]) -> Vec<FaceCell> {
    assert_eq!(vertices.len() % 6, 0, "quads are emitted as two triangles");
    let mut cells = Vec::new();

    for quad in vertices.chunks(6) {
        let side = side_of(&quad[0]);
        let (normal, u_axis, v_axis) = side.axes();
        let coord = |vertex: &ChunkVertex, axis: usize| vertex.position[axis].round() as i32;

        let (n, u, v) = (normal as usize, u_axis as usize, v_axis as usize);
        let plane = coord(&quad[0], n);
        assert!(quad.iter().all(|vertex| coord(vertex, n) == plane), "quads are planar");

        let u_min = quad.iter().map(|vertex| coord(vertex, u)).min().unwrap();
        let u_max = quad.iter().map(|vertex| coord(vertex, u)).max().unwrap();
        let v_min = quad.iter().map(|vertex| coord(vertex, v)).min().unwrap();
        let v_max = quad.iter().map(|vertex| coord(vertex, v)).max().unwrap();
        let slice = if side.is_positive() { plane - 1 } else { plane };

        for cu in u_min..u_max {
            for cv in v_min..v_max {
                let mut block = [0; 3];
                block[n] = slice;
                block[u] = cu;
                block[v] = cv;
                cells.push((side.index(), block[0], block[1], block[2]));
            }
        }
    }
    cells
}

/// Faces a naive mesher would emit, with unresident neighbours as air.
fn naive_faces(chunk: &Chunk, registry: &BlockRegistry) -> HashSet<FaceCell> {
    let mut faces = HashSet::new();
    for y in 0..CHUNK_HEIGHT {
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                if !registry.is_opaque(chunk.get_block(x, y, z)) {
                    continue;
                }
                for side in BlockSide::all() {
                    let offset = side.offset();
                    let neighbour = chunk.get_block(x + offset.x, y + offset.y, z + offset.z);
                    if !registry.is_opaque(neighbour) {
                        faces.insert((side.index(), x, y, z));
                    }
                }
            }
        }
    }
    faces
}

#[test]
fn test_flat_slab_is_one_top_quad() {
    let registry = BlockRegistry::with_defaults();
    let mut chunk = Chunk::new(Point3::new(0, 0, 0));
    for x in 0..4 {
        for z in 0..4 {
            chunk.set_block(x, 0, z, stone(&registry));
        }
    }

    let vertices = greedy_mesh(&chunk, &EmptyNeighbours, &registry, &MeshingOptions::default());
    let top: Vec<_> = vertices
        .iter()
        .filter(|vertex| side_of(vertex) == BlockSide::TOP)
        .collect();
    assert_eq!(top.len(), 6, "a 4x4 slab should have a single top quad");
    assert!(top.iter().all(|vertex| vertex.position[1] == 1.0));

    let naive = count_visible_faces(&chunk, &EmptyNeighbours, &registry);
    assert_eq!(naive, 16 + 16 + 4 * 4);
    assert!(vertices.len() <= naive * 6);
    assert_eq!(covered_faces(&vertices).len(), naive, "equal covered area");
}

#[test]
fn test_random_chunks_are_covered_exactly() {
    let registry = BlockRegistry::with_defaults();
    let palette = ["Stone", "Dirt", "Grass", "Sand", "Water", "Snow"]
        .map(|name| registry.by_name(name).unwrap());
    let mut rng = fastrand::Rng::with_seed(1337);

    for _ in 0..8 {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        for y in 0..12 {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    if rng.f32() < 0.55 {
                        chunk.set_block(x, y, z, palette[rng.usize(..palette.len())]);
                    }
                }
            }
        }

        let vertices = greedy_mesh(&chunk, &EmptyNeighbours, &registry, &MeshingOptions::default());
        let covered = covered_faces(&vertices);
        let unique: HashSet<_> = covered.iter().copied().collect();
        assert_eq!(unique.len(), covered.len(), "quads must not overlap");
        assert_eq!(unique, naive_faces(&chunk, &registry), "quads must cover exactly the visible faces");
    }
}

#[test]
fn test_windings_face_their_normals() {
    let registry = BlockRegistry::with_defaults();
    let mut chunk = Chunk::new(Point3::new(0, 0, 0));
    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..200 {
        chunk.set_block(rng.i32(0..16), rng.i32(0..8), rng.i32(0..16), stone(&registry));
    }

    let vertices = greedy_mesh(&chunk, &EmptyNeighbours, &registry, &MeshingOptions::default());
    assert!(!vertices.is_empty());
    for triangle in vertices.chunks(3) {
        let normal = voxel_world::engine_state::rendering::meshing::triangle_normal(
            &triangle[0],
            &triangle[1],
            &triangle[2],
        );
        let expected = Vector3::from(triangle[0].normal);
        assert!(normal.dot(expected) > 0.99, "triangle must be counter-clockwise from outside");
    }
}

#[test]
fn test_shared_border_is_culled_once_neighbour_exists() {
    let registry = BlockRegistry::with_defaults();
    let world = World::new();
    let left = Point3::new(0, 0, 0);
    let right = Point3::new(1, 0, 0);
    world.insert_if_absent(left);

    let fill = |position: ChunkPos| {
        let chunk = world.get_chunk_at(position).unwrap();
        let mut chunk = chunk.get_mut();
        for y in 0..CHUNK_HEIGHT {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    chunk.set_block(x, y, z, stone(&registry));
                }
            }
        }
    };
    fill(left);

    let east_faces = |world: &World| {
        let snapshot = world.get_chunk_at(left).unwrap().get().clone();
        greedy_mesh(&snapshot, world, &registry, &MeshingOptions::default())
            .iter()
            .filter(|vertex| side_of(vertex) == BlockSide::EAST)
            .count()
    };

    assert!(east_faces(&world) > 0, "an unresident neighbour reads as air");

    world.insert_if_absent(right);
    fill(right);
    assert_eq!(east_faces(&world), 0, "the shared border must be culled");

    let snapshot = world.get_chunk_at(right).unwrap().get().clone();
    let west_faces = greedy_mesh(&snapshot, &world, &registry, &MeshingOptions::default())
        .iter()
        .filter(|vertex| side_of(vertex) == BlockSide::WEST)
        .count();
    assert_eq!(west_faces, 0, "culling is symmetric");
}

#[test]
fn test_default_seed_chunk_meshes_identically() {
    let registry = BlockRegistry::with_defaults();
    let params = TerrainParams::default();
    assert_eq!(params.seed, 1337);
    assert_eq!(params.water_level, 63);

    let mesh_bytes = || {
        let sampler = SurfaceSampler::new(&params, &registry);
        let column = sampler.sample_column(0, 0);
        assert!((0..CHUNK_HEIGHT).contains(&column.height));

        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.generate(&sampler);
        let vertices = greedy_mesh(&chunk, &EmptyNeighbours, &registry, &MeshingOptions::default());
        assert!(!vertices.is_empty());
        (
            column,
            chunk.blocks().to_vec(),
            bytemuck::cast_slice::<ChunkVertex, u8>(&vertices).to_vec(),
        )
    };

    let (first_column, first_blocks, first_mesh) = mesh_bytes();
    let (second_column, second_blocks, second_mesh) = mesh_bytes();
    assert_eq!(first_column, second_column, "the origin column classifies the same way");
    assert_eq!(first_blocks, second_blocks);
    assert_eq!(first_mesh, second_mesh, "vertex lists must be byte identical");
}

#[test]
fn test_ambient_occlusion_only_when_enabled() {
    let registry = BlockRegistry::with_defaults();
    let sampler = SurfaceSampler::new(&TerrainParams::default(), &registry);
    let mut chunk = Chunk::new(Point3::new(0, 0, 0));
    chunk.generate(&sampler);

    let flat = greedy_mesh(&chunk, &EmptyNeighbours, &registry, &MeshingOptions::default());
    assert!(flat.iter().all(|vertex| vertex.ao == 1.0));

    let options = MeshingOptions {
        ambient_occlusion: true,
    };
    let shaded = greedy_mesh(&chunk, &EmptyNeighbours, &registry, &options);
    assert!(shaded.iter().all(|vertex| (0.5..=1.0).contains(&vertex.ao)));
    assert_eq!(shaded.len(), flat.len(), "occlusion does not change the geometry");
}

#[test]
fn test_vertex_positions_are_chunk_local() {
    let registry = BlockRegistry::with_defaults();
    let mut chunk = Chunk::new(Point3::new(-3, 0, 5));
    chunk.set_block(15, 0, 15, stone(&registry));
    let vertices = greedy_mesh(&chunk, &EmptyNeighbours, &registry, &MeshingOptions::default());
    assert_eq!(vertices.len(), 36);
    for vertex in &vertices {
        let position = vertex.position();
        assert!((0.0..=16.0).contains(&position.x));
        assert!((0.0..=16.0).contains(&position.z));
        assert!((Point3::new(15.5, 0.5, 15.5) - position).magnitude() < 1.0);
    }
}
