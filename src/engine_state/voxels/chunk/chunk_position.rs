//! Conversions between world block coordinates, chunk coordinates and
//! chunk-local offsets.
//!
//! The world is chunked horizontally only: every chunk spans the full height,
//! so the `y` component of a [`ChunkPos`] is always 0. Divisions floor toward
//! negative infinity and offsets use a true modulo, so block `-1` lives at
//! local offset 15 of chunk `-1`, not at offset -1 of chunk 0.

use cgmath::{Point3, Vector3};

use super::{CHUNK_HEIGHT, CHUNK_SIZE};

/// Position of a chunk in chunk-grid units.
pub type ChunkPos = Point3<i32>;

/// Returns the chunk that owns world block `block`.
pub fn chunk_pos_of_block(block: Point3<i32>) -> ChunkPos {
    Point3::new(block.x.div_euclid(CHUNK_SIZE), 0, block.z.div_euclid(CHUNK_SIZE))
}

/// Returns the offset of world block `block` inside its owning chunk.
///
/// `y` passes through unchanged; callers bounds-check it against the chunk height.
pub fn local_of_block(block: Point3<i32>) -> Point3<i32> {
    Point3::new(block.x.rem_euclid(CHUNK_SIZE), block.y, block.z.rem_euclid(CHUNK_SIZE))
}

/// Returns the chunk containing a continuous world position.
pub fn chunk_pos_of_world(position: Point3<f32>) -> ChunkPos {
    chunk_pos_of_block(Point3::new(
        position.x.floor() as i32,
        position.y.floor() as i32,
        position.z.floor() as i32,
    ))
}

/// World block coordinate of a chunk's local (0, 0, 0).
pub fn chunk_origin(chunk: ChunkPos) -> Point3<i32> {
    Point3::new(chunk.x * CHUNK_SIZE, 0, chunk.z * CHUNK_SIZE)
}

/// World-space bounding box `(min, max)` of a chunk.
pub fn chunk_bounds(chunk: ChunkPos) -> (Point3<f32>, Point3<f32>) {
    let origin = chunk_origin(chunk);
    let min = Point3::new(origin.x as f32, origin.y as f32, origin.z as f32);
    let max = min + Vector3::new(CHUNK_SIZE as f32, CHUNK_HEIGHT as f32, CHUNK_SIZE as f32);
    (min, max)
}

/// Chebyshev distance between two chunks over the horizontal axes.
pub fn horizontal_distance(a: ChunkPos, b: ChunkPos) -> i32 {
    (a.x - b.x).abs().max((a.z - b.z).abs())
}

/// The four horizontally adjacent chunk positions.
pub fn horizontal_neighbours(chunk: ChunkPos) -> [ChunkPos; 4] {
    [
        Point3::new(chunk.x + 1, 0, chunk.z),
        Point3::new(chunk.x - 1, 0, chunk.z),
        Point3::new(chunk.x, 0, chunk.z + 1),
        Point3::new(chunk.x, 0, chunk.z - 1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_blocks_floor_into_previous_chunk() {
        assert_eq!(chunk_pos_of_block(Point3::new(-1, 5, -16)), Point3::new(-1, 0, -1));
        assert_eq!(chunk_pos_of_block(Point3::new(-17, 5, 15)), Point3::new(-2, 0, 0));
        assert_eq!(local_of_block(Point3::new(-1, 5, -16)), Point3::new(15, 5, 0));
    }

    #[test]
    fn chunk_and_local_reconstruct_the_block() {
        for x in -40..40 {
            for z in [-33, -16, -15, -1, 0, 1, 15, 16, 31] {
                let block = Point3::new(x, 70, z);
                let chunk = chunk_pos_of_block(block);
                let local = local_of_block(block);
                assert!((0..CHUNK_SIZE).contains(&local.x));
                assert!((0..CHUNK_SIZE).contains(&local.z));
                let origin = chunk_origin(chunk);
                assert_eq!(
                    Point3::new(origin.x + local.x, local.y, origin.z + local.z),
                    block
                );
            }
        }
    }

    #[test]
    fn world_positions_floor() {
        assert_eq!(chunk_pos_of_world(Point3::new(-0.5, 80.0, 15.9)), Point3::new(-1, 0, 0));
        assert_eq!(chunk_pos_of_world(Point3::new(16.0, -3.0, -16.01)), Point3::new(1, 0, -2));
    }

    #[test]
    fn distance_is_chebyshev() {
        let origin = Point3::new(0, 0, 0);
        assert_eq!(horizontal_distance(origin, Point3::new(3, 0, -2)), 3);
        assert_eq!(horizontal_distance(origin, Point3::new(-1, 0, -4)), 4);
    }
}
