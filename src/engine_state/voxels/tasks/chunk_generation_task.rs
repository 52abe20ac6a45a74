//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which fills a resident chunk with
//! terrain. It is scheduled when a chunk enters the residency radius and again for
//! every chunk when the terrain is reloaded.

use std::sync::Arc;

use log::trace;
use web_time::Instant;

use crate::engine_state::{
    rendering::tasks::{ChunkMeshGenerationTask, MeshingContext},
    task_management::{Task, TaskQueue},
    voxels::{
        chunk::{chunk_position::horizontal_neighbours, ChunkPos},
        generation::SurfaceSampler,
        world::World,
    },
};

/// A task that generates chunk data on a worker thread.
///
/// This task is responsible for:
/// 1. Looking the chunk up again and dropping the work if it was evicted
/// 2. Generating the chunk under its write lock with the sampler it was given
/// 3. Marking already generated neighbours dirty so their border faces get rebuilt
/// 4. Scheduling mesh generation for the chunk
pub struct ChunkGenerationTask {
    world: World,
    /// Sampler snapshot taken when the task was published
    sampler: Arc<SurfaceSampler>,
    meshing: Arc<MeshingContext>,
    mesh_queue: Arc<TaskQueue<ChunkMeshGenerationTask>>,
    /// The position of the chunk to generate (in chunk coordinates)
    position: ChunkPos,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `world` - The shared chunk map
    /// * `sampler` - Terrain to generate with; later terrain rebuilds do not affect it
    /// * `meshing` - Context for the follow-up meshing task
    /// * `mesh_queue` - Where the follow-up meshing task is published
    /// * `position` - The chunk coordinates of the chunk to generate
    pub fn new(
        world: World,
        sampler: Arc<SurfaceSampler>,
        meshing: Arc<MeshingContext>,
        mesh_queue: Arc<TaskQueue<ChunkMeshGenerationTask>>,
        position: ChunkPos,
    ) -> Self {
        ChunkGenerationTask {
            world,
            sampler,
            meshing,
            mesh_queue,
            position,
        }
    }
}

impl Task for ChunkGenerationTask {
    fn process(self) {
        let Some(chunk) = self.world.get_chunk_at(self.position) else {
            trace!("Chunk {:?} was evicted before generation", self.position);
            return;
        };

        let start = Instant::now();
        chunk.get_mut().generate(&self.sampler);
        trace!("Generated chunk {:?} in {:?}", self.position, start.elapsed());

        for neighbour in horizontal_neighbours(self.position) {
            if let Some(neighbour) = self.world.get_chunk_at(neighbour) {
                let mut neighbour = neighbour.get_mut();
                if neighbour.is_generated() {
                    neighbour.mark_dirty();
                }
            }
        }

        let queue_mesh = {
            let mut chunk = chunk.get_mut();
            let needs_mesh = chunk.needs_mesh();
            if needs_mesh {
                chunk.set_mesh_queued(true);
            }
            needs_mesh
        };
        if queue_mesh {
            self.mesh_queue
                .push(ChunkMeshGenerationTask::new(self.meshing.clone(), self.position));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::meshing::MeshingOptions;
    use crate::engine_state::voxels::{
        block::BlockRegistry, chunk::ChunkState, generation::TerrainParams,
    };
    use cgmath::Point3;

    struct Fixture {
        world: World,
        sampler: Arc<SurfaceSampler>,
        meshing: Arc<MeshingContext>,
        mesh_queue: Arc<TaskQueue<ChunkMeshGenerationTask>>,
    }

    impl Fixture {
        fn new() -> Self {
            let world = World::new();
            let registry = Arc::new(BlockRegistry::with_defaults());
            let sampler = Arc::new(SurfaceSampler::new(&TerrainParams::default(), &registry));
            let meshing = Arc::new(MeshingContext {
                world: world.clone(),
                registry,
                options: MeshingOptions::default(),
                uploads: Arc::new(TaskQueue::new()),
            });
            Fixture {
                world,
                sampler,
                meshing,
                mesh_queue: Arc::new(TaskQueue::new()),
            }
        }

        fn task(&self, position: ChunkPos) -> ChunkGenerationTask {
            ChunkGenerationTask::new(
                self.world.clone(),
                self.sampler.clone(),
                self.meshing.clone(),
                self.mesh_queue.clone(),
                position,
            )
        }
    }

    #[test]
    fn evicted_chunks_are_not_resurrected() {
        let fixture = Fixture::new();
        fixture.task(Point3::new(3, 0, 3)).process();
        assert!(fixture.world.get_chunk_at(Point3::new(3, 0, 3)).is_none());
        assert!(fixture.mesh_queue.is_empty());
    }

    #[test]
    fn generation_queues_one_mesh() {
        let fixture = Fixture::new();
        fixture.world.insert_if_absent(Point3::new(0, 0, 0));
        fixture.task(Point3::new(0, 0, 0)).process();

        let chunk = fixture.world.get_chunk_at(Point3::new(0, 0, 0)).unwrap();
        assert_eq!(chunk.get().state(), ChunkState::Generated);
        assert!(chunk.get().is_mesh_queued());
        assert_eq!(fixture.mesh_queue.len(), 1);
    }

    #[test]
    fn generated_neighbours_are_marked_dirty() {
        let fixture = Fixture::new();
        let (left, right, far) = (Point3::new(0, 0, 0), Point3::new(1, 0, 0), Point3::new(5, 0, 0));
        for position in [left, right, far] {
            fixture.world.insert_if_absent(position);
        }
        fixture.task(left).process();
        fixture.task(far).process();

        let left_chunk = fixture.world.get_chunk_at(left).unwrap();
        let before = left_chunk.get().revision();
        fixture.task(right).process();
        assert!(left_chunk.get().revision() > before, "left border must be rebuilt");
    }
}
