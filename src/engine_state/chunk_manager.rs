//! # Chunk Manager
//!
//! Owns chunk residency around a moving viewer, drives generation and meshing,
//! and performs every GPU upload on the thread that calls [`ChunkManager::update`].
//!
//! ## Pipeline
//!
//! Each resident chunk moves through `Loading -> Generated -> MeshReady -> Resident`
//! and can be evicted from any state:
//!
//! 1. `update` inserts missing chunks inside the render distance (closest first)
//!    and publishes a generation task for each
//! 2. Generation fills the chunk, dirties generated neighbours, queues meshing
//! 3. Meshing snapshots the chunk and queues a [`MeshUpload`]
//! 4. `update` drains up to `max_uploads_per_frame` uploads into [`ChunkMesh`]es
//!
//! Every `update` also scans for generated chunks whose mesh is stale (edits,
//! neighbour arrivals) and queues them for meshing again.
//!
//! ## Residency
//!
//! Distances are Chebyshev over the horizontal chunk axes. A chunk loads at
//! distance `<= render_distance` and is evicted at `> render_distance +
//! unload_margin`, so a viewer pacing back and forth over a chunk border does not
//! reload the same ring every frame.
//!
//! ## Threading
//!
//! In threaded mode generation and meshing run on their own worker pools; in inline
//! mode `update` runs them itself under per-frame budgets. GPU meshes are kept in a
//! map only this struct touches, so buffers are created and released on the
//! caller's thread in both modes.

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Point3;
use log::{debug, info, trace};

use super::config::{EngineConfig, SchedulingMode, StreamingConfig};
use super::rendering::{
    gpu::{ChunkMesh, FrustumCulling, GraphicsContext},
    tasks::{ChunkMeshGenerationTask, MeshUpload, MeshingContext},
};
use super::task_management::{resolve_worker_count, TaskManager, TaskQueue};
use super::voxels::{
    block::{BlockId, BlockRegistry},
    chunk::{
        chunk_position::{
            chunk_bounds, chunk_pos_of_block, chunk_pos_of_world, horizontal_distance,
            local_of_block,
        },
        ChunkPos, ChunkState, CHUNK_SIZE,
    },
    generation::{SurfaceSampler, TerrainParams},
    tasks::ChunkGenerationTask,
    world::World,
};

/// What one call to [`ChunkManager::render`] did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Chunks in the resident map
    pub resident: usize,
    /// Uploaded meshes with at least one vertex
    pub with_geometry: usize,
    /// Meshes drawn
    pub drawn: usize,
    /// Meshes skipped by the frustum test
    pub culled: usize,
}

/// Running totals since the manager was created.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    pub chunks_loaded: u64,
    pub chunks_evicted: u64,
    pub generations_queued: u64,
    pub meshes_queued: u64,
    pub meshes_uploaded: u64,
    /// Uploads dropped because the chunk was gone or a newer mesh was already in place
    pub stale_uploads: u64,
}

/// Streams chunks around a viewer and keeps their meshes up to date.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cgmath::Point3;
/// use voxel_world::{
///     AllVisible, BlockRegistry, ChunkManager, EngineConfig, HeadlessGraphics, SchedulingMode,
/// };
///
/// let mut config = EngineConfig::default();
/// config.streaming.render_distance = 1;
/// config.streaming.scheduling = SchedulingMode::Inline;
///
/// let mut manager = ChunkManager::new(config, Arc::new(BlockRegistry::with_defaults()));
/// let mut graphics = HeadlessGraphics::new();
///
/// while !manager.is_idle() {
///     manager.update(Point3::new(8.0, 80.0, 8.0), &mut graphics);
/// }
/// assert_eq!(manager.chunk_count(), 9);
///
/// let stats = manager.render(&AllVisible, &mut graphics);
/// assert_eq!(stats.drawn, stats.with_geometry);
/// ```
pub struct ChunkManager {
    config: StreamingConfig,
    registry: Arc<BlockRegistry>,
    terrain: TerrainParams,
    sampler: Arc<SurfaceSampler>,
    world: World,
    meshing: Arc<MeshingContext>,
    generation_tasks: TaskManager<ChunkGenerationTask>,
    mesh_tasks: TaskManager<ChunkMeshGenerationTask>,
    meshes: HashMap<ChunkPos, ChunkMesh>,
    center: Option<ChunkPos>,
    stats: StreamingStats,
}

impl ChunkManager {
    /// Creates a manager with no resident chunks.
    ///
    /// # Arguments
    /// * `config` - Streaming, meshing and terrain settings
    /// * `registry` - Fully populated block registry shared with every worker
    ///
    /// # Returns
    /// A manager whose worker pools (threaded mode) are already running
    pub fn new(config: EngineConfig, registry: Arc<BlockRegistry>) -> Self {
        let EngineConfig {
            streaming,
            meshing,
            terrain,
        } = config;

        let (generation_workers, meshing_workers) = match streaming.scheduling {
            SchedulingMode::Inline => (0, 0),
            SchedulingMode::Threaded => (
                resolve_worker_count(streaming.generation_workers, 0.5),
                resolve_worker_count(streaming.meshing_workers, 0.5),
            ),
        };

        let world = World::new();
        let sampler = Arc::new(SurfaceSampler::new(&terrain, &registry));
        let meshing = Arc::new(MeshingContext {
            world: world.clone(),
            registry: registry.clone(),
            options: meshing,
            uploads: Arc::new(TaskQueue::new()),
        });

        info!(
            "Chunk manager: {:?} scheduling, render distance {}, unload distance {}",
            streaming.scheduling,
            streaming.render_distance,
            streaming.unload_distance()
        );

        ChunkManager {
            generation_tasks: TaskManager::new("generation", generation_workers),
            mesh_tasks: TaskManager::new("meshing", meshing_workers),
            config: streaming,
            registry,
            terrain,
            sampler,
            world,
            meshing,
            meshes: HashMap::new(),
            center: None,
            stats: StreamingStats::default(),
        }
    }

    /// Advances streaming for one frame.
    ///
    /// Loads and evicts chunks around `viewer`, requeues stale meshes, runs the
    /// inline budgets (inline mode only) and uploads finished meshes through
    /// `graphics`. Safe to call every frame; with an unchanged viewer the resident
    /// set does not change after the first call.
    pub fn update(&mut self, viewer: Point3<f32>, graphics: &mut dyn GraphicsContext) {
        let center = chunk_pos_of_world(viewer);
        if self.center != Some(center) {
            debug!("Viewer entered chunk ({}, {})", center.x, center.z);
            self.center = Some(center);
        }

        self.load_around(center);
        self.evict_around(center);
        self.queue_stale_meshes();

        self.generation_tasks
            .process_queued_tasks(self.config.max_generations_per_frame);
        self.mesh_tasks
            .process_queued_tasks(self.config.max_meshes_per_frame);

        self.process_uploads(graphics);
    }

    fn load_around(&mut self, center: ChunkPos) {
        let radius = self.config.render_distance.max(0);
        let mut wanted: Vec<ChunkPos> = (-radius..=radius)
            .flat_map(|dx| (-radius..=radius).map(move |dz| Point3::new(center.x + dx, 0, center.z + dz)))
            .collect();
        wanted.sort_by_key(|position| {
            let (dx, dz) = (position.x - center.x, position.z - center.z);
            dx * dx + dz * dz
        });

        let inserted = self.world.insert_missing(wanted);
        if inserted.is_empty() {
            return;
        }
        info!(
            "Loading {} chunk(s) around ({}, {})",
            inserted.len(),
            center.x,
            center.z
        );
        self.stats.chunks_loaded += inserted.len() as u64;
        for position in inserted {
            self.publish_generation(position);
        }
    }

    fn evict_around(&mut self, center: ChunkPos) {
        let removed = self
            .world
            .remove_outside(center, self.config.unload_distance());
        if removed.is_empty() {
            return;
        }
        for position in &removed {
            // Releases the GPU buffer here, on the graphics thread.
            self.meshes.remove(position);
        }
        info!("Evicted {} chunk(s)", removed.len());
        self.stats.chunks_evicted += removed.len() as u64;
    }

    fn queue_stale_meshes(&mut self) {
        for (position, chunk) in self.world.chunks() {
            // Locked chunks are busy; they are picked up on a later frame.
            let Some(mut guard) = chunk.try_get_mut() else {
                continue;
            };
            if !guard.needs_mesh() {
                continue;
            }
            guard.set_mesh_queued(true);
            drop(guard);
            self.publish_mesh(position);
        }
    }

    fn publish_generation(&mut self, position: ChunkPos) {
        let task = ChunkGenerationTask::new(
            self.world.clone(),
            self.sampler.clone(),
            self.meshing.clone(),
            self.mesh_tasks.queue(),
            position,
        );
        if self.generation_tasks.publish_task(task) {
            self.stats.generations_queued += 1;
        }
    }

    fn publish_mesh(&mut self, position: ChunkPos) {
        let task = ChunkMeshGenerationTask::new(self.meshing.clone(), position);
        if self.mesh_tasks.publish_task(task) {
            self.stats.meshes_queued += 1;
        }
    }

    fn process_uploads(&mut self, graphics: &mut dyn GraphicsContext) {
        let uploads = self.meshing.uploads.clone();
        for _ in 0..self.config.max_uploads_per_frame.max(1) {
            let Some(upload) = uploads.try_pop() else {
                break;
            };
            self.apply_upload(upload, graphics);
            uploads.complete();
        }
    }

    fn apply_upload(&mut self, upload: MeshUpload, graphics: &mut dyn GraphicsContext) {
        let Some(chunk) = self.world.get_chunk_at(upload.position) else {
            trace!("Dropping mesh of evicted chunk {:?}", upload.position);
            self.stats.stale_uploads += 1;
            return;
        };

        let mut chunk = chunk.get_mut();
        if chunk.instance() != upload.instance {
            trace!(
                "Dropping mesh of a previous instance of chunk {:?}",
                upload.position
            );
            self.stats.stale_uploads += 1;
            return;
        }
        if !chunk.is_generated() || !chunk.mark_meshed(upload.revision) {
            trace!(
                "Dropping stale mesh of chunk {:?} (revision {})",
                upload.position,
                upload.revision
            );
            self.stats.stale_uploads += 1;
            return;
        }

        self.meshes
            .entry(upload.position)
            .or_default()
            .upload(graphics, &upload.vertices);
        chunk.set_state(ChunkState::Resident);
        self.stats.meshes_uploaded += 1;
    }

    /// Draws every resident mesh with geometry whose bounds pass `culling`.
    ///
    /// # Arguments
    /// * `culling` - Frustum test over each chunk's world-space box
    ///   `origin .. origin + (16, 256, 16)`
    /// * `graphics` - Receives one draw per visible mesh
    pub fn render(&self, culling: &dyn FrustumCulling, graphics: &mut dyn GraphicsContext) -> RenderStats {
        let mut stats = RenderStats {
            resident: self.world.len(),
            ..RenderStats::default()
        };

        for (&position, mesh) in &self.meshes {
            if !mesh.has_geometry() {
                continue;
            }
            stats.with_geometry += 1;

            let (min, max) = chunk_bounds(position);
            if !culling.contains_bounding_box(min, max) {
                stats.culled += 1;
                continue;
            }
            if mesh.draw(graphics, min) {
                stats.drawn += 1;
            }
        }

        stats
    }

    /// Returns the block at world coordinate (x, y, z), air when not resident.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.world.get_block(Point3::new(x, y, z))
    }

    /// Point form of [`ChunkManager::get_block`].
    pub fn get_block_at(&self, position: Point3<i32>) -> BlockId {
        self.world.get_block(position)
    }

    /// Writes the block at world coordinate (x, y, z).
    ///
    /// Only generated chunks accept edits. An edit on a chunk border also marks the
    /// chunk across that border dirty so both sides are remeshed.
    ///
    /// # Returns
    /// `true` when the stored block changed.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        let block = Point3::new(x, y, z);
        let position = chunk_pos_of_block(block);
        let Some(chunk) = self.world.get_chunk_at(position) else {
            return false;
        };

        let local = local_of_block(block);
        let changed = {
            let mut chunk = chunk.get_mut();
            chunk.is_generated() && chunk.set_block(local.x, local.y, local.z, id)
        };
        if !changed {
            return false;
        }

        for neighbour in border_neighbours(position, local) {
            if let Some(neighbour) = self.world.get_chunk_at(neighbour) {
                let mut neighbour = neighbour.get_mut();
                if neighbour.is_generated() {
                    neighbour.mark_dirty();
                }
            }
        }
        true
    }

    /// Highest solid block in world column (x, z), if its chunk is resident.
    pub fn highest_solid_y_at(&self, x: i32, z: i32) -> Option<i32> {
        let block = Point3::new(x, 0, z);
        let chunk = self.world.get_chunk_at(chunk_pos_of_block(block))?;
        let local = local_of_block(block);
        let height = chunk.get().highest_solid_y(local.x, local.z, &self.registry);
        height
    }

    /// Terrain parameters the next [`ChunkManager::rebuild_terrain`] will use.
    pub fn terrain_params(&self) -> &TerrainParams {
        &self.terrain
    }

    /// Mutable terrain parameters.
    ///
    /// Edits take effect after [`ChunkManager::rebuild_terrain`] followed by
    /// [`ChunkManager::reload_all_chunks`].
    pub fn terrain_params_mut(&mut self) -> &mut TerrainParams {
        &mut self.terrain
    }

    /// Rebuilds the noise field and surface sampler from the current parameters.
    ///
    /// Generation tasks already published keep the sampler they were given, so
    /// each generated chunk sees one consistent parameter set.
    pub fn rebuild_terrain(&mut self) {
        self.sampler = Arc::new(SurfaceSampler::new(&self.terrain, &self.registry));
        info!("Rebuilt terrain with seed {}", self.terrain.seed);
    }

    /// Regenerates and remeshes every resident chunk in place.
    ///
    /// The resident set is unchanged; queued generations are replaced by fresh
    /// ones using the current sampler. Old meshes stay drawable until their
    /// replacements are uploaded.
    pub fn reload_all_chunks(&mut self) {
        let replaced = self.generation_tasks.clear_queued();

        let center = self.center.unwrap_or_else(|| Point3::new(0, 0, 0));
        let mut chunks = self.world.chunks();
        chunks.sort_by_key(|(position, _)| (horizontal_distance(*position, center), position.x, position.z));

        for (position, chunk) in &chunks {
            chunk.get_mut().set_state(ChunkState::Loading);
            self.publish_generation(*position);
        }
        info!(
            "Reloading {} chunk(s), replaced {} queued generation(s)",
            chunks.len(),
            replaced
        );
    }

    /// Positions of all resident chunks, ordered by x then z.
    pub fn resident_positions(&self) -> Vec<ChunkPos> {
        let mut positions = self.world.positions();
        positions.sort_by_key(|position| (position.x, position.z));
        positions
    }

    /// Pipeline state of the chunk at `position`, `None` when not resident.
    pub fn chunk_state(&self, position: ChunkPos) -> Option<ChunkState> {
        let chunk = self.world.get_chunk_at(position)?;
        let state = chunk.get().state();
        Some(state)
    }

    /// Number of resident chunks.
    pub fn chunk_count(&self) -> usize {
        self.world.len()
    }

    /// True when no work is queued or running and every resident chunk is
    /// generated with an up-to-date mesh.
    pub fn is_idle(&self) -> bool {
        if self.generation_tasks.pending() > 0
            || self.mesh_tasks.pending() > 0
            || self.meshing.uploads.pending() > 0
        {
            return false;
        }
        self.world.chunks().iter().all(|(_, chunk)| {
            let chunk = chunk.get();
            chunk.is_generated() && !chunk.is_dirty()
        })
    }

    /// Running totals since creation.
    pub fn stats(&self) -> StreamingStats {
        self.stats
    }

    /// Vertex count of the uploaded mesh at `position`.
    pub fn mesh_vertex_count(&self, position: ChunkPos) -> Option<u32> {
        self.meshes.get(&position).map(ChunkMesh::vertex_count)
    }

    /// Shared handle to the resident chunk map.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn streaming_config(&self) -> &StreamingConfig {
        &self.config
    }
}

impl Drop for ChunkManager {
    fn drop(&mut self) {
        // Workers first: nothing may still be generating or meshing when the
        // meshes and chunks go.
        self.generation_tasks.shutdown();
        self.mesh_tasks.shutdown();
        self.meshing.uploads.shutdown();
        self.meshing.uploads.clear();
        self.meshes.clear();
        info!("Chunk manager shut down");
    }
}

/// Chunks sharing a face with the block at `local` of chunk `position`.
fn border_neighbours(position: ChunkPos, local: Point3<i32>) -> Vec<ChunkPos> {
    let mut neighbours = Vec::new();
    if local.x == 0 {
        neighbours.push(Point3::new(position.x - 1, 0, position.z));
    }
    if local.x == CHUNK_SIZE - 1 {
        neighbours.push(Point3::new(position.x + 1, 0, position.z));
    }
    if local.z == 0 {
        neighbours.push(Point3::new(position.x, 0, position.z - 1));
    }
    if local.z == CHUNK_SIZE - 1 {
        neighbours.push(Point3::new(position.x, 0, position.z + 1));
    }
    neighbours
}
