#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A voxel terrain streaming and meshing pipeline: procedural terrain from layered
//! fractal noise, chunked block storage, greedy meshing with cross-chunk face
//! culling, and a chunk manager that keeps a ring of chunks resident around a
//! moving viewer.
//!
//! ## Key Modules
//!
//! * `core` - Shared-resource primitive used for chunk data
//! * `engine_state` - Voxels, generation, meshing, task scheduling and the chunk manager
//! * `error` - Errors of the fallible edges (loading registries and configs)
//!
//! ## Architecture
//!
//! The crate is graphics-API agnostic. Meshes are plain `#[repr(C)]` vertex lists;
//! uploads and draws go through the [`GraphicsContext`] trait, implemented here only
//! by the CPU-side [`HeadlessGraphics`]. Block metadata comes from an explicitly
//! constructed [`BlockRegistry`] shared by reference counting.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use cgmath::Point3;
//! use voxel_world::{AllVisible, BlockRegistry, ChunkManager, EngineConfig, HeadlessGraphics};
//!
//! let mut config = EngineConfig::default();
//! config.streaming.render_distance = 2;
//!
//! let mut manager = ChunkManager::new(config, Arc::new(BlockRegistry::with_defaults()));
//! let mut graphics = HeadlessGraphics::new();
//! for _ in 0..10 {
//!     manager.update(Point3::new(0.0, 80.0, 0.0), &mut graphics);
//!     manager.render(&AllVisible, &mut graphics);
//! }
//! ```
//!
//! ## Performance Considerations
//!
//! * One byte per block and one dense array per 16x256x16 chunk
//! * Greedy meshing merges coplanar faces of the same block
//! * Generation and meshing run on worker pools, uploads stay on the caller's thread

use std::env;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cgmath::Point3;
use log::{debug, info};

pub mod core;
pub mod engine_state;
pub mod error;

pub use engine_state::chunk_manager::{ChunkManager, RenderStats, StreamingStats};
pub use engine_state::config::{EngineConfig, SchedulingMode, StreamingConfig};
pub use engine_state::rendering::meshing::{count_visible_faces, greedy_mesh, MeshingOptions};
pub use engine_state::rendering::{
    AllVisible, ChunkMesh, ChunkVertex, FrustumCulling, GpuBuffer, GraphicsContext, HeadlessGraphics,
};
pub use engine_state::voxels::block::{BlockDefinition, BlockId, BlockRegistry, BlockSide, UvRect, AIR};
pub use engine_state::voxels::chunk::{Chunk, ChunkPos, ChunkState, CHUNK_HEIGHT, CHUNK_SIZE};
pub use engine_state::voxels::generation::{
    NoiseField, NoiseLayer, SurfaceKind, SurfaceSample, SurfaceSampler, TerrainParams,
};
pub use engine_state::voxels::world::{BlockQuery, EmptyNeighbours, World};
pub use error::{ConfigError, EngineError, RegistryError};

/// Frames driven by the headless binary when none are given.
pub const DEFAULT_FRAMES: u32 = 600;

/// Blocks the headless viewer moves along +X per frame.
const VIEWER_SPEED: f32 = 1.0;

/// Frames allowed after the walk for the pipeline to settle.
const SETTLE_FRAMES: u32 = 10_000;

/// Outcome of a headless run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HeadlessSummary {
    pub frames: u32,
    pub resident: usize,
    pub idle: bool,
    pub last_render: RenderStats,
    pub streaming: StreamingStats,
    pub buffers_created: usize,
    pub draw_calls: usize,
}

/// Streams terrain around a viewer walking along +X, without a window.
///
/// Runs `frames` frames of `update` + `render`, then keeps the viewer still at its
/// final position until the pipeline is idle (bounded by a fixed frame allowance).
/// At least one `update` always runs at the final position.
pub fn run_headless(config: EngineConfig, registry: Arc<BlockRegistry>, frames: u32) -> HeadlessSummary {
    let threaded = config.streaming.scheduling == SchedulingMode::Threaded;
    let mut manager = ChunkManager::new(config, registry);
    let mut graphics = HeadlessGraphics::new();
    let mut viewer = Point3::new(8.0, 100.0, 8.0);

    for frame in 0..frames {
        manager.update(viewer, &mut graphics);
        let rendered = manager.render(&AllVisible, &mut graphics);
        debug!(
            "Frame {frame}: {} resident, {} drawn, viewer at x={:.1}",
            rendered.resident, rendered.drawn, viewer.x
        );
        viewer.x += VIEWER_SPEED;
    }

    let mut settle_frames = 0;
    loop {
        manager.update(viewer, &mut graphics);
        settle_frames += 1;
        if manager.is_idle() || settle_frames >= SETTLE_FRAMES {
            break;
        }
        if threaded {
            thread::sleep(Duration::from_millis(1));
        }
    }
    let last_render = manager.render(&AllVisible, &mut graphics);

    let summary = HeadlessSummary {
        frames: frames + settle_frames,
        resident: manager.chunk_count(),
        idle: manager.is_idle(),
        last_render,
        streaming: manager.stats(),
        buffers_created: graphics.buffers_created,
        draw_calls: graphics.draw_calls,
    };
    info!("{summary:?}");
    summary
}

/// Entry point of the headless binary: `voxel-world [config.json] [frames]`.
pub fn run() -> Result<(), EngineError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let mut args = env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let frames = match args.next() {
        Some(frames) => frames
            .parse()
            .map_err(|_| EngineError::InvalidFrameCount(frames))?,
        None => DEFAULT_FRAMES,
    };

    let registry = Arc::new(BlockRegistry::with_defaults());
    info!("Block registry ready with {} block types", registry.len());

    let summary = run_headless(config, registry, frames);
    info!(
        "Done after {} frames: {} resident chunks, {} drawn, {} uploads, {} evictions",
        summary.frames,
        summary.resident,
        summary.last_render.drawn,
        summary.streaming.meshes_uploaded,
        summary.streaming.chunks_evicted
    );
    Ok(())
}
