//! # Voxel World Headless Driver
//!
//! This is the entry point of the headless binary. It calls into the library's
//! `run()` function, which streams terrain around a walking viewer and logs what
//! the pipeline did.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json] [frames]
//! ```

fn main() {
    if let Err(err) = voxel_world::run() {
        log::error!("{err}");
        eprintln!("voxel-world: {err}");
        std::process::exit(1);
    }
}
