#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A streamed, procedurally generated voxel world with a walking player, built on
//! WGPU and winit.
//!
//! ## Key Modules
//!
//! * `application_state` - Window, graphics bootstrap, input and the event loop
//! * `core` - Shared-state containers and the entity registry
//! * `engine_state` - Chunks, terrain, meshing, rendering, camera and player systems
//!
//! ## Architecture
//!
//! * The world is split into vertical chunk columns kept in a `ChunkStore` and
//!   streamed around the player
//! * Each chunk's visible faces are extracted on the CPU, or by a compute pass
//!   when GPU meshing is selected
//! * Per-frame gameplay runs as an ordered list of frame systems over a small
//!   entity registry
//!
//! ## Configuration
//!
//! `voxel_world.json` in the working directory overrides any default; the world
//! seed can also come from `VOXEL_WORLD_SEED`. Logging follows `RUST_LOG`.
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     voxel_world::run();
//! }
//! ```

use application_state::ApplicationState;
use engine_state::config::EngineConfig;

use winit::event_loop::EventLoop;

pub mod application_state;
pub mod core;
pub mod engine_state;

/// Initializes logging, loads the configuration and runs the event loop until
/// the window closes.
///
/// Exits the process with status 1 when the configuration is invalid or the
/// event loop cannot start.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();
    log::info!("Logger initialized");

    let config = match EngineConfig::load() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid configuration: {err}");
            std::process::exit(1);
        }
    };
    let seed = config.resolve_seed();

    let event_loop = match EventLoop::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Could not create the event loop: {err}");
            std::process::exit(1);
        }
    };

    let mut state = ApplicationState::new(event_loop.create_proxy(), config, seed);

    if let Err(err) = event_loop.run_app(&mut state) {
        log::error!("Event loop stopped: {err}");
    }
}
