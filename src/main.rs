//! # Voxel World Entry Point
//!
//! Calls into the library's `run()` to load the configuration and start the world.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! ```

fn main() {
    voxel_world::run();
}
