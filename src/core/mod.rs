//! # Core Module
//!
//! Single-threaded shared-ownership containers and the entity/component substrate
//! used by the frame systems.
//!
//! ## Key Components
//! - `StResource`: Reference-counted value with interior mutability
//! - `StSystem`: Reference-counted value that can be type-erased and recovered
//! - `StInjectionSystem`: Type-keyed registry of `StSystem`s, used as the scheduler's resource table
//! - `ecs`: Fixed-capacity entity registry with dense per-type component storages
//!
//! ## Usage
//! ```rust
//! use voxel_world::core::{injection_system::StInjectionSystem, StResource};
//!
//! let counter = StResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//!
//! let resources = StInjectionSystem::new();
//! resources.insert(42u32);
//! assert_eq!(*resources.get::<u32>().unwrap().get(), 42);
//! ```
//!
//! Everything in here is `!Send`. The simulation runs on one thread and these
//! containers never cross a thread boundary.

pub mod ecs;
pub mod injection_system;

mod st_resource;
mod st_system;

pub use st_resource::StResource;
pub use st_system::StSystem;
