//! # Frame Systems
//!
//! The per-frame simulation, split into systems run in a fixed order by the
//! `Scheduler`. Systems share state through a `StInjectionSystem`: each one pulls
//! the resources it needs by type when it runs and holds no references between
//! frames.
//!
//! ## Order
//!
//! 1. `IntentSystem` - controls to movement intent and ground state
//! 2. `PhysicsSystem` - velocities, gravity and swept collision
//! 3. `CameraFollowSystem` - mouse look and following the player's eye
//! 4. `InteractionSystem` - breaking and placing blocks
//!
//! ## Resources
//!
//! | Type | Read by | Written by |
//! |------|---------|------------|
//! | `ControlSnapshot` | all | the engine, once per frame |
//! | `Registry` | all | intent, physics, interaction |
//! | `ChunkStore` | physics | interaction |
//! | `CameraController` | intent, interaction | camera follow |
//! | `Player` | camera follow, interaction | |

use std::any::type_name;

use crate::{
    core::{injection_system::StInjectionSystem, StSystem},
    engine_state::config::EngineConfig,
};

pub mod camera_follow;
pub mod collision;
pub mod components;
pub mod intent;
pub mod interaction;
pub mod physics;
pub mod player;

/// A unit of per-frame work.
pub trait FrameSystem {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the system once.
    ///
    /// # Arguments
    /// * `resources` - Shared state, looked up by type
    /// * `dt` - Seconds since the previous frame
    fn run(&mut self, resources: &StInjectionSystem, dt: f32);
}

/// Looks up a resource, logging when a system runs without it.
fn resource<T: 'static>(resources: &StInjectionSystem, system: &str) -> Option<StSystem<T>> {
    let found = resources.get::<T>();
    if found.is_none() {
        log::warn!("System {system} skipped: no {} resource", type_name::<T>());
    }
    found
}

/// Runs systems in insertion order.
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<Box<dyn FrameSystem>>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// The four gameplay systems in their required order.
    pub fn with_default_systems(config: &EngineConfig) -> Self {
        let mut scheduler = Self::new();
        scheduler.add(intent::IntentSystem);
        scheduler.add(physics::PhysicsSystem::new(&config.physics));
        scheduler.add(camera_follow::CameraFollowSystem);
        scheduler.add(interaction::InteractionSystem::new(config.physics.interaction_distance));
        scheduler
    }

    /// Appends a system; it runs after every system added before it.
    pub fn add<S: FrameSystem + 'static>(&mut self, system: S) {
        log::debug!("Scheduled system {}", system.name());
        self.systems.push(Box::new(system));
    }

    /// Names of the scheduled systems, in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    /// Runs every system once.
    pub fn run(&mut self, resources: &StInjectionSystem, dt: f32) {
        for system in &mut self.systems {
            system.run(resources, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_systems_run_intent_then_physics() {
        let scheduler = Scheduler::with_default_systems(&EngineConfig::default());
        assert_eq!(
            scheduler.names(),
            vec!["intent", "physics", "camera_follow", "interaction"]
        );
    }

    #[test]
    fn missing_resources_skip_the_system() {
        let mut scheduler = Scheduler::with_default_systems(&EngineConfig::default());
        scheduler.run(&StInjectionSystem::new(), 0.016);
    }
}
