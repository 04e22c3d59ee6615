//! # Player
//!
//! The player is an ordinary entity. `Player` keeps only its handle; every read goes
//! through the registry, so a destroyed player reads as `None` instead of stale data.
//!
//! Which movement states a game mode permits is a pure table, `transition_allowed`.

use cgmath::{Point3, Vector3};

use crate::core::ecs::{Entity, Registry};
use crate::engine_state::{config::MovementDefaults, voxels::aabb::Aabb};

use super::components::{
    Collider, GameMode, MovementConfig, MovementIntent, MovementState, PlayerControl, PlayerState,
    Transform, Velocity,
};

/// Whether `mode` permits `state`.
///
/// Survival cannot fly. Spectator is either idle or flying.
pub fn transition_allowed(mode: GameMode, state: MovementState) -> bool {
    match mode {
        GameMode::Survival => state != MovementState::Flying,
        GameMode::Creative => true,
        GameMode::Spectator => matches!(state, MovementState::Idle | MovementState::Flying),
    }
}

/// Handle to the player entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    entity: Entity,
}

impl Player {
    /// Creates the player entity with every component physics and input need.
    ///
    /// # Arguments
    /// * `registry` - Registry to create the entity in
    /// * `position` - Collider centre at spawn
    /// * `movement` - Speeds, jump height and box size
    ///
    /// # Returns
    /// `None` if the registry is full
    pub fn spawn(registry: &mut Registry, position: Point3<f32>, movement: &MovementDefaults) -> Option<Self> {
        let entity = registry.create_entity()?;
        let [hx, hy, hz] = movement.half_extents;

        registry.add_component(entity, Transform { position });
        registry.add_component(entity, Velocity::default());
        registry.add_component(entity, Collider::new(position, Vector3::new(hx, hy, hz)));
        registry.add_component(entity, MovementConfig::from(movement));
        registry.add_component(entity, PlayerState::default());
        registry.add_component(entity, MovementIntent::default());
        registry.add_component(entity, PlayerControl::default());

        log::info!("Spawned player at {:?}", position);
        Some(Self { entity })
    }

    /// Wraps an existing entity.
    pub fn from_entity(entity: Entity) -> Self {
        Self { entity }
    }

    /// The player's entity handle.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Collider centre.
    pub fn position(&self, registry: &Registry) -> Option<Point3<f32>> {
        registry.get::<Transform>(self.entity).map(|transform| transform.position)
    }

    /// Eye position, above the collider centre.
    pub fn eye_position(&self, registry: &Registry) -> Option<Point3<f32>> {
        let position = self.position(registry)?;
        let eye_offset = registry.get::<MovementConfig>(self.entity)?.eye_offset;
        Some(position + Vector3::new(0.0, eye_offset, 0.0))
    }

    /// The world box at the last physics step.
    pub fn aabb(&self, registry: &Registry) -> Option<Aabb> {
        registry.get::<Collider>(self.entity).map(|collider| collider.aabb)
    }

    /// Current movement state.
    pub fn state(&self, registry: &Registry) -> Option<MovementState> {
        registry.get::<PlayerState>(self.entity).map(|state| state.current)
    }

    /// Current game mode.
    pub fn mode(&self, registry: &Registry) -> Option<GameMode> {
        registry.get::<PlayerControl>(self.entity).map(|control| control.mode)
    }

    /// Moves the player, resetting velocity.
    ///
    /// # Returns
    /// `false` if the player entity is gone
    pub fn teleport(&self, registry: &Registry, position: Point3<f32>) -> bool {
        let (Some(mut transform), Some(mut velocity), Some(mut collider)) = (
            registry.get_mut::<Transform>(self.entity),
            registry.get_mut::<Velocity>(self.entity),
            registry.get_mut::<Collider>(self.entity),
        ) else {
            return false;
        };
        transform.position = position;
        *velocity = Velocity::default();
        collider.aabb = collider.aabb_at(position);
        collider.grounded = false;
        true
    }

    /// Switches game mode and moves the player into a state the mode permits.
    ///
    /// # Returns
    /// `false` if the player entity is gone
    pub fn set_mode(&self, registry: &Registry, mode: GameMode) -> bool {
        let (Some(mut control), Some(mut state)) = (
            registry.get_mut::<PlayerControl>(self.entity),
            registry.get_mut::<PlayerState>(self.entity),
        ) else {
            return false;
        };

        control.mode = mode;
        control.flying = match mode {
            GameMode::Survival => false,
            GameMode::Creative => control.flying,
            GameMode::Spectator => true,
        };

        let wanted = if control.flying {
            MovementState::Flying
        } else if state.current == MovementState::Flying {
            MovementState::Falling
        } else {
            state.current
        };
        if transition_allowed(mode, wanted) {
            state.set(wanted);
        } else {
            state.set(MovementState::Idle);
        }

        log::info!("Game mode is now {:?}", mode);
        true
    }

    /// Starts or stops flying, where the mode allows it.
    ///
    /// # Returns
    /// Whether the player is flying afterwards
    pub fn toggle_flying(&self, registry: &Registry) -> bool {
        let (Some(mut control), Some(mut state)) = (
            registry.get_mut::<PlayerControl>(self.entity),
            registry.get_mut::<PlayerState>(self.entity),
        ) else {
            return false;
        };

        if control.mode != GameMode::Creative {
            return control.flying;
        }

        control.flying = !control.flying;
        if control.flying {
            state.set(MovementState::Flying);
        } else {
            state.set(MovementState::Falling);
        }
        control.flying
    }
}
