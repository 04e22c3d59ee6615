//! # Components
//!
//! Plain data attached to entities in the `core::ecs::Registry`. Systems own the
//! behavior; these types only carry state between them.

use cgmath::{Point3, Vector3, Zero};

use crate::engine_state::{config::MovementDefaults, voxels::aabb::Aabb, voxels::block::Block};

/// World-space position of an entity's collider centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Point3<f32>,
}

/// Linear velocity in blocks per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub linear: Vector3<f32>,
}

impl Default for Velocity {
    fn default() -> Self {
        Self {
            linear: Vector3::zero(),
        }
    }
}

/// Axis-aligned box collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    /// Half size of the box on each axis
    pub half_extents: Vector3<f32>,
    /// World box at the last physics step
    pub aabb: Aabb,
    /// Whether the box rested on a solid block at the last physics step
    pub grounded: bool,
}

impl Collider {
    /// Creates a collider around `center`, not grounded.
    pub fn new(center: Point3<f32>, half_extents: Vector3<f32>) -> Self {
        Self {
            half_extents,
            aabb: Aabb::from_center(center, half_extents),
            grounded: false,
        }
    }

    /// The box this collider would occupy centred on `center`.
    pub fn aabb_at(&self, center: Point3<f32>) -> Aabb {
        Aabb::from_center(center, self.half_extents)
    }
}

/// Per-entity movement tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementConfig {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub crouch_speed: f32,
    pub fly_speed: f32,
    /// Apex height of a jump in blocks
    pub jump_height: f32,
    pub can_jump: bool,
    /// Height of the eye above the collider centre
    pub eye_offset: f32,
}

impl MovementConfig {
    /// Horizontal speed while in `state`.
    ///
    /// Airborne states keep walking speed, or running speed while sprint is held.
    pub fn speed_for(&self, state: MovementState, sprinting: bool) -> f32 {
        match state {
            MovementState::Idle => 0.0,
            MovementState::Walking | MovementState::Swimming => self.walk_speed,
            MovementState::Running => self.run_speed,
            MovementState::Crouching => self.crouch_speed,
            MovementState::Flying => self.fly_speed,
            MovementState::Jumping | MovementState::Falling if sprinting => self.run_speed,
            MovementState::Jumping | MovementState::Falling => self.walk_speed,
        }
    }
}

impl From<&MovementDefaults> for MovementConfig {
    fn from(defaults: &MovementDefaults) -> Self {
        Self {
            walk_speed: defaults.walk_speed,
            run_speed: defaults.run_speed,
            crouch_speed: defaults.crouch_speed,
            fly_speed: defaults.fly_speed,
            jump_height: defaults.jump_height,
            can_jump: true,
            eye_offset: defaults.eye_offset,
        }
    }
}

/// What an entity is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MovementState {
    #[default]
    Idle,
    Walking,
    Running,
    Crouching,
    Jumping,
    Falling,
    Swimming,
    Flying,
}

impl MovementState {
    /// Jumping or falling; physics owns these.
    pub fn is_airborne(self) -> bool {
        matches!(self, MovementState::Jumping | MovementState::Falling)
    }
}

/// Current and previous movement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerState {
    pub current: MovementState,
    pub previous: MovementState,
}

impl PlayerState {
    /// Moves to `state`, remembering the old one.
    ///
    /// # Returns
    /// `true` if the state changed
    pub fn set(&mut self, state: MovementState) -> bool {
        if self.current == state {
            return false;
        }
        self.previous = self.current;
        self.current = state;
        true
    }
}

/// Movement requested this frame, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementIntent {
    /// Unit horizontal direction, or zero
    pub wish: Vector3<f32>,
    pub jump: bool,
    pub sprint: bool,
    pub crouch: bool,
    /// Vertical wish while flying, in `[-1, 1]`
    pub fly_vertical: f32,
}

impl Default for MovementIntent {
    fn default() -> Self {
        Self {
            wish: Vector3::zero(),
            jump: false,
            sprint: false,
            crouch: false,
            fly_vertical: 0.0,
        }
    }
}

/// Rules the player plays under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameMode {
    /// Walks, jumps and collides; cannot fly
    #[default]
    Survival,
    /// May toggle flying
    Creative,
    /// Always flies and passes through blocks
    Spectator,
}

impl GameMode {
    /// Survival, then Creative, then Spectator, then back.
    pub fn next(self) -> GameMode {
        match self {
            GameMode::Survival => GameMode::Creative,
            GameMode::Creative => GameMode::Spectator,
            GameMode::Spectator => GameMode::Survival,
        }
    }
}

/// Player-only settings that are not physics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerControl {
    pub mode: GameMode,
    pub flying: bool,
    /// Material placed by the place control
    pub selected_block: Block,
}

impl Default for PlayerControl {
    fn default() -> Self {
        Self {
            mode: GameMode::default(),
            flying: false,
            selected_block: Block::PLACEABLE[0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_changes_remember_the_previous_state() {
        let mut state = PlayerState::default();
        assert!(!state.set(MovementState::Idle));
        assert!(state.set(MovementState::Walking));
        assert!(state.set(MovementState::Jumping));
        assert_eq!(state.previous, MovementState::Walking);
        assert_eq!(state.current, MovementState::Jumping);
    }

    #[test]
    fn airborne_speed_follows_sprint() {
        let config = MovementConfig::from(&MovementDefaults::default());
        assert_eq!(config.speed_for(MovementState::Idle, true), 0.0);
        assert_eq!(config.speed_for(MovementState::Falling, false), config.walk_speed);
        assert_eq!(config.speed_for(MovementState::Jumping, true), config.run_speed);
    }

    #[test]
    fn modes_cycle() {
        assert_eq!(GameMode::Survival.next().next().next(), GameMode::Survival);
    }
}
