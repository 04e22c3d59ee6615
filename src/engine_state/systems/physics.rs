//! # Physics
//!
//! Kinematic movement for box colliders against the voxel world.
//!
//! Horizontal velocity is set straight from the movement intent every step; only
//! vertical velocity accumulates (gravity, jumps). Motion is resolved one axis at a
//! time, Y first, then X, then Z, each axis starting from where the previous one
//! ended. Resolving Y first keeps boxes from catching on the top edge of a step.
//!
//! Each axis forms a candidate position that changes only that axis. If the box at
//! the candidate overlaps a solid block, the axis keeps the value it had when the
//! step began and its velocity component is zeroed; otherwise the candidate is
//! committed. A blocked downward move grounds the body, a blocked upward one does
//! not.
//!
//! The candidates are taken in sub-steps no longer than `max_step` on any axis, so
//! a fast box cannot tunnel through a one block wall. A blocked sub-step rolls its
//! axis back to the step's starting value and the axis stays put for the rest of
//! the step.

use cgmath::{InnerSpace, Point3};

use crate::{
    core::{
        ecs::{Entity, Registry},
        injection_system::StInjectionSystem,
    },
    engine_state::{
        config::PhysicsConfig,
        voxels::{block::Block, world::ChunkStore},
    },
};

use super::{
    collision::{collides, probe_ground},
    components::{
        Collider, GameMode, MovementConfig, MovementIntent, MovementState, PlayerControl, PlayerState,
        Transform, Velocity,
    },
    intent::IDLE_THRESHOLD,
    player::transition_allowed,
    resource, FrameSystem,
};

/// Axes in resolution order.
const SWEEP_ORDER: [usize; 3] = [1, 0, 2];

/// Everything physics reads and writes for one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub transform: Transform,
    pub velocity: Velocity,
    pub collider: Collider,
    pub state: PlayerState,
    pub intent: MovementIntent,
    pub movement: MovementConfig,
    pub mode: GameMode,
    pub flying: bool,
}

impl Body {
    /// Copies an entity's components out of the registry.
    ///
    /// Entities without `PlayerControl` are treated as walking survival bodies.
    pub fn read(registry: &Registry, entity: Entity) -> Option<Self> {
        let control = registry.get::<PlayerControl>(entity).map(|control| *control).unwrap_or_default();
        Some(Self {
            transform: *registry.get::<Transform>(entity)?,
            velocity: *registry.get::<Velocity>(entity)?,
            collider: *registry.get::<Collider>(entity)?,
            state: *registry.get::<PlayerState>(entity)?,
            intent: registry.get::<MovementIntent>(entity).map(|intent| *intent).unwrap_or_default(),
            movement: *registry.get::<MovementConfig>(entity)?,
            mode: control.mode,
            flying: control.flying,
        })
    }

    /// Writes the components physics changes back.
    pub fn write(&self, registry: &Registry, entity: Entity) {
        if let Some(mut transform) = registry.get_mut::<Transform>(entity) {
            *transform = self.transform;
        }
        if let Some(mut velocity) = registry.get_mut::<Velocity>(entity) {
            *velocity = self.velocity;
        }
        if let Some(mut collider) = registry.get_mut::<Collider>(entity) {
            *collider = self.collider;
        }
        if let Some(mut state) = registry.get_mut::<PlayerState>(entity) {
            *state = self.state;
        }
    }
}

/// Advances one body by `dt` seconds.
///
/// # Arguments
/// * `store` - The loaded world
/// * `config` - Gravity, probe distance and step limits
/// * `body` - The body to move
/// * `dt` - Time step in seconds
pub fn step(store: &ChunkStore, config: &PhysicsConfig, body: &mut Body, dt: f32) {
    let flying = body.flying || body.state.current == MovementState::Flying;
    let speed = body.movement.speed_for(body.state.current, body.intent.sprint);
    let velocity = &mut body.velocity.linear;
    velocity.x = body.intent.wish.x * speed;
    velocity.z = body.intent.wish.z * speed;

    if flying {
        velocity.y = body.intent.fly_vertical * body.movement.fly_speed;
    } else if body.collider.grounded && body.intent.jump && body.movement.can_jump {
        velocity.y = (2.0 * config.gravity * body.movement.jump_height).sqrt();
        body.state.set(MovementState::Jumping);
        body.collider.grounded = false;
    }

    if !body.collider.grounded && !flying {
        velocity.y -= config.gravity * dt;
    }

    if body.state.current == MovementState::Jumping && velocity.y <= 0.0 {
        body.state.set(MovementState::Falling);
    }

    if body.mode == GameMode::Spectator {
        body.transform.position += body.velocity.linear * dt;
        body.collider.aabb = body.collider.aabb_at(body.transform.position);
        body.collider.grounded = false;
        return;
    }

    if body.velocity.linear.magnitude2() <= config.velocity_epsilon * config.velocity_epsilon {
        body.collider.aabb = body.collider.aabb_at(body.transform.position);
        body.collider.grounded = probe_ground(store, &body.collider.aabb, config.ground_probe);
        settle_state(store, body, flying);
        return;
    }

    let landed = sweep(store, config, body, dt);
    body.collider.aabb = body.collider.aabb_at(body.transform.position);
    body.collider.grounded = landed || probe_ground(store, &body.collider.aabb, config.ground_probe);
    settle_state(store, body, flying);
}

/// Moves the body through its sub-steps.
///
/// # Returns
/// `true` if downward motion was blocked
fn sweep(store: &ChunkStore, config: &PhysicsConfig, body: &mut Body, dt: f32) -> bool {
    let displacement = body.velocity.linear * dt;
    let longest = displacement.x.abs().max(displacement.y.abs()).max(displacement.z.abs());
    let steps = (longest / config.max_step).ceil().max(1.0) as u32;
    let sub_dt = dt / steps as f32;

    let start = body.transform.position;
    let mut landed = false;
    for _ in 0..steps {
        for axis in SWEEP_ORDER {
            let delta = body.velocity.linear[axis] * sub_dt;
            if delta == 0.0 {
                continue;
            }
            if !move_axis(store, &body.collider, &mut body.transform.position, axis, delta) {
                revert_axis(store, &body.collider, &mut body.transform.position, axis, start[axis]);
                body.velocity.linear[axis] = 0.0;
                if axis == 1 && delta < 0.0 {
                    landed = true;
                }
            }
        }
    }
    landed
}

/// Moves `position` by `delta` along one axis.
///
/// # Returns
/// `false`, leaving `position` untouched, if the box at the candidate overlaps a
/// solid block
fn move_axis(store: &ChunkStore, collider: &Collider, position: &mut Point3<f32>, axis: usize, delta: f32) -> bool {
    let mut candidate = *position;
    candidate[axis] += delta;
    if collides(store, &collider.aabb_at(candidate)) {
        return false;
    }
    *position = candidate;
    true
}

/// Puts one axis back to its value at the start of the step.
///
/// The other axes may have moved since then; if the box would overlap a block
/// there the axis stays where the blocked sub-step left it.
fn revert_axis(store: &ChunkStore, collider: &Collider, position: &mut Point3<f32>, axis: usize, old: f32) {
    let mut reverted = *position;
    reverted[axis] = old;
    if !collides(store, &collider.aabb_at(reverted)) {
        *position = reverted;
    }
}

/// Applies the state changes collision outcomes imply.
fn settle_state(store: &ChunkStore, body: &mut Body, flying: bool) {
    if flying {
        return;
    }

    let moving = body.intent.wish.magnitude() >= IDLE_THRESHOLD;
    let current = body.state.current;
    if body.collider.grounded && current == MovementState::Falling {
        let landed = if moving && transition_allowed(body.mode, MovementState::Walking) {
            MovementState::Walking
        } else {
            MovementState::Idle
        };
        body.state.set(landed);
    } else if !body.collider.grounded && !current.is_airborne() && body.velocity.linear.y < 0.0 {
        body.state.set(MovementState::Falling);
    }

    let center = body.transform.position;
    let cell = Point3::new(center.x.floor() as i32, center.y.floor() as i32, center.z.floor() as i32);
    let in_water = store.get_block(cell) == Some(Block::WATER);
    if in_water && body.state.current != MovementState::Jumping {
        body.state.set(MovementState::Swimming);
    }
}

/// Moves every entity that has a transform, velocity, collider, movement config
/// and state.
pub struct PhysicsSystem {
    config: PhysicsConfig,
}

impl PhysicsSystem {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self { config: config.clone() }
    }
}

impl FrameSystem for PhysicsSystem {
    fn name(&self) -> &'static str {
        "physics"
    }

    fn run(&mut self, resources: &StInjectionSystem, dt: f32) {
        let (Some(store), Some(registry)) = (
            resource::<ChunkStore>(resources, self.name()),
            resource::<Registry>(resources, self.name()),
        ) else {
            return;
        };
        let store = store.get();
        let registry = registry.get();

        for entity in registry.view::<(Transform, Velocity, Collider, MovementConfig, PlayerState)>() {
            let Some(mut body) = Body::read(&registry, entity) else {
                continue;
            };
            step(&store, &self.config, &mut body, dt);
            body.write(&registry, entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Point2, Vector3, Zero};

    use super::*;
    use crate::engine_state::{config::WorldConfig, voxels::chunk::Chunk};

    const FLOOR_TOP: f32 = 10.0;
    const DT: f32 = 1.0 / 60.0;
    /// Gap under a resting body, inside the ground probe.
    const REST: f32 = 0.01;

    /// Three by three chunks of size 8 with stone up to y = 9 and a wall at x = 12.
    fn world() -> ChunkStore {
        let config = WorldConfig {
            chunk_size: 8,
            chunk_height: 32,
            ..WorldConfig::default()
        };
        let mut store = ChunkStore::from_config(3, &config).unwrap();
        let dims = store.dimensions();
        for cz in -1..=1 {
            for cx in -1..=1 {
                let mut chunk = Chunk::new(Point2::new(cx, cz), dims);
                for z in 0..8 {
                    for x in 0..8 {
                        for y in 0..FLOOR_TOP as i32 {
                            chunk.set_block_at(x, y, z, Block::STONE);
                        }
                        if cx == 1 && x == 4 {
                            for y in FLOOR_TOP as i32..FLOOR_TOP as i32 + 3 {
                                chunk.set_block_at(x, y, z, Block::STONE);
                            }
                        }
                    }
                }
                store.insert_chunk(chunk);
            }
        }
        store
    }

    fn body(center: Point3<f32>) -> Body {
        let movement = MovementConfig::from(&crate::engine_state::config::MovementDefaults::default());
        Body {
            transform: Transform { position: center },
            velocity: Velocity::default(),
            collider: Collider::new(center, Vector3::new(0.3, 0.9, 0.3)),
            state: PlayerState::default(),
            intent: MovementIntent::default(),
            movement,
            mode: GameMode::Survival,
            flying: false,
        }
    }

    #[test]
    fn falling_body_lands() {
        let store = world();
        let config = PhysicsConfig::default();
        let start = Point3::new(2.5, FLOOR_TOP + 0.9 + 0.02, 2.5);
        let mut body = body(start);
        body.velocity.linear.y = -5.0;
        body.state.set(MovementState::Falling);

        step(&store, &config, &mut body, DT);

        assert_eq!(body.velocity.linear.y, 0.0);
        assert_eq!(body.transform.position.y, start.y);
        assert!(body.collider.grounded);
        assert_eq!(body.state.current, MovementState::Idle);
        assert!(body.collider.aabb.min.y >= FLOOR_TOP);
        assert!(body.collider.aabb.min.y - FLOOR_TOP < config.ground_probe);
    }

    #[test]
    fn long_falls_do_not_tunnel() {
        let store = world();
        let config = PhysicsConfig::default();
        let mut body = body(Point3::new(2.5, FLOOR_TOP + 4.0, 2.5));
        body.velocity.linear.y = -300.0;

        step(&store, &config, &mut body, DT);

        assert!(body.collider.grounded);
        assert!(body.collider.aabb.min.y >= FLOOR_TOP);
    }

    #[test]
    fn walls_stop_one_axis_and_let_the_other_slide() {
        let store = world();
        let config = PhysicsConfig::default();
        let start = Point3::new(12.0 - 0.3 - REST, FLOOR_TOP + 0.9 + REST, 2.5);
        let mut body = body(start);
        body.collider.grounded = true;
        body.intent.wish = Vector3::new(1.0, 0.0, 1.0).normalize();
        body.state.set(MovementState::Walking);

        step(&store, &config, &mut body, DT);

        assert_eq!(body.velocity.linear.x, 0.0);
        assert_eq!(body.transform.position.x, start.x);
        assert!(body.velocity.linear.z > 0.0);
        assert!(body.transform.position.z > start.z);
        assert!(body.collider.grounded);
    }

    #[test]
    fn running_into_a_nearby_wall_keeps_the_old_position() {
        let store = world();
        let config = PhysicsConfig::default();
        // 0.05 short of the wall, less than one step of running.
        let start = Point3::new(11.65, FLOOR_TOP + 0.9 + REST, 2.5);
        let mut body = body(start);
        body.collider.grounded = true;
        body.intent.wish = Vector3::new(1.0, 0.0, 1.0).normalize();
        body.intent.sprint = true;
        body.state.set(MovementState::Running);
        assert!(body.movement.run_speed * body.intent.wish.x * DT > 0.05);

        step(&store, &config, &mut body, DT);

        assert_eq!(body.transform.position.x, start.x);
        assert_eq!(body.velocity.linear.x, 0.0);
        assert!(body.transform.position.z > start.z);
        assert!(body.collider.aabb.max.x < 12.0);
    }

    #[test]
    fn a_blocked_axis_gives_back_earlier_sub_steps() {
        let store = world();
        let config = PhysicsConfig {
            max_step: 0.02,
            ..PhysicsConfig::default()
        };
        let start = Point3::new(11.65, FLOOR_TOP + 0.9 + REST, 2.5);
        let mut body = body(start);
        body.collider.grounded = true;
        body.intent.wish = Vector3::new(1.0, 0.0, 0.0);
        body.state.set(MovementState::Running);

        // Several sub-steps fit in the gap before the one that hits the wall.
        step(&store, &config, &mut body, DT);

        assert_eq!(body.transform.position.x, start.x);
        assert_eq!(body.velocity.linear.x, 0.0);
    }

    #[test]
    fn jump_reaches_the_configured_height() {
        let store = world();
        let config = PhysicsConfig::default();
        let mut body = body(Point3::new(2.5, FLOOR_TOP + 0.9 + REST, 2.5));
        body.collider.grounded = true;
        body.intent.jump = true;

        step(&store, &config, &mut body, DT);
        assert_eq!(body.state.current, MovementState::Jumping);
        body.intent.jump = false;

        let mut apex = body.collider.aabb.min.y;
        for _ in 0..120 {
            step(&store, &config, &mut body, DT);
            apex = apex.max(body.collider.aabb.min.y);
        }

        let height = apex - FLOOR_TOP;
        assert!((height - body.movement.jump_height).abs() < 0.15, "apex {height}");
        assert!(body.collider.grounded);
        assert_eq!(body.state.current, MovementState::Idle);
    }

    #[test]
    fn ceilings_do_not_ground() {
        let mut store = world();
        let above = Point3::new(2, FLOOR_TOP as i32 + 2, 2);
        assert!(store.update_block(above, Block::STONE));
        let config = PhysicsConfig::default();
        // Head 0.05 below the ceiling block.
        let mut body = body(Point3::new(2.5, FLOOR_TOP + 1.05, 2.5));
        body.velocity.linear.y = 8.0;
        body.state.set(MovementState::Jumping);

        step(&store, &config, &mut body, DT);

        assert_eq!(body.velocity.linear.y, 0.0);
        assert!(!body.collider.grounded);
        assert!(body.collider.aabb.max.y < FLOOR_TOP + 2.0);

        step(&store, &config, &mut body, DT);
        assert_eq!(body.state.current, MovementState::Falling);
    }

    #[test]
    fn resting_bodies_refresh_their_box() {
        let store = world();
        let config = PhysicsConfig::default();
        let center = Point3::new(2.5, FLOOR_TOP + 0.9 + REST, 2.5);
        let mut body = body(center);
        body.collider.grounded = true;
        body.collider.aabb = body.collider.aabb_at(Point3::new(0.0, 0.0, 0.0));

        step(&store, &config, &mut body, DT);

        assert_eq!(body.velocity.linear, Vector3::zero());
        assert_eq!(body.collider.aabb, body.collider.aabb_at(center));
        assert!(body.collider.grounded);
    }

    #[test]
    fn spectators_pass_through_blocks() {
        let store = world();
        let config = PhysicsConfig::default();
        let mut body = body(Point3::new(2.5, FLOOR_TOP - 3.0, 2.5));
        body.mode = GameMode::Spectator;
        body.flying = true;
        body.state.set(MovementState::Flying);
        body.intent.wish = Vector3::new(1.0, 0.0, 0.0);

        step(&store, &config, &mut body, 0.5);

        assert!((body.transform.position.x - (2.5 + 0.5 * body.movement.fly_speed)).abs() < 1.0e-4);
        assert!(!body.collider.grounded);
    }
}
