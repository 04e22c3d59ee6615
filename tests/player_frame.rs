use cgmath::{InnerSpace, Point3, Vector2};

use voxel_world::{
    application_state::input_state::{Control, ControlSnapshot, RawInputState},
    core::{ecs::Registry, injection_system::StInjectionSystem, StSystem},
    engine_state::{
        camera_state::camera::CameraController,
        config::{EngineConfig, WorldConfig},
        systems::{
            components::{GameMode, MovementState},
            player::Player,
            FrameSystem, Scheduler,
        },
        voxels::{block::Block, world::ChunkStore},
    },
};

const DT: f32 = 1.0 / 60.0;
const GROUND: i32 = 30;

/// Flat grass at y = 30, no trees or water.
fn flat_config() -> EngineConfig {
    EngineConfig {
        world: WorldConfig {
            chunk_size: 16,
            chunk_height: 64,
            sea_level: 10,
            base_height: GROUND as f32,
            height_amplitude: 0.0,
            trees: false,
            water: false,
            ..WorldConfig::default()
        },
        ..EngineConfig::default()
    }
}

struct Harness {
    resources: StInjectionSystem,
    scheduler: Scheduler,
    registry: StSystem<Registry>,
    store: StSystem<ChunkStore>,
    controls: StSystem<ControlSnapshot>,
    player: Player,
}

impl Harness {
    fn new(config: &EngineConfig, spawn: Point3<f32>) -> Self {
        let mut store = ChunkStore::from_config(1, &config.world).unwrap();
        store.ensure_loaded(spawn, 2);

        let mut registry = Registry::with_capacity(8);
        let player = Player::spawn(&mut registry, spawn, &config.movement).unwrap();
        let camera = CameraController::new(spawn, 16.0 / 9.0, &config.camera);

        let resources = StInjectionSystem::new();
        let store = resources.insert(store);
        let registry = resources.insert(registry);
        let controls = resources.insert(ControlSnapshot::new());
        resources.insert(camera);
        resources.insert(player);

        Self {
            resources,
            scheduler: Scheduler::with_default_systems(config),
            registry,
            store,
            controls,
            player,
        }
    }

    fn frame(&mut self, controls: ControlSnapshot) {
        *self.controls.get_mut() = controls;
        self.scheduler.run(&self.resources, DT);
    }

    fn idle_frames(&mut self, count: usize) {
        for _ in 0..count {
            self.frame(ControlSnapshot::new());
        }
    }

    fn position(&self) -> Point3<f32> {
        self.player.position(&self.registry.get()).unwrap()
    }

    fn state(&self) -> MovementState {
        self.player.state(&self.registry.get()).unwrap()
    }

    fn feet(&self) -> f32 {
        self.player.aabb(&self.registry.get()).unwrap().min.y
    }
}

#[test]
fn the_player_falls_onto_the_streamed_ground() {
    let config = flat_config();
    let mut harness = Harness::new(&config, Point3::new(0.5, 40.0, 0.5));

    harness.idle_frames(120);

    let feet = harness.feet();
    assert!(feet >= (GROUND + 1) as f32, "feet at {feet}");
    assert!(feet - ((GROUND + 1) as f32) < config.physics.ground_probe, "feet at {feet}");
    assert_eq!(harness.state(), MovementState::Idle);
}

#[test]
fn holding_forward_walks_at_the_configured_speed() {
    let config = flat_config();
    let mut harness = Harness::new(&config, Point3::new(0.5, 32.0, 0.5));
    harness.idle_frames(60);
    let start = harness.position();

    let walk = ControlSnapshot::new().with(Control::Forward, RawInputState::Held);
    for _ in 0..60 {
        harness.frame(walk.clone());
    }
    assert_eq!(harness.state(), MovementState::Walking);

    let end = harness.position();
    let travelled = Vector2::new(end.x - start.x, end.z - start.z).magnitude();
    let expected = config.movement.walk_speed;
    assert!((travelled - expected).abs() < 0.1, "travelled {travelled}");
    let feet = harness.feet();
    assert!(feet >= (GROUND + 1) as f32 && feet - ((GROUND + 1) as f32) < config.physics.ground_probe);
}

#[test]
fn a_wall_stops_the_walk() {
    let config = flat_config();
    let mut harness = Harness::new(&config, Point3::new(0.5, 32.0, 0.5));
    harness.idle_frames(60);

    // A two-high wall across the path, wherever the camera faces.
    {
        let mut store = harness.store.get_mut();
        for x in -4i32..=4 {
            for z in -4i32..=4 {
                if x.abs() == 3 || z.abs() == 3 {
                    store.update_block(Point3::new(x, GROUND + 1, z), Block::STONE);
                    store.update_block(Point3::new(x, GROUND + 2, z), Block::STONE);
                }
            }
        }
    }

    let walk = ControlSnapshot::new().with(Control::Forward, RawInputState::Held);
    for _ in 0..120 {
        harness.frame(walk.clone());
    }
    let end = harness.position();
    assert!(end.x.abs() < 3.0 && end.z.abs() < 3.0, "escaped to {end:?}");
}

#[test]
fn jumping_leaves_the_ground_and_lands_again() {
    let config = flat_config();
    let mut harness = Harness::new(&config, Point3::new(0.5, 32.0, 0.5));
    harness.idle_frames(60);
    let rest = harness.feet();

    harness.frame(ControlSnapshot::new().with(Control::Jump, RawInputState::Pressed));
    let mut apex = harness.feet();
    for _ in 0..90 {
        harness.frame(ControlSnapshot::new());
        apex = apex.max(harness.feet());
    }

    assert!((apex - rest - config.movement.jump_height).abs() < 0.15, "apex {apex}");
    assert!((harness.feet() - rest).abs() < config.physics.ground_probe);
    assert_eq!(harness.state(), MovementState::Idle);
}

#[test]
fn breaking_the_block_underfoot_drops_the_player() {
    let config = flat_config();
    let mut harness = Harness::new(&config, Point3::new(0.5, 32.0, 0.5));
    harness.idle_frames(60);

    harness
        .store
        .get_mut()
        .update_block(Point3::new(0, GROUND, 0), Block::AIR);
    harness.idle_frames(60);

    let feet = harness.feet();
    assert!(feet >= GROUND as f32, "feet at {feet}");
    assert!(feet - (GROUND as f32) < config.physics.ground_probe, "feet at {feet}");
}

#[test]
fn cycling_modes_reaches_spectator_flight() {
    let config = flat_config();
    let mut harness = Harness::new(&config, Point3::new(0.5, 32.0, 0.5));
    harness.idle_frames(10);

    let cycle = ControlSnapshot::new().with(Control::CycleMode, RawInputState::Pressed);
    harness.frame(cycle.clone());
    assert_eq!(harness.player.mode(&harness.registry.get()), Some(GameMode::Creative));
    harness.frame(cycle);
    assert_eq!(harness.player.mode(&harness.registry.get()), Some(GameMode::Spectator));
    assert_eq!(harness.state(), MovementState::Flying);

    let start = harness.feet();
    harness.idle_frames(30);
    assert!((harness.feet() - start).abs() < 1e-3, "spectators hover");
}

#[test]
fn systems_run_in_insertion_order() {
    struct Recorder {
        name: &'static str,
        log: StSystem<Vec<&'static str>>,
    }

    impl FrameSystem for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn run(&mut self, _resources: &StInjectionSystem, _dt: f32) {
            self.log.get_mut().push(self.name);
        }
    }

    let log = StSystem::new(Vec::new());
    let mut scheduler = Scheduler::new();
    for name in ["first", "second", "third"] {
        scheduler.add(Recorder {
            name,
            log: log.clone(),
        });
    }

    let resources = StInjectionSystem::new();
    scheduler.run(&resources, DT);
    scheduler.run(&resources, DT);
    assert_eq!(
        *log.get(),
        vec!["first", "second", "third", "first", "second", "third"]
    );
}
