//! # Engine State Module
//!
//! The per-frame orchestrator of the voxel world.
//!
//! ## Key Components
//!
//! * `EngineState` - owns the subsystems and runs a frame
//! * `config` - the immutable engine configuration
//! * `buffer_state` - named engine-wide GPU buffers
//! * `camera_state` - the camera controller, frustum and camera uniform
//! * `rendering` - wgpu pipelines and the two meshing strategies
//! * `systems` - intent, physics, camera follow and block interaction
//! * `voxels` - blocks, chunks, terrain, decoration and the chunk store
//!
//! ## Frame
//!
//! 1. The input manager's snapshot replaces last frame's controls
//! 2. The scheduler runs the frame systems
//! 3. Chunks are streamed in around the player and distant ones evicted
//! 4. The camera uniform is written and visible chunks are drawn
//!
//! The simulation state lives in a `StInjectionSystem` so the systems can borrow
//! what they need by type. Everything runs on the main thread.

use cgmath::Point3;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};

use crate::{
    application_state::input_state::ControlSnapshot,
    core::{ecs::Registry, injection_system::StInjectionSystem, StSystem},
};

use buffer_state::BufferState;
use camera_state::{camera::CameraController, CameraState, CAMERA_BUFFER_NAME};
use config::EngineConfig;
use rendering::RenderState;
use systems::{player::Player, Scheduler};
use voxels::world::ChunkStore;

pub mod buffer_state;
pub mod camera_state;
pub mod config;
pub mod rendering;
pub mod systems;
pub mod voxels;

/// Longest frame step fed to the systems, so a stall does not launch the player.
pub const MAX_FRAME_SECONDS: f32 = 0.1;

/// Entity slots; the player is the only entity today.
const ENTITY_CAPACITY: usize = 64;

/// The main state container for the voxel world.
///
/// # Examples
///
/// ```ignore
/// let mut engine_state = EngineState::new(surface, surface_config, device, queue, &config, seed)?;
///
/// loop {
///     engine_state.update(input_manager.take_snapshot(), frame_time);
///     engine_state.render();
/// }
/// ```
pub struct EngineState {
    config: EngineConfig,
    /// Resources shared with the frame systems
    pub resources: StInjectionSystem,
    /// Frame systems in run order
    pub scheduler: Scheduler,
    /// The loaded chunks
    pub store: StSystem<ChunkStore>,
    /// The player camera
    pub camera: StSystem<CameraController>,
    /// Entity storage
    pub registry: StSystem<Registry>,
    /// The player's entity handle
    pub player: StSystem<Player>,
    controls: StSystem<ControlSnapshot>,
    /// Camera uniform buffer
    pub camera_state: CameraState,
    /// Named GPU buffers
    pub buffer_state: StSystem<BufferState>,
    /// Surface and pipelines
    pub render_state: RenderState,
    start: web_time::Instant,
}

impl EngineState {
    /// Creates the world, the player and the renderer.
    ///
    /// Streams the chunks around the origin and spawns the player on the surface
    /// there.
    ///
    /// # Arguments
    /// * `surface` - The rendering surface
    /// * `surface_config` - Configuration for the rendering surface
    /// * `device` - The GPU device
    /// * `queue` - The GPU command queue
    /// * `config` - The validated engine configuration
    /// * `seed` - World seed
    ///
    /// # Returns
    /// `None`, after logging, if a subsystem could not be created
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: Device,
        queue: Queue,
        config: &EngineConfig,
        seed: u32,
    ) -> Option<Self> {
        let resources = StInjectionSystem::new();
        let device = resources.insert(device);
        let queue = resources.insert(queue);
        let buffer_state = resources.insert(BufferState::new(device.clone(), queue.clone()));

        let mut store = match ChunkStore::from_config(seed, &config.world) {
            Ok(store) => store,
            Err(err) => {
                log::error!("Could not create the chunk store: {err}");
                return None;
            }
        };
        let spawn = spawn_point(&mut store, config);

        let mut registry = Registry::with_capacity(ENTITY_CAPACITY);
        let Some(player) = Player::spawn(&mut registry, spawn, &config.movement) else {
            log::error!("Could not create the player entity");
            return None;
        };
        let eye = player.eye_position(&registry).unwrap_or(spawn);

        let aspect = surface_config.width.max(1) as f32 / surface_config.height.max(1) as f32;
        let mut camera = CameraController::new(eye, aspect, &config.camera);
        let camera_state = CameraState::new(buffer_state.clone(), &mut camera);

        let render_state = {
            let buffers = buffer_state.get();
            let Some(camera_buffer) = buffers.get_buffer(CAMERA_BUFFER_NAME) else {
                log::error!("Camera buffer {CAMERA_BUFFER_NAME} was not created");
                return None;
            };
            RenderState::new(
                surface,
                surface_config,
                device,
                queue,
                camera_buffer,
                &config.render,
            )
        };

        let store = resources.insert(store);
        let camera = resources.insert(camera);
        let registry = resources.insert(registry);
        let player = resources.insert(player);
        let controls = resources.insert(ControlSnapshot::new());

        Some(Self {
            config: config.clone(),
            resources,
            scheduler: Scheduler::with_default_systems(config),
            store,
            camera,
            registry,
            player,
            controls,
            camera_state,
            buffer_state,
            render_state,
            start: web_time::Instant::now(),
        })
    }

    /// Runs the simulation for one frame.
    ///
    /// # Arguments
    /// * `controls` - This frame's controls
    /// * `frame_time` - Time since the previous frame
    pub fn update(&mut self, controls: ControlSnapshot, frame_time: web_time::Duration) {
        *self.controls.get_mut() = controls;
        let dt = frame_time.as_secs_f32().min(MAX_FRAME_SECONDS);

        self.scheduler.run(&self.resources, dt);
        self.stream();
    }

    /// Loads the chunks around the player and evicts the distant ones.
    fn stream(&mut self) {
        let focus = self
            .player
            .get()
            .position(&self.registry.get())
            .unwrap_or_else(|| self.camera.get().tracked_position());

        let mut store = self.store.get_mut();
        let streaming = &self.config.streaming;
        let report = store.ensure_loaded(focus, streaming.load_radius);
        if !report.is_empty() {
            let center = store.dimensions().world_pos_to_chunk(focus);
            store.unload_distant(center, streaming.unload_radius);
        }
    }

    /// Draws the current frame.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render(&mut self) {
        let time = self.start.elapsed().as_secs_f32();
        let mut camera = self.camera.get_mut();
        self.camera_state.update(&mut camera, time);

        let result = self.store.get_mut().render(&mut camera, &mut self.render_state);
        match result {
            Ok(draws) => log::trace!("Drew {draws} chunks"),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.render_state.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => log::error!("Out of GPU memory, skipping frame"),
            Err(err) => log::warn!("Skipping frame: {err}"),
        }
    }

    /// Resizes the surface and the camera's aspect ratio.
    ///
    /// # Arguments
    /// * `size` - The new physical size of the window
    pub fn resize_surface(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        self.render_state.resize(size.width, size.height);
        self.camera.get_mut().resize(size.width, size.height);
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Streams the chunks around the origin and returns a collider centre standing on
/// the surface there.
fn spawn_point(store: &mut ChunkStore, config: &EngineConfig) -> Point3<f32> {
    let origin = Point3::new(0.5, 0.0, 0.5);
    store.ensure_loaded(origin, config.streaming.load_radius);

    let half_height = config.movement.half_extents[1];
    let ground = store
        .surface_height(0, 0)
        .unwrap_or(config.world.chunk_height as i32 - 1);
    Point3::new(origin.x, ground as f32 + 1.0 + half_height + 0.01, origin.z)
}
