//! # Application State Management
//!
//! This module handles the application's state management, including:
//! - Window and graphics initialization
//! - Input handling
//! - Application lifecycle events
//! - The frame loop driving `EngineState`

pub mod graphics_resources_builder;
pub mod input_manager;
pub mod input_state;

use std::sync::Arc;

use graphics_resources_builder::{Graphics, GraphicsBuilder, MaybeGraphics};
use input_manager::InputManager;

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::engine_state::{config::EngineConfig, EngineState};

/// The main application state container that manages the application's lifecycle.
///
/// It implements `ApplicationHandler` to handle window and device events, and
/// drives one engine frame each time the event loop is about to wait.
pub struct ApplicationState {
    /// The current graphics state: waiting to build, ready, or handed to the engine
    pub graphics: MaybeGraphics,

    /// The initialized application state, if the application has started
    pub state: Option<InitializedApplicationState>,

    config: EngineConfig,
    seed: u32,
}

/// Represents the fully initialized and running state of the application.
pub struct InitializedApplicationState {
    /// The voxel world
    pub engine_state: EngineState,

    /// Handle to the application window
    pub window: Arc<Window>,

    /// Turns window events into control snapshots
    pub input_manager: InputManager,

    /// Timestamp of the last frame for delta time calculations
    pub last_wait_time: web_time::Instant,
}

/// Whether the event asks the application to close.
fn is_exit_request(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event: KeyEvent {
                    state: ElementState::Pressed,
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    ..
                },
                ..
            }
    )
}

impl ApplicationState {
    /// Creates the application in its pre-graphics state.
    ///
    /// # Arguments
    /// * `event_loop_proxy` - Receives the graphics once they are built
    /// * `config` - The validated engine configuration
    /// * `seed` - World seed
    pub fn new(event_loop_proxy: EventLoopProxy<Graphics>, config: EngineConfig, seed: u32) -> Self {
        Self {
            graphics: MaybeGraphics::Builder(GraphicsBuilder::new(event_loop_proxy)),
            state: None,
            config,
            seed,
        }
    }

    /// Hands the graphics resources to a new `EngineState`.
    ///
    /// # Returns
    /// `false` if the engine could not be created
    fn initialize_application_state(&mut self) -> bool {
        let MaybeGraphics::Graphics(gfx) = &mut self.graphics else {
            return false;
        };
        let taken_gfx = std::mem::take(gfx);
        self.graphics = MaybeGraphics::Moved;

        let (Some(window), Some(surface), Some(surface_config), Some(device), Some(queue)) = (
            taken_gfx.window,
            taken_gfx.surface,
            taken_gfx.surface_config,
            taken_gfx.device,
            taken_gfx.queue,
        ) else {
            log::error!("Graphics resources are incomplete");
            return false;
        };

        let Some(engine_state) =
            EngineState::new(surface, surface_config, device, queue, &self.config, self.seed)
        else {
            return false;
        };

        self.state = Some(InitializedApplicationState {
            engine_state,
            window,
            input_manager: InputManager::new(&self.config.key_bindings),
            last_wait_time: web_time::Instant::now(),
        });
        log::info!("World ready with seed {}", self.seed);
        true
    }
}

impl ApplicationHandler<Graphics> for ApplicationState {
    /// Handles window-related events such as resize, focus changes, and input events.
    ///
    /// # Arguments
    /// * `event_loop` - Reference to the active event loop
    /// * `_window_id` - ID of the window that generated the event
    /// * `event` - The window event to process
    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if is_exit_request(&event) {
            event_loop.exit();
            return;
        }

        let Some(state) = &mut self.state else {
            return;
        };
        let input_manager = &mut state.input_manager;
        let engine_state = &mut state.engine_state;

        input_manager.intake_input(&event);

        match event {
            WindowEvent::Resized(size) => {
                engine_state.resize_surface(size);
            }
            WindowEvent::Focused(is_focused) => {
                if !is_focused {
                    input_manager.reset_inputs();
                }
            }
            WindowEvent::RedrawRequested => {
                engine_state.render();
            }
            _ => (),
        }
    }

    /// Handles raw mouse motion for mouse look.
    ///
    /// # Arguments
    /// * `_event_loop` - Reference to the active event loop
    /// * `_device_id` - ID of the device that generated the event
    /// * `event` - The device event to process
    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = &mut self.state {
            if let DeviceEvent::MouseMotion { delta } = event {
                state.input_manager.intake_mouse_motion(delta);
            }
        }
    }

    /// Starts graphics initialization the first time the application resumes.
    ///
    /// # Arguments
    /// * `event_loop` - Reference to the active event loop
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let MaybeGraphics::Builder(builder) = &mut self.graphics {
            builder.build_and_send(event_loop);
        }
    }

    /// Receives the initialized graphics and starts the engine.
    ///
    /// # Arguments
    /// * `event_loop` - Reference to the active event loop
    /// * `graphics` - The initialized graphics resources
    fn user_event(&mut self, event_loop: &ActiveEventLoop, graphics: Graphics) {
        self.graphics = MaybeGraphics::Graphics(graphics);

        if !self.initialize_application_state() {
            log::error!("Could not start the engine");
            event_loop.exit();
        }
    }

    /// Runs one engine frame and requests the redraw that presents it.
    ///
    /// # Arguments
    /// * `_event_loop` - Reference to the active event loop
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            let now = web_time::Instant::now();
            let frame_time = now - state.last_wait_time;
            state.last_wait_time = now;

            let controls = state.input_manager.take_snapshot();
            state.engine_state.update(controls, frame_time);

            state.window.request_redraw();
        }
    }
}
