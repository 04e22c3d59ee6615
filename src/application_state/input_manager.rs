//! # Input Manager
//!
//! This module turns winit events into per-frame control snapshots:
//! - keyboard and mouse button down states, current and previous frame
//! - mouse motion and wheel deltas accumulated between frames
//! - the bindings from logical controls to physical inputs

use std::collections::HashMap;

use winit::{
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::PhysicalKey,
};

use crate::engine_state::config::KeyBindings;

use super::input_state::{Control, ControlSnapshot, InputSource, RawInputState};

/// Pixels of trackpad scrolling counted as one wheel line.
const PIXELS_PER_SCROLL_LINE: f64 = 40.0;

/// Manages the state of all bound inputs and processes input events.
pub struct InputManager {
    bindings: HashMap<Control, InputSource>,
    /// Down state of every bound input last frame
    inputs_old: HashMap<InputSource, bool>,
    /// Down state of every bound input now
    inputs_new: HashMap<InputSource, bool>,
    mouse_delta: (f64, f64),
    scroll_delta: f64,
}

impl InputManager {
    /// Creates an input manager for the given bindings.
    ///
    /// Bindings whose key name is not recognised are logged and skipped.
    ///
    /// # Arguments
    /// * `key_bindings` - Control to key name, from the configuration
    pub fn new(key_bindings: &KeyBindings) -> Self {
        let mut bindings = HashMap::new();
        for (control, name) in &key_bindings.bindings {
            match InputSource::parse(name) {
                Some(source) => {
                    bindings.insert(*control, source);
                }
                None => log::warn!("Unknown key name {name:?} bound to {control:?}, ignoring"),
            }
        }

        let inputs_old: HashMap<InputSource, bool> =
            bindings.values().map(|source| (*source, false)).collect();
        let inputs_new = inputs_old.clone();

        Self {
            bindings,
            inputs_old,
            inputs_new,
            mouse_delta: (0.0, 0.0),
            scroll_delta: 0.0,
        }
    }

    /// Processes a window event and updates internal input state.
    ///
    /// # Arguments
    /// * `event` - The window event to process
    pub fn intake_input(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state,
                        physical_key: PhysicalKey::Code(key),
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(down) = self.inputs_new.get_mut(&InputSource::Key(*key)) {
                    *down = *state == ElementState::Pressed;
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                self.set_button(*button, *state == ElementState::Pressed);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y as f64,
                    MouseScrollDelta::PixelDelta(position) => position.y / PIXELS_PER_SCROLL_LINE,
                };
            }
            _ => {}
        }
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        if let Some(state) = self.inputs_new.get_mut(&InputSource::Mouse(button)) {
            *state = down;
        }
    }

    /// Accumulates raw mouse motion.
    ///
    /// # Arguments
    /// * `delta` - The (x, y) delta of mouse movement since the last update
    pub fn intake_mouse_motion(&mut self, delta: (f64, f64)) {
        self.mouse_delta.0 += delta.0;
        self.mouse_delta.1 += delta.1;
    }

    /// Builds this frame's snapshot and starts the next frame.
    ///
    /// # Returns
    /// The transitions of every bound control and the accumulated motion
    pub fn take_snapshot(&mut self) -> ControlSnapshot {
        let mut snapshot = ControlSnapshot::new();
        for (control, source) in &self.bindings {
            let previous = self.inputs_old.get(source).copied().unwrap_or(false);
            let current = self.inputs_new.get(source).copied().unwrap_or(false);
            snapshot.set(*control, RawInputState::from_raw_states(previous, current));
        }
        snapshot.mouse_delta = (self.mouse_delta.0 as f32, self.mouse_delta.1 as f32);
        snapshot.scroll_delta = self.scroll_delta as f32;

        self.move_old_states();
        snapshot
    }

    /// Copies the current down states to the previous ones and clears the deltas.
    pub fn move_old_states(&mut self) {
        for (source, down) in &self.inputs_new {
            self.inputs_old.insert(*source, *down);
        }
        self.mouse_delta = (0.0, 0.0);
        self.scroll_delta = 0.0;
    }

    /// Releases everything.
    ///
    /// Called when the window loses focus, so no key stays stuck down.
    pub fn reset_inputs(&mut self) {
        for down in self.inputs_new.values_mut() {
            *down = false;
        }
        self.move_old_states();
    }
}
