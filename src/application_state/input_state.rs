//! # Input State
//!
//! This module defines the input state types used by the input manager and the
//! frame systems:
//! - `Control`: the logical actions the game reacts to
//! - `RawInputState`: the per-frame transition of one key or button
//! - `InputSource`: the platform key or mouse button a control is bound to
//! - `ControlSnapshot`: everything the systems read about input in one frame

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use winit::{event::MouseButton, keyboard::KeyCode};

/// A logical control, independent of the key bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    /// Walk forward
    Forward,
    /// Walk backward
    Back,
    /// Strafe left
    Left,
    /// Strafe right
    Right,
    /// Jump, or rise while flying
    Jump,
    /// Run
    Sprint,
    /// Crouch, or sink while flying
    Crouch,
    /// Break the targeted block
    Attack,
    /// Place a block against the targeted face
    Place,
    /// Switch between first and third person
    CameraToggle,
    /// Start or stop flying
    FlyToggle,
    /// Select the next placeable block
    NextBlock,
    /// Cycle the game mode
    CycleMode,
}

impl Control {
    /// Every control.
    pub const ALL: [Control; 13] = [
        Control::Forward,
        Control::Back,
        Control::Left,
        Control::Right,
        Control::Jump,
        Control::Sprint,
        Control::Crouch,
        Control::Attack,
        Control::Place,
        Control::CameraToggle,
        Control::FlyToggle,
        Control::NextBlock,
        Control::CycleMode,
    ];
}

/// Represents the state of a key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawInputState {
    /// Key/button is not pressed
    #[default]
    NotPressed,
    /// Key/button was just pressed this frame
    Pressed,
    /// Key/button has been held down for multiple frames
    Held,
    /// Key/button was just released this frame
    Released,
}

impl RawInputState {
    /// Determines if the input is actively down (either pressed or held)
    pub fn is_active(&self) -> bool {
        matches!(self, RawInputState::Pressed | RawInputState::Held)
    }

    /// Determines if the input was just pressed this frame
    pub fn is_just_pressed(&self) -> bool {
        matches!(self, RawInputState::Pressed)
    }

    /// Determines if the input was just released this frame
    pub fn is_just_released(&self) -> bool {
        matches!(self, RawInputState::Released)
    }

    /// Derives the transition from the previous and current down states
    pub fn from_raw_states(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => RawInputState::Pressed,
            (true, true) => RawInputState::Held,
            (true, false) => RawInputState::Released,
            (false, false) => RawInputState::NotPressed,
        }
    }
}

/// A physical input a control can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// A keyboard key
    Key(KeyCode),
    /// A mouse button
    Mouse(MouseButton),
}

impl InputSource {
    /// Parses a binding name.
    ///
    /// Accepts winit `KeyCode` variant names for letters, digits, function keys and
    /// the usual modifier and navigation keys, plus `MouseLeft`, `MouseRight` and
    /// `MouseMiddle`.
    ///
    /// # Returns
    /// `None` if the name is not recognised
    pub fn parse(name: &str) -> Option<Self> {
        let mouse = match name {
            "MouseLeft" => Some(MouseButton::Left),
            "MouseRight" => Some(MouseButton::Right),
            "MouseMiddle" => Some(MouseButton::Middle),
            _ => None,
        };
        if let Some(button) = mouse {
            return Some(InputSource::Mouse(button));
        }

        if let Some(letter) = name.strip_prefix("Key") {
            return letter_key(letter).map(InputSource::Key);
        }
        if let Some(digit) = name.strip_prefix("Digit") {
            return digit_key(digit).map(InputSource::Key);
        }

        let key = match name {
            "Space" => KeyCode::Space,
            "ShiftLeft" => KeyCode::ShiftLeft,
            "ShiftRight" => KeyCode::ShiftRight,
            "ControlLeft" => KeyCode::ControlLeft,
            "ControlRight" => KeyCode::ControlRight,
            "AltLeft" => KeyCode::AltLeft,
            "AltRight" => KeyCode::AltRight,
            "Tab" => KeyCode::Tab,
            "Enter" => KeyCode::Enter,
            "Escape" => KeyCode::Escape,
            "Backspace" => KeyCode::Backspace,
            "ArrowUp" => KeyCode::ArrowUp,
            "ArrowDown" => KeyCode::ArrowDown,
            "ArrowLeft" => KeyCode::ArrowLeft,
            "ArrowRight" => KeyCode::ArrowRight,
            "F1" => KeyCode::F1,
            "F2" => KeyCode::F2,
            "F3" => KeyCode::F3,
            "F4" => KeyCode::F4,
            "F5" => KeyCode::F5,
            "F6" => KeyCode::F6,
            "F7" => KeyCode::F7,
            "F8" => KeyCode::F8,
            "F9" => KeyCode::F9,
            "F10" => KeyCode::F10,
            "F11" => KeyCode::F11,
            "F12" => KeyCode::F12,
            _ => return None,
        };
        Some(InputSource::Key(key))
    }
}

fn letter_key(letter: &str) -> Option<KeyCode> {
    let key = match letter {
        "A" => KeyCode::KeyA,
        "B" => KeyCode::KeyB,
        "C" => KeyCode::KeyC,
        "D" => KeyCode::KeyD,
        "E" => KeyCode::KeyE,
        "F" => KeyCode::KeyF,
        "G" => KeyCode::KeyG,
        "H" => KeyCode::KeyH,
        "I" => KeyCode::KeyI,
        "J" => KeyCode::KeyJ,
        "K" => KeyCode::KeyK,
        "L" => KeyCode::KeyL,
        "M" => KeyCode::KeyM,
        "N" => KeyCode::KeyN,
        "O" => KeyCode::KeyO,
        "P" => KeyCode::KeyP,
        "Q" => KeyCode::KeyQ,
        "R" => KeyCode::KeyR,
        "S" => KeyCode::KeyS,
        "T" => KeyCode::KeyT,
        "U" => KeyCode::KeyU,
        "V" => KeyCode::KeyV,
        "W" => KeyCode::KeyW,
        "X" => KeyCode::KeyX,
        "Y" => KeyCode::KeyY,
        "Z" => KeyCode::KeyZ,
        _ => return None,
    };
    Some(key)
}

fn digit_key(digit: &str) -> Option<KeyCode> {
    let key = match digit {
        "0" => KeyCode::Digit0,
        "1" => KeyCode::Digit1,
        "2" => KeyCode::Digit2,
        "3" => KeyCode::Digit3,
        "4" => KeyCode::Digit4,
        "5" => KeyCode::Digit5,
        "6" => KeyCode::Digit6,
        "7" => KeyCode::Digit7,
        "8" => KeyCode::Digit8,
        "9" => KeyCode::Digit9,
        _ => return None,
    };
    Some(key)
}

/// A snapshot of the logical controls for one frame.
///
/// Built by the input manager once per frame and read by the frame systems. Controls
/// that are not in the snapshot read as `NotPressed`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlSnapshot {
    states: HashMap<Control, RawInputState>,
    /// Mouse movement since the last frame (x, y)
    pub mouse_delta: (f32, f32),
    /// Wheel movement since the last frame, in lines
    pub scroll_delta: f32,
}

impl ControlSnapshot {
    /// Creates a snapshot with every control released and no motion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the state of one control.
    pub fn with(mut self, control: Control, state: RawInputState) -> Self {
        self.set(control, state);
        self
    }

    /// Sets the state of one control in place.
    pub fn set(&mut self, control: Control, state: RawInputState) {
        self.states.insert(control, state);
    }

    /// Transition of a control this frame.
    pub fn state(&self, control: Control) -> RawInputState {
        self.states.get(&control).copied().unwrap_or_default()
    }

    /// Whether a control is down, whether it went down this frame or earlier.
    pub fn is_held(&self, control: Control) -> bool {
        self.state(control).is_active()
    }

    /// Whether a control went down this frame.
    pub fn is_pressed(&self, control: Control) -> bool {
        self.state(control).is_just_pressed()
    }

    /// Whether a control went up this frame.
    pub fn is_released(&self, control: Control) -> bool {
        self.state(control).is_just_released()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_follow_the_raw_states() {
        assert_eq!(RawInputState::from_raw_states(false, true), RawInputState::Pressed);
        assert_eq!(RawInputState::from_raw_states(true, true), RawInputState::Held);
        assert_eq!(RawInputState::from_raw_states(true, false), RawInputState::Released);
        assert_eq!(RawInputState::from_raw_states(false, false), RawInputState::NotPressed);
    }

    #[test]
    fn held_includes_the_press_frame() {
        let snapshot = ControlSnapshot::new()
            .with(Control::Jump, RawInputState::Pressed)
            .with(Control::Forward, RawInputState::Held)
            .with(Control::Attack, RawInputState::Released);

        assert!(snapshot.is_held(Control::Jump));
        assert!(snapshot.is_pressed(Control::Jump));
        assert!(snapshot.is_held(Control::Forward));
        assert!(!snapshot.is_pressed(Control::Forward));
        assert!(snapshot.is_released(Control::Attack));
        assert!(!snapshot.is_held(Control::Attack));
        assert!(!snapshot.is_held(Control::Back));
    }

    #[test]
    fn binding_names_parse() {
        assert_eq!(InputSource::parse("KeyW"), Some(InputSource::Key(KeyCode::KeyW)));
        assert_eq!(InputSource::parse("Digit3"), Some(InputSource::Key(KeyCode::Digit3)));
        assert_eq!(InputSource::parse("F5"), Some(InputSource::Key(KeyCode::F5)));
        assert_eq!(InputSource::parse("MouseRight"), Some(InputSource::Mouse(MouseButton::Right)));
        assert_eq!(InputSource::parse("KeyWW"), None);
        assert_eq!(InputSource::parse("Hyper"), None);
    }
}
