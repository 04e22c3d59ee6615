//! # Movement Intent
//!
//! Turns the control snapshot into a world-space wish direction and picks the
//! ground movement state. Physics reads the state; it only overrides it for the
//! outcomes of collision (jumping, falling, landing, swimming).

use cgmath::{InnerSpace, Vector2, Vector3, Zero};

use crate::{
    application_state::input_state::{Control, ControlSnapshot},
    core::{ecs::Registry, injection_system::StInjectionSystem},
    engine_state::camera_state::camera::CameraController,
};

use super::{
    components::{MovementIntent, MovementState, PlayerControl, PlayerState},
    player::{transition_allowed, Player},
    resource, FrameSystem,
};

/// Wish magnitudes below this count as standing still.
pub const IDLE_THRESHOLD: f32 = 1.0e-3;

/// Derives the intent for one frame.
///
/// # Arguments
/// * `controls` - This frame's controls
/// * `forward` - Camera forward on the ground plane
/// * `right` - Camera right on the ground plane
///
/// # Returns
/// The intent and the ground state it implies
pub fn derive_intent(
    controls: &ControlSnapshot,
    forward: Vector3<f32>,
    right: Vector3<f32>,
) -> (MovementIntent, MovementState) {
    let axis = |positive: Control, negative: Control| -> f32 {
        controls.is_held(positive) as i32 as f32 - controls.is_held(negative) as i32 as f32
    };

    // Forward is +y and right is +x in input space.
    let mut input = Vector2::new(axis(Control::Right, Control::Left), axis(Control::Forward, Control::Back));
    if input.magnitude2() > 0.0 {
        input = input.normalize();
    }

    let flatten = |v: Vector3<f32>| {
        let flat = Vector3::new(v.x, 0.0, v.z);
        if flat.magnitude2() > 0.0 {
            flat.normalize()
        } else {
            Vector3::zero()
        }
    };
    let mut wish = flatten(forward) * input.y + flatten(right) * input.x;
    if wish.magnitude2() > 0.0 {
        wish = wish.normalize();
    }

    let intent = MovementIntent {
        wish,
        jump: controls.is_held(Control::Jump),
        sprint: controls.is_held(Control::Sprint),
        crouch: controls.is_held(Control::Crouch),
        fly_vertical: axis(Control::Jump, Control::Crouch),
    };

    let state = if wish.magnitude() < IDLE_THRESHOLD {
        MovementState::Idle
    } else if intent.crouch {
        MovementState::Crouching
    } else if intent.sprint {
        MovementState::Running
    } else {
        MovementState::Walking
    };

    (intent, state)
}

/// Applies `derived` to `state` unless physics owns the current state.
///
/// Airborne states wait for physics to land them. Flying entities stay flying.
pub fn select_state(state: &mut PlayerState, derived: MovementState, control: &PlayerControl) {
    if control.flying {
        state.set(MovementState::Flying);
        return;
    }
    if state.current.is_airborne() {
        return;
    }
    if transition_allowed(control.mode, derived) {
        state.set(derived);
    }
}

/// Writes every controllable entity's intent from the controls and the camera.
///
/// Also handles the mode controls: fly toggle and game mode cycling.
pub struct IntentSystem;

impl FrameSystem for IntentSystem {
    fn name(&self) -> &'static str {
        "intent"
    }

    fn run(&mut self, resources: &StInjectionSystem, _dt: f32) {
        let (Some(controls), Some(camera), Some(registry)) = (
            resource::<ControlSnapshot>(resources, self.name()),
            resource::<CameraController>(resources, self.name()),
            resource::<Registry>(resources, self.name()),
        ) else {
            return;
        };
        let controls = controls.get();
        let registry = registry.get();

        let (forward, right) = {
            let camera = camera.get();
            (camera.flat_forward(), camera.flat_right())
        };
        let (intent, derived) = derive_intent(&controls, forward, right);

        for entity in registry.view::<(MovementIntent, PlayerState, PlayerControl)>() {
            let player = Player::from_entity(entity);
            if controls.is_pressed(Control::CycleMode) {
                if let Some(mode) = player.mode(&registry) {
                    player.set_mode(&registry, mode.next());
                }
            }
            if controls.is_pressed(Control::FlyToggle) {
                player.toggle_flying(&registry);
            }

            let (Some(mut stored), Some(mut state), Some(control)) = (
                registry.get_mut::<MovementIntent>(entity),
                registry.get_mut::<PlayerState>(entity),
                registry.get::<PlayerControl>(entity),
            ) else {
                continue;
            };
            *stored = intent;
            select_state(&mut state, derived, &control);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_state::input_state::RawInputState;

    fn forward() -> Vector3<f32> {
        Vector3::new(0.0, 0.0, -1.0)
    }

    fn right() -> Vector3<f32> {
        Vector3::new(1.0, 0.0, 0.0)
    }

    fn held(controls: &[Control]) -> ControlSnapshot {
        controls
            .iter()
            .fold(ControlSnapshot::new(), |snapshot, control| {
                snapshot.with(*control, RawInputState::Held)
            })
    }

    #[test]
    fn no_input_is_idle() {
        let (intent, state) = derive_intent(&ControlSnapshot::new(), forward(), right());
        assert_eq!(state, MovementState::Idle);
        assert_eq!(intent.wish, Vector3::zero());
    }

    #[test]
    fn diagonal_wish_is_unit_length() {
        let (intent, state) = derive_intent(&held(&[Control::Forward, Control::Right]), forward(), right());
        assert_eq!(state, MovementState::Walking);
        assert!((intent.wish.magnitude() - 1.0).abs() < 1.0e-5);
        assert!(intent.wish.x > 0.0 && intent.wish.z < 0.0);
    }

    #[test]
    fn opposite_keys_cancel() {
        let (_, state) = derive_intent(&held(&[Control::Forward, Control::Back]), forward(), right());
        assert_eq!(state, MovementState::Idle);
    }

    #[test]
    fn crouch_wins_over_sprint() {
        let (_, state) = derive_intent(
            &held(&[Control::Forward, Control::Sprint, Control::Crouch]),
            forward(),
            right(),
        );
        assert_eq!(state, MovementState::Crouching);

        let (_, state) = derive_intent(&held(&[Control::Forward, Control::Sprint]), forward(), right());
        assert_eq!(state, MovementState::Running);
    }

    #[test]
    fn tilted_camera_vectors_are_flattened() {
        let forward = Vector3::new(0.0, -0.8, -0.6);
        let (intent, _) = derive_intent(&held(&[Control::Forward]), forward, right());
        assert!((intent.wish - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1.0e-5);
    }

    #[test]
    fn airborne_states_are_left_to_physics() {
        let control = PlayerControl::default();
        let mut state = PlayerState {
            current: MovementState::Falling,
            previous: MovementState::Jumping,
        };
        select_state(&mut state, MovementState::Walking, &control);
        assert_eq!(state.current, MovementState::Falling);

        state.current = MovementState::Idle;
        select_state(&mut state, MovementState::Running, &control);
        assert_eq!(state.current, MovementState::Running);
    }
}
