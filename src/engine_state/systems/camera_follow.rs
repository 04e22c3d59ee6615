//! Points the camera: mouse look, perspective toggle, and following the player's eye.

use crate::{
    application_state::input_state::{Control, ControlSnapshot},
    core::{ecs::Registry, injection_system::StInjectionSystem},
    engine_state::camera_state::camera::CameraController,
};

use super::{player::Player, resource, FrameSystem};

/// Moves the camera after physics has moved the player.
pub struct CameraFollowSystem;

impl FrameSystem for CameraFollowSystem {
    fn name(&self) -> &'static str {
        "camera_follow"
    }

    fn run(&mut self, resources: &StInjectionSystem, dt: f32) {
        let (Some(controls), Some(camera), Some(registry), Some(player)) = (
            resource::<ControlSnapshot>(resources, self.name()),
            resource::<CameraController>(resources, self.name()),
            resource::<Registry>(resources, self.name()),
            resource::<Player>(resources, self.name()),
        ) else {
            return;
        };
        let controls = controls.get();
        let mut camera = camera.get_mut();

        let (dx, dy) = controls.mouse_delta;
        camera.process_mouse(dx, dy);
        if controls.is_pressed(Control::CameraToggle) {
            camera.toggle_mode();
        }

        let eye = player.get().eye_position(&registry.get());
        if let Some(eye) = eye {
            camera.follow(eye, dt);
        }
    }
}
