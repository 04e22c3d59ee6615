//! # Camera State Management
//!
//! Everything the player sees through:
//! - `CameraController`: look angles, first/third person, smoothing and the lazily
//!   rebuilt view, projection and frustum
//! - `Frustum`: plane extraction and the chunk box test
//! - `CameraState`: the camera's GPU uniform and the buffer it lives in
//!
//! The controller is CPU-only so the frame systems and the tests can drive it
//! without a device. `CameraState` is the only part that touches wgpu.

use crate::core::StSystem;

use super::buffer_state::BufferState;

pub mod camera;
pub mod frustum;

use camera::{CameraController, CameraUniform};

/// Name of the GPU buffer used for camera uniform data
pub const CAMERA_BUFFER_NAME: &str = "camera_buffer";

/// GPU side of the camera.
pub struct CameraState {
    /// GPU-optimized camera data for shaders
    pub camera_uniform: CameraUniform,
    /// Manages GPU buffer state for camera data
    pub buffer_state: StSystem<BufferState>,
}

impl CameraState {
    /// Creates the camera uniform buffer from the controller's current view.
    ///
    /// # Arguments
    /// * `buffer_state` - The buffer registry the uniform is allocated in
    /// * `camera` - The controller to read the initial matrices from
    pub fn new(buffer_state: StSystem<BufferState>, camera: &mut CameraController) -> Self {
        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj_and_pos(camera, 0.0);

        buffer_state.get_mut().create_buffer_init(
            CAMERA_BUFFER_NAME,
            &wgpu::util::BufferInitDescriptor {
                label: Some(CAMERA_BUFFER_NAME),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        CameraState {
            camera_uniform,
            buffer_state,
        }
    }

    /// Writes this frame's matrices and clock into the uniform buffer.
    ///
    /// # Arguments
    /// * `camera` - The controller; dirty matrices are rebuilt here
    /// * `time` - Seconds since start
    pub fn update(&mut self, camera: &mut CameraController, time: f32) {
        self.camera_uniform.update_view_proj_and_pos(camera, time);
        self.buffer_state.get().write_buffer(
            CAMERA_BUFFER_NAME,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );
    }
}
