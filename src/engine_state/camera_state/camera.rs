//! # Camera Implementation
//!
//! This module contains the camera controller and its GPU representation:
//! - `CameraController`: yaw/pitch orientation, first/third person modes, cached
//!   view, projection and frustum behind dirty flags, and optional smoothing
//! - `CameraUniform`: packed data structure for the chunk shaders
//!
//! ## Conventions
//! Yaw and pitch are in degrees. Yaw 0 looks down -Z and positive yaw turns right
//! (towards +X); positive pitch looks up. The orientation quaternion is always kept
//! in sync with yaw and pitch.
//!
//! ## Lazy Matrices
//! Mutators only raise dirty flags. The matrices and the frustum are rebuilt on the
//! next read, so several changes in one tick cost one rebuild.

use cgmath::*;

use super::frustum::Frustum;
use crate::engine_state::{config::CameraConfig, voxels::aabb::Aabb};

/// Transformation matrix to convert from OpenGL's coordinate system to WGPU's.
///
/// Scales clip-space Z from [-1, 1] to [-0.5, 0.5] and translates it to [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch limit in degrees, short of straight up or down.
pub const PITCH_LIMIT_DEGREES: f32 = 89.0;

/// Whether the camera sits at the tracked point or orbits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// The eye is the tracked point
    FirstPerson,
    /// The eye orbits the tracked point at a fixed distance, looking at it
    ThirdPerson,
}

/// View and projection state for the player camera.
#[derive(Debug)]
pub struct CameraController {
    tracked: Point3<f32>,
    follow_target: Option<Point3<f32>>,
    follow_velocity: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    orientation: Quaternion<f32>,
    mode: CameraMode,

    fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
    sensitivity: f32,
    third_person_distance: f32,
    smooth_time: f32,

    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    frustum: Frustum,
    view_dirty: bool,
    projection_dirty: bool,
    frustum_dirty: bool,
}

impl CameraController {
    /// Creates a first-person camera at `position` looking down -Z.
    ///
    /// # Arguments
    /// * `position` - Initial eye position
    /// * `aspect` - Viewport width over height
    /// * `config` - Field of view, clip planes, sensitivity and smoothing
    pub fn new(position: Point3<f32>, aspect: f32, config: &CameraConfig) -> Self {
        let mut controller = Self {
            tracked: position,
            follow_target: None,
            follow_velocity: Vector3::zero(),
            yaw: 0.0,
            pitch: 0.0,
            orientation: Quaternion::one(),
            mode: CameraMode::FirstPerson,
            fov_degrees: config.fov_degrees,
            aspect,
            near: config.near,
            far: config.far,
            sensitivity: config.sensitivity,
            third_person_distance: config.third_person_distance,
            smooth_time: config.smooth_time,
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            frustum: Frustum::from_matrix(Matrix4::identity()),
            view_dirty: true,
            projection_dirty: true,
            frustum_dirty: true,
        };
        controller.sync_orientation();
        controller
    }

    /// Current mode.
    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// Yaw in degrees.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in degrees.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Orientation quaternion.
    pub fn orientation(&self) -> Quaternion<f32> {
        self.orientation
    }

    /// The point the camera follows: the eye in first person, the orbit centre in third.
    pub fn tracked_position(&self) -> Point3<f32> {
        self.tracked
    }

    /// World-space eye position.
    pub fn eye_position(&self) -> Point3<f32> {
        match self.mode {
            CameraMode::FirstPerson => self.tracked,
            CameraMode::ThirdPerson => self.tracked - self.forward() * self.third_person_distance,
        }
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = Rad::from(Deg(self.yaw)).sin_cos();
        let (pitch_sin, pitch_cos) = Rad::from(Deg(self.pitch)).sin_cos();
        Vector3::new(yaw_sin * pitch_cos, pitch_sin, -yaw_cos * pitch_cos)
    }

    /// View direction projected onto the ground plane.
    pub fn flat_forward(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = Rad::from(Deg(self.yaw)).sin_cos();
        Vector3::new(yaw_sin, 0.0, -yaw_cos)
    }

    /// Right vector on the ground plane.
    pub fn flat_right(&self) -> Vector3<f32> {
        self.flat_forward().cross(Vector3::unit_y())
    }

    /// Returns `true` if the view matrix will be rebuilt on the next read.
    pub fn is_view_dirty(&self) -> bool {
        self.view_dirty
    }

    /// Returns `true` if the projection matrix will be rebuilt on the next read.
    pub fn is_projection_dirty(&self) -> bool {
        self.projection_dirty
    }

    /// Returns `true` if the frustum will be rebuilt on the next read.
    pub fn is_frustum_dirty(&self) -> bool {
        self.frustum_dirty
    }

    fn mark_view_dirty(&mut self) {
        self.view_dirty = true;
        self.frustum_dirty = true;
    }

    fn mark_projection_dirty(&mut self) {
        self.projection_dirty = true;
        self.frustum_dirty = true;
    }

    fn sync_orientation(&mut self) {
        self.orientation =
            Quaternion::from_angle_y(Deg(-self.yaw)) * Quaternion::from_angle_x(Deg(self.pitch));
    }

    /// Applies a mouse movement.
    ///
    /// # Arguments
    /// * `dx` - Horizontal delta; positive turns right
    /// * `dy` - Vertical delta; positive looks down, as screen y grows downwards
    pub fn process_mouse(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.set_yaw_pitch(self.yaw + dx * self.sensitivity, self.pitch - dy * self.sensitivity);
    }

    /// Sets the look angles directly, clamping pitch to ±89°.
    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw.rem_euclid(360.0);
        self.pitch = pitch.clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);
        self.sync_orientation();
        self.mark_view_dirty();
    }

    /// Switches between first and third person.
    ///
    /// Yaw and pitch are recovered from the orientation, so the view direction is
    /// unchanged across the switch.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            CameraMode::FirstPerson => CameraMode::ThirdPerson,
            CameraMode::ThirdPerson => CameraMode::FirstPerson,
        };

        let forward = self.orientation.rotate_vector(-Vector3::unit_z());
        let pitch = Deg::from(Rad(forward.y.clamp(-1.0, 1.0).asin())).0;
        let yaw = Deg::from(Rad(forward.x.atan2(-forward.z))).0;
        self.set_yaw_pitch(yaw, pitch);
        log::debug!("Camera mode is now {:?}", self.mode);
    }

    /// Moves the tracked point immediately, cancelling any smoothing.
    pub fn set_position(&mut self, position: Point3<f32>) {
        self.tracked = position;
        self.follow_target = None;
        self.follow_velocity = Vector3::zero();
        self.mark_view_dirty();
    }

    /// Moves the tracked point towards `target`.
    ///
    /// With a smoothing time of zero this snaps; otherwise the point follows with a
    /// critically damped spring.
    pub fn follow(&mut self, target: Point3<f32>, dt: f32) {
        if self.smooth_time <= 0.0 {
            if self.tracked != target {
                self.set_position(target);
            }
            return;
        }

        self.follow_target = Some(target);
        let (position, velocity) =
            smooth_damp(self.tracked, target, self.follow_velocity, self.smooth_time, dt);
        self.follow_velocity = velocity;
        if position != self.tracked {
            self.tracked = position;
            self.mark_view_dirty();
        }
    }

    /// Target of the last `follow` call while smoothing is active.
    pub fn follow_target(&self) -> Option<Point3<f32>> {
        self.follow_target
    }

    /// Updates the aspect ratio for a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.mark_projection_dirty();
    }

    /// Sets the vertical field of view in degrees.
    pub fn set_fov(&mut self, fov_degrees: f32) {
        self.fov_degrees = fov_degrees;
        self.mark_projection_dirty();
    }

    /// The view matrix, rebuilt if dirty.
    pub fn view_matrix(&mut self) -> Matrix4<f32> {
        if self.view_dirty {
            self.view = match self.mode {
                CameraMode::FirstPerson => {
                    Matrix4::from(self.orientation.conjugate())
                        * Matrix4::from_translation(-self.tracked.to_vec())
                }
                CameraMode::ThirdPerson => {
                    Matrix4::look_at_rh(self.eye_position(), self.tracked, Vector3::unit_y())
                }
            };
            self.view_dirty = false;
        }
        self.view
    }

    /// The OpenGL-convention projection matrix, rebuilt if dirty.
    pub fn projection_matrix(&mut self) -> Matrix4<f32> {
        if self.projection_dirty {
            self.projection = perspective(Deg(self.fov_degrees), self.aspect, self.near, self.far);
            self.projection_dirty = false;
        }
        self.projection
    }

    /// Projection times view, remapped to wgpu's depth range.
    pub fn view_projection(&mut self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection_matrix() * self.view_matrix()
    }

    /// The view frustum, rebuilt if dirty.
    pub fn frustum(&mut self) -> &Frustum {
        if self.frustum_dirty {
            let view_proj = self.projection_matrix() * self.view_matrix();
            self.frustum = Frustum::from_matrix(view_proj);
            self.frustum_dirty = false;
        }
        &self.frustum
    }

    /// Returns `true` if `aabb` may be visible.
    pub fn is_visible(&mut self, aabb: &Aabb) -> bool {
        self.frustum().contains_aabb(aabb)
    }
}

/// Critically damped spring step from `current` towards `target`.
///
/// # Arguments
/// * `current` - Current position
/// * `target` - Goal position
/// * `velocity` - Spring velocity carried between calls
/// * `smooth_time` - Approximate time to reach the target
/// * `dt` - Time step
///
/// # Returns
/// The new position and velocity
pub fn smooth_damp(
    current: Point3<f32>,
    target: Point3<f32>,
    velocity: Vector3<f32>,
    smooth_time: f32,
    dt: f32,
) -> (Point3<f32>, Vector3<f32>) {
    let smooth_time = smooth_time.max(1.0e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (velocity + change * omega) * dt;
    let new_velocity = (velocity - temp * omega) * decay;
    let position = target + (change + temp) * decay;
    (position, new_velocity)
}

/// GPU-friendly representation of camera data for shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    // We can't use cgmath with bytemuck directly so we'll have to convert the Matrix4 into a 4x4 f32 array
    view_proj: [[f32; 4]; 4],
    /// Eye position in xyz, seconds since start in w
    position: [f32; 4],
}

impl CameraUniform {
    /// Creates a new camera uniform with an identity matrix and zero position.
    pub fn new() -> Self {
        Self {
            view_proj: cgmath::Matrix4::identity().into(),
            position: [0.0, 0.0, 0.0, 0.0],
        }
    }

    /// Updates the view-projection matrix and position from the controller.
    ///
    /// # Arguments
    /// * `camera` - The camera to read from
    /// * `time` - Seconds since start, animated by the water shader
    pub fn update_view_proj_and_pos(&mut self, camera: &mut CameraController, time: f32) {
        self.view_proj = camera.view_projection().into();
        let eye = camera.eye_position();
        self.position = [eye.x, eye.y, eye.z, time];
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> CameraController {
        CameraController::new(Point3::new(0.0, 50.0, 0.0), 1.5, &CameraConfig::default())
    }

    fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).magnitude() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn orientation_matches_forward() {
        let mut camera = controller();
        camera.set_yaw_pitch(30.0, -20.0);
        let rotated = camera.orientation().rotate_vector(-Vector3::unit_z());
        assert_close(rotated, camera.forward());
    }

    #[test]
    fn yaw_turns_towards_positive_x() {
        let mut camera = controller();
        camera.set_yaw_pitch(90.0, 0.0);
        assert_close(camera.flat_forward(), Vector3::new(1.0, 0.0, 0.0));
        assert_close(camera.flat_right(), Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = controller();
        camera.process_mouse(0.0, -100_000.0);
        assert_eq!(camera.pitch(), PITCH_LIMIT_DEGREES);
        camera.process_mouse(0.0, 100_000.0);
        assert_eq!(camera.pitch(), -PITCH_LIMIT_DEGREES);
    }

    #[test]
    fn matrices_rebuild_lazily() {
        let mut camera = controller();
        camera.view_matrix();
        assert!(!camera.is_view_dirty());
        assert!(camera.is_projection_dirty());
        assert!(camera.is_frustum_dirty());

        camera.frustum();
        assert!(!camera.is_projection_dirty());
        assert!(!camera.is_frustum_dirty());

        camera.process_mouse(3.0, 1.0);
        camera.process_mouse(2.0, 1.0);
        assert!(camera.is_view_dirty());
        assert!(camera.is_frustum_dirty());

        camera.resize(800, 600);
        camera.frustum();
        assert!(!camera.is_view_dirty());
        assert!(!camera.is_projection_dirty());
        assert!(!camera.is_frustum_dirty());
    }

    #[test]
    fn first_person_view_moves_eye_to_origin() {
        let mut camera = controller();
        camera.set_yaw_pitch(45.0, 10.0);
        let eye = camera.eye_position();
        let view = camera.view_matrix();
        let in_view = view * eye.to_homogeneous();
        assert!(in_view.truncate().magnitude() < 1e-4);

        let ahead = eye + camera.forward() * 5.0;
        let ahead_view = view * ahead.to_homogeneous();
        assert!((ahead_view.z + 5.0).abs() < 1e-3);
    }

    #[test]
    fn toggling_mode_keeps_direction() {
        let mut camera = controller();
        camera.set_yaw_pitch(123.0, -35.0);
        let before = camera.forward();

        camera.toggle_mode();
        assert_eq!(camera.mode(), CameraMode::ThirdPerson);
        assert_close(camera.forward(), before);
        let offset = camera.tracked_position() - camera.eye_position();
        assert!((offset.magnitude() - CameraConfig::default().third_person_distance).abs() < 1e-3);

        camera.toggle_mode();
        assert_eq!(camera.mode(), CameraMode::FirstPerson);
        assert_close(camera.forward(), before);
    }

    #[test]
    fn smoothing_converges_without_overshoot() {
        let start = Point3::new(0.0, 0.0, 0.0);
        let target = Point3::new(10.0, 0.0, 0.0);
        let mut position = start;
        let mut velocity = Vector3::zero();
        for _ in 0..240 {
            let (p, v) = smooth_damp(position, target, velocity, 0.2, 1.0 / 60.0);
            assert!(p.x <= target.x + 1e-3);
            position = p;
            velocity = v;
        }
        assert!((position.x - target.x).abs() < 1e-2);
    }

    #[test]
    fn zero_smooth_time_snaps() {
        let config = CameraConfig {
            smooth_time: 0.0,
            ..CameraConfig::default()
        };
        let mut camera = CameraController::new(Point3::new(0.0, 0.0, 0.0), 1.0, &config);
        camera.follow(Point3::new(1.0, 2.0, 3.0), 0.016);
        assert_eq!(camera.tracked_position(), Point3::new(1.0, 2.0, 3.0));
    }
}
