//! # View Frustum
//!
//! The six half-spaces of a view-projection matrix, used to reject chunks that
//! cannot appear on screen.
//!
//! Planes are extracted from the OpenGL-convention matrix (clip z in `[-w, w]`)
//! before the depth remap to wgpu's `[0, 1]`, so the near plane is `row3 + row2`.

use cgmath::{Matrix4, Point3, Vector3, Vector4};

use crate::engine_state::voxels::aabb::Aabb;

/// A plane `normal · p + distance = 0` with the normal pointing into the frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing inside
    pub normal: Vector3<f32>,
    /// Signed offset from the origin
    pub distance: f32,
}

impl Plane {
    fn from_row(row: Vector4<f32>) -> Self {
        let normal = Vector3::new(row.x, row.y, row.z);
        let length = (normal.x * normal.x + normal.y * normal.y + normal.z * normal.z).sqrt();
        if length <= f32::EPSILON {
            return Self {
                normal,
                distance: row.w,
            };
        }
        Self {
            normal: normal / length,
            distance: row.w / length,
        }
    }

    /// Signed distance from the plane; positive inside.
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.x * point.x + self.normal.y * point.y + self.normal.z * point.z + self.distance
    }
}

/// Six inward-facing planes: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the planes of `view_proj`.
    ///
    /// # Arguments
    /// * `view_proj` - OpenGL-convention projection times view
    pub fn from_matrix(view_proj: Matrix4<f32>) -> Self {
        let m = view_proj;
        let row = |i: usize| Vector4::new(m.x[i], m.y[i], m.z[i], m.w[i]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                Plane::from_row(r3 + r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    /// The extracted planes.
    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    /// Conservative box test.
    ///
    /// For each plane, the corner of the box farthest along the plane normal is
    /// tested. The box is rejected only if that corner is strictly behind a plane, so
    /// a box touching a plane counts as visible.
    pub fn contains_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let positive = Point3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            plane.signed_distance(positive) >= 0.0
        })
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{perspective, Deg, InnerSpace, Vector3};

    use super::*;

    fn frustum_looking(eye: Point3<f32>, forward: Vector3<f32>) -> Frustum {
        let view = Matrix4::look_to_rh(eye, forward, Vector3::unit_y());
        let projection = perspective(Deg(70.0), 16.0 / 9.0, 0.1, 200.0);
        Frustum::from_matrix(projection * view)
    }

    #[test]
    fn box_around_camera_is_visible() {
        let eye = Point3::new(3.0, 40.0, -7.0);
        let frustum = frustum_looking(eye, Vector3::new(1.0, 0.0, 1.0).normalize());
        let aabb = Aabb::from_center(eye, Vector3::new(1.0, 1.0, 1.0));
        assert!(frustum.contains_aabb(&aabb));
    }

    #[test]
    fn box_behind_camera_is_culled() {
        let eye = Point3::new(0.0, 40.0, 0.0);
        let forward = Vector3::new(0.0, 0.0, -1.0);
        let frustum = frustum_looking(eye, forward);

        let ahead = Aabb::from_center(eye + forward * 20.0, Vector3::new(1.0, 1.0, 1.0));
        let behind = Aabb::from_center(eye - forward * 20.0, Vector3::new(1.0, 1.0, 1.0));
        assert!(frustum.contains_aabb(&ahead));
        assert!(!frustum.contains_aabb(&behind));
    }

    #[test]
    fn box_touching_a_plane_is_visible() {
        // Identity view with an orthographic box: the left plane is exactly x = -1.
        let frustum = Frustum::from_matrix(cgmath::ortho(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0));
        let touching = Aabb::new(Point3::new(-3.0, -0.5, -5.0), Point3::new(-1.0, 0.5, -4.0));
        let outside = Aabb::new(Point3::new(-3.0, -0.5, -5.0), Point3::new(-1.25, 0.5, -4.0));
        assert!(frustum.contains_aabb(&touching));
        assert!(!frustum.contains_aabb(&outside));
    }
}
