//! # Axis-Aligned Bounding Boxes
//!
//! World-space boxes used for chunk culling, entity colliders and block placement
//! checks.

use cgmath::{Point3, Vector3};

/// An axis-aligned box given by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Point3<f32>,
    /// Maximum corner
    pub max: Point3<f32>,
}

impl Aabb {
    /// Creates a box from two corners.
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Creates a box centred on `center` with the given half extents.
    pub fn from_center(center: Point3<f32>, half_extents: Vector3<f32>) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// The unit box occupied by a block.
    pub fn block(position: Point3<i32>) -> Self {
        let min = Point3::new(position.x as f32, position.y as f32, position.z as f32);
        Self {
            min,
            max: min + Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Centre of the box.
    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Strict overlap test; boxes that only touch do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Returns `true` if `point` lies inside or on the box.
    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        (self.min.x..=self.max.x).contains(&point.x)
            && (self.min.y..=self.max.y).contains(&point.y)
            && (self.min.z..=self.max.z).contains(&point.z)
    }

    /// The box moved by `offset`.
    pub fn translated(&self, offset: Vector3<f32>) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Inclusive integer block range the box overlaps.
    ///
    /// The upper bound is `ceil(max) - 1`, so a box whose face lies exactly on a block
    /// boundary does not reach into the next block.
    pub fn block_range(&self) -> (Point3<i32>, Point3<i32>) {
        (
            Point3::new(
                self.min.x.floor() as i32,
                self.min.y.floor() as i32,
                self.min.z.floor() as i32,
            ),
            Point3::new(
                self.max.x.ceil() as i32 - 1,
                self.max.y.ceil() as i32 - 1,
                self.max.z.ceil() as i32 - 1,
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = Aabb::block(Point3::new(0, 0, 0));
        let b = Aabb::block(Point3::new(1, 0, 0));
        assert!(!a.intersects(&b));
        assert!(a.intersects(&a.translated(Vector3::new(0.5, 0.0, 0.0))));
    }

    #[test]
    fn block_range_excludes_boundary_faces() {
        let feet_on_ground = Aabb::new(Point3::new(0.2, 1.0, 0.2), Point3::new(0.8, 2.8, 0.8));
        assert_eq!(
            feet_on_ground.block_range(),
            (Point3::new(0, 1, 0), Point3::new(0, 2, 0))
        );

        let negative = Aabb::new(Point3::new(-0.5, 0.0, -1.0), Point3::new(0.5, 1.0, 0.0));
        assert_eq!(
            negative.block_range(),
            (Point3::new(-1, 0, -1), Point3::new(0, 0, -1))
        );
    }
}
