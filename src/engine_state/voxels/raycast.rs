//! # Voxel Raycast
//!
//! Amanatides-Woo traversal: the ray steps from cell to cell, always across the
//! nearest cell boundary, so every block it touches is visited exactly once and in
//! order.
//!
//! Air and fluids are passed through. The ray stops without a hit when it leaves the
//! bottom of the world, enters an unloaded chunk or exceeds the maximum distance.
//! Above the world is open air.

use cgmath::{InnerSpace, Point3, Vector3};

use super::{block::Block, world::ChunkStore};

/// The first solid block along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The block hit
    pub block: Point3<i32>,
    /// The last non-solid cell before the hit, where a placed block would go
    pub previous: Option<Point3<i32>>,
    /// Normal of the face the ray entered through; zero if it started inside the block
    pub normal: Vector3<i32>,
    /// Distance travelled to the entry point
    pub distance: f32,
    /// Material of the block hit
    pub block_type: Block,
}

/// Whether the ray stops at a block.
fn stops_ray(block: Block) -> bool {
    block != Block::AIR && !block.is_fluid()
}

/// Casts a ray through the loaded world.
///
/// # Arguments
/// * `store` - The loaded chunks
/// * `origin` - Start of the ray in world space
/// * `direction` - Direction of the ray; need not be normalized
/// * `max_distance` - Longest distance searched
///
/// # Returns
/// The first block that stops the ray, or `None`
pub fn raycast(
    store: &ChunkStore,
    origin: Point3<f32>,
    direction: Vector3<f32>,
    max_distance: f32,
) -> Option<RaycastHit> {
    if direction.magnitude2() <= f32::EPSILON || max_distance <= 0.0 {
        return None;
    }
    let direction = direction.normalize();
    let height = store.dimensions().height() as i32;

    let mut cell = Point3::new(
        origin.x.floor() as i32,
        origin.y.floor() as i32,
        origin.z.floor() as i32,
    );
    let step = Vector3::new(
        direction.x.signum() as i32,
        direction.y.signum() as i32,
        direction.z.signum() as i32,
    );

    // Distance along the ray to the first boundary on each axis, and between boundaries.
    let boundary = |p: f32, cell: i32, d: f32| -> (f32, f32) {
        if d.abs() <= f32::EPSILON {
            return (f32::INFINITY, f32::INFINITY);
        }
        let next = if d > 0.0 { cell as f32 + 1.0 } else { cell as f32 };
        ((next - p) / d, 1.0 / d.abs())
    };
    let (mut t_max_x, t_delta_x) = boundary(origin.x, cell.x, direction.x);
    let (mut t_max_y, t_delta_y) = boundary(origin.y, cell.y, direction.y);
    let (mut t_max_z, t_delta_z) = boundary(origin.z, cell.z, direction.z);

    let mut distance = 0.0;
    let mut normal = Vector3::new(0, 0, 0);
    let mut previous = None;

    while distance <= max_distance {
        if cell.y < 0 {
            return None;
        }
        if cell.y < height {
            let block = store.get_block(cell)?;
            if stops_ray(block) {
                return Some(RaycastHit {
                    block: cell,
                    previous,
                    normal,
                    distance,
                    block_type: block,
                });
            }
        }
        previous = Some(cell);

        if t_max_x < t_max_y && t_max_x < t_max_z {
            cell.x += step.x;
            distance = t_max_x;
            t_max_x += t_delta_x;
            normal = Vector3::new(-step.x, 0, 0);
        } else if t_max_y < t_max_z {
            cell.y += step.y;
            distance = t_max_y;
            t_max_y += t_delta_y;
            normal = Vector3::new(0, -step.y, 0);
        } else {
            cell.z += step.z;
            distance = t_max_z;
            t_max_z += t_delta_z;
            normal = Vector3::new(0, 0, -step.z);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use cgmath::Point2;

    use super::*;
    use crate::engine_state::{
        config::WorldConfig,
        voxels::chunk::{Chunk, ChunkDimensions},
    };

    /// One loaded chunk at the origin with a stone floor at y = 9.
    fn floor_store() -> ChunkStore {
        let config = WorldConfig {
            chunk_size: 16,
            chunk_height: 32,
            ..WorldConfig::default()
        };
        let mut store = ChunkStore::from_config(1, &config).unwrap();
        let mut chunk = Chunk::new(Point2::new(0, 0), ChunkDimensions::new(16, 32).unwrap());
        for z in 0..16 {
            for x in 0..16 {
                for y in 0..10 {
                    chunk.set_block_at(x, y, z, Block::STONE);
                }
            }
        }
        store.insert_chunk(chunk);
        store
    }

    #[test]
    fn looking_down_hits_the_floor_from_above() {
        let store = floor_store();
        let hit = raycast(&store, Point3::new(4.5, 14.5, 4.5), Vector3::new(0.0, -1.0, 0.0), 10.0).unwrap();
        assert_eq!(hit.block, Point3::new(4, 9, 4));
        assert_eq!(hit.previous, Some(Point3::new(4, 10, 4)));
        assert_eq!(hit.normal, Vector3::new(0, 1, 0));
        assert!((hit.distance - 4.5).abs() < 1e-4);
        assert_eq!(hit.block_type, Block::STONE);
    }

    #[test]
    fn side_hits_report_the_side_normal() {
        let mut store = floor_store();
        store.write_block(Point3::new(8, 12, 4), Block::PLANKS);
        let hit = raycast(&store, Point3::new(2.5, 12.5, 4.5), Vector3::new(1.0, 0.0, 0.0), 10.0).unwrap();
        assert_eq!(hit.block, Point3::new(8, 12, 4));
        assert_eq!(hit.normal, Vector3::new(-1, 0, 0));
        assert_eq!(hit.previous, Some(Point3::new(7, 12, 4)));
    }

    #[test]
    fn water_and_lava_are_passed_through() {
        let mut store = floor_store();
        store.write_block(Point3::new(4, 11, 4), Block::WATER);
        store.write_block(Point3::new(4, 10, 4), Block::LAVA);
        let hit = raycast(&store, Point3::new(4.5, 14.5, 4.5), Vector3::new(0.0, -1.0, 0.0), 10.0).unwrap();
        assert_eq!(hit.block, Point3::new(4, 9, 4));
    }

    #[test]
    fn misses_stop_at_range_or_unloaded_chunks() {
        let store = floor_store();
        assert!(raycast(&store, Point3::new(4.5, 14.5, 4.5), Vector3::new(0.0, -1.0, 0.0), 3.0).is_none());
        assert!(raycast(&store, Point3::new(4.5, 14.5, 4.5), Vector3::new(1.0, 0.0, 0.0), 50.0).is_none());
        assert!(raycast(&store, Point3::new(4.5, 14.5, 4.5), Vector3::new(0.0, 0.0, 0.0), 50.0).is_none());
    }

    #[test]
    fn rays_from_above_the_world_come_down() {
        let store = floor_store();
        let hit = raycast(&store, Point3::new(4.5, 40.0, 4.5), Vector3::new(0.0, -1.0, 0.0), 40.0).unwrap();
        assert_eq!(hit.block, Point3::new(4, 9, 4));
        assert_eq!(hit.previous, Some(Point3::new(4, 10, 4)));
    }
}
