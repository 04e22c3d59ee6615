//! # Voxel Collision
//!
//! Box-against-world overlap tests. A box is blocked by every block it overlaps
//! that blocks movement, and by every cell in a chunk that is not loaded, so
//! entities cannot walk or fall into terrain that has not streamed in yet.

use cgmath::Point3;

use crate::engine_state::voxels::{aabb::Aabb, world::ChunkStore};

/// Whether the cell at `position` blocks movement.
///
/// Cells in unloaded chunks block. Cells above or below the world do not.
pub fn is_blocking(store: &ChunkStore, position: Point3<i32>) -> bool {
    let height = store.dimensions().height() as i32;
    if position.y < 0 || position.y >= height {
        return false;
    }
    match store.get_block(position) {
        Some(block) => block.blocks_movement(),
        None => true,
    }
}

/// Whether `aabb` overlaps anything that blocks movement.
///
/// Walks the inclusive block range of the box with the vertical range clamped to
/// the world's height.
pub fn collides(store: &ChunkStore, aabb: &Aabb) -> bool {
    let (min, max) = aabb.block_range();
    let top = store.dimensions().height() as i32 - 1;
    let (min_y, max_y) = (min.y.max(0), max.y.min(top));

    for y in min_y..=max_y {
        for z in min.z..=max.z {
            for x in min.x..=max.x {
                if is_blocking(store, Point3::new(x, y, z)) {
                    return true;
                }
            }
        }
    }
    false
}

/// Whether the box would be blocked `distance` below where it is.
pub fn probe_ground(store: &ChunkStore, aabb: &Aabb, distance: f32) -> bool {
    collides(store, &aabb.translated(cgmath::Vector3::new(0.0, -distance, 0.0)))
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;
    use crate::engine_state::{
        config::WorldConfig,
        voxels::{block::Block, chunk::Chunk},
    };

    fn floor_store() -> ChunkStore {
        let config = WorldConfig {
            chunk_size: 8,
            chunk_height: 32,
            ..WorldConfig::default()
        };
        let mut store = ChunkStore::from_config(1, &config).unwrap();
        let dims = store.dimensions();
        let mut chunk = Chunk::new(cgmath::Point2::new(0, 0), dims);
        for z in 0..8 {
            for x in 0..8 {
                chunk.set_block_at(x, 0, z, Block::STONE);
            }
        }
        chunk.set_block_at(3, 1, 3, Block::WATER);
        chunk.set_block_at(4, 1, 3, Block::LAVA);
        store.insert_chunk(chunk);
        store
    }

    #[test]
    fn resting_on_a_face_is_not_a_collision() {
        let store = floor_store();
        let standing = Aabb::from_center(Point3::new(2.5, 1.9, 2.5), Vector3::new(0.3, 0.9, 0.3));
        assert!(!collides(&store, &standing));
        assert!(probe_ground(&store, &standing, 0.05));
        assert!(collides(&store, &standing.translated(Vector3::new(0.0, -0.1, 0.0))));
    }

    #[test]
    fn fluids_do_not_block() {
        let store = floor_store();
        let in_fluids = Aabb::new(Point3::new(3.1, 1.0, 3.1), Point3::new(4.9, 1.9, 3.9));
        assert!(!collides(&store, &in_fluids));
    }

    #[test]
    fn unloaded_chunks_block() {
        let store = floor_store();
        let outside = Aabb::from_center(Point3::new(8.5, 5.0, 2.5), Vector3::new(0.3, 0.9, 0.3));
        assert!(collides(&store, &outside));
        assert!(is_blocking(&store, Point3::new(-1, 5, 0)));
    }

    #[test]
    fn above_the_world_is_open() {
        let store = floor_store();
        let high = Aabb::from_center(Point3::new(2.5, 40.0, 2.5), Vector3::new(0.3, 0.9, 0.3));
        assert!(!collides(&store, &high));
    }
}
