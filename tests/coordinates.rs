use cgmath::{Point2, Point3, Vector3};
use proptest::prelude::*;

use voxel_world::engine_state::{
    config::WorldConfig,
    voxels::{
        aabb::Aabb,
        block::Block,
        chunk::{Chunk, ChunkDimensions},
        raycast::raycast,
        world::ChunkStore,
    },
};

fn dimensions() -> impl Strategy<Value = ChunkDimensions> {
    (1u32..=6, 1u32..=8).prop_map(|(size_shift, height_shift)| {
        ChunkDimensions::new(1 << size_shift, 1 << height_shift).unwrap()
    })
}

proptest! {
    #[test]
    fn every_local_cell_has_its_own_index(
        dims in dimensions(),
        fx in 0.0f64..1.0,
        fy in 0.0f64..1.0,
        fz in 0.0f64..1.0,
    ) {
        let x = (fx * dims.size() as f64) as usize;
        let y = (fy * dims.height() as f64) as usize;
        let z = (fz * dims.size() as f64) as usize;

        let index = dims.index(x, y, z);
        prop_assert!(index < dims.volume());
        prop_assert_eq!(dims.delinearize(index), (x, y, z));
    }

    #[test]
    fn world_blocks_split_into_chunk_and_local(
        dims in dimensions(),
        x in -100_000i32..100_000,
        y in 0i32..256,
        z in -100_000i32..100_000,
    ) {
        let world = Point3::new(x, y, z);
        let coord = dims.world_to_chunk(world);
        let local = dims.world_to_local(world);

        let size = dims.size() as i32;
        prop_assert!((0..size).contains(&local.x));
        prop_assert!((0..size).contains(&local.z));
        prop_assert_eq!(local.y, y);
        prop_assert_eq!(dims.local_to_world(coord, local), world);
    }

    #[test]
    fn positions_belong_to_the_chunk_whose_box_holds_them(
        x in -5_000.0f32..5_000.0,
        z in -5_000.0f32..5_000.0,
    ) {
        let dims = ChunkDimensions::new(16, 64).unwrap();
        let position = Point3::new(x, 10.5, z);
        let chunk = Chunk::new(dims.world_pos_to_chunk(position), dims);
        prop_assert!(chunk.aabb().contains_point(position));
    }

    #[test]
    fn block_range_covers_exactly_the_overlapped_blocks(
        cx in -50.0f32..50.0,
        cy in -50.0f32..50.0,
        cz in -50.0f32..50.0,
        hx in 0.05f32..2.0,
        hy in 0.05f32..2.0,
        hz in 0.05f32..2.0,
    ) {
        let aabb = Aabb::from_center(Point3::new(cx, cy, cz), Vector3::new(hx, hy, hz));
        let (min, max) = aabb.block_range();

        for x in min.x - 1..=max.x + 1 {
            for y in min.y - 1..=max.y + 1 {
                for z in min.z - 1..=max.z + 1 {
                    let inside = (min.x..=max.x).contains(&x)
                        && (min.y..=max.y).contains(&y)
                        && (min.z..=max.z).contains(&z);
                    let overlaps = aabb.intersects(&Aabb::block(Point3::new(x, y, z)));
                    if overlaps {
                        prop_assert!(inside, "{:?} overlaps but is outside the range", (x, y, z));
                    }
                }
            }
        }
    }

    #[test]
    fn rays_down_onto_a_floor_hit_the_floor(
        x in 0.01f32..15.99,
        z in 0.01f32..15.99,
        height in 2.0f32..30.0,
    ) {
        let config = WorldConfig {
            chunk_size: 16,
            chunk_height: 32,
            ..WorldConfig::default()
        };
        let mut store = ChunkStore::from_config(0, &config).unwrap();
        let mut chunk = Chunk::new(Point2::new(0, 0), store.dimensions());
        for bz in 0..16 {
            for bx in 0..16 {
                chunk.set_block_at(bx, 0, bz, Block::STONE);
            }
        }
        store.insert_chunk(chunk);

        let hit = raycast(&store, Point3::new(x, height, z), -Vector3::unit_y(), 64.0);
        let hit = hit.expect("the floor is below");
        prop_assert_eq!(hit.block, Point3::new(x.floor() as i32, 0, z.floor() as i32));
        prop_assert_eq!(hit.normal, Vector3::new(0, 1, 0));
        prop_assert!((hit.distance - (height - 1.0)).abs() < 1e-3);
    }
}
