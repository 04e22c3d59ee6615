//! # Block Interaction
//!
//! Breaking and placing blocks along the view ray, and choosing the material to
//! place.

use cgmath::{Point3, Vector3, Zero};

use crate::{
    application_state::input_state::{Control, ControlSnapshot},
    core::{ecs::Registry, injection_system::StInjectionSystem},
    engine_state::{
        camera_state::camera::CameraController,
        voxels::{aabb::Aabb, block::Block, raycast::raycast, world::ChunkStore},
    },
};

use super::{
    components::{GameMode, PlayerControl},
    player::Player,
    resource, FrameSystem,
};

/// Replaces the first solid block along the ray with air.
///
/// # Arguments
/// * `store` - The loaded world
/// * `origin` - Ray start, usually the eye
/// * `direction` - View direction
/// * `reach` - Longest distance searched
///
/// # Returns
/// The position broken, or `None` if nothing was in reach
pub fn break_block(
    store: &mut ChunkStore,
    origin: Point3<f32>,
    direction: Vector3<f32>,
    reach: f32,
) -> Option<Point3<i32>> {
    let hit = raycast(store, origin, direction, reach)?;
    if store.update_block(hit.block, Block::AIR) {
        log::debug!("Broke {:?} at {:?}", hit.block_type, hit.block);
        Some(hit.block)
    } else {
        log::debug!("Could not break the block at {:?}", hit.block);
        None
    }
}

/// Places `block` against the face of the first solid block along the ray.
///
/// Refuses when the target cell is not air or when the new block would overlap
/// `occupied`, the box of whoever is placing it.
///
/// # Returns
/// The position filled, or `None` if nothing was placed
pub fn place_block(
    store: &mut ChunkStore,
    origin: Point3<f32>,
    direction: Vector3<f32>,
    reach: f32,
    block: Block,
    occupied: &Aabb,
) -> Option<Point3<i32>> {
    let hit = raycast(store, origin, direction, reach)?;
    if hit.normal == Vector3::zero() {
        return None;
    }

    let target = hit.block + hit.normal;
    if store.get_block(target) != Some(Block::AIR) {
        log::debug!("Placement target {:?} is not empty", target);
        return None;
    }
    if Aabb::block(target).intersects(occupied) {
        log::debug!("Placement at {:?} would overlap the player", target);
        return None;
    }

    store.update_block(target, block).then_some(target)
}

/// Handles the attack, place and block selection controls.
pub struct InteractionSystem {
    reach: f32,
}

impl InteractionSystem {
    pub fn new(reach: f32) -> Self {
        Self { reach }
    }
}

impl FrameSystem for InteractionSystem {
    fn name(&self) -> &'static str {
        "interaction"
    }

    fn run(&mut self, resources: &StInjectionSystem, _dt: f32) {
        let (Some(controls), Some(camera), Some(registry), Some(player), Some(store)) = (
            resource::<ControlSnapshot>(resources, self.name()),
            resource::<CameraController>(resources, self.name()),
            resource::<Registry>(resources, self.name()),
            resource::<Player>(resources, self.name()),
            resource::<ChunkStore>(resources, self.name()),
        ) else {
            return;
        };
        let controls = controls.get();
        let registry = registry.get();
        let player = *player.get();

        let Some(mut control) = registry.get_mut::<PlayerControl>(player.entity()) else {
            return;
        };
        if controls.is_pressed(Control::NextBlock) || controls.scroll_delta.abs() >= 1.0 {
            control.selected_block = control.selected_block.next_placeable();
            log::debug!("Selected {:?}", control.selected_block);
        }

        let attack = controls.is_pressed(Control::Attack);
        let place = controls.is_pressed(Control::Place);
        if control.mode == GameMode::Spectator || !(attack || place) {
            return;
        }
        let selected = control.selected_block;
        drop(control);

        let (Some(eye), Some(occupied)) = (player.eye_position(&registry), player.aabb(&registry)) else {
            return;
        };
        let direction = camera.get().forward();
        let mut store = store.get_mut();
        if attack {
            break_block(&mut store, eye, direction, self.reach);
        } else {
            place_block(&mut store, eye, direction, self.reach, selected, &occupied);
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point2;

    use super::*;
    use crate::engine_state::{config::WorldConfig, voxels::chunk::Chunk};

    /// One chunk with a stone floor at y = 0.
    fn store() -> ChunkStore {
        let config = WorldConfig {
            chunk_size: 8,
            chunk_height: 16,
            ..WorldConfig::default()
        };
        let mut store = ChunkStore::from_config(5, &config).unwrap();
        let mut chunk = Chunk::new(Point2::new(0, 0), store.dimensions());
        for z in 0..8 {
            for x in 0..8 {
                chunk.set_block_at(x, 0, z, Block::STONE);
            }
        }
        store.insert_chunk(chunk);
        store
    }

    fn far_box() -> Aabb {
        Aabb::from_center(Point3::new(100.0, 100.0, 100.0), Vector3::new(0.3, 0.9, 0.3))
    }

    #[test]
    fn breaking_clears_the_first_hit() {
        let mut store = store();
        let broken = break_block(&mut store, Point3::new(3.5, 4.5, 3.5), -Vector3::unit_y(), 6.0);
        assert_eq!(broken, Some(Point3::new(3, 0, 3)));
        assert_eq!(store.get_block(Point3::new(3, 0, 3)), Some(Block::AIR));
    }

    #[test]
    fn placing_goes_against_the_hit_face() {
        let mut store = store();
        let placed = place_block(
            &mut store,
            Point3::new(3.5, 4.5, 3.5),
            -Vector3::unit_y(),
            6.0,
            Block::PLANKS,
            &far_box(),
        );
        assert_eq!(placed, Some(Point3::new(3, 1, 3)));
        assert_eq!(store.get_block(Point3::new(3, 1, 3)), Some(Block::PLANKS));
    }

    #[test]
    fn placing_into_the_player_is_refused() {
        let mut store = store();
        let player = Aabb::from_center(Point3::new(3.5, 1.9, 3.5), Vector3::new(0.3, 0.9, 0.3));
        let placed = place_block(
            &mut store,
            Point3::new(3.5, 2.6, 3.5),
            -Vector3::unit_y(),
            6.0,
            Block::DIRT,
            &player,
        );
        assert_eq!(placed, None);
        assert_eq!(store.get_block(Point3::new(3, 1, 3)), Some(Block::AIR));
    }

    #[test]
    fn placing_into_water_is_refused() {
        let mut store = store();
        assert!(store.update_block(Point3::new(3, 1, 3), Block::WATER));
        let placed = place_block(
            &mut store,
            Point3::new(3.5, 4.5, 3.5),
            -Vector3::unit_y(),
            6.0,
            Block::DIRT,
            &far_box(),
        );
        assert_eq!(placed, None);
    }

    #[test]
    fn out_of_reach_does_nothing() {
        let mut store = store();
        assert_eq!(break_block(&mut store, Point3::new(3.5, 12.5, 3.5), -Vector3::unit_y(), 6.0), None);
    }
}
