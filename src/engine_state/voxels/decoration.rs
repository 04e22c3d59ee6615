//! # Decoration
//!
//! The second generation step, run once a chunk has all four neighbors linked:
//!
//! * **Water** fills air from just above the terrain surface up to sea level.
//! * **Trees** grow on grass columns high enough above the beach. Each column rolls
//!   its own generator seeded from the world seed and the column's world position,
//!   so a tree exists or not regardless of the order chunks are decorated in.
//!
//! A canopy may reach into a neighbor chunk across one border, never across a
//! corner: columns close to both an x edge and a z edge of their chunk grow nothing.
//! Trunks overwrite air and leaves, leaves fill only air. Both rules commute, so
//! overlapping trees come out the same in any order.

use cgmath::Point3;

use crate::engine_state::config::WorldConfig;

use super::{
    block::Block,
    chunk::{Chunk, ChunkCoord},
    noise_field::column_seed,
    world::ChunkStore,
};

/// Shortest trunk.
pub const MIN_TRUNK_HEIGHT: u32 = 4;
/// Tallest trunk.
pub const MAX_TRUNK_HEIGHT: u32 = 6;
/// Horizontal reach of the widest canopy layer.
pub const CANOPY_RADIUS: i32 = 2;
/// Smallest chunk size that can hold a canopy reaching at most one border.
pub const MIN_TREE_CHUNK_SIZE: u32 = 8;

/// Places trees and the water plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decorator {
    /// World seed
    pub seed: u32,
    /// Water fills up to and including this level
    pub sea_level: i32,
    /// Grass this close above sea level grows nothing
    pub beach_band: i32,
    /// Chance per eligible column of starting a tree
    pub tree_density: f64,
    /// Whether trees are placed
    pub trees: bool,
    /// Whether water is placed
    pub water: bool,
}

/// One tree, in world block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tree {
    /// Column of the trunk
    pub x: i32,
    /// Column of the trunk
    pub z: i32,
    /// Terrain surface the trunk stands on
    pub ground: i32,
    /// Number of wood blocks
    pub trunk_height: u32,
}

impl Tree {
    /// Every block of the tree, trunk first.
    pub fn blocks(&self) -> Vec<(Point3<i32>, Block)> {
        let mut blocks = Vec::new();
        let top = self.ground + self.trunk_height as i32;

        for y in self.ground + 1..=top {
            blocks.push((Point3::new(self.x, y, self.z), Block::WOOD));
        }

        for y in top - 1..=top + 2 {
            let radius = if y <= top { CANOPY_RADIUS } else { 1 };
            for dz in -radius..=radius {
                for dx in -radius..=radius {
                    let corner = dx.abs() == radius && dz.abs() == radius;
                    let trunk = dx == 0 && dz == 0 && y <= top;
                    if corner || trunk {
                        continue;
                    }
                    blocks.push((Point3::new(self.x + dx, y, self.z + dz), Block::LEAVES));
                }
            }
        }

        blocks
    }

    /// Highest level any block of the tree reaches.
    pub fn top(&self) -> i32 {
        self.ground + self.trunk_height as i32 + 2
    }
}

impl Decorator {
    /// Reads the decoration settings from a world configuration.
    pub fn from_config(seed: u32, config: &WorldConfig) -> Self {
        Self {
            seed,
            sea_level: config.sea_level,
            beach_band: config.beach_band,
            tree_density: config.tree_density,
            trees: config.trees,
            water: config.water,
        }
    }

    /// Whether decoration does anything at all.
    pub fn is_enabled(&self) -> bool {
        self.trees || self.water
    }

    /// Decorates the chunk at `coord` and marks it decorated.
    ///
    /// # Returns
    /// Every chunk whose blocks changed, including neighbors reached by canopies
    pub fn decorate(&self, store: &mut ChunkStore, coord: ChunkCoord) -> Vec<ChunkCoord> {
        let mut touched = Vec::new();
        if self.water && self.fill_water(store, coord) {
            touched.push(coord);
        }
        if self.trees {
            for changed in self.place_trees(store, coord, None) {
                if !touched.contains(&changed) {
                    touched.push(changed);
                }
            }
        }
        if let Some(chunk) = store.chunk_at_mut(coord) {
            chunk.mark_decorated();
        }
        touched
    }

    /// Replays the trees of `source` into `target` only.
    ///
    /// Used when `target` is generated next to an already decorated chunk whose
    /// canopies reached across the shared border before `target` was loaded.
    ///
    /// # Returns
    /// `true` if `target` changed
    pub fn spill_trees(&self, store: &mut ChunkStore, source: ChunkCoord, target: ChunkCoord) -> bool {
        if !self.trees {
            return false;
        }
        !self.place_trees(store, source, Some(target)).is_empty()
    }

    fn fill_water(&self, store: &mut ChunkStore, coord: ChunkCoord) -> bool {
        let Some(chunk) = store.chunk_at_mut(coord) else {
            return false;
        };

        let size = chunk.dimensions().size() as i32;
        let top = self.sea_level.min(chunk.dimensions().height() as i32 - 1);
        let mut changed = false;
        for z in 0..size {
            for x in 0..size {
                let ground = terrain_surface(chunk, x, z).unwrap_or(-1);
                for y in ground + 1..=top {
                    if chunk.get_block_at(x, y, z) == Block::AIR {
                        changed |= chunk.set_block_at(x, y, z, Block::WATER);
                    }
                }
            }
        }
        changed
    }

    /// Trees rooted in the chunk at `coord`.
    pub fn trees_for(&self, chunk: &Chunk) -> Vec<Tree> {
        let dims = chunk.dimensions();
        if dims.size() < MIN_TREE_CHUNK_SIZE {
            return Vec::new();
        }

        let size = dims.size() as i32;
        let near_edge = |v: i32| v < CANOPY_RADIUS || v >= size - CANOPY_RADIUS;
        let mut trees = Vec::new();

        for z in 0..size {
            for x in 0..size {
                if near_edge(x) && near_edge(z) {
                    continue;
                }
                let Some(ground) = terrain_surface(chunk, x, z) else {
                    continue;
                };
                if chunk.get_block_at(x, ground, z) != Block::GRASS
                    || ground <= self.sea_level + self.beach_band
                {
                    continue;
                }

                let world = dims.local_to_world(chunk.coord(), Point3::new(x, ground, z));
                let mut rng = fastrand::Rng::with_seed(column_seed(self.seed, world.x, world.z));
                if rng.f64() >= self.tree_density {
                    continue;
                }

                let tree = Tree {
                    x: world.x,
                    z: world.z,
                    ground,
                    trunk_height: rng.u32(MIN_TRUNK_HEIGHT..=MAX_TRUNK_HEIGHT),
                };
                if tree.top() < dims.height() as i32 {
                    trees.push(tree);
                }
            }
        }

        trees
    }

    fn place_trees(
        &self,
        store: &mut ChunkStore,
        source: ChunkCoord,
        only: Option<ChunkCoord>,
    ) -> Vec<ChunkCoord> {
        let Some(chunk) = store.chunk_at(source) else {
            return Vec::new();
        };
        let trees = self.trees_for(chunk);
        let dims = store.dimensions();

        let mut touched = Vec::new();
        for tree in trees {
            for (position, block) in tree.blocks() {
                let owner = dims.world_to_chunk(position);
                if only.is_some_and(|target| target != owner) {
                    continue;
                }
                let Some(current) = store.get_block(position) else {
                    continue;
                };
                let replace = match block {
                    Block::WOOD => current == Block::AIR || current == Block::LEAVES,
                    _ => current == Block::AIR,
                };
                if replace && store.write_block(position, block).is_some() && !touched.contains(&owner) {
                    touched.push(owner);
                }
            }
        }
        touched
    }
}

/// Highest terrain block of a column, ignoring water and trees.
pub fn terrain_surface(chunk: &Chunk, x: i32, z: i32) -> Option<i32> {
    (0..chunk.dimensions().height() as i32).rev().find(|y| {
        matches!(
            chunk.get_block_at(x, *y, z),
            Block::GRASS | Block::DIRT | Block::SAND | Block::STONE
        )
    })
}

#[cfg(test)]
mod tests {
    use cgmath::Point2;

    use super::*;
    use crate::engine_state::voxels::chunk::ChunkDimensions;

    fn decorator() -> Decorator {
        Decorator {
            seed: 11,
            sea_level: 10,
            beach_band: 2,
            tree_density: 1.0,
            trees: true,
            water: true,
        }
    }

    fn flat_chunk(coord: ChunkCoord, ground: i32, top: Block) -> Chunk {
        let mut chunk = Chunk::new(coord, ChunkDimensions::new(16, 64).unwrap());
        for z in 0..16 {
            for x in 0..16 {
                for y in 0..ground {
                    chunk.set_block_at(x, y, z, Block::DIRT);
                }
                chunk.set_block_at(x, ground, z, top);
            }
        }
        chunk
    }

    #[test]
    fn canopy_skips_corners_and_the_trunk() {
        let tree = Tree {
            x: 0,
            z: 0,
            ground: 20,
            trunk_height: 4,
        };
        let blocks = tree.blocks();
        let wood = blocks.iter().filter(|(_, b)| *b == Block::WOOD).count();
        let leaves = blocks.iter().filter(|(_, b)| *b == Block::LEAVES).count();
        assert_eq!(wood, 4);
        // Two layers of 5x5 minus corners and trunk, two layers of 3x3 minus corners.
        assert_eq!(leaves, 2 * (25 - 4 - 1) + 2 * (9 - 4));
        assert!(blocks
            .iter()
            .all(|(p, _)| (p.x.abs() < 2 || p.z.abs() < 2) && p.y > 20 && p.y <= tree.top()));
    }

    #[test]
    fn no_trees_near_a_corner_or_on_beaches() {
        let dec = decorator();
        let chunk = flat_chunk(Point2::new(0, 0), 30, Block::GRASS);
        let trees = dec.trees_for(&chunk);
        assert_eq!(trees.len(), 16 * 16 - 4 * 4);
        assert!(trees
            .iter()
            .all(|t| (2..14).contains(&t.x) || (2..14).contains(&t.z)));
        assert!(trees
            .iter()
            .all(|t| (MIN_TRUNK_HEIGHT..=MAX_TRUNK_HEIGHT).contains(&t.trunk_height)));

        let beach = flat_chunk(Point2::new(0, 0), 12, Block::GRASS);
        assert!(dec.trees_for(&beach).is_empty());
        let sand = flat_chunk(Point2::new(0, 0), 30, Block::SAND);
        assert!(dec.trees_for(&sand).is_empty());
    }

    #[test]
    fn tree_rolls_depend_only_on_the_column() {
        let dec = Decorator {
            tree_density: 0.3,
            ..decorator()
        };
        let chunk = flat_chunk(Point2::new(3, -2), 30, Block::GRASS);
        assert_eq!(dec.trees_for(&chunk), dec.trees_for(&chunk));

        let other_seed = Decorator { seed: 12, ..dec };
        assert_ne!(dec.trees_for(&chunk), other_seed.trees_for(&chunk));
    }

    #[test]
    fn terrain_surface_ignores_trees_and_water() {
        let mut chunk = flat_chunk(Point2::new(0, 0), 5, Block::GRASS);
        chunk.set_block_at(3, 6, 3, Block::WOOD);
        chunk.set_block_at(3, 9, 3, Block::LEAVES);
        chunk.set_block_at(4, 6, 4, Block::WATER);
        assert_eq!(terrain_surface(&chunk, 3, 3), Some(5));
        assert_eq!(terrain_surface(&chunk, 4, 4), Some(5));
    }
}
