//! # Terrain Generation
//!
//! Fills a chunk from a precomputed heightfield. Each column reads one noise sample,
//! turns it into a surface height and classifies every level of the column:
//!
//! | level                         | block                       |
//! |-------------------------------|-----------------------------|
//! | above the surface             | AIR                         |
//! | the surface                   | GRASS, or SAND on beaches   |
//! | up to `dirt_depth` below it   | DIRT, or SAND on beaches    |
//! | deeper                        | STONE                       |
//!
//! A beach is any column whose surface is at most `beach_band` above sea level,
//! which includes the whole sea floor.

use crate::engine_state::config::WorldConfig;
use crate::engine_state::voxels::block::Block;

use super::{Chunk, ChunkState};

/// Parameters that turn a noise sample into a column of blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainParams {
    /// Water fills air up to and including this level
    pub sea_level: i32,
    /// Surface height for a noise value of zero
    pub base_height: f32,
    /// Height change per unit of noise
    pub height_amplitude: f32,
    /// Surfaces this close above sea level are sand
    pub beach_band: i32,
    /// Thickness of the dirt layer below the surface
    pub dirt_depth: i32,
}

impl TerrainParams {
    /// Reads the terrain shape from a world configuration.
    pub fn from_config(config: &WorldConfig) -> Self {
        Self {
            sea_level: config.sea_level,
            base_height: config.base_height,
            height_amplitude: config.height_amplitude,
            beach_band: config.beach_band,
            dirt_depth: config.dirt_depth,
        }
    }

    /// Surface height for a noise sample, clamped to the column.
    pub fn surface_height(&self, sample: f32, chunk_height: u32) -> i32 {
        let height = (self.base_height + sample * self.height_amplitude).round() as i32;
        height.clamp(0, chunk_height as i32 - 1)
    }

    /// Whether a column with this surface height is a beach.
    pub fn is_beach(&self, surface: i32) -> bool {
        surface <= self.sea_level + self.beach_band
    }

    /// Block at level `y` of a column whose surface is at `surface`.
    pub fn classify(&self, y: i32, surface: i32) -> Block {
        let beach = self.is_beach(surface);
        if y > surface {
            Block::AIR
        } else if y == surface {
            if beach {
                Block::SAND
            } else {
                Block::GRASS
            }
        } else if y >= surface - self.dirt_depth {
            if beach {
                Block::SAND
            } else {
                Block::DIRT
            }
        } else {
            Block::STONE
        }
    }
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self::from_config(&WorldConfig::default())
    }
}

impl Chunk {
    /// Generates terrain from a rectangular noise buffer.
    ///
    /// # Arguments
    /// * `region` - Row-major noise samples
    /// * `region_width` - Width of a row of `region`
    /// * `offset_x`, `offset_z` - Position of this chunk's first column inside the region
    /// * `terrain` - Height and layering parameters
    ///
    /// # Returns
    /// `true` if the chunk was generated, `false` if it had already left `Empty`
    ///
    /// The region must cover the whole chunk. Missing samples are a caller bug; debug
    /// builds assert, release builds treat them as zero.
    pub fn generate(
        &mut self,
        region: &[f32],
        region_width: usize,
        offset_x: usize,
        offset_z: usize,
        terrain: &TerrainParams,
    ) -> bool {
        if self.state != ChunkState::Empty {
            return false;
        }

        let size = self.dims.size() as usize;
        let height = self.dims.height();
        debug_assert!(offset_x + size <= region_width, "noise region too narrow");
        debug_assert!(
            (offset_z + size) * region_width <= region.len(),
            "noise region too short"
        );

        for z in 0..size {
            for x in 0..size {
                let sample = region
                    .get((offset_z + z) * region_width + (offset_x + x))
                    .copied()
                    .unwrap_or(0.0);
                let surface = terrain.surface_height(sample, height);

                for y in 0..=surface {
                    let index = self.dims.index(x, y as usize, z);
                    self.blocks[index] = terrain.classify(y, surface);
                }
            }
        }

        self.state = ChunkState::Generated;
        true
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point2;

    use super::*;
    use crate::engine_state::voxels::chunk::ChunkDimensions;

    fn params() -> TerrainParams {
        TerrainParams {
            sea_level: 10,
            base_height: 20.0,
            height_amplitude: 10.0,
            beach_band: 2,
            dirt_depth: 3,
        }
    }

    #[test]
    fn columns_are_layered() {
        let terrain = params();
        assert_eq!(terrain.classify(21, 20), Block::AIR);
        assert_eq!(terrain.classify(20, 20), Block::GRASS);
        assert_eq!(terrain.classify(17, 20), Block::DIRT);
        assert_eq!(terrain.classify(16, 20), Block::STONE);

        assert_eq!(terrain.classify(12, 12), Block::SAND);
        assert_eq!(terrain.classify(9, 12), Block::SAND);
        assert_eq!(terrain.classify(8, 12), Block::STONE);
    }

    #[test]
    fn heights_are_clamped_to_the_column() {
        let terrain = params();
        assert_eq!(terrain.surface_height(100.0, 32), 31);
        assert_eq!(terrain.surface_height(-100.0, 32), 0);
        assert_eq!(terrain.surface_height(0.26, 32), 23);
    }

    #[test]
    fn generate_reads_its_slice_of_the_region() {
        let dims = ChunkDimensions::new(4, 32).unwrap();
        let width = 8;
        let mut region = vec![0.0f32; width * width];
        // Column (1, 2) of the chunk at offset (4, 4) is raised.
        region[(4 + 2) * width + (4 + 1)] = 0.5;

        let mut chunk = Chunk::new(Point2::new(1, 1), dims);
        assert!(chunk.generate(&region, width, 4, 4, &params()));
        assert_eq!(chunk.state(), ChunkState::Generated);
        assert_eq!(chunk.highest_solid(1, 2), Some(25));
        assert_eq!(chunk.highest_solid(0, 0), Some(20));
        assert_eq!(chunk.get_block_at(1, 25, 2), Block::GRASS);
    }

    #[test]
    fn generate_runs_once() {
        let dims = ChunkDimensions::new(4, 32).unwrap();
        let mut chunk = Chunk::new(Point2::new(0, 0), dims);
        let flat = vec![0.0f32; 16];
        let high = vec![1.0f32; 16];

        assert!(chunk.generate(&flat, 4, 0, 0, &params()));
        assert!(!chunk.generate(&high, 4, 0, 0, &params()));
        assert_eq!(chunk.highest_solid(0, 0), Some(20));
    }
}
