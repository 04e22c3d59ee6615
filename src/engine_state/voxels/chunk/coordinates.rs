//! # Chunk Coordinates
//!
//! Conversions between world block coordinates, chunk-grid coordinates and
//! chunk-local coordinates.
//!
//! Only X and Z are tiled. A chunk column covers the full height of the world, so a
//! chunk coordinate is a `Point2<i32>` holding (x, z) and the world y coordinate is
//! also the local y coordinate.
//!
//! ## Index Layout
//!
//! Blocks are stored x-fastest, then y, then z:
//!
//! ```text
//! index = x + (y << log2(size)) + (z << (log2(size) + log2(height)))
//! ```
//!
//! Both dimensions are powers of two, so every conversion is a shift or a mask.

use cgmath::{Point2, Point3};

use crate::engine_state::config::{ConfigError, WorldConfig, MAX_CHUNK_HEIGHT, MAX_CHUNK_SIZE};

/// Chunk-grid coordinate: (x, z) in units of chunks.
pub type ChunkCoord = Point2<i32>;

/// The fixed dimensions of every chunk in a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDimensions {
    size: u32,
    height: u32,
    size_shift: u32,
    height_shift: u32,
}

impl ChunkDimensions {
    /// Creates dimensions for `size × height × size` chunks.
    ///
    /// # Arguments
    /// * `size` - Horizontal edge length in blocks
    /// * `height` - Column height in blocks
    ///
    /// # Returns
    /// The dimensions, or a `ConfigError` if either value is not a power of two or
    /// exceeds what a packed face can address
    pub fn new(size: u32, height: u32) -> Result<Self, ConfigError> {
        if !size.is_power_of_two() {
            return Err(ConfigError::NonPowerOfTwo {
                field: "world.chunk_size",
                value: size,
            });
        }
        if !height.is_power_of_two() {
            return Err(ConfigError::NonPowerOfTwo {
                field: "world.chunk_height",
                value: height,
            });
        }
        if size > MAX_CHUNK_SIZE {
            return Err(ConfigError::OutOfRange {
                field: "world.chunk_size",
                value: size as f64,
                min: 1.0,
                max: MAX_CHUNK_SIZE as f64,
            });
        }
        if height > MAX_CHUNK_HEIGHT {
            return Err(ConfigError::OutOfRange {
                field: "world.chunk_height",
                value: height as f64,
                min: 1.0,
                max: MAX_CHUNK_HEIGHT as f64,
            });
        }

        Ok(Self {
            size,
            height,
            size_shift: size.trailing_zeros(),
            height_shift: height.trailing_zeros(),
        })
    }

    /// Dimensions described by a world configuration.
    pub fn from_config(config: &WorldConfig) -> Result<Self, ConfigError> {
        Self::new(config.chunk_size, config.chunk_height)
    }

    /// Horizontal edge length in blocks.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Column height in blocks.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of blocks in a chunk.
    pub fn volume(&self) -> usize {
        (self.size as usize) * (self.size as usize) * (self.height as usize)
    }

    /// Returns `true` if the local coordinate lies inside the chunk.
    pub fn contains_local(&self, x: i32, y: i32, z: i32) -> bool {
        let size = self.size as i32;
        (0..size).contains(&x) && (0..self.height as i32).contains(&y) && (0..size).contains(&z)
    }

    /// Linear index of a local coordinate.
    ///
    /// Only defined for coordinates accepted by [`contains_local`](Self::contains_local).
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + (y << self.size_shift) + (z << (self.size_shift + self.height_shift))
    }

    /// Inverse of [`index`](Self::index).
    pub fn delinearize(&self, index: usize) -> (usize, usize, usize) {
        let x = index & (self.size as usize - 1);
        let y = (index >> self.size_shift) & (self.height as usize - 1);
        let z = index >> (self.size_shift + self.height_shift);
        (x, y, z)
    }

    /// Chunk containing a world block coordinate.
    ///
    /// Uses an arithmetic shift, which floors, so `-1` maps to chunk `-1`.
    pub fn world_to_chunk(&self, world: Point3<i32>) -> ChunkCoord {
        Point2::new(world.x >> self.size_shift, world.z >> self.size_shift)
    }

    /// Chunk containing a continuous world position.
    pub fn world_pos_to_chunk(&self, position: Point3<f32>) -> ChunkCoord {
        self.world_to_chunk(Self::block_containing(position))
    }

    /// Position of a world block coordinate inside its chunk.
    ///
    /// The x and z components are always in `[0, size)`; y passes through.
    pub fn world_to_local(&self, world: Point3<i32>) -> Point3<i32> {
        let mask = self.size as i32 - 1;
        Point3::new(world.x & mask, world.y, world.z & mask)
    }

    /// World block coordinate of a chunk's minimum corner (at y = 0).
    pub fn chunk_to_world(&self, coord: ChunkCoord) -> Point3<i32> {
        Point3::new(coord.x << self.size_shift, 0, coord.y << self.size_shift)
    }

    /// World block coordinate of a local coordinate inside `coord`.
    pub fn local_to_world(&self, coord: ChunkCoord, local: Point3<i32>) -> Point3<i32> {
        let origin = self.chunk_to_world(coord);
        Point3::new(origin.x + local.x, local.y, origin.z + local.z)
    }

    /// Integer block coordinate that contains a continuous world position.
    pub fn block_containing(position: Point3<f32>) -> Point3<i32> {
        Point3::new(
            position.x.floor() as i32,
            position.y.floor() as i32,
            position.z.floor() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> ChunkDimensions {
        ChunkDimensions::new(16, 64).unwrap()
    }

    #[test]
    fn rejects_non_power_of_two() {
        assert!(matches!(
            ChunkDimensions::new(12, 64),
            Err(ConfigError::NonPowerOfTwo { field: "world.chunk_size", value: 12 })
        ));
        assert!(matches!(
            ChunkDimensions::new(16, 100),
            Err(ConfigError::NonPowerOfTwo { field: "world.chunk_height", .. })
        ));
    }

    #[test]
    fn negative_world_coordinates_floor() {
        let dims = dims();
        assert_eq!(dims.world_to_chunk(Point3::new(-1, 5, -16)), Point2::new(-1, -1));
        assert_eq!(dims.world_to_chunk(Point3::new(-17, 5, 15)), Point2::new(-2, 0));
        assert_eq!(dims.world_to_local(Point3::new(-1, 5, -16)), Point3::new(15, 5, 0));
        assert_eq!(
            dims.world_pos_to_chunk(Point3::new(-0.25, 3.0, 15.99)),
            Point2::new(-1, 0)
        );
    }

    #[test]
    fn index_is_x_fastest_then_y_then_z() {
        let dims = dims();
        assert_eq!(dims.index(1, 0, 0), 1);
        assert_eq!(dims.index(0, 1, 0), 16);
        assert_eq!(dims.index(0, 0, 1), 16 * 64);
        assert_eq!(dims.delinearize(dims.index(3, 40, 9)), (3, 40, 9));
        assert_eq!(dims.volume(), 16 * 16 * 64);
    }
}
