use crate::engine_state::voxels::{
    block::Block,
    chunk::{Chunk, ChunkNeighbor},
};

/// A chunk's blocks surrounded by a one-block border read from its neighbors.
///
/// The mesher only ever looks one block along an axis, so the border holds exactly
/// what a face test can reach:
/// - x = -1 / x = size come from the linked left / right neighbor
/// - z = -1 / z = size come from the linked back / front neighbor
/// - y = -1 is stone, so the bottom of the world never shows faces
/// - y = height is air
///
/// Border cells with no linked neighbor are air. Border corners are never read and
/// stay air. Both meshing strategies consume this volume, which is what keeps their
/// output identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedVolume {
    size: usize,
    height: usize,
    blocks: Vec<Block>,
}

impl PaddedVolume {
    /// Builds the padded volume for `center`.
    ///
    /// # Arguments
    /// * `center` - The chunk being meshed
    /// * `neighbors` - Linked neighbors, indexed by `ChunkNeighbor`
    pub fn from_chunks(center: &Chunk, neighbors: [Option<&Chunk>; 4]) -> Self {
        let dims = center.dimensions();
        let size = dims.size() as usize;
        let height = dims.height() as usize;
        let padded_size = size + 2;
        let padded_height = height + 2;

        let mut volume = Self {
            size,
            height,
            blocks: vec![Block::AIR; padded_size * padded_height * padded_size],
        };

        for pz in 0..padded_size {
            for px in 0..padded_size {
                let index = volume.padded_index(px, 0, pz);
                volume.blocks[index] = Block::STONE;
            }
        }

        for y in 0..height {
            let py = y + 1;
            for z in 0..size {
                for x in 0..size {
                    let index = volume.padded_index(x + 1, py, z + 1);
                    volume.blocks[index] = center.get_block_at(x as i32, y as i32, z as i32);
                }
            }

            let last = size as i32 - 1;
            for i in 0..size {
                let edges = [
                    (ChunkNeighbor::LEFT, (0, i + 1), (last, i as i32)),
                    (ChunkNeighbor::RIGHT, (size + 1, i + 1), (0, i as i32)),
                    (ChunkNeighbor::BACK, (i + 1, 0), (i as i32, last)),
                    (ChunkNeighbor::FRONT, (i + 1, size + 1), (i as i32, 0)),
                ];
                for (neighbor, (px, pz), (nx, nz)) in edges {
                    if let Some(chunk) = neighbors[neighbor as usize] {
                        let index = volume.padded_index(px, py, pz);
                        volume.blocks[index] = chunk.get_block_at(nx, y as i32, nz);
                    }
                }
            }
        }

        volume
    }

    /// Horizontal size of the unpadded chunk.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Height of the unpadded chunk.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Index into the padded array for padded coordinates.
    fn padded_index(&self, px: usize, py: usize, pz: usize) -> usize {
        let padded_size = self.size + 2;
        px + py * padded_size + pz * padded_size * (self.height + 2)
    }

    /// Block at a chunk-local coordinate, where each axis may reach one past the chunk.
    ///
    /// # Returns
    /// The block, or `AIR` for coordinates beyond the border
    pub fn get(&self, x: i32, y: i32, z: i32) -> Block {
        let (px, py, pz) = (x + 1, y + 1, z + 1);
        let padded_size = self.size as i32 + 2;
        let padded_height = self.height as i32 + 2;
        if !(0..padded_size).contains(&px)
            || !(0..padded_height).contains(&py)
            || !(0..padded_size).contains(&pz)
        {
            return Block::AIR;
        }
        self.blocks[self.padded_index(px as usize, py as usize, pz as usize)]
    }

    /// The padded volume as one `u32` per cell, in padded index order.
    ///
    /// This is the layout the compute mesher reads.
    pub fn to_gpu_words(&self) -> Vec<u32> {
        self.blocks.iter().map(|block| *block as u32).collect()
    }

    /// Raw padded cells.
    pub fn cells(&self) -> &[Block] {
        &self.blocks
    }
}
