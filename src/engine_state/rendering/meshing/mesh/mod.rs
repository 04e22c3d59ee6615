//! Face extraction for voxel chunks.
//!
//! This module turns block data into the packed face records the chunk shaders
//! draw. Each visible block face becomes one 8-byte [`PackedFace`]; the vertex
//! shader expands it into two triangles, so no vertex or index buffers exist.
//!
//! # Architecture
//! - [`PaddedVolume`]: a chunk's blocks plus a one-block border from its neighbors
//! - [`extract_faces`]: the CPU visibility test over a padded volume
//! - [`ChunkMesh`]: the resulting face list, opaque faces first
//!
//! # Usage
//! ```no_run
//! use voxel_world::engine_state::{
//!     rendering::meshing::{extract_faces, PaddedVolume},
//!     voxels::chunk::{Chunk, ChunkDimensions},
//! };
//! use cgmath::Point2;
//!
//! let dims = ChunkDimensions::new(16, 64).unwrap();
//! let chunk = Chunk::new(Point2::new(0, 0), dims);
//! let mesh = extract_faces(&PaddedVolume::from_chunks(&chunk, [None; 4]));
//! assert_eq!(mesh.face_count(), 0);
//! ```

mod face;
mod mesh;
mod padded_volume;

pub use face::*;
pub use mesh::*;
pub use padded_volume::PaddedVolume;

#[cfg(test)]
mod tests {
    use cgmath::Point2;

    use super::*;
    use crate::engine_state::voxels::{
        block::{block_side::BlockSide, Block},
        chunk::{Chunk, ChunkDimensions, ChunkNeighbor},
    };

    fn empty_chunk(x: i32, z: i32) -> Chunk {
        Chunk::new(Point2::new(x, z), ChunkDimensions::new(8, 16).unwrap())
    }

    fn mesh_alone(chunk: &Chunk) -> ChunkMesh {
        extract_faces(&PaddedVolume::from_chunks(chunk, [None; 4]))
    }

    #[test]
    fn isolated_block_has_six_faces() {
        let mut chunk = empty_chunk(0, 0);
        chunk.set_block_at(3, 5, 4, Block::STONE);

        let mesh = mesh_alone(&chunk);
        assert_eq!(mesh.face_count(), 6);
        assert!(mesh.has_opaque());
        assert!(!mesh.has_transparent());

        let mut sides: Vec<usize> = mesh
            .faces()
            .iter()
            .map(|face| face.side().unwrap() as usize)
            .collect();
        sides.sort_unstable();
        assert_eq!(sides, vec![0, 1, 2, 3, 4, 5]);
        assert!(mesh.faces().iter().all(|face| face.position() == (3, 5, 4)));
    }

    #[test]
    fn bottom_of_world_is_closed() {
        let mut chunk = empty_chunk(0, 0);
        chunk.set_block_at(0, 0, 0, Block::DIRT);

        let mesh = mesh_alone(&chunk);
        assert_eq!(mesh.face_count(), 5);
        assert!(mesh
            .faces()
            .iter()
            .all(|face| face.side() != Some(BlockSide::BOTTOM)));
    }

    #[test]
    fn adjacent_water_hides_shared_face() {
        let mut chunk = empty_chunk(0, 0);
        chunk.set_block_at(2, 4, 2, Block::WATER);
        chunk.set_block_at(3, 4, 2, Block::WATER);

        let mesh = mesh_alone(&chunk);
        assert!(!mesh.has_opaque());
        assert_eq!(mesh.transparent().len(), 10);
    }

    #[test]
    fn solid_behind_leaves_still_shows() {
        let mut chunk = empty_chunk(0, 0);
        chunk.set_block_at(2, 4, 2, Block::LEAVES);
        chunk.set_block_at(3, 4, 2, Block::STONE);

        let mesh = mesh_alone(&chunk);
        // Leaves lose the face towards stone; stone keeps the face towards leaves.
        assert_eq!(mesh.face_count(), 11);
    }

    #[test]
    fn linked_neighbor_hides_boundary_face() {
        let mut left = empty_chunk(0, 0);
        let mut right = empty_chunk(1, 0);
        left.set_block_at(7, 3, 3, Block::STONE);
        right.set_block_at(0, 3, 3, Block::STONE);

        let alone = mesh_alone(&left);
        let mut neighbors = [None; 4];
        neighbors[ChunkNeighbor::RIGHT as usize] = Some(&right);
        let linked = extract_faces(&PaddedVolume::from_chunks(&left, neighbors));

        assert_eq!(alone.face_count(), 6);
        assert_eq!(linked.face_count(), 5);
        assert!(linked
            .faces()
            .iter()
            .all(|face| face.side() != Some(BlockSide::RIGHT)));
    }

    #[test]
    fn extraction_is_idempotent() {
        let mut chunk = empty_chunk(0, 0);
        for x in 0..8 {
            chunk.set_block_at(x, x, 7 - x, Block::GRASS);
        }
        chunk.set_block_at(4, 9, 4, Block::WATER);

        let volume = PaddedVolume::from_chunks(&chunk, [None; 4]);
        assert_eq!(extract_faces(&volume), extract_faces(&volume));
    }

    #[test]
    fn gpu_words_match_cells() {
        let mut chunk = empty_chunk(0, 0);
        chunk.set_block_at(1, 1, 1, Block::LAVA);
        let volume = PaddedVolume::from_chunks(&chunk, [None; 4]);

        let words = volume.to_gpu_words();
        assert_eq!(words.len(), 10 * 18 * 10);
        assert_eq!(words.iter().filter(|word| **word == Block::LAVA as u32).count(), 1);
        assert_eq!(volume.get(1, 1, 1), Block::LAVA);
        assert_eq!(volume.get(1, -1, 1), Block::STONE);
        assert_eq!(volume.get(1, 16, 1), Block::AIR);
    }
}
