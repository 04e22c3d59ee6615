//! Chunk face lists and the CPU face extraction that produces them.
//!
//! A face of a block is visible when the block has geometry and the neighbor in
//! that direction is transparent and a different material. The second condition
//! hides the internal faces of a body of water while keeping the faces between
//! water and air or leaves.

use crate::engine_state::voxels::block::{block_side::BlockSide, Block};

use super::{face::PackedFace, padded_volume::PaddedVolume};

/// The visible faces of a chunk, opaque faces first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkMesh {
    faces: Vec<PackedFace>,
    opaque_count: usize,
}

impl ChunkMesh {
    /// Creates a mesh from separate opaque and transparent lists.
    pub fn from_parts(mut opaque: Vec<PackedFace>, transparent: Vec<PackedFace>) -> Self {
        let opaque_count = opaque.len();
        opaque.extend(transparent);
        Self {
            faces: opaque,
            opaque_count,
        }
    }

    /// Every face, opaque faces first.
    pub fn faces(&self) -> &[PackedFace] {
        &self.faces
    }

    /// Faces drawn in the opaque pass.
    pub fn opaque(&self) -> &[PackedFace] {
        &self.faces[..self.opaque_count]
    }

    /// Faces drawn in the blended pass.
    pub fn transparent(&self) -> &[PackedFace] {
        &self.faces[self.opaque_count..]
    }

    /// Total number of faces.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` if the opaque pass has anything to draw.
    pub fn has_opaque(&self) -> bool {
        self.opaque_count > 0
    }

    /// Returns `true` if the blended pass has anything to draw.
    pub fn has_transparent(&self) -> bool {
        self.faces.len() > self.opaque_count
    }
}

/// Whether the face of `block` towards `neighbor` is visible.
pub fn is_face_visible(block: Block, neighbor: Block) -> bool {
    block.has_geometry() && neighbor.is_transparent() && neighbor != block
}

/// Extracts every visible face of the chunk in `volume`.
///
/// Faces are emitted in block index order (x fastest, then y, then z) and, per block,
/// in `BlockSide` order, so the output is a pure function of the volume.
pub fn extract_faces(volume: &PaddedVolume) -> ChunkMesh {
    let mut opaque = Vec::new();
    let mut transparent = Vec::new();

    for z in 0..volume.size() as i32 {
        for y in 0..volume.height() as i32 {
            for x in 0..volume.size() as i32 {
                let block = volume.get(x, y, z);
                if !block.has_geometry() {
                    continue;
                }

                for side in BlockSide::all() {
                    let normal = side.normal();
                    let neighbor = volume.get(x + normal.x, y + normal.y, z + normal.z);
                    if !is_face_visible(block, neighbor) {
                        continue;
                    }

                    let face = PackedFace::new(x as u32, y as u32, z as u32, side, block);
                    if block.is_translucent() {
                        transparent.push(face);
                    } else {
                        opaque.push(face);
                    }
                }
            }
        }
    }

    ChunkMesh::from_parts(opaque, transparent)
}
