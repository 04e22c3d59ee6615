use crate::engine_state::voxels::block::{block_side::BlockSide, Block};

/// Bit offset of the local x coordinate in [`PackedFace::word`].
pub const FACE_X_SHIFT: u32 = 0;
/// Bit offset of the local z coordinate.
pub const FACE_Z_SHIFT: u32 = 6;
/// Bit offset of the local y coordinate.
pub const FACE_Y_SHIFT: u32 = 12;
/// Bit offset of the orientation id.
pub const FACE_SIDE_SHIFT: u32 = 21;
/// Bit offset of the material id.
pub const FACE_MATERIAL_SHIFT: u32 = 24;

const FACE_XZ_MASK: u32 = 0x3f;
const FACE_Y_MASK: u32 = 0x1ff;
const FACE_SIDE_MASK: u32 = 0x7;
const FACE_MATERIAL_MASK: u32 = 0xff;

/// A single visible block face as the GPU reads it.
///
/// # Memory Layout
/// - `word`: x (6 bits) | z (6 bits) | y (9 bits) | side (3 bits) | material (8 bits)
/// - `texture`: texture array layer
///
/// Total size: 8 bytes. The chunk shaders expand each record into two triangles,
/// and the compute mesher writes records in exactly this layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedFace {
    /// Position, orientation and material bits
    pub word: u32,
    /// Texture array layer
    pub texture: u32,
}

impl PackedFace {
    /// Packs a face of the block at a chunk-local position.
    ///
    /// # Arguments
    /// * `x`, `y`, `z` - Local block coordinates
    /// * `side` - The face of the block
    /// * `block` - The block's material
    ///
    /// # Returns
    /// The packed record, with the texture layer looked up from the material
    pub fn new(x: u32, y: u32, z: u32, side: BlockSide, block: Block) -> Self {
        let word = ((x & FACE_XZ_MASK) << FACE_X_SHIFT)
            | ((z & FACE_XZ_MASK) << FACE_Z_SHIFT)
            | ((y & FACE_Y_MASK) << FACE_Y_SHIFT)
            | ((side as u32 & FACE_SIDE_MASK) << FACE_SIDE_SHIFT)
            | ((block as u32 & FACE_MATERIAL_MASK) << FACE_MATERIAL_SHIFT);

        PackedFace {
            word,
            texture: block.texture_layer(side),
        }
    }

    /// Local (x, y, z) position of the block the face belongs to.
    pub fn position(&self) -> (u32, u32, u32) {
        (
            (self.word >> FACE_X_SHIFT) & FACE_XZ_MASK,
            (self.word >> FACE_Y_SHIFT) & FACE_Y_MASK,
            (self.word >> FACE_Z_SHIFT) & FACE_XZ_MASK,
        )
    }

    /// Which side of the block this face is.
    pub fn side(&self) -> Option<BlockSide> {
        BlockSide::from_id((self.word >> FACE_SIDE_SHIFT) & FACE_SIDE_MASK)
    }

    /// Material of the block the face belongs to.
    pub fn block(&self) -> Option<Block> {
        Block::from_raw(((self.word >> FACE_MATERIAL_SHIFT) & FACE_MATERIAL_MASK) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_survive_packing_at_their_limits() {
        let face = PackedFace::new(63, 511, 62, BlockSide::RIGHT, Block::PLANKS);
        assert_eq!(face.position(), (63, 511, 62));
        assert_eq!(face.side(), Some(BlockSide::RIGHT));
        assert_eq!(face.block(), Some(Block::PLANKS));
        assert_eq!(face.texture, Block::PLANKS.texture_layer(BlockSide::RIGHT));
    }

    #[test]
    fn record_is_two_words() {
        assert_eq!(std::mem::size_of::<PackedFace>(), 8);
    }
}
