//! # Block Module
//!
//! Material tags stored inline in every chunk, plus the per-material rules the
//! mesher, the physics integrator and the renderer consult.
//!
//! ## Material Rules
//!
//! | Block  | transparent | geometry | blocks movement | render pass |
//! |--------|-------------|----------|-----------------|-------------|
//! | AIR    | yes         | no       | no              | -           |
//! | WATER  | yes         | yes      | no              | transparent |
//! | LAVA   | no          | yes      | no              | opaque      |
//! | LEAVES | yes         | yes      | yes             | opaque      |
//! | others | no          | yes      | yes             | opaque      |
//!
//! LAVA does not block movement. Fluids were never given collision, and falling
//! into lava passes straight through it.

use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use block_side::BlockSide;

pub mod block_side;

/// The underlying integer type used to represent blocks in memory.
pub type BlockTypeSize = u8;

/// Number of layers in the block texture array.
pub const TEXTURE_LAYER_COUNT: u32 = 11;

/// Maps each block to its texture layer for each face.
///
/// The outer array is indexed by `Block` as a `usize`.
/// The inner array is in `BlockSide` order: [Front, Back, Bottom, Top, Left, Right]
pub static BLOCK_TO_TEXTURE_LAYERS: [[u32; 6]; 10] = [
    [0, 0, 0, 0, 0, 0],       // AIR (never drawn)
    [0, 0, 0, 0, 0, 0],       // DIRT
    [2, 2, 0, 1, 2, 2],       // GRASS (top: 1, bottom: dirt, sides: 2)
    [3, 3, 3, 3, 3, 3],       // STONE
    [4, 4, 4, 4, 4, 4],       // LAVA
    [5, 5, 5, 5, 5, 5],       // WATER
    [6, 6, 7, 7, 6, 6],       // WOOD (rings on top and bottom)
    [8, 8, 8, 8, 8, 8],       // SAND
    [9, 9, 9, 9, 9, 9],       // LEAVES
    [10, 10, 10, 10, 10, 10], // PLANKS
];

/// A single voxel material.
///
/// Stored as one byte per cell. `FromPrimitive` converts raw bytes back into materials.
#[repr(u8)]
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, FromPrimitive, Serialize, Deserialize,
)]
pub enum Block {
    /// Empty space. No geometry, no collision.
    #[default]
    AIR = 0,
    /// Dirt, found below the surface.
    DIRT = 1,
    /// Grass-topped dirt, the usual surface block.
    GRASS = 2,
    /// Stone, everything below the dirt layer.
    STONE = 3,
    /// Lava. Drawn opaque, but does not block movement.
    LAVA = 4,
    /// Water, drawn in the transparent pass.
    WATER = 5,
    /// Tree trunks.
    WOOD = 6,
    /// Beach and shallow sea floor.
    SAND = 7,
    /// Tree canopy. Solid, but its neighbors still show their faces.
    LEAVES = 8,
    /// Crafted planks, only ever placed by the player.
    PLANKS = 9,
}

impl Block {
    /// Every material, in discriminant order.
    pub const ALL: [Block; 10] = [
        Block::AIR,
        Block::DIRT,
        Block::GRASS,
        Block::STONE,
        Block::LAVA,
        Block::WATER,
        Block::WOOD,
        Block::SAND,
        Block::LEAVES,
        Block::PLANKS,
    ];

    /// Materials the player can cycle through for placement.
    pub const PLACEABLE: [Block; 7] = [
        Block::DIRT,
        Block::GRASS,
        Block::STONE,
        Block::WOOD,
        Block::SAND,
        Block::LEAVES,
        Block::PLANKS,
    ];

    /// Converts a raw byte to a block.
    ///
    /// # Returns
    /// `None` if the byte is not a known material
    pub fn from_raw(value: BlockTypeSize) -> Option<Self> {
        num_traits::FromPrimitive::from_u8(value)
    }

    /// Whether faces of neighboring blocks are visible through this one.
    pub fn is_transparent(self) -> bool {
        matches!(self, Block::AIR | Block::WATER | Block::LEAVES)
    }

    /// Whether this block produces faces at all.
    pub fn has_geometry(self) -> bool {
        self != Block::AIR
    }

    /// Whether an entity's bounding box may not overlap this block.
    pub fn blocks_movement(self) -> bool {
        !matches!(self, Block::AIR | Block::WATER | Block::LAVA)
    }

    /// Whether this block is a fluid a ray passes through.
    pub fn is_fluid(self) -> bool {
        matches!(self, Block::WATER | Block::LAVA)
    }

    /// Whether faces of this block are drawn in the blended pass.
    pub fn is_translucent(self) -> bool {
        self == Block::WATER
    }

    /// Texture array layer for one face of this block.
    pub fn texture_layer(self, side: BlockSide) -> u32 {
        BLOCK_TO_TEXTURE_LAYERS[self as usize][side as usize]
    }

    /// The placeable material after this one, wrapping around.
    pub fn next_placeable(self) -> Block {
        let position = Self::PLACEABLE.iter().position(|block| *block == self);
        match position {
            Some(index) => Self::PLACEABLE[(index + 1) % Self::PLACEABLE.len()],
            None => Self::PLACEABLE[0],
        }
    }
}
