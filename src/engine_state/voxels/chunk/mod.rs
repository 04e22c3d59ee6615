//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a `size × height × size` column of blocks,
//! its derived face list and bounds, its links to the four horizontal neighbors, and
//! the GPU buffers holding its mesh.
//!
//! ## Lifecycle
//!
//! ```text
//! Empty --generate--> Generated --link--> Linked --decorate--> TreesPlaced --mesh--> Meshed
//! ```
//!
//! Linking and decoration are optional for chunks on the edge of the loaded area;
//! those are meshed straight from `Generated` or `Linked` and decorated later, once
//! their last neighbor arrives. A `Meshed` chunk is remeshed in place after edits.
//!
//! ## Storage
//!
//! Blocks are one byte each in a flat vector indexed by
//! [`ChunkDimensions::index`]. Accessors check bounds and log out-of-range access in
//! debug builds, returning `AIR` for reads and ignoring writes.
//!
//! ## Neighbor Links
//!
//! Links are chunk coordinates, not references. The chunk store resolves them through
//! its map and clears them when a neighbor is evicted, so a link can never outlive the
//! chunk it names.

use cgmath::{Point3, Vector2};

use super::{aabb::Aabb, block::Block};
use crate::engine_state::rendering::meshing::{extract_faces, ChunkGpuMesh, ChunkMesh, PaddedVolume};

mod coordinates;
mod generation;

pub use coordinates::{ChunkCoord, ChunkDimensions};
pub use generation::TerrainParams;

/// Generation and meshing progress of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChunkState {
    /// Allocated, every block is air
    Empty,
    /// Terrain written from the heightfield
    Generated,
    /// At least one neighbor link established
    Linked,
    /// Trees and water placed
    TreesPlaced,
    /// Face list up to date with the block data
    Meshed,
}

/// The four horizontal neighbors of a chunk.
///
/// Named after the block faces pointing the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkNeighbor {
    /// Towards negative X
    LEFT = 0,
    /// Towards positive X
    RIGHT = 1,
    /// Towards negative Z
    BACK = 2,
    /// Towards positive Z
    FRONT = 3,
}

impl ChunkNeighbor {
    /// All four directions.
    pub fn all() -> [ChunkNeighbor; 4] {
        [
            ChunkNeighbor::LEFT,
            ChunkNeighbor::RIGHT,
            ChunkNeighbor::BACK,
            ChunkNeighbor::FRONT,
        ]
    }

    /// Chunk-grid offset towards this neighbor.
    pub fn offset(self) -> Vector2<i32> {
        match self {
            ChunkNeighbor::LEFT => Vector2::new(-1, 0),
            ChunkNeighbor::RIGHT => Vector2::new(1, 0),
            ChunkNeighbor::BACK => Vector2::new(0, -1),
            ChunkNeighbor::FRONT => Vector2::new(0, 1),
        }
    }

    /// The direction pointing back.
    pub fn opposite(self) -> ChunkNeighbor {
        match self {
            ChunkNeighbor::LEFT => ChunkNeighbor::RIGHT,
            ChunkNeighbor::RIGHT => ChunkNeighbor::LEFT,
            ChunkNeighbor::BACK => ChunkNeighbor::FRONT,
            ChunkNeighbor::FRONT => ChunkNeighbor::BACK,
        }
    }
}

/// A column of voxel blocks, the unit of generation, meshing and streaming.
pub struct Chunk {
    coord: ChunkCoord,
    dims: ChunkDimensions,
    blocks: Vec<Block>,
    state: ChunkState,
    decorated: bool,
    aabb: Aabb,
    mesh: ChunkMesh,
    neighbors: [Option<ChunkCoord>; 4],
    gpu_mesh: Option<ChunkGpuMesh>,
    needs_upload: bool,
}

impl Chunk {
    /// Creates an empty chunk.
    ///
    /// # Arguments
    /// * `coord` - Chunk-grid coordinate
    /// * `dims` - Dimensions shared by every chunk of the world
    ///
    /// # Returns
    /// A chunk in state `Empty` filled with air, with its bounds already set.
    pub fn new(coord: ChunkCoord, dims: ChunkDimensions) -> Self {
        let origin = dims.chunk_to_world(coord);
        let min = Point3::new(origin.x as f32, 0.0, origin.z as f32);
        let max = Point3::new(
            min.x + dims.size() as f32,
            dims.height() as f32,
            min.z + dims.size() as f32,
        );

        Self {
            coord,
            dims,
            blocks: vec![Block::AIR; dims.volume()],
            state: ChunkState::Empty,
            decorated: false,
            aabb: Aabb::new(min, max),
            mesh: ChunkMesh::default(),
            neighbors: [None; 4],
            gpu_mesh: None,
            needs_upload: false,
        }
    }

    /// Chunk-grid coordinate.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Dimensions of this chunk.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dims
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// World-space bounds.
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// The face list from the last `update_mesh`.
    pub fn mesh(&self) -> &ChunkMesh {
        &self.mesh
    }

    /// Returns `true` if the opaque pass has faces for this chunk.
    pub fn has_opaque_mesh(&self) -> bool {
        self.mesh.has_opaque()
    }

    /// Returns `true` if the blended pass has faces for this chunk.
    pub fn has_transparent_mesh(&self) -> bool {
        self.mesh.has_transparent()
    }

    /// Flat block storage in index order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Whether trees and water have been placed.
    pub fn is_decorated(&self) -> bool {
        self.decorated
    }

    /// Records that decoration ran.
    pub fn mark_decorated(&mut self) {
        self.decorated = true;
        self.state = ChunkState::TreesPlaced;
    }

    /// Gets the block at chunk-local coordinates.
    ///
    /// # Returns
    /// The block, or `AIR` if the coordinates are outside the chunk
    pub fn get_block_at(&self, x: i32, y: i32, z: i32) -> Block {
        if !self.dims.contains_local(x, y, z) {
            if cfg!(debug_assertions) {
                log::warn!(
                    "Block read at ({x}, {y}, {z}) is outside chunk {:?}",
                    self.coord
                );
            }
            return Block::AIR;
        }
        self.blocks[self.dims.index(x as usize, y as usize, z as usize)]
    }

    /// Sets the block at chunk-local coordinates. Does not remesh.
    ///
    /// # Returns
    /// `false` if the coordinates are outside the chunk and nothing was written
    pub fn set_block_at(&mut self, x: i32, y: i32, z: i32, block: Block) -> bool {
        if !self.dims.contains_local(x, y, z) {
            if cfg!(debug_assertions) {
                log::warn!(
                    "Block write at ({x}, {y}, {z}) is outside chunk {:?}",
                    self.coord
                );
            }
            return false;
        }
        let index = self.dims.index(x as usize, y as usize, z as usize);
        self.blocks[index] = block;
        true
    }

    /// Highest y in a local column whose block stops movement.
    pub fn highest_solid(&self, x: i32, z: i32) -> Option<i32> {
        (0..self.dims.height() as i32)
            .rev()
            .find(|y| self.get_block_at(x, *y, z).blocks_movement())
    }

    /// Linked neighbor coordinate in `direction`.
    pub fn neighbor(&self, direction: ChunkNeighbor) -> Option<ChunkCoord> {
        self.neighbors[direction as usize]
    }

    /// All four neighbor links, indexed by `ChunkNeighbor`.
    pub fn neighbors(&self) -> [Option<ChunkCoord>; 4] {
        self.neighbors
    }

    /// Returns `true` once all four neighbors are linked.
    pub fn has_all_neighbors(&self) -> bool {
        self.neighbors.iter().all(Option::is_some)
    }

    /// Records a link to the neighbor in `direction`.
    pub fn link(&mut self, direction: ChunkNeighbor, coord: ChunkCoord) {
        self.neighbors[direction as usize] = Some(coord);
        if self.state == ChunkState::Generated {
            self.state = ChunkState::Linked;
        }
    }

    /// Clears the link in `direction`.
    ///
    /// # Returns
    /// The coordinate that was linked, if any
    pub fn unlink(&mut self, direction: ChunkNeighbor) -> Option<ChunkCoord> {
        self.neighbors[direction as usize].take()
    }

    /// Clears every link that points at `coord`.
    pub fn unlink_coord(&mut self, coord: ChunkCoord) -> bool {
        let mut removed = false;
        for link in self.neighbors.iter_mut() {
            if *link == Some(coord) {
                *link = None;
                removed = true;
            }
        }
        removed
    }

    /// Recomputes the face list from `volume`, which must be this chunk's padded volume.
    ///
    /// Safe to call repeatedly; the face list and the opaque/transparent queries always
    /// reflect the latest call. The GPU copy is refreshed on the next upload.
    pub fn update_mesh(&mut self, volume: &PaddedVolume) {
        self.mesh = extract_faces(volume);
        self.state = ChunkState::Meshed;
        self.needs_upload = true;
    }

    /// Whether the GPU copy of the mesh is stale.
    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    /// The GPU buffers holding this chunk's mesh, if uploaded.
    pub fn gpu_mesh(&self) -> Option<&ChunkGpuMesh> {
        self.gpu_mesh.as_ref()
    }

    /// Mutable access to the GPU buffers, for re-uploading in place.
    pub fn gpu_mesh_mut(&mut self) -> Option<&mut ChunkGpuMesh> {
        self.gpu_mesh.as_mut()
    }

    /// Installs freshly uploaded GPU buffers and clears the upload flag.
    ///
    /// Any previous buffers are dropped, which releases them.
    pub fn set_gpu_mesh(&mut self, gpu_mesh: ChunkGpuMesh) {
        self.gpu_mesh = Some(gpu_mesh);
        self.needs_upload = false;
    }
}
