//! # Voxel World
//!
//! Everything that stores, generates and queries blocks.
//!
//! ## Architecture
//!
//! * **Block**: materials, their face textures and their physical properties
//! * **Chunk**: `size × height × size` columns of blocks and their coordinates
//! * **NoiseField**: seeded layered noise and the cached heightfield region
//! * **ChunkStore**: the map of loaded chunks, streaming, edits and eviction
//! * **Decoration**: trees and the water plane
//! * **Raycast**: block picking along a ray
//!
//! ## Data Flow
//!
//! 1. The store samples one noise region for the square of chunks around the focus
//! 2. New chunks are generated from their slice of the region and linked
//! 3. Chunks with all four neighbors are decorated
//! 4. Every chunk whose blocks or neighbors changed is remeshed
//! 5. The renderer uploads the meshes of visible chunks

pub mod aabb;
pub mod block;
pub mod chunk;
pub mod decoration;
pub mod noise_field;
pub mod raycast;
pub mod world;
