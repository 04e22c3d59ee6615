//! # World Module
//!
//! This module provides the `ChunkStore`, which owns every loaded chunk and is the
//! single place chunks are created, linked, decorated, meshed and evicted.
//!
//! ## Architecture
//!
//! Chunks live in a hash map keyed by chunk coordinate, so there is at most one chunk
//! per coordinate and lookup is O(1). Neighbor links are coordinates resolved through
//! the same map; evicting a chunk clears every link that names it.
//!
//! ## Streaming
//!
//! `ensure_loaded` runs four passes, strictly in order:
//!
//! 1. get or create every chunk of the square around the focus and generate the new
//!    ones from one shared noise region
//! 2. collect the coordinates that were generated by pass 1
//! 3. link the new chunks to the neighbors that are present, in both directions
//! 4. decorate chunks that now have all four neighbors, then mesh every chunk whose
//!    blocks or neighbor set changed
//!
//! The noise region depends only on the focus chunk and the radius, so it is cached
//! and reused until the focus moves.

use std::collections::{HashMap, HashSet};

use cgmath::{MetricSpace, Point2, Point3};
use wgpu::Device;

use crate::engine_state::{
    camera_state::{camera::CameraController, frustum::Frustum},
    config::{ConfigError, WorldConfig},
    rendering::{
        bind_group_state::BindGroupState,
        meshing::{ChunkGpuMesh, ChunkMesher, PaddedVolume},
        RenderState,
    },
};

use super::{
    block::Block,
    chunk::{Chunk, ChunkCoord, ChunkDimensions, ChunkNeighbor, TerrainParams},
    decoration::Decorator,
    noise_field::{NoiseField, NoiseRegionCache, NoiseSettings},
};

/// What a call to [`ChunkStore::ensure_loaded`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamReport {
    /// Chunks created and generated
    pub generated: usize,
    /// Neighbor links established (each pair counted once)
    pub linked: usize,
    /// Chunks decorated
    pub decorated: usize,
    /// Chunks whose face list was rebuilt
    pub meshed: usize,
}

impl StreamReport {
    /// Whether the call changed anything.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Visible chunks in draw order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawList {
    /// Chunks with opaque faces, nearest first
    pub opaque: Vec<ChunkCoord>,
    /// Chunks with transparent faces, farthest first
    pub transparent: Vec<ChunkCoord>,
}

impl DrawList {
    /// Total number of chunk draws.
    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.transparent.is_empty()
    }
}

/// Owner of every loaded chunk.
pub struct ChunkStore {
    chunks: HashMap<ChunkCoord, Chunk>,
    dims: ChunkDimensions,
    noise: NoiseField,
    noise_settings: NoiseSettings,
    noise_cache: NoiseRegionCache,
    terrain: TerrainParams,
    decorator: Decorator,
    last_focus: Option<ChunkCoord>,
}

impl ChunkStore {
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `seed` - World seed shared by the noise field and decoration
    /// * `dims` - Dimensions of every chunk
    /// * `noise_settings` - Octave parameters
    /// * `terrain` - Height and layering parameters
    /// * `decorator` - Tree and water placement
    pub fn new(
        seed: u32,
        dims: ChunkDimensions,
        noise_settings: NoiseSettings,
        terrain: TerrainParams,
        decorator: Decorator,
    ) -> Self {
        Self {
            chunks: HashMap::new(),
            dims,
            noise: NoiseField::new(seed),
            noise_settings,
            noise_cache: NoiseRegionCache::new(),
            terrain,
            decorator,
            last_focus: None,
        }
    }

    /// Creates an empty store from a world configuration.
    pub fn from_config(seed: u32, config: &WorldConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            seed,
            ChunkDimensions::from_config(config)?,
            NoiseSettings::from_config(config),
            TerrainParams::from_config(config),
            Decorator::from_config(seed, config),
        ))
    }

    /// Dimensions shared by every chunk.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dims
    }

    /// World seed.
    pub fn seed(&self) -> u32 {
        self.noise.seed()
    }

    /// Number of loaded chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Whether a chunk is loaded at `coord`.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Loaded chunk coordinates, in no particular order.
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    /// Number of noise regions computed so far.
    pub fn noise_recompute_count(&self) -> usize {
        self.noise_cache.recompute_count()
    }

    /// Loads, links, decorates and meshes the square of chunks around `focus`.
    ///
    /// Does nothing if the focus is still in the chunk of the previous call. The first
    /// call always runs.
    ///
    /// # Arguments
    /// * `focus` - World position the square is centred on
    /// * `radius` - Half-width of the square in chunks
    ///
    /// # Returns
    /// What changed
    pub fn ensure_loaded(&mut self, focus: Point3<f32>, radius: i32) -> StreamReport {
        let center = self.dims.world_pos_to_chunk(focus);
        if self.last_focus == Some(center) {
            return StreamReport::default();
        }
        self.last_focus = Some(center);

        let radius = radius.max(0);
        let dims = self.dims;
        let size = dims.size() as i32;
        let width = ((2 * radius + 1) * size) as usize;
        let corner = dims.chunk_to_world(Point2::new(center.x - radius, center.y - radius));

        let mut report = StreamReport::default();

        // Pass 1: get or create, generate what is new.
        let region = self.noise_cache.get_or_compute(
            &self.noise,
            &self.noise_settings,
            width,
            (corner.x, corner.z),
        );
        let mut generated = Vec::new();
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let coord = Point2::new(center.x + dx, center.y + dz);
                let chunk = self
                    .chunks
                    .entry(coord)
                    .or_insert_with(|| Chunk::new(coord, dims));
                let offset_x = ((dx + radius) * size) as usize;
                let offset_z = ((dz + radius) * size) as usize;
                if chunk.generate(region.samples(), width, offset_x, offset_z, &self.terrain) {
                    generated.push(coord);
                }
            }
        }

        // Pass 2: the new coordinates, in a stable order.
        generated.sort_by_key(|coord| (coord.x, coord.y));
        report.generated = generated.len();

        // Pass 3: reciprocal links.
        let mut dirty: HashSet<ChunkCoord> = generated.iter().copied().collect();
        for coord in &generated {
            for direction in ChunkNeighbor::all() {
                let other = *coord + direction.offset();
                if !self.chunks.contains_key(&other) {
                    continue;
                }
                let Some(chunk) = self.chunks.get_mut(coord) else {
                    continue;
                };
                if chunk.neighbor(direction) == Some(other) {
                    continue;
                }
                chunk.link(direction, other);
                if let Some(neighbor) = self.chunks.get_mut(&other) {
                    neighbor.link(direction.opposite(), *coord);
                }
                dirty.insert(other);
                report.linked += 1;
            }
        }

        // Pass 4: decorate, then mesh.
        if self.decorator.is_enabled() {
            let decorator = self.decorator;
            for coord in &generated {
                for neighbor in self.neighbor_coords(*coord) {
                    let decorated = self.chunks.get(&neighbor).is_some_and(Chunk::is_decorated);
                    if decorated && decorator.spill_trees(self, neighbor, *coord) {
                        dirty.insert(*coord);
                    }
                }
            }

            let mut ready: Vec<ChunkCoord> = dirty
                .iter()
                .copied()
                .filter(|coord| {
                    self.chunks
                        .get(coord)
                        .is_some_and(|chunk| !chunk.is_decorated() && chunk.has_all_neighbors())
                })
                .collect();
            ready.sort_by_key(|coord| (coord.x, coord.y));

            for coord in ready {
                dirty.extend(decorator.decorate(self, coord));
                dirty.insert(coord);
                report.decorated += 1;
            }
        }

        let mut dirty: Vec<ChunkCoord> = dirty.into_iter().collect();
        dirty.sort_by_key(|coord| (coord.x, coord.y));
        report.meshed = dirty.into_iter().filter(|coord| self.remesh(*coord)).count();

        log::debug!(
            "Streamed around chunk {:?}: {} generated, {} linked, {} decorated, {} meshed ({} loaded)",
            center,
            report.generated,
            report.linked,
            report.decorated,
            report.meshed,
            self.chunks.len()
        );

        report
    }

    /// Evicts every chunk farther than `radius` chunks from `focus`.
    ///
    /// Distance is planar, between chunk coordinates. Dropping a chunk releases its GPU
    /// buffers. Survivors that lose a link are remeshed, since their border faces
    /// change.
    ///
    /// # Returns
    /// The number of chunks evicted
    pub fn unload_distant(&mut self, focus: ChunkCoord, radius: i32) -> usize {
        let limit = radius as i64 * radius as i64;
        let evicted: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .copied()
            .filter(|coord| {
                let dx = (coord.x - focus.x) as i64;
                let dz = (coord.y - focus.y) as i64;
                dx * dx + dz * dz > limit
            })
            .collect();

        if evicted.is_empty() {
            return 0;
        }

        for coord in &evicted {
            self.chunks.remove(coord);
        }

        let mut orphaned = Vec::new();
        for coord in &evicted {
            for direction in ChunkNeighbor::all() {
                let other = *coord + direction.offset();
                if let Some(chunk) = self.chunks.get_mut(&other) {
                    if chunk.unlink_coord(*coord) && !orphaned.contains(&other) {
                        orphaned.push(other);
                    }
                }
            }
        }

        for coord in &orphaned {
            self.remesh(*coord);
        }

        log::debug!(
            "Evicted {} chunks beyond radius {} of {:?}, remeshed {} survivors ({} loaded)",
            evicted.len(),
            radius,
            focus,
            orphaned.len(),
            self.chunks.len()
        );

        evicted.len()
    }

    /// Writes a block and remeshes every chunk that can see the change.
    ///
    /// The owning chunk is always remeshed. A neighbor is remeshed too when the edit
    /// sits on the edge they share.
    ///
    /// # Returns
    /// `false` if the position is outside the world height or its chunk is not loaded
    pub fn update_block(&mut self, position: Point3<i32>, block: Block) -> bool {
        let Some(coord) = self.write_block(position, block) else {
            log::debug!("Block edit at {:?} ignored: no loaded block there", position);
            return false;
        };
        self.remesh(coord);

        let local = self.dims.world_to_local(position);
        let last = self.dims.size() as i32 - 1;
        let edges = [
            (local.x == 0, ChunkNeighbor::LEFT),
            (local.x == last, ChunkNeighbor::RIGHT),
            (local.z == 0, ChunkNeighbor::BACK),
            (local.z == last, ChunkNeighbor::FRONT),
        ];
        for (on_edge, direction) in edges {
            if !on_edge {
                continue;
            }
            if let Some(neighbor) = self.chunks.get(&coord).and_then(|chunk| chunk.neighbor(direction)) {
                self.remesh(neighbor);
            }
        }

        true
    }

    /// Writes a block without remeshing.
    ///
    /// # Returns
    /// The chunk written to, or `None` if there is no loaded block at `position`
    pub(crate) fn write_block(&mut self, position: Point3<i32>, block: Block) -> Option<ChunkCoord> {
        if !(0..self.dims.height() as i32).contains(&position.y) {
            return None;
        }
        let coord = self.dims.world_to_chunk(position);
        let local = self.dims.world_to_local(position);
        let chunk = self.chunks.get_mut(&coord)?;
        chunk.set_block_at(local.x, local.y, local.z, block).then_some(coord)
    }

    /// Chunk containing a world position.
    pub fn get_chunk(&self, position: Point3<f32>) -> Option<&Chunk> {
        self.chunks.get(&self.dims.world_pos_to_chunk(position))
    }

    /// Chunk at a chunk coordinate.
    pub fn chunk_at(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Mutable chunk at a chunk coordinate.
    pub fn chunk_at_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    /// Block at a world block coordinate.
    ///
    /// # Returns
    /// `None` if the position is outside the world height or its chunk is not loaded
    pub fn get_block(&self, position: Point3<i32>) -> Option<Block> {
        if !(0..self.dims.height() as i32).contains(&position.y) {
            return None;
        }
        let chunk = self.chunks.get(&self.dims.world_to_chunk(position))?;
        let local = self.dims.world_to_local(position);
        Some(chunk.get_block_at(local.x, local.y, local.z))
    }

    /// Highest movement-blocking block of a world column.
    pub fn surface_height(&self, x: i32, z: i32) -> Option<i32> {
        let position = Point3::new(x, 0, z);
        let chunk = self.chunks.get(&self.dims.world_to_chunk(position))?;
        let local = self.dims.world_to_local(position);
        chunk.highest_solid(local.x, local.z)
    }

    /// Inserts a chunk built elsewhere and links it to the loaded neighbors.
    ///
    /// Replaces any chunk already at that coordinate. Neither chunk is remeshed.
    pub fn insert_chunk(&mut self, mut chunk: Chunk) {
        let coord = chunk.coord();
        for direction in ChunkNeighbor::all() {
            let other = coord + direction.offset();
            if let Some(neighbor) = self.chunks.get_mut(&other) {
                neighbor.link(direction.opposite(), coord);
                chunk.link(direction, other);
            }
        }
        self.chunks.insert(coord, chunk);
    }

    /// Padded volume of the chunk at `coord`, read through its links.
    pub fn padded_volume(&self, coord: ChunkCoord) -> Option<PaddedVolume> {
        let chunk = self.chunks.get(&coord)?;
        let neighbors = ChunkNeighbor::all()
            .map(|direction| chunk.neighbor(direction).and_then(|other| self.chunks.get(&other)));
        Some(PaddedVolume::from_chunks(chunk, neighbors))
    }

    /// Rebuilds the face list of one chunk.
    ///
    /// # Returns
    /// `false` if the chunk is not loaded
    pub fn remesh(&mut self, coord: ChunkCoord) -> bool {
        let Some(volume) = self.padded_volume(coord) else {
            return false;
        };
        match self.chunks.get_mut(&coord) {
            Some(chunk) => {
                chunk.update_mesh(&volume);
                true
            }
            None => false,
        }
    }

    /// Visible chunks split by pass and sorted for drawing.
    ///
    /// Opaque chunks are sorted nearest first to help early depth rejection.
    /// Transparent chunks are sorted farthest first for blending; ties fall back to
    /// the chunk coordinate so the order is stable between frames.
    ///
    /// # Arguments
    /// * `frustum` - The camera frustum
    /// * `eye` - Position distances are measured from
    pub fn collect_draw_list(&self, frustum: &Frustum, eye: Point3<f32>) -> DrawList {
        let mut opaque = Vec::new();
        let mut transparent = Vec::new();

        for chunk in self.chunks.values() {
            let has_opaque = chunk.has_opaque_mesh();
            let has_transparent = chunk.has_transparent_mesh();
            if !(has_opaque || has_transparent) || !frustum.contains_aabb(chunk.aabb()) {
                continue;
            }

            let distance = chunk.aabb().center().distance2(eye);
            if has_opaque {
                opaque.push((distance, chunk.coord()));
            }
            if has_transparent {
                transparent.push((distance, chunk.coord()));
            }
        }

        let by_coord = |a: &ChunkCoord, b: &ChunkCoord| (a.x, a.y).cmp(&(b.x, b.y));
        opaque.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| by_coord(&a.1, &b.1)));
        transparent.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| by_coord(&a.1, &b.1)));

        DrawList {
            opaque: opaque.into_iter().map(|(_, coord)| coord).collect(),
            transparent: transparent.into_iter().map(|(_, coord)| coord).collect(),
        }
    }

    /// Uploads the meshes of `coords` that changed since their last upload.
    ///
    /// # Returns
    /// The number of chunks uploaded
    pub fn upload_meshes(
        &mut self,
        coords: impl IntoIterator<Item = ChunkCoord>,
        mesher: &dyn ChunkMesher,
        device: &Device,
        bind_groups: &BindGroupState,
    ) -> usize {
        let mut uploaded = 0;
        for coord in coords {
            let Some(chunk) = self.chunks.get(&coord) else {
                continue;
            };
            if !chunk.needs_upload() {
                continue;
            }

            let volume = if mesher.needs_volume() {
                self.padded_volume(coord)
            } else {
                None
            };
            let gpu_mesh = mesher.upload(device, bind_groups, chunk, volume.as_ref());

            if let Some(chunk) = self.chunks.get_mut(&coord) {
                chunk.set_gpu_mesh(gpu_mesh);
                uploaded += 1;
            }
        }
        uploaded
    }

    /// Every uploaded mesh, for recording per-frame GPU work.
    pub fn gpu_meshes_mut(&mut self) -> impl Iterator<Item = &mut ChunkGpuMesh> {
        self.chunks.values_mut().filter_map(Chunk::gpu_mesh_mut)
    }

    /// Draws the chunks visible from `camera`.
    ///
    /// # Returns
    /// The number of chunk draws, or the surface error that prevented the frame
    pub fn render(
        &mut self,
        camera: &mut CameraController,
        renderer: &mut RenderState,
    ) -> Result<usize, wgpu::SurfaceError> {
        let eye = camera.eye_position();
        let draw_list = self.collect_draw_list(camera.frustum(), eye);
        renderer.render_chunks(self, &draw_list)
    }

    fn neighbor_coords(&self, coord: ChunkCoord) -> Vec<ChunkCoord> {
        self.chunks
            .get(&coord)
            .map(|chunk| chunk.neighbors().into_iter().flatten().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{ortho, Matrix4, Vector3};

    use super::*;
    use crate::engine_state::voxels::chunk::ChunkState;

    fn config() -> WorldConfig {
        WorldConfig {
            chunk_size: 8,
            chunk_height: 64,
            sea_level: 20,
            base_height: 24.0,
            height_amplitude: 8.0,
            trees: false,
            water: true,
            ..WorldConfig::default()
        }
    }

    fn store() -> ChunkStore {
        ChunkStore::from_config(7, &config()).unwrap()
    }

    /// A box frustum containing every loaded chunk.
    fn everything() -> Frustum {
        let view = Matrix4::look_to_rh(
            Point3::new(0.0, 500.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::unit_z(),
        );
        Frustum::from_matrix(ortho(-1000.0, 1000.0, -1000.0, 1000.0, 0.1, 1000.0) * view)
    }

    #[test]
    fn streaming_twice_from_the_same_chunk_is_a_no_op() {
        let mut store = store();
        let first = store.ensure_loaded(Point3::new(1.0, 30.0, 1.0), 1);
        assert_eq!(first.generated, 9);
        assert_eq!(first.linked, 12);
        assert_eq!(store.chunk_count(), 9);

        let second = store.ensure_loaded(Point3::new(6.5, 30.0, 2.0), 1);
        assert!(second.is_empty());
        assert_eq!(store.noise_recompute_count(), 1);
    }

    #[test]
    fn only_the_fully_linked_centre_is_decorated() {
        let mut store = store();
        let report = store.ensure_loaded(Point3::new(0.0, 30.0, 0.0), 1);
        assert_eq!(report.decorated, 1);
        let center = store.chunk_at(Point2::new(0, 0)).unwrap();
        assert!(center.is_decorated());
        assert!(!store.chunk_at(Point2::new(1, 1)).unwrap().is_decorated());
        assert!(store.coords().all(|coord| store.chunk_at(coord).unwrap().state() == ChunkState::Meshed));
    }

    #[test]
    fn edge_edits_remesh_the_neighbor() {
        let mut store = store();
        store.ensure_loaded(Point3::new(0.0, 30.0, 0.0), 1);

        // Dig a hole at the +X edge of chunk (0, 0), below the ground on both sides.
        let y = store
            .surface_height(7, 3)
            .unwrap()
            .min(store.surface_height(8, 3).unwrap())
            - 1;
        let before = store.chunk_at(Point2::new(1, 0)).unwrap().mesh().face_count();
        assert!(store.update_block(Point3::new(7, y, 3), Block::AIR));
        let after = store.chunk_at(Point2::new(1, 0)).unwrap().mesh().face_count();
        assert_eq!(after, before + 1);
        assert_eq!(store.get_block(Point3::new(7, y, 3)), Some(Block::AIR));
    }

    #[test]
    fn edits_outside_the_world_fail() {
        let mut store = store();
        store.ensure_loaded(Point3::new(0.0, 30.0, 0.0), 0);
        assert!(!store.update_block(Point3::new(0, -1, 0), Block::STONE));
        assert!(!store.update_block(Point3::new(0, 64, 0), Block::STONE));
        assert!(!store.update_block(Point3::new(100, 10, 0), Block::STONE));
        assert!(store.update_block(Point3::new(0, 63, 0), Block::STONE));
    }

    #[test]
    fn eviction_clears_links_to_removed_chunks() {
        let mut store = store();
        store.ensure_loaded(Point3::new(0.0, 30.0, 0.0), 2);
        assert_eq!(store.chunk_count(), 25);

        let evicted = store.unload_distant(Point2::new(-2, 0), 2);
        // Kept: all of x = -2, three of x = -1, only (0, 0) of x = 0.
        assert_eq!(evicted, 16);
        for coord in store.coords() {
            let chunk = store.chunk_at(coord).unwrap();
            for link in chunk.neighbors().into_iter().flatten() {
                assert!(store.contains(link), "{coord:?} still links {link:?}");
            }
        }
        assert!(store.get_chunk(Point3::new(17.0, 10.0, 0.0)).is_none());
    }

    #[test]
    fn draw_list_orders_each_pass() {
        let mut store = store();
        store.ensure_loaded(Point3::new(0.0, 30.0, 0.0), 1);
        for coord in [Point2::new(-1, 0), Point2::new(0, 0), Point2::new(1, 0)] {
            let origin = store.dimensions().chunk_to_world(coord);
            store.update_block(Point3::new(origin.x + 3, 62, origin.z + 3), Block::WATER);
        }

        let eye = Point3::new(-40.0, 30.0, 4.0);
        let list = store.collect_draw_list(&everything(), eye);
        assert_eq!(list.opaque.len(), 9);
        assert_eq!(list.opaque.first(), Some(&Point2::new(-1, 0)));

        let water_columns: Vec<_> = list
            .transparent
            .iter()
            .filter(|coord| coord.y == 0)
            .copied()
            .collect();
        assert_eq!(
            water_columns,
            vec![Point2::new(1, 0), Point2::new(0, 0), Point2::new(-1, 0)]
        );
    }

    #[test]
    fn inserted_chunks_link_both_ways() {
        let mut store = store();
        let dims = store.dimensions();
        store.insert_chunk(Chunk::new(Point2::new(0, 0), dims));
        store.insert_chunk(Chunk::new(Point2::new(0, 1), dims));
        assert_eq!(
            store.chunk_at(Point2::new(0, 0)).unwrap().neighbor(ChunkNeighbor::FRONT),
            Some(Point2::new(0, 1))
        );
        assert_eq!(
            store.chunk_at(Point2::new(0, 1)).unwrap().neighbor(ChunkNeighbor::BACK),
            Some(Point2::new(0, 0))
        );
    }
}
