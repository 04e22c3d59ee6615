//! Mesh generation and upload for voxel rendering.
//!
//! Every chunk's visible faces are extracted on the CPU whenever its blocks or its
//! neighbors change (`mesh/`). What reaches the GPU depends on the configured
//! strategy, selected once at startup:
//!
//! - `CpuMesher` uploads the CPU face list and draws `6 × face_count` vertices
//! - `GpuMesher` uploads the padded block volume and lets a compute shader write the
//!   faces and the indirect draw counts; the CPU list only sizes the buffers
//!
//! Both consume the same `PaddedVolume` and apply the same visibility rule, so they
//! produce the same face set.
//!
//! # Architecture
//! - `mesh/`: padded volumes, packed faces and the CPU face extraction
//! - `ChunkGpuMesh`: one chunk's GPU buffers and draw calls
//! - `ChunkMesher`: the upload strategy
//! - `ChunkRenderer`: the opaque and transparent pipelines

use wgpu::{CommandEncoder, ComputePipeline, Device};

use crate::engine_state::{
    config::MeshingStrategy,
    rendering::bind_group_state::BindGroupState,
    voxels::chunk::Chunk,
};

mod gpu_mesh;
mod mesh;
mod renderer;

pub use gpu_mesh::*;
pub use mesh::*;
pub use renderer::*;

/// WGSL source of the compute mesher.
pub const CHUNK_MESH_SHADER: &str = include_str!("../../../../assets/shaders/chunk_mesh.wgsl");

/// How a chunk's faces get into GPU memory.
pub trait ChunkMesher {
    /// The strategy this mesher implements.
    fn strategy(&self) -> MeshingStrategy;

    /// Whether `upload` reads the chunk's padded volume.
    fn needs_volume(&self) -> bool;

    /// Creates the GPU buffers for a freshly meshed chunk.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `bind_groups` - Shared layouts
    /// * `chunk` - The chunk, already meshed on the CPU
    /// * `volume` - Its padded volume, when `needs_volume` is `true`
    fn upload(
        &self,
        device: &Device,
        bind_groups: &BindGroupState,
        chunk: &Chunk,
        volume: Option<&PaddedVolume>,
    ) -> ChunkGpuMesh;

    /// Records the work that must finish before the uploaded meshes can be drawn.
    ///
    /// Called once per frame, before the render pass is begun on the same encoder.
    ///
    /// # Returns
    /// The number of chunks dispatched
    fn record_compute(
        &self,
        encoder: &mut CommandEncoder,
        meshes: &mut dyn Iterator<Item = &mut ChunkGpuMesh>,
    ) -> usize;
}

/// Uploads the CPU face list as is.
#[derive(Debug, Default)]
pub struct CpuMesher;

impl ChunkMesher for CpuMesher {
    fn strategy(&self) -> MeshingStrategy {
        MeshingStrategy::Cpu
    }

    fn needs_volume(&self) -> bool {
        false
    }

    fn upload(
        &self,
        device: &Device,
        bind_groups: &BindGroupState,
        chunk: &Chunk,
        _volume: Option<&PaddedVolume>,
    ) -> ChunkGpuMesh {
        ChunkGpuMesh::from_faces(device, bind_groups.chunk_bind_group_layout(), chunk)
    }

    fn record_compute(
        &self,
        _encoder: &mut CommandEncoder,
        _meshes: &mut dyn Iterator<Item = &mut ChunkGpuMesh>,
    ) -> usize {
        0
    }
}

/// Extracts faces with a compute shader.
pub struct GpuMesher {
    pipeline: ComputePipeline,
}

impl GpuMesher {
    /// Compiles the compute mesher.
    pub fn new(device: &Device, bind_groups: &BindGroupState) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Chunk Mesh Pipeline Layout"),
            bind_group_layouts: &[bind_groups.mesh_compute_bind_group_layout()],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Chunk Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(CHUNK_MESH_SHADER.into()),
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Chunk Mesh Pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: Some("cs_main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self { pipeline }
    }
}

impl ChunkMesher for GpuMesher {
    fn strategy(&self) -> MeshingStrategy {
        MeshingStrategy::Gpu
    }

    fn needs_volume(&self) -> bool {
        true
    }

    fn upload(
        &self,
        device: &Device,
        bind_groups: &BindGroupState,
        chunk: &Chunk,
        volume: Option<&PaddedVolume>,
    ) -> ChunkGpuMesh {
        match volume {
            Some(volume) => ChunkGpuMesh::for_compute(
                device,
                bind_groups.chunk_bind_group_layout(),
                bind_groups.mesh_compute_bind_group_layout(),
                chunk,
                volume,
            ),
            None => {
                log::error!(
                    "No padded volume for chunk {:?}, uploading its CPU faces",
                    chunk.coord()
                );
                ChunkGpuMesh::from_faces(device, bind_groups.chunk_bind_group_layout(), chunk)
            }
        }
    }

    fn record_compute(
        &self,
        encoder: &mut CommandEncoder,
        meshes: &mut dyn Iterator<Item = &mut ChunkGpuMesh>,
    ) -> usize {
        let mut pending = meshes.filter(|mesh| mesh.pending_dispatch()).peekable();
        if pending.peek().is_none() {
            return 0;
        }

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Chunk Mesh Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);

        pending
            .map(|mesh| mesh.record_dispatch(&mut pass))
            .filter(|dispatched| *dispatched)
            .count()
    }
}

/// Builds the mesher for the configured strategy.
pub fn create_mesher(
    strategy: MeshingStrategy,
    device: &Device,
    bind_groups: &BindGroupState,
) -> Box<dyn ChunkMesher> {
    log::info!("Meshing strategy: {:?}", strategy);
    match strategy {
        MeshingStrategy::Cpu => Box::new(CpuMesher),
        MeshingStrategy::Gpu => Box::new(GpuMesher::new(device, bind_groups)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use cgmath::Point2;

    use super::*;
    use crate::engine_state::voxels::{
        block::{block_side::BlockSide, Block, BLOCK_TO_TEXTURE_LAYERS},
        chunk::{ChunkDimensions, ChunkNeighbor},
    };

    /// Runs the compute mesher's per-cell logic over the words it would receive.
    fn emulate_compute_mesher(words: &[u32], size: usize, height: usize) -> HashSet<PackedFace> {
        let padded_size = size as i32 + 2;
        let padded_height = height as i32 + 2;
        let cell = |x: i32, y: i32, z: i32| {
            let index = (x + 1) + (y + 1) * padded_size + (z + 1) * padded_size * padded_height;
            words[index as usize]
        };

        let mut faces = HashSet::new();
        for index in 0..size * size * height {
            let (x, y, z) = (index % size, (index / size) % height, index / (size * height));
            let block = cell(x as i32, y as i32, z as i32);
            if block == 0 {
                continue;
            }
            for side in BlockSide::all() {
                let normal = side.normal();
                let neighbor = cell(x as i32 + normal.x, y as i32 + normal.y, z as i32 + normal.z);
                let transparent = matches!(neighbor, 0 | 5 | 8);
                if transparent && neighbor != block {
                    let block = Block::from_raw(block as u8).unwrap();
                    faces.insert(PackedFace::new(x as u32, y as u32, z as u32, side, block));
                }
            }
        }
        faces
    }

    #[test]
    fn both_strategies_produce_the_same_face_set() {
        let dims = ChunkDimensions::new(8, 16).unwrap();
        let mut center = Chunk::new(Point2::new(0, 0), dims);
        let mut right = Chunk::new(Point2::new(1, 0), dims);
        let mut rng = fastrand::Rng::with_seed(7);
        for chunk in [&mut center, &mut right] {
            for z in 0..8 {
                for x in 0..8 {
                    let top = rng.i32(2..10);
                    for y in 0..top {
                        chunk.set_block_at(x, y, z, Block::STONE);
                    }
                    chunk.set_block_at(x, top, z, *rng.choice(&Block::ALL).unwrap());
                }
            }
        }

        let mut neighbors = [None; 4];
        neighbors[ChunkNeighbor::RIGHT as usize] = Some(&right);
        let volume = PaddedVolume::from_chunks(&center, neighbors);

        let cpu: HashSet<PackedFace> = extract_faces(&volume).faces().iter().copied().collect();
        let gpu = emulate_compute_mesher(&volume.to_gpu_words(), 8, 16);
        assert!(!cpu.is_empty());
        assert_eq!(cpu, gpu);
    }

    #[test]
    fn compute_shader_texture_table_matches_blocks() {
        let start = CHUNK_MESH_SHADER
            .find("const TEXTURE_LAYERS")
            .expect("texture table");
        let body = &CHUNK_MESH_SHADER[start..];
        let open = body.find(">(").expect("table start") + 2;
        let close = body.find(");").expect("table end");
        let layers: Vec<u32> = body[open..close]
            .split(',')
            .map(|entry| entry.trim().trim_end_matches('u'))
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.parse().expect("layer"))
            .collect();

        let expected: Vec<u32> = BLOCK_TO_TEXTURE_LAYERS.iter().flatten().copied().collect();
        assert_eq!(layers, expected);
    }

    #[test]
    fn cpu_mesher_skips_the_volume() {
        assert!(!CpuMesher.needs_volume());
        assert_eq!(CpuMesher.strategy(), MeshingStrategy::Cpu);
    }
}
