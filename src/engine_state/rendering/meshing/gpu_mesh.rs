//! GPU resources of one meshed chunk.
//!
//! Every uploaded chunk owns a face buffer and an origin uniform, bound together as
//! group 2 of the chunk shaders. Chunks meshed by the compute shader additionally
//! own the padded block volume, an indirect argument buffer whose vertex counts
//! the shader fills in, and the shader's parameter block.
//!
//! All of it is released when the `ChunkGpuMesh` is dropped, which happens when its
//! chunk is remeshed or evicted.

use wgpu::{util::DeviceExt, util::DrawIndirectArgs, BindGroup, Buffer, RenderPass};

use crate::engine_state::voxels::chunk::{Chunk, ChunkCoord, ChunkDimensions};

use super::{ChunkMesh, PackedFace, PaddedVolume};

/// Invocations per compute workgroup; must match `@workgroup_size` in the mesher shader.
pub const MESH_WORKGROUP_SIZE: u32 = 64;

/// Byte offset of the transparent pass's arguments in the indirect buffer.
pub const TRANSPARENT_ARGS_OFFSET: u64 = std::mem::size_of::<DrawIndirectArgs>() as u64;

/// World-space origin of a chunk as the vertex shader reads it.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkOriginUniform {
    origin: [i32; 4],
}

impl ChunkOriginUniform {
    pub fn new(dims: &ChunkDimensions, coord: ChunkCoord) -> Self {
        let origin = dims.chunk_to_world(coord);
        Self {
            origin: [origin.x, origin.y, origin.z, 0],
        }
    }
}

/// Parameter block of the compute mesher.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshParams {
    /// Horizontal chunk size
    pub size: u32,
    /// Chunk height
    pub height: u32,
    /// Slots reserved for opaque faces, starting at 0
    pub opaque_capacity: u32,
    /// Slots reserved for transparent faces, starting at `opaque_capacity`
    pub transparent_capacity: u32,
}

impl MeshParams {
    /// Parameters for meshing a chunk whose face counts are already known.
    pub fn new(dims: &ChunkDimensions, mesh: &ChunkMesh) -> Self {
        Self {
            size: dims.size(),
            height: dims.height(),
            opaque_capacity: mesh.opaque().len() as u32,
            transparent_capacity: mesh.transparent().len() as u32,
        }
    }

    /// Workgroups needed to give every interior cell one invocation.
    pub fn workgroup_count(&self) -> u32 {
        (self.size * self.size * self.height).div_ceil(MESH_WORKGROUP_SIZE)
    }

    /// Indirect arguments before the dispatch: zero vertices, transparent pass
    /// starting after the opaque slots.
    pub fn initial_draw_args(&self) -> [DrawIndirectArgs; 2] {
        [
            DrawIndirectArgs {
                vertex_count: 0,
                instance_count: 1,
                first_vertex: 0,
                first_instance: 0,
            },
            DrawIndirectArgs {
                vertex_count: 0,
                instance_count: 1,
                first_vertex: self.opaque_capacity * 6,
                first_instance: 0,
            },
        ]
    }

    /// Size in bytes of the face buffer; never zero, as bindings must not be empty.
    pub fn face_buffer_size(&self) -> u64 {
        let faces = (self.opaque_capacity + self.transparent_capacity).max(1) as u64;
        faces * std::mem::size_of::<PackedFace>() as u64
    }
}

struct ComputeResources {
    _volume_buffer: Buffer,
    _params_buffer: Buffer,
    indirect_buffer: Buffer,
    bind_group: BindGroup,
    workgroups: u32,
    dispatched: bool,
}

/// GPU buffers and draw state of one chunk.
pub struct ChunkGpuMesh {
    _origin_buffer: Buffer,
    face_buffer: Buffer,
    bind_group: BindGroup,
    opaque_count: u32,
    transparent_count: u32,
    compute: Option<ComputeResources>,
}

impl ChunkGpuMesh {
    /// Uploads the CPU face list.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `layout` - Layout of chunk bind groups
    /// * `chunk` - The chunk whose mesh is uploaded
    pub fn from_faces(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, chunk: &Chunk) -> Self {
        let mesh = chunk.mesh();
        let origin_buffer = Self::create_origin_buffer(device, chunk);

        // An empty storage binding is invalid, so an empty mesh still gets one record.
        let placeholder = [<PackedFace as bytemuck::Zeroable>::zeroed()];
        let faces: &[PackedFace] = if mesh.faces().is_empty() {
            &placeholder
        } else {
            mesh.faces()
        };
        let face_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Chunk Face Buffer"),
            contents: bytemuck::cast_slice(faces),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let bind_group = Self::create_bind_group(device, layout, &origin_buffer, &face_buffer);

        Self {
            _origin_buffer: origin_buffer,
            face_buffer,
            bind_group,
            opaque_count: mesh.opaque().len() as u32,
            transparent_count: mesh.transparent().len() as u32,
            compute: None,
        }
    }

    /// Allocates the buffers the compute mesher fills.
    ///
    /// The face buffer is sized from the chunk's CPU face counts, which the compute
    /// shader reproduces exactly. Nothing is drawn until `record_dispatch` has run.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `chunk_layout` - Layout of chunk bind groups
    /// * `compute_layout` - Layout of the compute mesher's bind group
    /// * `chunk` - The chunk being meshed
    /// * `volume` - Its padded block volume
    pub fn for_compute(
        device: &wgpu::Device,
        chunk_layout: &wgpu::BindGroupLayout,
        compute_layout: &wgpu::BindGroupLayout,
        chunk: &Chunk,
        volume: &PaddedVolume,
    ) -> Self {
        let params = MeshParams::new(&chunk.dimensions(), chunk.mesh());
        let origin_buffer = Self::create_origin_buffer(device, chunk);

        let face_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Chunk Face Buffer"),
            size: params.face_buffer_size(),
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let volume_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Chunk Volume Buffer"),
            contents: bytemuck::cast_slice(&volume.to_gpu_words()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let args = params.initial_draw_args();
        let mut arg_bytes = Vec::with_capacity(TRANSPARENT_ARGS_OFFSET as usize * 2);
        arg_bytes.extend_from_slice(args[0].as_bytes());
        arg_bytes.extend_from_slice(args[1].as_bytes());
        let indirect_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Chunk Indirect Buffer"),
            contents: &arg_bytes,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::INDIRECT
                | wgpu::BufferUsages::COPY_DST,
        });

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Chunk Mesh Params"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let compute_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: compute_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: volume_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: face_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: indirect_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
            label: Some(super::super::bind_group_state::MESH_COMPUTE_BIND_GROUP),
        });

        let bind_group = Self::create_bind_group(device, chunk_layout, &origin_buffer, &face_buffer);

        Self {
            _origin_buffer: origin_buffer,
            face_buffer,
            bind_group,
            opaque_count: params.opaque_capacity,
            transparent_count: params.transparent_capacity,
            compute: Some(ComputeResources {
                _volume_buffer: volume_buffer,
                _params_buffer: params_buffer,
                indirect_buffer,
                bind_group: compute_bind_group,
                workgroups: params.workgroup_count(),
                dispatched: false,
            }),
        }
    }

    fn create_origin_buffer(device: &wgpu::Device, chunk: &Chunk) -> Buffer {
        let origin = ChunkOriginUniform::new(&chunk.dimensions(), chunk.coord());
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Chunk Origin Buffer"),
            contents: bytemuck::cast_slice(&[origin]),
            usage: wgpu::BufferUsages::UNIFORM,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        origin_buffer: &Buffer,
        face_buffer: &Buffer,
    ) -> BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: origin_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: face_buffer.as_entire_binding(),
                },
            ],
            label: Some(super::super::bind_group_state::CHUNK_BIND_GROUP),
        })
    }

    /// Whether the faces come from the compute mesher.
    pub fn is_compute(&self) -> bool {
        self.compute.is_some()
    }

    /// Whether a compute dispatch still has to be recorded before drawing.
    pub fn pending_dispatch(&self) -> bool {
        self.compute.as_ref().is_some_and(|compute| !compute.dispatched)
    }

    /// Size of the face buffer in bytes.
    pub fn face_buffer_size(&self) -> u64 {
        self.face_buffer.size()
    }

    /// Records this chunk's mesher dispatch into an open compute pass.
    ///
    /// # Returns
    /// `false` if there was nothing to dispatch
    pub fn record_dispatch(&mut self, pass: &mut wgpu::ComputePass<'_>) -> bool {
        let Some(compute) = self.compute.as_mut().filter(|compute| !compute.dispatched) else {
            return false;
        };
        pass.set_bind_group(0, &compute.bind_group, &[]);
        pass.dispatch_workgroups(compute.workgroups, 1, 1);
        compute.dispatched = true;
        true
    }

    /// Draws the opaque faces. The opaque pipeline must be bound.
    pub fn draw_opaque(&self, pass: &mut RenderPass<'_>) {
        if self.opaque_count == 0 {
            return;
        }
        pass.set_bind_group(2, &self.bind_group, &[]);
        match &self.compute {
            Some(compute) => pass.draw_indirect(&compute.indirect_buffer, 0),
            None => pass.draw(0..self.opaque_count * 6, 0..1),
        }
    }

    /// Draws the transparent faces. The transparent pipeline must be bound.
    pub fn draw_transparent(&self, pass: &mut RenderPass<'_>) {
        if self.transparent_count == 0 {
            return;
        }
        pass.set_bind_group(2, &self.bind_group, &[]);
        match &self.compute {
            Some(compute) => pass.draw_indirect(&compute.indirect_buffer, TRANSPARENT_ARGS_OFFSET),
            None => {
                let first = self.opaque_count * 6;
                pass.draw(first..first + self.transparent_count * 6, 0..1);
            }
        }
    }
}

impl std::fmt::Debug for ChunkGpuMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkGpuMesh")
            .field("opaque_count", &self.opaque_count)
            .field("transparent_count", &self.transparent_count)
            .field("compute", &self.is_compute())
            .field("pending_dispatch", &self.pending_dispatch())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point2;

    use super::*;
    use crate::engine_state::voxels::block::Block;

    #[test]
    fn indirect_arguments_start_empty_and_split_at_the_opaque_slots() {
        let params = MeshParams {
            size: 16,
            height: 128,
            opaque_capacity: 40,
            transparent_capacity: 7,
        };
        let [opaque, transparent] = params.initial_draw_args();
        assert_eq!((opaque.vertex_count, opaque.first_vertex), (0, 0));
        assert_eq!((transparent.vertex_count, transparent.first_vertex), (0, 240));
        assert_eq!(opaque.instance_count, 1);
        assert_eq!(TRANSPARENT_ARGS_OFFSET, 16);
        assert_eq!(params.face_buffer_size(), 47 * 8);
        assert_eq!(params.workgroup_count(), 16 * 16 * 128 / 64);
    }

    #[test]
    fn params_follow_the_cpu_face_counts() {
        let dims = ChunkDimensions::new(8, 16).unwrap();
        let mut chunk = Chunk::new(Point2::new(2, -1), dims);
        chunk.set_block_at(1, 1, 1, Block::STONE);
        chunk.set_block_at(4, 4, 4, Block::WATER);
        chunk.update_mesh(&PaddedVolume::from_chunks(&chunk, [None; 4]));

        let params = MeshParams::new(&dims, chunk.mesh());
        assert_eq!(params.opaque_capacity, 6);
        assert_eq!(params.transparent_capacity, 6);
        assert_eq!(ChunkOriginUniform::new(&dims, chunk.coord()).origin, [16, 0, -8, 0]);

        let empty = MeshParams::new(&dims, &ChunkMesh::default());
        assert_eq!(empty.face_buffer_size(), 8);
        assert_eq!(empty.workgroup_count(), 16);
    }
}
