//! Manages WebGPU bind groups and their layouts.
//!
//! The chunk shaders use three groups:
//!
//! | group | contents                                   | owner                  |
//! |-------|--------------------------------------------|------------------------|
//! | 0     | camera uniform                             | `BindGroupState`       |
//! | 1     | block texture array and sampler            | `BindGroupState`       |
//! | 2     | chunk origin uniform and packed face list  | each `ChunkGpuMesh`    |
//!
//! The compute mesher has one group of its own (padded volume, face output,
//! indirect arguments, parameters), also created per chunk from the layout kept here.

use std::path::Path;

use wgpu::{BindGroup, BindGroupLayout, Buffer, Device, Queue};

use super::texture::Texture;

/// Shared bind groups and the layouts of the per-chunk ones.
pub struct BindGroupState {
    camera_bind_group: BindGroup,
    camera_bind_group_layout: BindGroupLayout,
    texture_bind_group: BindGroup,
    texture_bind_group_layout: BindGroupLayout,
    chunk_bind_group_layout: BindGroupLayout,
    mesh_compute_bind_group_layout: BindGroupLayout,
    /// Keeps the texture array alive for as long as its bind group exists
    _block_textures: Texture,
}

impl BindGroupState {
    /// Creates the shared bind groups.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `queue` - Queue used to upload the block textures
    /// * `camera_buffer` - The camera uniform buffer
    /// * `texture_path` - Block texture PNG, if configured
    pub fn new(
        device: &Device,
        queue: &Queue,
        camera_buffer: &Buffer,
        texture_path: Option<&Path>,
    ) -> Self {
        let (camera_bind_group, camera_bind_group_layout) =
            Self::generate_camera_bindgroups(device, camera_buffer);

        let block_textures = Texture::create_block_texture_array(device, queue, texture_path);
        let (texture_bind_group, texture_bind_group_layout) =
            Self::generate_texture_bindgroups(device, &block_textures);

        Self {
            camera_bind_group,
            camera_bind_group_layout,
            texture_bind_group,
            texture_bind_group_layout,
            chunk_bind_group_layout: Self::generate_chunk_layout(device),
            mesh_compute_bind_group_layout: Self::generate_mesh_compute_layout(device),
            _block_textures: block_textures,
        }
    }

    pub fn camera_bind_group(&self) -> &BindGroup {
        &self.camera_bind_group
    }

    pub fn camera_bind_group_layout(&self) -> &BindGroupLayout {
        &self.camera_bind_group_layout
    }

    pub fn texture_bind_group(&self) -> &BindGroup {
        &self.texture_bind_group
    }

    pub fn texture_bind_group_layout(&self) -> &BindGroupLayout {
        &self.texture_bind_group_layout
    }

    /// Layout of group 2, created once per uploaded chunk.
    pub fn chunk_bind_group_layout(&self) -> &BindGroupLayout {
        &self.chunk_bind_group_layout
    }

    /// Layout of the compute mesher's only group.
    pub fn mesh_compute_bind_group_layout(&self) -> &BindGroupLayout {
        &self.mesh_compute_bind_group_layout
    }

    fn generate_camera_bindgroups(device: &Device, camera_buffer: &Buffer) -> (BindGroup, BindGroupLayout) {
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some(CAMERA_BIND_GROUP_LAYOUT),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some(CAMERA_BIND_GROUP),
        });

        (camera_bind_group, camera_bind_group_layout)
    }

    fn generate_texture_bindgroups(device: &Device, textures: &Texture) -> (BindGroup, BindGroupLayout) {
        let texture_array_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2Array,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        // This should match the filterable field of the corresponding Texture entry above.
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some(TEXTURE_BIND_GROUP_LAYOUT),
            });

        let texture_array_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &texture_array_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&textures.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&textures.sampler),
                },
            ],
            label: Some(TEXTURE_BIND_GROUP),
        });

        (texture_array_bind_group, texture_array_bind_group_layout)
    }

    fn generate_chunk_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
            label: Some(CHUNK_BIND_GROUP_LAYOUT),
        })
    }

    fn generate_mesh_compute_layout(device: &Device) -> BindGroupLayout {
        let storage = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                storage(0, true),
                storage(1, false),
                storage(2, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
            label: Some(MESH_COMPUTE_BIND_GROUP_LAYOUT),
        })
    }
}

pub const CAMERA_BIND_GROUP: &str = "camera_bind_group";
pub const CAMERA_BIND_GROUP_LAYOUT: &str = "camera_bind_group_layout";
pub const TEXTURE_BIND_GROUP: &str = "texture_bind_group";
pub const TEXTURE_BIND_GROUP_LAYOUT: &str = "texture_bind_group_layout";
pub const CHUNK_BIND_GROUP: &str = "chunk_bind_group";
pub const CHUNK_BIND_GROUP_LAYOUT: &str = "chunk_bind_group_layout";
pub const MESH_COMPUTE_BIND_GROUP: &str = "mesh_compute_bind_group";
pub const MESH_COMPUTE_BIND_GROUP_LAYOUT: &str = "mesh_compute_bind_group_layout";
