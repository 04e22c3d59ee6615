//! Chunk renderer for the voxel engine.
//!
//! Owns the two chunk pipelines, which differ only in their fixed-function state:
//!
//! | pipeline    | culling | blending      | depth write | fragment entry   |
//! |-------------|---------|---------------|-------------|------------------|
//! | opaque      | back    | replace       | yes         | `fs_main`        |
//! | transparent | none    | alpha         | no          | `fs_transparent` |
//!
//! Opaque chunks are drawn first, then transparent chunks back to front. The pass
//! ends with the opaque pipeline bound again, so anything recorded after the chunks
//! starts from back-face culling.

use wgpu::{Device, RenderPass, RenderPipeline, TextureFormat};

use crate::engine_state::rendering::{bind_group_state::BindGroupState, texture::Texture};

use super::ChunkGpuMesh;

/// WGSL source of the chunk vertex and fragment shaders.
pub const CHUNK_SHADER: &str = include_str!("../../../../assets/shaders/chunk.wgsl");

pub struct ChunkRenderer {
    opaque_pipeline: RenderPipeline,
    transparent_pipeline: RenderPipeline,
}

impl ChunkRenderer {
    /// Compiles the chunk shader and builds both pipelines.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `texture_format` - Format of the surface being drawn to
    /// * `bind_groups` - Layouts of groups 0 to 2
    pub fn new(device: &Device, texture_format: TextureFormat, bind_groups: &BindGroupState) -> Self {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Chunk Render Pipeline Layout"),
            bind_group_layouts: &[
                bind_groups.camera_bind_group_layout(),
                bind_groups.texture_bind_group_layout(),
                bind_groups.chunk_bind_group_layout(),
            ],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Chunk Shader"),
            source: wgpu::ShaderSource::Wgsl(CHUNK_SHADER.into()),
        });

        let opaque_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            texture_format,
            PassKind::Opaque,
        );
        let transparent_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            texture_format,
            PassKind::Transparent,
        );

        Self {
            opaque_pipeline,
            transparent_pipeline,
        }
    }

    fn create_pipeline(
        device: &Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        texture_format: TextureFormat,
        kind: PassKind,
    ) -> RenderPipeline {
        let (label, fragment_entry, blend, cull_mode, depth_write_enabled) = match kind {
            PassKind::Opaque => (
                "Chunk Opaque Pipeline",
                "fs_main",
                wgpu::BlendState::REPLACE,
                Some(wgpu::Face::Back),
                true,
            ),
            PassKind::Transparent => (
                "Chunk Transparent Pipeline",
                "fs_transparent",
                wgpu::BlendState::ALPHA_BLENDING,
                None,
                false,
            ),
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: texture_format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Texture::DEPTH_FORMAT,
                depth_write_enabled,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Records the chunk draws into an open render pass.
    ///
    /// # Arguments
    /// * `render_pass` - The frame's render pass
    /// * `bind_groups` - Camera and texture groups
    /// * `opaque` - Meshes with opaque faces, in any order
    /// * `transparent` - Meshes with transparent faces, farthest first
    ///
    /// # Returns
    /// The number of chunk draws recorded
    pub fn render<'a>(
        &self,
        render_pass: &mut RenderPass<'_>,
        bind_groups: &BindGroupState,
        opaque: impl Iterator<Item = &'a ChunkGpuMesh>,
        transparent: impl Iterator<Item = &'a ChunkGpuMesh>,
    ) -> usize {
        render_pass.set_bind_group(0, bind_groups.camera_bind_group(), &[]);
        render_pass.set_bind_group(1, bind_groups.texture_bind_group(), &[]);

        let mut draws = 0;
        render_pass.set_pipeline(&self.opaque_pipeline);
        for mesh in opaque {
            mesh.draw_opaque(render_pass);
            draws += 1;
        }

        render_pass.set_pipeline(&self.transparent_pipeline);
        for mesh in transparent {
            mesh.draw_transparent(render_pass);
            draws += 1;
        }

        render_pass.set_pipeline(&self.opaque_pipeline);
        draws
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassKind {
    Opaque,
    Transparent,
}
