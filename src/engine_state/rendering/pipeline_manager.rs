//! Manages the WebGPU pipelines and the per-frame command recording.
//!
//! This module coordinates a frame: it uploads the meshes of the visible chunks,
//! records the compute mesher's dispatches, then the render pass that draws them.
//!
//! # Architecture
//!
//! - `PipelineManager`: owns the shared resources and records the frame
//! - `ChunkRenderer`: the opaque and transparent chunk pipelines
//! - `ChunkMesher`: the configured meshing strategy
//!
//! # Ordering
//!
//! The compute pass and the render pass are recorded into one command encoder,
//! compute first. wgpu tracks the storage writes of the compute pass and the
//! indirect and vertex reads of the render pass, and places the barrier between
//! them, so indirect draws always see the counts of this frame's dispatches.

use std::path::Path;

use wgpu::{Buffer, Device, Queue, Surface, SurfaceConfiguration};

use crate::engine_state::{
    config::RenderConfig,
    voxels::{
        chunk::{Chunk, ChunkCoord},
        world::{ChunkStore, DrawList},
    },
};

use super::{
    bind_group_state::BindGroupState,
    meshing::{create_mesher, ChunkMesher, ChunkRenderer},
    texture,
};

/// Colour the frame is cleared to, matching the fog in the chunk shader.
pub const SKY_COLOR: wgpu::Color = wgpu::Color {
    r: 0.62,
    g: 0.76,
    b: 0.92,
    a: 1.0,
};

/// Shared rendering resources and the chunk pipelines.
pub struct PipelineManager {
    /// Manages all bind groups used in the pipeline
    pub bind_group_state: BindGroupState,
    /// Depth texture used for depth testing
    pub depth_texture: texture::Texture,
    /// Opaque and transparent chunk pipelines
    pub chunk_renderer: ChunkRenderer,
    /// Uploads chunk meshes and records their GPU work
    pub mesher: Box<dyn ChunkMesher>,
}

impl PipelineManager {
    /// Creates a new `PipelineManager` instance.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `queue` - The WebGPU queue, used to upload the block textures
    /// * `config` - Surface configuration containing size and format
    /// * `camera_buffer` - The camera uniform buffer
    /// * `render_config` - Meshing strategy and texture path
    ///
    /// # Returns
    /// A new `PipelineManager` instance with all rendering resources initialized
    pub fn new(
        device: &Device,
        queue: &Queue,
        config: &SurfaceConfiguration,
        camera_buffer: &Buffer,
        render_config: &RenderConfig,
    ) -> Self {
        let texture_path = render_config.block_texture_path.as_deref().map(Path::new);
        let bind_group_state = BindGroupState::new(device, queue, camera_buffer, texture_path);

        let depth_texture = texture::Texture::create_depth_texture(device, config, "DEPTH TEXTURE");
        let chunk_renderer = ChunkRenderer::new(device, config.format, &bind_group_state);
        let mesher = create_mesher(render_config.meshing, device, &bind_group_state);

        Self {
            bind_group_state,
            depth_texture,
            chunk_renderer,
            mesher,
        }
    }

    /// Renders a frame to the given surface.
    ///
    /// 1. Uploads the meshes of listed chunks that changed
    /// 2. Records the mesher's compute work
    /// 3. Records the render pass drawing opaque chunks, then transparent ones
    /// 4. Submits and presents
    ///
    /// # Arguments
    /// * `surface` - The target surface
    /// * `device` - The WebGPU device
    /// * `queue` - The WebGPU queue
    /// * `store` - The loaded chunks
    /// * `draw_list` - Visible chunks in draw order
    ///
    /// # Returns
    /// The number of chunk draws, or the error acquiring the surface texture
    pub fn render(
        &mut self,
        surface: &Surface,
        device: &Device,
        queue: &Queue,
        store: &mut ChunkStore,
        draw_list: &DrawList,
    ) -> Result<usize, wgpu::SurfaceError> {
        let visible = draw_list
            .opaque
            .iter()
            .chain(draw_list.transparent.iter())
            .copied();
        let uploaded = store.upload_meshes(visible, self.mesher.as_ref(), device, &self.bind_group_state);
        if uploaded > 0 {
            log::trace!("Uploaded {uploaded} chunk meshes");
        }

        let frame = surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        {
            let mut meshes = store.gpu_meshes_mut();
            let dispatched = self.mesher.record_compute(&mut encoder, &mut meshes);
            if dispatched > 0 {
                log::trace!("Dispatched the compute mesher for {dispatched} chunks");
            }
        }

        let draws = {
            let depth_stencil_attachment = Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            });
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Chunk Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SKY_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment,
                ..Default::default()
            });

            let mesh_of = |coord: &ChunkCoord| store.chunk_at(*coord).and_then(Chunk::gpu_mesh);
            self.chunk_renderer.render(
                &mut rpass,
                &self.bind_group_state,
                draw_list.opaque.iter().filter_map(mesh_of),
                draw_list.transparent.iter().filter_map(mesh_of),
            )
        };

        queue.submit([encoder.finish()]);
        frame.present();
        Ok(draws)
    }

    /// Handles window resize events by recreating the depth texture.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `config` - The new surface configuration containing the updated size
    pub fn resize(&mut self, device: &Device, config: &SurfaceConfiguration) {
        self.depth_texture = texture::Texture::create_depth_texture(device, config, "DEPTH TEXTURE");
    }
}
