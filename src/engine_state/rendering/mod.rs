//! Rendering system for the voxel engine.
//!
//! This module owns the wgpu surface and everything drawn into it: bind groups, the
//! block texture array, the chunk pipelines and the meshing strategy. Chunks are
//! drawn by vertex pulling: each chunk's faces sit in a storage buffer and the
//! vertex shader expands every face into two triangles.

use pipeline_manager::PipelineManager;
use wgpu::{Buffer, Device, Queue, Surface, SurfaceConfiguration};

use crate::core::StSystem;

use super::{
    config::RenderConfig,
    voxels::world::{ChunkStore, DrawList},
};

pub mod bind_group_state;
pub mod meshing;
pub mod pipeline_manager;
pub mod texture;

/// Manages the surface and the rendering pipeline.
///
/// This struct is the main entry point for all rendering operations.
pub struct RenderState {
    /// The WebGPU surface being rendered to
    pub surface: Surface<'static>,
    /// Configuration for the surface (size, format, etc.)
    pub surface_config: SurfaceConfiguration,
    /// The WebGPU device used for creating GPU resources
    pub device: StSystem<Device>,
    /// The WebGPU queue for submitting command buffers
    pub queue: StSystem<Queue>,
    /// Manages the rendering pipeline and shaders
    pub pipeline_manager: PipelineManager,
}

impl RenderState {
    /// Creates a new `RenderState` instance.
    ///
    /// # Arguments
    /// * `surface` - The WebGPU surface to render to
    /// * `surface_config` - Configuration for the surface
    /// * `device` - The WebGPU device
    /// * `queue` - The WebGPU queue
    /// * `camera_buffer` - The camera uniform buffer bound as group 0
    /// * `render_config` - Meshing strategy and texture path
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: StSystem<Device>,
        queue: StSystem<Queue>,
        camera_buffer: &Buffer,
        render_config: &RenderConfig,
    ) -> Self {
        let pipeline_manager = PipelineManager::new(
            &device.get(),
            &queue.get(),
            &surface_config,
            camera_buffer,
            render_config,
        );

        Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline_manager,
        }
    }

    /// Handles window resize events.
    ///
    /// Zero-sized windows (minimised) are ignored; the surface keeps its last size.
    ///
    /// # Arguments
    /// * `width`, `height` - The new window size in physical pixels
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.reconfigure();
    }

    /// Configures the surface again, after a resize or a lost surface.
    pub fn reconfigure(&mut self) {
        let device = self.device.get();
        self.surface.configure(&device, &self.surface_config);
        self.pipeline_manager.resize(&device, &self.surface_config);
    }

    /// Renders a frame of chunks.
    ///
    /// # Arguments
    /// * `store` - The loaded chunks; listed chunks with stale meshes are uploaded
    /// * `draw_list` - Visible chunks in draw order
    ///
    /// # Returns
    /// The number of chunk draws, or the error acquiring the surface texture
    pub fn render_chunks(
        &mut self,
        store: &mut ChunkStore,
        draw_list: &DrawList,
    ) -> Result<usize, wgpu::SurfaceError> {
        self.pipeline_manager.render(
            &self.surface,
            &self.device.get(),
            &self.queue.get(),
            store,
            draw_list,
        )
    }
}
