//! Texture handling for the rendering pipeline.
//!
//! Two textures exist: the depth buffer, recreated on every resize, and the block
//! texture array with one 16×16 layer per entry of the block texture table.
//!
//! The array is read from a PNG whose layers are stacked vertically. When the
//! file is missing or has the wrong size, a flat-colored procedural set is used
//! instead so the world still renders.

use std::path::Path;

use image::RgbaImage;

use crate::engine_state::voxels::block::TEXTURE_LAYER_COUNT;

/// Width and height of one block texture layer in pixels.
pub const BLOCK_TEXTURE_SIZE: u32 = 16;

/// Base colors of the procedural layers, in layer order.
const PROCEDURAL_COLORS: [[u8; 4]; TEXTURE_LAYER_COUNT as usize] = [
    [121, 85, 58, 255],   // dirt
    [95, 159, 53, 255],   // grass top
    [110, 120, 60, 255],  // grass side
    [125, 125, 125, 255], // stone
    [207, 92, 15, 255],   // lava
    [45, 95, 200, 160],   // water
    [102, 81, 51, 255],   // wood bark
    [160, 130, 80, 255],  // wood rings
    [219, 207, 163, 255], // sand
    [60, 130, 40, 0],     // leaves, alpha set per pixel
    [180, 144, 90, 255],  // planks
];

/// Leaves layer; holes in it are cut out by the fragment shader.
const LEAVES_LAYER: usize = 9;

/// Represents a GPU texture with associated view and sampler.
pub struct Texture {
    /// The underlying WebGPU texture resource.
    #[allow(dead_code)]
    pub texture: wgpu::Texture,
    /// The texture view used for binding the texture to the pipeline.
    pub view: wgpu::TextureView,
    /// The sampler used for texture filtering and addressing.
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// The texture format used for depth buffers.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates a new depth texture with the given configuration.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `config` - The surface configuration containing dimensions
    /// * `label` - Debug label for the texture
    ///
    /// # Returns
    /// A new `Texture` instance configured as a depth buffer
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        };

        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Creates the block texture array.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `queue` - Queue used to upload the pixels
    /// * `path` - PNG to load; `None` or a failed load selects the procedural set
    pub fn create_block_texture_array(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: Option<&Path>,
    ) -> Self {
        let pixels = path
            .and_then(load_block_layers)
            .unwrap_or_else(procedural_block_layers);

        let texture = wgpu::util::DeviceExt::create_texture_with_data(
            device,
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Block Texture Array"),
                size: wgpu::Extent3d {
                    width: BLOCK_TEXTURE_SIZE,
                    height: BLOCK_TEXTURE_SIZE,
                    depth_or_array_layers: TEXTURE_LAYER_COUNT,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &pixels,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

fn load_block_layers(path: &Path) -> Option<Vec<u8>> {
    match image::open(path) {
        Ok(image) => {
            let layers = block_layers_from_image(&image.to_rgba8());
            if layers.is_none() {
                log::warn!(
                    "{} is not {}x{} pixels, using procedural block textures",
                    path.display(),
                    BLOCK_TEXTURE_SIZE,
                    BLOCK_TEXTURE_SIZE * TEXTURE_LAYER_COUNT
                );
            }
            layers
        }
        Err(err) => {
            log::warn!(
                "Could not load {}: {}, using procedural block textures",
                path.display(),
                err
            );
            None
        }
    }
}

/// Layer-major RGBA bytes from an image of vertically stacked layers.
///
/// # Returns
/// `None` unless the image is exactly one layer wide and `TEXTURE_LAYER_COUNT` layers tall
pub fn block_layers_from_image(image: &RgbaImage) -> Option<Vec<u8>> {
    if image.width() != BLOCK_TEXTURE_SIZE
        || image.height() != BLOCK_TEXTURE_SIZE * TEXTURE_LAYER_COUNT
    {
        return None;
    }
    // Rows of stacked layers are already in layer-major order.
    Some(image.as_raw().clone())
}

/// Layer-major RGBA bytes for the built-in block textures.
///
/// Every layer is its base color with a fixed per-pixel brightness jitter, and the
/// leaves layer gets a pattern of fully transparent holes.
pub fn procedural_block_layers() -> Vec<u8> {
    let layer_pixels = (BLOCK_TEXTURE_SIZE * BLOCK_TEXTURE_SIZE) as usize;
    let mut rng = fastrand::Rng::with_seed(0x5eed_b10c);
    let mut pixels = Vec::with_capacity(layer_pixels * 4 * PROCEDURAL_COLORS.len());

    for (layer, color) in PROCEDURAL_COLORS.iter().enumerate() {
        for _ in 0..layer_pixels {
            let jitter = rng.i16(-18..=18);
            for channel in &color[..3] {
                pixels.push((*channel as i16 + jitter).clamp(0, 255) as u8);
            }
            let alpha = if layer == LEAVES_LAYER {
                if rng.u8(..) < 64 {
                    0
                } else {
                    255
                }
            } else {
                color[3]
            };
            pixels.push(alpha);
        }
    }

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedural_set_covers_every_layer() {
        let pixels = procedural_block_layers();
        let layer_bytes = (BLOCK_TEXTURE_SIZE * BLOCK_TEXTURE_SIZE * 4) as usize;
        assert_eq!(pixels.len(), layer_bytes * TEXTURE_LAYER_COUNT as usize);

        let leaves = &pixels[LEAVES_LAYER * layer_bytes..(LEAVES_LAYER + 1) * layer_bytes];
        assert!(leaves.chunks(4).any(|pixel| pixel[3] == 0));
        assert!(leaves.chunks(4).any(|pixel| pixel[3] == 255));
    }

    #[test]
    fn stacked_image_must_match_layer_layout() {
        let good = RgbaImage::new(BLOCK_TEXTURE_SIZE, BLOCK_TEXTURE_SIZE * TEXTURE_LAYER_COUNT);
        let bad = RgbaImage::new(BLOCK_TEXTURE_SIZE * 2, BLOCK_TEXTURE_SIZE);

        assert_eq!(
            block_layers_from_image(&good).map(|bytes| bytes.len()),
            Some(procedural_block_layers().len())
        );
        assert!(block_layers_from_image(&bad).is_none());
    }
}
