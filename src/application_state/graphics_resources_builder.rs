//! # Graphics Resources Builder
//!
//! Creates the window and the wgpu context, then hands them to the event loop.
//!
//! The main components are:
//! - `Graphics`: Holds all graphics-related resources
//! - `GraphicsBuilder`: Helper for the one-shot graphics initialization
//! - `MaybeGraphics`: Represents the various states of graphics initialization

use std::{fmt, future::Future, sync::Arc};

use wgpu::{Adapter, Device, Instance, Queue, Surface, SurfaceConfiguration};
use winit::{
    dpi::LogicalSize,
    event_loop::{ActiveEventLoop, EventLoopProxy},
    window::{CursorGrabMode, Window},
};

const WINDOW_TITLE: &str = "Voxel World";

/// Contains all graphics-related resources required by the application.
#[allow(dead_code)]
#[derive(Default)]
pub struct Graphics {
    pub window: Option<Arc<Window>>,
    pub instance: Option<Instance>,
    pub surface: Option<Surface<'static>>,
    pub surface_config: Option<SurfaceConfiguration>,
    pub adapter: Option<Adapter>,
    pub device: Option<Device>,
    pub queue: Option<Queue>,
}

/// Why the graphics context could not be created.
#[derive(Debug)]
pub enum GraphicsError {
    Window(winit::error::OsError),
    Surface(wgpu::CreateSurfaceError),
    Adapter(wgpu::RequestAdapterError),
    Device(wgpu::RequestDeviceError),
    /// The surface reports no usable format for this adapter
    UnsupportedSurface,
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::Window(err) => write!(f, "could not create the window: {err}"),
            GraphicsError::Surface(err) => write!(f, "could not create the surface: {err}"),
            GraphicsError::Adapter(err) => write!(f, "no suitable GPU adapter: {err}"),
            GraphicsError::Device(err) => write!(f, "could not open the GPU device: {err}"),
            GraphicsError::UnsupportedSurface => {
                write!(f, "the surface is not supported by the adapter")
            }
        }
    }
}

impl std::error::Error for GraphicsError {}

/// Hides the cursor and keeps it in the window for mouse look.
///
/// Not every platform supports both grab modes, so `Confined` is tried after
/// `Locked`.
fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        log::warn!("Could not grab the cursor: {err}");
    }
    window.set_cursor_visible(false);
}

/// Creates the window, surface and device.
///
/// The window is created immediately; the adapter and device requests are
/// returned as a future.
///
/// # Arguments
/// * `event_loop` - The active event loop used to create the window and surface
///
/// # Returns
/// A `Future` that resolves to the initialized `Graphics`, or the first failure
fn create_graphics(
    event_loop: &ActiveEventLoop,
) -> Result<impl Future<Output = Result<Graphics, GraphicsError>> + 'static, GraphicsError> {
    let window_attrs = Window::default_attributes()
        .with_title(WINDOW_TITLE)
        .with_inner_size(LogicalSize::new(1280.0, 720.0));
    let window = Arc::new(
        event_loop
            .create_window(window_attrs)
            .map_err(GraphicsError::Window)?,
    );
    grab_cursor(&window);

    // Backends::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        flags: wgpu::InstanceFlags::empty(),
        backend_options: wgpu::BackendOptions::from_env_or_default(),
    });

    let surface = instance
        .create_surface(window.clone())
        .map_err(GraphicsError::Surface)?;

    Ok(async move {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(GraphicsError::Adapter)?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("voxel_world_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(GraphicsError::Device)?;

        let size = window.inner_size();

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(fallback_format) = surface_caps.formats.first().copied() else {
            return Err(GraphicsError::UnsupportedSurface);
        };
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(fallback_format);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);
        Ok(Graphics {
            window: Some(window),
            instance: Some(instance),
            surface: Some(surface),
            surface_config: Some(surface_config),
            adapter: Some(adapter),
            device: Some(device),
            queue: Some(queue),
        })
    })
}

/// Helper struct for managing the initialization of graphics resources.
pub struct GraphicsBuilder {
    event_loop_proxy: Option<EventLoopProxy<Graphics>>,
}

/// Represents the possible states of the graphics initialization process.
pub enum MaybeGraphics {
    /// State before the event loop resumed
    Builder(GraphicsBuilder),

    /// State when graphics resources are fully initialized and ready for use
    Graphics(Graphics),

    /// State after graphics resources have been moved to the engine
    Moved,
}

impl GraphicsBuilder {
    /// Creates a new GraphicsBuilder with the specified event loop proxy.
    ///
    /// # Arguments
    /// * `event_loop_proxy` - Used to send the initialized graphics resources back to the event loop
    pub fn new(event_loop_proxy: EventLoopProxy<Graphics>) -> Self {
        Self {
            event_loop_proxy: Some(event_loop_proxy),
        }
    }

    /// Creates the graphics resources and sends them to the event loop.
    ///
    /// Exits the event loop when the GPU cannot be initialized.
    ///
    /// # Arguments
    /// * `event_loop` - The active event loop used to create the graphics context
    pub fn build_and_send(&mut self, event_loop: &ActiveEventLoop) {
        let Some(event_loop_proxy) = self.event_loop_proxy.take() else {
            // Already built
            return;
        };

        let graphics = create_graphics(event_loop).and_then(pollster::block_on);
        match graphics {
            Ok(gfx) => {
                if event_loop_proxy.send_event(gfx).is_err() {
                    log::error!("Event loop closed before graphics were ready");
                }
            }
            Err(err) => {
                log::error!("Graphics initialization failed: {err}");
                event_loop.exit();
            }
        }
    }
}
