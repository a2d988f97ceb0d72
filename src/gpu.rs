//! Core GPU context and device management.
//!
//! [`GpuContext`] holds the wgpu objects every pass needs: surface, device,
//! queue and surface configuration. It is created once from the window and
//! passed by reference to resource creation and frame execution.
//!
//! Validation failures are caught with error scopes rather than the default
//! uncaptured-error panic, so that shader and resource failures during
//! startup become [`crate::ViewerError`]s and a failure during a frame can end
//! the session cleanly. See [`GpuContext::validated`].

use std::sync::Arc;

use winit::window::Window;

use crate::error::{Result, ViewerError};

/// Core GPU context holding wgpu resources.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Create a GPU context for a window.
    ///
    /// Picks an adapter compatible with the window surface, creates the device
    /// with default limits and configures the surface with an sRGB format.
    pub fn new(window: Arc<Window>, vsync: bool) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let info = adapter.get_info();
        log::info!(
            "adapter: {} ({:?}, vendor {:#06x}, driver {} {})",
            info.name,
            info.backend,
            info.vendor,
            info.driver,
            info.driver_info
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("duskview device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| ViewerError::resource("surface reports no supported formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::debug!(
            "surface configured: {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Resize the surface. Zero-sized dimensions (minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    /// Largest 2D texture edge the device accepts.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Run `f` inside a validation error scope.
    ///
    /// Returns the first validation error raised by any device call made
    /// inside `f`.
    pub fn validated<T>(
        &self,
        f: impl FnOnce(&wgpu::Device) -> T,
    ) -> std::result::Result<T, wgpu::Error> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(error),
            None => Ok(value),
        }
    }

    /// Get the next swapchain image.
    ///
    /// `Ok(None)` means the frame should be dropped: the surface was lost or
    /// outdated (and has been reconfigured) or acquisition timed out.
    pub fn acquire_frame(&mut self) -> Result<Option<wgpu::SurfaceTexture>> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("surface acquire timed out, dropping frame");
                Ok(None)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(ViewerError::GpuValidation(
                "out of memory acquiring the surface texture".into(),
            )),
            Err(other) => {
                log::warn!("surface error: {other}, dropping frame");
                Ok(None)
            }
        }
    }
}
