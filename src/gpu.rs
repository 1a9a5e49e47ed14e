//! Core GPU context and device management.
//!
//! [`GpuContext`] holds the wgpu objects every pass needs: the surface it
//! presents to, the device and queue, and the surface configuration. It is
//! created once from a winit [`Window`] and passed by reference to the 2D
//! renderer and to texture uploads.
//!
//! Sizes come in two flavours. The surface is configured in physical pixels,
//! while everything drawn through [`Draw2d`](crate::Draw2d) is laid out in
//! logical pixels so a 400×300 window looks the same on a HiDPI display.
//!
//! [`Window`]: winit::window::Window

use std::sync::Arc;

use glam::Vec2;
use winit::window::Window;

use crate::error::GpuError;

/// Core GPU context holding wgpu resources.
///
/// All fields are public to allow direct access to wgpu APIs when needed.
pub struct GpuContext {
    /// The surface for presenting rendered frames to the window.
    pub surface: wgpu::Surface<'static>,
    /// The logical GPU device for creating resources and pipelines.
    pub device: wgpu::Device,
    /// The command queue for submitting work to the GPU.
    pub queue: wgpu::Queue,
    /// Current surface configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
    /// Physical pixels per logical pixel.
    pub scale_factor: f64,
}

impl GpuContext {
    /// Create a new GPU context from a winit window.
    ///
    /// This performs all wgpu initialization:
    /// 1. Creates a wgpu instance with primary backends (Vulkan, Metal, DX12)
    /// 2. Creates a surface for the window
    /// 3. Requests a suitable GPU adapter
    /// 4. Creates the logical device and command queue
    /// 5. Configures the surface with an sRGB format and Fifo present mode
    pub fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor();

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
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Swivel Device"),
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
            .ok_or(GpuError::UnsupportedSurface)?;
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
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            scale_factor,
        })
    }

    /// Resize the surface to new physical dimensions.
    ///
    /// Ignores zero-sized dimensions, which show up while the window is minimized.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Re-apply the current configuration after the surface was lost or went stale.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Surface size in logical pixels, the space all 2D drawing happens in.
    pub fn logical_size(&self) -> Vec2 {
        logical_size(self.config.width, self.config.height, self.scale_factor)
    }
}

fn logical_size(width: u32, height: u32, scale_factor: f64) -> Vec2 {
    let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
    Vec2::new(
        (width as f64 / scale) as f32,
        (height as f64 / scale) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_size_divides_out_scale() {
        assert_eq!(logical_size(800, 600, 2.0), Vec2::new(400.0, 300.0));
        assert_eq!(logical_size(400, 300, 1.0), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn logical_size_ignores_bogus_scale() {
        assert_eq!(logical_size(400, 300, 0.0), Vec2::new(400.0, 300.0));
    }
}
