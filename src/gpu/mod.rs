// src/gpu/mod.rs
//! wgpu device setup and the terrain renderer.

pub mod renderer;
pub mod texture;
pub mod upscale;

pub use renderer::Renderer;

use std::sync::Arc;

use winit::window::Window;

use crate::context::OptionContext;
use crate::error::Result;

/// Instance, adapter, device and the window surface, created together.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
}

impl GpuContext {
    /// Any failure here is fatal: there is nothing to draw into.
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            dx12_shader_compiler: Default::default(),
            flags: wgpu::InstanceFlags::empty(),
            gles_minor_version: wgpu::Gles3MinorVersion::Automatic,
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can present to this window")?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("relief_device"),
                    required_features: wgpu::Features::empty(),
                    // take the adapter's texture size limits so big maps stay sharp
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface,
        })
    }

    /// Largest 2D texture side the device accepts.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// sRGB surface format when available, so shader output is linear.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        let caps = self.surface.get_capabilities(&self.adapter);
        caps.formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb)
    }

    pub fn alpha_mode(&self) -> wgpu::CompositeAlphaMode {
        self.surface
            .get_capabilities(&self.adapter)
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto)
    }
}
