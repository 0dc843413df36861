// src/gpu/upscale.rs
//! Drawing below the display's pixel density.
//!
//! The swapchain always matches the window's physical size; some platforms
//! reject any other extent. When the capped pixel ratio makes the scene
//! smaller than that, the scene and overlay are drawn into an offscreen
//! target and stretched onto the swapchain image at the end of the frame.

use crate::viewport::physical_extent;

/// Sizes for one frame: what the scene is drawn at, and the swapchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extents {
    pub scene: (u32, u32),
    pub output: (u32, u32),
}

impl Extents {
    /// `window` is the physical inner size; both extents are capped at
    /// `max_dimension` and never exceed the swapchain.
    pub fn new(logical: (f32, f32), pixel_ratio: f32, window: (u32, u32), max_dimension: u32) -> Self {
        let clamp = |v: u32| v.clamp(1, max_dimension.max(1));
        let output = (clamp(window.0), clamp(window.1));
        let (w, h) = physical_extent(logical.0, logical.1, pixel_ratio);
        Self {
            scene: (clamp(w).min(output.0), clamp(h).min(output.1)),
            output,
        }
    }

    pub fn needs_upscale(&self) -> bool {
        self.scene != self.output
    }
}

struct ScaledTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

pub struct Upscaler {
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    target: Option<ScaledTarget>,
}

impl Upscaler {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("upscale_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("upscale.wgsl").into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("upscale_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("upscale_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("upscale_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("upscale_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            format,
            pipeline,
            layout,
            sampler,
            target: None,
        }
    }

    /// Create, replace or drop the offscreen target for `extents`.
    pub fn resize(&mut self, device: &wgpu::Device, extents: Extents) {
        if !extents.needs_upscale() {
            self.target = None;
            return;
        }

        let (width, height) = extents.scene;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("scene_target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("upscale_bind_group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        log::debug!(
            "Drawing at {}x{}, upscaled to {}x{}",
            width,
            height,
            extents.output.0,
            extents.output.1
        );
        self.target = Some(ScaledTarget {
            _texture: texture,
            view,
            bind_group,
        });
    }

    /// Where the scene goes this frame: the offscreen target, or straight
    /// into the swapchain image.
    pub fn scene_view<'a>(&'a self, output: &'a wgpu::TextureView) -> &'a wgpu::TextureView {
        match &self.target {
            Some(target) => &target.view,
            None => output,
        }
    }

    /// Stretch the offscreen target over `output`. No-op at full resolution.
    pub fn blit(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        let Some(target) = &self.target else { return };
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("upscale_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &target.bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swapchain_keeps_window_size_on_dense_displays() {
        // 1280x720 logical on a 3x display, drawn at 2x
        let e = Extents::new((1280.0, 720.0), 2.0, (3840, 2160), 8192);
        assert_eq!(e.output, (3840, 2160));
        assert_eq!(e.scene, (2560, 1440));
        assert!(e.needs_upscale());
    }

    #[test]
    fn test_full_density_draws_straight_to_swapchain() {
        let e = Extents::new((800.0, 600.0), 2.0, (1600, 1200), 8192);
        assert_eq!(e.scene, e.output);
        assert!(!e.needs_upscale());

        // fractional scale: rounding must not force an offscreen pass
        let e = Extents::new((1366.0 / 1.25, 768.0 / 1.25), 1.25, (1366, 768), 8192);
        assert!(!e.needs_upscale());
    }

    #[test]
    fn test_extents_respect_texture_limit() {
        let e = Extents::new((4000.0, 1000.0), 2.0, (12000, 3000), 4096);
        assert_eq!(e.output, (4096, 3000));
        assert_eq!(e.scene, (4096, 2000));
    }

    #[test]
    fn test_minimized_window_still_has_a_pixel() {
        let e = Extents::new((0.0, 0.0), 1.0, (0, 0), 8192);
        assert_eq!(e.output, (1, 1));
        assert_eq!(e.scene, (1, 1));
    }
}
