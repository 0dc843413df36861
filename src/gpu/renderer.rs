// src/gpu/renderer.rs
//! Forward renderer for the terrain mesh plus the egui overlay.
//!
//! Bind group 0 holds per-frame data (camera, lights). Bind group 1 holds the
//! material uniform and both textures; it is rebuilt when a texture finishes
//! loading and replaces its placeholder.

use std::sync::Arc;

use bytemuck::Zeroable;
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::texture::{DepthTarget, TextureSlot, COLOR_PLACEHOLDER, DEPTH_FORMAT, ELEVATION_PLACEHOLDER};
use super::upscale::{Extents, Upscaler};
use super::GpuContext;
use crate::app::AppContext;
use crate::camera::CameraUniform;
use crate::context::OptionContext;
use crate::error::Result;
use crate::geometry::Vertex;
use crate::gui::{frame_submission, GuiManager};
use crate::material::MaterialUniform;
use crate::render_loop::SceneDrawer;
use crate::scene::LightsUniform;
use crate::viewport::OutputSurface;

// ----------------------------------------------------------------------------
// Terrain resources
// ----------------------------------------------------------------------------

struct TerrainResources {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    material_buffer: wgpu::Buffer,
    color: TextureSlot,
    elevation: TextureSlot,
    bind_group: wgpu::BindGroup,
}

fn material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    material_buffer: &wgpu::Buffer,
    color: &TextureSlot,
    elevation: &TextureSlot,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("material_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: material_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&color.gpu().view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&color.gpu().sampler),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&elevation.gpu().view),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(&elevation.gpu().sampler),
            },
        ],
    })
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entries(first: u32, visibility: wgpu::ShaderStages) -> [wgpu::BindGroupLayoutEntry; 2] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: first,
            visibility,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: first + 1,
            visibility,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ]
}

// ----------------------------------------------------------------------------
// Renderer
// ----------------------------------------------------------------------------

pub struct Renderer {
    window: Arc<Window>,
    gpu: GpuContext,
    config: wgpu::SurfaceConfiguration,
    logical_size: (f32, f32),
    pixel_ratio: f32,
    extents: Extents,
    depth: DepthTarget,
    upscaler: Upscaler,

    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    terrain: Option<TerrainResources>,

    gui: GuiManager,
    clear_color: wgpu::Color,
    warned_stale_projection: bool,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, clear_color: [f64; 4]) -> Result<Self> {
        let gpu = GpuContext::new(window.clone()).await?;
        let format = gpu.surface_format();
        let size = window.inner_size();

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: gpu.alpha_mode(),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        gpu.surface.configure(&gpu.device, &config);
        log::debug!("Surface {}x{} {:?}", config.width, config.height, format);

        let device = &gpu.device;
        let depth = DepthTarget::new(device, config.width, config.height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("terrain_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("terrain.wgsl").into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let [color_tex, color_sampler] = texture_entries(1, wgpu::ShaderStages::FRAGMENT);
        let [disp_tex, disp_sampler] = texture_entries(3, wgpu::ShaderStages::VERTEX);
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                color_tex,
                color_sampler,
                disp_tex,
                disp_sampler,
            ],
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_uniform"),
            contents: bytemuck::bytes_of(&CameraUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lights_uniform"),
            contents: bytemuck::bytes_of(&LightsUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("terrain_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("terrain_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Vertex::layout()],
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
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let gui = GuiManager::new(device, format, &window);
        let upscaler = Upscaler::new(device, format);
        let scale = window.scale_factor() as f32;
        let extents = Extents {
            scene: (config.width, config.height),
            output: (config.width, config.height),
        };
        let [r, g, b, a] = clear_color;

        Ok(Self {
            logical_size: (config.width as f32 / scale, config.height as f32 / scale),
            pixel_ratio: scale,
            extents,
            upscaler,
            window,
            config,
            depth,
            pipeline,
            camera_buffer,
            lights_buffer,
            frame_bind_group,
            material_layout,
            terrain: None,
            gui,
            clear_color: wgpu::Color { r, g, b, a },
            warned_stale_projection: false,
            gpu,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.gpu.max_texture_dimension()
    }

    /// Give egui first look at a window event. True if it was consumed.
    pub fn handle_gui_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        self.gui.handle_event(&self.window, event)
    }

    /// Upload the terrain mesh and set up its material. Textures start as
    /// placeholders and are swapped in by `draw` once decoded.
    pub fn attach_scene(&mut self, app: &AppContext) -> Result<()> {
        let mesh = app.surface()?;
        let device = &self.gpu.device;
        let queue = &self.gpu.queue;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("terrain_vertices"),
            contents: bytemuck::cast_slice(&mesh.geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("terrain_indices"),
            contents: bytemuck::cast_slice(&mesh.geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("material_uniform"),
            contents: bytemuck::bytes_of(&mesh.material.uniform()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let color = TextureSlot::new(device, queue, "color_map", mesh.material.color_map.clone(), COLOR_PLACEHOLDER)?;
        let elevation = TextureSlot::new(
            device,
            queue,
            "elevation_map",
            mesh.material.displacement_map.clone(),
            ELEVATION_PLACEHOLDER,
        )?;
        let bind_group = material_bind_group(device, &self.material_layout, &material_buffer, &color, &elevation);

        log::debug!(
            "Terrain uploaded: {} vertices, {} triangles",
            mesh.geometry.vertex_count(),
            mesh.geometry.triangle_count()
        );
        self.terrain = Some(TerrainResources {
            vertex_buffer,
            index_buffer,
            index_count: mesh.geometry.index_count() as u32,
            material_buffer,
            color,
            elevation,
            bind_group,
        });
        Ok(())
    }

    /// Swap in any texture that finished decoding since the last frame.
    fn sync_textures(&mut self) -> Result<()> {
        let Some(terrain) = self.terrain.as_mut() else {
            return Ok(());
        };
        let device = &self.gpu.device;
        let queue = &self.gpu.queue;
        let changed = terrain.color.sync(device, queue)? | terrain.elevation.sync(device, queue)?;
        if changed {
            terrain.bind_group = material_bind_group(
                device,
                &self.material_layout,
                &terrain.material_buffer,
                &terrain.color,
                &terrain.elevation,
            );
        }
        Ok(())
    }

    fn configure_surface(&mut self) {
        self.gpu.surface.configure(&self.gpu.device, &self.config);
    }

    /// Reconfigure for the current logical size and pixel ratio. The
    /// swapchain follows the window; the scene follows the capped ratio.
    fn apply_size(&mut self) {
        let window = self.window.inner_size();
        let extents = Extents::new(
            self.logical_size,
            self.pixel_ratio,
            (window.width, window.height),
            self.max_texture_dimension(),
        );
        if extents == self.extents {
            return;
        }

        if extents.output != self.extents.output {
            (self.config.width, self.config.height) = extents.output;
            self.configure_surface();
            log::debug!("Surface reconfigured to {}x{}", extents.output.0, extents.output.1);
        }
        let device = &self.gpu.device;
        self.depth = DepthTarget::new(device, extents.scene.0, extents.scene.1);
        self.upscaler.resize(device, extents);
        self.extents = extents;
    }
}

impl OutputSurface for Renderer {
    fn set_size(&mut self, width: f32, height: f32) {
        self.logical_size = (width, height);
        self.apply_size();
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
        self.apply_size();
    }
}

impl SceneDrawer for Renderer {
    fn draw(&mut self, app: &mut AppContext) -> Result<()> {
        self.sync_textures()?;

        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::OutOfMemory) => crate::bail!("surface out of memory"),
            Err(err) => {
                log::warn!("Failed to acquire frame: {:?}. Reconfiguring surface.", err);
                self.configure_surface();
                return Ok(());
            }
        };
        let output_view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        // sliders run before the uniforms are written so an edit shows this frame
        let mesh = app
            .scene
            .mesh_mut(app.surface_id)
            .context("terrain mesh missing from scene")?;
        let panel = &mut app.panel;
        let gui_frame = self.gui.run(&self.window, self.logical_size, self.pixel_ratio, |ctx| {
            panel.show(ctx, &mut mesh.material);
        });
        let material = mesh.material.uniform();

        if app.camera.is_projection_stale() && !self.warned_stale_projection {
            log::warn!("Drawing with a stale projection matrix");
            self.warned_stale_projection = true;
        }
        let queue = &self.gpu.queue;
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&CameraUniform::from_camera(&app.camera)));
        queue.write_buffer(&self.lights_buffer, 0, bytemuck::bytes_of(&app.scene.light_uniform()));

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        let scene_view = self.upscaler.scene_view(&output_view);

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("terrain_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: scene_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(terrain) = &self.terrain {
                queue.write_buffer(&terrain.material_buffer, 0, bytemuck::bytes_of::<MaterialUniform>(&material));
                rpass.set_pipeline(&self.pipeline);
                rpass.set_bind_group(0, &self.frame_bind_group, &[]);
                rpass.set_bind_group(1, &terrain.bind_group, &[]);
                rpass.set_vertex_buffer(0, terrain.vertex_buffer.slice(..));
                rpass.set_index_buffer(terrain.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..terrain.index_count, 0, 0..1);
            }
        }

        let callback_buffers = self.gui.paint(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            scene_view,
            [self.extents.scene.0, self.extents.scene.1],
            gui_frame,
        );
        self.upscaler.blit(&mut encoder, &output_view);

        self.gpu
            .queue
            .submit(frame_submission(callback_buffers, encoder.finish()));
        self.window.pre_present_notify();
        frame.present();
        Ok(())
    }
}
