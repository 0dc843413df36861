// src/gui.rs
//! egui overlay hosting the slider panel.
//!
//! Events go to egui first; anything it consumes (a drag on a slider) never
//! reaches the map controls. The overlay is drawn after the scene with
//! `LoadOp::Load`, so it sits on top of the terrain.

use egui::{Color32, Context as EguiContext, Rounding, Visuals};
use egui_wgpu::{Renderer as EguiRenderer, ScreenDescriptor};
use egui_winit::State as EguiWinitState;
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{event::WindowEvent, window::Window};

/// Tessellated output of one egui pass, ready to paint.
pub struct GuiFrame {
    textures_delta: egui::TexturesDelta,
    paint_jobs: Vec<egui::ClippedPrimitive>,
    pixels_per_point: f32,
}

pub struct GuiManager {
    ctx: EguiContext,
    winit_state: EguiWinitState,
    renderer: EguiRenderer,
}

impl GuiManager {
    pub fn new(device: &Device, surface_format: TextureFormat, window: &Window) -> Self {
        let ctx = EguiContext::default();
        apply_theme(&ctx);

        let winit_state = EguiWinitState::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = EguiRenderer::new(device, surface_format, None, 1, false);

        Self {
            ctx,
            winit_state,
            renderer,
        }
    }

    /// Feed a window event to egui. Returns true if egui consumed it.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.winit_state.on_window_event(window, event).consumed
    }

    /// Run one egui pass. `pixel_ratio` is the ratio the scene is drawn at,
    /// which may be below the display's own.
    pub fn run(
        &mut self,
        window: &Window,
        logical_size: (f32, f32),
        pixel_ratio: f32,
        build: impl FnMut(&EguiContext),
    ) -> GuiFrame {
        let mut raw_input = self.winit_state.take_egui_input(window);
        override_scale(&mut raw_input, logical_size, pixel_ratio);

        let output = self.ctx.run(raw_input, build);
        self.winit_state
            .handle_platform_output(window, output.platform_output);

        let paint_jobs = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        GuiFrame {
            textures_delta: output.textures_delta,
            paint_jobs,
            pixels_per_point: output.pixels_per_point,
        }
    }

    /// Paint a finished frame over `view`. Returns the command buffers egui
    /// recorded for paint callbacks; submit them with [`frame_submission`].
    pub fn paint(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        view: &TextureView,
        size_in_pixels: [u32; 2],
        frame: GuiFrame,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, delta) in &frame.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }

        let screen = ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: frame.pixels_per_point,
        };
        let callback_buffers = self
            .renderer
            .update_buffers(device, queue, encoder, &frame.paint_jobs, &screen);

        {
            let rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("gui"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.renderer
                .render(&mut rpass.forget_lifetime(), &frame.paint_jobs, &screen);
        }

        for id in &frame.textures_delta.free {
            self.renderer.free_texture(id);
        }
        callback_buffers
    }
}

/// Submission order for one frame: paint-callback buffers first, then the
/// frame's own encoder, which samples what they produced.
pub fn frame_submission<T>(callback_buffers: Vec<T>, frame: T) -> impl Iterator<Item = T> {
    callback_buffers.into_iter().chain(std::iter::once(frame))
}

/// Lay egui out in logical pixels at the scene's pixel ratio.
fn override_scale(raw_input: &mut egui::RawInput, logical_size: (f32, f32), pixel_ratio: f32) {
    raw_input.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(logical_size.0, logical_size.1),
    ));
    let id = raw_input.viewport_id;
    if let Some(info) = raw_input.viewports.get_mut(&id) {
        info.native_pixels_per_point = Some(pixel_ratio);
    }
}

fn apply_theme(ctx: &EguiContext) {
    let mut visuals = Visuals::dark();
    visuals.window_fill = Color32::from_rgba_unmultiplied(26, 26, 26, 235);
    visuals.window_rounding = Rounding::same(4.0);
    visuals.widgets.inactive.rounding = Rounding::same(2.0);
    visuals.widgets.hovered.rounding = Rounding::same(2.0);
    visuals.widgets.active.rounding = Rounding::same(2.0);
    ctx.set_visuals(visuals);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_buffers_submitted_before_frame() {
        let order: Vec<_> = frame_submission(vec!["callback-a", "callback-b"], "frame").collect();
        assert_eq!(order, ["callback-a", "callback-b", "frame"]);

        let alone: Vec<_> = frame_submission(Vec::new(), "frame").collect();
        assert_eq!(alone, ["frame"]);
    }

    #[test]
    fn test_override_scale_uses_logical_size() {
        let mut raw = egui::RawInput::default();
        raw.viewports
            .insert(egui::ViewportId::ROOT, egui::ViewportInfo::default());
        override_scale(&mut raw, (640.0, 480.0), 2.0);
        let rect = raw.screen_rect.unwrap();
        assert_eq!(rect.size(), egui::vec2(640.0, 480.0));
        assert_eq!(
            raw.viewports[&egui::ViewportId::ROOT].native_pixels_per_point,
            Some(2.0)
        );
    }
}
