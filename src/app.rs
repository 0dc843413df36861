// src/app.rs
//! Viewer state owned by the event loop thread.
//!
//! Everything the frame callback touches lives in one `AppContext`: the scene
//! (with the terrain mesh and its material), the camera, the map controls,
//! the slider panel and the current viewport size.

use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;

use crate::camera::PerspectiveCamera;
use crate::config::ViewerConfig;
use crate::context::OptionContext;
use crate::controls::MapControls;
use crate::error::Result;
use crate::geometry::build_surface;
use crate::input::{apply_gesture, PointerTracker};
use crate::material::build_material;
use crate::panel::ParameterPanel;
use crate::scene::{Light, Mesh, NodeId, Scene};
use crate::texture::{AssetLoader, ColorEncoding, TextureHandle};
use crate::time::FrameClock;
use crate::viewport::{handle_resize, OutputSurface, ViewportSize};

pub struct AppContext {
    pub config: ViewerConfig,
    pub scene: Scene,
    /// Node holding the terrain mesh.
    pub surface_id: NodeId,
    pub camera: PerspectiveCamera,
    pub controls: MapControls,
    pub panel: ParameterPanel,
    pub pointer: PointerTracker,
    pub viewport: ViewportSize,
    pub clock: FrameClock,
}

impl AppContext {
    /// Build the viewer state. Both textures start loading in the background.
    pub fn new(config: ViewerConfig, loader: &AssetLoader, viewport: ViewportSize) -> Result<Self> {
        let color = loader.load(&config.color_map).with_encoding(ColorEncoding::Srgb);
        let elevation = loader.load(&config.elevation_map);
        Self::with_textures(config, color, elevation, viewport)
    }

    /// Build the viewer state around textures the caller already has.
    pub fn with_textures(
        config: ViewerConfig,
        color_map: TextureHandle,
        elevation_map: TextureHandle,
        viewport: ViewportSize,
    ) -> Result<Self> {
        let s = &config.surface;
        let geometry = build_surface(s.width, s.height, s.segments_x, s.segments_y)?;
        let material = build_material(color_map, elevation_map, &config.material);
        let panel = ParameterPanel::standard(&material)?;

        let mut scene = Scene::new();
        let surface_id = scene.add(Mesh::new(geometry, material));
        let l = &config.lights;
        scene.add(Light::ambient(l.ambient_color, l.ambient_intensity));
        scene.add(Light::Point {
            color: l.point_color,
            intensity: l.point_intensity,
            position: l.point_position,
            distance: l.point_distance,
            decay: l.point_decay,
        });

        let c = &config.camera;
        let aspect = if viewport.is_empty() { 1.0 } else { viewport.aspect() };
        let mut camera = PerspectiveCamera::new(c.fov_deg, aspect, c.near, c.far);
        camera.position = c.position;
        camera.set_rotation_euler_deg(c.rotation_deg);

        let controls = MapControls::new(config.controls.clone());

        log::info!(
            "Viewer ready: {}x{} grid, camera at {:?}",
            s.segments_x,
            s.segments_y,
            camera.position
        );

        Ok(Self {
            config,
            scene,
            surface_id,
            camera,
            controls,
            panel,
            pointer: PointerTracker::new(),
            viewport,
            clock: FrameClock::new(),
        })
    }

    pub fn surface(&self) -> Result<&Mesh> {
        self.scene.mesh(self.surface_id).context("terrain mesh missing from scene")
    }

    pub fn surface_mut(&mut self) -> Result<&mut Mesh> {
        self.scene.mesh_mut(self.surface_id).context("terrain mesh missing from scene")
    }

    /// Window size changed. Skips zero-area sizes.
    pub fn resize<S: OutputSurface + ?Sized>(&mut self, surface: &mut S, size: ViewportSize) -> bool {
        handle_resize(
            &mut self.viewport,
            &mut self.camera,
            surface,
            size,
            self.config.max_pixel_ratio,
        )
    }

    /// Window resized or moved to a display with another scale factor. Both
    /// change the logical size, so both go through [`AppContext::resize`].
    pub fn resize_physical<S: OutputSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        size: PhysicalSize<u32>,
        scale_factor: f64,
    ) -> bool {
        self.resize(surface, ViewportSize::from_physical(size, scale_factor))
    }

    /// Route a window event to the controls. Returns true if it produced a
    /// gesture.
    pub fn handle_input(&mut self, event: &WindowEvent, scale_factor: f64) -> bool {
        match self.pointer.handle_window_event(event, scale_factor) {
            Some(gesture) => {
                apply_gesture(gesture, &mut self.controls, &self.camera, self.viewport.height);
                true
            }
            None => false,
        }
    }

    /// Advance the controls by one frame.
    pub fn update_controls(&mut self) -> bool {
        self.controls.update(&mut self.camera)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::SurfaceConfig;
    use crate::texture::DecodedImage;
    use crate::viewport::tests::RecordingSurface;
    use glam::Vec3;

    pub(crate) fn small_context() -> AppContext {
        let config = ViewerConfig {
            surface: SurfaceConfig {
                segments_x: 4,
                segments_y: 4,
                ..SurfaceConfig::default()
            },
            ..ViewerConfig::default()
        };
        let pixel = |v| DecodedImage { width: 1, height: 1, pixels: vec![v; 4] };
        AppContext::with_textures(
            config,
            TextureHandle::from_image("color", pixel(255)).with_encoding(ColorEncoding::Srgb),
            TextureHandle::from_image("elevation", pixel(0)),
            ViewportSize::new(800.0, 600.0, 1.0),
        )
        .unwrap()
    }

    #[test]
    fn test_startup_scene() {
        let ctx = small_context();
        assert_eq!(ctx.scene.children().len(), 3);
        assert_eq!(ctx.scene.lights().count(), 2);
        let mesh = ctx.surface().unwrap();
        assert_eq!(mesh.geometry.vertex_count(), 25);
        assert_eq!(mesh.material.color_map.encoding(), ColorEncoding::Srgb);
        assert_eq!(mesh.material.displacement_map.encoding(), ColorEncoding::Linear);
        assert_eq!(ctx.panel.bindings().len(), 4);
    }

    #[test]
    fn test_startup_camera_pose() {
        let ctx = small_context();
        assert_eq!(ctx.camera.position, Vec3::new(0.0, 0.0, 50.0));
        assert_eq!(ctx.camera.fov_deg, 100.0);
        assert_eq!(ctx.camera.aspect(), 800.0 / 600.0);
        let e = ctx.camera.rotation_euler_deg();
        approx::assert_abs_diff_eq!(e.x, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_resize_goes_through_context() {
        let mut ctx = small_context();
        let mut surface = RecordingSurface::default();
        assert!(ctx.resize(&mut surface, ViewportSize::new(1024.0, 512.0, 3.0)));
        assert_eq!(ctx.camera.aspect(), 2.0);
        assert_eq!(surface.size, (1024.0, 512.0));
        assert_eq!(surface.pixel_ratio, 2.0);
        assert_eq!(ctx.viewport.width, 1024.0);
    }

    #[test]
    fn test_scale_change_without_size_change_updates_viewport() {
        let mut ctx = small_context();
        let mut surface = RecordingSurface::default();
        let physical = PhysicalSize::new(1600, 1200);
        assert!(ctx.resize_physical(&mut surface, physical, 1.0));
        assert_eq!(ctx.viewport.width, 1600.0);

        // same physical size, display moved to 2x
        assert!(ctx.resize_physical(&mut surface, physical, 2.0));
        assert_eq!(ctx.viewport.width, 800.0);
        assert_eq!(ctx.viewport.height, 600.0);
        assert_eq!(ctx.viewport.device_pixel_ratio, 2.0);
        assert_eq!(surface.size, (800.0, 600.0));
        assert_eq!(surface.pixel_ratio, 2.0);
    }

    #[test]
    fn test_new_loads_from_disk_in_background() {
        let dir = std::env::temp_dir().join(format!("relief-app-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let config = ViewerConfig {
            color_map: dir.join("missing-color.jpg"),
            elevation_map: dir.join("missing-elevation.png"),
            surface: SurfaceConfig {
                segments_x: 2,
                segments_y: 2,
                ..SurfaceConfig::default()
            },
            ..ViewerConfig::default()
        };
        let loader = AssetLoader::new(64);
        // missing files are not fatal
        let ctx = AppContext::new(config, &loader, ViewportSize::new(200.0, 100.0, 1.0)).unwrap();
        let material = &ctx.surface().unwrap().material;
        assert_eq!(material.color_map.encoding(), ColorEncoding::Srgb);
        assert!(!material.color_map.is_ready());
    }
}
