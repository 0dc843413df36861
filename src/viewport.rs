// src/viewport.rs
//! Viewport size tracking and the resize handler.
//!
//! On every size change the handler updates, in order: the camera aspect and
//! its projection, the output surface size, and the output pixel ratio
//! (clamped so high-density displays do not blow up fill-rate).

use winit::dpi::PhysicalSize;

use crate::camera::PerspectiveCamera;

/// Window size in logical pixels plus the display's device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl ViewportSize {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Convert winit's physical inner size into logical size + ratio.
    pub fn from_physical(size: PhysicalSize<u32>, scale_factor: f64) -> Self {
        let logical = size.to_logical::<f32>(scale_factor);
        Self::new(logical.width, logical.height, scale_factor as f32)
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Zero-area sizes show up while a window is minimized.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// The pixel ratio actually used for drawing.
#[inline]
pub fn clamp_pixel_ratio(reported: f32, max: f32) -> f32 {
    reported.min(max)
}

/// Backing-store size for a logical size drawn at `pixel_ratio`.
pub fn physical_extent(width: f32, height: f32, pixel_ratio: f32) -> (u32, u32) {
    let w = (width * pixel_ratio).round().max(1.0) as u32;
    let h = (height * pixel_ratio).round().max(1.0) as u32;
    (w, h)
}

/// Anything the scene is drawn into.
pub trait OutputSurface {
    /// Logical size of the drawing area.
    fn set_size(&mut self, width: f32, height: f32);
    fn set_pixel_ratio(&mut self, ratio: f32);
}

/// Resize handler. Returns `false` (and changes nothing) for zero-area sizes.
pub fn handle_resize<S: OutputSurface + ?Sized>(
    viewport: &mut ViewportSize,
    camera: &mut PerspectiveCamera,
    surface: &mut S,
    new_size: ViewportSize,
    max_pixel_ratio: f32,
) -> bool {
    if new_size.is_empty() {
        log::debug!("Ignoring empty resize {}x{}", new_size.width, new_size.height);
        return false;
    }
    *viewport = new_size;

    camera.set_aspect(viewport.aspect());
    camera.update_projection_matrix();

    surface.set_size(viewport.width, viewport.height);
    let ratio = clamp_pixel_ratio(viewport.device_pixel_ratio, max_pixel_ratio);
    surface.set_pixel_ratio(ratio);

    log::debug!(
        "Resized to {}x{} @{} (drawing at {})",
        viewport.width,
        viewport.height,
        viewport.device_pixel_ratio,
        ratio
    );
    true
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Output surface double that remembers what it was told.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub size: (f32, f32),
        pub pixel_ratio: f32,
        pub calls: Vec<&'static str>,
    }

    impl OutputSurface for RecordingSurface {
        fn set_size(&mut self, width: f32, height: f32) {
            self.size = (width, height);
            self.calls.push("set_size");
        }

        fn set_pixel_ratio(&mut self, ratio: f32) {
            self.pixel_ratio = ratio;
            self.calls.push("set_pixel_ratio");
        }
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(100.0, 1.0, 0.1, 700.0)
    }

    #[test]
    fn test_resize_updates_aspect_and_surface() {
        let sizes = [(1.0, 1.0), (1280.0, 720.0), (333.0, 1999.0), (7.0, 3.0)];
        for (w, h) in sizes {
            let mut viewport = ViewportSize::new(800.0, 600.0, 1.0);
            let mut cam = camera();
            let mut surface = RecordingSurface::default();
            assert!(handle_resize(&mut viewport, &mut cam, &mut surface, ViewportSize::new(w, h, 1.0), 2.0));
            assert_eq!(cam.aspect(), w / h);
            assert!(!cam.is_projection_stale());
            assert_eq!(surface.size, (w, h));
            assert_eq!(surface.calls, ["set_size", "set_pixel_ratio"]);
        }
    }

    #[test]
    fn test_pixel_ratio_is_capped_at_two() {
        for reported in [0.0, 0.5, 1.0, 1.25, 2.0, 2.5, 3.0, 4.0] {
            assert_eq!(clamp_pixel_ratio(reported, 2.0), reported.min(2.0));

            let mut viewport = ViewportSize::new(800.0, 600.0, 1.0);
            let mut cam = camera();
            let mut surface = RecordingSurface::default();
            handle_resize(&mut viewport, &mut cam, &mut surface, ViewportSize::new(640.0, 480.0, reported), 2.0);
            assert_eq!(surface.pixel_ratio, reported.min(2.0));
        }
    }

    #[test]
    fn test_empty_resize_is_ignored() {
        let mut viewport = ViewportSize::new(800.0, 600.0, 1.0);
        let mut cam = PerspectiveCamera::new(100.0, 800.0 / 600.0, 0.1, 700.0);
        let mut surface = RecordingSurface::default();
        assert!(!handle_resize(&mut viewport, &mut cam, &mut surface, ViewportSize::new(0.0, 600.0, 1.0), 2.0));
        assert_eq!(viewport.width, 800.0);
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn test_from_physical_divides_by_scale() {
        let v = ViewportSize::from_physical(PhysicalSize::new(2560, 1440), 2.0);
        assert_eq!((v.width, v.height, v.device_pixel_ratio), (1280.0, 720.0, 2.0));
        assert_eq!(physical_extent(v.width, v.height, 1.5), (1920, 1080));
        assert_eq!(physical_extent(0.2, 0.2, 1.0), (1, 1));
    }
}
