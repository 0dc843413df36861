// src/config.rs
//! Startup constants for the viewer, gathered into one typed struct.
//!
//! There is no runtime configuration surface: `ViewerConfig::default()` is the
//! configuration. Tests build their own values to fabricate contexts.

use std::path::PathBuf;

use glam::Vec3;

use crate::material::MaterialParams;

/// Plane size and grid density for the terrain surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    pub width: f32,
    pub height: f32,
    pub segments_x: u32,
    pub segments_y: u32,
}

/// Perspective camera parameters plus the fixed startup pose.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    /// XYZ Euler rotation in degrees.
    pub rotation_deg: Vec3,
}

/// Map-style controls tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlsConfig {
    pub target: Vec3,
    pub screen_space_panning: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Pixels panned per arrow key press.
    pub key_pan_speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightsConfig {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub point_color: Vec3,
    pub point_intensity: f32,
    pub point_position: Vec3,
    /// 0 disables the range cutoff.
    pub point_distance: f32,
    pub point_decay: f32,
}

/// Everything the viewer needs at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub title: String,
    pub color_map: PathBuf,
    pub elevation_map: PathBuf,
    pub surface: SurfaceConfig,
    pub material: MaterialParams,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub lights: LightsConfig,
    /// Linear-space clear color.
    pub clear_color: [f64; 4],
    /// Upper bound on the device pixel ratio used for the drawing surface.
    pub max_pixel_ratio: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 180.0,
            segments_x: 1000,
            segments_y: 1000,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 100.0,
            near: 0.1,
            far: 700.0,
            position: Vec3::new(0.0, 0.0, 50.0),
            rotation_deg: Vec3::new(10.0, 0.0, 0.0),
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            screen_space_panning: false,
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 100.0,
            max_distance: 500.0,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            key_pan_speed: 7.0,
        }
    }
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::ONE,
            ambient_intensity: 1.0,
            point_color: Vec3::ONE,
            point_intensity: 100_000.0,
            point_position: Vec3::new(100.0, 200.0, -200.0),
            point_distance: 0.0,
            point_decay: 2.0,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Relief".to_string(),
            color_map: PathBuf::from("static/textures/8081_earthmap10k.jpg"),
            elevation_map: PathBuf::from("static/textures/gebco_08_rev_elev_21600x10800.png"),
            surface: SurfaceConfig::default(),
            material: MaterialParams::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            lights: LightsConfig::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            max_pixel_ratio: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_viewer_setup() {
        let cfg = ViewerConfig::default();
        assert_eq!(cfg.surface.segments_x, 1000);
        assert_eq!(cfg.camera.position, Vec3::new(0.0, 0.0, 50.0));
        assert_eq!(cfg.controls.damping_factor, 0.05);
        assert_eq!((cfg.controls.min_distance, cfg.controls.max_distance), (100.0, 500.0));
        assert!(!cfg.controls.screen_space_panning);
        assert_eq!(cfg.max_pixel_ratio, 2.0);
    }
}
