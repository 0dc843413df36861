// src/controls.rs
//! Map-style camera controls.
//!
//! The camera orbits a target point. Gestures (rotate, pan, dolly) only
//! accumulate deltas; [`MapControls::update`] applies them once per frame.
//! With damping on, each frame applies `damping_factor` of the accumulated
//! motion and keeps the rest, so the camera glides to a stop.
//!
//! Mapping used by the input layer:
//! - left drag: pan across the ground plane
//! - right drag: rotate around the target
//! - middle drag / wheel: dolly
//! - arrow keys: pan by `key_pan_speed` pixels

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::camera::PerspectiveCamera;
use crate::config::ControlsConfig;

const EPS: f32 = 1e-6;

/// Residual motion below this is dropped so damping actually ends.
const SETTLE_EPS: f32 = 1e-7;

/// Spherical coordinates of the camera offset from the target.
/// `phi` is measured from +Y, `theta` around +Y starting at +Z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keep phi off the poles, where theta is undefined.
    pub fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

/// Arrow-key pan directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanKey {
    Up,
    Down,
    Left,
    Right,
}

pub struct MapControls {
    pub config: ControlsConfig,
    pub enabled: bool,
    target: Vec3,

    // accumulated, not yet applied
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vec3,
    // set by any gesture, even one whose deltas cancel out
    input_pending: bool,

    update_count: u64,
}

impl MapControls {
    pub fn new(config: ControlsConfig) -> Self {
        Self {
            target: config.target,
            config,
            enabled: true,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            input_pending: false,
            update_count: 0,
        }
    }

    /// Point the camera orbits around.
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Number of `update` calls so far.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// True when there is no pending input and no residual damped motion.
    pub fn is_settled(&self) -> bool {
        !self.input_pending
            && self.spherical_delta.theta == 0.0
            && self.spherical_delta.phi == 0.0
            && self.scale == 1.0
            && self.pan_offset == Vec3::ZERO
    }

    // ------------------------------------------------------------------
    // Gestures
    // ------------------------------------------------------------------

    /// Rotate by a pointer delta in logical pixels.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        if !self.enabled || viewport_height <= 0.0 {
            return;
        }
        self.input_pending = true;
        let delta = delta * self.config.rotate_speed;
        self.spherical_delta.theta -= 2.0 * PI * delta.x / viewport_height;
        self.spherical_delta.phi -= 2.0 * PI * delta.y / viewport_height;
    }

    /// Pan by a pointer delta in logical pixels. The world distance per pixel
    /// matches the target's depth so the ground tracks the pointer.
    pub fn pan(&mut self, delta: Vec2, camera: &PerspectiveCamera, viewport_height: f32) {
        if !self.enabled || viewport_height <= 0.0 {
            return;
        }
        self.input_pending = true;
        let delta = delta * self.config.pan_speed;
        let offset = camera.position - self.target;
        let target_distance = offset.length() * (camera.fov_deg.to_radians() / 2.0).tan();

        let right = camera.right();
        self.pan_offset += right * -(2.0 * delta.x * target_distance / viewport_height);

        let up = if self.config.screen_space_panning {
            camera.local_up()
        } else {
            // slide over the ground plane
            camera.up.cross(right)
        };
        self.pan_offset += up * (2.0 * delta.y * target_distance / viewport_height);
    }

    pub fn key_pan(&mut self, key: PanKey, camera: &PerspectiveCamera, viewport_height: f32) {
        let s = self.config.key_pan_speed;
        let delta = match key {
            PanKey::Up => Vec2::new(0.0, s),
            PanKey::Down => Vec2::new(0.0, -s),
            PanKey::Left => Vec2::new(s, 0.0),
            PanKey::Right => Vec2::new(-s, 0.0),
        };
        self.pan(delta, camera, viewport_height);
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.config.zoom_speed)
    }

    /// Move toward the target.
    pub fn dolly_in(&mut self) {
        if self.enabled {
            self.input_pending = true;
            self.scale *= self.zoom_scale();
        }
    }

    /// Move away from the target.
    pub fn dolly_out(&mut self) {
        if self.enabled {
            self.input_pending = true;
            self.scale /= self.zoom_scale();
        }
    }

    /// Wheel step; positive is scrolling up (zoom in).
    pub fn wheel(&mut self, delta_y: f32) {
        if delta_y > 0.0 {
            self.dolly_in();
        } else if delta_y < 0.0 {
            self.dolly_out();
        }
    }

    /// Middle-drag dolly; dragging down moves away.
    pub fn dolly_drag(&mut self, delta_y: f32) {
        if delta_y > 0.0 {
            self.dolly_out();
        } else if delta_y < 0.0 {
            self.dolly_in();
        }
    }

    // ------------------------------------------------------------------
    // Per-frame
    // ------------------------------------------------------------------

    /// Apply accumulated motion to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        self.update_count += 1;
        if self.is_settled() {
            return false;
        }

        let cfg = &self.config;
        let (rot_factor, pan_factor) = if cfg.enable_damping {
            (cfg.damping_factor, cfg.damping_factor)
        } else {
            (1.0, 1.0)
        };

        let last_position = camera.position;
        let last_rotation = camera.rotation;

        let mut spherical = Spherical::from_offset(camera.position - self.target);
        spherical.theta += self.spherical_delta.theta * rot_factor;
        spherical.phi += self.spherical_delta.phi * rot_factor;
        spherical.phi = spherical.phi.clamp(0.0, PI);
        spherical.make_safe();
        spherical.radius = (spherical.radius * self.scale).clamp(cfg.min_distance, cfg.max_distance);

        self.target += self.pan_offset * pan_factor;
        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);
        self.input_pending = false;

        if cfg.enable_damping {
            let keep = 1.0 - cfg.damping_factor;
            self.spherical_delta.theta *= keep;
            self.spherical_delta.phi *= keep;
            self.pan_offset *= keep;
            self.settle();
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        let moved = camera.position.distance_squared(last_position) > EPS
            || 8.0 * (1.0 - camera.rotation.dot(last_rotation)) > EPS;
        if moved {
            log::trace!(
                "Controls: camera at {:?}, distance {:.2}",
                camera.position,
                spherical.radius
            );
        }
        moved
    }

    fn settle(&mut self) {
        if self.spherical_delta.theta.abs() < SETTLE_EPS {
            self.spherical_delta.theta = 0.0;
        }
        if self.spherical_delta.phi.abs() < SETTLE_EPS {
            self.spherical_delta.phi = 0.0;
        }
        if self.pan_offset.length_squared() < SETTLE_EPS * SETTLE_EPS {
            self.pan_offset = Vec3::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const HEIGHT: f32 = 600.0;

    fn startup_camera() -> PerspectiveCamera {
        let mut cam = PerspectiveCamera::new(100.0, 4.0 / 3.0, 0.1, 700.0);
        cam.position = Vec3::new(0.0, 0.0, 50.0);
        cam.set_rotation_euler_deg(Vec3::new(10.0, 0.0, 0.0));
        cam
    }

    fn undamped() -> ControlsConfig {
        ControlsConfig {
            enable_damping: false,
            ..ControlsConfig::default()
        }
    }

    #[test]
    fn test_update_without_input_keeps_pose() {
        let mut controls = MapControls::new(ControlsConfig::default());
        let mut cam = startup_camera();
        let (pos, rot) = (cam.position, cam.rotation);
        for _ in 0..10 {
            assert!(!controls.update(&mut cam));
        }
        assert_eq!(cam.position, pos);
        assert_eq!(cam.rotation, rot);
        assert_eq!(controls.update_count(), 10);
    }

    #[test]
    fn test_distance_stays_clamped() {
        let mut controls = MapControls::new(ControlsConfig::default());
        let mut cam = startup_camera();
        // small LCG so the gesture mix is varied but reproducible
        let mut seed = 0x2545_f491_u32;
        let mut next = || {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 8) as f32 / (1u32 << 24) as f32
        };
        for _ in 0..400 {
            match (next() * 4.0) as u32 {
                0 => controls.wheel(1.0),
                1 => controls.wheel(-1.0),
                2 => controls.pan(Vec2::new(next() * 80.0 - 40.0, next() * 80.0 - 40.0), &cam, HEIGHT),
                _ => {
                    for _ in 0..6 {
                        controls.dolly_out();
                    }
                }
            }
            controls.update(&mut cam);
            let d = cam.position.distance(controls.target());
            assert!((100.0 - 1e-3..=500.0 + 1e-3).contains(&d), "distance {d}");
        }
    }

    #[test]
    fn test_cancelling_input_still_clamps_distance() {
        let check = |controls: &MapControls, cam: &PerspectiveCamera| {
            let d = cam.position.distance(controls.target());
            assert!((100.0 - 1e-3..=500.0 + 1e-3).contains(&d), "distance {d}");
        };

        let mut controls = MapControls::new(ControlsConfig::default());
        let mut cam = startup_camera();
        controls.wheel(1.0);
        controls.wheel(-1.0);
        controls.update(&mut cam);
        check(&controls, &cam);

        let mut controls = MapControls::new(ControlsConfig::default());
        let mut cam = startup_camera();
        controls.key_pan(PanKey::Left, &cam, HEIGHT);
        controls.key_pan(PanKey::Right, &cam, HEIGHT);
        controls.update(&mut cam);
        check(&controls, &cam);
        assert!(controls.is_settled());
    }

    #[test]
    fn test_damping_spreads_rotation_over_frames() {
        let mut controls = MapControls::new(ControlsConfig::default());
        let mut cam = startup_camera();
        controls.update(&mut cam); // settled: nothing happens
        controls.dolly_in();
        controls.update(&mut cam); // snaps to min distance, looks at target

        let before = Spherical::from_offset(cam.position);
        controls.rotate(Vec2::new(-60.0, 0.0), HEIGHT);
        let total = 2.0 * PI * 60.0 / HEIGHT;

        assert!(controls.update(&mut cam));
        let after_one = Spherical::from_offset(cam.position);
        assert_abs_diff_eq!(after_one.theta - before.theta, total * 0.05, epsilon = 1e-4);

        // the rest keeps arriving on later frames
        assert!(controls.update(&mut cam));
        let after_two = Spherical::from_offset(cam.position);
        assert!(after_two.theta > after_one.theta);
    }

    #[test]
    fn test_undamped_applies_everything_at_once() {
        let mut controls = MapControls::new(undamped());
        let mut cam = startup_camera();
        cam.position = Vec3::new(0.0, 0.0, 200.0);
        controls.rotate(Vec2::new(0.0, 30.0), HEIGHT);
        assert!(controls.update(&mut cam));
        assert!(controls.is_settled());
        let s = Spherical::from_offset(cam.position);
        assert_abs_diff_eq!(s.phi, PI / 2.0 - 2.0 * PI * 30.0 / HEIGHT, epsilon = 1e-4);
        assert_abs_diff_eq!(s.radius, 200.0, epsilon = 1e-3);
        assert!(!controls.update(&mut cam));
    }

    #[test]
    fn test_wheel_up_moves_closer() {
        let mut controls = MapControls::new(undamped());
        let mut cam = startup_camera();
        cam.position = Vec3::new(0.0, 100.0, 200.0);
        let before = cam.position.length();
        controls.wheel(1.0);
        controls.update(&mut cam);
        assert_abs_diff_eq!(cam.position.length(), before * 0.95, epsilon = 1e-3);

        controls.wheel(-1.0);
        controls.update(&mut cam);
        assert_abs_diff_eq!(cam.position.length(), before, epsilon = 1e-3);
    }

    #[test]
    fn test_key_pan_moves_target_along_ground() {
        let mut controls = MapControls::new(undamped());
        let mut cam = startup_camera();
        cam.position = Vec3::new(0.0, 0.0, 200.0);
        cam.look_at(Vec3::ZERO);

        controls.key_pan(PanKey::Left, &cam, HEIGHT);
        controls.update(&mut cam);
        let expected = 2.0 * 7.0 * 200.0 * 50f32.to_radians().tan() / HEIGHT;
        assert_abs_diff_eq!(controls.target().x, -expected, epsilon = 1e-3);
        assert_abs_diff_eq!(controls.target().y, 0.0, epsilon = 1e-4);
        let offset = cam.position - controls.target();
        assert_abs_diff_eq!(offset.length(), 200.0, epsilon = 1e-2);

        // ground-plane panning: "up" slides along -Z, not +Y
        controls.key_pan(PanKey::Up, &cam, HEIGHT);
        controls.update(&mut cam);
        assert!(controls.target().z < 0.0);
        assert_abs_diff_eq!(controls.target().y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_disabled_controls_ignore_gestures() {
        let mut controls = MapControls::new(ControlsConfig::default());
        controls.enabled = false;
        let cam = startup_camera();
        controls.rotate(Vec2::new(10.0, 10.0), HEIGHT);
        controls.pan(Vec2::new(10.0, 10.0), &cam, HEIGHT);
        controls.wheel(1.0);
        assert!(controls.is_settled());
    }

    #[test]
    fn test_damped_motion_eventually_settles() {
        let mut controls = MapControls::new(ControlsConfig::default());
        let mut cam = startup_camera();
        controls.rotate(Vec2::new(40.0, 0.0), HEIGHT);
        let mut frames = 0;
        while !controls.is_settled() {
            controls.update(&mut cam);
            frames += 1;
            assert!(frames < 2000, "damping never settled");
        }
        assert!(!controls.update(&mut cam));
    }

    #[test]
    fn test_spherical_round_trip() {
        let v = Vec3::new(30.0, -40.0, 120.0);
        let back = Spherical::from_offset(v).to_offset();
        assert_abs_diff_eq!(back.x, v.x, epsilon = 1e-3);
        assert_abs_diff_eq!(back.y, v.y, epsilon = 1e-3);
        assert_abs_diff_eq!(back.z, v.z, epsilon = 1e-3);
    }
}
