// src/camera.rs
use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

/// Perspective camera with position and quaternion orientation.
///
/// The camera looks down its local -Z axis with +Y up. The projection matrix is
/// cached: after [`set_aspect`](Self::set_aspect) it stays stale until
/// [`update_projection_matrix`](Self::update_projection_matrix) runs.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub rotation: Quat,
    /// World up used by `look_at`.
    pub up: Vec3,

    aspect: f32,
    projection: Mat4,
    projection_stale: bool,
}

impl PerspectiveCamera {
    /// Create a new perspective camera at the origin looking down -Z.
    pub fn new(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_deg,
            near,
            far,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            up: Vec3::Y,
            aspect,
            projection: Mat4::IDENTITY,
            projection_stale: true,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Change the aspect ratio. The cached projection is now stale.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.projection_stale = true;
    }

    /// Recompute the cached projection from fov/aspect/near/far.
    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov_deg.to_radians(), self.aspect, self.near, self.far);
        self.projection_stale = false;
    }

    pub fn is_projection_stale(&self) -> bool {
        self.projection_stale
    }

    /// Cached projection matrix (wgpu depth range 0..1).
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Set orientation from XYZ Euler angles in degrees.
    pub fn set_rotation_euler_deg(&mut self, euler_deg: Vec3) {
        self.rotation = Quat::from_euler(
            EulerRot::XYZ,
            euler_deg.x.to_radians(),
            euler_deg.y.to_radians(),
            euler_deg.z.to_radians(),
        );
    }

    /// Current orientation as XYZ Euler angles in degrees.
    pub fn rotation_euler_deg(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
    }

    /// Turn the camera so its -Z axis points at `target`.
    pub fn look_at(&mut self, target: Vec3) {
        let forward = target - self.position;
        if forward.length_squared() < 1e-12 {
            return;
        }
        // Looking straight along `up` leaves the basis undefined; borrow Z.
        let up = if forward.normalize().cross(self.up).length_squared() < 1e-12 {
            Vec3::Z
        } else {
            self.up
        };
        let view = Mat4::look_at_rh(self.position, target, up);
        self.rotation = Quat::from_mat3(&Mat3::from_mat4(view).transpose()).normalize();
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn local_up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Build view matrix from position + rotation.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation.conjugate()) * Mat4::from_translation(-self.position)
    }

    /// Combined view-projection matrix.
    pub fn view_proj_matrix(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}

/// GPU camera uniform (matches shader layout).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    /// Column-major 4x4 matrices
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// xyz = eye position, w unused
    pub position: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &PerspectiveCamera) -> Self {
        Self {
            view_proj: camera.view_proj_matrix().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            position: camera.position.extend(1.0).to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_set_aspect_marks_projection_stale() {
        let mut cam = PerspectiveCamera::new(100.0, 1.0, 0.1, 700.0);
        let before = cam.projection_matrix();
        cam.set_aspect(2.0);
        assert!(cam.is_projection_stale());
        assert_eq!(cam.projection_matrix(), before);
        cam.update_projection_matrix();
        assert!(!cam.is_projection_stale());
        assert_eq!(
            cam.projection_matrix(),
            Mat4::perspective_rh(100f32.to_radians(), 2.0, 0.1, 700.0)
        );
    }

    #[test]
    fn test_euler_round_trip() {
        let mut cam = PerspectiveCamera::new(100.0, 1.0, 0.1, 700.0);
        cam.set_rotation_euler_deg(Vec3::new(10.0, 0.0, 0.0));
        let e = cam.rotation_euler_deg();
        assert_abs_diff_eq!(e.x, 10.0, epsilon = 1e-4);
        assert_abs_diff_eq!(e.y, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(e.z, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_look_at_points_forward_at_target() {
        let mut cam = PerspectiveCamera::new(100.0, 1.0, 0.1, 700.0);
        cam.position = Vec3::new(30.0, 80.0, 120.0);
        cam.look_at(Vec3::ZERO);
        let expected = (-cam.position).normalize();
        assert_abs_diff_eq!(cam.forward().dot(expected), 1.0, epsilon = 1e-5);
        // Right vector stays level with the ground.
        assert_abs_diff_eq!(cam.right().y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_view_matrix_inverts_world_matrix() {
        let mut cam = PerspectiveCamera::new(60.0, 1.5, 0.1, 100.0);
        cam.position = Vec3::new(1.0, 2.0, 3.0);
        cam.set_rotation_euler_deg(Vec3::new(20.0, -35.0, 5.0));
        let world = Mat4::from_rotation_translation(cam.rotation, cam.position);
        let product = cam.view_matrix() * world;
        assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn test_look_at_straight_down_is_finite() {
        let mut cam = PerspectiveCamera::new(60.0, 1.0, 0.1, 100.0);
        cam.position = Vec3::new(0.0, 50.0, 0.0);
        cam.look_at(Vec3::ZERO);
        assert!(cam.rotation.is_finite());
        assert_abs_diff_eq!(cam.forward().y, -1.0, epsilon = 1e-5);
    }
}
