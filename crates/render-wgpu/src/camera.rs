use glam::{Mat3, Mat4, Vec3};
use tilescape_input::{MoveDirection, TexturePack};
use tilescape_render::RenderView;

const MIN_ZOOM: f32 = 1.0;
const MAX_ZOOM: f32 = 45.0;
const PITCH_LIMIT: f32 = 89.0;

/// First-person fly camera. Angles are in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view.
    pub zoom: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            yaw: -90.0,
            pitch: 0.0,
            zoom: MAX_ZOOM,
            aspect: 800.0 / 600.0,
            near: 0.1,
            far: 100.0,
            speed: 2.5,
            sensitivity: 0.1,
        }
    }
}

impl FlyCamera {
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize()
    }

    /// Fly along the look direction; forward motion follows pitch.
    pub fn advance(&mut self, direction: MoveDirection, dt: f32) {
        let step = self.speed * dt;
        match direction {
            MoveDirection::Forward => self.position += self.forward() * step,
            MoveDirection::Backward => self.position -= self.forward() * step,
            MoveDirection::Left => self.position -= self.right() * step,
            MoveDirection::Right => self.position += self.right() * step,
        }
    }

    /// Turn by a mouse delta in pixels. Positive `dy` pitches up.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Narrow the field of view by `delta` degrees.
    pub fn zoom_by(&mut self, delta: f32) {
        self.zoom = (self.zoom - delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.zoom.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// View-projection with the translation removed, so the sky never moves.
    pub fn sky_view_projection(&self) -> Mat4 {
        self.projection_matrix() * Mat4::from_mat3(Mat3::from_mat4(self.view_matrix()))
    }

    pub fn render_view(&self, texture_pack: TexturePack) -> RenderView {
        RenderView {
            eye: self.position,
            forward: self.forward(),
            fov_degrees: self.zoom,
            texture_pack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let cam = FlyCamera::default();
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 3.0));
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(cam.right().abs_diff_eq(Vec3::X, 1e-6));
        assert!(cam.up().abs_diff_eq(Vec3::Y, 1e-6));
        assert!(!cam.view_projection().col(0).x.is_nan());
    }

    #[test]
    fn movement_uses_speed_and_dt() {
        let mut cam = FlyCamera::default();
        cam.advance(MoveDirection::Forward, 1.0);
        assert!(cam.position.abs_diff_eq(Vec3::new(0.0, 0.0, 0.5), 1e-5));
        cam.advance(MoveDirection::Right, 0.4);
        assert!(cam.position.abs_diff_eq(Vec3::new(1.0, 0.0, 0.5), 1e-5));
        cam.advance(MoveDirection::Left, 0.4);
        cam.advance(MoveDirection::Backward, 1.0);
        assert!(cam.position.abs_diff_eq(Vec3::new(0.0, 0.0, 3.0), 1e-5));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = FlyCamera::default();
        cam.rotate(0.0, 10_000.0);
        assert_eq!(cam.pitch, 89.0);
        cam.rotate(0.0, -20_000.0);
        assert_eq!(cam.pitch, -89.0);
    }

    #[test]
    fn rotate_applies_sensitivity() {
        let mut cam = FlyCamera::default();
        cam.rotate(100.0, 50.0);
        assert!((cam.yaw - -80.0).abs() < 1e-4);
        assert!((cam.pitch - 5.0).abs() < 1e-4);
        assert!(cam.forward().y > 0.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = FlyCamera::default();
        cam.zoom_by(-10.0);
        assert_eq!(cam.zoom, 45.0);
        cam.zoom_by(4.0);
        assert_eq!(cam.zoom, 41.0);
        cam.zoom_by(100.0);
        assert_eq!(cam.zoom, 1.0);
    }

    #[test]
    fn sky_view_ignores_position() {
        let mut a = FlyCamera::default();
        let mut b = FlyCamera::default();
        b.position = Vec3::new(50.0, -3.0, 12.0);
        assert!(a.sky_view_projection().abs_diff_eq(b.sky_view_projection(), 1e-5));
        a.rotate(30.0, 0.0);
        assert!(!a.sky_view_projection().abs_diff_eq(b.sky_view_projection(), 1e-5));
    }

    #[test]
    fn viewport_sets_aspect() {
        let mut cam = FlyCamera::default();
        cam.set_viewport(1024, 0);
        assert_eq!(cam.aspect, 1024.0);
        cam.set_viewport(800, 400);
        assert_eq!(cam.aspect, 2.0);
    }

    #[test]
    fn render_view_mirrors_camera() {
        let cam = FlyCamera::default();
        let view = cam.render_view(TexturePack::new(3).unwrap());
        assert_eq!(view.eye, cam.position);
        assert_eq!(view.fov_degrees, 45.0);
        assert_eq!(view.texture_pack.number(), 3);
    }
}
