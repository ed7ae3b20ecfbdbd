use glam::{Mat4, Vec2, Vec3};
use shadowlock_render::{RenderView, Viewport};
use std::f32::consts::PI;

/// Orbit camera around a fixed target.
/// Camera motion is not puzzle state; it lives outside the kernel.
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    /// Angle from +Y, radians.
    pub polar: f32,
    /// Angle around Y from +Z, radians.
    pub azimuth: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub max_polar: f32,
    pub rotate_speed: f32,
    pub zoom_step: f32,
    viewport: Viewport,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_from(Vec3::new(20.0, 20.0, 20.0), Vec3::ZERO)
    }
}

impl OrbitCamera {
    const MIN_POLAR: f32 = 1e-3;

    pub fn looking_from(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let radius = offset.length().max(1e-3);
        Self {
            target,
            radius,
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            azimuth: offset.x.atan2(offset.z),
            fov_degrees: 40.0,
            near: 0.1,
            far: 1000.0,
            min_radius: 1.0,
            max_radius: 200.0,
            max_polar: 3.0 * PI / 4.0,
            rotate_speed: 0.005,
            zoom_step: 0.95,
            viewport: Viewport::default(),
        }
    }

    pub fn eye(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        self.target
            + self.radius
                * Vec3::new(
                    sin_polar * self.azimuth.sin(),
                    self.polar.cos(),
                    sin_polar * self.azimuth.cos(),
                )
    }

    /// Drag by a pixel delta. Dragging right spins the scene right.
    pub fn orbit(&mut self, delta: Vec2) {
        self.azimuth -= delta.x * self.rotate_speed;
        self.polar = (self.polar - delta.y * self.rotate_speed).clamp(Self::MIN_POLAR, self.max_polar);
    }

    /// Positive steps move closer.
    pub fn zoom(&mut self, steps: f32) {
        self.radius = (self.radius * self.zoom_step.powf(steps)).clamp(self.min_radius, self.max_radius);
    }

    pub fn apply_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.viewport.aspect(),
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn render_view(&self) -> RenderView {
        RenderView {
            eye: self.eye(),
            target: self.target,
            fov_degrees: self.fov_degrees,
            near: self.near,
            far: self.far,
            viewport: self.viewport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_eye_round_trips() {
        let cam = OrbitCamera::default();
        assert!((cam.eye() - Vec3::new(20.0, 20.0, 20.0)).length() < 1e-3);
        assert!(!cam.view_projection().col(0).x.is_nan());
    }

    #[test]
    fn polar_clamped_below_horizon() {
        let mut cam = OrbitCamera::default();
        cam.orbit(Vec2::new(0.0, -10_000.0));
        assert!((cam.polar - 3.0 * PI / 4.0).abs() < 1e-6);
        cam.orbit(Vec2::new(0.0, 10_000.0));
        assert!(cam.polar > 0.0 && cam.polar < 0.01);
    }

    #[test]
    fn orbit_keeps_distance() {
        let mut cam = OrbitCamera::default();
        let r = cam.eye().length();
        cam.orbit(Vec2::new(120.0, 30.0));
        assert!((cam.eye().length() - r).abs() < 1e-3);
    }

    #[test]
    fn zoom_moves_closer_and_clamps() {
        let mut cam = OrbitCamera::default();
        let r = cam.radius;
        cam.zoom(1.0);
        assert!(cam.radius < r);
        cam.zoom(-10_000.0);
        assert_eq!(cam.radius, cam.max_radius);
    }

    #[test]
    fn render_view_tracks_viewport() {
        let mut cam = OrbitCamera::default();
        cam.apply_viewport(Viewport::from_window(800, 600, Viewport::CONTROL_STRIP));
        let view = cam.render_view();
        assert_eq!(view.viewport.height, 400);
        assert_eq!(view.eye, cam.eye());
    }
}
