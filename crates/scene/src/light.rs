use glam::Vec3;
use serde::{Deserialize, Serialize};
use shadowlock_common::Color;

/// Handle to a light in a specific layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightHandle(pub(crate) usize);

impl LightHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Shadow camera parameters for a point light.
///
/// The shadow map is a single perspective view from the light towards
/// `focus`, storing normalized distance between `near` and `far`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    /// Offset applied to the normalized distance before comparison.
    pub bias: f32,
    pub focus: Vec3,
    /// Full vertical field of view of the shadow camera, in radians.
    pub fov: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 2048,
            near: 0.5,
            far: 40.0,
            bias: -0.01,
            focus: Vec3::ZERO,
            fov: 120.0_f32.to_radians(),
        }
    }
}

/// Where a light's position is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightMount {
    World,
    /// Rides on the camera; `position` is ignored.
    Camera,
}

/// Omnidirectional light without distance falloff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub mount: LightMount,
    pub cast_shadow: bool,
    pub shadow: ShadowSettings,
}

impl PointLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Vec3::ZERO,
            mount: LightMount::World,
            cast_shadow: false,
            shadow: ShadowSettings::default(),
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn on_camera(mut self) -> Self {
        self.mount = LightMount::Camera;
        self
    }

    pub fn with_shadow(mut self, shadow: ShadowSettings) -> Self {
        self.cast_shadow = true;
        self.shadow = shadow;
        self
    }

    /// Position in world space given the current camera eye.
    pub fn world_position(&self, camera_eye: Vec3) -> Vec3 {
        match self.mount {
            LightMount::World => self.position,
            LightMount::Camera => camera_eye,
        }
    }

    /// Light colour scaled by intensity.
    pub fn radiance(&self) -> [f32; 3] {
        let [r, g, b] = self.color.to_linear();
        [r * self.intensity, g * self.intensity, b * self.intensity]
    }

    pub fn renders_shadow(&self) -> bool {
        self.cast_shadow && self.intensity > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_mounted_follows_eye() {
        let light = PointLight::new(Color::WHITE, 0.4).at(Vec3::ONE).on_camera();
        let eye = Vec3::new(20.0, 20.0, 20.0);
        assert_eq!(light.world_position(eye), eye);
    }

    #[test]
    fn world_mounted_ignores_eye() {
        let light = PointLight::new(Color::WHITE, 1.0).at(Vec3::new(3.0, -4.5, 3.0));
        assert_eq!(light.world_position(Vec3::ZERO), Vec3::new(3.0, -4.5, 3.0));
    }

    #[test]
    fn radiance_scales_with_intensity() {
        let light = PointLight::new(Color::WHITE, 0.5);
        let [r, g, b] = light.radiance();
        assert!((r - 0.5).abs() < 1e-6 && (g - 0.5).abs() < 1e-6 && (b - 0.5).abs() < 1e-6);
    }

    #[test]
    fn dark_light_casts_no_shadow() {
        let mut light = PointLight::new(Color::WHITE, 1.0).with_shadow(ShadowSettings::default());
        assert!(light.renders_shadow());
        light.intensity = 0.0;
        assert!(!light.renders_shadow());
    }
}
