use crate::config::{InitialState, LightPreset, LightingConfig};
use glam::{DVec2, DVec3, Vec3};
use serde::{Deserialize, Serialize};

/// The mutable puzzle state read by the win checker every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PuzzleState {
    /// Lamp position along the room diagonal (light and pedestal share X/Z).
    pub light_x: f64,
    /// X/Z of the light itself. Follows the lamp while lit, parks at the dark
    /// anchor when switched off; a lamp move still drags it along.
    pub light_xz: DVec2,
    /// Logical shape rotation in radians, XYZ order. Y is never edited.
    pub shape_rotation: DVec3,
    pub light_on: bool,
    /// Whether the shape mesh has arrived and been attached to the scene.
    pub shape_attached: bool,
}

impl PuzzleState {
    pub fn from_initial(initial: &InitialState, lighting: &LightingConfig) -> Self {
        let lamp = DVec2::splat(initial.light_x);
        Self {
            light_x: initial.light_x,
            light_xz: if initial.light_on {
                lamp
            } else {
                lighting.dark_anchor.as_dvec2()
            },
            shape_rotation: initial.shape_rotation,
            light_on: initial.light_on,
            shape_attached: false,
        }
    }

    /// Move the lamp along the diagonal; the light comes with it in either preset.
    pub fn move_lamp(&mut self, t: f64) {
        self.light_x = t;
        self.light_xz = DVec2::splat(t);
    }

    /// Flip the preset. Switching off parks the light at the dark anchor;
    /// switching on puts it back above the pedestal.
    pub fn switch_light(&mut self, lighting: &LightingConfig) {
        self.light_on = !self.light_on;
        self.light_xz = if self.light_on {
            DVec2::splat(self.light_x)
        } else {
            lighting.dark_anchor.as_dvec2()
        };
    }

    pub fn active_preset(&self, lighting: &LightingConfig) -> LightPreset {
        if self.light_on {
            lighting.lit
        } else {
            lighting.dark
        }
    }

    /// World position of the puzzle light.
    pub fn light_position(&self, lighting: &LightingConfig) -> Vec3 {
        let xz = self.light_xz.as_vec2();
        Vec3::new(xz.x, lighting.height, xz.y)
    }

    /// X/Z offset of the pedestal group.
    pub fn lamp_offset(&self) -> Vec3 {
        let x = self.light_x as f32;
        Vec3::new(x, 0.0, x)
    }

    /// The key orb glows only while the lamp is lit.
    pub fn key_visible(&self) -> bool {
        self.light_on
    }

    pub fn casts_shadows(&self) -> bool {
        self.light_on
    }

    pub fn shape_rotation_f32(&self) -> Vec3 {
        self.shape_rotation.as_vec3()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lit_light_follows_lamp() {
        let lighting = LightingConfig::default();
        let state = PuzzleState::from_initial(&InitialState::default(), &lighting);
        assert_eq!(state.light_position(&lighting), Vec3::new(10.0, -4.5, 10.0));
        assert_eq!(state.lamp_offset(), Vec3::new(10.0, 0.0, 10.0));
    }

    #[test]
    fn dark_light_sits_at_anchor() {
        let lighting = LightingConfig::default();
        let mut state = PuzzleState::from_initial(&InitialState::default(), &lighting);
        state.switch_light(&lighting);
        assert_eq!(state.light_position(&lighting), Vec3::new(0.0, -4.5, 0.0));
        assert_eq!(state.active_preset(&lighting), lighting.dark);
        assert!(!state.key_visible());
        assert!(!state.casts_shadows());
    }

    #[test]
    fn starts_detached() {
        let state = PuzzleState::from_initial(&InitialState::default(), &LightingConfig::default());
        assert!(!state.shape_attached);
        assert!(state.light_on);
        assert_eq!(state.shape_rotation.y, 2.95);
    }

    #[test]
    fn lamp_drags_parked_light() {
        let lighting = LightingConfig::default();
        let mut state = PuzzleState::from_initial(&InitialState::default(), &lighting);
        state.switch_light(&lighting);
        state.move_lamp(4.0);
        assert_eq!(state.light_position(&lighting), Vec3::new(4.0, -4.5, 4.0));
        assert_eq!(state.lamp_offset(), Vec3::new(4.0, 0.0, 4.0));
        assert!(!state.light_on);
    }

    #[test]
    fn starting_dark_parks_light() {
        let lighting = LightingConfig::default();
        let initial = InitialState {
            light_on: false,
            ..InitialState::default()
        };
        let state = PuzzleState::from_initial(&initial, &lighting);
        assert_eq!(state.light_xz, DVec2::ZERO);
        assert_eq!(state.light_x, 10.0);
    }
}
