use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spatial transform: position, Euler rotation (radians, XYZ order), scale.
///
/// Rotation is kept as Euler angles because the puzzle reasons about
/// individual axes; `matrix()` converts on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Intrinsic X, then Y, then Z.
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

/// RGB colour in display (sRGB) space, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::from_hex(0x000000);
    pub const WHITE: Color = Color::from_hex(0xffffff);
    pub const GRAY: Color = Color::from_hex(0x808080);

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_hex(self) -> u32 {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (c(self.r) << 16) | (c(self.g) << 8) | c(self.b)
    }

    /// Decode to linear light for sRGB render targets.
    pub fn to_linear(self) -> [f32; 3] {
        let decode = |v: f32| {
            if v <= 0.04045 {
                v / 12.92
            } else {
                ((v + 0.055) / 1.055).powf(2.4)
            }
        };
        [decode(self.r), decode(self.g), decode(self.b)]
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let digits = value.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(format!("expected #rrggbb, got {value:?}"));
        }
        u32::from_str_radix(digits, 16)
            .map(Color::from_hex)
            .map_err(|e| format!("invalid colour {value:?}: {e}"))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn euler_order_is_x_then_y_then_z() {
        let t = Transform::default().with_rotation(Vec3::new(0.3, 0.5, 0.7));
        let expected =
            Quat::from_rotation_x(0.3) * Quat::from_rotation_y(0.5) * Quat::from_rotation_z(0.7);
        assert!(t.quat().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn hex_round_trip() {
        let c = Color::from_hex(0x5e685e);
        assert_eq!(c.to_hex(), 0x5e685e);
        assert_eq!(String::from(c), "#5e685e");
    }

    #[test]
    fn parse_colour_string() {
        let c = Color::try_from("#5e5446".to_string()).unwrap();
        assert_eq!(c, Color::from_hex(0x5e5446));
        assert!(Color::try_from("5e54".to_string()).is_err());
        assert!(Color::try_from("#zzzzzz".to_string()).is_err());
    }

    #[test]
    fn linear_decode_keeps_endpoints() {
        assert_eq!(Color::BLACK.to_linear(), [0.0, 0.0, 0.0]);
        let white = Color::WHITE.to_linear();
        assert!((white[0] - 1.0).abs() < 1e-6);
    }
}
