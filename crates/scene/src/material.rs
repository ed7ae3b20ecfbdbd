use serde::{Deserialize, Serialize};
use shadowlock_common::Color;

/// How a surface responds to light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shading {
    /// Diffuse plus Blinn-Phong specular, receives shadows.
    Phong { specular: Color, shininess: f32 },
    /// Flat colour, ignores lights.
    Basic,
    /// Invisible except where shadowed; draws `color` at `opacity` there.
    ShadowCatcher,
}

/// Which faces are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Front,
    Back,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub shading: Shading,
    pub color: Color,
    pub opacity: f32,
    pub transparent: bool,
    pub side: Side,
}

impl Material {
    pub fn phong(color: Color) -> Self {
        Self {
            shading: Shading::Phong {
                specular: Color::from_hex(0x111111),
                shininess: 30.0,
            },
            color,
            opacity: 1.0,
            transparent: false,
            side: Side::Front,
        }
    }

    pub fn basic(color: Color) -> Self {
        Self {
            shading: Shading::Basic,
            ..Self::phong(color)
        }
    }

    pub fn shadow_catcher(color: Color, opacity: f32) -> Self {
        Self {
            shading: Shading::ShadowCatcher,
            transparent: true,
            opacity,
            ..Self::phong(color)
        }
    }

    pub fn with_specular(mut self, specular: Color) -> Self {
        if let Shading::Phong { specular: s, .. } = &mut self.shading {
            *s = specular;
        }
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        if let Shading::Phong { shininess: s, .. } = &mut self.shading {
            *s = shininess;
        }
        self
    }

    /// Make the material transparent at the given opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.transparent = true;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Needs alpha blending and a draw after opaque geometry.
    pub fn is_blended(&self) -> bool {
        self.transparent
    }

    /// Contributes nothing to colour (it may still cast shadows).
    pub fn is_invisible(&self) -> bool {
        self.transparent && self.opacity <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phong_builders() {
        let m = Material::phong(Color::from_hex(0xadadad))
            .with_specular(Color::WHITE)
            .with_shininess(15.0);
        assert_eq!(
            m.shading,
            Shading::Phong {
                specular: Color::WHITE,
                shininess: 15.0
            }
        );
        assert!(!m.is_blended());
    }

    #[test]
    fn specular_ignored_for_basic() {
        let m = Material::basic(Color::WHITE).with_specular(Color::BLACK);
        assert_eq!(m.shading, Shading::Basic);
    }

    #[test]
    fn zero_opacity_is_invisible() {
        let m = Material::basic(Color::WHITE).with_opacity(0.0);
        assert!(m.is_blended());
        assert!(m.is_invisible());
        assert!(!Material::basic(Color::WHITE).with_opacity(0.35).is_invisible());
    }

    #[test]
    fn shadow_catcher_is_blended() {
        let m = Material::shadow_catcher(Color::WHITE, 0.1);
        assert!(m.is_blended());
        assert_eq!(m.opacity, 0.1);
    }
}
