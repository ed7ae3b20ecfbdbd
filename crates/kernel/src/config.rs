//! Puzzle configuration: win targets, starting state, lighting presets.
//!
//! Every field has a default, so an empty YAML document yields the stock
//! puzzle. The configuration is read once at startup and never mutated.

use glam::{DVec3, Vec2};
use serde::{Deserialize, Serialize};
use shadowlock_common::Color;
use std::path::Path;

/// Errors from loading a puzzle configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The three scalar targets and the shared tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub light_x: f64,
    pub rotation_x: f64,
    pub rotation_z: f64,
    pub tolerance: f64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            light_x: 5.43,
            rotation_x: 1.71,
            rotation_z: 2.41,
            tolerance: 0.05,
        }
    }
}

/// State the puzzle starts in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub light_x: f64,
    pub shape_rotation: DVec3,
    pub light_on: bool,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            light_x: 10.0,
            shape_rotation: DVec3::new(0.0, 2.95, 0.0),
            light_on: true,
        }
    }
}

/// One of the two fixed lighting presets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightPreset {
    pub intensity: f32,
    pub clear_color: Color,
}

/// Lighting presets and the fixed light height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Y coordinate of the light in both presets.
    pub height: f32,
    pub lit: LightPreset,
    pub dark: LightPreset,
    /// X/Z position of the light while dark; the lit light follows the lamp.
    pub dark_anchor: Vec2,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            height: -4.5,
            lit: LightPreset {
                intensity: 1.0,
                clear_color: Color::from_hex(0x5e685e),
            },
            dark: LightPreset {
                intensity: 0.5,
                clear_color: Color::BLACK,
            },
            dark_anchor: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleConfig {
    pub targets: TargetConfig,
    pub initial: InitialState,
    pub lighting: LightingConfig,
}

impl PuzzleConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!("loaded puzzle config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.targets;
        if !(t.tolerance.is_finite() && t.tolerance >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tolerance must be a non-negative number, got {}",
                t.tolerance
            )));
        }
        for (name, value) in [
            ("targets.light_x", t.light_x),
            ("targets.rotation_x", t.rotation_x),
            ("targets.rotation_z", t.rotation_z),
            ("initial.light_x", self.initial.light_x),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be finite")));
            }
        }
        for (name, preset) in [("lit", self.lighting.lit), ("dark", self.lighting.dark)] {
            if !(preset.intensity.is_finite() && preset.intensity >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "lighting.{name}.intensity must be non-negative"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_stock_puzzle() {
        let config = PuzzleConfig::default();
        assert_eq!(config.targets.light_x, 5.43);
        assert_eq!(config.targets.rotation_x, 1.71);
        assert_eq!(config.targets.rotation_z, 2.41);
        assert_eq!(config.targets.tolerance, 0.05);
        assert_eq!(config.initial.light_x, 10.0);
        assert_eq!(config.lighting.lit.clear_color.to_hex(), 0x5e685e);
        assert_eq!(config.lighting.dark.intensity, 0.5);
    }

    #[test]
    fn empty_document_is_default() {
        let config = PuzzleConfig::from_yaml_str("").unwrap();
        assert_eq!(config, PuzzleConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = PuzzleConfig::from_yaml_str(
            "targets:\n  tolerance: 0.1\nlighting:\n  dark:\n    intensity: 0.2\n    clear_color: '#101010'\n",
        )
        .unwrap();
        assert_eq!(config.targets.tolerance, 0.1);
        assert_eq!(config.targets.light_x, 5.43);
        assert_eq!(config.lighting.dark.intensity, 0.2);
        assert_eq!(config.lighting.dark.clear_color.to_hex(), 0x101010);
        assert_eq!(config.lighting.height, -4.5);
    }

    #[test]
    fn negative_tolerance_rejected() {
        let err = PuzzleConfig::from_yaml_str("targets:\n  tolerance: -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "initial:\n  light_x: 3.0").unwrap();
        let config = PuzzleConfig::load(file.path()).unwrap();
        assert_eq!(config.initial.light_x, 3.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PuzzleConfig::load("/nonexistent/shadowlock.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
