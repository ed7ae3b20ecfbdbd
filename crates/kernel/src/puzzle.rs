use crate::check::{CheckOutcome, WinChecker};
use crate::config::{LightPreset, PuzzleConfig};
use crate::state::PuzzleState;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use shadowlock_common::Color;
use shadowlock_input::Action;

/// Rotation axis the player can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Z,
}

/// An event record produced by every mutation of the puzzle.
///
/// Front ends drain the log to drive notifications and logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PuzzleEvent {
    LightMoved { old: f64, new: f64 },
    ShapeRotated { axis: Axis, old: f64, new: f64 },
    LightToggled { on: bool },
    /// The shape mesh arrived; rotation conditions become evaluable.
    ShapeAttached,
    /// The win condition held for the first time.
    Solved,
}

/// The authoritative puzzle.
///
/// Owns the state, the fixed configuration and the win latch. All mutations
/// go through the handlers below.
#[derive(Debug, Clone)]
pub struct Puzzle {
    config: PuzzleConfig,
    state: PuzzleState,
    checker: WinChecker,
    event_log: Vec<PuzzleEvent>,
}

impl Puzzle {
    pub fn new(config: PuzzleConfig) -> Self {
        Self {
            state: PuzzleState::from_initial(&config.initial, &config.lighting),
            checker: WinChecker::new(config.targets),
            config,
            event_log: Vec::new(),
        }
    }

    pub fn config(&self) -> &PuzzleConfig {
        &self.config
    }

    pub fn state(&self) -> &PuzzleState {
        &self.state
    }

    pub fn checker(&self) -> &WinChecker {
        &self.checker
    }

    pub fn is_solved(&self) -> bool {
        self.checker.is_solved()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<PuzzleEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[PuzzleEvent] {
        &self.event_log
    }

    /// Move the lamp: the light and the pedestal follow on X and Z, whether
    /// or not the light is on.
    pub fn set_light_position(&mut self, t: f64) {
        let old = self.state.light_x;
        self.state.move_lamp(t);
        self.event_log.push(PuzzleEvent::LightMoved { old, new: t });
    }

    /// Set the shape rotation about X, leaving Y and Z untouched.
    ///
    /// Applies to the logical shape even while the mesh is loading.
    pub fn set_shape_rotation_x(&mut self, x: f64) {
        let old = self.state.shape_rotation.x;
        self.state.shape_rotation.x = x;
        self.event_log.push(PuzzleEvent::ShapeRotated {
            axis: Axis::X,
            old,
            new: x,
        });
    }

    /// Set the shape rotation about Z, leaving X and Y untouched.
    pub fn set_shape_rotation_z(&mut self, z: f64) {
        let old = self.state.shape_rotation.z;
        self.state.shape_rotation.z = z;
        self.event_log.push(PuzzleEvent::ShapeRotated {
            axis: Axis::Z,
            old,
            new: z,
        });
    }

    /// Swap between the lit and dark presets. Key visibility follows, and
    /// the light jumps to the preset's position.
    pub fn toggle_light(&mut self) {
        self.state.switch_light(&self.config.lighting);
        tracing::info!(
            "light {}",
            if self.state.light_on { "on" } else { "off" }
        );
        self.event_log.push(PuzzleEvent::LightToggled {
            on: self.state.light_on,
        });
    }

    /// Record that the shape mesh is now part of the scene.
    pub fn attach_shape(&mut self) {
        if self.state.shape_attached {
            return;
        }
        self.state.shape_attached = true;
        self.event_log.push(PuzzleEvent::ShapeAttached);
    }

    /// Dispatch a puzzle action. Returns false for actions the kernel ignores.
    pub fn apply(&mut self, action: &Action) -> bool {
        match *action {
            Action::SetLightPosition(t) => self.set_light_position(t),
            Action::SetShapeRotationX(x) => self.set_shape_rotation_x(x),
            Action::SetShapeRotationZ(z) => self.set_shape_rotation_z(z),
            Action::ToggleLight => self.toggle_light(),
            Action::Orbit(_) | Action::Zoom(_) | Action::Noop => return false,
        }
        true
    }

    /// Per-frame win check. Logs and records success exactly once.
    pub fn check(&mut self) -> CheckOutcome {
        let outcome = self.checker.check(&self.state);
        if outcome.just_solved {
            tracing::info!("puzzle solved: shadows align with the carvings");
            self.event_log.push(PuzzleEvent::Solved);
        }
        outcome
    }

    pub fn active_preset(&self) -> LightPreset {
        self.state.active_preset(&self.config.lighting)
    }

    pub fn clear_color(&self) -> Color {
        self.active_preset().clear_color
    }

    pub fn light_intensity(&self) -> f32 {
        self.active_preset().intensity
    }

    pub fn light_position(&self) -> Vec3 {
        self.state.light_position(&self.config.lighting)
    }
}
