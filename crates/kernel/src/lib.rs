//! Puzzle Kernel: authoritative puzzle state, interaction handlers, win check.
//!
//! # Invariants
//! - All state mutations flow through explicit handlers and are logged.
//! - The win check is a pure function of state; only the latch is stateful.
//! - Success is signalled once per process.

pub mod check;
pub mod config;
pub mod puzzle;
pub mod state;

pub use check::{CheckOutcome, CheckReport, Condition, ConditionStatus, WinChecker, evaluate};
pub use config::{ConfigError, InitialState, LightPreset, LightingConfig, PuzzleConfig, TargetConfig};
pub use puzzle::{Axis, Puzzle, PuzzleEvent};
pub use state::PuzzleState;

pub fn crate_info() -> &'static str {
    "shadowlock-kernel v0.1.0"
}
