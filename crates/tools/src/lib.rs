//! Developer tooling: read-only puzzle inspection for the CLI and the HUD.
//!
//! # Invariants
//! - Inspection never mutates puzzle state or advances the win latch.

mod inspector;

pub use inspector::{ConditionInfo, PuzzleInspector, PuzzleSummary};

pub fn crate_info() -> &'static str {
    "shadowlock-tools v0.1.0"
}
