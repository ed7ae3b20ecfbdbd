//! Input: desktop controls and CLI arguments mapped to shared actions.
//!
//! # Invariants
//! - The kernel consumes actions, never raw window events.
//! - Every front end (sliders, keyboard, CLI) produces the same action set.

pub mod action;

pub use action::{Action, ActionQueue};

pub fn crate_info() -> &'static str {
    "shadowlock-input v0.1.0"
}
