//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read a [`Stage`](shadowlock_scene::Stage) and never mutate it.
//! - Layers are drawn in [`FramePlan`] order; colour is cleared once per frame
//!   and depth is cleared before every layer.

mod plan;
mod renderer;
mod viewport;

pub use plan::{DepthTest, FramePlan, LayerPass, ToneMapping};
pub use renderer::{DebugTextRenderer, RenderError, RenderView, Renderer};
pub use viewport::Viewport;

pub fn crate_info() -> &'static str {
    "shadowlock-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
