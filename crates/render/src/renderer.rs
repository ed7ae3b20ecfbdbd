use crate::plan::FramePlan;
use crate::viewport::Viewport;
use glam::{Mat4, Vec3};
use shadowlock_assets::MeshId;
use shadowlock_scene::Stage;
use std::fmt::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("mesh {0:?} is referenced by the stage but was never uploaded")]
    MissingMesh(MeshId),
}

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub viewport: Viewport,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(20.0, 20.0, 20.0),
            target: Vec3::ZERO,
            fov_degrees: 40.0,
            near: 0.1,
            far: 1000.0,
            viewport: Viewport::default(),
        }
    }
}

impl RenderView {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.viewport.aspect(),
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the stage, a view and a frame plan, then produces
/// output. It never mutates the stage; puzzle truth is kernel-owned.
pub trait Renderer {
    type Output;

    fn render(&self, stage: &Stage, view: &RenderView, plan: &FramePlan) -> Self::Output;
}

/// Human-readable dump of what a frame would draw.
///
/// Used by the CLI and in tests in place of a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, stage: &Stage, view: &RenderView, plan: &FramePlan) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Frame (clear={}) ===", stage.clear_color);
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) fov={:.0} viewport={}x{}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.fov_degrees,
            view.viewport.width,
            view.viewport.height
        );

        for pass in &plan.passes {
            let scene = stage.layer(pass.layer);
            let _ = writeln!(
                out,
                "[{}] depth={:?} clear_color={} nodes={} lights={}",
                pass.layer.label(),
                pass.depth,
                pass.clear_color,
                scene.len(),
                scene.lights().len()
            );
            for light in scene.lights() {
                let p = light.world_position(view.eye);
                let _ = writeln!(
                    out,
                    "  light intensity={:.2} pos=({:.2}, {:.2}, {:.2}) shadow={}",
                    light.intensity,
                    p.x,
                    p.y,
                    p.z,
                    light.renders_shadow()
                );
            }
            for (handle, node) in scene.nodes() {
                if node.mesh.is_none() {
                    continue;
                }
                let p = scene.world_transform(handle).transform_point3(Vec3::ZERO);
                let _ = writeln!(
                    out,
                    "  {} pos=({:.2}, {:.2}, {:.2}) visible={}",
                    node.name,
                    p.x,
                    p.y,
                    p.z,
                    scene.is_visible(handle)
                );
            }
        }

        tracing::trace!(layers = plan.passes.len(), "debug frame rendered");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowlock_assets::AssetStore;
    use shadowlock_kernel::{PuzzleConfig, PuzzleState};
    use shadowlock_scene::{SceneComposer, StaticMeshes};

    fn composer() -> (SceneComposer, PuzzleConfig) {
        let mut store = AssetStore::new();
        let meshes = StaticMeshes::register(&mut store);
        let config = PuzzleConfig::default();
        (SceneComposer::new(&config, &meshes).unwrap(), config)
    }

    #[test]
    fn lists_layers_in_plan_order() {
        let (composer, _) = composer();
        let output =
            DebugTextRenderer::new().render(composer.stage(), &RenderView::default(), &FramePlan::standard());

        let room = output.find("[room]").unwrap();
        let carving = output.find("[carving]").unwrap();
        let pedestal = output.find("[pedestal]").unwrap();
        assert!(room < carving && carving < pedestal);
        assert!(output.contains("clear=#5e685e"));
        assert!(output.contains("key pos=(10.00, -4.25, 10.00) visible=true"));
    }

    #[test]
    fn dark_frame_hides_key() {
        let (mut composer, config) = composer();
        let mut state = PuzzleState::from_initial(&config.initial, &config.lighting);
        state.switch_light(&config.lighting);
        composer.sync(&state);
        let output =
            DebugTextRenderer::new().render(composer.stage(), &RenderView::default(), &FramePlan::standard());
        assert!(output.contains("clear=#000000"));
        assert!(output.contains("visible=false"));
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 40.0);
        assert_eq!(view.eye, Vec3::new(20.0, 20.0, 20.0));
        assert!(!view.view_projection().col(0).x.is_nan());
    }
}
