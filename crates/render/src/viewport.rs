/// Drawable region at the top of the window.
///
/// A strip at the bottom is left to the control panel, so the 3D view
/// never spans the whole surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const CONTROL_STRIP: u32 = 200;

    /// Never returns a zero-sized region.
    pub fn from_window(width: u32, height: u32, reserved_bottom: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.saturating_sub(reserved_bottom).max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_window(1280, 720 + Self::CONTROL_STRIP, Self::CONTROL_STRIP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserves_control_strip() {
        let vp = Viewport::from_window(1000, 700, Viewport::CONTROL_STRIP);
        assert_eq!(vp, Viewport { width: 1000, height: 500 });
        assert!((vp.aspect() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn tiny_window_clamps() {
        let vp = Viewport::from_window(0, 150, Viewport::CONTROL_STRIP);
        assert_eq!(vp, Viewport { width: 1, height: 1 });
    }

    #[test]
    fn resize_leaves_scene_content_alone() {
        use crate::{DebugTextRenderer, FramePlan, RenderView, Renderer};
        use shadowlock_assets::AssetStore;
        use shadowlock_kernel::PuzzleConfig;
        use shadowlock_scene::{SceneComposer, StaticMeshes};

        let mut store = AssetStore::new();
        let meshes = StaticMeshes::register(&mut store);
        let composer = SceneComposer::new(&PuzzleConfig::default(), &meshes).unwrap();
        let plan = FramePlan::standard();

        let small = RenderView::default();
        let large = RenderView {
            viewport: Viewport::from_window(1920, 1280, Viewport::CONTROL_STRIP),
            ..small
        };
        assert!((large.viewport.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
        assert_ne!(small.projection_matrix(), large.projection_matrix());

        let renderer = DebugTextRenderer::new();
        let before = renderer.render(composer.stage(), &small, &plan);
        let after = renderer.render(composer.stage(), &large, &plan);
        let scene_lines = |text: &str| -> Vec<String> {
            text.lines()
                .filter(|l| !l.starts_with("Camera:"))
                .map(str::to_owned)
                .collect()
        };
        assert_eq!(scene_lines(&before), scene_lines(&after));
        assert!(after.contains("viewport=1920x1080"));
    }
}
