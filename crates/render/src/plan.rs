use shadowlock_scene::LayerKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthTest {
    Less,
    /// Draw regardless of depth (carvings show through the walls they sit on).
    Always,
}

/// Output tone curve applied in the fragment shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToneMapping {
    None,
    Uncharted2 { exposure: f32 },
}

/// One layer of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerPass {
    pub layer: LayerKind,
    pub clear_color: bool,
    pub clear_depth: bool,
    pub depth: DepthTest,
}

/// Ordered layer passes composited onto one target.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub passes: Vec<LayerPass>,
    pub tone_mapping: ToneMapping,
}

impl FramePlan {
    /// Room, then carvings over it, then pedestal props on top.
    pub fn standard() -> Self {
        Self {
            passes: vec![
                LayerPass {
                    layer: LayerKind::Room,
                    clear_color: true,
                    clear_depth: true,
                    depth: DepthTest::Less,
                },
                LayerPass {
                    layer: LayerKind::Carving,
                    clear_color: false,
                    clear_depth: true,
                    depth: DepthTest::Always,
                },
                LayerPass {
                    layer: LayerKind::Pedestal,
                    clear_color: false,
                    clear_depth: true,
                    depth: DepthTest::Less,
                },
            ],
            tone_mapping: ToneMapping::Uncharted2 { exposure: 1.0 },
        }
    }

    pub fn pass(&self, layer: LayerKind) -> Option<&LayerPass> {
        self.passes.iter().find(|p| p.layer == layer)
    }
}

impl Default for FramePlan {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_cleared_once_depth_every_layer() {
        let plan = FramePlan::standard();
        let order: Vec<_> = plan.passes.iter().map(|p| p.layer).collect();
        assert_eq!(order, LayerKind::ALL.to_vec());
        assert_eq!(plan.passes.iter().filter(|p| p.clear_color).count(), 1);
        assert!(plan.passes[0].clear_color);
        assert!(plan.passes.iter().all(|p| p.clear_depth));
    }

    #[test]
    fn carvings_ignore_depth() {
        let plan = FramePlan::standard();
        assert_eq!(plan.pass(LayerKind::Carving).unwrap().depth, DepthTest::Always);
        assert_eq!(plan.pass(LayerKind::Room).unwrap().depth, DepthTest::Less);
        assert_eq!(plan.pass(LayerKind::Pedestal).unwrap().depth, DepthTest::Less);
    }
}
