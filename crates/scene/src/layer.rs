use crate::light::{LightHandle, PointLight};
use crate::node::{NodeHandle, SceneNode};
use glam::Mat4;
use serde::{Deserialize, Serialize};
use shadowlock_common::Color;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("parent node {parent} does not exist in the {layer} layer")]
    UnknownParent { layer: &'static str, parent: usize },
}

/// The three composited layers, in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LayerKind {
    Room,
    Carving,
    Pedestal,
}

impl LayerKind {
    pub const ALL: [LayerKind; 3] = [LayerKind::Room, LayerKind::Carving, LayerKind::Pedestal];

    pub fn label(self) -> &'static str {
        match self {
            LayerKind::Room => "room",
            LayerKind::Carving => "carving",
            LayerKind::Pedestal => "pedestal",
        }
    }
}

/// Nodes and lights of a single layer.
#[derive(Debug, Clone)]
pub struct Scene {
    kind: LayerKind,
    nodes: Vec<SceneNode>,
    lights: Vec<PointLight>,
}

impl Scene {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            lights: Vec::new(),
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn add(&mut self, node: SceneNode) -> Result<NodeHandle, SceneError> {
        if let Some(parent) = node.parent {
            if parent.0 >= self.nodes.len() {
                return Err(SceneError::UnknownParent {
                    layer: self.kind.label(),
                    parent: parent.0,
                });
            }
        }
        let handle = NodeHandle(self.nodes.len());
        tracing::trace!(layer = self.kind.label(), node = %node.name, "add node");
        self.nodes.push(node);
        Ok(handle)
    }

    pub fn add_light(&mut self, light: PointLight) -> LightHandle {
        self.lights.push(light);
        LightHandle(self.lights.len() - 1)
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.nodes.get(handle.0)
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(handle.0)
    }

    pub fn light(&self, handle: LightHandle) -> Option<&PointLight> {
        self.lights.get(handle.0)
    }

    pub fn light_mut(&mut self, handle: LightHandle) -> Option<&mut PointLight> {
        self.lights.get_mut(handle.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &SceneNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeHandle(i), n))
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Model matrix with every ancestor applied.
    pub fn world_transform(&self, handle: NodeHandle) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut cursor = self.nodes.get(handle.0);
        while let Some(node) = cursor {
            matrix = node.transform.matrix() * matrix;
            cursor = node.parent.and_then(|p| self.nodes.get(p.0));
        }
        matrix
    }

    /// Visible only if the node and every ancestor are visible.
    pub fn is_visible(&self, handle: NodeHandle) -> bool {
        let mut cursor = self.nodes.get(handle.0);
        if cursor.is_none() {
            return false;
        }
        while let Some(node) = cursor {
            if !node.visible {
                return false;
            }
            cursor = node.parent.and_then(|p| self.nodes.get(p.0));
        }
        true
    }

    /// The first light that currently renders a shadow map.
    pub fn shadow_light(&self) -> Option<&PointLight> {
        self.lights.iter().find(|l| l.renders_shadow())
    }
}

/// All three layers plus the frame clear colour.
#[derive(Debug, Clone)]
pub struct Stage {
    pub room: Scene,
    pub carving: Scene,
    pub pedestal: Scene,
    pub clear_color: Color,
}

impl Stage {
    pub fn new(clear_color: Color) -> Self {
        Self {
            room: Scene::new(LayerKind::Room),
            carving: Scene::new(LayerKind::Carving),
            pedestal: Scene::new(LayerKind::Pedestal),
            clear_color,
        }
    }

    pub fn layer(&self, kind: LayerKind) -> &Scene {
        match kind {
            LayerKind::Room => &self.room,
            LayerKind::Carving => &self.carving,
            LayerKind::Pedestal => &self.pedestal,
        }
    }

    pub fn layer_mut(&mut self, kind: LayerKind) -> &mut Scene {
        match kind {
            LayerKind::Room => &mut self.room,
            LayerKind::Carving => &mut self.carving,
            LayerKind::Pedestal => &mut self.pedestal,
        }
    }

    pub fn layers(&self) -> impl Iterator<Item = &Scene> {
        [&self.room, &self.carving, &self.pedestal].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use glam::Vec3;
    use shadowlock_assets::MeshId;
    use shadowlock_common::Transform;

    #[test]
    fn child_inherits_parent_offset() {
        let mut scene = Scene::new(LayerKind::Pedestal);
        let group = scene
            .add(SceneNode::group("lamp").with_transform(Transform::from_position(Vec3::new(2.0, 0.0, 2.0))))
            .unwrap();
        let key = scene
            .add(
                SceneNode::mesh("key", MeshId(1), Material::basic(Color::WHITE))
                    .with_transform(Transform::from_position(Vec3::new(0.0, -4.25, 0.0)))
                    .with_parent(group),
            )
            .unwrap();
        let origin = scene.world_transform(key).transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(2.0, -4.25, 2.0)).length() < 1e-6);
    }

    #[test]
    fn unknown_parent_rejected() {
        let mut scene = Scene::new(LayerKind::Room);
        let err = scene
            .add(SceneNode::group("orphan").with_parent(NodeHandle(4)))
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::UnknownParent {
                layer: "room",
                parent: 4
            }
        );
        assert!(scene.is_empty());
    }

    #[test]
    fn hidden_parent_hides_children() {
        let mut scene = Scene::new(LayerKind::Pedestal);
        let group = scene.add(SceneNode::group("g")).unwrap();
        let child = scene.add(SceneNode::group("c").with_parent(group)).unwrap();
        assert!(scene.is_visible(child));
        scene.node_mut(group).unwrap().visible = false;
        assert!(!scene.is_visible(child));
        assert!(!scene.is_visible(NodeHandle(9)));
    }

    #[test]
    fn stage_layers_in_draw_order() {
        let stage = Stage::new(Color::BLACK);
        let kinds: Vec<_> = stage.layers().map(Scene::kind).collect();
        assert_eq!(kinds, LayerKind::ALL.to_vec());
    }
}
