use crate::material::Material;
use shadowlock_assets::MeshId;
use shadowlock_common::{Color, Transform};

/// Handle to a node in a specific layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) usize);

impl NodeHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A renderable mesh or an empty group.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// `None` for groups.
    pub mesh: Option<MeshId>,
    pub material: Material,
    /// Relative to the parent, if any.
    pub transform: Transform,
    pub parent: Option<NodeHandle>,
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl SceneNode {
    pub fn mesh(name: impl Into<String>, mesh: MeshId, material: Material) -> Self {
        Self {
            name: name.into(),
            mesh: Some(mesh),
            material,
            transform: Transform::default(),
            parent: None,
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self {
            mesh: None,
            ..Self::mesh(name, MeshId(0), Material::basic(Color::WHITE))
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_parent(mut self, parent: NodeHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn casting_shadow(mut self) -> Self {
        self.cast_shadow = true;
        self
    }

    pub fn receiving_shadow(mut self) -> Self {
        self.receive_shadow = true;
        self
    }
}
