//! Scene graph for the three composited puzzle layers.
//!
//! Nodes and lights live in per-layer storage and are referred to by typed
//! handles captured when they are created. Nothing is looked up by name.
//!
//! # Invariants
//! - A node's parent is always created before the node (no cycles).
//! - Both shape attachment points carry the same transform after `sync`.
//! - The scene never mutates puzzle state; it only mirrors it.

mod composer;
mod layer;
mod light;
mod material;
mod node;

pub use composer::{RoomBinding, SceneComposer, ShapeBinding, StaticMeshes, layout};
pub use layer::{LayerKind, Scene, SceneError, Stage};
pub use light::{LightHandle, LightMount, PointLight, ShadowSettings};
pub use material::{Material, Shading, Side};
pub use node::{NodeHandle, SceneNode};

pub fn crate_info() -> &'static str {
    "shadowlock-scene v0.1.0"
}
