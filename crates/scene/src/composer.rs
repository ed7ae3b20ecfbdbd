//! Builds the three puzzle layers and mirrors [`PuzzleState`] into them.

use crate::layer::{LayerKind, SceneError, Stage};
use crate::light::{LightHandle, PointLight, ShadowSettings};
use crate::material::{Material, Side};
use crate::node::{NodeHandle, SceneNode};
use glam::{Mat4, Vec3};
use shadowlock_assets::{AssetStore, MeshId, primitives};
use shadowlock_common::{Color, Transform};
use shadowlock_kernel::{LightingConfig, PuzzleConfig, PuzzleState};

/// Fixed placement of every scene object.
pub mod layout {
    use glam::Vec3;
    use shadowlock_common::Color;
    use std::f32::consts::PI;

    pub const SHAPE_POSITION: Vec3 = Vec3::new(0.0, -2.0, 0.0);
    pub const SHAPE_SCALE: f32 = 0.15;
    pub const SHAPE_COLOR: Color = Color::from_hex(0xadadad);

    pub const ROOM_SCALE: f32 = 0.025;
    pub const ROOM_ROTATION: Vec3 = Vec3::new(PI / 2.0, PI, 5.0 * PI / 4.0);
    pub const ROOM_COLOR: Color = Color::from_hex(0x5e5446);
    pub const ROOM_SHININESS: f32 = 15.0;
    pub const ROOM_FRONT_OPACITY: f32 = 0.35;
    pub const CARVING_OPACITY: f32 = 0.1;

    pub const PEDESTAL_SIZE: Vec3 = Vec3::new(0.5, 1.5, 0.5);
    pub const PEDESTAL_POSITION: Vec3 = Vec3::new(0.0, -5.25, 0.0);
    pub const KEY_RADIUS: f32 = 0.35;
    pub const KEY_SEGMENTS: u32 = 10;
    pub const KEY_POSITION: Vec3 = Vec3::new(0.0, -4.25, 0.0);

    pub const FILL_INTENSITY: f32 = 0.4;
}

/// Meshes the composer needs before any file has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticMeshes {
    pub pedestal: MeshId,
    pub key: MeshId,
}

impl StaticMeshes {
    pub fn register(store: &mut AssetStore) -> Self {
        let size = layout::PEDESTAL_SIZE;
        Self {
            pedestal: store.register_mesh(primitives::box_mesh(size.x, size.y, size.z)),
            key: store.register_mesh(primitives::sphere_mesh(
                layout::KEY_RADIUS,
                layout::KEY_SEGMENTS,
                layout::KEY_SEGMENTS,
            )),
        }
    }
}

/// Handles created when the shape mesh is attached.
///
/// The two attachment points (room and pedestal layers) always share one
/// rotation; the solution copy in the carving layer never moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeBinding {
    attachments: [(LayerKind, NodeHandle); 2],
    solution: NodeHandle,
}

impl ShapeBinding {
    pub fn attachments(&self) -> &[(LayerKind, NodeHandle); 2] {
        &self.attachments
    }

    pub fn solution(&self) -> NodeHandle {
        self.solution
    }

    fn apply_rotation(&self, stage: &mut Stage, rotation: Vec3) {
        for (kind, handle) in self.attachments {
            if let Some(node) = stage.layer_mut(kind).node_mut(handle) {
                node.transform.rotation = rotation;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomBinding {
    pub walls: NodeHandle,
    pub front: NodeHandle,
    pub carvings: NodeHandle,
}

/// Owns the [`Stage`] and keeps it in step with the puzzle.
#[derive(Debug, Clone)]
pub struct SceneComposer {
    stage: Stage,
    lighting: LightingConfig,
    solution_rotation: Vec3,
    puzzle_light: LightHandle,
    lamp: NodeHandle,
    key: NodeHandle,
    shape: Option<ShapeBinding>,
    room: Option<RoomBinding>,
}

impl SceneComposer {
    pub fn new(config: &PuzzleConfig, meshes: &StaticMeshes) -> Result<Self, SceneError> {
        let initial = PuzzleState::from_initial(&config.initial, &config.lighting);
        let lighting = config.lighting;
        let mut stage = Stage::new(initial.active_preset(&lighting).clear_color);

        let shadow = ShadowSettings {
            focus: layout::SHAPE_POSITION,
            ..ShadowSettings::default()
        };
        let puzzle_light = stage.room.add_light(
            PointLight::new(Color::WHITE, lighting.lit.intensity)
                .at(initial.light_position(&lighting))
                .with_shadow(shadow),
        );

        let targets = config.targets;
        let solution_x = targets.light_x as f32;
        stage.carving.add_light(
            PointLight::new(Color::WHITE, lighting.lit.intensity)
                .at(Vec3::new(solution_x, lighting.height, solution_x))
                .with_shadow(shadow),
        );
        stage
            .pedestal
            .add_light(PointLight::new(Color::WHITE, layout::FILL_INTENSITY).on_camera());

        let lamp = stage.pedestal.add(SceneNode::group("lamp"))?;
        stage.pedestal.add(
            SceneNode::mesh("pedestal", meshes.pedestal, Material::phong(Color::GRAY))
                .with_transform(Transform::from_position(layout::PEDESTAL_POSITION))
                .with_parent(lamp),
        )?;
        let key = stage.pedestal.add(
            SceneNode::mesh("key", meshes.key, Material::basic(Color::WHITE))
                .with_transform(Transform::from_position(layout::KEY_POSITION))
                .with_parent(lamp),
        )?;

        let solution_rotation = Vec3::new(
            targets.rotation_x as f32,
            config.initial.shape_rotation.y as f32,
            targets.rotation_z as f32,
        );

        let mut composer = Self {
            stage,
            lighting,
            solution_rotation,
            puzzle_light,
            lamp,
            key,
            shape: None,
            room: None,
        };
        composer.sync(&initial);
        Ok(composer)
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn shape(&self) -> Option<&ShapeBinding> {
        self.shape.as_ref()
    }

    pub fn room(&self) -> Option<&RoomBinding> {
        self.room.as_ref()
    }

    pub fn puzzle_light(&self) -> Option<&PointLight> {
        self.stage.room.light(self.puzzle_light)
    }

    pub fn lamp(&self) -> NodeHandle {
        self.lamp
    }

    pub fn key(&self) -> NodeHandle {
        self.key
    }

    /// Model matrix of a node with its parents applied.
    pub fn world_transform(&self, layer: LayerKind, handle: NodeHandle) -> Mat4 {
        self.stage.layer(layer).world_transform(handle)
    }

    /// Place the shape in all three layers. Returns `false` if already placed.
    pub fn attach_shape(&mut self, mesh: MeshId, state: &PuzzleState) -> Result<bool, SceneError> {
        if self.shape.is_some() {
            tracing::warn!(?mesh, "shape already attached");
            return Ok(false);
        }
        let material = Material::phong(layout::SHAPE_COLOR).with_specular(Color::WHITE);
        let placed = Transform::from_position(layout::SHAPE_POSITION)
            .with_uniform_scale(layout::SHAPE_SCALE)
            .with_rotation(state.shape_rotation_f32());

        let room = self
            .stage
            .room
            .add(SceneNode::mesh("shape", mesh, material).with_transform(placed).casting_shadow())?;
        let pedestal = self
            .stage
            .pedestal
            .add(SceneNode::mesh("shape", mesh, material).with_transform(placed))?;
        let solution = self.stage.carving.add(
            SceneNode::mesh(
                "solution",
                mesh,
                Material::basic(Color::WHITE).with_opacity(0.0),
            )
            .with_transform(placed.with_rotation(self.solution_rotation))
            .casting_shadow(),
        )?;

        self.shape = Some(ShapeBinding {
            attachments: [(LayerKind::Room, room), (LayerKind::Pedestal, pedestal)],
            solution,
        });
        tracing::debug!(?mesh, "shape attached");
        Ok(true)
    }

    /// Place the room walls and their carvings. Returns `false` if already placed.
    pub fn attach_room(&mut self, mesh: MeshId) -> Result<bool, SceneError> {
        if self.room.is_some() {
            tracing::warn!(?mesh, "room already attached");
            return Ok(false);
        }
        let placed = Transform::default()
            .with_rotation(layout::ROOM_ROTATION)
            .with_uniform_scale(layout::ROOM_SCALE);

        let walls = self.stage.room.add(
            SceneNode::mesh(
                "room",
                mesh,
                Material::phong(layout::ROOM_COLOR)
                    .with_shininess(layout::ROOM_SHININESS)
                    .with_side(Side::Double),
            )
            .with_transform(placed)
            .casting_shadow()
            .receiving_shadow(),
        )?;
        let front = self.stage.room.add(
            SceneNode::mesh(
                "room_front",
                mesh,
                Material::phong(Color::WHITE)
                    .with_opacity(layout::ROOM_FRONT_OPACITY)
                    .with_side(Side::Back),
            )
            .with_transform(placed),
        )?;
        let carvings = self.stage.carving.add(
            SceneNode::mesh(
                "carvings",
                mesh,
                Material::shadow_catcher(Color::WHITE, layout::CARVING_OPACITY),
            )
            .with_transform(placed)
            .receiving_shadow(),
        )?;

        self.room = Some(RoomBinding {
            walls,
            front,
            carvings,
        });
        tracing::debug!(?mesh, "room attached");
        Ok(true)
    }

    /// Copy every state-driven property onto the stage.
    pub fn sync(&mut self, state: &PuzzleState) {
        let preset = state.active_preset(&self.lighting);
        self.stage.clear_color = preset.clear_color;

        if let Some(light) = self.stage.room.light_mut(self.puzzle_light) {
            light.position = state.light_position(&self.lighting);
            light.intensity = preset.intensity;
            light.cast_shadow = state.casts_shadows();
        }
        if let Some(lamp) = self.stage.pedestal.node_mut(self.lamp) {
            lamp.transform.position = state.lamp_offset();
        }
        if let Some(key) = self.stage.pedestal.node_mut(self.key) {
            key.visible = state.key_visible();
        }
        if let Some(binding) = self.shape {
            binding.apply_rotation(&mut self.stage, state.shape_rotation_f32());
        }
    }
}
