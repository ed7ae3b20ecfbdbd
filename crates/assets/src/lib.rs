//! Mesh assets: content-addressed store, Assimp JSON import, primitives.
//!
//! Meshes are identified by a hash of their contents. The scene and the
//! renderer refer to meshes by `MeshId`, never by file path.
//!
//! # Invariants
//! - Registering identical mesh data twice yields the same id and one entry.
//! - Every index in a stored mesh is in range for its vertex arrays.

pub mod assimp;
pub mod loader;
pub mod primitives;

pub use loader::{AssetLoader, AssetSlot, LoadResult};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Content-addressed mesh ID computed from the mesh data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub u64);

/// Indexed triangle mesh with per-vertex normals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds as (min, max). `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some((min, max))
    }

    /// Check array lengths and index ranges.
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.normals.len() != self.positions.len() {
            return Err(AssetError::Malformed(format!(
                "{}: {} normals for {} positions",
                self.name,
                self.normals.len(),
                self.positions.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(AssetError::Malformed(format!(
                "{}: index count {} is not a multiple of 3",
                self.name,
                self.indices.len()
            )));
        }
        let count = self.positions.len() as u32;
        if let Some(bad) = self.indices.iter().find(|&&i| i >= count) {
            return Err(AssetError::Malformed(format!(
                "{}: index {bad} out of range for {count} vertices",
                self.name
            )));
        }
        Ok(())
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("mesh not found: {0:?}")]
    NotFound(MeshId),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed mesh: {0}")]
    Malformed(String),
}

/// Content-addressed mesh registry.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    meshes: BTreeMap<MeshId, MeshData>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh and return its ID.
    pub fn register_mesh(&mut self, mesh: MeshData) -> MeshId {
        let id = content_hash(&mesh);
        if !self.meshes.contains_key(&id) {
            tracing::debug!(
                "registered mesh {} ({} vertices, {} triangles)",
                mesh.name,
                mesh.vertex_count(),
                mesh.triangle_count()
            );
            self.meshes.insert(id, mesh);
        }
        id
    }

    pub fn get_mesh(&self, id: MeshId) -> Option<&MeshData> {
        self.meshes.get(&id)
    }

    pub fn mesh(&self, id: MeshId) -> Result<&MeshData, AssetError> {
        self.get_mesh(id).ok_or(AssetError::NotFound(id))
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &MeshData)> {
        self.meshes.iter().map(|(id, m)| (*id, m))
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Read an Assimp JSON file synchronously and register its mesh.
    pub fn import_assimp_json(&mut self, path: impl AsRef<Path>) -> Result<MeshId, AssetError> {
        let mesh = assimp::load_file(path)?;
        Ok(self.register_mesh(mesh))
    }
}

fn content_hash(mesh: &MeshData) -> MeshId {
    let mut hasher = Sha256::new();
    hasher.update(mesh.name.as_bytes());
    for p in &mesh.positions {
        for c in p {
            hasher.update(c.to_le_bytes());
        }
    }
    for i in &mesh.indices {
        hasher.update(i.to_le_bytes());
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    MeshId(u64::from_le_bytes(bytes))
}

pub fn crate_info() -> &'static str {
    "shadowlock-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(name: &str) -> MeshData {
        MeshData {
            name: name.into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn register_and_get() {
        let mut store = AssetStore::new();
        let id = store.register_mesh(triangle("tri"));
        assert_eq!(store.get_mesh(id).unwrap().triangle_count(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn content_addressed_dedup() {
        let mut store = AssetStore::new();
        let a = store.register_mesh(triangle("tri"));
        let b = store.register_mesh(triangle("tri"));
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);

        let c = store.register_mesh(triangle("other"));
        assert_ne!(a, c);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn missing_mesh_is_not_found() {
        let store = AssetStore::new();
        assert!(matches!(
            store.mesh(MeshId(7)),
            Err(AssetError::NotFound(MeshId(7)))
        ));
    }

    #[test]
    fn validate_rejects_bad_index() {
        let mut mesh = triangle("tri");
        mesh.indices = vec![0, 1, 3];
        assert!(matches!(mesh.validate(), Err(AssetError::Malformed(_))));
    }

    #[test]
    fn validate_rejects_normal_mismatch() {
        let mut mesh = triangle("tri");
        mesh.normals.pop();
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn bounds_cover_all_positions() {
        let (min, max) = triangle("tri").bounds().unwrap();
        assert_eq!(min, [0.0, 0.0, 0.0]);
        assert_eq!(max, [1.0, 1.0, 0.0]);
    }
}
