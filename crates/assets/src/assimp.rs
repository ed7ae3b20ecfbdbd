//! Assimp JSON scene import (the format written by `assimp2json`).
//!
//! Only geometry is read: flat `vertices`, optional flat `normals` and
//! polygon `faces`. Node transformations and materials are ignored; the
//! scene composer places and shades the mesh itself.

use crate::{AssetError, MeshData};
use glam::Vec3;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct AssimpScene {
    #[serde(default)]
    rootnode: Option<AssimpNode>,
    #[serde(default)]
    meshes: Vec<AssimpMesh>,
}

#[derive(Debug, Deserialize)]
struct AssimpNode {
    #[serde(default)]
    meshes: Vec<usize>,
    #[serde(default)]
    children: Vec<AssimpNode>,
}

#[derive(Debug, Deserialize)]
struct AssimpMesh {
    #[serde(default)]
    name: Option<String>,
    vertices: Vec<f32>,
    #[serde(default)]
    normals: Option<Vec<f32>>,
    #[serde(default)]
    faces: Vec<Vec<u32>>,
}

/// Read and parse an Assimp JSON file. The mesh is named after the file stem.
pub fn load_file(path: impl AsRef<Path>) -> Result<MeshData, AssetError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh")
        .to_string();
    parse_scene(&name, &text)
}

/// Parse an Assimp JSON document into a single mesh.
///
/// The mesh used is the first one referenced by a child of the root node,
/// falling back to `meshes[0]`.
pub fn parse_scene(name: &str, json: &str) -> Result<MeshData, AssetError> {
    let scene: AssimpScene = serde_json::from_str(json)?;
    let index = scene
        .rootnode
        .as_ref()
        .and_then(|root| root.children.iter().find_map(|c| c.meshes.first().copied()))
        .unwrap_or(0);
    let mesh = scene.meshes.get(index).ok_or_else(|| {
        AssetError::Malformed(format!(
            "{name}: mesh {index} requested but scene has {} meshes",
            scene.meshes.len()
        ))
    })?;
    convert(name, mesh)
}

fn convert(name: &str, mesh: &AssimpMesh) -> Result<MeshData, AssetError> {
    let positions = triples(name, "vertices", &mesh.vertices)?;

    let mut indices = Vec::with_capacity(mesh.faces.len() * 3);
    for face in &mesh.faces {
        // Fan triangulation; points and lines carry no area.
        for k in 1..face.len().saturating_sub(1) {
            indices.extend_from_slice(&[face[0], face[k], face[k + 1]]);
        }
    }

    let normals = match &mesh.normals {
        Some(flat) if !flat.is_empty() => triples(name, "normals", flat)?,
        _ => Vec::new(),
    };

    let mut data = MeshData {
        name: mesh.name.clone().unwrap_or_else(|| name.to_string()),
        positions,
        normals,
        indices,
    };
    // Check indices before computing normals from them.
    let count = data.positions.len() as u32;
    if let Some(bad) = data.indices.iter().find(|&&i| i >= count) {
        return Err(AssetError::Malformed(format!(
            "{name}: face index {bad} out of range for {count} vertices"
        )));
    }
    if data.normals.is_empty() {
        data.normals = compute_normals(&data.positions, &data.indices);
    }
    data.validate()?;
    Ok(data)
}

fn triples(name: &str, field: &str, flat: &[f32]) -> Result<Vec<[f32; 3]>, AssetError> {
    if flat.len() % 3 != 0 {
        return Err(AssetError::Malformed(format!(
            "{name}: {field} length {} is not a multiple of 3",
            flat.len()
        )));
    }
    Ok(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

/// Area-weighted smooth normals.
pub fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from(positions[a]);
        let pb = Vec3::from(positions[b]);
        let pc = Vec3::from(positions[c]);
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = r#"{
        "rootnode": { "name": "root", "children": [ { "name": "quad", "meshes": [0] } ] },
        "meshes": [ {
            "name": "quad",
            "vertices": [0,0,0, 1,0,0, 1,1,0, 0,1,0],
            "normals": [0,0,1, 0,0,1, 0,0,1, 0,0,1],
            "faces": [[0,1,2,3]]
        } ]
    }"#;

    #[test]
    fn quad_is_fan_triangulated() {
        let mesh = parse_scene("quad", QUAD).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.normals[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn root_child_selects_mesh() {
        let json = r#"{
            "rootnode": { "children": [ { "meshes": [1] } ] },
            "meshes": [
                { "vertices": [0,0,0, 1,0,0, 0,1,0], "faces": [[0,1,2]] },
                { "name": "second", "vertices": [0,0,0, 0,1,0, 0,0,1], "faces": [[0,1,2]] }
            ]
        }"#;
        let mesh = parse_scene("scene", json).unwrap();
        assert_eq!(mesh.name, "second");
    }

    #[test]
    fn missing_normals_are_computed() {
        let json = r#"{ "meshes": [ { "vertices": [0,0,0, 1,0,0, 0,1,0], "faces": [[0,1,2]] } ] }"#;
        let mesh = parse_scene("tri", json).unwrap();
        assert_eq!(mesh.name, "tri");
        for n in &mesh.normals {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn degenerate_faces_are_skipped() {
        let json = r#"{ "meshes": [ { "vertices": [0,0,0, 1,0,0, 0,1,0], "faces": [[0], [0,1], [0,1,2]] } ] }"#;
        let mesh = parse_scene("tri", json).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn out_of_range_index_rejected() {
        let json = r#"{ "meshes": [ { "vertices": [0,0,0, 1,0,0, 0,1,0], "faces": [[0,1,5]] } ] }"#;
        assert!(matches!(
            parse_scene("bad", json),
            Err(AssetError::Malformed(_))
        ));
    }

    #[test]
    fn ragged_vertex_array_rejected() {
        let json = r#"{ "meshes": [ { "vertices": [0,0,0, 1,0], "faces": [] } ] }"#;
        assert!(matches!(
            parse_scene("bad", json),
            Err(AssetError::Malformed(_))
        ));
    }

    #[test]
    fn empty_scene_rejected() {
        assert!(matches!(
            parse_scene("empty", r#"{ "meshes": [] }"#),
            Err(AssetError::Malformed(_))
        ));
    }

    #[test]
    fn invalid_json_is_json_error() {
        assert!(matches!(
            parse_scene("bad", "{ not json"),
            Err(AssetError::Json(_))
        ));
    }

    #[test]
    fn load_file_names_mesh_after_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dodec.json");
        std::fs::write(
            &path,
            r#"{ "meshes": [ { "vertices": [0,0,0, 1,0,0, 0,1,0], "faces": [[0,1,2]] } ] }"#,
        )
        .unwrap();
        let mesh = load_file(&path).unwrap();
        assert_eq!(mesh.name, "dodec");
    }
}
