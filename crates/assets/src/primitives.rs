//! Procedural meshes for the static props (pedestal box, key orb).

use crate::MeshData;
use glam::Vec3;
use std::f32::consts::PI;

/// Axis-aligned box centred on the origin, 24 vertices with flat normals.
pub fn box_mesh(width: f32, height: f32, depth: f32) -> MeshData {
    let half = Vec3::new(width, height, depth) * 0.5;
    // (normal, u, v) with u x v == normal so corners wind counter-clockwise.
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = positions.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            positions.push(((normal + u * su + v * sv) * half).to_array());
            normals.push(normal.to_array());
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    MeshData {
        name: format!("box_{width}x{height}x{depth}"),
        positions,
        normals,
        indices,
    }
}

/// UV sphere with the poles on Y. Pole rows emit one triangle per segment.
pub fn sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);

    let mut positions = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);
    let mut normals = Vec::with_capacity(positions.capacity());
    for iy in 0..=hs {
        let theta = iy as f32 / hs as f32 * PI;
        for ix in 0..=ws {
            let phi = ix as f32 / ws as f32 * 2.0 * PI;
            let n = Vec3::new(-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin());
            positions.push((n * radius).to_array());
            normals.push(n.try_normalize().unwrap_or(Vec3::Y).to_array());
        }
    }

    let row = ws + 1;
    let mut indices = Vec::new();
    for iy in 0..hs {
        for ix in 0..ws {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != hs - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    MeshData {
        name: format!("sphere_{radius}_{ws}x{hs}"),
        positions,
        normals,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winding_matches_normals(mesh: &MeshData) -> bool {
        mesh.indices.chunks_exact(3).all(|tri| {
            let p = |i: u32| Vec3::from(mesh.positions[i as usize]);
            let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            let n = Vec3::from(mesh.normals[tri[0] as usize])
                + Vec3::from(mesh.normals[tri[1] as usize])
                + Vec3::from(mesh.normals[tri[2] as usize]);
            face.dot(n) > 0.0
        })
    }

    #[test]
    fn pedestal_box_extents() {
        let mesh = box_mesh(0.5, 1.5, 0.5);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, [-0.25, -0.75, -0.25]);
        assert_eq!(max, [0.25, 0.75, 0.25]);
        mesh.validate().unwrap();
    }

    #[test]
    fn box_faces_point_outward() {
        assert!(winding_matches_normals(&box_mesh(1.0, 2.0, 3.0)));
    }

    #[test]
    fn key_sphere_counts() {
        let mesh = sphere_mesh(0.35, 10, 10);
        assert_eq!(mesh.vertex_count(), 121);
        assert_eq!(mesh.triangle_count(), 180);
        mesh.validate().unwrap();
    }

    #[test]
    fn sphere_vertices_on_radius() {
        let mesh = sphere_mesh(0.35, 10, 10);
        for p in &mesh.positions {
            assert!((Vec3::from(*p).length() - 0.35).abs() < 1e-5);
        }
        assert!(winding_matches_normals(&mesh));
    }
}
