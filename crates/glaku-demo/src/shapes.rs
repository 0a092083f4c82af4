use glam::Vec3;

/// Indexed mesh with per-vertex positions and normals.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u16>,
}

/// Unit cube centered on the origin, four vertices per face so normals stay
/// flat, wound counter-clockwise seen from outside.
pub fn unit_box() -> Mesh {
    let axes = [Vec3::X, Vec3::Y, Vec3::Z];
    let mut mesh = Mesh::default();

    for i in 0..3 {
        let (a, b, c) = (axes[i], axes[(i + 1) % 3], axes[(i + 2) % 3]);
        // (normal, u, v) with u x v == normal
        for (normal, u, v) in [(a, b, c), (-a, c, b)] {
            let base = (mesh.positions.len() / 3) as u16;
            for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
                let p = normal * 0.5 + u * su + v * sv;
                mesh.positions.extend_from_slice(&p.to_array());
                mesh.normals.extend_from_slice(&normal.to_array());
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }
    mesh
}

/// Full-screen quad as a 4-vertex triangle strip of 2D corners.
pub fn fullscreen_quad() -> [f32; 8] {
    [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(mesh: &Mesh, i: u16) -> Vec3 {
        Vec3::from_slice(&mesh.positions[i as usize * 3..])
    }

    #[test]
    fn box_has_flat_faces() {
        let mesh = unit_box();
        assert_eq!(mesh.positions.len(), 24 * 3);
        assert_eq!(mesh.normals.len(), 24 * 3);
        assert_eq!(mesh.indices.len(), 36);
    }

    #[test]
    fn triangles_face_outward() {
        let mesh = unit_box();
        for tri in mesh.indices.chunks(3) {
            let (p0, p1, p2) = (vertex(&mesh, tri[0]), vertex(&mesh, tri[1]), vertex(&mesh, tri[2]));
            let face_normal = (p1 - p0).cross(p2 - p0).normalize();
            let stored = Vec3::from_slice(&mesh.normals[tri[0] as usize * 3..]);
            assert!(face_normal.dot(stored) > 0.99, "{face_normal:?} vs {stored:?}");
            let centroid = (p0 + p1 + p2) / 3.0;
            assert!(centroid.dot(stored) > 0.0);
        }
    }
}
