use glam::{Vec2, Vec3};

use crate::scene_graph::{material::MaterialId, mesh::Mesh, mesh::Vertex};

/// Unit cube centered on the origin with flat per-face normals.
pub fn cube(name: &str, material: MaterialId) -> Mesh {
    let faces = [
        (Vec3::X, Vec3::Y),
        (Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::Z),
        (Vec3::NEG_Y, Vec3::Z),
        (Vec3::Z, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, up) in faces {
        let right = up.cross(normal);
        let base = vertices.len() as u32;

        for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            let position = (normal + right * (u * 2.0 - 1.0) + up * (v * 2.0 - 1.0)) * 0.5;
            vertices.push(Vertex::new(position, normal, Vec2::new(u, v)));
        }

        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh::from_vertices(name, &vertices, indices, material)
}

/// Octahedron with unit radius, eight flat-shaded faces.
pub fn octahedron(name: &str, material: MaterialId) -> Mesh {
    let tips = [Vec3::Y, Vec3::NEG_Y];
    let ring = [Vec3::X, Vec3::Z, Vec3::NEG_X, Vec3::NEG_Z];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(24);

    for tip in tips {
        for i in 0..ring.len() {
            let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
            // Keep counter-clockwise winding when seen from outside
            let (a, b) = if tip.y > 0.0 { (b, a) } else { (a, b) };
            let normal = (a - tip).cross(b - tip).normalize();
            let base = vertices.len() as u32;

            vertices.push(Vertex::new(tip, normal, Vec2::new(0.5, 0.0)));
            vertices.push(Vertex::new(a, normal, Vec2::new(0.0, 1.0)));
            vertices.push(Vertex::new(b, normal, Vec2::new(1.0, 1.0)));
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }
    }

    Mesh::from_vertices(name, &vertices, indices, material)
}

#[cfg(test)]
mod tests {
    use id_arena::Arena;

    use super::*;
    use crate::scene_graph::material::Material;

    fn material() -> MaterialId {
        Arena::<Material>::new().alloc(Material::default())
    }

    #[test]
    fn cube_has_six_quads() {
        let mesh = cube("cube", material());

        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(mesh.bounds.min, Vec3::splat(-0.5));
        assert_eq!(mesh.bounds.max, Vec3::splat(0.5));
    }

    #[test]
    fn octahedron_normals_point_outwards() {
        let mesh = octahedron("octahedron", material());
        let vertices: Vec<Vertex> = bytemuck::pod_collect_to_vec(&mesh.vertex_data);

        assert_eq!(mesh.index_count(), 24);
        for triangle in vertices.chunks(3) {
            let centroid = (triangle[0].position + triangle[1].position + triangle[2].position) / 3.0;
            assert!(triangle[0].normal.dot(centroid) > 0.0);
        }
    }
}
