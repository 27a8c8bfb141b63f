use glam::{Mat3, Mat4, Vec4};

/// Per-item transforms derived from an instance and a mesh-local matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemTransforms {
    pub world: Mat4,
    pub prev_world: Mat4,
    /// Columns of the normal matrix, each padded to a `vec4`.
    pub world_inverse_transpose: [Vec4; 3],
}

impl ItemTransforms {
    /// `mesh_local` is assumed to be the same in both frames.
    pub fn compute(instance: Mat4, prev_instance: Mat4, mesh_local: Mat4) -> Self {
        let world = instance * mesh_local;
        let prev_world = prev_instance * mesh_local;

        Self {
            world,
            prev_world,
            world_inverse_transpose: inverse_transpose_3x4(&world),
        }
    }
}

/// `transpose(inverse(upper_left_3x3(world)))` laid out as three padded
/// columns. A singular matrix yields all zeroes instead of non-finite values.
pub fn inverse_transpose_3x4(world: &Mat4) -> [Vec4; 3] {
    let upper_left = Mat3::from_mat4(*world);

    if upper_left.determinant().abs() <= f32::EPSILON * f32::EPSILON {
        return [Vec4::ZERO; 3];
    }

    let normal_matrix = upper_left.inverse().transpose();

    [
        normal_matrix.x_axis.extend(0.0),
        normal_matrix.y_axis.extend(0.0),
        normal_matrix.z_axis.extend(0.0),
    ]
}
