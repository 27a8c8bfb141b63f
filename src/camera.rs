use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::math::bounds::BoundingSphere;

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(1.0, 2.0, 1.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// Looks at the whole of `bounds` from above and to the side, with clip
    /// planes scaled to its radius.
    pub fn framing(bounds: &BoundingSphere) -> Self {
        let radius = bounds.radius.max(f32::EPSILON);

        Self {
            eye: bounds.center + Vec3::new(-0.8, 0.5, 0.8) * radius,
            target: bounds.center,
            near: (radius / 750.0).max(0.1),
            far: radius * 20.0,
            ..Default::default()
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_lh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self, resolution: Vec2) -> Mat4 {
        let aspect = if resolution.y > 0.0 {
            resolution.x / resolution.y
        } else {
            1.0
        };
        Mat4::perspective_lh(self.fov_y, aspect, self.near, self.far)
    }
}

/// This should match the `Camera` struct defined in WGSL
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default, PartialEq)]
pub struct CameraUniform {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_proj: Mat4,
    /// w is unused
    pub position: Vec4,
}

impl CameraUniform {
    pub fn new(camera: &Camera, resolution: Vec2) -> Self {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix(resolution);

        Self {
            view,
            projection,
            view_proj: projection * view,
            position: camera.eye.extend(1.0),
        }
    }
}
