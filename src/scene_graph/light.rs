use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
}

#[derive(Debug, Clone)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Distance at which a point light fades out completely.
    pub range: f32,
}

impl Light {
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            position: Vec3::ZERO,
            direction: direction.normalize_or_zero(),
            color,
            intensity,
            range: 0.0,
        }
    }

    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            kind: LightKind::Point,
            position,
            direction: Vec3::ZERO,
            color,
            intensity,
            range,
        }
    }

    pub fn to_gpu(&self) -> GpuLight {
        let kind = match self.kind {
            LightKind::Directional => 0.0,
            LightKind::Point => 1.0,
        };

        GpuLight {
            position: self.position.extend(1.0),
            direction: self.direction.extend(0.0),
            color: self.color.extend(self.intensity),
            params: Vec4::new(kind, self.range, 0.0, 0.0),
        }
    }
}

/// This should match the `Light` struct defined in WGSL
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq)]
pub struct GpuLight {
    pub position: Vec4,
    pub direction: Vec4,
    /// rgb = color, a = intensity
    pub color: Vec4,
    /// x = kind, y = range
    pub params: Vec4,
}

impl GpuLight {
    pub const SHADER_STRUCT_SIZE: u64 = std::mem::size_of::<GpuLight>() as u64;
}
