use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use id_arena::Id;

pub type MaterialId = Id<Material>;

#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub base_color: Vec4,
}

impl Material {
    pub fn new(name: impl Into<String>, base_color: Vec4) -> Self {
        Self {
            name: name.into(),
            base_color,
        }
    }

    pub fn to_gpu(&self) -> GpuMaterial {
        GpuMaterial {
            base_color: self.base_color,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default material", Vec4::new(0.8, 0.8, 0.8, 1.0))
    }
}

/// This should match the `Material` struct defined in WGSL
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct GpuMaterial {
    pub base_color: Vec4,
}
