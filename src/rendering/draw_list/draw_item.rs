use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::{
    rendering::draw_list::transforms::ItemTransforms,
    scene_graph::{MaterialId, MeshId, SceneGraph},
};

/// Position of a draw item in the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawSource {
    pub model: usize,
    pub model_instance: usize,
    pub mesh: usize,
    pub mesh_instance: usize,
}

/// One mesh instance placed by one model instance.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub source: DrawSource,
    pub mesh: MeshId,
    pub material: MaterialId,
    /// Stable per-mesh integer handed to shaders.
    pub mesh_id: u32,
    pub draw_id: u32,
    pub transforms: ItemTransforms,
}

impl DrawItem {
    /// Recomputes this item's transforms from the scene's current instance
    /// state. The cached `transforms` are left untouched.
    pub fn current_transforms(&self, scene: &dyn SceneGraph) -> ItemTransforms {
        let source = &self.source;
        let instance = scene.model_instance(source.model, source.model_instance);
        let local = scene
            .mesh_instance(source.model, source.mesh, source.mesh_instance)
            .local_transform;

        ItemTransforms::compute(instance.matrix(), instance.prev_matrix(), local)
    }

    pub fn constants(&self) -> DrawConstants {
        DrawConstants::new(&self.transforms, self.draw_id, self.mesh_id)
    }
}

/// This should match the `DrawConstants` struct defined in WGSL
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq)]
pub struct DrawConstants {
    pub world: Mat4,
    pub prev_world: Mat4,
    pub world_inverse_transpose: [Vec4; 3],
    pub draw_id: u32,
    pub mesh_id: u32,
    // A per-item material index would go here
    _padding: [u32; 2],
}

impl DrawConstants {
    pub const SIZE: u64 = std::mem::size_of::<DrawConstants>() as u64;

    pub fn new(transforms: &ItemTransforms, draw_id: u32, mesh_id: u32) -> Self {
        Self {
            world: transforms.world,
            prev_world: transforms.prev_world,
            world_inverse_transpose: transforms.world_inverse_transpose,
            draw_id,
            mesh_id,
            _padding: [0; 2],
        }
    }
}

pub fn build_draw_constants(items: &[DrawItem]) -> Vec<DrawConstants> {
    items.iter().map(DrawItem::constants).collect()
}

#[cfg(test)]
mod tests {
    use std::mem::offset_of;

    use super::*;

    #[test]
    fn draw_constants_stride_is_16_byte_aligned() {
        assert_eq!(DrawConstants::SIZE, 192);
        assert_eq!(DrawConstants::SIZE % 16, 0);
        assert_eq!(offset_of!(DrawConstants, prev_world), 64);
        assert_eq!(offset_of!(DrawConstants, world_inverse_transpose), 128);
        assert_eq!(offset_of!(DrawConstants, draw_id), 176);
        assert_eq!(offset_of!(DrawConstants, mesh_id), 180);
    }
}
