use crate::{
    rendering::draw_list::{draw_item::DrawItem, error::DrawListError},
    scene_graph::{IndexData, SceneGraph, VertexLayout},
};

/// Where one draw item's geometry lives inside the merged buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    pub vertex_offset: u32,
    pub vertex_count: u32,
    pub first_index: u32,
    pub index_count: u32,
}

/// Every draw item's vertices and indices concatenated into one vertex
/// stream and one 32-bit index stream, in draw id order.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedGeometry {
    /// Shared by every source mesh. `None` only when there are no items.
    pub layout: Option<VertexLayout>,
    pub vertex_data: Vec<u8>,
    pub indices: Vec<u32>,
    /// Indexed by draw id.
    pub ranges: Vec<DrawRange>,
}

impl MergedGeometry {
    /// Every mesh must use `vertex_layout`, the layout the merged buffer is
    /// read with.
    pub fn build(
        scene: &dyn SceneGraph,
        items: &[DrawItem],
        vertex_layout: &VertexLayout,
    ) -> Result<Self, DrawListError> {
        let mut vertex_bytes = 0u64;
        let mut vertex_total = 0u64;
        let mut index_total = 0u64;

        // Validate everything before copying anything
        for item in items {
            let mesh = scene.mesh_data(item.mesh);

            if mesh.layout != *vertex_layout {
                return Err(DrawListError::VertexLayoutMismatch {
                    draw_id: item.draw_id,
                    name: mesh.name.clone(),
                });
            }

            if let IndexData::U16(_) = mesh.indices {
                return Err(DrawListError::UnsupportedIndexFormat {
                    draw_id: item.draw_id,
                    name: mesh.name.clone(),
                    format: mesh.indices.format(),
                });
            }

            vertex_bytes += mesh.vertex_data.len() as u64;
            vertex_total += mesh.vertex_count() as u64;
            index_total += mesh.index_count() as u64;
        }

        // Base vertices are signed in indirect args
        if vertex_total > i32::MAX as u64 || index_total > u32::MAX as u64 {
            return Err(DrawListError::GeometryTooLarge {
                vertices: vertex_total,
                indices: index_total,
            });
        }

        let mut vertex_data = Vec::with_capacity(vertex_bytes as usize);
        let mut indices = Vec::with_capacity(index_total as usize);
        let mut ranges = Vec::with_capacity(items.len());
        let mut vertex_offset = 0u32;

        for item in items {
            let mesh = scene.mesh_data(item.mesh);
            let first_index = indices.len() as u32;

            vertex_data.extend_from_slice(&mesh.vertex_data);
            if let IndexData::U32(mesh_indices) = &mesh.indices {
                indices.extend_from_slice(mesh_indices);
            }

            ranges.push(DrawRange {
                vertex_offset,
                vertex_count: mesh.vertex_count(),
                first_index,
                index_count: mesh.index_count(),
            });

            vertex_offset += mesh.vertex_count();
        }

        Ok(Self {
            layout: (!items.is_empty()).then(|| vertex_layout.clone()),
            vertex_data,
            indices,
            ranges,
        })
    }

    pub fn vertex_count(&self) -> u32 {
        self.ranges.iter().map(|range| range.vertex_count).sum()
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::{
        rendering::draw_list::enumerator::enumerate_draw_items,
        scene_graph::{
            mesh::RENDER_MODEL_VBL, primitives, Material, MaterialId, Mesh, MeshInstance, Model,
            ModelInstance, Scene, Transform, Vertex,
        },
    };

    fn scene_with(meshes: impl FnOnce(MaterialId) -> Vec<Mesh>) -> Scene {
        let mut scene = Scene::new();
        let material = scene.add_material(Material::default());
        let mut model = Model::new("model");
        for mesh in meshes(material) {
            let id = scene.add_mesh(mesh);
            model = model.with_mesh(id, vec![MeshInstance::default()]);
        }
        let model = scene.add_model(model);
        scene.add_model_instance(model, ModelInstance::new("a", Transform::IDENTITY));
        scene.add_model_instance(model, ModelInstance::new("b", Transform::IDENTITY));
        scene
    }

    #[test]
    fn ranges_are_contiguous_and_cover_everything() {
        let scene = scene_with(|m| vec![primitives::cube("cube", m), primitives::octahedron("gem", m)]);

        let items = enumerate_draw_items(&scene).unwrap();
        let merged = MergedGeometry::build(&scene, &items, &Vertex::layout()).unwrap();

        assert_eq!(merged.ranges.len(), 4);
        assert_eq!(merged.indices.len(), 2 * (36 + 24));
        assert_eq!(merged.vertex_count(), 2 * (24 + 24));
        assert_eq!(merged.vertex_data.len(), merged.vertex_count() as usize * 32);

        let mut next_vertex = 0;
        let mut next_index = 0;
        for (range, item) in merged.ranges.iter().zip(&items) {
            let mesh = scene.mesh_data(item.mesh);
            assert_eq!(range.vertex_offset, next_vertex);
            assert_eq!(range.first_index, next_index);
            assert_eq!(range.index_count, mesh.index_count());
            next_vertex += range.vertex_count;
            next_index += range.index_count;
        }
    }

    #[test]
    fn copied_indices_are_mesh_local() {
        let scene = scene_with(|m| vec![primitives::cube("cube", m)]);

        let items = enumerate_draw_items(&scene).unwrap();
        let merged = MergedGeometry::build(&scene, &items, &Vertex::layout()).unwrap();
        let second = merged.ranges[1];

        // Rebasing is done through the base vertex, not by rewriting indices
        assert_eq!(
            &merged.indices[second.first_index as usize..][..second.index_count as usize],
            &merged.indices[..second.index_count as usize]
        );
        assert_eq!(second.vertex_offset, 24);
    }

    fn narrow_cube(name: &str, material: MaterialId) -> Mesh {
        let mut narrow = primitives::cube(name, material);
        let mut attributes = RENDER_MODEL_VBL.attributes.to_vec();
        attributes.pop();
        narrow.layout = VertexLayout {
            array_stride: 24,
            attributes,
        };
        narrow.vertex_data.truncate(24 * 24);
        narrow
    }

    #[test]
    fn mismatched_layouts_are_refused() {
        let scene = scene_with(|m| vec![primitives::cube("cube", m), narrow_cube("narrow", m)]);
        let items = enumerate_draw_items(&scene).unwrap();

        assert_eq!(
            MergedGeometry::build(&scene, &items, &Vertex::layout()),
            Err(DrawListError::VertexLayoutMismatch {
                draw_id: 1,
                name: "narrow".to_string(),
            })
        );
    }

    #[test]
    fn uniform_foreign_layout_is_refused() {
        // Consistent among themselves, but not what the pipeline reads
        let scene = scene_with(|m| vec![narrow_cube("first", m), narrow_cube("second", m)]);
        let items = enumerate_draw_items(&scene).unwrap();

        assert_eq!(
            MergedGeometry::build(&scene, &items, &Vertex::layout()),
            Err(DrawListError::VertexLayoutMismatch {
                draw_id: 0,
                name: "first".to_string(),
            })
        );
    }

    #[test]
    fn merged_layout_is_the_pipeline_layout() {
        let scene = scene_with(|m| vec![narrow_cube("first", m)]);
        let items = enumerate_draw_items(&scene).unwrap();
        let layout = scene.mesh_data(items[0].mesh).layout.clone();

        let merged = MergedGeometry::build(&scene, &items, &layout).unwrap();

        assert_eq!(merged.layout, Some(layout));
        assert_eq!(merged.vertex_data.len(), 2 * 24 * 24);
    }

    #[test]
    fn sixteen_bit_indices_are_refused() {
        let scene = scene_with(|m| {
            let vertices = [
                Vertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO),
                Vertex::new(Vec3::X, Vec3::Z, Vec2::X),
                Vertex::new(Vec3::Y, Vec3::Z, Vec2::Y),
            ];
            let mut small = Mesh::from_vertices("small", &vertices, vec![0, 1, 2], m);
            small.indices = IndexData::U16(vec![0, 1, 2]);
            vec![small]
        });
        let items = enumerate_draw_items(&scene).unwrap();

        assert!(matches!(
            MergedGeometry::build(&scene, &items, &Vertex::layout()),
            Err(DrawListError::UnsupportedIndexFormat {
                draw_id: 0,
                format: wgpu::IndexFormat::Uint16,
                ..
            })
        ));
    }

    #[test]
    fn empty_item_list_gives_empty_geometry() {
        let scene = Scene::new();
        let merged = MergedGeometry::build(&scene, &[], &Vertex::layout()).unwrap();

        assert!(merged.layout.is_none());
        assert!(merged.ranges.is_empty());
        assert!(merged.indices.is_empty());
    }
}
