use std::collections::HashMap;

use anyhow::Context;

use crate::{
    rendering::{
        backend::{BufferHandle, BufferUsage, GeometryBinding, RenderBackend},
        draw_list::DrawListError,
    },
    scene_graph::{MaterialId, Mesh, MeshId, SceneGraph},
};

/// One mesh's own vertex and index buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBuffers {
    pub geometry: GeometryBinding,
    pub index_count: u32,
}

/// GPU copies of every mesh and material a scene's models reference, each
/// uploaded once. Used by the per-item strategies.
pub struct SceneResources {
    meshes: HashMap<MeshId, MeshBuffers>,
    materials: HashMap<MaterialId, BufferHandle>,
}

impl SceneResources {
    /// Refuses the whole scene, before creating any buffer, if a mesh does
    /// not use the backend's vertex layout.
    pub fn upload(scene: &dyn SceneGraph, backend: &mut dyn RenderBackend) -> anyhow::Result<Self> {
        check_vertex_layouts(scene, backend)?;

        let mut resources = Self {
            meshes: HashMap::new(),
            materials: HashMap::new(),
        };

        for model in 0..scene.model_count() {
            for mesh in 0..scene.mesh_count(model) {
                let mesh_id = scene.mesh(model, mesh);
                if resources.meshes.contains_key(&mesh_id) {
                    continue;
                }

                let data = scene.mesh_data(mesh_id);
                let buffers = upload_mesh(backend, data)
                    .with_context(|| format!("Failed to upload mesh {}", data.name))?;
                resources.meshes.insert(mesh_id, buffers);

                if !resources.materials.contains_key(&data.material) {
                    let material = scene.material(data.material);
                    let buffer = backend
                        .create_buffer(
                            &format!("Material buffer ({})", material.name),
                            BufferUsage::Uniform,
                            bytemuck::bytes_of(&material.to_gpu()),
                        )
                        .with_context(|| format!("Failed to upload material {}", material.name))?;
                    resources.materials.insert(data.material, buffer);
                }
            }
        }

        log::info!(
            "Uploaded {} meshes and {} materials",
            resources.meshes.len(),
            resources.materials.len()
        );

        Ok(resources)
    }

    pub fn mesh(&self, mesh: MeshId) -> Option<&MeshBuffers> {
        self.meshes.get(&mesh)
    }

    pub fn material(&self, material: MaterialId) -> Option<BufferHandle> {
        self.materials.get(&material).copied()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn release(self, backend: &mut dyn RenderBackend) {
        for buffers in self.meshes.into_values() {
            backend.release_buffer(buffers.geometry.vertex_buffer);
            backend.release_buffer(buffers.geometry.index_buffer);
        }
        for buffer in self.materials.into_values() {
            backend.release_buffer(buffer);
        }
        log::debug!("Released scene resources");
    }
}

fn check_vertex_layouts(
    scene: &dyn SceneGraph,
    backend: &dyn RenderBackend,
) -> Result<(), DrawListError> {
    let expected = backend.vertex_layout();
    for model in 0..scene.model_count() {
        for mesh in 0..scene.mesh_count(model) {
            let data = scene.mesh_data(scene.mesh(model, mesh));
            if data.layout != *expected {
                return Err(DrawListError::UnsupportedVertexLayout {
                    name: data.name.clone(),
                    array_stride: data.layout.array_stride,
                });
            }
        }
    }
    Ok(())
}

fn upload_mesh(backend: &mut dyn RenderBackend, mesh: &Mesh) -> anyhow::Result<MeshBuffers> {
    let vertex_buffer = backend.create_buffer(
        &format!("Vertex buffer ({})", mesh.name),
        BufferUsage::Vertex,
        &mesh.vertex_data,
    )?;
    let index_buffer = backend.create_buffer(
        &format!("Index buffer ({})", mesh.name),
        BufferUsage::Index,
        mesh.indices.as_bytes(),
    )?;

    Ok(MeshBuffers {
        geometry: GeometryBinding {
            vertex_buffer,
            index_buffer,
            index_format: mesh.indices.format(),
        },
        index_count: mesh.index_count(),
    })
}
