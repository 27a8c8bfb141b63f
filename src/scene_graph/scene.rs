use glam::Mat4;
use id_arena::Arena;

use crate::math::bounds::{BoundingSphere, AABB};
use crate::scene_graph::light::Light;
use crate::scene_graph::material::{Material, MaterialId};
use crate::scene_graph::mesh::{Mesh, MeshId};
use crate::scene_graph::transform::Transform;

/// Read-only view of a scene as models, model instances, meshes and mesh
/// instances. Indices are positional and stable for the lifetime of the scene.
pub trait SceneGraph {
    fn model_count(&self) -> usize;
    fn model_instance_count(&self, model: usize) -> usize;
    fn model_instance(&self, model: usize, instance: usize) -> &ModelInstance;
    fn mesh_count(&self, model: usize) -> usize;
    fn mesh(&self, model: usize, mesh: usize) -> MeshId;
    fn mesh_instance_count(&self, model: usize, mesh: usize) -> usize;
    fn mesh_instance(&self, model: usize, mesh: usize, instance: usize) -> &MeshInstance;
    fn mesh_data(&self, id: MeshId) -> &Mesh;
    fn material(&self, id: MaterialId) -> &Material;
    fn lights(&self) -> &[Light];
}

#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub name: String,
    transform: Transform,
    prev_matrix: Mat4,
}

impl ModelInstance {
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            transform,
            prev_matrix: transform.matrix(),
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    /// The instance matrix as it was at the start of the current frame.
    pub fn prev_matrix(&self) -> Mat4 {
        self.prev_matrix
    }

    fn begin_frame(&mut self) {
        self.prev_matrix = self.transform.matrix();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MeshInstance {
    pub local_transform: Mat4,
}

impl MeshInstance {
    pub fn new(local_transform: Mat4) -> Self {
        Self { local_transform }
    }
}

impl Default for MeshInstance {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

pub struct ModelMesh {
    pub mesh: MeshId,
    pub instances: Vec<MeshInstance>,
}

pub struct Model {
    pub name: String,
    pub meshes: Vec<ModelMesh>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meshes: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: MeshId, instances: Vec<MeshInstance>) -> Self {
        self.meshes.push(ModelMesh { mesh, instances });
        self
    }
}

pub struct SceneModel {
    pub model: Model,
    pub instances: Vec<ModelInstance>,
}

pub struct Scene {
    pub meshes: Arena<Mesh>,
    pub materials: Arena<Material>,
    pub models: Vec<SceneModel>,
    pub lights: Vec<Light>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            meshes: Arena::new(),
            materials: Arena::new(),
            models: Vec::new(),
            lights: Vec::new(),
        }
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.alloc(material)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.alloc(mesh)
    }

    /// Returns the model's position, used as its index in draw-item order.
    pub fn add_model(&mut self, model: Model) -> usize {
        self.models.push(SceneModel {
            model,
            instances: Vec::new(),
        });
        self.models.len() - 1
    }

    pub fn add_model_instance(&mut self, model: usize, instance: ModelInstance) -> Option<usize> {
        let scene_model = self.models.get_mut(model)?;
        scene_model.instances.push(instance);
        Some(scene_model.instances.len() - 1)
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn model_instance_mut(&mut self, model: usize, instance: usize) -> Option<&mut ModelInstance> {
        self.models.get_mut(model)?.instances.get_mut(instance)
    }

    /// Rolls every instance's current matrix into its previous-frame matrix.
    pub fn begin_frame(&mut self) {
        for scene_model in &mut self.models {
            for instance in &mut scene_model.instances {
                instance.begin_frame();
            }
        }
    }
}

impl SceneGraph for Scene {
    fn model_count(&self) -> usize {
        self.models.len()
    }

    fn model_instance_count(&self, model: usize) -> usize {
        self.models[model].instances.len()
    }

    fn model_instance(&self, model: usize, instance: usize) -> &ModelInstance {
        &self.models[model].instances[instance]
    }

    fn mesh_count(&self, model: usize) -> usize {
        self.models[model].model.meshes.len()
    }

    fn mesh(&self, model: usize, mesh: usize) -> MeshId {
        self.models[model].model.meshes[mesh].mesh
    }

    fn mesh_instance_count(&self, model: usize, mesh: usize) -> usize {
        self.models[model].model.meshes[mesh].instances.len()
    }

    fn mesh_instance(&self, model: usize, mesh: usize, instance: usize) -> &MeshInstance {
        &self.models[model].model.meshes[mesh].instances[instance]
    }

    fn mesh_data(&self, id: MeshId) -> &Mesh {
        &self.meshes[id]
    }

    fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id]
    }

    fn lights(&self) -> &[Light] {
        &self.lights
    }
}

/// Bounding sphere around every mesh instance placed in the scene.
pub fn scene_bounds(scene: &dyn SceneGraph) -> Option<BoundingSphere> {
    let mut bounds: Option<AABB> = None;

    for model in 0..scene.model_count() {
        for instance in 0..scene.model_instance_count(model) {
            let instance_matrix = scene.model_instance(model, instance).matrix();

            for mesh in 0..scene.mesh_count(model) {
                let mesh_bounds = scene.mesh_data(scene.mesh(model, mesh)).bounds;

                for mesh_instance in 0..scene.mesh_instance_count(model, mesh) {
                    let local = scene.mesh_instance(model, mesh, mesh_instance).local_transform;
                    let world = mesh_bounds.transform(&(instance_matrix * local));
                    bounds = Some(match bounds {
                        Some(bounds) => bounds.union(&world),
                        None => world,
                    });
                }
            }
        }
    }

    bounds.map(|bounds| bounds.bounding_sphere())
}
