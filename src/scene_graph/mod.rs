pub mod demo_scene;
pub mod light;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod scene;
pub mod transform;

pub use light::{GpuLight, Light, LightKind};
pub use material::{Material, MaterialId};
pub use mesh::{IndexData, Mesh, MeshId, Vertex, VertexLayout};
pub use scene::{MeshInstance, Model, ModelInstance, Scene, SceneGraph};
pub use transform::Transform;
