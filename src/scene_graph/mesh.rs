use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use id_arena::Id;

use crate::{math::bounds::AABB, scene_graph::material::MaterialId};

pub type MeshId = Id<Mesh>;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }

    pub fn layout() -> VertexLayout {
        VertexLayout::from(&RENDER_MODEL_VBL)
    }
}

pub const RENDER_MODEL_VBL: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, normal) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, tex_coords) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        },
    ],
};

/// Owned description of one interleaved vertex stream. Two meshes can share a
/// vertex buffer only if their layouts compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    pub array_stride: wgpu::BufferAddress,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl From<&wgpu::VertexBufferLayout<'_>> for VertexLayout {
    fn from(layout: &wgpu::VertexBufferLayout<'_>) -> Self {
        Self {
            array_stride: layout.array_stride,
            attributes: layout.attributes.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexData {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexData {
    pub fn format(&self) -> wgpu::IndexFormat {
        match self {
            IndexData::U16(_) => wgpu::IndexFormat::Uint16,
            IndexData::U32(_) => wgpu::IndexFormat::Uint32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexData::U16(indices) => indices.len(),
            IndexData::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U16(indices) => bytemuck::cast_slice(indices),
            IndexData::U32(indices) => bytemuck::cast_slice(indices),
        }
    }
}

pub struct Mesh {
    pub name: String,
    pub layout: VertexLayout,
    /// Interleaved vertices, `layout.array_stride` bytes each.
    pub vertex_data: Vec<u8>,
    pub indices: IndexData,
    pub material: MaterialId,
    /// Meshes driven by a skeleton. Draw lists only accept rigid meshes.
    pub skinned: bool,
    pub bounds: AABB,
}

impl Mesh {
    pub fn from_vertices(
        name: impl Into<String>,
        vertices: &[Vertex],
        indices: Vec<u32>,
        material: MaterialId,
    ) -> Self {
        let bounds = AABB::from_points(vertices.iter().map(|vertex| vertex.position))
            .unwrap_or(AABB::new(Vec3::ZERO, Vec3::ZERO));

        Self {
            name: name.into(),
            layout: Vertex::layout(),
            vertex_data: bytemuck::cast_slice(vertices).to_vec(),
            indices: IndexData::U32(indices),
            material,
            skinned: false,
            bounds,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        if self.layout.array_stride == 0 {
            return 0;
        }

        (self.vertex_data.len() as u64 / self.layout.array_stride) as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}
