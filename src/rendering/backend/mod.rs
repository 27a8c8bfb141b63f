mod recording;
mod wgpu_backend;

pub use recording::{
    forward_shader_reflection, BackendCall, RecordingBackend, FORWARD_SHADER_MAX_LIGHTS,
};
pub use wgpu_backend::{WgpuBackend, WgpuFrame};

use crate::{
    rendering::{permutation::ShaderPermutation, reflection::ShaderReflection},
    scene_graph::VertexLayout,
};

/// Opaque handle to a buffer owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
    /// A small parameter block, e.g. one material.
    Uniform,
    /// Read-only array indexed by draw ordinal.
    Storage,
    Indirect,
}

/// How a shader learns which sub-draw of an indirect multi-draw it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOrdinalSource {
    /// The API exposes a per-sub-draw index builtin; argument records keep
    /// `first_instance` at zero.
    BuiltinDrawIndex,
    /// The ordinal travels in each argument record's `first_instance` and the
    /// shader reads it back from the instance index.
    FirstInstance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryBinding {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_format: wgpu::IndexFormat,
}

/// The graphics services draw strategies submit through.
///
/// Calls between `select_permutation` and the next `select_permutation`
/// target the same shader variant. Per-draw block writes apply to the next
/// draw only.
pub trait RenderBackend {
    fn create_buffer(
        &mut self,
        label: &str,
        usage: BufferUsage,
        contents: &[u8],
    ) -> anyhow::Result<BufferHandle>;

    fn release_buffer(&mut self, buffer: BufferHandle);

    /// Switches shader variant and rebuilds every binding from scratch.
    fn select_permutation(&mut self, permutation: &ShaderPermutation) -> anyhow::Result<()>;

    /// Reflection of the currently selected variant.
    fn reflection(&self) -> &dyn ShaderReflection;

    fn draw_ordinal_source(&self) -> DrawOrdinalSource;

    /// The only vertex layout the backend's pipelines read.
    fn vertex_layout(&self) -> &VertexLayout;

    fn write_per_frame(&mut self, offset: u64, data: &[u8]);

    fn write_per_draw(&mut self, offset: u64, data: &[u8]);

    fn bind_material(&mut self, material: BufferHandle);

    fn bind_draw_constants(&mut self, constants: BufferHandle);

    fn bind_geometry(&mut self, geometry: &GeometryBinding);

    fn push_draw_ordinal(&mut self, ordinal: u32);

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32);

    fn multi_draw_indexed_indirect(
        &mut self,
        args: BufferHandle,
        offset: u64,
        draw_count: u32,
        stride: u64,
    );
}
