use std::collections::BTreeMap;

use crate::{
    rendering::{
        backend::{BufferHandle, BufferUsage, DrawOrdinalSource, GeometryBinding, RenderBackend},
        binding_offsets::{PER_DRAW_BLOCK, PER_FRAME_BLOCK},
        permutation::ShaderPermutation,
        reflection::{ShaderReflection, StaticReflection},
    },
    scene_graph::{GpuLight, Vertex, VertexLayout},
};

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateBuffer {
        buffer: BufferHandle,
        label: String,
        usage: BufferUsage,
        size: usize,
    },
    ReleaseBuffer(BufferHandle),
    SelectPermutation(ShaderPermutation),
    WritePerFrame {
        offset: u64,
        data: Vec<u8>,
    },
    WritePerDraw {
        offset: u64,
        data: Vec<u8>,
    },
    BindMaterial(BufferHandle),
    BindDrawConstants(BufferHandle),
    BindGeometry(GeometryBinding),
    PushDrawOrdinal(u32),
    DrawIndexed {
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
    },
    MultiDrawIndexedIndirect {
        args: BufferHandle,
        offset: u64,
        draw_count: u32,
        stride: u64,
    },
}

impl BackendCall {
    pub fn is_submission(&self) -> bool {
        matches!(
            self,
            BackendCall::DrawIndexed { .. } | BackendCall::MultiDrawIndexedIndirect { .. }
        )
    }
}

#[derive(Debug, Clone)]
struct RecordedBuffer {
    label: String,
    usage: BufferUsage,
    contents: Vec<u8>,
}

/// Backend that performs no GPU work and records every call instead. Buffer
/// contents are kept so uploads can be inspected.
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    buffers: BTreeMap<BufferHandle, RecordedBuffer>,
    next_buffer: u32,
    ordinal_source: DrawOrdinalSource,
    permutation: Option<ShaderPermutation>,
    reflection: StaticReflection,
    reflection_override: Option<StaticReflection>,
    vertex_layout: VertexLayout,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            buffers: BTreeMap::new(),
            next_buffer: 0,
            ordinal_source: DrawOrdinalSource::BuiltinDrawIndex,
            permutation: None,
            reflection: StaticReflection::new(),
            reflection_override: None,
            vertex_layout: Vertex::layout(),
        }
    }

    pub fn with_ordinal_source(mut self, ordinal_source: DrawOrdinalSource) -> Self {
        self.ordinal_source = ordinal_source;
        self
    }

    /// Uses `reflection` for every permutation instead of the forward shader layout.
    pub fn with_reflection(mut self, reflection: StaticReflection) -> Self {
        self.reflection = reflection.clone();
        self.reflection_override = Some(reflection);
        self
    }

    pub fn with_vertex_layout(mut self, vertex_layout: VertexLayout) -> Self {
        self.vertex_layout = vertex_layout;
        self
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn count_calls(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn submissions(&self) -> usize {
        self.count_calls(BackendCall::is_submission)
    }

    pub fn buffers_created(&self) -> usize {
        self.count_calls(|call| matches!(call, BackendCall::CreateBuffer { .. }))
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|buffer| buffer.contents.as_slice())
    }

    pub fn buffer_label(&self, buffer: BufferHandle) -> Option<&str> {
        self.buffers.get(&buffer).map(|buffer| buffer.label.as_str())
    }

    pub fn buffer_usage(&self, buffer: BufferHandle) -> Option<BufferUsage> {
        self.buffers.get(&buffer).map(|buffer| buffer.usage)
    }

    pub fn permutation(&self) -> Option<&ShaderPermutation> {
        self.permutation.as_ref()
    }
}

impl RenderBackend for RecordingBackend {
    fn create_buffer(
        &mut self,
        label: &str,
        usage: BufferUsage,
        contents: &[u8],
    ) -> anyhow::Result<BufferHandle> {
        let buffer = BufferHandle(self.next_buffer);
        self.next_buffer += 1;

        self.buffers.insert(
            buffer,
            RecordedBuffer {
                label: label.to_string(),
                usage,
                contents: contents.to_vec(),
            },
        );
        self.calls.push(BackendCall::CreateBuffer {
            buffer,
            label: label.to_string(),
            usage,
            size: contents.len(),
        });

        Ok(buffer)
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
        self.calls.push(BackendCall::ReleaseBuffer(buffer));
    }

    fn select_permutation(&mut self, permutation: &ShaderPermutation) -> anyhow::Result<()> {
        self.reflection = match &self.reflection_override {
            Some(reflection) => reflection.clone(),
            None => forward_shader_reflection(permutation),
        };
        self.permutation = Some(permutation.clone());
        self.calls.push(BackendCall::SelectPermutation(permutation.clone()));
        Ok(())
    }

    fn reflection(&self) -> &dyn ShaderReflection {
        &self.reflection
    }

    fn draw_ordinal_source(&self) -> DrawOrdinalSource {
        self.ordinal_source
    }

    fn vertex_layout(&self) -> &VertexLayout {
        &self.vertex_layout
    }

    fn write_per_frame(&mut self, offset: u64, data: &[u8]) {
        self.calls.push(BackendCall::WritePerFrame {
            offset,
            data: data.to_vec(),
        });
    }

    fn write_per_draw(&mut self, offset: u64, data: &[u8]) {
        self.calls.push(BackendCall::WritePerDraw {
            offset,
            data: data.to_vec(),
        });
    }

    fn bind_material(&mut self, material: BufferHandle) {
        self.calls.push(BackendCall::BindMaterial(material));
    }

    fn bind_draw_constants(&mut self, constants: BufferHandle) {
        self.calls.push(BackendCall::BindDrawConstants(constants));
    }

    fn bind_geometry(&mut self, geometry: &GeometryBinding) {
        self.calls.push(BackendCall::BindGeometry(*geometry));
    }

    fn push_draw_ordinal(&mut self, ordinal: u32) {
        self.calls.push(BackendCall::PushDrawOrdinal(ordinal));
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        self.calls.push(BackendCall::DrawIndexed {
            index_count,
            first_index,
            base_vertex,
        });
    }

    fn multi_draw_indexed_indirect(
        &mut self,
        args: BufferHandle,
        offset: u64,
        draw_count: u32,
        stride: u64,
    ) {
        self.calls.push(BackendCall::MultiDrawIndexedIndirect {
            args,
            offset,
            draw_count,
            stride,
        });
    }
}

/// Number of lights in the per-frame block of `forward.wgsl`.
pub const FORWARD_SHADER_MAX_LIGHTS: u32 = 16;

/// Constant-block layout of `assets/shaders/forward.wgsl` for `permutation`,
/// as naga lays it out.
pub fn forward_shader_reflection(permutation: &ShaderPermutation) -> StaticReflection {
    let lights_offset = 224;
    let per_frame_size =
        lights_offset + FORWARD_SHADER_MAX_LIGHTS as u64 * GpuLight::SHADER_STRUCT_SIZE;

    let mut reflection = StaticReflection::new()
        .with_block(PER_FRAME_BLOCK, per_frame_size)
        .with_member(PER_FRAME_BLOCK, "camera", 0)
        .with_member(PER_FRAME_BLOCK, "camera.view", 0)
        .with_member(PER_FRAME_BLOCK, "camera.projection", 64)
        .with_member(PER_FRAME_BLOCK, "camera.view_projection", 128)
        .with_member(PER_FRAME_BLOCK, "camera.position", 192)
        .with_member(PER_FRAME_BLOCK, "light_count", 208)
        .with_array(PER_FRAME_BLOCK, "lights", lights_offset, FORWARD_SHADER_MAX_LIGHTS);

    if permutation.is_defined("PER_DRAW_UNIFORM") {
        reflection = reflection
            .with_block(PER_DRAW_BLOCK, 192)
            .with_member(PER_DRAW_BLOCK, "world", 0)
            .with_member(PER_DRAW_BLOCK, "prev_world", 64)
            .with_member(PER_DRAW_BLOCK, "world_inv_transpose", 128)
            .with_member(PER_DRAW_BLOCK, "draw_id", 176)
            .with_member(PER_DRAW_BLOCK, "mesh_id", 180);
    }

    reflection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::render_mode::RenderMode;

    #[test]
    fn records_buffers_and_releases() {
        let mut backend = RecordingBackend::new();

        let a = backend.create_buffer("a", BufferUsage::Uniform, &[1, 2, 3]).unwrap();
        let b = backend.create_buffer("b", BufferUsage::Vertex, &[4]).unwrap();
        assert_ne!(a, b);
        assert_eq!(backend.buffer_contents(a), Some(&[1u8, 2, 3][..]));
        assert_eq!(backend.buffer_label(b), Some("b"));

        backend.release_buffer(a);
        assert_eq!(backend.live_buffer_count(), 1);
        assert_eq!(backend.buffers_created(), 2);
    }

    #[test]
    fn reflection_follows_selected_permutation() {
        let mut backend = RecordingBackend::new();

        backend
            .select_permutation(&RenderMode::Explicit.permutation())
            .unwrap();
        assert_eq!(backend.reflection().member_offset(PER_DRAW_BLOCK, "world"), Some(0));

        backend
            .select_permutation(&RenderMode::BindlessMultiDraw.permutation())
            .unwrap();
        assert_eq!(backend.reflection().member_offset(PER_DRAW_BLOCK, "world"), None);
        assert_eq!(
            backend.reflection().member_offset(PER_FRAME_BLOCK, "light_count"),
            Some(208)
        );
    }
}
