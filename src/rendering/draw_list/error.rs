use thiserror::Error;

/// Scene data a draw list cannot be built from. None of these are retried:
/// the render mode that needs the draw list is refused instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DrawListError {
    #[error("mesh '{name}' (model {model}, mesh {mesh}) is skinned; draw lists only support rigid meshes")]
    SkinnedMesh {
        model: usize,
        mesh: usize,
        name: String,
    },

    #[error("mesh '{name}' (draw {draw_id}) has a vertex layout the pipeline cannot read")]
    VertexLayoutMismatch { draw_id: u32, name: String },

    #[error("mesh '{name}' has a {array_stride}-byte vertex layout the pipeline cannot read")]
    UnsupportedVertexLayout { name: String, array_stride: u64 },

    #[error("mesh '{name}' (draw {draw_id}) uses {format:?} indices; merged geometry requires 32-bit indices")]
    UnsupportedIndexFormat {
        draw_id: u32,
        name: String,
        format: wgpu::IndexFormat,
    },

    #[error("merged geometry does not fit 32-bit offsets ({vertices} vertices, {indices} indices)")]
    GeometryTooLarge { vertices: u64, indices: u64 },
}
