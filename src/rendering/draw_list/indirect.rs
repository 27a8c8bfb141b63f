use bytemuck::{Pod, Zeroable};

use crate::rendering::{backend::DrawOrdinalSource, draw_list::merged_geometry::MergedGeometry};

/// One indexed indirect draw. Field order is what `draw_indexed_indirect`
/// and `multi_draw_indexed_indirect` read.
///
/// Same fields as `wgpu::util::DrawIndexedIndirectArgs`, which only exposes
/// one record's bytes at a time. Being `Pod`, a whole table of these is cast
/// to bytes once for upload and compared as plain data in tests.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq, Eq)]
pub struct IndirectDrawArgs {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

impl IndirectDrawArgs {
    pub const STRIDE: u64 = std::mem::size_of::<IndirectDrawArgs>() as u64;
}

/// One record per draw item, in draw id order. When the backend has no native
/// per-draw index the draw id is carried in `first_instance` instead.
pub fn build_indirect_args(
    geometry: &MergedGeometry,
    ordinal_source: DrawOrdinalSource,
) -> Vec<IndirectDrawArgs> {
    geometry
        .ranges
        .iter()
        .enumerate()
        .map(|(draw_id, range)| IndirectDrawArgs {
            index_count: range.index_count,
            instance_count: 1,
            first_index: range.first_index,
            base_vertex: range.vertex_offset as i32,
            first_instance: match ordinal_source {
                DrawOrdinalSource::BuiltinDrawIndex => 0,
                DrawOrdinalSource::FirstInstance => draw_id as u32,
            },
        })
        .collect()
}
