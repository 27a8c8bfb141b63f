use std::collections::HashMap;

use crate::rendering::{permutation::ShaderPermutation, reflection::ShaderReflection};

pub const PER_FRAME_BLOCK: &str = "per_frame";
pub const PER_DRAW_BLOCK: &str = "per_draw";

/// Byte offset of a constant-block member, or the unresolved sentinel when
/// the shader variant does not declare the member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingOffset(u64);

impl BindingOffset {
    pub const UNRESOLVED: BindingOffset = BindingOffset(u64::MAX);

    pub fn at(offset: u64) -> Self {
        debug_assert_ne!(offset, u64::MAX);
        Self(offset)
    }

    fn from_lookup(offset: Option<u64>) -> Self {
        offset.map_or(Self::UNRESOLVED, Self::at)
    }

    pub fn is_resolved(self) -> bool {
        self != Self::UNRESOLVED
    }

    pub fn get(self) -> Option<u64> {
        self.is_resolved().then_some(self.0)
    }
}

/// Offsets of every named member the strategies and the per-frame binder
/// write, resolved for one shader permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderBindingOffsets {
    pub per_draw_size: Option<u64>,
    pub world: BindingOffset,
    pub prev_world: BindingOffset,
    pub world_inverse_transpose: BindingOffset,
    pub mesh_id: BindingOffset,
    pub draw_id: BindingOffset,

    pub per_frame_size: Option<u64>,
    pub camera: BindingOffset,
    pub light_count: BindingOffset,
    pub lights: BindingOffset,
    /// Number of elements in the light array, 0 when it is absent.
    pub light_capacity: u32,
}

impl ShaderBindingOffsets {
    pub fn resolve(reflection: &dyn ShaderReflection) -> Self {
        let per_draw = |member: &str| {
            BindingOffset::from_lookup(reflection.member_offset(PER_DRAW_BLOCK, member))
        };
        let per_frame = |member: &str| {
            BindingOffset::from_lookup(reflection.member_offset(PER_FRAME_BLOCK, member))
        };

        let lights = per_frame("lights");

        Self {
            per_draw_size: reflection.block_size(PER_DRAW_BLOCK),
            world: per_draw("world"),
            prev_world: per_draw("prev_world"),
            world_inverse_transpose: per_draw("world_inv_transpose"),
            mesh_id: per_draw("mesh_id"),
            draw_id: per_draw("draw_id"),

            per_frame_size: reflection.block_size(PER_FRAME_BLOCK),
            camera: per_frame("camera"),
            light_count: per_frame("light_count"),
            lights,
            light_capacity: if lights.is_resolved() {
                reflection.array_length(PER_FRAME_BLOCK, "lights").unwrap_or(0)
            } else {
                0
            },
        }
    }

    fn unresolved_members(&self) -> Vec<&'static str> {
        [
            ("world", self.world),
            ("prev_world", self.prev_world),
            ("world_inv_transpose", self.world_inverse_transpose),
            ("mesh_id", self.mesh_id),
            ("draw_id", self.draw_id),
            ("camera", self.camera),
            ("light_count", self.light_count),
            ("lights", self.lights),
        ]
        .into_iter()
        .filter(|(_, offset)| !offset.is_resolved())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Offsets resolved once per shader permutation and kept for the lifetime of
/// the cache. Entries are never invalidated, so a permutation whose layout
/// changes after resolution keeps its first offsets.
#[derive(Debug, Default)]
pub struct ShaderBindingOffsetCache {
    entries: HashMap<ShaderPermutation, ShaderBindingOffsets>,
    resolve_count: u32,
}

impl ShaderBindingOffsetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, permutation: &ShaderPermutation) -> Option<&ShaderBindingOffsets> {
        self.entries.get(permutation)
    }

    pub fn get_or_resolve(
        &mut self,
        permutation: &ShaderPermutation,
        reflection: &dyn ShaderReflection,
    ) -> &ShaderBindingOffsets {
        let resolve_count = &mut self.resolve_count;

        self.entries.entry(permutation.clone()).or_insert_with(|| {
            let offsets = ShaderBindingOffsets::resolve(reflection);
            *resolve_count += 1;

            log::debug!(
                "Resolved binding offsets for {}; absent members: {:?}",
                permutation,
                offsets.unresolved_members()
            );

            offsets
        })
    }

    /// Number of reflection passes performed so far.
    pub fn resolve_count(&self) -> u32 {
        self.resolve_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::reflection::StaticReflection;

    fn per_draw_only() -> StaticReflection {
        StaticReflection::new()
            .with_block(PER_DRAW_BLOCK, 192)
            .with_member(PER_DRAW_BLOCK, "world", 0)
            .with_member(PER_DRAW_BLOCK, "draw_id", 176)
            .with_block(PER_FRAME_BLOCK, 208)
            .with_member(PER_FRAME_BLOCK, "camera", 0)
    }

    #[test]
    fn absent_members_are_unresolved() {
        let offsets = ShaderBindingOffsets::resolve(&per_draw_only());

        assert_eq!(offsets.world.get(), Some(0));
        assert_eq!(offsets.draw_id.get(), Some(176));
        assert_eq!(offsets.mesh_id, BindingOffset::UNRESOLVED);
        assert!(!offsets.light_count.is_resolved());
        assert!(!offsets.lights.is_resolved());
        assert_eq!(offsets.light_capacity, 0);
        assert_eq!(offsets.per_draw_size, Some(192));
    }

    #[test]
    fn zero_offset_is_resolved() {
        assert!(BindingOffset::at(0).is_resolved());
        assert_eq!(BindingOffset::UNRESOLVED.get(), None);
    }

    #[test]
    fn resolves_once_per_permutation() {
        let mut cache = ShaderBindingOffsetCache::new();
        let a = ShaderPermutation::new(["A"]);
        let b = ShaderPermutation::new(["B"]);

        let first = *cache.get_or_resolve(&a, &per_draw_only());
        // A different layout for the same permutation is ignored
        let second = *cache.get_or_resolve(&a, &StaticReflection::new());
        assert_eq!(first, second);
        assert_eq!(cache.resolve_count(), 1);

        let other = *cache.get_or_resolve(&b, &StaticReflection::new());
        assert!(!other.world.is_resolved());
        assert_eq!(cache.resolve_count(), 2);
        assert!(cache.get(&a).is_some());
    }
}
