use anyhow::Context;

use crate::{
    rendering::{
        backend::RenderBackend,
        binding_offsets::{BindingOffset, ShaderBindingOffsets},
        draw_list::{enumerate_draw_items, DrawItem, DrawListCache, DrawListError},
        render_mode::RenderMode,
        scene_resources::SceneResources,
        strategies::{draw_single_mesh, DrawStrategy, FrameContext, FrameStats, PerDrawWriter},
    },
    scene_graph::SceneGraph,
};

/// Recomputes an item's transforms from the scene and writes each member at
/// its reflected offset. Members the shader variant lacks are skipped.
pub struct ExplicitConstantsWriter<'a> {
    pub scene: &'a dyn SceneGraph,
    pub offsets: &'a ShaderBindingOffsets,
}

impl PerDrawWriter for ExplicitConstantsWriter<'_> {
    fn write(&self, item: &DrawItem, backend: &mut dyn RenderBackend) -> u32 {
        let transforms = item.current_transforms(self.scene);

        let members: [(BindingOffset, &[u8]); 5] = [
            (self.offsets.world, bytemuck::bytes_of(&transforms.world)),
            (self.offsets.prev_world, bytemuck::bytes_of(&transforms.prev_world)),
            (
                self.offsets.world_inverse_transpose,
                bytemuck::cast_slice(&transforms.world_inverse_transpose),
            ),
            (self.offsets.mesh_id, bytemuck::bytes_of(&item.mesh_id)),
            (self.offsets.draw_id, bytemuck::bytes_of(&item.draw_id)),
        ];

        let mut writes = 0;
        for (offset, data) in members {
            if let Some(offset) = offset.get() {
                backend.write_per_draw(offset, data);
                writes += 1;
            }
        }
        writes
    }
}

/// CPU-driven baseline: every frame, every item's constants are written
/// again before its own draw call.
pub struct ExplicitStrategy {
    items: DrawListCache<Vec<DrawItem>>,
}

impl Default for ExplicitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplicitStrategy {
    pub fn new() -> Self {
        Self {
            items: DrawListCache::new("explicit draw list"),
        }
    }
}

impl DrawStrategy for ExplicitStrategy {
    fn mode(&self) -> RenderMode {
        RenderMode::Explicit
    }

    fn prepare(
        &mut self,
        scene: &dyn SceneGraph,
        _resources: &SceneResources,
        _backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<()> {
        self.items
            .build_if_absent(|| {
                let items = enumerate_draw_items(scene)?;
                log::info!("Built explicit draw list with {} items", items.len());
                Ok::<_, DrawListError>(items)
            })
            .context("Explicit mode cannot draw this scene")?;
        Ok(())
    }

    fn is_prepared(&self) -> bool {
        self.items.is_built()
    }

    fn render_frame(
        &mut self,
        frame: &FrameContext,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<FrameStats> {
        let items = self.items.get().context("Explicit mode used before prepare")?;
        let writer = ExplicitConstantsWriter {
            scene: frame.scene,
            offsets: frame.offsets,
        };

        let mut stats = FrameStats {
            draw_items: items.len() as u32,
            ..Default::default()
        };
        let mut ordinal = 0;

        for item in items {
            let draw = draw_single_mesh(backend, frame.resources, item, ordinal, Some(&writer))?;
            ordinal = draw.next_ordinal;
            stats.per_draw_writes += draw.per_draw_writes;
            stats.submissions += 1;
        }

        Ok(stats)
    }

    fn release(&mut self, _backend: &mut dyn RenderBackend) {
        self.items.release();
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::{
        rendering::backend::{BackendCall, RecordingBackend},
        scene_graph::{
            demo_scene::{build_demo_scene, DemoSceneConfig},
            Transform,
        },
    };

    #[test]
    fn writes_current_transforms_at_reflected_offsets() {
        let mut scene = build_demo_scene(&DemoSceneConfig {
            grid_size: 1,
            ..Default::default()
        });
        let mut backend = RecordingBackend::new();
        backend
            .select_permutation(&RenderMode::Explicit.permutation())
            .unwrap();
        let offsets = ShaderBindingOffsets::resolve(backend.reflection());
        let resources = SceneResources::upload(&scene, &mut backend).unwrap();

        let mut strategy = ExplicitStrategy::new();
        strategy.prepare(&scene, &resources, &mut backend).unwrap();

        // Moving an instance after the list is built still reaches the GPU
        let moved = Transform::from_translation(glam::Vec3::new(0.0, 5.0, 0.0));
        scene.model_instance_mut(0, 0).unwrap().set_transform(moved);
        backend.clear_calls();

        let frame = FrameContext {
            scene: &scene,
            resources: &resources,
            offsets: &offsets,
        };
        let stats = strategy.render_frame(&frame, &mut backend).unwrap();

        assert_eq!(stats.submissions, 1);
        assert_eq!(stats.per_draw_writes, 5);

        let expected_world = moved.matrix() * Mat4::from_translation(glam::Vec3::Y * 0.5);
        assert!(backend.calls().contains(&BackendCall::WritePerDraw {
            offset: 0,
            data: bytemuck::bytes_of(&expected_world).to_vec(),
        }));
        assert!(backend.calls().contains(&BackendCall::WritePerDraw {
            offset: 176,
            data: 0u32.to_ne_bytes().to_vec(),
        }));
    }

    #[test]
    fn skips_members_missing_from_the_variant() {
        let scene = build_demo_scene(&DemoSceneConfig {
            grid_size: 1,
            ..Default::default()
        });
        let mut backend = RecordingBackend::new();
        // Bindless variants have no per-draw block at all
        backend
            .select_permutation(&RenderMode::BindlessConstants.permutation())
            .unwrap();
        let offsets = ShaderBindingOffsets::resolve(backend.reflection());
        let items = enumerate_draw_items(&scene).unwrap();

        let writer = ExplicitConstantsWriter {
            scene: &scene,
            offsets: &offsets,
        };
        backend.clear_calls();

        assert_eq!(writer.write(&items[0], &mut backend), 0);
        assert!(backend.calls().is_empty());
    }
}
