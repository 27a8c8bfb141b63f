use anyhow::Context;

use crate::{
    rendering::{
        backend::{BufferHandle, BufferUsage, RenderBackend},
        draw_list::{build_draw_constants, enumerate_draw_items, DrawConstants, DrawItem, DrawListCache},
        render_mode::RenderMode,
        scene_resources::SceneResources,
        strategies::{draw_single_mesh, DrawStrategy, FrameContext, FrameStats},
    },
    scene_graph::SceneGraph,
};

/// Draw items with their constants precomputed into one GPU array.
pub struct ConstantsBatch {
    pub items: Vec<DrawItem>,
    pub constants: Vec<DrawConstants>,
    pub constants_buffer: BufferHandle,
}

pub(super) fn upload_draw_constants(
    backend: &mut dyn RenderBackend,
    label: &str,
    items: &[DrawItem],
) -> anyhow::Result<(Vec<DrawConstants>, BufferHandle)> {
    let constants = build_draw_constants(items);
    let buffer = backend
        .create_buffer(label, BufferUsage::Storage, bytemuck::cast_slice(&constants))
        .with_context(|| format!("Failed to create {label}"))?;

    Ok((constants, buffer))
}

/// Transforms are computed once and indexed on the GPU by draw ordinal; only
/// the ordinal changes between the per-item draw calls.
pub struct BindlessConstantsStrategy {
    batch: DrawListCache<ConstantsBatch>,
}

impl Default for BindlessConstantsStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl BindlessConstantsStrategy {
    pub fn new() -> Self {
        Self {
            batch: DrawListCache::new("bindless constants batch"),
        }
    }

    pub fn batch(&self) -> Option<&ConstantsBatch> {
        self.batch.get()
    }
}

impl DrawStrategy for BindlessConstantsStrategy {
    fn mode(&self) -> RenderMode {
        RenderMode::BindlessConstants
    }

    fn prepare(
        &mut self,
        scene: &dyn SceneGraph,
        _resources: &SceneResources,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<()> {
        self.batch
            .build_if_absent(|| {
                let items = enumerate_draw_items(scene)?;
                let (constants, constants_buffer) =
                    upload_draw_constants(backend, "Draw constants buffer (bindless)", &items)?;

                log::info!(
                    "Built bindless constants for {} items ({} bytes)",
                    items.len(),
                    constants.len() as u64 * DrawConstants::SIZE
                );

                Ok::<_, anyhow::Error>(ConstantsBatch {
                    items,
                    constants,
                    constants_buffer,
                })
            })
            .context("Bindless constants mode cannot draw this scene")?;

        Ok(())
    }

    fn is_prepared(&self) -> bool {
        self.batch.is_built()
    }

    fn render_frame(
        &mut self,
        frame: &FrameContext,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<FrameStats> {
        let batch = self
            .batch
            .get()
            .context("Bindless constants mode used before prepare")?;

        backend.bind_draw_constants(batch.constants_buffer);

        let mut ordinal = 0;
        for item in &batch.items {
            ordinal = draw_single_mesh(backend, frame.resources, item, ordinal, None)?.next_ordinal;
        }

        Ok(FrameStats {
            draw_items: batch.items.len() as u32,
            submissions: batch.items.len() as u32,
            per_draw_writes: 0,
        })
    }

    fn release(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(batch) = self.batch.release() {
            backend.release_buffer(batch.constants_buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rendering::{
            backend::{BackendCall, RecordingBackend},
            binding_offsets::ShaderBindingOffsets,
        },
        scene_graph::demo_scene::{build_demo_scene, DemoSceneConfig},
    };

    #[test]
    fn binds_constants_once_and_pushes_ordinals_in_order() {
        let scene = build_demo_scene(&DemoSceneConfig {
            grid_size: 2,
            ..Default::default()
        });
        let mut backend = RecordingBackend::new();
        let resources = SceneResources::upload(&scene, &mut backend).unwrap();
        let offsets = ShaderBindingOffsets::resolve(backend.reflection());

        let mut strategy = BindlessConstantsStrategy::new();
        strategy.prepare(&scene, &resources, &mut backend).unwrap();
        let batch = strategy.batch().unwrap();
        let item_count = batch.items.len();
        let constants_buffer = batch.constants_buffer;

        assert_eq!(
            backend.buffer_contents(constants_buffer).unwrap().len() as u64,
            item_count as u64 * DrawConstants::SIZE
        );
        backend.clear_calls();

        let frame = FrameContext {
            scene: &scene,
            resources: &resources,
            offsets: &offsets,
        };
        let stats = strategy.render_frame(&frame, &mut backend).unwrap();

        assert_eq!(stats.submissions as usize, item_count);
        assert_eq!(stats.per_draw_writes, 0);
        assert_eq!(
            backend.calls().first(),
            Some(&BackendCall::BindDrawConstants(constants_buffer))
        );

        let ordinals: Vec<u32> = backend
            .calls()
            .iter()
            .filter_map(|call| match call {
                BackendCall::PushDrawOrdinal(ordinal) => Some(*ordinal),
                _ => None,
            })
            .collect();
        assert_eq!(ordinals, (0..item_count as u32).collect::<Vec<_>>());
    }

    #[test]
    fn prepare_twice_uploads_once() {
        let scene = build_demo_scene(&DemoSceneConfig::default());
        let mut backend = RecordingBackend::new();
        let resources = SceneResources::upload(&scene, &mut backend).unwrap();
        let mut strategy = BindlessConstantsStrategy::new();

        strategy.prepare(&scene, &resources, &mut backend).unwrap();
        let created = backend.buffers_created();
        strategy.prepare(&scene, &resources, &mut backend).unwrap();

        assert_eq!(backend.buffers_created(), created);
    }
}
