mod bindless_constants;
mod explicit;
mod multi_draw;
mod stock;

pub use bindless_constants::BindlessConstantsStrategy;
pub use explicit::{ExplicitConstantsWriter, ExplicitStrategy};
pub use multi_draw::{MultiDrawBatch, MultiDrawStrategy};
pub use stock::{SceneRenderer, StockStrategy};

use anyhow::Context;

use crate::{
    rendering::{
        backend::RenderBackend, binding_offsets::ShaderBindingOffsets, draw_list::DrawItem,
        render_mode::RenderMode, scene_resources::SceneResources,
    },
    scene_graph::SceneGraph,
};

/// Everything a strategy reads while recording one frame.
pub struct FrameContext<'a> {
    pub scene: &'a dyn SceneGraph,
    pub resources: &'a SceneResources,
    pub offsets: &'a ShaderBindingOffsets,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_items: u32,
    pub submissions: u32,
    /// Per-draw constant writes issued from the CPU.
    pub per_draw_writes: u32,
}

impl FrameStats {
    /// Adds the work of a repeated submission of the same items.
    pub fn add_repeat(&mut self, other: FrameStats) {
        self.draw_items = self.draw_items.max(other.draw_items);
        self.submissions += other.submissions;
        self.per_draw_writes += other.per_draw_writes;
    }
}

/// One way of getting the scene's draw items onto the screen.
///
/// `prepare` builds the strategy's one-time state if it is absent and is
/// cheap afterwards. `release` frees it; a later `prepare` builds it again.
pub trait DrawStrategy {
    fn mode(&self) -> RenderMode;

    fn prepare(
        &mut self,
        scene: &dyn SceneGraph,
        resources: &SceneResources,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<()>;

    fn is_prepared(&self) -> bool;

    fn render_frame(
        &mut self,
        frame: &FrameContext,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<FrameStats>;

    fn release(&mut self, backend: &mut dyn RenderBackend);
}

/// Writes an item's per-draw constants just before its draw. Returns how many
/// block writes it issued.
pub trait PerDrawWriter {
    fn write(&self, item: &DrawItem, backend: &mut dyn RenderBackend) -> u32;
}

/// Result of one `draw_single_mesh` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleDraw {
    pub next_ordinal: u32,
    pub per_draw_writes: u32,
}

/// Binds the item's material, runs the optional per-draw writer, binds the
/// item's own geometry, pushes `ordinal` and issues one indexed draw.
pub fn draw_single_mesh(
    backend: &mut dyn RenderBackend,
    resources: &SceneResources,
    item: &DrawItem,
    ordinal: u32,
    writer: Option<&dyn PerDrawWriter>,
) -> anyhow::Result<SingleDraw> {
    let material = resources
        .material(item.material)
        .with_context(|| format!("No material buffer for draw {}", item.draw_id))?;
    let mesh = resources
        .mesh(item.mesh)
        .with_context(|| format!("No mesh buffers for draw {}", item.draw_id))?;

    backend.bind_material(material);
    let per_draw_writes = writer.map_or(0, |writer| writer.write(item, backend));
    backend.bind_geometry(&mesh.geometry);
    backend.push_draw_ordinal(ordinal);
    backend.draw_indexed(mesh.index_count, 0, 0);

    Ok(SingleDraw {
        next_ordinal: ordinal + 1,
        per_draw_writes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rendering::{
            backend::{BackendCall, RecordingBackend},
            draw_list::enumerate_draw_items,
        },
        scene_graph::demo_scene::{build_demo_scene, DemoSceneConfig},
    };

    struct CountingWriter;

    impl PerDrawWriter for CountingWriter {
        fn write(&self, item: &DrawItem, backend: &mut dyn RenderBackend) -> u32 {
            backend.write_per_draw(0, &item.draw_id.to_ne_bytes());
            1
        }
    }

    #[test]
    fn single_mesh_draw_order() {
        let scene = build_demo_scene(&DemoSceneConfig {
            grid_size: 1,
            ..Default::default()
        });
        let mut backend = RecordingBackend::new();
        let resources = SceneResources::upload(&scene, &mut backend).unwrap();
        let items = enumerate_draw_items(&scene).unwrap();
        backend.clear_calls();

        let draw = draw_single_mesh(&mut backend, &resources, &items[0], 7, Some(&CountingWriter))
            .unwrap();

        assert_eq!(
            draw,
            SingleDraw {
                next_ordinal: 8,
                per_draw_writes: 1,
            }
        );

        let mesh = resources.mesh(items[0].mesh).unwrap();
        assert_eq!(
            backend.calls(),
            &[
                BackendCall::BindMaterial(resources.material(items[0].material).unwrap()),
                BackendCall::WritePerDraw {
                    offset: 0,
                    data: 0u32.to_ne_bytes().to_vec(),
                },
                BackendCall::BindGeometry(mesh.geometry),
                BackendCall::PushDrawOrdinal(7),
                BackendCall::DrawIndexed {
                    index_count: 36,
                    first_index: 0,
                    base_vertex: 0,
                },
            ]
        );
    }

    #[test]
    fn repeats_add_submissions_not_items() {
        let mut stats = FrameStats {
            draw_items: 12,
            submissions: 12,
            per_draw_writes: 0,
        };
        stats.add_repeat(stats);

        assert_eq!(stats.draw_items, 12);
        assert_eq!(stats.submissions, 24);
    }
}
