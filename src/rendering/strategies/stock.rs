use anyhow::Context;

use crate::{
    rendering::{
        backend::RenderBackend,
        draw_list::{enumerate_draw_items, DrawConstants, DrawItem, DrawListCache},
        render_mode::RenderMode,
        scene_resources::SceneResources,
        strategies::{DrawStrategy, FrameContext, FrameStats},
    },
    scene_graph::SceneGraph,
};

/// The scene's own per-item renderer. It knows the forward shader's per-draw
/// block is a whole `DrawConstants` record and writes it in one piece,
/// without consulting reflected offsets.
pub struct SceneRenderer {
    items: DrawListCache<Vec<DrawItem>>,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self {
            items: DrawListCache::new("scene renderer draw list"),
        }
    }

    pub fn prepare(&mut self, scene: &dyn SceneGraph) -> anyhow::Result<()> {
        self.items
            .build_if_absent(|| enumerate_draw_items(scene))
            .context("Scene renderer cannot draw this scene")?;
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.items.is_built()
    }

    pub fn render(
        &self,
        scene: &dyn SceneGraph,
        resources: &SceneResources,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<FrameStats> {
        let items = self
            .items
            .get()
            .context("Scene renderer used before prepare")?;

        for item in items {
            let material = resources
                .material(item.material)
                .with_context(|| format!("No material buffer for draw {}", item.draw_id))?;
            let mesh = resources
                .mesh(item.mesh)
                .with_context(|| format!("No mesh buffers for draw {}", item.draw_id))?;

            let constants =
                DrawConstants::new(&item.current_transforms(scene), item.draw_id, item.mesh_id);

            backend.bind_material(material);
            backend.write_per_draw(0, bytemuck::bytes_of(&constants));
            backend.bind_geometry(&mesh.geometry);
            backend.draw_indexed(mesh.index_count, 0, 0);
        }

        Ok(FrameStats {
            draw_items: items.len() as u32,
            submissions: items.len() as u32,
            per_draw_writes: items.len() as u32,
        })
    }

    pub fn release(&mut self) {
        self.items.release();
    }
}

/// Reference path: hands the whole frame to `SceneRenderer`.
#[derive(Default)]
pub struct StockStrategy {
    renderer: SceneRenderer,
}

impl StockStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DrawStrategy for StockStrategy {
    fn mode(&self) -> RenderMode {
        RenderMode::Stock
    }

    fn prepare(
        &mut self,
        scene: &dyn SceneGraph,
        _resources: &SceneResources,
        _backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<()> {
        self.renderer.prepare(scene)
    }

    fn is_prepared(&self) -> bool {
        self.renderer.is_prepared()
    }

    fn render_frame(
        &mut self,
        frame: &FrameContext,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<FrameStats> {
        self.renderer.render(frame.scene, frame.resources, backend)
    }

    fn release(&mut self, _backend: &mut dyn RenderBackend) {
        self.renderer.release();
    }
}
