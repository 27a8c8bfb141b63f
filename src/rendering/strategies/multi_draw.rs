use anyhow::Context;

use crate::{
    rendering::{
        backend::{BufferHandle, BufferUsage, GeometryBinding, RenderBackend},
        draw_list::{
            build_indirect_args, enumerate_draw_items, DrawConstants, DrawItem, DrawListCache,
            IndirectDrawArgs, MergedGeometry,
        },
        render_mode::RenderMode,
        scene_resources::SceneResources,
        strategies::{
            bindless_constants::upload_draw_constants, DrawStrategy, FrameContext, FrameStats,
        },
    },
    scene_graph::{Material, SceneGraph},
};

/// Everything the single indirect multi-draw reads. The CPU copies of the
/// constants and argument records are kept for inspection.
pub struct MultiDrawBatch {
    pub items: Vec<DrawItem>,
    pub constants: Vec<DrawConstants>,
    pub args: Vec<IndirectDrawArgs>,
    pub vertex_count: u32,
    pub index_count: u32,

    pub constants_buffer: BufferHandle,
    pub geometry: GeometryBinding,
    pub args_buffer: BufferHandle,
    /// Bound for the whole batch; items' own materials are not used.
    pub placeholder_material: BufferHandle,
}

impl MultiDrawBatch {
    fn buffers(&self) -> [BufferHandle; 5] {
        [
            self.constants_buffer,
            self.geometry.vertex_buffer,
            self.geometry.index_buffer,
            self.args_buffer,
            self.placeholder_material,
        ]
    }

    fn build(scene: &dyn SceneGraph, backend: &mut dyn RenderBackend) -> anyhow::Result<Self> {
        // All validation happens before the first buffer is created
        let items = enumerate_draw_items(scene)?;
        let merged = MergedGeometry::build(scene, &items, backend.vertex_layout())?;
        let args = build_indirect_args(&merged, backend.draw_ordinal_source());

        let mut created = Vec::with_capacity(5);
        let result = Self::upload(backend, items, &merged, args, &mut created);

        if result.is_err() {
            for buffer in created {
                backend.release_buffer(buffer);
            }
        }

        result
    }

    fn upload(
        backend: &mut dyn RenderBackend,
        items: Vec<DrawItem>,
        merged: &MergedGeometry,
        args: Vec<IndirectDrawArgs>,
        created: &mut Vec<BufferHandle>,
    ) -> anyhow::Result<Self> {
        let (constants, constants_buffer) =
            upload_draw_constants(backend, "Draw constants buffer (multi-draw)", &items)?;
        created.push(constants_buffer);

        let vertex_buffer = backend
            .create_buffer("Vertex megabuffer", BufferUsage::Vertex, &merged.vertex_data)
            .context("Failed to create merged vertex buffer")?;
        created.push(vertex_buffer);

        let index_buffer = backend
            .create_buffer("Index megabuffer", BufferUsage::Index, merged.index_bytes())
            .context("Failed to create merged index buffer")?;
        created.push(index_buffer);

        let args_buffer = backend
            .create_buffer(
                "Draw commands buffer",
                BufferUsage::Indirect,
                bytemuck::cast_slice(&args),
            )
            .context("Failed to create indirect argument buffer")?;
        created.push(args_buffer);

        let placeholder_material = backend
            .create_buffer(
                "Placeholder material buffer",
                BufferUsage::Uniform,
                bytemuck::bytes_of(&Material::default().to_gpu()),
            )
            .context("Failed to create placeholder material")?;
        created.push(placeholder_material);

        Ok(Self {
            items,
            constants,
            args,
            vertex_count: merged.vertex_count(),
            index_count: merged.indices.len() as u32,
            constants_buffer,
            geometry: GeometryBinding {
                vertex_buffer,
                index_buffer,
                index_format: wgpu::IndexFormat::Uint32,
            },
            args_buffer,
            placeholder_material,
        })
    }
}

/// One indirect multi-draw over geometry merged into shared buffers. The
/// shader finds each sub-draw's constants by its draw ordinal.
pub struct MultiDrawStrategy {
    batch: DrawListCache<MultiDrawBatch>,
}

impl Default for MultiDrawStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiDrawStrategy {
    pub fn new() -> Self {
        Self {
            batch: DrawListCache::new("multi-draw batch"),
        }
    }

    pub fn batch(&self) -> Option<&MultiDrawBatch> {
        self.batch.get()
    }
}

impl DrawStrategy for MultiDrawStrategy {
    fn mode(&self) -> RenderMode {
        RenderMode::BindlessMultiDraw
    }

    fn prepare(
        &mut self,
        scene: &dyn SceneGraph,
        _resources: &SceneResources,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<()> {
        self.batch
            .build_if_absent(|| {
                let batch = MultiDrawBatch::build(scene, backend)?;

                log::info!(
                    "Built multi-draw batch: {} items, {} vertices, {} indices, {} argument bytes",
                    batch.items.len(),
                    batch.vertex_count,
                    batch.index_count,
                    batch.args.len() as u64 * IndirectDrawArgs::STRIDE
                );

                Ok::<_, anyhow::Error>(batch)
            })
            .context("Multi-draw mode cannot draw this scene")?;

        Ok(())
    }

    fn is_prepared(&self) -> bool {
        self.batch.is_built()
    }

    fn render_frame(
        &mut self,
        _frame: &FrameContext,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<FrameStats> {
        let batch = self
            .batch
            .get()
            .context("Multi-draw mode used before prepare")?;

        let draw_count = batch.args.len() as u32;
        if draw_count == 0 {
            return Ok(FrameStats::default());
        }

        backend.bind_draw_constants(batch.constants_buffer);
        backend.bind_material(batch.placeholder_material);
        backend.bind_geometry(&batch.geometry);
        backend.multi_draw_indexed_indirect(
            batch.args_buffer,
            0,
            draw_count,
            IndirectDrawArgs::STRIDE,
        );

        Ok(FrameStats {
            draw_items: draw_count,
            submissions: 1,
            per_draw_writes: 0,
        })
    }

    fn release(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(batch) = self.batch.release() {
            for buffer in batch.buffers() {
                backend.release_buffer(buffer);
            }
        }
    }
}
