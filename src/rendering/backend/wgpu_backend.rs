use std::collections::HashMap;

use anyhow::Context;
use pollster::block_on;
use wgpu::{
    util::DeviceExt, DepthBiasState, MultisampleState, PipelineCompilationOptions, PollType,
    ShaderSource, StencilState,
};

use crate::{
    rendering::{
        backend::{BufferHandle, BufferUsage, DrawOrdinalSource, GeometryBinding, RenderBackend},
        binding_offsets::PER_FRAME_BLOCK,
        config::{GRID_SIZE_VAR, SUBMISSION_REPEAT_VAR},
        draw_list::{DrawConstants, IndirectDrawArgs},
        permutation::ShaderPermutation,
        reflection::{NagaReflection, ShaderReflection, StaticReflection},
        shader_loader::{ComposedShader, ShaderComposer},
    },
    scene_graph::{mesh::RENDER_MODEL_VBL, Material, VertexLayout},
    texture::DepthTexture,
};

const PUSH_CONSTANT_SIZE: u32 = std::mem::size_of::<u32>() as u32;

/// Smallest buffer the backend creates; bindings of empty buffers are invalid.
const MIN_BUFFER_SIZE: usize = 16;

/// Where one frame's commands are drawn to.
pub struct WgpuFrame<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
    pub clear_color: wgpu::Color,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    usage: BufferUsage,
}

struct ShaderVariant {
    pipeline: wgpu::RenderPipeline,
    reflection: NagaReflection,
}

#[derive(Debug, Clone, Copy)]
enum RecordedCommand {
    BindMaterial(BufferHandle),
    BindDrawConstants(BufferHandle),
    BindGeometry(GeometryBinding),
    PushDrawOrdinal(u32),
    DrawIndexed {
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
        per_draw_offset: u32,
    },
    MultiDrawIndexedIndirect {
        args: BufferHandle,
        offset: u64,
        draw_count: u32,
        per_draw_offset: u32,
    },
}

/// Per-draw block contents for one frame. Every draw that follows a write
/// gets its own aligned slot, so later writes never clobber the data an
/// earlier draw reads. A new slot starts as a copy of the previous one.
struct PerDrawRing {
    slot_size: usize,
    staging: Vec<u8>,
    current: usize,
    dirty: bool,
    buffer: wgpu::Buffer,
}

impl PerDrawRing {
    fn new(device: &wgpu::Device, alignment: u32) -> Self {
        let slot_size = (DrawConstants::SIZE as usize).next_multiple_of(alignment as usize);

        Self {
            slot_size,
            staging: vec![0; slot_size],
            current: 0,
            dirty: false,
            buffer: create_ring_buffer(device, slot_size as u64 * 64),
        }
    }

    fn write(&mut self, offset: u64, data: &[u8]) {
        let end = offset as usize + data.len();
        if end > DrawConstants::SIZE as usize {
            log::warn!("Per-draw write of {} bytes at {offset} is out of bounds", data.len());
            return;
        }

        let base = self.current * self.slot_size;
        self.staging[base + offset as usize..base + end].copy_from_slice(data);
        self.dirty = true;
    }

    /// Dynamic offset for the next draw.
    fn take_draw_offset(&mut self) -> u32 {
        let base = self.current * self.slot_size;

        if self.dirty {
            let next = base + self.slot_size;
            self.staging.resize(next + self.slot_size, 0);
            self.staging.copy_within(base..next, next);
            self.current += 1;
            self.dirty = false;
        }

        base as u32
    }

    /// Uploads the frame's slots, growing the GPU buffer if needed. Returns
    /// true if the buffer was replaced.
    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<bool> {
        let needed = self.staging.len() as u64;
        let mut replaced = false;

        if needed > self.buffer.size() {
            let size = ring_buffer_size(needed, device.limits().max_buffer_size)?;
            self.buffer = create_ring_buffer(device, size);
            replaced = true;
            log::debug!("Grew per-draw ring to {} bytes", self.buffer.size());
        }

        queue.write_buffer(&self.buffer, 0, &self.staging);
        Ok(replaced)
    }

    /// Keeps the last slot's contents as the starting point of the next frame.
    fn reset(&mut self) {
        let base = self.current * self.slot_size;
        self.staging.copy_within(base..base + self.slot_size, 0);
        self.staging.truncate(self.slot_size);
        self.current = 0;
        self.dirty = false;
    }
}

/// Next power of two that holds `needed` bytes, clamped to the device limit.
fn ring_buffer_size(needed: u64, max_buffer_size: u64) -> anyhow::Result<u64> {
    if needed > max_buffer_size {
        anyhow::bail!(
            "Per-draw writes need {needed} bytes this frame, device limit is {max_buffer_size}; \
             lower {SUBMISSION_REPEAT_VAR} or {GRID_SIZE_VAR}"
        );
    }
    Ok(needed.next_power_of_two().min(max_buffer_size))
}

fn create_ring_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Per-draw uniform ring"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

struct BindGroupLayouts {
    frame: wgpu::BindGroupLayout,
    material: wgpu::BindGroupLayout,
    draw_constants: wgpu::BindGroupLayout,
}

impl BindGroupLayouts {
    fn new(device: &wgpu::Device) -> Self {
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(DrawConstants::SIZE),
                    },
                    count: None,
                },
            ],
        });

        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let draw_constants = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw constants bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        Self {
            frame,
            material,
            draw_constants,
        }
    }
}

/// `RenderBackend` on wgpu. Calls made during a frame are recorded, then
/// replayed into a single render pass by `encode_frame`.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    vertex_layout: VertexLayout,

    composer: ShaderComposer,
    layouts: BindGroupLayouts,
    pipeline_layout: wgpu::PipelineLayout,
    variants: HashMap<ShaderPermutation, ShaderVariant>,
    active: Option<ShaderPermutation>,
    no_reflection: StaticReflection,

    buffers: HashMap<BufferHandle, GpuBuffer>,
    next_buffer: u32,
    material_groups: HashMap<BufferHandle, wgpu::BindGroup>,
    draw_constants_groups: HashMap<BufferHandle, wgpu::BindGroup>,

    per_frame_staging: Vec<u8>,
    per_frame_buffer: wgpu::Buffer,
    per_draw: PerDrawRing,
    frame_group: wgpu::BindGroup,

    // Groups 1 and 2 must always be set, even by variants that never read them
    fallback_material: wgpu::BindGroup,
    fallback_draw_constants: wgpu::BindGroup,

    commands: Vec<RecordedCommand>,
}

impl WgpuBackend {
    pub const REQUIRED_FEATURES: wgpu::Features =
        wgpu::Features::PUSH_CONSTANTS.union(wgpu::Features::INDIRECT_FIRST_INSTANCE);

    pub fn required_limits() -> wgpu::Limits {
        wgpu::Limits {
            max_push_constant_size: PUSH_CONSTANT_SIZE,
            ..wgpu::Limits::default()
        }
    }

    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let layouts = BindGroupLayouts::new(&device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forward pipeline layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.material, &layouts.draw_constants],
            push_constant_ranges: &[wgpu::PushConstantRange {
                stages: wgpu::ShaderStages::VERTEX,
                range: 0..PUSH_CONSTANT_SIZE,
            }],
        });

        let per_frame_staging = vec![0; MIN_BUFFER_SIZE];
        let per_frame_buffer = create_per_frame_buffer(&device, per_frame_staging.len() as u64);
        let per_draw =
            PerDrawRing::new(&device, device.limits().min_uniform_buffer_offset_alignment);
        let frame_group = create_frame_group(&device, &layouts.frame, &per_frame_buffer, &per_draw);

        let fallback_material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fallback material buffer"),
            contents: bytemuck::bytes_of(&Material::default().to_gpu()),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let fallback_material = create_single_buffer_group(
            &device,
            &layouts.material,
            &fallback_material_buffer,
            "Fallback material bind group",
        );

        let fallback_constants_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Fallback draw constants buffer"),
                contents: &[0; DrawConstants::SIZE as usize],
                usage: wgpu::BufferUsages::STORAGE,
            });
        let fallback_draw_constants = create_single_buffer_group(
            &device,
            &layouts.draw_constants,
            &fallback_constants_buffer,
            "Fallback draw constants bind group",
        );

        Self {
            device,
            queue,
            color_format,
            vertex_layout: VertexLayout::from(&RENDER_MODEL_VBL),
            composer: ShaderComposer::new(),
            layouts,
            pipeline_layout,
            variants: HashMap::new(),
            active: None,
            no_reflection: StaticReflection::new(),
            buffers: HashMap::new(),
            next_buffer: 0,
            material_groups: HashMap::new(),
            draw_constants_groups: HashMap::new(),
            per_frame_staging,
            per_frame_buffer,
            per_draw,
            frame_group,
            fallback_material,
            fallback_draw_constants,
            commands: Vec::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    fn active_variant(&self) -> Option<&ShaderVariant> {
        self.active
            .as_ref()
            .and_then(|permutation| self.variants.get(permutation))
    }

    fn create_pipeline(&self, shader: &ComposedShader) -> anyhow::Result<wgpu::RenderPipeline> {
        let label = format!("Forward pipeline {}", shader.permutation);

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label.as_str()),
                source: ShaderSource::Wgsl(shader.wgsl.as_str().into()),
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label.as_str()),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    buffers: &[RENDER_MODEL_VBL],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.color_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DepthTexture::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: StencilState::default(),
                    bias: DepthBiasState::default(),
                }),
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        self.device
            .poll(PollType::Wait)
            .context("Failed to poll device after shader compilation")?;

        if let Some(error) = block_on(self.device.pop_error_scope()) {
            anyhow::bail!("Pipeline creation failed for {}: {}", shader.permutation, error);
        }

        Ok(pipeline)
    }

    fn rebuild_frame_bindings(&mut self, per_frame_size: u64) {
        let size = (per_frame_size as usize).max(MIN_BUFFER_SIZE);
        self.per_frame_staging = vec![0; size];
        self.per_frame_buffer = create_per_frame_buffer(&self.device, size as u64);
        self.frame_group = create_frame_group(
            &self.device,
            &self.layouts.frame,
            &self.per_frame_buffer,
            &self.per_draw,
        );
    }

    /// Replays the recorded frame into one render pass on `encoder` and
    /// clears the recording.
    /// Replays the recorded commands into one render pass. The commands are
    /// dropped even if the frame cannot be encoded.
    pub fn encode_frame(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        frame: &WgpuFrame,
    ) -> anyhow::Result<()> {
        self.queue
            .write_buffer(&self.per_frame_buffer, 0, &self.per_frame_staging);
        let replaced = match self.per_draw.upload(&self.device, &self.queue) {
            Ok(replaced) => replaced,
            Err(error) => {
                self.commands.clear();
                self.per_draw.reset();
                return Err(error);
            }
        };
        if replaced {
            self.frame_group = create_frame_group(
                &self.device,
                &self.layouts.frame,
                &self.per_frame_buffer,
                &self.per_draw,
            );
        }

        let commands = std::mem::take(&mut self.commands);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Forward pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: frame.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(variant) = self.active_variant() {
                render_pass.set_pipeline(&variant.pipeline);
                render_pass.set_bind_group(0, &self.frame_group, &[0]);
                render_pass.set_bind_group(1, &self.fallback_material, &[]);
                render_pass.set_bind_group(2, &self.fallback_draw_constants, &[]);

                self.replay(&mut render_pass, &commands);
            }
        }

        self.commands = commands;
        self.commands.clear();
        self.per_draw.reset();
        Ok(())
    }

    fn replay(&self, render_pass: &mut wgpu::RenderPass<'_>, commands: &[RecordedCommand]) {
        let mut bound_offset = 0;

        for command in commands {
            match *command {
                RecordedCommand::BindMaterial(material) => {
                    if let Some(group) = self.material_groups.get(&material) {
                        render_pass.set_bind_group(1, group, &[]);
                    }
                }
                RecordedCommand::BindDrawConstants(constants) => {
                    if let Some(group) = self.draw_constants_groups.get(&constants) {
                        render_pass.set_bind_group(2, group, &[]);
                    }
                }
                RecordedCommand::BindGeometry(geometry) => {
                    let (Some(vertices), Some(indices)) = (
                        self.buffers.get(&geometry.vertex_buffer),
                        self.buffers.get(&geometry.index_buffer),
                    ) else {
                        log::warn!("Skipping bind of released geometry {geometry:?}");
                        continue;
                    };
                    render_pass.set_vertex_buffer(0, vertices.buffer.slice(..));
                    render_pass.set_index_buffer(indices.buffer.slice(..), geometry.index_format);
                }
                RecordedCommand::PushDrawOrdinal(ordinal) => {
                    render_pass.set_push_constants(
                        wgpu::ShaderStages::VERTEX,
                        0,
                        bytemuck::bytes_of(&ordinal),
                    );
                }
                RecordedCommand::DrawIndexed {
                    index_count,
                    first_index,
                    base_vertex,
                    per_draw_offset,
                } => {
                    if per_draw_offset != bound_offset {
                        render_pass.set_bind_group(0, &self.frame_group, &[per_draw_offset]);
                        bound_offset = per_draw_offset;
                    }
                    render_pass.draw_indexed(
                        first_index..first_index + index_count,
                        base_vertex,
                        0..1,
                    );
                }
                RecordedCommand::MultiDrawIndexedIndirect {
                    args,
                    offset,
                    draw_count,
                    per_draw_offset,
                } => {
                    let Some(args) = self.buffers.get(&args) else {
                        log::warn!("Skipping multi-draw from released argument buffer");
                        continue;
                    };
                    if per_draw_offset != bound_offset {
                        render_pass.set_bind_group(0, &self.frame_group, &[per_draw_offset]);
                        bound_offset = per_draw_offset;
                    }
                    render_pass.multi_draw_indexed_indirect(&args.buffer, offset, draw_count);
                }
            }
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn create_buffer(
        &mut self,
        label: &str,
        usage: BufferUsage,
        contents: &[u8],
    ) -> anyhow::Result<BufferHandle> {
        let limits = self.device.limits();
        let size = contents.len() as u64;

        if size > limits.max_buffer_size {
            anyhow::bail!("{label} is {size} bytes, device limit is {}", limits.max_buffer_size);
        }
        if usage == BufferUsage::Storage && size > limits.max_storage_buffer_binding_size as u64 {
            anyhow::bail!(
                "{label} is {size} bytes, storage binding limit is {}",
                limits.max_storage_buffer_binding_size
            );
        }

        let padded;
        let contents = if contents.len() < MIN_BUFFER_SIZE || contents.len() % 4 != 0 {
            let mut bytes = contents.to_vec();
            bytes.resize(contents.len().max(MIN_BUFFER_SIZE).next_multiple_of(4), 0);
            padded = bytes;
            padded.as_slice()
        } else {
            contents
        };

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu_usage(usage),
            });

        let handle = BufferHandle(self.next_buffer);
        self.next_buffer += 1;
        self.buffers.insert(handle, GpuBuffer { buffer, usage });

        Ok(handle)
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        self.material_groups.remove(&buffer);
        self.draw_constants_groups.remove(&buffer);
        if let Some(released) = self.buffers.remove(&buffer) {
            released.buffer.destroy();
        }
    }

    fn select_permutation(&mut self, permutation: &ShaderPermutation) -> anyhow::Result<()> {
        if !self.variants.contains_key(permutation) {
            let shader = self.composer.compose(permutation)?;
            let pipeline = self.create_pipeline(&shader)?;
            self.variants.insert(
                permutation.clone(),
                ShaderVariant {
                    pipeline,
                    reflection: shader.reflection,
                },
            );
        }

        let per_frame_size = self
            .variants
            .get(permutation)
            .and_then(|variant| variant.reflection.block_size(PER_FRAME_BLOCK))
            .unwrap_or(0);

        self.rebuild_frame_bindings(per_frame_size);
        self.commands.clear();
        self.per_draw.reset();
        self.active = Some(permutation.clone());

        Ok(())
    }

    fn reflection(&self) -> &dyn ShaderReflection {
        match self.active_variant() {
            Some(variant) => &variant.reflection,
            None => &self.no_reflection,
        }
    }

    fn draw_ordinal_source(&self) -> DrawOrdinalSource {
        // WGSL has no draw index builtin
        DrawOrdinalSource::FirstInstance
    }

    fn vertex_layout(&self) -> &VertexLayout {
        &self.vertex_layout
    }

    fn write_per_frame(&mut self, offset: u64, data: &[u8]) {
        let start = offset as usize;
        let end = start + data.len();

        match self.per_frame_staging.get_mut(start..end) {
            Some(target) => target.copy_from_slice(data),
            None => log::warn!(
                "Per-frame write of {} bytes at {offset} is out of bounds",
                data.len()
            ),
        }
    }

    fn write_per_draw(&mut self, offset: u64, data: &[u8]) {
        self.per_draw.write(offset, data);
    }

    fn bind_material(&mut self, material: BufferHandle) {
        if !self.material_groups.contains_key(&material) {
            let Some(buffer) = self.buffers.get(&material) else {
                log::warn!("Bind of unknown material buffer {material:?}");
                return;
            };
            let group = create_single_buffer_group(
                &self.device,
                &self.layouts.material,
                &buffer.buffer,
                "Material bind group",
            );
            self.material_groups.insert(material, group);
        }

        self.commands.push(RecordedCommand::BindMaterial(material));
    }

    fn bind_draw_constants(&mut self, constants: BufferHandle) {
        if !self.draw_constants_groups.contains_key(&constants) {
            let Some(buffer) = self.buffers.get(&constants) else {
                log::warn!("Bind of unknown draw constants buffer {constants:?}");
                return;
            };
            if buffer.usage != BufferUsage::Storage {
                log::warn!("Draw constants buffer {constants:?} is not a storage buffer");
                return;
            }
            let group = create_single_buffer_group(
                &self.device,
                &self.layouts.draw_constants,
                &buffer.buffer,
                "Draw constants bind group",
            );
            self.draw_constants_groups.insert(constants, group);
        }

        self.commands.push(RecordedCommand::BindDrawConstants(constants));
    }

    fn bind_geometry(&mut self, geometry: &GeometryBinding) {
        self.commands.push(RecordedCommand::BindGeometry(*geometry));
    }

    fn push_draw_ordinal(&mut self, ordinal: u32) {
        self.commands.push(RecordedCommand::PushDrawOrdinal(ordinal));
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        let per_draw_offset = self.per_draw.take_draw_offset();
        self.commands.push(RecordedCommand::DrawIndexed {
            index_count,
            first_index,
            base_vertex,
            per_draw_offset,
        });
    }

    fn multi_draw_indexed_indirect(
        &mut self,
        args: BufferHandle,
        offset: u64,
        draw_count: u32,
        stride: u64,
    ) {
        // wgpu reads tightly packed records
        if stride != IndirectDrawArgs::STRIDE {
            log::error!("Unsupported indirect argument stride {stride}");
            return;
        }

        let per_draw_offset = self.per_draw.take_draw_offset();
        self.commands.push(RecordedCommand::MultiDrawIndexedIndirect {
            args,
            offset,
            draw_count,
            per_draw_offset,
        });
    }
}

fn wgpu_usage(usage: BufferUsage) -> wgpu::BufferUsages {
    let usage = match usage {
        BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
        BufferUsage::Index => wgpu::BufferUsages::INDEX,
        BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM,
        BufferUsage::Storage => wgpu::BufferUsages::STORAGE,
        BufferUsage::Indirect => wgpu::BufferUsages::INDIRECT,
    };

    usage | wgpu::BufferUsages::COPY_DST
}

fn create_per_frame_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Per-frame uniform buffer"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_frame_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    per_frame: &wgpu::Buffer,
    per_draw: &PerDrawRing,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Frame bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: per_frame.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &per_draw.buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(DrawConstants::SIZE),
                }),
            },
        ],
    })
}

fn create_single_buffer_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_grows_to_the_next_power_of_two() {
        assert_eq!(ring_buffer_size(300, 1024).unwrap(), 512);
        assert_eq!(ring_buffer_size(512, 1024).unwrap(), 512);
    }

    #[test]
    fn ring_growth_is_clamped_to_the_device_limit() {
        assert_eq!(ring_buffer_size(900, 1000).unwrap(), 1000);
    }

    #[test]
    fn ring_larger_than_the_device_limit_is_an_error() {
        let error = ring_buffer_size(2000, 1024).unwrap_err();
        assert!(error.to_string().contains(SUBMISSION_REPEAT_VAR), "{error}");
    }
}
