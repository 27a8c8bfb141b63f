use std::sync::Arc;

use anyhow::Context;
use glam::Vec2;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    camera::{Camera, CameraUniform},
    rendering::{
        backend::{WgpuBackend, WgpuFrame},
        config::RenderConfig,
        controller::{RenderModeController, Transition},
        render_mode::RenderMode,
        scene_resources::SceneResources,
        strategies::FrameStats,
    },
    scene_graph::SceneGraph,
    texture::DepthTexture,
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
    depth_texture: DepthTexture,

    backend: WgpuBackend,
    controller: RenderModeController,
    resources: Option<SceneResources>,
    clear_color: wgpu::Color,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        scene: &dyn SceneGraph,
        config: &RenderConfig,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to find a graphics adapter")?;

        let missing = WgpuBackend::REQUIRED_FEATURES.difference(adapter.features());
        if !missing.is_empty() {
            anyhow::bail!(
                "Adapter {} lacks required features: {:?}",
                adapter.get_info().name,
                missing
            );
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: WgpuBackend::REQUIRED_FEATURES,
                required_limits: WgpuBackend::required_limits(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("Surface reports no supported formats")?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_texture = DepthTexture::new(&device, &surface_config, "Depth Texture");

        let mut backend = WgpuBackend::new(device.clone(), queue.clone(), surface_format);
        let resources = SceneResources::upload(scene, &mut backend)
            .context("Failed to upload scene resources")?;

        let mut controller = RenderModeController::new(config.submission_repeat);
        controller
            .activate(config.initial_mode, scene, &resources, &mut backend)
            .with_context(|| format!("Failed to enter initial mode {}", config.initial_mode))?;

        Ok(Self {
            window,
            size,
            surface,
            surface_config,
            device,
            queue,
            depth_texture,
            backend,
            controller,
            resources: Some(resources),
            clear_color: config.clear_color,
        })
    }

    pub fn mode(&self) -> Option<RenderMode> {
        self.controller.mode()
    }

    pub fn switch_mode(&mut self, mode: RenderMode, scene: &dyn SceneGraph) -> Transition {
        let Some(resources) = self.resources.as_ref() else {
            log::warn!("Ignoring switch to {mode} after shutdown");
            return Transition::Refused { target: mode };
        };

        self.controller
            .handle_command(mode, scene, resources, &mut self.backend)
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface.configure(&self.device, &self.surface_config);
            self.depth_texture.resize(&self.device, &self.surface_config);
        }
    }

    /// Draws one frame with the active mode. Surface errors are returned as
    /// `wgpu::SurfaceError` inside the `anyhow::Error`.
    pub fn render(
        &mut self,
        scene: &dyn SceneGraph,
        camera: &Camera,
    ) -> anyhow::Result<FrameStats> {
        let resources = self
            .resources
            .as_ref()
            .context("Renderer used after shutdown")?;

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let resolution = Vec2::new(self.size.width as f32, self.size.height as f32);
        let camera = CameraUniform::new(camera, resolution);
        let stats = self
            .controller
            .render_frame(scene, resources, &camera, &mut self.backend)?;

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.backend.encode_frame(
            &mut encoder,
            &WgpuFrame {
                color: &view,
                depth: self.depth_texture.view(),
                clear_color: self.clear_color,
            },
        )?;

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(stats)
    }

    /// Releases strategy caches and scene buffers while the device is alive.
    /// Releases every buffer. Later calls do nothing.
    pub fn shutdown(&mut self) {
        let Some(resources) = self.resources.take() else {
            return;
        };
        self.controller.release(&mut self.backend);
        resources.release(&mut self.backend);

        log::info!(
            "Renderer shut down, {} buffers left",
            self.backend.live_buffer_count()
        );
    }
}
