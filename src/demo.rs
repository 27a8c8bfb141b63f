use anyhow::Context;

use crate::{
    camera::Camera,
    rendering::config::RenderConfig,
    scene_graph::{
        demo_scene::build_demo_scene,
        scene::{scene_bounds, Scene},
        SceneGraph,
    },
};

pub struct DemoState {
    pub camera: Camera,
    pub scene: Scene,
}

impl DemoState {
    pub fn new(config: &RenderConfig) -> anyhow::Result<Self> {
        let scene = build_demo_scene(&config.demo_scene);
        let bounds = scene_bounds(&scene).context("Demo scene has nothing to draw")?;

        log::info!(
            "Demo scene: {} models, {} lights, bounds radius {:.1}",
            scene.model_count(),
            scene.lights().len(),
            bounds.radius
        );

        Ok(Self {
            camera: Camera::framing(&bounds),
            scene,
        })
    }

    pub fn update(&mut self) {
        self.scene.begin_frame();
    }
}
