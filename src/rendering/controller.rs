use anyhow::Context;

use crate::{
    camera::CameraUniform,
    rendering::{
        backend::RenderBackend,
        binding_offsets::ShaderBindingOffsetCache,
        per_frame::bind_per_frame,
        permutation::ShaderPermutation,
        render_mode::RenderMode,
        scene_resources::SceneResources,
        strategies::{
            BindlessConstantsStrategy, DrawStrategy, ExplicitStrategy, FrameContext, FrameStats,
            MultiDrawStrategy, StockStrategy,
        },
    },
    scene_graph::SceneGraph,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target was already active.
    Unchanged,
    Switched {
        from: Option<RenderMode>,
        to: RenderMode,
    },
    /// The target could not be entered; the previous mode stays active.
    Refused { target: RenderMode },
}

struct ActiveMode {
    mode: RenderMode,
    permutation: ShaderPermutation,
}

/// Owns one strategy per render mode and the binding offsets of every shader
/// permutation entered so far. Exactly one mode is active after `activate`.
pub struct RenderModeController {
    strategies: Vec<Box<dyn DrawStrategy>>,
    offsets: ShaderBindingOffsetCache,
    submission_repeat: u32,
    active: Option<ActiveMode>,
}

impl RenderModeController {
    pub fn new(submission_repeat: u32) -> Self {
        let strategies: Vec<Box<dyn DrawStrategy>> = vec![
            Box::new(StockStrategy::new()),
            Box::new(ExplicitStrategy::new()),
            Box::new(BindlessConstantsStrategy::new()),
            Box::new(MultiDrawStrategy::new()),
        ];
        debug_assert!(RenderMode::ALL
            .iter()
            .all(|mode| strategies[mode.index()].mode() == *mode));

        Self {
            strategies,
            offsets: ShaderBindingOffsetCache::new(),
            submission_repeat: submission_repeat.max(1),
            active: None,
        }
    }

    pub fn mode(&self) -> Option<RenderMode> {
        self.active.as_ref().map(|active| active.mode)
    }

    pub fn submission_repeat(&self) -> u32 {
        self.submission_repeat
    }

    pub fn strategy(&self, mode: RenderMode) -> &dyn DrawStrategy {
        self.strategies[mode.index()].as_ref()
    }

    pub fn binding_offsets(&self) -> &ShaderBindingOffsetCache {
        &self.offsets
    }

    /// Enters the first mode. Unlike a later switch, a failure here is
    /// returned to the caller since there is no previous mode to keep.
    pub fn activate(
        &mut self,
        initial: RenderMode,
        scene: &dyn SceneGraph,
        resources: &SceneResources,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<()> {
        self.switch_to(initial, scene, resources, backend)?;
        Ok(())
    }

    /// Prepares the target strategy first, so a scene the target cannot draw
    /// leaves the backend and the active mode untouched.
    pub fn switch_to(
        &mut self,
        target: RenderMode,
        scene: &dyn SceneGraph,
        resources: &SceneResources,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<Transition> {
        if self.mode() == Some(target) {
            return Ok(Transition::Unchanged);
        }

        self.strategies[target.index()]
            .prepare(scene, resources, backend)
            .with_context(|| format!("Failed to prepare {target} mode"))?;

        let permutation = target.permutation();
        backend
            .select_permutation(&permutation)
            .with_context(|| format!("Failed to select shader permutation {permutation}"))?;
        self.offsets
            .get_or_resolve(&permutation, backend.reflection());

        let from = self.mode();
        self.active = Some(ActiveMode {
            mode: target,
            permutation,
        });

        match from {
            Some(from) => log::info!("Render mode: {from} -> {target}"),
            None => log::info!("Render mode: {target}"),
        }

        Ok(Transition::Switched { from, to: target })
    }

    /// Mode switch requested from input. Failures are logged and reported as
    /// `Transition::Refused`.
    pub fn handle_command(
        &mut self,
        target: RenderMode,
        scene: &dyn SceneGraph,
        resources: &SceneResources,
        backend: &mut dyn RenderBackend,
    ) -> Transition {
        match self.switch_to(target, scene, resources, backend) {
            Ok(transition) => transition,
            Err(error) => {
                log::error!("Refusing to switch to {target} mode: {error:#}");
                Transition::Refused { target }
            }
        }
    }

    /// Writes the per-frame block, then submits the active strategy's frame
    /// `submission_repeat` times.
    pub fn render_frame(
        &mut self,
        scene: &dyn SceneGraph,
        resources: &SceneResources,
        camera: &CameraUniform,
        backend: &mut dyn RenderBackend,
    ) -> anyhow::Result<FrameStats> {
        let active = self
            .active
            .as_ref()
            .context("Render mode controller used before activation")?;
        let offsets = self
            .offsets
            .get(&active.permutation)
            .context("No binding offsets for the active permutation")?;

        bind_per_frame(backend, offsets, camera, scene.lights());

        let frame = FrameContext {
            scene,
            resources,
            offsets,
        };
        let strategy = &mut self.strategies[active.mode.index()];

        let mut stats = strategy.render_frame(&frame, backend)?;
        for _ in 1..self.submission_repeat {
            stats.add_repeat(strategy.render_frame(&frame, backend)?);
        }

        Ok(stats)
    }

    /// Frees every strategy's cached state. The controller must be activated
    /// again before the next frame.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        for strategy in &mut self.strategies {
            strategy.release(backend);
        }
        self.active = None;
        log::debug!("Released render mode caches");
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::{
        camera::Camera,
        rendering::backend::{BackendCall, RecordingBackend},
        scene_graph::{
            demo_scene::{build_demo_scene, DemoSceneConfig},
            IndexData, Scene,
        },
    };

    fn demo() -> Scene {
        build_demo_scene(&DemoSceneConfig {
            grid_size: 2,
            ..Default::default()
        })
    }

    fn camera() -> CameraUniform {
        CameraUniform::new(&Camera::default(), Vec2::new(800.0, 600.0))
    }

    #[test]
    fn self_transition_is_a_no_op() {
        let scene = demo();
        let mut backend = RecordingBackend::new();
        let resources = SceneResources::upload(&scene, &mut backend).unwrap();
        let mut controller = RenderModeController::new(1);

        controller
            .activate(RenderMode::Explicit, &scene, &resources, &mut backend)
            .unwrap();
        backend.clear_calls();

        let transition = controller.handle_command(RenderMode::Explicit, &scene, &resources, &mut backend);

        assert_eq!(transition, Transition::Unchanged);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn each_switch_selects_the_mode_permutation() {
        let scene = demo();
        let mut backend = RecordingBackend::new();
        let resources = SceneResources::upload(&scene, &mut backend).unwrap();
        let mut controller = RenderModeController::new(1);

        for mode in RenderMode::ALL {
            let transition = controller.handle_command(mode, &scene, &resources, &mut backend);

            assert!(matches!(transition, Transition::Switched { to, .. } if to == mode));
            assert_eq!(backend.permutation(), Some(&mode.permutation()));
            assert_eq!(controller.mode(), Some(mode));
        }

        // One reflection pass per permutation, reused when switching back
        controller.handle_command(RenderMode::Stock, &scene, &resources, &mut backend);
        assert_eq!(controller.binding_offsets().resolve_count(), 4);
    }

    #[test]
    fn refused_switch_keeps_mode_and_permutation() {
        let mut scene = demo();
        // 16-bit indices are fine per item but cannot be merged
        let crate_mesh = scene.mesh(0, 0);
        scene.meshes[crate_mesh].indices = IndexData::U16(vec![0, 1, 2]);

        let mut backend = RecordingBackend::new();
        let resources = SceneResources::upload(&scene, &mut backend).unwrap();
        let mut controller = RenderModeController::new(1);
        controller
            .activate(RenderMode::BindlessConstants, &scene, &resources, &mut backend)
            .unwrap();
        backend.clear_calls();

        let transition =
            controller.handle_command(RenderMode::BindlessMultiDraw, &scene, &resources, &mut backend);

        assert_eq!(
            transition,
            Transition::Refused {
                target: RenderMode::BindlessMultiDraw
            }
        );
        assert_eq!(controller.mode(), Some(RenderMode::BindlessConstants));
        assert_eq!(
            backend.count_calls(|call| matches!(call, BackendCall::SelectPermutation(_))),
            0
        );
        assert!(controller
            .render_frame(&scene, &resources, &camera(), &mut backend)
            .is_ok());
    }

    #[test]
    fn repeat_multiplies_submissions_only() {
        let scene = demo();
        let mut backend = RecordingBackend::new();
        let resources = SceneResources::upload(&scene, &mut backend).unwrap();
        let mut controller = RenderModeController::new(2);
        controller
            .activate(RenderMode::BindlessConstants, &scene, &resources, &mut backend)
            .unwrap();
        backend.clear_calls();

        let stats = controller
            .render_frame(&scene, &resources, &camera(), &mut backend)
            .unwrap();

        let items = stats.draw_items;
        assert!(items > 0);
        assert_eq!(stats.submissions, items * 2);
        assert_eq!(backend.submissions(), (items * 2) as usize);
        // Camera, light count and lights, written once regardless of repeats
        assert_eq!(
            backend.count_calls(|call| matches!(call, BackendCall::WritePerFrame { .. })),
            3
        );
    }

    #[test]
    fn render_before_activation_fails() {
        let scene = demo();
        let mut backend = RecordingBackend::new();
        let resources = SceneResources::upload(&scene, &mut backend).unwrap();
        let mut controller = RenderModeController::new(1);

        assert!(controller
            .render_frame(&scene, &resources, &camera(), &mut backend)
            .is_err());
    }

    #[test]
    fn release_frees_strategy_buffers() {
        let scene = demo();
        let mut backend = RecordingBackend::new();
        let resources = SceneResources::upload(&scene, &mut backend).unwrap();
        let scene_buffers = backend.live_buffer_count();
        let mut controller = RenderModeController::new(1);

        controller
            .activate(RenderMode::BindlessConstants, &scene, &resources, &mut backend)
            .unwrap();
        controller.handle_command(RenderMode::BindlessMultiDraw, &scene, &resources, &mut backend);
        assert!(backend.live_buffer_count() > scene_buffers);

        controller.release(&mut backend);

        assert_eq!(backend.live_buffer_count(), scene_buffers);
        assert_eq!(controller.mode(), None);
    }
}
