use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    demo::DemoState,
    input,
    rendering::{
        config::RenderConfig, controller::Transition, renderer::Renderer, strategies::FrameStats,
    },
};

const TITLE_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

/// What the event loop does after one `Renderer::render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameOutcome {
    Presented(FrameStats),
    /// The surface must be configured again before the next frame.
    Reconfigure,
    Skipped,
    /// The renderer cannot continue; shut it down and exit.
    Fatal,
}

fn frame_outcome(result: anyhow::Result<FrameStats>) -> FrameOutcome {
    let error = match result {
        Ok(stats) => return FrameOutcome::Presented(stats),
        Err(error) => error,
    };

    match error.downcast_ref::<wgpu::SurfaceError>() {
        Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => FrameOutcome::Reconfigure,
        Some(wgpu::SurfaceError::OutOfMemory) => {
            log::error!("Out of memory");
            FrameOutcome::Fatal
        }
        Some(wgpu::SurfaceError::Timeout) => {
            log::warn!("Timeout");
            FrameOutcome::Skipped
        }
        Some(other) => {
            log::error!("Unexpected surface error: {:?}", other);
            FrameOutcome::Skipped
        }
        None => {
            log::error!("Frame failed: {error:#}");
            FrameOutcome::Fatal
        }
    }
}

struct App {
    config: RenderConfig,
    renderer: Option<Renderer>,
    demo_state: DemoState,
    startup_error: Option<anyhow::Error>,
    last_title_update: Instant,
    frames_since_title: u32,
}

impl App {
    fn new(config: RenderConfig, demo_state: DemoState) -> Self {
        Self {
            config,
            renderer: None,
            demo_state,
            startup_error: None,
            last_title_update: Instant::now(),
            frames_since_title: 0,
        }
    }

    /// Drops the renderer so events that arrive before the loop exits are
    /// ignored.
    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.shutdown();
        }
        event_loop.exit();
    }

    fn update_title(&mut self, stats: FrameStats) {
        self.frames_since_title += 1;
        let elapsed = self.last_title_update.elapsed();
        if elapsed < TITLE_UPDATE_INTERVAL {
            return;
        }

        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };
        let mode = renderer
            .mode()
            .map_or_else(|| "no mode".to_string(), |mode| mode.to_string());
        let fps = self.frames_since_title as f32 / elapsed.as_secs_f32();

        renderer.window.set_title(&format!(
            "drawbench | {mode} | {} items, {} draw submissions | {fps:.0} fps",
            stats.draw_items, stats.submissions
        ));

        self.last_title_update = Instant::now();
        self.frames_since_title = 0;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes().with_title("drawbench");
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(error) => {
                self.startup_error =
                    Some(anyhow::Error::new(error).context("Failed to create window"));
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(Renderer::new(window, &self.demo_state.scene, &self.config)) {
            Ok(renderer) => {
                renderer.window.request_redraw();
                self.renderer = Some(renderer);
            }
            Err(error) => {
                self.startup_error = Some(error);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => self.shut_down(event_loop),
            WindowEvent::Resized(new_size) => {
                renderer.resize(new_size);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let Some(mode) = input::mode_for_key(event.physical_key) else {
                    return;
                };

                if let Transition::Switched { .. } =
                    renderer.switch_mode(mode, &self.demo_state.scene)
                {
                    // Show the new mode on the next frame
                    self.last_title_update = Instant::now() - TITLE_UPDATE_INTERVAL;
                }
            }
            WindowEvent::RedrawRequested => {
                renderer.window.request_redraw();

                if renderer.size.width == 0 || renderer.size.height == 0 {
                    return;
                }

                self.demo_state.update();

                let result = renderer.render(&self.demo_state.scene, &self.demo_state.camera);
                match frame_outcome(result) {
                    FrameOutcome::Presented(stats) => self.update_title(stats),
                    FrameOutcome::Reconfigure => renderer.resize(renderer.size),
                    FrameOutcome::Skipped => {}
                    FrameOutcome::Fatal => self.shut_down(event_loop),
                }
            }
            _ => (),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let config = RenderConfig::from_env();
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let demo_state = DemoState::new(&config).context("Failed to create demo state")?;

    log::info!(
        "Starting in {} mode; keys 1-4 or R/E/B/M switch modes",
        config.initial_mode
    );

    let mut app = App::new(config, demo_state);
    event_loop.run_app(&mut app)?;

    match app.startup_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> FrameStats {
        FrameStats {
            draw_items: 12,
            submissions: 1,
            per_draw_writes: 0,
        }
    }

    #[test]
    fn presented_frame_carries_its_stats() {
        assert_eq!(frame_outcome(Ok(stats())), FrameOutcome::Presented(stats()));
    }

    #[test]
    fn lost_surface_is_reconfigured() {
        for error in [wgpu::SurfaceError::Lost, wgpu::SurfaceError::Outdated] {
            assert_eq!(frame_outcome(Err(error.into())), FrameOutcome::Reconfigure);
        }
    }

    #[test]
    fn timeout_skips_the_frame() {
        assert_eq!(
            frame_outcome(Err(wgpu::SurfaceError::Timeout.into())),
            FrameOutcome::Skipped
        );
    }

    #[test]
    fn out_of_memory_and_renderer_errors_are_fatal() {
        assert_eq!(
            frame_outcome(Err(wgpu::SurfaceError::OutOfMemory.into())),
            FrameOutcome::Fatal
        );
        assert_eq!(
            frame_outcome(Err(anyhow::anyhow!("Renderer used after shutdown"))),
            FrameOutcome::Fatal
        );
    }

    #[test]
    fn surface_error_context_is_seen_through() {
        let error = anyhow::Error::new(wgpu::SurfaceError::Lost).context("Failed to acquire frame");
        assert_eq!(frame_outcome(Err(error)), FrameOutcome::Reconfigure);
    }
}
