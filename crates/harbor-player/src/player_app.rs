//! Player application implementing winit ApplicationHandler
//!
//! Runs the frame loop: input, first-person camera, scene capture, bloom
//! and tonemapping onto the window surface.

use crate::config::PlayerConfig;
use crate::state::ProgramState;
use anyhow::Context;
use harbor_render::postprocess::FrameContext;
use harbor_render::{
    BloomParameters, Camera, CameraMovement, HarborScene, PostProcessor, RenderContext,
    RenderError, WgpuBackend,
};
use harbor_runtime::{Action, FrameClock, InputState};
use std::path::PathBuf;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Fullscreen, Window, WindowId};

/// Exposure change per second while Q or E is held
const EXPOSURE_RATE: f32 = 0.5;
/// Pixels of touchpad scroll per zoom step
const PIXELS_PER_LINE: f64 = 40.0;

/// GPU-side state, created once the window exists
struct Gpu {
    backend: WgpuBackend,
    scene: HarborScene,
    post: PostProcessor<WgpuBackend>,
}

pub struct PlayerApp {
    config: PlayerConfig,
    state: ProgramState,
    state_path: PathBuf,

    pub clock: FrameClock,
    pub input: InputState,
    pub bloom: BloomParameters,

    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    camera: Camera,

    fullscreen: bool,
    cursor_captured: bool,
    error: Option<anyhow::Error>,
}

impl PlayerApp {
    pub fn new(
        config: PlayerConfig,
        state: ProgramState,
        state_path: PathBuf,
        fullscreen: bool,
    ) -> Self {
        let mut camera = Camera::default();
        state.apply_to(&mut camera);
        camera.aspect = config.window.width as f32 / config.window.height.max(1) as f32;

        Self {
            bloom: config.bloom.clone(),
            config,
            state,
            state_path,
            clock: FrameClock::new(),
            input: InputState::new(),
            window: None,
            gpu: None,
            camera,
            fullscreen,
            cursor_captured: false,
            error: None,
        }
    }

    /// The error that stopped the event loop, if any
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("Failed to create window")?,
        );
        if self.fullscreen {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        self.window = Some(window.clone());

        let context = pollster::block_on(RenderContext::new(window))
            .context("Failed to initialize GPU")?;
        self.camera.aspect = context.aspect_ratio();
        let (width, height) = (context.config.width, context.config.height);

        let mut backend = WgpuBackend::new(context);
        let scene = HarborScene::new(backend.device(), backend.queue(), &self.config.resources);
        let post = PostProcessor::new(&mut backend, width, height, &self.bloom)
            .context("Failed to allocate post-processing targets")?;

        self.gpu = Some(Gpu {
            backend,
            scene,
            post,
        });

        if !self.state.debug_ui {
            self.capture_cursor();
        }
        Ok(())
    }

    fn capture_cursor(&mut self) {
        if let Some(window) = &self.window {
            // Try confined first, then locked
            let _ = window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
            window.set_cursor_visible(false);
            self.cursor_captured = true;
        }
    }

    fn release_cursor(&mut self) {
        if let Some(window) = &self.window {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
            self.cursor_captured = false;
        }
    }

    /// F1: switch between mouse look and a free cursor
    fn toggle_debug_mode(&mut self) {
        self.state.debug_ui = !self.state.debug_ui;
        if self.state.debug_ui {
            self.release_cursor();
        } else {
            self.capture_cursor();
        }
        tracing::debug!(debug_ui = self.state.debug_ui, "debug mode toggled");
    }

    fn toggle_fullscreen(&self) {
        if let Some(window) = &self.window {
            if window.fullscreen().is_some() {
                window.set_fullscreen(None);
            } else {
                window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            }
        }
    }

    fn resize(&mut self, event_loop: &ActiveEventLoop, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        gpu.backend.resize(size.width, size.height);
        self.camera.aspect = gpu.backend.context().aspect_ratio();
        if let Err(err) = gpu.post.resize(&mut gpu.backend, size.width, size.height) {
            let err = anyhow::Error::new(err).context("Failed to resize post-processing targets");
            self.record_fatal(err);
            event_loop.exit();
        }
    }

    /// Keep the first fatal error; the event loop returns it from `main`
    fn record_fatal(&mut self, err: anyhow::Error) {
        tracing::error!(error = %format!("{err:#}"), "stopping");
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// No more frames are drawn once a fatal error has been recorded
    fn frames_allowed(&self) -> bool {
        self.error.is_none()
    }

    fn tick(&mut self) {
        self.clock.tick();
        let dt = self.clock.delta_time;

        if self.cursor_captured {
            let (dx, dy) = self.input.raw_mouse_delta();
            if dx != 0.0 || dy != 0.0 {
                // Device y grows downward; positive pitch looks up
                self.camera
                    .process_mouse_movement(dx as f32, -dy as f32, true);
            }
        }
        let scroll = self.input.scroll_delta();
        if scroll != 0.0 {
            self.camera.process_scroll(scroll);
        }

        for (action, movement) in [
            (Action::MoveForward, CameraMovement::Forward),
            (Action::MoveBackward, CameraMovement::Backward),
            (Action::MoveLeft, CameraMovement::Left),
            (Action::MoveRight, CameraMovement::Right),
        ] {
            if self.input.is_action_pressed(action) {
                self.camera.process_keyboard(movement, dt);
            }
        }

        if self.input.is_action_just_pressed(Action::ToggleBloom) {
            let enabled = self.bloom.toggle_bloom();
            tracing::info!(bloom = enabled, "bloom toggled");
        }
        if self.input.is_action_pressed(Action::ExposureUp) {
            self.bloom.adjust_exposure(EXPOSURE_RATE * dt);
        }
        if self.input.is_action_pressed(Action::ExposureDown) {
            self.bloom.adjust_exposure(-EXPOSURE_RATE * dt);
        }

        if let Some(gpu) = &mut self.gpu {
            gpu.scene.update(&self.camera, self.clock.total_time);
        }

        self.input.end_frame();
    }

    /// Draw one frame. A failed frame is discarded, not presented.
    fn render(&mut self) -> Result<(), RenderError> {
        let Some(gpu) = &mut self.gpu else {
            return Ok(());
        };

        if !gpu.backend.begin_frame()? {
            return Ok(());
        }

        let mut ctx = FrameContext {
            backend: &mut gpu.backend,
            scene: &mut gpu.scene,
            params: &self.bloom,
            clear_color: self.state.clear_color,
        };
        match gpu.post.render_frame(&mut ctx) {
            Ok(()) => {
                gpu.backend.end_frame();
                Ok(())
            }
            Err(err) => {
                gpu.backend.discard_frame();
                Err(err)
            }
        }
    }

    fn save_state(&mut self) {
        self.state.capture_from(&self.camera);
        match self.state.save(&self.state_path) {
            Ok(()) => tracing::info!(path = %self.state_path.display(), "saved program state"),
            Err(err) => tracing::warn!(error = %err, "could not save program state"),
        }
    }

    fn handle_key_press(&mut self, event_loop: &ActiveEventLoop, key_code: KeyCode) {
        if self.input.is_bound(Action::Exit, key_code) {
            if self.cursor_captured {
                self.release_cursor();
            } else {
                event_loop.exit();
            }
        } else if self.input.is_bound(Action::ToggleCapture, key_code) {
            self.toggle_debug_mode();
        } else if self.input.is_bound(Action::ToggleFullscreen, key_code) {
            self.toggle_fullscreen();
        }
    }
}

impl ApplicationHandler for PlayerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.initialize(event_loop) {
                self.record_fatal(err.context("Startup failed"));
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                self.resize(event_loop, new_size);
            }

            WindowEvent::Focused(false) => {
                self.input.release_all();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            if !event.repeat {
                                self.handle_key_press(event_loop, key_code);
                            }
                            self.input.process_key_down(key_code);
                        }
                        ElementState::Released => {
                            self.input.process_key_up(key_code);
                        }
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if !self.cursor_captured
                    && !self.state.debug_ui
                    && state == ElementState::Pressed
                    && button == MouseButton::Left
                {
                    self.capture_cursor();
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
                };
                self.input.process_scroll(lines);
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.input.process_mouse_move(position.x, position.y);
            }

            WindowEvent::RedrawRequested => {
                if !self.frames_allowed() {
                    return;
                }
                self.tick();
                if let Err(err) = self.render() {
                    self.record_fatal(anyhow::Error::new(err).context("Frame failed"));
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if !self.cursor_captured {
            return;
        }

        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.process_mouse_raw_delta(delta.0, delta.1);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            self.save_state();
        }
    }
}
