use std::rc::Rc;

use anyhow::{anyhow, Result};
use fragstore::FragmentStore;
use tracing::{debug, error, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{ModifiersState, PhysicalKey};
use winit::platform::run_on_demand::EventLoopExtRunOnDemand;
use winit::window::{Fullscreen, WindowBuilder};

use crate::camera::{Frustum, ViewProjection};
use crate::compile::ProgramBuilder;
use crate::display::{DisplayState, DisplayTransition};
use crate::error::ProgramError;
use crate::gpu::{GlContext, GlowBackend, ScreenQuad};
use crate::input::{action_for_key, InputState, KeyAction, MouseSlot};
use crate::program::ProgramManager;
use crate::runtime::{FrameClock, SyncPolicy};
use crate::types::RendererConfig;
use crate::uniforms::{Uniform, UniformTable, UniformValue};

/// Wheel travel reported in pixels that counts as one notch.
const PIXELS_PER_NOTCH: f64 = 120.0;

/// Owns the window, its GL context, and the program currently shown.
///
/// The window stays hidden between calls to [`Renderer::run`]; each call shows
/// it, renders until Escape or a close request, and hides it again so the
/// caller can go back to prompting for the next shader.
pub struct Renderer {
    event_loop: EventLoop<()>,
    state: WindowState,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Result<Self> {
        let event_loop =
            EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
        let state = WindowState::new(&event_loop, config)?;
        Ok(Self { event_loop, state })
    }

    pub fn store(&self) -> &FragmentStore {
        self.state.programs.builder().store()
    }

    /// Builds `name` into the program the next [`Renderer::run`] displays.
    pub fn load_shader(&mut self, name: &str) -> Result<(), ProgramError> {
        self.state.programs.load(name)
    }

    pub fn is_loaded(&self) -> bool {
        self.state.programs.is_loaded()
    }

    /// Shows the window and renders until the user leaves the loop.
    pub fn run(&mut self) -> Result<()> {
        self.state.begin();
        let state = &mut self.state;
        let result = self
            .event_loop
            .run_on_demand(|event, elwt| state.handle_event(event, elwt))
            .map_err(|err| anyhow!("render loop failed: {err}"));
        self.state.end();
        result
    }

    /// Releases the program before the context goes away.
    pub fn unload(&mut self) {
        self.state.programs.teardown();
    }
}

struct WindowState {
    // GPU resources first: they must be released while the context is alive.
    programs: ProgramManager<GlowBackend>,
    quad: Option<ScreenQuad>,
    backend: Rc<GlowBackend>,
    uniforms: UniformTable,
    input: InputState,
    frustum: Frustum,
    camera: ViewProjection,
    clock: FrameClock,
    display: DisplayState,
    sync: SyncPolicy,
    modifiers: ModifiersState,
    start_fullscreen: bool,
    title: String,
    gl: GlContext,
}

impl WindowState {
    fn new(event_loop: &EventLoop<()>, config: RendererConfig) -> Result<Self> {
        let (width, height) = config.window_size;
        let window_builder = WindowBuilder::new()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(width, height))
            .with_visible(false);
        let (gl, glow_context) = GlContext::new(event_loop, window_builder, config.gl_version)?;
        let backend = Rc::new(unsafe { GlowBackend::new(glow_context) });
        backend.init_state();
        info!(
            gl_version = %config.gl_version,
            width,
            height,
            "created render window"
        );

        let builder = ProgramBuilder::new(config.store, config.gl_version)
            .with_dump_path(config.dump_source);
        let programs = ProgramManager::new(Rc::clone(&backend), builder);
        let frustum = Frustum::default();

        Ok(Self {
            programs,
            quad: None,
            backend,
            uniforms: UniformTable::new(),
            input: InputState::new(),
            frustum,
            camera: ViewProjection::for_viewport(frustum, width, height),
            clock: FrameClock::new(),
            display: DisplayState::new((width, height)),
            sync: config.sync,
            modifiers: ModifiersState::empty(),
            start_fullscreen: config.fullscreen,
            title: config.title,
            gl,
        })
    }

    fn begin(&mut self) {
        let window = &self.gl.window;
        match self.programs.shader_name() {
            Some(name) => window.set_title(&format!("{} - {name}", self.title)),
            None => window.set_title(&self.title),
        }
        window.set_visible(true);
        if self.start_fullscreen {
            self.start_fullscreen = false;
            self.toggle_fullscreen();
        }
        self.gl.apply_sync(self.sync);
        let size = self.gl.window.inner_size();
        self.resize(size);
        self.clock.reset();
        self.gl.window.request_redraw();
    }

    fn end(&mut self) {
        self.gl.window.set_visible(false);
        debug!("render window hidden");
    }

    fn handle_event(&mut self, event: Event<()>, elwt: &EventLoopWindowTarget<()>) {
        match event {
            Event::WindowEvent { window_id, event } if window_id == self.gl.window.id() => {
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => self.resize(size),
                    WindowEvent::ModifiersChanged(modifiers) => {
                        self.modifiers = modifiers.state();
                    }
                    WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event, elwt),
                    WindowEvent::CursorMoved { position, .. } => self.handle_cursor(position),
                    WindowEvent::MouseInput { state, button, .. } => {
                        let slot = match button {
                            MouseButton::Left => MouseSlot::Left,
                            MouseButton::Right => MouseSlot::Right,
                            MouseButton::Middle => MouseSlot::Middle,
                            _ => return,
                        };
                        self.input
                            .set_mouse_button(slot, state == ElementState::Pressed);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let notches = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(position) => {
                                (position.y / PIXELS_PER_NOTCH) as f32
                            }
                        };
                        self.input.zoom_by(notches, self.modifiers.shift_key());
                    }
                    WindowEvent::RedrawRequested => self.render_frame(),
                    _ => {}
                }
            }
            Event::AboutToWait => {
                self.gl.window.request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, event: &KeyEvent, elwt: &EventLoopWindowTarget<()>) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(action) = action_for_key(code, self.modifiers.shift_key()) else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;

        if let KeyAction::Pan(direction) = action {
            self.input.set_direction(direction, pressed);
            return;
        }
        if !pressed || (event.repeat && !action.repeats()) {
            return;
        }

        let fine = self.modifiers.shift_key();
        match action {
            KeyAction::Exit => elwt.exit(),
            KeyAction::HotSwap => {
                // Failures are logged by the manager; the loop keeps running empty.
                let _ = self.programs.hot_swap();
            }
            KeyAction::FullReload => {
                let _ = self.programs.reload();
            }
            KeyAction::ToggleSync => {
                self.sync = self.sync.toggled();
                self.gl.apply_sync(self.sync);
                info!(sync = ?self.sync, "swap interval toggled");
            }
            KeyAction::ResetInput => {
                self.input.reset();
                debug!("input state reset");
            }
            KeyAction::ToggleFullscreen => self.toggle_fullscreen(),
            KeyAction::ToggleFlag(index) => self.input.toggle_flag(index),
            KeyAction::ZoomIn => self.input.zoom_by(1.0, fine),
            KeyAction::ZoomOut => self.input.zoom_by(-1.0, fine),
            KeyAction::CycleMode => self.input.cycle_mode(),
            KeyAction::Increment => self.input.step_increment(1),
            KeyAction::Decrement => self.input.step_increment(-1),
            KeyAction::Pan(_) => {}
        }
    }

    fn handle_cursor(&mut self, position: PhysicalPosition<f64>) {
        let height = self.gl.window.inner_size().height;
        self.input
            .set_cursor(position.x as f32, position.y as f32, height);
    }

    fn toggle_fullscreen(&mut self) {
        let window = &self.gl.window;
        let size = window.inner_size();
        match self.display.toggle((size.width, size.height)) {
            DisplayTransition::EnterFullscreen => {
                window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                info!("entered borderless fullscreen");
            }
            DisplayTransition::LeaveFullscreen { restore } => {
                window.set_fullscreen(None);
                let applied = window.request_inner_size(PhysicalSize::new(restore.0, restore.1));
                info!(width = restore.0, height = restore.1, "left fullscreen");
                if let Some(size) = applied {
                    self.resize(size);
                }
            }
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.gl.resize(size);
        self.backend.set_viewport(size.width, size.height);
        self.camera = ViewProjection::for_viewport(self.frustum, size.width, size.height);
        self.camera.write_uniforms(&mut self.uniforms);

        self.quad = None;
        match ScreenQuad::new(&self.backend, size.width, size.height) {
            Ok(quad) => self.quad = Some(quad),
            Err(err) => error!("failed to build screen quad: {err}"),
        }
        debug!(width = size.width, height = size.height, "viewport resized");
    }

    fn render_frame(&mut self) {
        let sample = self.clock.sample();
        self.input.advance(sample.delta_seconds());
        self.input.write_uniforms(&mut self.uniforms);
        self.uniforms
            .set(Uniform::Time, UniformValue::Float(sample.seconds));
        self.uniforms
            .set(Uniform::Delta, UniformValue::Float(sample.delta_millis()));
        self.uniforms.sync(&self.programs);

        self.backend.clear();
        if let Some(quad) = &self.quad {
            if self.programs.bind() {
                self.uniforms.push(self.backend.as_ref());
                quad.draw();
                self.programs.unbind();
            }
        }

        if let Err(err) = self.gl.present() {
            warn!("{err}");
        }
        if let Some(code) = self.backend.take_error() {
            debug!(code, frame = sample.frame_index, "GL error after frame");
        }
    }
}
