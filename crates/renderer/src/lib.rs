//! OpenGL renderer behind the shader playground.
//!
//! A user shader goes through these stages on its way to the screen:
//!
//! ```text
//!   shader name
//!        │  FragmentStore::shader_path
//!        ▼
//!   fragstore::preprocess ──▶ wrap_fragment (harness + #line 1)
//!        │
//!        ▼
//!   ProgramBuilder::build ──▶ ProgramManager (Empty | Loaded)
//!                                   │ generation
//!                                   ▼
//!   Renderer::run ──▶ WindowState::render_frame ──▶ UniformTable::sync/push ──▶ draw quad
//! ```
//!
//! `ProgramManager` owns the linked program and both stages and guarantees
//! that every failure leaves it empty with nothing leaked. `UniformTable`
//! keeps uniform values across reloads and re-resolves locations whenever the
//! manager reports a new link. `Renderer` owns the winit window and the glutin
//! context; it can be entered any number of times from a prompt loop.
//!
//! All GPU work goes through the [`GraphicsBackend`] trait so the lifecycle can
//! be exercised without a display.

mod camera;
mod compile;
mod display;
mod error;
mod gpu;
mod input;
mod program;
mod runtime;
mod types;
mod uniforms;
mod window;

pub use camera::{Frustum, ViewProjection};
pub use compile::{wrap_fragment, ProgramBuilder};
pub use display::{DisplayState, DisplayTransition, WindowMode};
pub use error::ProgramError;
pub use gpu::{GlowBackend, GpuProgram, GpuStage, GraphicsBackend, ShaderStage};
pub use input::{action_for_key, Direction, InputState, KeyAction, MouseSlot};
pub use program::{ProgramManager, ProgramState, ShaderProgram};
pub use runtime::{FrameClock, SyncPolicy, TimeSample};
pub use types::{GlVersion, GlVersionError, RendererConfig, MIN_GL_VERSION};
pub use uniforms::{Uniform, UniformLocation, UniformSlot, UniformTable, UniformValue};
pub use window::Renderer;
