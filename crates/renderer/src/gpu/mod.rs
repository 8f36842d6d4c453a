//! Graphics plumbing under the program pipeline.
//!
//! - `backend` defines the `GraphicsBackend` seam plus the owned stage and
//!   program handles built on top of it.
//! - `context` owns the glutin display, surface, and context for one window,
//!   and knows how to resize and present.
//! - `gl` implements the backend over a `glow` context.
//! - `quad` uploads the two-triangle screen quad the harness draws.
//!
//! Everything here is single-threaded and expects the context to stay current
//! on the thread that created it.

mod backend;
mod context;
mod gl;
mod quad;
#[cfg(test)]
pub(crate) mod testing;

pub use backend::{GpuProgram, GpuStage, GraphicsBackend, ShaderStage};
pub(crate) use context::GlContext;
pub use gl::GlowBackend;
pub(crate) use quad::ScreenQuad;
