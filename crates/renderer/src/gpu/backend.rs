use std::fmt;
use std::rc::Rc;

use crate::uniforms::{UniformLocation, UniformValue};

/// Programmable pipeline stage a shader object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// The slice of a GL-style graphics API the program pipeline needs.
///
/// Implementations hand out opaque handles and never validate them; ownership
/// rules live in [`GpuStage`] and [`GpuProgram`]. Every method must be called
/// from the thread that owns the graphics context.
pub trait GraphicsBackend {
    type Shader: Copy + Eq + fmt::Debug;
    type Program: Copy + Eq + fmt::Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    /// Uploads `source` and compiles it, returning the compile status.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// Links `program`, returning the link status.
    fn link_program(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    /// Location of `name` in a linked program; absent when the uniform does not
    /// exist or was optimised away.
    fn uniform_location(&self, program: Self::Program, name: &str) -> UniformLocation;
    /// Uploads `value` to the currently bound program. Callers skip absent
    /// locations.
    fn set_uniform(&self, location: UniformLocation, value: &UniformValue);
}

/// Owned shader object. Deleted when dropped.
pub struct GpuStage<B: GraphicsBackend> {
    backend: Rc<B>,
    stage: ShaderStage,
    handle: B::Shader,
}

impl<B: GraphicsBackend> GpuStage<B> {
    pub fn create(backend: &Rc<B>, stage: ShaderStage) -> Result<Self, String> {
        let handle = backend.create_shader(stage)?;
        Ok(Self {
            backend: Rc::clone(backend),
            stage,
            handle,
        })
    }

    pub fn handle(&self) -> B::Shader {
        self.handle
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl<B: GraphicsBackend> Drop for GpuStage<B> {
    fn drop(&mut self) {
        self.backend.delete_shader(self.handle);
    }
}

impl<B: GraphicsBackend> fmt::Debug for GpuStage<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuStage")
            .field("stage", &self.stage)
            .field("handle", &self.handle)
            .finish()
    }
}

/// Owned program object. Deleted when dropped; the driver detaches whatever
/// stages are still attached.
pub struct GpuProgram<B: GraphicsBackend> {
    backend: Rc<B>,
    handle: B::Program,
}

impl<B: GraphicsBackend> GpuProgram<B> {
    pub fn create(backend: &Rc<B>) -> Result<Self, String> {
        let handle = backend.create_program()?;
        Ok(Self {
            backend: Rc::clone(backend),
            handle,
        })
    }

    pub fn handle(&self) -> B::Program {
        self.handle
    }

    pub fn attach(&self, stage: &GpuStage<B>) {
        self.backend.attach_shader(self.handle, stage.handle());
    }

    pub fn detach(&self, stage: &GpuStage<B>) {
        self.backend.detach_shader(self.handle, stage.handle());
    }
}

impl<B: GraphicsBackend> Drop for GpuProgram<B> {
    fn drop(&mut self) {
        self.backend.delete_program(self.handle);
    }
}

impl<B: GraphicsBackend> fmt::Debug for GpuProgram<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuProgram")
            .field("handle", &self.handle)
            .finish()
    }
}
