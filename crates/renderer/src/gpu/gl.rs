use glow::HasContext;
use tracing::trace;

use super::{GraphicsBackend, ShaderStage};
use crate::uniforms::{UniformLocation, UniformValue};

/// [`GraphicsBackend`] over a loaded `glow` context.
pub struct GlowBackend {
    gl: glow::Context,
}

impl GlowBackend {
    /// # Safety
    ///
    /// `gl` must have been loaded from a context that is current on this thread
    /// and stays current for as long as the backend is used.
    pub unsafe fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    pub(crate) fn context(&self) -> &glow::Context {
        &self.gl
    }

    /// Fixed state every frame relies on.
    pub fn init_state(&self) {
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            self.gl.enable(glow::MULTISAMPLE);
            self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
        }
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        unsafe {
            self.gl
                .viewport(0, 0, to_gl_size(width), to_gl_size(height));
        }
    }

    pub fn clear(&self) {
        unsafe {
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    /// Drains the driver error queue, returning the first code seen.
    pub fn take_error(&self) -> Option<u32> {
        let mut first = None;
        loop {
            let code = unsafe { self.gl.get_error() };
            if code == glow::NO_ERROR {
                return first;
            }
            first.get_or_insert(code);
        }
    }
}

fn to_gl_size(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

impl GraphicsBackend for GlowBackend {
    type Shader = glow::NativeShader;
    type Program = glow::NativeProgram;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(stage_enum(stage)) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool {
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            self.gl.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&self, program: Self::Program) -> bool {
        unsafe {
            self.gl.link_program(program);
            self.gl.get_program_link_status(program)
        }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn uniform_location(&self, program: Self::Program, name: &str) -> UniformLocation {
        match unsafe { self.gl.get_uniform_location(program, name) } {
            Some(location) => i32::try_from(location.0)
                .map(UniformLocation::new)
                .unwrap_or(UniformLocation::ABSENT),
            None => UniformLocation::ABSENT,
        }
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let Some(index) = location.index() else {
            return;
        };
        let location = glow::NativeUniformLocation(index);
        let location = Some(&location);
        trace!(location = index, ?value, "uploading uniform");
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(location, *v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, *v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(location, v.x, v.y),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(location, v.x, v.y, v.z),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32(location, v.x, v.y, v.z, v.w),
                UniformValue::Mat2(m) => {
                    self.gl
                        .uniform_matrix_2_f32_slice(location, false, &m.to_cols_array())
                }
                UniformValue::Mat3(m) => {
                    self.gl
                        .uniform_matrix_3_f32_slice(location, false, &m.to_cols_array())
                }
                UniformValue::Mat4(m) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(location, false, &m.to_cols_array())
                }
                UniformValue::IntArray(values) => self.gl.uniform_1_i32_slice(location, values),
            }
        }
    }
}
