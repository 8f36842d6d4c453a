use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use fragstore::{preprocess, FragmentStore};
use tracing::{debug, warn};

use crate::error::ProgramError;
use crate::gpu::{GpuProgram, GpuStage, GraphicsBackend, ShaderStage};
use crate::program::ShaderProgram;
use crate::types::GlVersion;

/// Marker in [`FRAGMENT_HARNESS`] replaced by the preprocessed user code.
const USER_CODE_MARKER: &str = "@GLSL";

/// Turns shader names into linked programs.
///
/// Resolution and preprocessing happen before any GPU object exists, so a
/// missing file or include never leaves half-built state behind.
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    store: FragmentStore,
    version: GlVersion,
    dump_path: Option<PathBuf>,
}

impl ProgramBuilder {
    pub fn new(store: FragmentStore, version: GlVersion) -> Self {
        Self {
            store,
            version,
            dump_path: None,
        }
    }

    /// Writes every wrapped fragment source to `path` before compiling it.
    pub fn with_dump_path(mut self, path: Option<PathBuf>) -> Self {
        self.dump_path = path;
        self
    }

    pub fn store(&self) -> &FragmentStore {
        &self.store
    }

    pub fn version(&self) -> GlVersion {
        self.version
    }

    pub fn vertex_source(&self) -> String {
        format!("{}\n{VERTEX_SHADER_GLSL}", self.version.glsl_directive())
    }

    /// Resolves `name`, preprocesses it, and wraps the result in the harness.
    pub fn fragment_source(&self, name: &str) -> Result<String, ProgramError> {
        let path = self.store.shader_path(name);
        if name.is_empty() || !path.is_file() {
            return Err(ProgramError::ShaderNotFound {
                name: name.to_string(),
                path,
            });
        }

        let flattened = preprocess(&self.store, &path)?;
        debug!(
            shader = name,
            includes = flattened.includes.len(),
            warnings = flattened.warnings.len(),
            "preprocessed shader"
        );

        let wrapped = wrap_fragment(&flattened.source, self.version);
        if let Some(dump) = &self.dump_path {
            if let Err(err) = fs::write(dump, &wrapped) {
                warn!(path = %dump.display(), "failed to dump wrapped shader: {err}");
            }
        }
        Ok(wrapped)
    }

    /// Builds the complete program for `name`: vertex stage, fragment stage,
    /// link. Partially built objects are released on failure.
    pub fn build<B: GraphicsBackend>(
        &self,
        backend: &Rc<B>,
        name: &str,
    ) -> Result<ShaderProgram<B>, ProgramError> {
        let fragment_source = self.fragment_source(name)?;

        let vertex = compile_stage(backend, ShaderStage::Vertex, &self.vertex_source())?;
        let fragment = compile_stage(backend, ShaderStage::Fragment, &fragment_source)?;

        let program = GpuProgram::create(backend).map_err(|message| ProgramError::Create {
            object: "program",
            message,
        })?;
        program.attach(&vertex);
        program.attach(&fragment);
        link(backend, &program)?;

        Ok(ShaderProgram {
            program,
            vertex,
            fragment,
        })
    }

    /// Compiles a fresh fragment stage for `name` without touching any program.
    pub fn build_fragment<B: GraphicsBackend>(
        &self,
        backend: &Rc<B>,
        name: &str,
    ) -> Result<GpuStage<B>, ProgramError> {
        let source = self.fragment_source(name)?;
        compile_stage(backend, ShaderStage::Fragment, &source)
    }
}

pub(crate) fn compile_stage<B: GraphicsBackend>(
    backend: &Rc<B>,
    stage: ShaderStage,
    source: &str,
) -> Result<GpuStage<B>, ProgramError> {
    let shader = GpuStage::create(backend, stage).map_err(|message| ProgramError::Create {
        object: match stage {
            ShaderStage::Vertex => "vertex shader",
            ShaderStage::Fragment => "fragment shader",
        },
        message,
    })?;
    if backend.compile_shader(shader.handle(), source) {
        Ok(shader)
    } else {
        let log = backend.shader_info_log(shader.handle());
        Err(ProgramError::Compile { stage, log })
    }
}

pub(crate) fn link<B: GraphicsBackend>(
    backend: &Rc<B>,
    program: &GpuProgram<B>,
) -> Result<(), ProgramError> {
    if backend.link_program(program.handle()) {
        Ok(())
    } else {
        let log = backend.program_info_log(program.handle());
        Err(ProgramError::Link { log })
    }
}

/// Embeds preprocessed user code in the fragment harness. Line numbers in
/// driver logs refer to the user's file.
pub fn wrap_fragment(user_code: &str, version: GlVersion) -> String {
    let body = FRAGMENT_HARNESS.replacen(
        USER_CODE_MARKER,
        &format!("#line 1\n{user_code}"),
        1,
    );
    format!("{}\n{body}", version.glsl_directive())
}

/// Pass-through vertex stage: positions come in pixel space and are forwarded
/// as `fragCoord`.
const VERTEX_SHADER_GLSL: &str = r"layout(location = 0) in vec3 in_Vertex;

out vec2 fragCoord;

uniform mat4 MVP;

void main()
{
    fragCoord = in_Vertex.xy;
    gl_Position = MVP * vec4(in_Vertex, 1.0);
}
";

/// Declarations shared by every user shader. User code defines
/// `void mainImage()` and writes `fragColor`.
const FRAGMENT_HARNESS: &str = r"in vec2 fragCoord;
out vec4 fragColor;

uniform mat4 MVP;
uniform mat4 M;
uniform mat4 V;
uniform mat4 P;

uniform vec2 ivMouse;
uniform vec2 fvCenter;
uniform vec2 uvResolution;

uniform float fTime;
uniform float fDelta;
uniform float fRatio;
uniform float fZoom;

uniform int iIncrement;
uniform int iMode;

uniform int vbMousePressed[3];
uniform int vbKeyPressed[4];
uniform int vbFlags[10];

@GLSL

void main()
{
    mainImage();
}
";
