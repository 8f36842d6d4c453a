//! Lifecycle of the one program the playground renders with.
//!
//! The manager is either empty or holds a linked [`ShaderProgram`]. Every
//! failure path lands in the empty state with all GPU objects released, so the
//! render loop only has to ask [`ProgramManager::is_loaded`] before drawing.
use std::fmt;
use std::mem;
use std::rc::Rc;

use tracing::{debug, error, info};

use crate::compile::{link, ProgramBuilder};
use crate::error::ProgramError;
use crate::gpu::{GpuProgram, GpuStage, GraphicsBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    Empty,
    Loaded,
}

/// A linked program with both of its stages attached.
pub struct ShaderProgram<B: GraphicsBackend> {
    // Dropped first so the stages are released after the program.
    pub(crate) program: GpuProgram<B>,
    pub(crate) vertex: GpuStage<B>,
    pub(crate) fragment: GpuStage<B>,
}

impl<B: GraphicsBackend> fmt::Debug for ShaderProgram<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("program", &self.program.handle())
            .field("vertex", &self.vertex.handle())
            .field("fragment", &self.fragment.handle())
            .finish()
    }
}

impl<B: GraphicsBackend> ShaderProgram<B> {
    pub fn program(&self) -> B::Program {
        self.program.handle()
    }

    pub fn vertex_stage(&self) -> B::Shader {
        self.vertex.handle()
    }

    pub fn fragment_stage(&self) -> B::Shader {
        self.fragment.handle()
    }
}

pub struct ProgramManager<B: GraphicsBackend> {
    backend: Rc<B>,
    builder: ProgramBuilder,
    active: Option<ShaderProgram<B>>,
    shader_name: Option<String>,
    generation: u64,
}

impl<B: GraphicsBackend> ProgramManager<B> {
    pub fn new(backend: Rc<B>, builder: ProgramBuilder) -> Self {
        Self {
            backend,
            builder,
            active: None,
            shader_name: None,
            generation: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn builder(&self) -> &ProgramBuilder {
        &self.builder
    }

    pub fn state(&self) -> ProgramState {
        if self.active.is_some() {
            ProgramState::Loaded
        } else {
            ProgramState::Empty
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ShaderProgram<B>> {
        self.active.as_ref()
    }

    /// Name of the shader last passed to [`ProgramManager::load`].
    pub fn shader_name(&self) -> Option<&str> {
        self.shader_name.as_deref()
    }

    /// Bumped after every successful link; uniform locations resolved against
    /// an older generation are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces whatever is loaded with a full build of `name`.
    pub fn load(&mut self, name: &str) -> Result<(), ProgramError> {
        self.teardown();
        self.shader_name = Some(name.to_string());

        match self.builder.build(&self.backend, name) {
            Ok(program) => {
                self.active = Some(program);
                self.generation += 1;
                info!(shader = name, "shader loaded");
                Ok(())
            }
            Err(err) => {
                error!(shader = name, "failed to load shader: {err}");
                Err(err)
            }
        }
    }

    /// Full rebuild of the current shader, vertex stage included.
    pub fn reload(&mut self) -> Result<(), ProgramError> {
        let Some(name) = self.shader_name.clone() else {
            return Err(ProgramError::NoShaderSelected);
        };
        self.load(&name)
    }

    /// Recompiles only the fragment stage of the current shader and relinks
    /// the existing program. The program and vertex stage keep their handles.
    ///
    /// Any failure leaves the manager empty. When nothing is loaded the call
    /// falls back to a full load of the remembered shader.
    pub fn hot_swap(&mut self) -> Result<(), ProgramError> {
        let Some(name) = self.shader_name.clone() else {
            return Err(ProgramError::NoShaderSelected);
        };
        let Some(mut active) = self.active.take() else {
            debug!(shader = %name, "nothing loaded, hot swap falls back to a full load");
            return self.load(&name);
        };

        let fragment = match self.builder.build_fragment(&self.backend, &name) {
            Ok(fragment) => fragment,
            Err(err) => {
                drop(active);
                error!(shader = %name, "hot swap failed: {err}");
                return Err(err);
            }
        };

        let previous = mem::replace(&mut active.fragment, fragment);
        active.program.detach(&previous);
        drop(previous);
        active.program.attach(&active.fragment);

        if let Err(err) = link(&self.backend, &active.program) {
            drop(active);
            error!(shader = %name, "hot swap failed: {err}");
            return Err(err);
        }

        self.active = Some(active);
        self.generation += 1;
        info!(shader = %name, "fragment stage hot swapped");
        Ok(())
    }

    /// Releases the program and both stages. Safe to call when empty.
    pub fn teardown(&mut self) {
        if let Some(program) = self.active.take() {
            self.backend.use_program(None);
            debug!(program = ?program.program(), "released shader program");
        }
    }

    /// Makes the loaded program current. Returns false when empty.
    pub fn bind(&self) -> bool {
        match &self.active {
            Some(active) => {
                self.backend.use_program(Some(active.program()));
                true
            }
            None => false,
        }
    }

    pub fn unbind(&self) {
        self.backend.use_program(None);
    }
}

impl<B: GraphicsBackend> Drop for ProgramManager<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::testing::RecordingBackend;
    use crate::gpu::ShaderStage;
    use crate::types::GlVersion;
    use crate::uniforms::{Uniform, UniformTable};
    use fragstore::FragmentStore;
    use std::fs;
    use tempfile::TempDir;

    const LOOP: &str = "void mainImage() {\n    fragColor = vec4(fract(fTime), 0.0, 0.0, 1.0);\n}\n";
    const LOOP_EDITED: &str = "void mainImage() {\n    fragColor = vec4(0.0, fract(fTime), 0.0, 1.0);\n}\n";

    fn manager_with(files: &[(&str, &str)]) -> (TempDir, Rc<RecordingBackend>, ProgramManager<RecordingBackend>) {
        let temp = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fs::write(temp.path().join(name), contents).unwrap();
        }
        let backend = Rc::new(RecordingBackend::new());
        let builder = ProgramBuilder::new(FragmentStore::new(temp.path()), GlVersion::default());
        let manager = ProgramManager::new(Rc::clone(&backend), builder);
        (temp, backend, manager)
    }

    #[test]
    fn load_reaches_loaded_state() {
        let (_temp, backend, mut manager) = manager_with(&[("loop.frag", LOOP)]);
        assert_eq!(manager.state(), ProgramState::Empty);

        manager.load("loop").unwrap();
        assert_eq!(manager.state(), ProgramState::Loaded);
        assert_eq!(manager.shader_name(), Some("loop"));
        assert_eq!(manager.generation(), 1);
        assert_eq!(backend.live_programs(), 1);
        assert_eq!(backend.live_shaders(), 2);
    }

    #[test]
    fn missing_shader_leaves_manager_empty() {
        let (_temp, backend, mut manager) = manager_with(&[("loop.frag", LOOP)]);
        manager.load("loop").unwrap();

        let err = manager.load("ghost").unwrap_err();
        assert!(matches!(err, ProgramError::ShaderNotFound { .. }));
        assert_eq!(manager.state(), ProgramState::Empty);
        assert_eq!(backend.live_programs(), 0);
        assert_eq!(backend.live_shaders(), 0);
    }

    #[test]
    fn hot_swap_keeps_program_and_vertex_handles() {
        let (temp, backend, mut manager) = manager_with(&[("loop.frag", LOOP)]);
        manager.load("loop").unwrap();
        let before = manager.active().map(|p| (p.program(), p.vertex_stage(), p.fragment_stage())).unwrap();

        fs::write(temp.path().join("loop.frag"), LOOP_EDITED).unwrap();
        manager.hot_swap().unwrap();

        let active = manager.active().unwrap();
        assert_eq!(active.program(), before.0);
        assert_eq!(active.vertex_stage(), before.1);
        assert_ne!(active.fragment_stage(), before.2);
        assert!(!backend.is_live_shader(before.2));
        assert_eq!(backend.attached(active.program()), vec![before.1, active.fragment_stage()]);
        assert!(backend
            .shader_source(active.fragment_stage())
            .unwrap()
            .contains("vec4(0.0, fract(fTime)"));
        assert_eq!(manager.generation(), 2);
    }

    #[test]
    fn failed_relink_empties_manager_and_releases_everything() {
        let (_temp, backend, mut manager) = manager_with(&[("loop.frag", LOOP)]);
        manager.load("loop").unwrap();

        backend.fail_next_link();
        let err = manager.hot_swap().unwrap_err();
        assert!(matches!(err, ProgramError::Link { .. }));
        assert_eq!(manager.state(), ProgramState::Empty);
        assert_eq!(backend.live_programs(), 0);
        assert_eq!(backend.live_shaders(), 0);
        assert!(backend.max_fragment_attachments() <= 1);
    }

    #[test]
    fn failed_fragment_compile_during_hot_swap_empties_manager() {
        let (_temp, backend, mut manager) = manager_with(&[("loop.frag", LOOP)]);
        manager.load("loop").unwrap();

        backend.fail_next_compile(ShaderStage::Fragment);
        let err = manager.hot_swap().unwrap_err();
        assert!(matches!(err, ProgramError::Compile { stage: ShaderStage::Fragment, .. }));
        assert_eq!(manager.state(), ProgramState::Empty);
        assert_eq!(backend.live_programs(), 0);
        assert_eq!(backend.live_shaders(), 0);
    }

    #[test]
    fn hot_swap_from_empty_falls_back_to_full_load() {
        let (_temp, backend, mut manager) = manager_with(&[("loop.frag", LOOP)]);
        manager.load("loop").unwrap();
        backend.fail_next_link();
        manager.hot_swap().unwrap_err();
        assert!(!manager.is_loaded());

        manager.hot_swap().unwrap();
        assert!(manager.is_loaded());
        assert_eq!(backend.live_programs(), 1);
    }

    #[test]
    fn hot_swap_without_selection_is_an_error() {
        let (_temp, _backend, mut manager) = manager_with(&[]);
        assert!(matches!(manager.hot_swap(), Err(ProgramError::NoShaderSelected)));
        assert!(matches!(manager.reload(), Err(ProgramError::NoShaderSelected)));
    }

    #[test]
    fn reload_replaces_every_handle() {
        let (_temp, backend, mut manager) = manager_with(&[("loop.frag", LOOP)]);
        manager.load("loop").unwrap();
        let old_program = manager.active().unwrap().program();

        manager.reload().unwrap();
        assert_ne!(manager.active().unwrap().program(), old_program);
        assert_eq!(backend.live_programs(), 1);
        assert_eq!(backend.live_shaders(), 2);
    }

    #[test]
    fn teardown_is_idempotent() {
        let (_temp, backend, mut manager) = manager_with(&[("loop.frag", LOOP)]);
        manager.load("loop").unwrap();
        manager.teardown();
        manager.teardown();
        assert_eq!(manager.state(), ProgramState::Empty);
        assert_eq!(backend.live_programs(), 0);
        assert_eq!(backend.live_shaders(), 0);
        assert!(!manager.bind());
    }

    #[test]
    fn dropping_the_manager_releases_gpu_objects() {
        let (_temp, backend, mut manager) = manager_with(&[("loop.frag", LOOP)]);
        manager.load("loop").unwrap();
        drop(manager);
        assert_eq!(backend.live_programs(), 0);
        assert_eq!(backend.live_shaders(), 0);
    }

    #[test]
    fn loop_shader_frame_uploads_time_and_skips_stripped_uniforms() {
        use crate::runtime::FrameClock;
        use crate::uniforms::UniformValue;

        let (_temp, backend, mut manager) = manager_with(&[("loop.frag", LOOP)]);
        backend.strip_uniform("vbFlags");
        manager.load("loop").unwrap();

        let mut clock = FrameClock::new();
        let mut table = UniformTable::new();
        let sample = clock.sample();
        table.set(Uniform::Time, UniformValue::Float(sample.seconds));
        table.sync(&manager);
        assert_eq!(table.location(Uniform::Flags).raw(), -1);

        assert!(manager.bind());
        assert_eq!(backend.bound_program(), manager.active().map(|p| p.program()));
        backend.clear_uploads();
        table.push(backend.as_ref());
        manager.unbind();

        let uploads = backend.uploads();
        let time = uploads
            .iter()
            .find(|(location, _)| backend.uniform_name(*location).as_deref() == Some("fTime"))
            .map(|(_, value)| value.clone());
        match time {
            Some(UniformValue::Float(seconds)) => assert!(seconds >= 0.0),
            other => panic!("fTime not uploaded: {other:?}"),
        }
        assert!(uploads
            .iter()
            .all(|(location, _)| backend.uniform_name(*location).as_deref() != Some("vbFlags")));
        assert_eq!(uploads.len(), Uniform::ALL.len() - 1);
        assert_eq!(backend.bound_program(), None);
    }

    #[test]
    fn uniform_locations_follow_program_generation() {
        let (_temp, backend, mut manager) = manager_with(&[("loop.frag", LOOP)]);
        backend.strip_uniform("fZoom");
        manager.load("loop").unwrap();

        let mut table = UniformTable::new();
        table.sync(&manager);
        assert!(table.location(Uniform::Time).is_present());
        assert!(!table.location(Uniform::Zoom).is_present());

        manager.hot_swap().unwrap();
        table.sync(&manager);
        assert!(table.location(Uniform::Time).is_present());

        manager.teardown();
        table.sync(&manager);
        assert!(!table.location(Uniform::Time).is_present());
    }
}
