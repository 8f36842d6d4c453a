//! In-memory backend that records every call, for exercising the program
//! lifecycle without a graphics context.
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use super::{GraphicsBackend, ShaderStage};
use crate::uniforms::{UniformLocation, UniformValue};

#[derive(Debug, Default)]
struct Recorded {
    next_id: u32,
    created: usize,
    shaders: BTreeMap<u32, (ShaderStage, String)>,
    programs: BTreeSet<u32>,
    attachments: BTreeMap<u32, Vec<u32>>,
    /// Uniform names visible in each successfully linked program.
    linked: BTreeMap<u32, Vec<String>>,
    locations: Vec<String>,
    stripped: BTreeSet<String>,
    fail_compile: Option<ShaderStage>,
    fail_link: bool,
    bound: Option<u32>,
    uploads: Vec<(UniformLocation, UniformValue)>,
    max_fragment_attachments: usize,
}

impl Recorded {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.created += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    state: RefCell<Recorded>,
}

impl RecordingBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_next_compile(&self, stage: ShaderStage) {
        self.state.borrow_mut().fail_compile = Some(stage);
    }

    pub(crate) fn fail_next_link(&self) {
        self.state.borrow_mut().fail_link = true;
    }

    /// Pretends the driver optimised `name` away in every program linked from
    /// now on.
    pub(crate) fn strip_uniform(&self, name: &str) {
        self.state.borrow_mut().stripped.insert(name.to_string());
    }

    /// Links a throwaway program whose fragment stage declares `names`.
    pub(crate) fn linked_program_declaring(&self, names: &[&str]) -> u32 {
        let source: String = names
            .iter()
            .map(|name| format!("uniform float {name};\n"))
            .collect();
        let shader = self.create_shader(ShaderStage::Fragment).unwrap();
        assert!(self.compile_shader(shader, &source));
        let program = self.create_program().unwrap();
        self.attach_shader(program, shader);
        assert!(self.link_program(program));
        program
    }

    pub(crate) fn created_objects(&self) -> usize {
        self.state.borrow().created
    }

    pub(crate) fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub(crate) fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub(crate) fn is_live_shader(&self, shader: u32) -> bool {
        self.state.borrow().shaders.contains_key(&shader)
    }

    pub(crate) fn is_linked(&self, program: u32) -> bool {
        self.state.borrow().linked.contains_key(&program)
    }

    pub(crate) fn attached(&self, program: u32) -> Vec<u32> {
        self.state
            .borrow()
            .attachments
            .get(&program)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn shader_source(&self, shader: u32) -> Option<String> {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|(_, source)| source.clone())
    }

    pub(crate) fn bound_program(&self) -> Option<u32> {
        self.state.borrow().bound
    }

    pub(crate) fn uploads(&self) -> Vec<(UniformLocation, UniformValue)> {
        self.state.borrow().uploads.clone()
    }

    pub(crate) fn clear_uploads(&self) {
        self.state.borrow_mut().uploads.clear();
    }

    /// Largest number of fragment stages ever attached to one program at once.
    pub(crate) fn max_fragment_attachments(&self) -> usize {
        self.state.borrow().max_fragment_attachments
    }

    pub(crate) fn uniform_name(&self, location: UniformLocation) -> Option<String> {
        let index = location.index()? as usize;
        self.state.borrow().locations.get(index).cloned()
    }
}

fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source.lines().filter_map(|line| {
        let declaration = line.trim().strip_prefix("uniform ")?;
        let name = declaration
            .trim_end_matches(';')
            .split_whitespace()
            .last()?;
        let name = name.split('[').next()?;
        Some(name.to_string())
    })
}

impl GraphicsBackend for RecordingBackend {
    type Shader = u32;
    type Program = u32;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.shaders.insert(id, (stage, String::new()));
        Ok(id)
    }

    fn compile_shader(&self, shader: u32, source: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some((stage, stored)) = state.shaders.get_mut(&shader) else {
            return false;
        };
        *stored = source.to_string();
        let stage = *stage;
        if state.fail_compile == Some(stage) {
            state.fail_compile = None;
            return false;
        }
        true
    }

    fn shader_info_log(&self, shader: u32) -> String {
        format!("0:1(1): error: shader {shader} rejected")
    }

    fn delete_shader(&self, shader: u32) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.programs.insert(id);
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        let attached = state.attachments.entry(program).or_default();
        attached.push(shader);
        let attached = attached.clone();
        let fragments = attached
            .iter()
            .filter(|id| matches!(state.shaders.get(id), Some((ShaderStage::Fragment, _))))
            .count();
        state.max_fragment_attachments = state.max_fragment_attachments.max(fragments);
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        if let Some(attached) = self.state.borrow_mut().attachments.get_mut(&program) {
            attached.retain(|id| *id != shader);
        }
    }

    fn link_program(&self, program: u32) -> bool {
        let mut state = self.state.borrow_mut();
        state.linked.remove(&program);
        if state.fail_link {
            state.fail_link = false;
            return false;
        }
        let attached = state.attachments.get(&program).cloned().unwrap_or_default();
        let names: Vec<String> = attached
            .iter()
            .filter_map(|id| state.shaders.get(id))
            .flat_map(|(_, source)| declared_uniforms(source).collect::<Vec<_>>())
            .filter(|name| !state.stripped.contains(name))
            .collect();
        state.linked.insert(program, names);
        true
    }

    fn program_info_log(&self, program: u32) -> String {
        format!("error: program {program} failed to link")
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        state.attachments.remove(&program);
        state.linked.remove(&program);
        if state.bound == Some(program) {
            state.bound = None;
        }
    }

    fn use_program(&self, program: Option<u32>) {
        self.state.borrow_mut().bound = program;
    }

    fn uniform_location(&self, program: u32, name: &str) -> UniformLocation {
        let mut state = self.state.borrow_mut();
        let visible = state
            .linked
            .get(&program)
            .is_some_and(|names| names.iter().any(|declared| declared == name));
        if !visible {
            return UniformLocation::ABSENT;
        }
        let index = match state.locations.iter().position(|known| known == name) {
            Some(index) => index,
            None => {
                state.locations.push(name.to_string());
                state.locations.len() - 1
            }
        };
        UniformLocation::new(index as i32)
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let mut state = self.state.borrow_mut();
        assert!(state.bound.is_some(), "uniform uploaded with no program bound");
        state.uploads.push((location, value.clone()));
    }
}
