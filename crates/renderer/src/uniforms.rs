//! Uniform table shared by every shader the playground runs.
//!
//! The harness declares a fixed set of uniforms; [`UniformTable`] keeps one
//! slot per semantic entry with the value to upload and the location resolved
//! against the current program. Values survive program reloads, locations do
//! not.
use std::collections::HashMap;
use std::mem;

use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use tracing::{debug, trace};

use crate::gpu::GraphicsBackend;
use crate::program::ProgramManager;

/// Number of mouse buttons tracked (`left`, `right`, `middle`).
pub const MOUSE_BUTTON_COUNT: usize = 3;
/// Number of directional keys tracked (`up`, `down`, `left`, `right`).
pub const DIRECTION_KEY_COUNT: usize = 4;
/// Number of user toggles bound to the digit keys.
pub const FLAG_COUNT: usize = 10;

/// Semantic identity of every uniform the harness declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    Mvp,
    Model,
    View,
    Projection,
    Mouse,
    Center,
    Resolution,
    Time,
    Delta,
    Ratio,
    Zoom,
    Increment,
    Mode,
    MousePressed,
    KeyPressed,
    Flags,
}

impl Uniform {
    pub const ALL: [Uniform; 16] = [
        Uniform::Mvp,
        Uniform::Model,
        Uniform::View,
        Uniform::Projection,
        Uniform::Mouse,
        Uniform::Center,
        Uniform::Resolution,
        Uniform::Time,
        Uniform::Delta,
        Uniform::Ratio,
        Uniform::Zoom,
        Uniform::Increment,
        Uniform::Mode,
        Uniform::MousePressed,
        Uniform::KeyPressed,
        Uniform::Flags,
    ];

    /// Identifier used in GLSL source.
    pub fn glsl_name(self) -> &'static str {
        match self {
            Uniform::Mvp => "MVP",
            Uniform::Model => "M",
            Uniform::View => "V",
            Uniform::Projection => "P",
            Uniform::Mouse => "ivMouse",
            Uniform::Center => "fvCenter",
            Uniform::Resolution => "uvResolution",
            Uniform::Time => "fTime",
            Uniform::Delta => "fDelta",
            Uniform::Ratio => "fRatio",
            Uniform::Zoom => "fZoom",
            Uniform::Increment => "iIncrement",
            Uniform::Mode => "iMode",
            Uniform::MousePressed => "vbMousePressed",
            Uniform::KeyPressed => "vbKeyPressed",
            Uniform::Flags => "vbFlags",
        }
    }

    /// Value held before anything writes the slot.
    pub fn default_value(self) -> UniformValue {
        match self {
            Uniform::Mvp | Uniform::Model | Uniform::View | Uniform::Projection => {
                UniformValue::Mat4(Mat4::ZERO)
            }
            Uniform::Mouse | Uniform::Center | Uniform::Resolution => {
                UniformValue::Vec2(Vec2::ZERO)
            }
            Uniform::Zoom => UniformValue::Float(1.0),
            Uniform::Time | Uniform::Delta | Uniform::Ratio => UniformValue::Float(0.0),
            Uniform::Increment | Uniform::Mode => UniformValue::Int(0),
            Uniform::MousePressed => UniformValue::IntArray(vec![0; MOUSE_BUTTON_COUNT]),
            Uniform::KeyPressed => UniformValue::IntArray(vec![0; DIRECTION_KEY_COUNT]),
            Uniform::Flags => UniformValue::IntArray(vec![0; FLAG_COUNT]),
        }
    }
}

/// Location of a uniform inside a linked program. Negative means absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(i32);

impl UniformLocation {
    pub const ABSENT: UniformLocation = UniformLocation(-1);

    pub fn new(raw: i32) -> Self {
        if raw < 0 {
            Self::ABSENT
        } else {
            Self(raw)
        }
    }

    pub fn is_present(self) -> bool {
        self.0 >= 0
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    /// Driver index, when present.
    pub fn index(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }
}

impl Default for UniformLocation {
    fn default() -> Self {
        Self::ABSENT
    }
}

/// Tagged uniform payload. Integer arrays keep their length fixed by the
/// harness declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
    IntArray(Vec<i32>),
}

impl UniformValue {
    fn same_kind(&self, other: &UniformValue) -> bool {
        match (self, other) {
            (UniformValue::IntArray(a), UniformValue::IntArray(b)) => a.len() == b.len(),
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformSlot {
    pub location: UniformLocation,
    pub value: UniformValue,
}

/// Map from [`Uniform`] to its slot.
#[derive(Debug, Clone)]
pub struct UniformTable {
    slots: HashMap<Uniform, UniformSlot>,
    resolved_generation: Option<u64>,
}

impl Default for UniformTable {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformTable {
    pub fn new() -> Self {
        let slots = Uniform::ALL
            .iter()
            .map(|&uniform| {
                (
                    uniform,
                    UniformSlot {
                        location: UniformLocation::ABSENT,
                        value: uniform.default_value(),
                    },
                )
            })
            .collect();
        Self {
            slots,
            resolved_generation: None,
        }
    }

    /// Replaces the value stored for `uniform`. The variant must match the one
    /// the harness declares.
    pub fn set(&mut self, uniform: Uniform, value: UniformValue) {
        if let Some(slot) = self.slots.get_mut(&uniform) {
            debug_assert!(
                slot.value.same_kind(&value),
                "uniform {} written with {:?}, expected the shape of {:?}",
                uniform.glsl_name(),
                value,
                slot.value
            );
            slot.value = value;
        }
    }

    pub fn value(&self, uniform: Uniform) -> Option<&UniformValue> {
        self.slots.get(&uniform).map(|slot| &slot.value)
    }

    pub fn location(&self, uniform: Uniform) -> UniformLocation {
        self.slots
            .get(&uniform)
            .map(|slot| slot.location)
            .unwrap_or(UniformLocation::ABSENT)
    }

    /// Queries every location from `program`, which must be linked.
    pub fn resolve<B: GraphicsBackend>(&mut self, backend: &B, program: B::Program) {
        for (uniform, slot) in self.slots.iter_mut() {
            slot.location = backend.uniform_location(program, uniform.glsl_name());
            if !slot.location.is_present() {
                trace!(uniform = uniform.glsl_name(), "uniform not active in program");
            }
        }
    }

    /// Forgets every location. Values are kept.
    pub fn invalidate(&mut self) {
        for slot in self.slots.values_mut() {
            slot.location = UniformLocation::ABSENT;
        }
        self.resolved_generation = None;
    }

    /// Brings locations in line with whatever program `manager` currently
    /// holds, re-resolving after every successful link.
    pub fn sync<B: GraphicsBackend>(&mut self, manager: &ProgramManager<B>) {
        match manager.active() {
            Some(active) => {
                if self.resolved_generation != Some(manager.generation()) {
                    self.resolve(manager.backend(), active.program());
                    self.resolved_generation = Some(manager.generation());
                    debug!(
                        generation = manager.generation(),
                        active = self.active_count(),
                        "resolved uniform locations"
                    );
                }
            }
            None => {
                if self.resolved_generation.is_some() {
                    self.invalidate();
                }
            }
        }
    }

    /// Uploads every slot with a present location to the bound program.
    pub fn push<B: GraphicsBackend>(&self, backend: &B) {
        for slot in self.slots.values() {
            if slot.location.is_present() {
                backend.set_uniform(slot.location, &slot.value);
            }
        }
    }

    fn active_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| slot.location.is_present())
            .count()
    }
}
