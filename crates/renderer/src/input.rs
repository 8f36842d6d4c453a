//! Keyboard and mouse state exposed to shaders, and the key bindings that
//! drive the render loop.
use glam::Vec2;
use winit::keyboard::KeyCode;

use crate::uniforms::{
    Uniform, UniformTable, UniformValue, DIRECTION_KEY_COUNT, FLAG_COUNT, MOUSE_BUTTON_COUNT,
};

/// Number of values `iMode` cycles through.
pub const MODE_COUNT: i32 = 3;
/// Zoom factor applied per wheel notch or key press.
pub const ZOOM_STEP: f32 = 1.1;
/// Finer factor used while Shift is held.
pub const FINE_ZOOM_STEP: f32 = 1.01;
pub const MIN_ZOOM: f32 = 1e-6;
pub const MAX_ZOOM: f32 = 1e6;
/// Centre units travelled per second at zoom 1.
pub const PAN_SPEED: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    fn vector(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::Y,
            Direction::Down => Vec2::NEG_Y,
            Direction::Left => Vec2::NEG_X,
            Direction::Right => Vec2::X,
        }
    }
}

const DIRECTIONS: [Direction; DIRECTION_KEY_COUNT] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

/// What a key does in the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Hide the window and return to the prompt.
    Exit,
    /// Recompile the fragment stage and relink.
    HotSwap,
    /// Rebuild the whole program.
    FullReload,
    ToggleSync,
    ResetInput,
    ToggleFullscreen,
    ToggleFlag(usize),
    /// Held while the key is down.
    Pan(Direction),
    ZoomIn,
    ZoomOut,
    CycleMode,
    Increment,
    Decrement,
}

impl KeyAction {
    /// Whether auto-repeat presses trigger the action again.
    pub fn repeats(self) -> bool {
        matches!(
            self,
            KeyAction::ZoomIn | KeyAction::ZoomOut | KeyAction::Increment | KeyAction::Decrement
        )
    }
}

pub fn action_for_key(code: KeyCode, shift: bool) -> Option<KeyAction> {
    let action = match code {
        KeyCode::Escape => KeyAction::Exit,
        KeyCode::F5 if shift => KeyAction::FullReload,
        KeyCode::F5 => KeyAction::HotSwap,
        KeyCode::F8 => KeyAction::ToggleSync,
        KeyCode::F9 => KeyAction::ResetInput,
        KeyCode::F11 => KeyAction::ToggleFullscreen,
        KeyCode::Digit0 | KeyCode::Numpad0 => KeyAction::ToggleFlag(0),
        KeyCode::Digit1 | KeyCode::Numpad1 => KeyAction::ToggleFlag(1),
        KeyCode::Digit2 | KeyCode::Numpad2 => KeyAction::ToggleFlag(2),
        KeyCode::Digit3 | KeyCode::Numpad3 => KeyAction::ToggleFlag(3),
        KeyCode::Digit4 | KeyCode::Numpad4 => KeyAction::ToggleFlag(4),
        KeyCode::Digit5 | KeyCode::Numpad5 => KeyAction::ToggleFlag(5),
        KeyCode::Digit6 | KeyCode::Numpad6 => KeyAction::ToggleFlag(6),
        KeyCode::Digit7 | KeyCode::Numpad7 => KeyAction::ToggleFlag(7),
        KeyCode::Digit8 | KeyCode::Numpad8 => KeyAction::ToggleFlag(8),
        KeyCode::Digit9 | KeyCode::Numpad9 => KeyAction::ToggleFlag(9),
        KeyCode::ArrowUp => KeyAction::Pan(Direction::Up),
        KeyCode::ArrowDown => KeyAction::Pan(Direction::Down),
        KeyCode::ArrowLeft => KeyAction::Pan(Direction::Left),
        KeyCode::ArrowRight => KeyAction::Pan(Direction::Right),
        KeyCode::Equal | KeyCode::NumpadAdd => KeyAction::ZoomIn,
        KeyCode::Minus | KeyCode::NumpadSubtract => KeyAction::ZoomOut,
        KeyCode::KeyM => KeyAction::CycleMode,
        KeyCode::BracketRight => KeyAction::Increment,
        KeyCode::BracketLeft => KeyAction::Decrement,
        _ => return None,
    };
    Some(action)
}

/// Mouse buttons in `vbMousePressed` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseSlot {
    Left,
    Right,
    Middle,
}

impl MouseSlot {
    fn index(self) -> usize {
        match self {
            MouseSlot::Left => 0,
            MouseSlot::Right => 1,
            MouseSlot::Middle => 2,
        }
    }
}

/// Interactive state mirrored into the shader uniforms every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InputState {
    /// Cursor in pixels, bottom-left origin.
    mouse: Vec2,
    mouse_pressed: [bool; MOUSE_BUTTON_COUNT],
    keys_pressed: [bool; DIRECTION_KEY_COUNT],
    flags: [bool; FLAG_COUNT],
    mode: i32,
    increment: i32,
    zoom: f32,
    center: Vec2,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            mouse: Vec2::ZERO,
            mouse_pressed: [false; MOUSE_BUTTON_COUNT],
            keys_pressed: [false; DIRECTION_KEY_COUNT],
            flags: [false; FLAG_COUNT],
            mode: 0,
            increment: 0,
            zoom: 1.0,
            center: Vec2::ZERO,
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a cursor position reported in window coordinates (top-left
    /// origin) for a viewport `height` pixels tall.
    pub fn set_cursor(&mut self, x: f32, y: f32, height: u32) {
        self.mouse = Vec2::new(x, height as f32 - y);
    }

    pub fn set_mouse_button(&mut self, slot: MouseSlot, pressed: bool) {
        self.mouse_pressed[slot.index()] = pressed;
    }

    pub fn set_direction(&mut self, direction: Direction, pressed: bool) {
        self.keys_pressed[direction.index()] = pressed;
    }

    pub fn toggle_flag(&mut self, index: usize) {
        if let Some(flag) = self.flags.get_mut(index) {
            *flag = !*flag;
        }
    }

    pub fn cycle_mode(&mut self) {
        self.mode = (self.mode + 1).rem_euclid(MODE_COUNT);
    }

    pub fn step_increment(&mut self, by: i32) {
        self.increment = self.increment.saturating_add(by);
    }

    /// Multiplies the zoom by one step per notch; negative notches zoom out.
    pub fn zoom_by(&mut self, notches: f32, fine: bool) {
        let step = if fine { FINE_ZOOM_STEP } else { ZOOM_STEP };
        self.zoom = (self.zoom * step.powf(notches)).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Moves the centre along every held direction. Panning slows down as the
    /// zoom grows so on-screen speed stays constant.
    pub fn advance(&mut self, delta_seconds: f32) {
        let heading: Vec2 = DIRECTIONS
            .iter()
            .filter(|direction| self.keys_pressed[direction.index()])
            .map(|direction| direction.vector())
            .sum();
        self.center += heading * PAN_SPEED * delta_seconds / self.zoom;
    }

    /// Back to the initial state; the cursor position is kept.
    pub fn reset(&mut self) {
        *self = Self {
            mouse: self.mouse,
            ..Self::default()
        };
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn mode(&self) -> i32 {
        self.mode
    }

    pub fn increment(&self) -> i32 {
        self.increment
    }

    pub fn flag(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    pub fn write_uniforms(&self, table: &mut UniformTable) {
        table.set(Uniform::Mouse, UniformValue::Vec2(self.mouse));
        table.set(Uniform::Center, UniformValue::Vec2(self.center));
        table.set(Uniform::Zoom, UniformValue::Float(self.zoom));
        table.set(Uniform::Mode, UniformValue::Int(self.mode));
        table.set(Uniform::Increment, UniformValue::Int(self.increment));
        table.set(Uniform::MousePressed, int_array(&self.mouse_pressed));
        table.set(Uniform::KeyPressed, int_array(&self.keys_pressed));
        table.set(Uniform::Flags, int_array(&self.flags));
    }
}

fn int_array(values: &[bool]) -> UniformValue {
    UniformValue::IntArray(values.iter().map(|&set| i32::from(set)).collect())
}
