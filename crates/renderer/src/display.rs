/// Whether the window currently covers its monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Windowed,
    Fullscreen,
}

/// What the window has to do after a fullscreen toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTransition {
    EnterFullscreen,
    LeaveFullscreen { restore: (u32, u32) },
}

/// Tracks the window mode and the windowed size to come back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayState {
    mode: WindowMode,
    windowed_size: (u32, u32),
}

impl DisplayState {
    pub fn new(windowed_size: (u32, u32)) -> Self {
        Self {
            mode: WindowMode::Windowed,
            windowed_size,
        }
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    pub fn windowed_size(&self) -> (u32, u32) {
        self.windowed_size
    }

    /// Flips the mode. `current_size` is remembered when leaving windowed
    /// mode and handed back when returning to it.
    pub fn toggle(&mut self, current_size: (u32, u32)) -> DisplayTransition {
        match self.mode {
            WindowMode::Windowed => {
                if current_size.0 > 0 && current_size.1 > 0 {
                    self.windowed_size = current_size;
                }
                self.mode = WindowMode::Fullscreen;
                DisplayTransition::EnterFullscreen
            }
            WindowMode::Fullscreen => {
                self.mode = WindowMode::Windowed;
                DisplayTransition::LeaveFullscreen {
                    restore: self.windowed_size,
                }
            }
        }
    }
}
