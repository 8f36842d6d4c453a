use std::time::{Duration, Instant};

/// How buffer swaps line up with the display refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// Wait for one vertical blank per swap.
    #[default]
    Vsync,
    /// Swap as soon as the frame is done.
    Immediate,
}

impl SyncPolicy {
    pub fn toggled(self) -> Self {
        match self {
            SyncPolicy::Vsync => SyncPolicy::Immediate,
            SyncPolicy::Immediate => SyncPolicy::Vsync,
        }
    }
}

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Seconds since the render loop was entered.
    pub seconds: f32,
    /// Time since the previous sample.
    pub delta: Duration,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Delta in milliseconds, the unit `fDelta` is expressed in.
    pub fn delta_millis(&self) -> f32 {
        self.delta.as_secs_f32() * 1000.0
    }
}

/// Monotonic frame clock. Time zero is the last [`FrameClock::reset`].
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    origin: Instant,
    last: Instant,
    frame: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(origin: Instant) -> Self {
        Self {
            origin,
            last: origin,
            frame: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn sample(&mut self) -> TimeSample {
        self.sample_at(Instant::now())
    }

    /// Samples the clock as if the current time were `now`. Instants earlier
    /// than the previous sample yield a zero delta.
    pub fn sample_at(&mut self, now: Instant) -> TimeSample {
        let sample = TimeSample {
            seconds: now.saturating_duration_since(self.origin).as_secs_f32(),
            delta: now.saturating_duration_since(self.last),
            frame_index: self.frame,
        };
        self.last = now.max(self.last);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}
