//! Game clock: tick counting and conversion of real-time rates to ticks.

/// Default tick length in milliseconds.
pub const DEFAULT_TICK_MS: u64 = 50;

/// A real-time interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
    Millis(u64),
    Seconds(f32),
}

impl Rate {
    pub fn as_millis(self) -> u64 {
        match self {
            Rate::Millis(ms) => ms,
            Rate::Seconds(s) => (s.max(0.0) * 1000.0).round() as u64,
        }
    }
}

/// Tick counter plus the tick length used to convert rates.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    tick_ms: u64,
    tick: u64,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_MS)
    }
}

impl Clock {
    pub fn new(tick_ms: u64) -> Self {
        Self {
            tick_ms: tick_ms.max(1),
            tick: 0,
        }
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Move to the next tick and return it.
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Number of ticks covering `rate`, rounded up.
    pub fn rate_to_ticks(&self, rate: Rate) -> u64 {
        rate.as_millis().div_ceil(self.tick_ms)
    }
}
