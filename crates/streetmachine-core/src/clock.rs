use std::time::Instant;

/// Default simulation rate in Hz.
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Monotonic millisecond clock consumed by the race timer.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Fixed-timestep clock: time only moves when the loop advances it.
#[derive(Debug, Clone)]
pub struct SimClock {
    ticks: u64,
    tick_rate: u32,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

impl SimClock {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            ticks: 0,
            tick_rate: tick_rate.max(1),
        }
    }

    /// Step one tick forward.
    pub fn advance(&mut self) {
        self.ticks += 1;
    }

    /// Step forward by whole milliseconds (rounded down to ticks).
    pub fn advance_ms(&mut self, ms: u64) {
        self.ticks += ms * self.tick_rate as u64 / 1000;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.ticks * 1000 / self.tick_rate as u64
    }
}

/// Wall clock based on `Instant`, starting at zero on creation.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Format milliseconds as `M:SS.mmm`.
pub fn format_millis(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!("{minutes}:{seconds:02}.{millis:03}")
}
