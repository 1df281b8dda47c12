//! Wall-clock timing of grid passes and whole ticks.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::trace;

/// Number of recent ticks kept for the rolling average
pub const DEFAULT_TIMING_WINDOW: usize = 120;

/// Times a named section of a tick; the duration is traced on drop.
pub struct ProfilerScope {
    label: &'static str,
    started: Instant,
}

impl ProfilerScope {
    /// Start timing `label`
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }

    /// Milliseconds since the scope was opened
    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope {
    fn drop(&mut self) {
        trace!(scope = self.label, elapsed_ms = self.elapsed_ms(), "profiler scope");
    }
}

/// Tick durations: the latest, a rolling window and the lifetime mean.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    recent: VecDeque<f64>,
    window: usize,
    total_ms: f64,
    frames: u64,
}

impl FrameTimer {
    /// Timer with the default rolling window
    pub fn new() -> Self {
        Self::with_window(DEFAULT_TIMING_WINDOW)
    }

    /// Timer whose rolling average covers the last `window` ticks (at least one)
    pub fn with_window(window: usize) -> Self {
        let window = window.max(1);
        Self {
            recent: VecDeque::with_capacity(window),
            window,
            total_ms: 0.0,
            frames: 0,
        }
    }

    /// Add one tick duration
    pub fn record(&mut self, time_ms: f64) {
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(time_ms);
        self.total_ms += time_ms;
        self.frames += 1;
    }

    /// Duration of the most recent tick, 0 before the first
    pub fn last_frame_time_ms(&self) -> f64 {
        self.recent.back().copied().unwrap_or(0.0)
    }

    /// Mean over every recorded tick
    pub fn average_frame_time_ms(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.total_ms / self.frames as f64
    }

    /// Mean over the rolling window
    pub fn rolling_average_ms(&self) -> f64 {
        if self.recent.is_empty() {
            return 0.0;
        }
        self.recent.iter().sum::<f64>() / self.recent.len() as f64
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
