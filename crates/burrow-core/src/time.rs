//! Animation Timing
//!
//! The tunnel advances by a fixed amount per tick, so playback speed is set
//! by how many ticks run per second rather than by frame delta. This module
//! provides:
//! - Fixed-step tick accumulation decoupled from display rate
//! - Pause and time scale
//! - A wall-clock stopwatch for playback reports

use std::time::{Duration, Instant};

/// Delta time wrapper for type safety
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaTime(pub f64);

impl DeltaTime {
    /// Create a new delta time from seconds
    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    /// Get the delta time in seconds
    pub fn as_secs(&self) -> f64 {
        self.0
    }
}

/// Fixed time step configuration
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeStep {
    /// Fixed timestep in seconds
    pub step: f64,
    /// Maximum number of ticks per frame (to prevent spiral of death)
    pub max_updates: u32,
}

impl Default for FixedTimeStep {
    fn default() -> Self {
        Self::from_hz(30.0)
    }
}

impl FixedTimeStep {
    /// Create a new fixed time step with the given frequency
    pub fn from_hz(hz: f64) -> Self {
        Self {
            step: 1.0 / hz,
            max_updates: 8,
        }
    }

    /// Set the maximum number of updates per frame
    pub fn with_max_updates(mut self, max: u32) -> Self {
        self.max_updates = max;
        self
    }
}

/// Accumulates display-frame time and hands out animation ticks
#[derive(Debug, Clone)]
pub struct AnimationClock {
    step: FixedTimeStep,
    /// Scaled time not yet consumed by ticks
    accumulator: f64,
    /// Total scaled time
    total_time: f64,
    frame_count: u64,
    tick_count: u64,
    /// Ticks discarded because a frame exceeded `max_updates`
    dropped_ticks: u64,
    time_scale: f64,
    paused: bool,
}

impl AnimationClock {
    /// Create a clock ticking at the given fixed step
    pub fn new(step: FixedTimeStep) -> Self {
        Self {
            step,
            accumulator: 0.0,
            total_time: 0.0,
            frame_count: 0,
            tick_count: 0,
            dropped_ticks: 0,
            time_scale: 1.0,
            paused: false,
        }
    }

    /// Feed one display frame's delta and return how many ticks to run.
    ///
    /// The delta is clamped to `[0.0001, 0.25]` seconds. Ticks beyond
    /// `max_updates` are dropped along with their accumulated time.
    pub fn update(&mut self, delta: DeltaTime) -> u32 {
        let clamped = delta.as_secs().clamp(0.0001, 0.25);
        let scaled = if self.paused { 0.0 } else { clamped * self.time_scale };

        self.total_time += scaled;
        self.accumulator += scaled;
        self.frame_count += 1;

        // Whole ticks due; the float-to-int cast saturates for tiny steps
        let due = (self.accumulator / self.step.step).floor();
        if due < 1.0 {
            return 0;
        }
        let due_ticks = due as u64;
        let ticks = due_ticks.min(u64::from(self.step.max_updates)) as u32;
        let dropped = due_ticks - u64::from(ticks);
        self.accumulator = (self.accumulator - due * self.step.step).max(0.0);

        self.tick_count += u64::from(ticks);
        self.dropped_ticks = self.dropped_ticks.saturating_add(dropped);

        if dropped > 0 {
            log::trace!("Frame {} dropped {} ticks over the cap", self.frame_count, dropped);
        }
        ticks
    }

    /// Fraction of the next tick already accumulated, for interpolation
    pub fn interpolation(&self) -> f64 {
        (self.accumulator / self.step.step).clamp(0.0, 1.0)
    }

    /// Get the fixed step
    pub fn step(&self) -> FixedTimeStep {
        self.step
    }

    /// Total scaled time fed to the clock
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Display frames seen
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Ticks handed out
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Ticks dropped by the per-frame cap
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }

    /// Get the time scale
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Set the time scale
    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.max(0.0);
    }

    /// Check if the clock is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new(FixedTimeStep::default())
    }
}

/// Stopwatch for measuring elapsed time
#[derive(Debug, Clone)]
pub struct Stopwatch {
    start: Instant,
    elapsed: Duration,
    running: bool,
}

impl Stopwatch {
    /// Create and start a new stopwatch
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Duration::ZERO,
            running: true,
        }
    }

    /// Stop the stopwatch
    pub fn stop(&mut self) {
        if self.running {
            self.elapsed += self.start.elapsed();
            self.running = false;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        if self.running {
            self.elapsed + self.start.elapsed()
        } else {
            self.elapsed
        }
    }

    /// Check if the stopwatch is running
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
