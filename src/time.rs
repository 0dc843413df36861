// src/time.rs
//! Frame timing for the render loop.
//!
//! `FrameClock::tick` is called once per drawn frame. It tracks the raw frame
//! delta, a rolling average over the last `HISTORY` frames, and logs the
//! average at debug level every `log_interval`.

use std::time::{Duration, Instant};

const HISTORY: usize = 128;

/// Snapshot of timing data for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous tick.
    pub delta: f32,
    /// Seconds since the clock was created.
    pub total: f64,
    pub frame: u64,
}

#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    last_log: Instant,
    log_interval: Duration,
    frame: u64,
    // ring of frame times in seconds, 0.0 = unused slot
    history: [f32; HISTORY],
    index: usize,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::starting_at(Instant::now())
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last: start,
            last_log: start,
            log_interval: Duration::from_secs(5),
            frame: 0,
            history: [0.0; HISTORY],
            index: 0,
        }
    }

    #[inline]
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let delta = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        self.frame += 1;
        self.history[self.index] = delta;
        self.index = (self.index + 1) % HISTORY;

        if now.saturating_duration_since(self.last_log) >= self.log_interval {
            self.last_log = now;
            let (fps, ms) = self.averaged();
            log::debug!("Frame {}: {:.1} fps ({:.2} ms)", self.frame, fps, ms);
        }

        FrameTime {
            delta,
            total: now.saturating_duration_since(self.start).as_secs_f64(),
            frame: self.frame,
        }
    }

    /// Average fps and frame time in milliseconds over recent frames.
    pub fn averaged(&self) -> (f32, f32) {
        let (sum, count) = self
            .history
            .iter()
            .filter(|&&t| t > 0.0)
            .fold((0.0f32, 0u32), |(s, c), &t| (s + t, c + 1));
        if count == 0 {
            return (0.0, 0.0);
        }
        let avg = sum / count as f32;
        (1.0 / avg, avg * 1000.0)
    }
}
