//! Frame-rate meter for the render loop.
//!
//! Records the instant of every drawn frame over a rolling window and
//! derives frames/second. The session reports this as its frame-rate
//! metric and resets it whenever the screen stops being shown.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Rolling-window frames-per-second estimator.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    /// Draw instants inside the window, oldest first.
    samples: VecDeque<Instant>,
    /// Window duration.
    window: Duration,
}

impl FpsMeter {
    /// Create a meter with a 1-second rolling window.
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    /// Create a meter with a custom window duration.
    pub fn with_window(window: Duration) -> Self {
        Self {
            samples: VecDeque::with_capacity(128),
            window,
        }
    }

    /// Record that a frame was drawn now.
    pub fn record(&mut self) {
        self.record_at(Instant::now());
    }

    /// Record with an explicit timestamp (useful for testing).
    pub fn record_at(&mut self, when: Instant) {
        self.samples.push_back(when);
        self.evict(when);
    }

    /// Frames per second over the window, or `None` until two frames
    /// have been drawn.
    pub fn fps(&self) -> Option<f64> {
        let (first, last) = match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) if self.samples.len() >= 2 => (*first, *last),
            _ => return None,
        };
        let elapsed = last.duration_since(first);
        if elapsed.is_zero() {
            return None;
        }
        Some((self.samples.len() - 1) as f64 / elapsed.as_secs_f64())
    }

    /// Forget every sample; [`fps`](Self::fps) returns `None` afterwards.
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Number of samples currently in the window.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    // ── Internal ─────────────────────────────────────────────────

    fn evict(&mut self, now: Instant) {
        while let Some(&ts) = self.samples.front() {
            if now.duration_since(ts) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────
