// (C) 2025 - Enzo Lombardi

//! Per-frame performance accounting - rolling FPS window and drop
//! detection feeding the debug overlay.

use std::collections::VecDeque;
use std::time::Duration;

const WINDOW: usize = 60;

/// One frame's timing breakdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSample {
    pub total: Duration,
    pub pattern: Duration,
    pub terminal: Duration,
    pub changed_cells: u32,
}

/// Rolling window of frame samples.
pub struct PerformanceMonitor {
    samples: VecDeque<FrameSample>,
    frames: u64,
    dropped: u64,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(WINDOW),
            frames: 0,
            dropped: 0,
        }
    }

    pub fn record(&mut self, sample: FrameSample) {
        if self.samples.len() == WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.frames += 1;
    }

    pub fn record_drop(&mut self) {
        self.dropped += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Average frames per second over the window; 0.0 until the first
    /// sample lands.
    pub fn fps(&self) -> f64 {
        let total: Duration = self.samples.iter().map(|s| s.total).sum();
        if total.is_zero() || self.samples.is_empty() {
            return 0.0;
        }
        self.samples.len() as f64 / total.as_secs_f64()
    }

    pub fn avg_frame_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: Duration = self.samples.iter().map(|s| s.total).sum();
        total.as_secs_f64() * 1000.0 / self.samples.len() as f64
    }

    pub fn last(&self) -> Option<FrameSample> {
        self.samples.back().copied()
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}
