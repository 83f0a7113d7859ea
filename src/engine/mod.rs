// (C) 2025 - Enzo Lombardi

//! Animation engine - fixed-step frame loop, pattern lifecycle, resize
//! detection, perf accounting and the engine event bus.
//!
//! The engine is cooperative and single-threaded: the owning loop calls
//! [`AnimationEngine::tick`] as often as it likes; a frame only runs
//! when due and not paused. Within a frame the order is strict:
//! clear, pattern render (guarded), before-terminal-render callback,
//! diff emission, after-render callback, perf accounting.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::{Duration, Instant};

use crate::core::events::{EventBus, EventData, EventKind};
use crate::core::geometry::Point;
use crate::core::perf::{FrameSample, PerformanceMonitor};
use crate::patterns::Pattern;
use crate::terminal::TerminalRenderer;

pub const MIN_FPS: u32 = 10;
pub const MAX_FPS: u32 = 60;

/// Snapshot handed to the after-render callback each frame; carries
/// everything the debug overlay and the bottom-row arbiter need.
#[derive(Debug, Clone)]
pub struct FrameStats {
    pub frame: u64,
    pub pattern_name: &'static str,
    pub target_fps: u32,
    pub fps: f64,
    pub avg_frame_ms: f64,
    pub pattern_ms: f64,
    pub render_ms: f64,
    pub changed_cells: u32,
    pub dropped_frames: u64,
    pub render_errors: u32,
    pub paused: bool,
    pub switch_in_progress: bool,
    pub metrics: Vec<(&'static str, f64)>,
}

pub type RenderCallback = Box<dyn FnMut(&mut TerminalRenderer, &FrameStats)>;

/// Drives a pattern into the renderer at a target frame rate.
pub struct AnimationEngine {
    renderer: TerminalRenderer,
    bus: EventBus,
    perf: PerformanceMonitor,
    pattern: Box<dyn Pattern>,
    fps: u32,
    interval: Duration,
    next_tick: Instant,
    epoch: Instant,
    running: bool,
    paused: bool,
    frame: u64,
    mouse_pos: Option<Point>,
    last_frame_start: Option<Instant>,
    switch_guard: Option<Instant>,
    render_errors: HashMap<&'static str, u32>,
    before_render: Option<RenderCallback>,
    after_render: Option<RenderCallback>,
}

impl AnimationEngine {
    pub fn new(renderer: TerminalRenderer, pattern: Box<dyn Pattern>, fps: u32) -> Self {
        let fps = fps.clamp(MIN_FPS, MAX_FPS);
        let now = Instant::now();
        Self {
            renderer,
            bus: EventBus::new(),
            perf: PerformanceMonitor::new(),
            pattern,
            fps,
            interval: Duration::from_secs(1) / fps,
            next_tick: now,
            epoch: now,
            running: false,
            paused: false,
            frame: 0,
            mouse_pos: None,
            last_frame_start: None,
            switch_guard: None,
            render_errors: HashMap::new(),
            before_render: None,
            after_render: None,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
        self.next_tick = Instant::now();
        self.pattern.on_activate();
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Toggle pause. Emits `Pause` or `Resume`.
    pub fn pause(&mut self) {
        self.paused = !self.paused;
        if self.paused {
            self.bus.emit(EventKind::Pause, EventData::None);
        } else {
            self.next_tick = Instant::now();
            self.bus.emit(EventKind::Resume, EventData::None);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Change the target frame rate (clamped to 10..=60). Emits
    /// `FpsChange` exactly once per effective change.
    pub fn set_fps(&mut self, fps: u32) {
        let fps = fps.clamp(MIN_FPS, MAX_FPS);
        if fps == self.fps {
            return;
        }
        self.fps = fps;
        self.interval = Duration::from_secs(1) / fps;
        self.bus.emit(EventKind::FpsChange, EventData::Fps(fps));
        self.pattern.on_fps_change(fps);
    }

    pub fn frame_interval(&self) -> Duration {
        self.interval
    }

    pub fn set_before_render_callback(&mut self, cb: RenderCallback) {
        self.before_render = Some(cb);
    }

    pub fn set_after_render_callback(&mut self, cb: RenderCallback) {
        self.after_render = Some(cb);
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn perf(&self) -> &PerformanceMonitor {
        &self.perf
    }

    pub fn renderer_mut(&mut self) -> &mut TerminalRenderer {
        &mut self.renderer
    }

    pub fn pattern(&self) -> &dyn Pattern {
        self.pattern.as_ref()
    }

    pub fn pattern_mut(&mut self) -> &mut dyn Pattern {
        self.pattern.as_mut()
    }

    /// Record the latest mouse position; passed to `render` each frame.
    pub fn set_mouse_pos(&mut self, pos: Point) {
        self.mouse_pos = Some(pos);
        self.bus.emit(EventKind::MouseMove, EventData::Point(pos));
    }

    pub fn note_mouse_click(&mut self, pos: Point) {
        self.bus.emit(EventKind::MouseClick, EventData::Point(pos));
    }

    /// Monotonic milliseconds since engine creation; the `time`
    /// parameter patterns receive.
    pub fn time_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Whether a pattern switch happened within the last frame
    /// interval. The overlay arbiter suppresses itself while set.
    pub fn switch_in_progress(&self) -> bool {
        self.switch_guard
            .is_some_and(|t| t.elapsed() < self.interval)
    }

    /// Render-panic count for the active pattern.
    pub fn render_errors(&self) -> u32 {
        *self.render_errors.get(self.pattern.name()).unwrap_or(&0)
    }

    /// Swap in a new pattern with full lifecycle: deactivate + reset the
    /// old, reset + activate the new, hard clear, switch-guard armed.
    pub fn set_pattern(&mut self, pattern: Box<dyn Pattern>) {
        self.bus.emit(
            EventKind::PatternBeforeChange,
            EventData::Text(self.pattern.name().to_string()),
        );
        self.pattern.on_deactivate();
        self.pattern.reset();
        self.pattern = pattern;
        self.pattern.reset();
        self.pattern.on_activate();
        self.renderer.clear_screen();
        self.switch_guard = Some(Instant::now());
        self.bus.emit(
            EventKind::PatternChange,
            EventData::Text(self.pattern.name().to_string()),
        );
    }

    /// Announce a theme change on the bus (the executor swaps the
    /// rebuilt pattern separately).
    pub fn note_theme_change(&mut self, name: &str) {
        self.bus.emit(EventKind::ThemeChange, EventData::Text(name.to_string()));
    }

    /// Run one frame if due. Returns whether a frame ran.
    pub fn tick(&mut self) -> bool {
        if !self.running || self.paused {
            return false;
        }
        let tick_start = Instant::now();
        if tick_start < self.next_tick {
            return false;
        }

        self.frame += 1;
        self.bus.emit(EventKind::FrameStart, EventData::Frame(self.frame));

        // Resize detection happens here, not in patterns.
        if let Some(new_size) = self.renderer.refresh_size() {
            self.bus.emit(EventKind::Resize, EventData::Size(new_size));
            self.pattern.on_resize(new_size);
        }

        let size = self.renderer.size();
        let pattern_size = size.pattern_area();
        let time_ms = self.time_ms();
        let mouse = self.mouse_pos;

        self.renderer.buffer().clear();

        // Safe render wrapper: a panicking pattern costs one frame, not
        // the process.
        let pattern_start = Instant::now();
        let pattern = &mut self.pattern;
        let buf = self.renderer.buffer();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            pattern.render(buf, time_ms, pattern_size, mouse);
        }));
        let pattern_elapsed = pattern_start.elapsed();

        if outcome.is_err() {
            let name = self.pattern.name();
            let count = self.render_errors.entry(name).or_insert(0);
            *count += 1;
            log::warn!("pattern '{}' panicked during render ({} so far)", name, count);
            self.schedule_next(tick_start);
            return true;
        }

        let stats_base = |engine: &Self, pattern_elapsed: Duration| FrameStats {
            frame: engine.frame,
            pattern_name: engine.pattern.name(),
            target_fps: engine.fps,
            fps: engine.perf.fps(),
            avg_frame_ms: engine.perf.avg_frame_ms(),
            pattern_ms: pattern_elapsed.as_secs_f64() * 1000.0,
            render_ms: 0.0,
            changed_cells: 0,
            dropped_frames: engine.perf.dropped(),
            render_errors: engine.render_errors(),
            paused: engine.paused,
            switch_in_progress: engine.switch_in_progress(),
            metrics: engine.pattern.metrics(),
        };

        if let Some(mut cb) = self.before_render.take() {
            let stats = stats_base(self, pattern_elapsed);
            cb(&mut self.renderer, &stats);
            self.before_render = Some(cb);
        }

        let render_start = Instant::now();
        let changed = self.renderer.render();
        let render_elapsed = render_start.elapsed();

        if let Some(mut cb) = self.after_render.take() {
            let mut stats = stats_base(self, pattern_elapsed);
            stats.render_ms = render_elapsed.as_secs_f64() * 1000.0;
            stats.changed_cells = changed;
            cb(&mut self.renderer, &stats);
            self.after_render = Some(cb);
        }

        let total = tick_start.elapsed();
        // The perf window measures frame-to-frame spacing; the in-frame
        // work time only feeds drop detection.
        let spacing = self
            .last_frame_start
            .map_or(self.interval, |t| tick_start.duration_since(t));
        self.last_frame_start = Some(tick_start);
        self.perf.record(FrameSample {
            total: spacing,
            pattern: pattern_elapsed,
            terminal: render_elapsed,
            changed_cells: changed,
        });

        if total > self.interval * 3 / 2 {
            self.perf.record_drop();
            self.bus.emit(
                EventKind::FrameDrop,
                EventData::Millis(total.as_secs_f64() * 1000.0),
            );
        }

        self.bus.emit(EventKind::FrameEnd, EventData::Frame(self.frame));
        self.schedule_next(tick_start);
        true
    }

    fn schedule_next(&mut self, tick_start: Instant) {
        self.next_tick += self.interval;
        // More than one interval behind: skip ahead instead of bursting
        // catch-up frames.
        if self.next_tick + self.interval < tick_start {
            self.next_tick = tick_start + self.interval;
        }
    }

    /// How long the owning loop may sleep before the next due frame.
    pub fn until_next_tick(&self) -> Duration {
        self.next_tick.saturating_duration_since(Instant::now())
    }
}
