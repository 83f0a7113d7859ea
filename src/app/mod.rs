// (C) 2025 - Enzo Lombardi

//! Application shell - wires the renderer, engine, overlay arbiter,
//! command subsystem and config store together and runs the main loop.
//!
//! The loop is single-threaded: input drains with a 1 ms poll timeout
//! (which doubles as the idle sleep), deadline timers are checked each
//! pass, then the engine ticks if a frame is due.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::command::{CommandBuffer, CommandExecutor, ExecCtx, parse};
use crate::config::ConfigStore;
use crate::core::buffer::Cell as BufferCell;
use crate::core::color::Color;
use crate::core::error::{Result, SplashError};
use crate::core::events::{EventData, EventKind};
use crate::engine::{AnimationEngine, FrameStats, MAX_FPS, MIN_FPS};
use crate::overlay::{self, MessageKind, OverlayHandle};
use crate::patterns::PatternRegistry;
use crate::core::theme::ThemeSet;
use crate::terminal::TerminalRenderer;
use crate::terminal::input::{InputEvent, Key, MouseInput, MouseKind};

const PRESET_CYCLE: u32 = 6;
const MOUSE_FORWARD_INTERVAL: Duration = Duration::from_millis(16);
const SELECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Startup options, usually distilled from the CLI plus the saved
/// config snapshot.
pub struct AppOptions {
    pub pattern: Option<String>,
    pub theme: Option<String>,
    pub fps: u32,
    pub mouse: bool,
    pub config: Option<ConfigStore>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            pattern: None,
            theme: None,
            fps: 30,
            mouse: true,
            config: None,
        }
    }
}

/// Pattern-selection mode: a digit accumulator on a 5-second clock,
/// shown at overlay priority 2.
struct PatternSelect {
    active: bool,
    digits: String,
    deadline: Option<Instant>,
}

impl PatternSelect {
    fn new() -> Self {
        Self {
            active: false,
            digits: String::new(),
            deadline: None,
        }
    }

    fn activate(&mut self) {
        self.active = true;
        self.digits.clear();
        self.touch();
    }

    fn push(&mut self, c: char) {
        if self.active && c.is_ascii_digit() {
            self.digits.push(c);
            self.touch();
        }
    }

    fn cancel(&mut self) -> Option<String> {
        self.active = false;
        self.deadline = None;
        let digits = std::mem::take(&mut self.digits);
        (!digits.is_empty()).then_some(digits)
    }

    fn expired(&self, now: Instant) -> bool {
        self.active && self.deadline.is_some_and(|d| now >= d)
    }

    fn touch(&mut self) {
        self.deadline = Some(Instant::now() + SELECT_TIMEOUT);
    }
}

pub struct Application {
    engine: AnimationEngine,
    registry: PatternRegistry,
    themes: ThemeSet,
    executor: CommandExecutor,
    command_buffer: CommandBuffer,
    select: PatternSelect,
    overlay: OverlayHandle,
    config: Option<ConfigStore>,
    debug_on: Rc<Cell<bool>>,
    help_on: bool,
    current_preset: u32,
    last_mouse_forward: Instant,
}

impl Application {
    /// Build the full stack on an already-initialized renderer.
    pub fn new(renderer: TerminalRenderer, options: AppOptions) -> Result<Self> {
        let registry = PatternRegistry::builtin();
        let themes = ThemeSet::builtin();

        let theme_index = match &options.theme {
            Some(name) => themes
                .resolve(name)
                .ok_or_else(|| SplashError::invalid_input(format!("unknown theme: {}", name)))?,
            None => 0,
        };
        let pattern_index = match &options.pattern {
            Some(name) => registry
                .resolve(name)
                .ok_or_else(|| SplashError::invalid_input(format!("unknown pattern: {}", name)))?,
            None => 0,
        };

        let theme = themes
            .get(theme_index)
            .ok_or_else(|| SplashError::invalid_input("empty theme set"))?;
        let pattern = registry
            .build(pattern_index, theme)
            .ok_or_else(|| SplashError::invalid_input("empty pattern registry"))?;

        let mut engine = AnimationEngine::new(renderer, pattern, options.fps);

        let overlay = OverlayHandle::new();
        let debug_on = Rc::new(Cell::new(false));
        {
            let overlay = overlay.clone();
            let debug_on = debug_on.clone();
            engine.set_after_render_callback(Box::new(move |renderer, stats| {
                if debug_on.get() {
                    draw_debug_line(renderer, stats);
                }
                overlay.with(|state| {
                    overlay::render_bottom_row(renderer, state, stats.switch_in_progress);
                });
            }));
        }

        let mut app = Self {
            engine,
            registry,
            themes,
            executor: CommandExecutor::new(pattern_index, theme_index),
            command_buffer: CommandBuffer::new(),
            select: PatternSelect::new(),
            overlay,
            config: options.config,
            debug_on,
            help_on: false,
            current_preset: 1,
            last_mouse_forward: Instant::now() - MOUSE_FORWARD_INTERVAL,
        };
        app.show_pattern_name();
        Ok(app)
    }

    /// Main loop. `shutdown` is flipped by the signal handlers.
    pub fn run(&mut self, shutdown: &Arc<AtomicBool>) -> Result<()> {
        self.engine.start();
        log::info!(
            "engine started: pattern={} fps={}",
            self.engine.pattern().name(),
            self.engine.fps()
        );

        while self.engine.is_running() && !shutdown.load(Ordering::Relaxed) {
            // The 1 ms poll doubles as the idle sleep; the loop never
            // busy-waits.
            match self.engine.renderer_mut().poll_event(Duration::from_millis(1)) {
                Ok(Some(event)) => self.handle_input(event),
                Ok(None) => {}
                Err(e) => log::debug!("input poll failed: {}", e),
            }

            self.poll_timers(Instant::now());
            self.engine.tick();
        }

        self.executor.cleanup();
        self.engine.stop();
        self.engine.renderer_mut().cleanup();
        log::info!("engine stopped after {} frames", self.engine.perf().frames());
        Ok(())
    }

    fn poll_timers(&mut self, now: Instant) {
        if self.command_buffer.expired(now) {
            self.command_buffer.cancel();
            self.sync_command_overlay();
        }
        if self.select.expired(now) {
            self.select.cancel();
            self.overlay.with(|s| s.set_pattern_select(None));
        }
        let mut ctx = ExecCtx {
            engine: &mut self.engine,
            registry: &self.registry,
            themes: &self.themes,
            config: self.config.as_mut(),
        };
        if let Some(outcome) = self.executor.poll_shuffle(now, &mut ctx) {
            self.toast(outcome.message, MessageKind::Generic);
        }
    }

    fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Mouse(mouse) => self.handle_mouse(mouse),
            InputEvent::Resize => {
                // The next tick re-queries the size and emits RESIZE
            }
        }
    }

    fn handle_key(&mut self, key: Key) {
        if self.command_buffer.is_active() {
            self.handle_command_key(key);
            return;
        }
        if self.select.active {
            self.handle_select_key(key);
            return;
        }

        match key {
            Key::CtrlC | Key::Escape => self.quit(),
            Key::Char('q') => self.quit(),
            Key::Space => {
                self.engine.pause();
                let state = if self.engine.is_paused() { "Paused" } else { "Resumed" };
                self.toast(state, MessageKind::Generic);
            }
            Key::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if index < self.registry.len() {
                    self.switch_pattern(index);
                }
            }
            Key::Char('n') => {
                let next = (self.executor.pattern_index() + 1) % self.registry.len();
                self.switch_pattern(next);
            }
            Key::Char('b') => {
                let count = self.registry.len();
                let prev = (self.executor.pattern_index() + count - 1) % count;
                self.switch_pattern(prev);
            }
            Key::Char('.') => self.cycle_preset(1),
            Key::Char(',') => self.cycle_preset(-1),
            Key::Char('p') => {
                self.select.activate();
                self.sync_select_overlay();
            }
            Key::Char('c') => {
                self.command_buffer.activate();
                self.sync_command_overlay();
            }
            Key::Char('+') => self.adjust_fps(5),
            Key::Char('-') => self.adjust_fps(-5),
            Key::Char('[') => self.step_quality(false),
            Key::Char(']') => self.step_quality(true),
            Key::Char('t') => {
                let next = (self.executor.theme_index() + 1) % self.themes.len();
                self.switch_theme(next);
            }
            Key::Char('?') => self.toggle_help(),
            Key::Char('d') => {
                self.debug_on.set(!self.debug_on.get());
            }
            Key::Char('r') => self.run_command("0r"),
            Key::Char('s') => self.run_command("0s"),
            _ => {}
        }
    }

    fn handle_command_key(&mut self, key: Key) {
        match key {
            Key::Escape | Key::CtrlC => self.command_buffer.cancel(),
            Key::Enter => {
                let raw = self.command_buffer.execute();
                self.sync_command_overlay();
                self.run_command(&raw);
                return;
            }
            Key::Backspace => self.command_buffer.backspace(),
            Key::Left => self.command_buffer.move_cursor_left(),
            Key::Right => self.command_buffer.move_cursor_right(),
            Key::Up => self.command_buffer.previous_command(),
            Key::Down => self.command_buffer.next_command(),
            Key::Space => self.command_buffer.add_char(' '),
            Key::Char(c) => self.command_buffer.add_char(c),
            _ => {}
        }
        self.sync_command_overlay();
    }

    fn handle_select_key(&mut self, key: Key) {
        match key {
            Key::Escape | Key::CtrlC => {
                self.select.cancel();
            }
            Key::Enter => {
                if let Some(digits) = self.select.cancel() {
                    match digits.parse::<usize>() {
                        Ok(n) if n >= 1 && n <= self.registry.len() => {
                            self.overlay.with(|s| s.set_pattern_select(None));
                            self.switch_pattern(n - 1);
                            return;
                        }
                        _ => {
                            self.toast(format!("No pattern {}", digits), MessageKind::Generic);
                        }
                    }
                }
            }
            Key::Char(c) if c.is_ascii_digit() => self.select.push(c),
            _ => {}
        }
        self.sync_select_overlay();
    }

    fn handle_mouse(&mut self, mouse: MouseInput) {
        match mouse.kind {
            MouseKind::Move => {
                // Motion throttled to ~60 Hz
                let now = Instant::now();
                if now.duration_since(self.last_mouse_forward) < MOUSE_FORWARD_INTERVAL {
                    return;
                }
                self.last_mouse_forward = now;
                self.engine.set_mouse_pos(mouse.pos);
                self.engine.pattern_mut().on_mouse_move(mouse.pos);
            }
            MouseKind::LeftPress => {
                self.engine.note_mouse_click(mouse.pos);
                self.engine.pattern_mut().on_mouse_click(mouse.pos);
            }
        }
    }

    fn quit(&mut self) {
        self.engine.stop();
    }

    /// Show a banner and announce it on the bus.
    fn toast(&mut self, text: impl Into<String>, kind: MessageKind) {
        let text = text.into();
        self.engine
            .bus_mut()
            .emit(EventKind::ToastShow, EventData::Text(text.clone()));
        self.overlay.show_message(text, kind);
    }

    /// Parse and execute a raw command string, surfacing the outcome as
    /// a banner.
    fn run_command(&mut self, raw: &str) {
        let Some(cmd) = parse(raw) else {
            if raw.chars().count() > 1 {
                self.toast(format!("Unknown command: {}", raw), MessageKind::CommandResult);
            }
            return;
        };
        let mut ctx = ExecCtx {
            engine: &mut self.engine,
            registry: &self.registry,
            themes: &self.themes,
            config: self.config.as_mut(),
        };
        let outcome = self.executor.execute(&cmd, &mut ctx);
        log::debug!("command '{}': success={} - {}", raw, outcome.success, outcome.message);
        let text = if outcome.success {
            outcome.message
        } else {
            format!("✗ {}", outcome.message)
        };
        self.toast(text, MessageKind::CommandResult);
        self.current_preset = 1;
    }

    fn switch_pattern(&mut self, index: usize) {
        let Some(theme) = self.themes.get(self.executor.theme_index()) else {
            return;
        };
        if let Some(pattern) = self.registry.build(index, theme) {
            self.engine.set_pattern(pattern);
            self.executor.update_state(index, self.executor.theme_index());
            self.current_preset = 1;
            self.show_pattern_name();
        }
    }

    fn switch_theme(&mut self, index: usize) {
        let Some(theme) = self.themes.get(index) else {
            return;
        };
        let name = theme.name();
        if let Some(pattern) = self.registry.build(self.executor.pattern_index(), theme) {
            self.engine.set_pattern(pattern);
            self.engine.note_theme_change(name);
            self.executor.update_state(self.executor.pattern_index(), index);
            self.toast(format!("Theme: {}", name), MessageKind::Generic);
        }
    }

    fn cycle_preset(&mut self, direction: i32) {
        let next = (self.current_preset as i32 - 1 + direction).rem_euclid(PRESET_CYCLE as i32) + 1;
        self.current_preset = next as u32;
        if self.engine.pattern_mut().apply_preset(self.current_preset) {
            self.toast(
                format!("Preset {} on {}", self.current_preset, self.engine.pattern().name()),
                MessageKind::Generic,
            );
        }
    }

    fn adjust_fps(&mut self, delta: i32) {
        let fps = (self.engine.fps() as i32 + delta).clamp(MIN_FPS as i32, MAX_FPS as i32) as u32;
        self.engine.set_fps(fps);
        self.toast(format!("{} fps", self.engine.fps()), MessageKind::Generic);
    }

    /// Quality steps are the CLI tiers: 15 / 30 / 60 fps.
    fn step_quality(&mut self, up: bool) {
        let fps = self.engine.fps();
        let next = if up {
            if fps < 30 { 30 } else { 60 }
        } else if fps > 30 {
            30
        } else {
            15
        };
        self.engine.set_fps(next);
        self.toast(format!("{} fps", self.engine.fps()), MessageKind::Generic);
    }

    fn toggle_help(&mut self) {
        self.help_on = !self.help_on;
        let buf = self.engine.renderer_mut().buffer();
        buf.clear_overlay();
        if self.help_on {
            let color = Some(Color::new(230, 230, 230));
            for (row, line) in HELP_LINES.iter().enumerate() {
                for (col, ch) in line.chars().enumerate() {
                    buf.set_overlay(col as u16 + 2, row as u16 + 1, BufferCell::new(ch, color));
                }
            }
        }
    }

    fn show_pattern_name(&mut self) {
        let name = self.engine.pattern().name();
        self.toast(name, MessageKind::PatternName);
    }

    fn sync_command_overlay(&mut self) {
        let display = if self.command_buffer.is_active() {
            let text = self.command_buffer.text();
            let cursor = self.command_buffer.cursor();
            let mut line = String::from("cmd> ");
            for (i, ch) in text.chars().enumerate() {
                if i == cursor {
                    line.push('\u{2588}');
                }
                line.push(ch);
            }
            if cursor >= text.chars().count() {
                line.push('\u{2588}');
            }
            Some(line)
        } else {
            None
        };
        self.overlay.with(|s| s.set_command_line(display));
    }

    fn sync_select_overlay(&mut self) {
        let display = if self.select.active {
            Some(format!(
                "pattern> {}_ (1-{}, ENTER to apply)",
                self.select.digits,
                self.registry.len()
            ))
        } else {
            None
        };
        self.overlay.with(|s| s.set_pattern_select(display));
    }
}

const HELP_LINES: &[&str] = &[
    "q quit   SPACE pause   d debug   ? close help",
    "1-9/n/b pattern   ./, preset   t theme   r random",
    "+/- fps   [/] quality   s save config",
    "c command mode   p pattern select",
];

fn draw_debug_line(renderer: &mut TerminalRenderer, stats: &FrameStats) {
    let mut line = format!(
        "{} | {:.1} fps (target {}) | frame {:.1}ms pat {:.2}ms term {:.2}ms | cells {} | drops {} | errs {}",
        stats.pattern_name,
        stats.fps,
        stats.target_fps,
        stats.avg_frame_ms,
        stats.pattern_ms,
        stats.render_ms,
        stats.changed_cells,
        stats.dropped_frames,
        stats.render_errors,
    );
    for (key, value) in &stats.metrics {
        line.push_str(&format!(" | {} {:.0}", key, value));
    }
    if let Err(e) = renderer.write_direct(0, 0, &line, Some(Color::new(180, 180, 180))) {
        log::debug!("debug overlay write failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_select_timeout() {
        let mut select = PatternSelect::new();
        select.activate();
        select.push('2');
        assert!(!select.expired(Instant::now()));
        assert!(select.expired(Instant::now() + Duration::from_secs(6)));
        assert_eq!(select.cancel(), Some("2".to_string()));
        assert_eq!(select.cancel(), None);
    }

    #[test]
    fn test_pattern_select_rejects_non_digits() {
        let mut select = PatternSelect::new();
        select.activate();
        select.push('x');
        select.push('3');
        assert_eq!(select.digits, "3");
    }
}
