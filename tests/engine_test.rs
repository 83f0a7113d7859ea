// (C) 2025 - Enzo Lombardi
// Engine frame-loop invariants on the mock backend.

use std::cell::RefCell;
use std::rc::Rc;

use termsplash::core::buffer::Buffer;
use termsplash::core::events::{EventData, EventKind};
use termsplash::core::geometry::{Point, Size};
use termsplash::engine::AnimationEngine;
use termsplash::patterns::Pattern;
use termsplash::terminal::{STYLE_RESET, TerminalRenderer};
use termsplash::test_util::{MockBackend, MockHandle};

/// Test pattern: records the sizes it was given and plots one star.
struct Probe {
    sizes: Rc<RefCell<Vec<Size>>>,
    resizes: Rc<RefCell<Vec<Size>>>,
    star_at: Option<Point>,
    panicky: bool,
}

impl Probe {
    fn new() -> Self {
        Self {
            sizes: Rc::new(RefCell::new(Vec::new())),
            resizes: Rc::new(RefCell::new(Vec::new())),
            star_at: None,
            panicky: false,
        }
    }
}

impl Pattern for Probe {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn render(&mut self, buf: &mut Buffer, _time_ms: f64, size: Size, _mouse: Option<Point>) {
        if self.panicky {
            panic!("probe render failure");
        }
        self.sizes.borrow_mut().push(size);
        if let Some(p) = self.star_at {
            buf.put(p.x, p.y, '*', None);
        }
    }

    fn reset(&mut self) {}

    fn on_resize(&mut self, size: Size) {
        self.resizes.borrow_mut().push(size);
    }
}

fn engine_with(probe: Probe, w: u16, h: u16) -> (AnimationEngine, MockHandle) {
    let (backend, handle) = MockBackend::new(w, h);
    let mut renderer = TerminalRenderer::with_backend(Box::new(backend), false).unwrap();
    // Settle the initial full redraw so assertions see only deltas
    renderer.render();
    handle.clear_written();
    let mut engine = AnimationEngine::new(renderer, Box::new(probe), 30);
    engine.start();
    (engine, handle)
}

#[test]
fn pattern_size_reserves_bottom_row() {
    let probe = Probe::new();
    let sizes = probe.sizes.clone();
    let (mut engine, _handle) = engine_with(probe, 40, 12);

    assert!(engine.tick());
    assert_eq!(*sizes.borrow(), vec![Size::new(40, 11)]);
}

#[test]
fn single_cell_write_lands_one_based() {
    // A star at (5,5) reaches the terminal as exactly one write at
    // column 6, row 6 (1-based), containing '*'.
    let mut probe = Probe::new();
    probe.star_at = Some(Point::new(5, 5));
    let (mut engine, handle) = engine_with(probe, 80, 24);

    assert!(engine.tick());
    let out = handle.written_string();
    assert_eq!(out.matches('*').count(), 1, "output: {:?}", out);
    assert!(out.contains("\x1b[6;6H"), "output: {:?}", out);
    assert!(out.ends_with(STYLE_RESET));
}

#[test]
fn style_reset_trails_every_frame() {
    let mut probe = Probe::new();
    probe.star_at = Some(Point::new(0, 0));
    let (mut engine, handle) = engine_with(probe, 20, 10);

    engine.tick();
    assert!(handle.written_string().ends_with(STYLE_RESET));
}

#[test]
fn resize_is_detected_and_delivered() {
    let probe = Probe::new();
    let sizes = probe.sizes.clone();
    let resizes = probe.resizes.clone();
    let (mut engine, handle) = engine_with(probe, 40, 12);

    engine.tick();

    let events = Rc::new(RefCell::new(Vec::new()));
    let seen = events.clone();
    engine.bus_mut().on(EventKind::Resize, move |env, _| {
        seen.borrow_mut().push(env.data.clone());
    });

    handle.set_size(50, 20);
    std::thread::sleep(engine.frame_interval());
    assert!(engine.tick());

    assert_eq!(*resizes.borrow(), vec![Size::new(50, 20)]);
    assert_eq!(*events.borrow(), vec![EventData::Size(Size::new(50, 20))]);
    assert_eq!(sizes.borrow().last(), Some(&Size::new(50, 19)));
}

#[test]
fn fps_change_emits_exactly_once() {
    let probe = Probe::new();
    let (mut engine, _handle) = engine_with(probe, 40, 12);

    let count = Rc::new(RefCell::new(0u32));
    let seen = count.clone();
    engine.bus_mut().on(EventKind::FpsChange, move |_, _| {
        *seen.borrow_mut() += 1;
    });

    engine.set_fps(45);
    engine.set_fps(45); // no-op, no second event
    assert_eq!(*count.borrow(), 1);
    assert_eq!(engine.fps(), 45);

    // Clamping still counts as a change when the effective value moves
    engine.set_fps(200);
    assert_eq!(engine.fps(), 60);
    assert_eq!(*count.borrow(), 2);
}

#[test]
fn fps_interval_bounds() {
    let probe = Probe::new();
    let (mut engine, _handle) = engine_with(probe, 40, 12);

    engine.set_fps(10);
    assert!(engine.frame_interval() <= std::time::Duration::from_millis(120));
    engine.set_fps(60);
    assert!(engine.frame_interval() <= std::time::Duration::from_millis(20));
}

#[test]
fn paused_engine_skips_frames_and_emits_events() {
    let probe = Probe::new();
    let sizes = probe.sizes.clone();
    let (mut engine, _handle) = engine_with(probe, 40, 12);

    let events = Rc::new(RefCell::new(Vec::new()));
    let seen = events.clone();
    engine.bus_mut().on_all(move |env, _| {
        if matches!(env.kind, EventKind::Pause | EventKind::Resume) {
            seen.borrow_mut().push(env.kind.clone());
        }
    });

    engine.pause();
    assert!(engine.is_paused());
    assert!(!engine.tick());
    assert!(sizes.borrow().is_empty());

    engine.pause();
    assert!(!engine.is_paused());
    assert!(engine.tick());
    assert_eq!(sizes.borrow().len(), 1);
    assert_eq!(*events.borrow(), vec![EventKind::Pause, EventKind::Resume]);
}

#[test]
fn panicking_pattern_costs_one_frame_not_the_process() {
    let mut probe = Probe::new();
    probe.panicky = true;
    let (mut engine, _handle) = engine_with(probe, 40, 12);

    assert!(engine.tick());
    assert_eq!(engine.render_errors(), 1);

    std::thread::sleep(engine.frame_interval());
    assert!(engine.tick());
    assert_eq!(engine.render_errors(), 2);
}

#[test]
fn pattern_swap_runs_lifecycle_and_clears_screen() {
    let probe = Probe::new();
    let (mut engine, handle) = engine_with(probe, 40, 12);
    engine.tick();

    let order = Rc::new(RefCell::new(Vec::new()));
    let seen = order.clone();
    engine.bus_mut().on_all(move |env, _| {
        if matches!(env.kind, EventKind::PatternBeforeChange | EventKind::PatternChange) {
            seen.borrow_mut().push((env.kind.clone(), env.data.clone()));
        }
    });

    let clears_before = handle.clear_screen_count();
    engine.set_pattern(Box::new(Probe::new()));

    assert!(engine.switch_in_progress());
    assert!(handle.clear_screen_count() > clears_before);
    let order = order.borrow();
    assert_eq!(order.len(), 2);
    assert_eq!(order[0].0, EventKind::PatternBeforeChange);
    assert_eq!(order[1], (EventKind::PatternChange, EventData::Text("probe".into())));

    std::thread::sleep(engine.frame_interval() + std::time::Duration::from_millis(5));
    assert!(!engine.switch_in_progress());
}

#[test]
fn after_render_callback_sees_frame_stats() {
    let mut probe = Probe::new();
    probe.star_at = Some(Point::new(3, 3));
    let (mut engine, _handle) = engine_with(probe, 40, 12);

    let stats = Rc::new(RefCell::new(Vec::new()));
    let seen = stats.clone();
    engine.set_after_render_callback(Box::new(move |_renderer, s| {
        seen.borrow_mut().push((s.frame, s.changed_cells, s.pattern_name));
    }));

    engine.tick();
    let stats = stats.borrow();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0], (1, 1, "probe"));
}

#[test]
fn frame_events_bracket_each_tick() {
    let probe = Probe::new();
    let (mut engine, _handle) = engine_with(probe, 40, 12);

    let kinds = Rc::new(RefCell::new(Vec::new()));
    let seen = kinds.clone();
    engine.bus_mut().on_all(move |env, _| {
        if matches!(env.kind, EventKind::FrameStart | EventKind::FrameEnd) {
            seen.borrow_mut().push(env.kind.clone());
        }
    });

    engine.tick();
    assert_eq!(*kinds.borrow(), vec![EventKind::FrameStart, EventKind::FrameEnd]);
}

#[test]
fn degenerate_terminal_does_not_crash() {
    let probe = Probe::new();
    let sizes = probe.sizes.clone();
    let (mut engine, _handle) = engine_with(probe, 0, 0);

    assert!(engine.tick());
    // height - 1 == -1 is delivered; the pattern treats it as a no-op
    assert_eq!(*sizes.borrow(), vec![Size::new(0, -1)]);
}
