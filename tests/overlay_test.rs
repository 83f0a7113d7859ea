// (C) 2025 - Enzo Lombardi
// Bottom-row arbiter: priority, mutual exclusion, style-reset and
// switch-mutex suppression, observed through the mock backend.

use termsplash::overlay::{MessageKind, OverlayState, render_bottom_row};
use termsplash::terminal::{STYLE_RESET, TerminalRenderer};
use termsplash::test_util::{MockBackend, MockHandle};

fn renderer(w: u16, h: u16) -> (TerminalRenderer, MockHandle) {
    let (backend, handle) = MockBackend::new(w, h);
    let mut renderer = TerminalRenderer::with_backend(Box::new(backend), false).unwrap();
    renderer.render();
    handle.clear_written();
    (renderer, handle)
}

#[test]
fn command_line_wins_over_everything() {
    let (mut renderer, handle) = renderer(40, 12);
    let mut state = OverlayState::default();
    state.show_message("a banner", MessageKind::Generic);
    state.set_pattern_select(Some("pattern> 2_".into()));
    state.set_command_line(Some("cmd> 0p3".into()));

    render_bottom_row(&mut renderer, &mut state, false);
    let out = handle.written_string();
    assert!(out.contains("cmd> 0p3"), "output: {:?}", out);
    assert!(!out.contains("pattern>"));
    assert!(!out.contains("a banner"));
    // Bottom row of a 12-line terminal is row 12 (1-based)
    assert!(out.contains("\x1b[12;1H"));
    assert!(out.ends_with(STYLE_RESET));
}

#[test]
fn select_beats_message() {
    let (mut renderer, handle) = renderer(40, 12);
    let mut state = OverlayState::default();
    state.show_message("a banner", MessageKind::Generic);
    state.set_pattern_select(Some("pattern> 2_".into()));

    render_bottom_row(&mut renderer, &mut state, false);
    let out = handle.written_string();
    assert!(out.contains("pattern>"));
    assert!(!out.contains("a banner"));
}

#[test]
fn message_shows_then_row_erases_after_clear() {
    let (mut renderer, handle) = renderer(40, 12);
    let mut state = OverlayState::default();
    state.show_message("waves", MessageKind::PatternName);

    render_bottom_row(&mut renderer, &mut state, false);
    assert!(handle.written_string().contains("waves"));

    handle.clear_written();
    state.clear_message();
    render_bottom_row(&mut renderer, &mut state, false);
    let out = handle.written_string();
    // Row erase, once, with trailing reset
    assert!(out.contains("\x1b[2K"), "output: {:?}", out);
    assert!(out.ends_with(STYLE_RESET));

    // Nothing shown and row already clean: no writes at all
    handle.clear_written();
    render_bottom_row(&mut renderer, &mut state, false);
    assert!(handle.written_string().is_empty());
}

#[test]
fn switch_mutex_suppresses_all_writes() {
    let (mut renderer, handle) = renderer(40, 12);
    let mut state = OverlayState::default();
    state.set_command_line(Some("cmd> 0".into()));

    render_bottom_row(&mut renderer, &mut state, true);
    assert!(handle.written_string().is_empty());

    // Next frame, mutex released: the write goes through
    render_bottom_row(&mut renderer, &mut state, false);
    assert!(handle.written_string().contains("cmd>"));
}

#[test]
fn overlay_text_clipped_to_terminal_width() {
    let (mut renderer, handle) = renderer(10, 5);
    let mut state = OverlayState::default();
    state.set_command_line(Some("cmd> 0pwaves+tfire+whatever".into()));

    render_bottom_row(&mut renderer, &mut state, false);
    let out = handle.written_string();
    let payload = out
        .trim_end_matches(STYLE_RESET)
        .rsplit('m')
        .next()
        .unwrap_or("");
    assert!(payload.chars().count() <= 10, "payload: {:?}", payload);
}

#[test]
fn degenerate_terminal_is_ignored() {
    let (mut renderer, handle) = renderer(0, 0);
    let mut state = OverlayState::default();
    state.set_command_line(Some("cmd> 0".into()));
    render_bottom_row(&mut renderer, &mut state, false);
    assert!(handle.written_string().is_empty());
}
