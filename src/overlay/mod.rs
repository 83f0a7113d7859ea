// (C) 2025 - Enzo Lombardi

//! Bottom-row overlay arbiter - the single authority for the reserved
//! bottom terminal row.
//!
//! Exactly one overlay region is visible per frame, by priority:
//! active command line, then pattern-selection prompt, then transient
//! message banner, then nothing (the row is erased). While a pattern
//! switch is in progress the arbiter does not touch the terminal at
//! all, so overlay escapes never interleave with the hard clear. Every
//! write trails a full style reset; terminal errors are swallowed so a
//! wedged write costs one frame, not the process.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use unicode_width::UnicodeWidthChar;

use crate::core::color::Color;
use crate::terminal::TerminalRenderer;

/// Banner lifetime classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Generic,
    PatternName,
    CommandResult,
}

impl MessageKind {
    fn ttl(self) -> Duration {
        match self {
            MessageKind::Generic => Duration::from_millis(1500),
            MessageKind::PatternName => Duration::from_millis(2000),
            MessageKind::CommandResult => Duration::from_millis(2500),
        }
    }
}

struct PendingMessage {
    text: String,
    expires_at: Instant,
}

/// What the arbiter may show this frame. Mutated by the application,
/// read once per frame from the after-render callback.
#[derive(Default)]
pub struct OverlayState {
    command_line: Option<String>,
    pattern_select: Option<String>,
    message: Option<PendingMessage>,
    row_in_use: bool,
}

impl OverlayState {
    /// Replace the command-line display (None when command mode ends).
    pub fn set_command_line(&mut self, text: Option<String>) {
        self.command_line = text;
    }

    pub fn set_pattern_select(&mut self, text: Option<String>) {
        self.pattern_select = text;
    }

    /// Queue a banner. Any new message cancels the pending expiry.
    pub fn show_message(&mut self, text: impl Into<String>, kind: MessageKind) {
        self.message = Some(PendingMessage {
            text: text.into(),
            expires_at: Instant::now() + kind.ttl(),
        });
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    /// The message currently pending, if it has not expired.
    pub fn current_message(&self) -> Option<&str> {
        match &self.message {
            Some(m) if m.expires_at > Instant::now() => Some(&m.text),
            _ => None,
        }
    }
}

/// Shared handle to the overlay state: the application holds one clone,
/// the engine's after-render closure holds another.
#[derive(Clone, Default)]
pub struct OverlayHandle {
    state: Rc<RefCell<OverlayState>>,
}

impl OverlayHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut OverlayState) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    pub fn show_message(&self, text: impl Into<String>, kind: MessageKind) {
        self.with(|s| s.show_message(text, kind));
    }
}

const COMMAND_COLOR: Color = Color::new(255, 255, 160);
const SELECT_COLOR: Color = Color::new(160, 220, 255);
const MESSAGE_COLOR: Color = Color::new(200, 200, 200);

/// Render the bottom row for this frame. Called once per frame from the
/// after-render callback, after the debug overlay.
pub fn render_bottom_row(
    renderer: &mut TerminalRenderer,
    state: &mut OverlayState,
    switch_in_progress: bool,
) {
    if switch_in_progress {
        return;
    }
    let size = renderer.size();
    if size.width <= 0 || size.height <= 0 {
        return;
    }
    let row = (size.height - 1) as u16;

    // Expire the banner lazily; the arbiter is the only reader.
    if state.current_message().is_none() {
        state.message = None;
    }

    let (text, color) = if let Some(cmd) = &state.command_line {
        (Some(cmd.clone()), COMMAND_COLOR)
    } else if let Some(sel) = &state.pattern_select {
        (Some(sel.clone()), SELECT_COLOR)
    } else if let Some(msg) = state.current_message() {
        (Some(msg.to_string()), MESSAGE_COLOR)
    } else {
        (None, MESSAGE_COLOR)
    };

    let result = match text {
        Some(text) => {
            state.row_in_use = true;
            let line = fit_to_width(&text, size.width as usize);
            renderer.write_direct(0, row, &line, Some(color))
        }
        None if state.row_in_use => {
            state.row_in_use = false;
            renderer.erase_row(row)
        }
        None => Ok(()),
    };

    // A failed write leaves the row stale for one frame; never fatal.
    if let Err(e) = result {
        log::debug!("overlay write failed: {}", e);
    }
}

/// Truncate to the terminal width and pad with spaces so leftovers from
/// a longer previous overlay never linger.
fn fit_to_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut cols = 0usize;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if cols + w > width {
            break;
        }
        out.push(ch);
        cols += w;
    }
    while cols < width {
        out.push(' ');
        cols += 1;
    }
    out
}
