// (C) 2025 - Enzo Lombardi

//! Terminal abstraction layer.
//!
//! This module provides the [`TerminalRenderer`] which owns the terminal
//! session and the cell [`Buffer`], including:
//! - Raw mode management and alternate screen
//! - Double-buffered differential rendering
//! - Event polling (keyboard, mouse, resize)
//! - Style-reset discipline after every colored emission
//!
//! Low-level I/O is delegated to a [`Backend`]: [`CrosstermBackend`] for
//! a real terminal, or a capturing mock (`test_util::MockBackend`) in
//! tests.

mod backend;
mod crossterm_backend;
pub mod input;

pub use backend::{Backend, Capabilities};
pub use crossterm_backend::CrosstermBackend;

use std::io::{self, Write};
use std::time::Duration;

use crate::core::buffer::Buffer;
use crate::core::color::Color;
use crate::core::error::{Result, SplashError};
use crate::core::geometry::Size;
use input::InputEvent;

/// Full style reset: attributes off, default foreground, default
/// background. Emitted after every colored write so no escape state
/// leaks into the next frame.
pub const STYLE_RESET: &str = "\x1b[0m\x1b[39m\x1b[49m";

/// Terminal renderer: owns the backend session and the cell buffer,
/// translating buffer diffs into minimal escape sequences.
pub struct TerminalRenderer {
    backend: Box<dyn Backend>,
    buffer: Buffer,
    size: Size,
    mouse_enabled: bool,
}

impl TerminalRenderer {
    /// Initialize on the local terminal via crossterm.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout is not an interactive terminal or raw
    /// mode cannot be entered.
    pub fn init(mouse_enabled: bool) -> Result<Self> {
        Self::with_backend(Box::new(CrosstermBackend::new()), mouse_enabled)
    }

    /// Initialize with a custom backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses to initialize or the
    /// terminal size cannot be queried.
    pub fn with_backend(mut backend: Box<dyn Backend>, mouse_enabled: bool) -> Result<Self> {
        if !backend.is_tty() {
            return Err(SplashError::terminal_init(
                "standard output is not an interactive terminal",
            ));
        }
        backend.init(mouse_enabled)?;

        let (width, height) = backend.size()?;
        let size = Size::new(width as i16, height as i16);

        Ok(Self {
            backend,
            buffer: Buffer::new(size),
            size,
            mouse_enabled,
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn mouse_enabled(&self) -> bool {
        self.mouse_enabled
    }

    /// Re-query the terminal size. On change, reallocates the buffer,
    /// hard-clears the screen and returns the new size.
    pub fn refresh_size(&mut self) -> Option<Size> {
        let (width, height) = self.backend.size().ok()?;
        let size = Size::new(width as i16, height as i16);
        if size == self.size {
            return None;
        }
        self.size = size;
        self.buffer.resize(size);
        let _ = self.backend.clear_screen();
        Some(size)
    }

    pub fn buffer(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    /// Emit all changed cells to the terminal and return how many cells
    /// changed. Ends with a full style reset; write errors are logged
    /// and the frame continues (the next diff repairs the screen).
    pub fn render(&mut self) -> u32 {
        let runs = self.buffer.diff();
        if runs.is_empty() {
            return 0;
        }

        let mut output = Vec::with_capacity(runs.len() * 16);
        let mut changed = 0u32;
        let mut last_color: Option<Option<Color>> = None;

        for run in &runs {
            // Move cursor: ESC[row;colH (1-indexed)
            let _ = write!(output, "\x1b[{};{}H", run.y + 1, run.x + 1);
            if last_color != Some(run.color) {
                match run.color {
                    Some(c) => {
                        let _ = write!(output, "\x1b[38;2;{};{};{}m", c.r, c.g, c.b);
                    }
                    None => {
                        let _ = write!(output, "\x1b[39m");
                    }
                }
                last_color = Some(run.color);
            }
            output.extend_from_slice(run.text.as_bytes());
            changed += run.cells as u32;
        }

        output.extend_from_slice(STYLE_RESET.as_bytes());

        if let Err(e) = self.backend.write_raw(&output).and_then(|()| self.backend.flush()) {
            log::debug!("terminal write failed: {}", e);
        }
        changed
    }

    /// Hard clear + poison the front buffer so the next frame re-emits
    /// everything. Called on pattern switch and resize.
    pub fn clear_screen(&mut self) {
        let _ = self.backend.clear_screen();
        self.buffer.force_full_redraw();
    }

    /// Write a line directly to the terminal, bypassing the diff buffer.
    /// Used only by the overlay arbiter and the debug overlay; always
    /// trails a full style reset.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal write fails.
    pub fn write_direct(&mut self, x: u16, y: u16, text: &str, color: Option<Color>) -> io::Result<()> {
        let mut output = Vec::with_capacity(text.len() + 24);
        let _ = write!(output, "\x1b[{};{}H", y + 1, x + 1);
        if let Some(c) = color {
            let _ = write!(output, "\x1b[38;2;{};{};{}m", c.r, c.g, c.b);
        }
        output.extend_from_slice(text.as_bytes());
        output.extend_from_slice(STYLE_RESET.as_bytes());
        self.backend.write_raw(&output)?;
        self.backend.flush()
    }

    /// Erase a whole row (used by the arbiter when no overlay is due).
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal write fails.
    pub fn erase_row(&mut self, y: u16) -> io::Result<()> {
        let mut output = Vec::with_capacity(16);
        let _ = write!(output, "\x1b[{};1H\x1b[2K", y + 1);
        output.extend_from_slice(STYLE_RESET.as_bytes());
        self.backend.write_raw(&output)?;
        self.backend.flush()
    }

    /// Poll for an input event with a timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if event polling fails.
    pub fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<InputEvent>> {
        self.backend.poll_event(timeout)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.backend.capabilities()
    }

    /// Restore the terminal. Idempotent; also runs from `Drop` so every
    /// exit path (including panics) releases the terminal.
    pub fn cleanup(&mut self) {
        if let Err(e) = self.backend.cleanup() {
            log::warn!("terminal cleanup failed: {}", e);
        }
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        self.cleanup();
    }
}
