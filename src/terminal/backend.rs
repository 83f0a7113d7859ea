// (C) 2025 - Enzo Lombardi

//! Backend trait for terminal I/O abstraction.
//!
//! This module defines the [`Backend`] trait that abstracts low-level
//! terminal operations, so the renderer can drive a real terminal via
//! crossterm or a capturing mock in tests.
//!
//! Backends are responsible for:
//! - Managing terminal mode (raw mode, alternate screen, mouse capture)
//! - Providing terminal dimensions
//! - Polling for and delivering input events
//! - Writing raw output data (ANSI escape sequences)
//!
//! The [`TerminalRenderer`](super::TerminalRenderer) handles the
//! higher-level concerns: double-buffered rendering, differential
//! updates and style-reset discipline.

use std::io;
use std::time::Duration;

use super::input::InputEvent;

/// Terminal capabilities that a backend may or may not support.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    /// Whether the terminal supports mouse input.
    pub mouse: bool,
    /// Whether the terminal supports true color (24-bit RGB).
    pub true_color: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            mouse: true,
            true_color: true,
        }
    }
}

/// The core abstraction for terminal I/O operations.
pub trait Backend: Send {
    /// Set up the terminal for full-screen operation:
    /// - Enter raw mode (no line buffering, no echo)
    /// - Enter alternate screen buffer
    /// - Hide cursor
    /// - Enable mouse tracking when `mouse` is set
    /// - Disable line wrapping
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    fn init(&mut self, mouse: bool) -> io::Result<()>;

    /// Reverse all changes made by [`init`](Self::init). Cleanup
    /// failures are often non-fatal; the terminal may still be usable.
    ///
    /// # Errors
    ///
    /// Returns an error if restoration fails.
    fn cleanup(&mut self) -> io::Result<()>;

    /// Current terminal dimensions as `(width, height)` in cells.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions cannot be queried.
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Poll for an input event with a timeout. `Ok(None)` means the
    /// timeout expired with nothing to deliver.
    ///
    /// # Errors
    ///
    /// Returns an error if event polling fails.
    fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<InputEvent>>;

    /// Write raw bytes (escape sequences and cell text) to the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn write_raw(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&mut self) -> io::Result<()>;

    /// Whether standard output is an interactive terminal.
    fn is_tty(&self) -> bool {
        true
    }

    /// Query terminal capabilities.
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Hard-clear the whole screen and home the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the clear fails.
    fn clear_screen(&mut self) -> io::Result<()> {
        self.write_raw(b"\x1b[2J")?;
        self.write_raw(b"\x1b[H")?;
        self.flush()
    }
}
