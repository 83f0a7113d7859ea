// (C) 2025 - Enzo Lombardi

//! Crossterm-based backend implementation for local terminal I/O.

use std::io::{self, Write, stdout};
use std::time::Duration;

use crossterm::{
    cursor, execute,
    event::{self, Event as CTEvent, KeyCode as CKC, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind},
    terminal,
    tty::IsTty,
};

use super::backend::{Backend, Capabilities};
use super::input::{InputEvent, Key, MouseInput, MouseKind};
use crate::core::geometry::Point;

/// Crossterm-based terminal backend.
///
/// Supports raw mode and alternate screen, keyboard input, mouse events
/// (motion + buttons) and resize detection.
pub struct CrosstermBackend {
    mouse_enabled: bool,
    initialized: bool,
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self {
            mouse_enabled: false,
            initialized: false,
        }
    }

    /// Convert a crossterm key event to a logical [`Key`].
    fn convert_key(key: event::KeyEvent) -> Option<Key> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let CKC::Char(c) = key.code {
                if c.eq_ignore_ascii_case(&'c') {
                    return Some(Key::CtrlC);
                }
            }
        }
        match key.code {
            CKC::Esc => Some(Key::Escape),
            CKC::Enter => Some(Key::Enter),
            CKC::Backspace => Some(Key::Backspace),
            CKC::Up => Some(Key::Up),
            CKC::Down => Some(Key::Down),
            CKC::Left => Some(Key::Left),
            CKC::Right => Some(Key::Right),
            CKC::Char(' ') => Some(Key::Space),
            CKC::Char(c) => Some(Key::Char(c)),
            _ => None,
        }
    }

    /// Convert a crossterm mouse event. Coordinates arrive 0-based from
    /// crossterm and are forwarded unchanged.
    fn convert_mouse(mouse: event::MouseEvent) -> Option<MouseInput> {
        let pos = Point::new(mouse.column as i16, mouse.row as i16);
        let kind = match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => MouseKind::Move,
            MouseEventKind::Down(MouseButton::Left) => MouseKind::LeftPress,
            _ => return None,
        };
        Some(MouseInput { kind, pos })
    }
}

impl Backend for CrosstermBackend {
    fn init(&mut self, mouse: bool) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
        if mouse {
            execute!(stdout, event::EnableMouseCapture)?;
        }

        // Disable autowrap (DECAWM) to prevent scrolling when writing to
        // the bottom-right corner
        write!(stdout, "\x1b[?7l")?;
        stdout.flush()?;

        self.mouse_enabled = mouse;
        self.initialized = true;
        Ok(())
    }

    fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = stdout();

        // Re-enable autowrap (DECAWM) before leaving
        write!(stdout, "\x1b[?7h")?;

        if self.mouse_enabled {
            execute!(stdout, event::DisableMouseCapture)?;
        }
        execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<InputEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            CTEvent::Key(key) => {
                // On Windows, crossterm sends both Press and Release
                // events; only Press counts.
                if key.kind != KeyEventKind::Press {
                    return Ok(None);
                }
                Ok(Self::convert_key(key).map(InputEvent::Key))
            }
            CTEvent::Mouse(mouse) => Ok(Self::convert_mouse(mouse).map(InputEvent::Mouse)),
            CTEvent::Resize(_, _) => Ok(Some(InputEvent::Resize)),
            _ => Ok(None),
        }
    }

    fn write_raw(&mut self, data: &[u8]) -> io::Result<()> {
        stdout().write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        stdout().flush()
    }

    fn is_tty(&self) -> bool {
        stdout().is_tty()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            mouse: true,
            true_color: true,
        }
    }
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}
