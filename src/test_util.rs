// (C) 2025 - Enzo Lombardi

//! Test utilities - a capturing mock backend for driving the renderer
//! and engine without a real terminal.
//!
//! The mock records every byte written, fakes a TTY, and lets tests
//! queue input events and change the reported size mid-run.
//!
//! ```
//! use termsplash::test_util::MockBackend;
//! use termsplash::terminal::TerminalRenderer;
//!
//! let (backend, handle) = MockBackend::new(80, 24);
//! let mut renderer = TerminalRenderer::with_backend(Box::new(backend), false).unwrap();
//! renderer.buffer().put(5, 5, '*', None);
//! renderer.render();
//! assert!(handle.written_string().contains('*'));
//! ```

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::terminal::Backend;
use crate::terminal::input::InputEvent;

#[derive(Default)]
struct MockState {
    size: (u16, u16),
    written: Vec<u8>,
    events: VecDeque<InputEvent>,
    initialized: bool,
    cleaned_up: u32,
    clear_count: u32,
    mouse: bool,
}

/// Shared handle for inspecting and steering a [`MockBackend`] from
/// test code while the renderer owns the backend itself.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    /// Everything written so far, lossily decoded to a string.
    pub fn written_string(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().unwrap().written).into_owned()
    }

    pub fn written_bytes(&self) -> Vec<u8> {
        self.state.lock().unwrap().written.clone()
    }

    /// Discard the capture buffer (typically between frames).
    pub fn clear_written(&self) {
        self.state.lock().unwrap().written.clear();
    }

    /// Queue an input event for the next poll.
    pub fn push_event(&self, event: InputEvent) {
        self.state.lock().unwrap().events.push_back(event);
    }

    /// Change the size the backend reports from now on.
    pub fn set_size(&self, width: u16, height: u16) {
        self.state.lock().unwrap().size = (width, height);
    }

    pub fn initialized(&self) -> bool {
        self.state.lock().unwrap().initialized
    }

    /// How many times cleanup ran (must be exactly once per session).
    pub fn cleanup_count(&self) -> u32 {
        self.state.lock().unwrap().cleaned_up
    }

    /// How many hard screen clears were requested.
    pub fn clear_screen_count(&self) -> u32 {
        self.state.lock().unwrap().clear_count
    }

    pub fn mouse_requested(&self) -> bool {
        self.state.lock().unwrap().mouse
    }
}

/// A backend that records output instead of touching a terminal.
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a mock reporting the given size, plus its control handle.
    pub fn new(width: u16, height: u16) -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState {
            size: (width, height),
            ..MockState::default()
        }));
        let handle = MockHandle { state: state.clone() };
        (Self { state }, handle)
    }
}

impl Backend for MockBackend {
    fn init(&mut self, mouse: bool) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.initialized = true;
        state.mouse = mouse;
        Ok(())
    }

    fn cleanup(&mut self) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.initialized {
            state.initialized = false;
            state.cleaned_up += 1;
        }
        Ok(())
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        Ok(self.state.lock().unwrap().size)
    }

    fn poll_event(&mut self, _timeout: Duration) -> io::Result<Option<InputEvent>> {
        Ok(self.state.lock().unwrap().events.pop_front())
    }

    fn write_raw(&mut self, data: &[u8]) -> io::Result<()> {
        self.state.lock().unwrap().written.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn clear_screen(&mut self) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.clear_count += 1;
        state.written.extend_from_slice(b"\x1b[2J\x1b[H");
        Ok(())
    }
}
