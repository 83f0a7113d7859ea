// (C) 2025 - Enzo Lombardi

//! Command buffer - multi-key input accumulator for command mode.
//!
//! On activation the buffer holds the sentinel `'0'` at position 0; the
//! sentinel cannot be deleted and the cursor never moves before it.
//! Executed commands land in a bounded history (50 entries, consecutive
//! duplicates collapsed) navigable with up/down. Ten seconds of
//! inactivity cancels the buffer; every edit resets the clock.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const SENTINEL: char = '0';
const HISTORY_CAP: usize = 50;
const INACTIVITY: Duration = Duration::from_secs(10);

pub struct CommandBuffer {
    active: bool,
    buffer: String,
    cursor: usize,
    deadline: Option<Instant>,
    history: VecDeque<String>,
    history_index: Option<usize>,
    stash: String,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self {
            active: false,
            buffer: String::new(),
            cursor: 0,
            deadline: None,
            history: VecDeque::new(),
            history_index: None,
            stash: String::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Cursor as a character index into the buffer.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Enter command mode: sentinel in, cursor after it, clock started.
    pub fn activate(&mut self) {
        self.active = true;
        self.buffer.clear();
        self.buffer.push(SENTINEL);
        self.cursor = 1;
        self.history_index = None;
        self.touch();
    }

    /// Insert a character at the cursor. Ignored when inactive.
    pub fn add_char(&mut self, c: char) {
        if !self.active {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
        self.history_index = None;
        self.touch();
    }

    /// Remove the character before the cursor. The sentinel at position
    /// 0 is indelible.
    pub fn backspace(&mut self) {
        if !self.active || self.cursor <= 1 {
            return;
        }
        let at = self.byte_index(self.cursor - 1);
        self.buffer.remove(at);
        self.cursor -= 1;
        self.touch();
    }

    pub fn move_cursor_left(&mut self) {
        if self.active && self.cursor > 1 {
            self.cursor -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.active && self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    /// Load the previous (older) history entry.
    pub fn previous_command(&mut self) {
        if !self.active || self.history.is_empty() {
            return;
        }
        let next_index = match self.history_index {
            None => {
                self.stash = self.buffer.clone();
                0
            }
            Some(i) => (i + 1).min(self.history.len() - 1),
        };
        self.history_index = Some(next_index);
        self.load(self.history[self.history.len() - 1 - next_index].clone());
    }

    /// Load the next (newer) history entry, or restore the in-progress
    /// text when walking past the newest.
    pub fn next_command(&mut self) {
        if !self.active {
            return;
        }
        match self.history_index {
            None => {}
            Some(0) => {
                self.history_index = None;
                let stash = std::mem::take(&mut self.stash);
                self.load(stash);
            }
            Some(i) => {
                self.history_index = Some(i - 1);
                self.load(self.history[self.history.len() - i].clone());
            }
        }
    }

    fn load(&mut self, text: String) {
        self.buffer = text;
        self.cursor = self.char_len();
        self.touch();
    }

    /// Yield the buffer, deactivate, and record history. Entries of
    /// length 1 (the bare sentinel) and consecutive duplicates are not
    /// recorded.
    pub fn execute(&mut self) -> String {
        let result = std::mem::take(&mut self.buffer);
        if result.chars().count() > 1 && self.history.back() != Some(&result) {
            if self.history.len() == HISTORY_CAP {
                self.history.pop_front();
            }
            self.history.push_back(result.clone());
        }
        self.deactivate();
        result
    }

    /// Leave command mode without touching history.
    pub fn cancel(&mut self) {
        self.buffer.clear();
        self.deactivate();
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.buffer.clear();
        self.cursor = 0;
        self.deadline = None;
        self.history_index = None;
    }

    /// Whether the inactivity window has elapsed.
    pub fn expired(&self, now: Instant) -> bool {
        self.active && self.deadline.is_some_and(|d| now >= d)
    }

    fn touch(&mut self) {
        self.deadline = Some(Instant::now() + INACTIVITY);
    }

    fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_index)
            .map_or(self.buffer.len(), |(i, _)| i)
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}
