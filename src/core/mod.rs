// (C) 2025 - Enzo Lombardi
// Core primitives: geometry, color, themes, cell buffer, events,
// performance accounting and error types.

pub mod buffer;
pub mod color;
pub mod error;
pub mod events;
pub mod geometry;
pub mod perf;
pub mod theme;
