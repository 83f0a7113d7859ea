// (C) 2025 - Enzo Lombardi

//! Pattern contract - the polymorphic surface every animation plugs
//! into the engine through, plus the registry that names, builds and
//! catalogues the built-in set.

pub mod aquarium;
pub mod fireworks;
pub mod rain;
pub mod starfield;
pub mod waves;

use crate::core::buffer::Buffer;
use crate::core::geometry::{Point, Size};
use crate::core::theme::Theme;

/// A procedural animation. `render` composes one frame into the back
/// buffer; everything else is optional lifecycle surface with no-op
/// defaults.
///
/// `time_ms` is an absolute monotonic millisecond timestamp. Patterns
/// doing frame-independent integration derive `dt` from it and clear
/// their `last_time` in `reset`; purely periodic patterns may use it
/// directly.
pub trait Pattern {
    /// Stable identifier; doubles as the canonical lowercase key.
    fn name(&self) -> &'static str;

    fn render(&mut self, buf: &mut Buffer, time_ms: f64, size: Size, mouse: Option<Point>);

    /// Clear all transient state. Idempotent, callable at any time.
    fn reset(&mut self);

    fn on_mouse_move(&mut self, _pos: Point) {}

    fn on_mouse_click(&mut self, _pos: Point) {}

    /// Apply a preset; `true` iff the id was known and applied.
    fn apply_preset(&mut self, _id: u32) -> bool {
        false
    }

    /// Live numbers for the debug overlay.
    fn metrics(&self) -> Vec<(&'static str, f64)> {
        Vec::new()
    }

    fn on_activate(&mut self) {}

    fn on_deactivate(&mut self) {}

    fn on_resize(&mut self, _size: Size) {}

    fn on_fps_change(&mut self, _fps: u32) {}
}

/// One entry in a pattern's static preset catalogue.
#[derive(Debug, Clone, Copy)]
pub struct PresetInfo {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
}

type PatternFactory = fn(&Theme) -> Box<dyn Pattern>;

struct RegistryEntry {
    name: &'static str,
    build: PatternFactory,
    presets: &'static [PresetInfo],
}

/// Maps 1-based indices and lowercase names to pattern factories.
/// Theme changes rebuild the active pattern through its factory.
pub struct PatternRegistry {
    entries: Vec<RegistryEntry>,
}

impl PatternRegistry {
    /// The built-in catalogue, in display order.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                RegistryEntry {
                    name: "waves",
                    build: |theme| Box::new(waves::Waves::new(theme.clone())),
                    presets: waves::PRESETS,
                },
                RegistryEntry {
                    name: "rain",
                    build: |theme| Box::new(rain::Rain::new(theme.clone())),
                    presets: rain::PRESETS,
                },
                RegistryEntry {
                    name: "starfield",
                    build: |theme| Box::new(starfield::Starfield::new(theme.clone())),
                    presets: starfield::PRESETS,
                },
                RegistryEntry {
                    name: "fireworks",
                    build: |theme| Box::new(fireworks::Fireworks::new(theme.clone())),
                    presets: fireworks::PRESETS,
                },
                RegistryEntry {
                    name: "aquarium",
                    build: |theme| Box::new(aquarium::Aquarium::new(theme.clone())),
                    presets: aquarium::PRESETS,
                },
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn name_of(&self, index: usize) -> Option<&'static str> {
        self.entries.get(index).map(|e| e.name)
    }

    /// Build the pattern at a 0-based index with the given theme.
    pub fn build(&self, index: usize, theme: &Theme) -> Option<Box<dyn Pattern>> {
        self.entries.get(index).map(|e| (e.build)(theme))
    }

    /// Preset catalogue for a 0-based index.
    pub fn presets(&self, index: usize) -> &'static [PresetInfo] {
        self.entries.get(index).map_or(&[], |e| e.presets)
    }

    /// Resolve a pattern by 1-based index or case-insensitive name
    /// (exact first, then prefix, then substring).
    pub fn resolve(&self, key: &str) -> Option<usize> {
        if let Ok(n) = key.parse::<usize>() {
            if n >= 1 && n <= self.entries.len() {
                return Some(n - 1);
            }
            return None;
        }
        let needle = key.to_lowercase();
        if let Some(i) = self.entries.iter().position(|e| e.name == needle) {
            return Some(i);
        }
        if let Some(i) = self.entries.iter().position(|e| e.name.starts_with(&needle)) {
            return Some(i);
        }
        self.entries.iter().position(|e| e.name.contains(&needle))
    }

    /// Case-insensitive substring search over pattern names.
    pub fn search(&self, term: &str) -> Vec<&'static str> {
        let needle = term.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.name.contains(&needle))
            .map(|e| e.name)
            .collect()
    }
}
