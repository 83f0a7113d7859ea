// (C) 2025 - Enzo Lombardi

//! Scene graph - named layers composited in z-order.
//!
//! Layers update and render sorted ascending by z-index; ties keep
//! insertion order. Invisible layers are skipped entirely.

use crate::core::buffer::Buffer;
use crate::core::error::{Result, SplashError};
use crate::core::geometry::Size;

/// Behavior of a single scene layer.
pub trait Layer {
    fn update(&mut self, dt: f32, size: Size);
    fn render(&self, buf: &mut Buffer, size: Size);
}

struct Entry {
    name: String,
    z_index: i32,
    visible: bool,
    layer: Box<dyn Layer>,
}

/// Ordered mapping from layer name to a z-indexed layer.
pub struct SceneGraph {
    entries: Vec<Entry>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register a layer. Duplicate names are an error.
    pub fn add_layer(&mut self, name: &str, z_index: i32, layer: Box<dyn Layer>) -> Result<()> {
        if self.entries.iter().any(|e| e.name == name) {
            return Err(SplashError::duplicate_layer(name));
        }
        self.entries.push(Entry {
            name: name.to_string(),
            z_index,
            visible: true,
            layer,
        });
        // Stable sort keeps insertion order for equal z-indices.
        self.entries.sort_by_key(|e| e.z_index);
        Ok(())
    }

    pub fn remove_layer(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        before != self.entries.len()
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn is_visible(&self, name: &str) -> Option<bool> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.visible)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance all visible layers, ascending z.
    pub fn update(&mut self, dt: f32, size: Size) {
        for entry in &mut self.entries {
            if entry.visible {
                entry.layer.update(dt, size);
            }
        }
    }

    /// Render all visible layers, ascending z.
    pub fn render(&self, buf: &mut Buffer, size: Size) {
        for entry in &self.entries {
            if entry.visible {
                entry.layer.render(buf, size);
            }
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
