// (C) 2025 - Enzo Lombardi
// Composition helpers offered to pattern implementations: layered scene
// graph, animated sprites, and an emitter-driven particle pool. The
// engine itself does not depend on any of them.

pub mod graph;
pub mod particles;
pub mod sprites;

pub use graph::{Layer, SceneGraph};
pub use particles::{EmitterConfig, EmitterId, ParticleSystem};
pub use sprites::{Sprite, SpriteManager};
