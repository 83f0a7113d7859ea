// (C) 2025 - Enzo Lombardi

//! Particle system - emitter-driven particle pool with continuous and
//! burst emission.
//!
//! The pool carries a configurable hard cap; emission beyond the cap
//! (global or per-emitter) is silently dropped. Continuous emitters
//! accumulate a fractional debt so non-integer per-frame rates emit the
//! right long-run count; burst emitters fire once and are removed.

use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::core::buffer::Buffer;
use crate::core::color::Color;
use crate::core::geometry::Size;

/// Emitter parameters.
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    pub x: f32,
    pub y: f32,
    /// Particles per second (continuous emitters).
    pub rate: f32,
    /// Seconds each particle lives.
    pub lifetime: f32,
    /// Initial velocity range, min..max per axis.
    pub vx: (f32, f32),
    pub vy: (f32, f32),
    pub ax: f32,
    pub ay: f32,
    /// Spawn colors interpolate between these two.
    pub color_range: (Color, Color),
    pub chars: Vec<char>,
    /// When set, the emitter fires this many particles on the next
    /// update and is then removed.
    pub burst: Option<u32>,
    /// Optional cap on this emitter's live particles.
    pub max_particles: Option<usize>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rate: 10.0,
            lifetime: 1.0,
            vx: (-1.0, 1.0),
            vy: (-1.0, 1.0),
            ax: 0.0,
            ay: 0.0,
            color_range: (Color::WHITE, Color::WHITE),
            chars: vec!['*'],
            burst: None,
            max_particles: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterId(u64);

struct Emitter {
    id: EmitterId,
    cfg: EmitterConfig,
    debt: f32,
}

struct Particle {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    ax: f32,
    ay: f32,
    life: f32,
    max_life: f32,
    ch: char,
    color: Color,
    emitter: EmitterId,
}

/// Bounded particle pool plus its emitters.
pub struct ParticleSystem {
    cap: usize,
    particles: Vec<Particle>,
    emitters: Vec<Emitter>,
    next_id: u64,
    rng: StdRng,
}

impl ParticleSystem {
    pub fn new(cap: usize) -> Self {
        Self::with_rng(cap, StdRng::from_entropy())
    }

    /// Deterministic construction for tests.
    pub fn with_seed(cap: usize, seed: u64) -> Self {
        Self::with_rng(cap, StdRng::seed_from_u64(seed))
    }

    fn with_rng(cap: usize, rng: StdRng) -> Self {
        Self {
            cap,
            particles: Vec::new(),
            emitters: Vec::new(),
            next_id: 1,
            rng,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    pub fn add_emitter(&mut self, cfg: EmitterConfig) -> EmitterId {
        let id = EmitterId(self.next_id);
        self.next_id += 1;
        self.emitters.push(Emitter { id, cfg, debt: 0.0 });
        id
    }

    pub fn remove_emitter(&mut self, id: EmitterId) -> bool {
        let before = self.emitters.len();
        self.emitters.retain(|e| e.id != id);
        before != self.emitters.len()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.emitters.clear();
    }

    /// Move an emitter (e.g. to follow the mouse).
    pub fn move_emitter(&mut self, id: EmitterId, x: f32, y: f32) {
        if let Some(e) = self.emitters.iter_mut().find(|e| e.id == id) {
            e.cfg.x = x;
            e.cfg.y = y;
        }
    }

    /// Emit due particles, integrate existing ones, expire and compact.
    /// `dt` is seconds.
    pub fn update(&mut self, dt: f32) {
        // Emission pass; burst emitters fire once then disappear.
        let mut spawn = Vec::new();
        for emitter in &mut self.emitters {
            match emitter.cfg.burst {
                Some(count) => {
                    for _ in 0..count {
                        spawn.push((emitter.id, emitter.cfg.clone()));
                    }
                }
                None => {
                    emitter.debt += emitter.cfg.rate * dt;
                    let due = emitter.debt.floor() as u32;
                    emitter.debt -= due as f32;
                    for _ in 0..due {
                        spawn.push((emitter.id, emitter.cfg.clone()));
                    }
                }
            }
        }
        self.emitters.retain(|e| e.cfg.burst.is_none());

        for (id, cfg) in spawn {
            self.spawn(id, &cfg);
        }

        // Integration: position by velocity, then velocity by
        // acceleration.
        for p in &mut self.particles {
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.vx += p.ax * dt;
            p.vy += p.ay * dt;
            p.life -= dt;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    fn spawn(&mut self, id: EmitterId, cfg: &EmitterConfig) {
        if self.particles.len() >= self.cap {
            return;
        }
        if let Some(limit) = cfg.max_particles {
            let live = self.particles.iter().filter(|p| p.emitter == id).count();
            if live >= limit {
                return;
            }
        }
        if cfg.chars.is_empty() || cfg.lifetime <= 0.0 {
            return;
        }
        let ch = cfg.chars[self.rng.gen_range(0..cfg.chars.len())];
        let t: f32 = self.rng.gen_range(0.0..=1.0);
        let color = cfg.color_range.0.lerp(cfg.color_range.1, t);
        let pick = |rng: &mut StdRng, (lo, hi): (f32, f32)| -> f32 {
            if hi > lo { rng.gen_range(lo..=hi) } else { lo }
        };
        let vx = pick(&mut self.rng, cfg.vx);
        let vy = pick(&mut self.rng, cfg.vy);
        self.particles.push(Particle {
            x: cfg.x,
            y: cfg.y,
            vx,
            vy,
            ax: cfg.ax,
            ay: cfg.ay,
            life: cfg.lifetime,
            max_life: cfg.lifetime,
            ch,
            color,
            emitter: id,
        });
    }

    /// Draw each live particle at the floor of its position, color
    /// faded by remaining life.
    pub fn render(&self, buf: &mut Buffer, _size: Size) {
        for p in &self.particles {
            let fade = (p.life / p.max_life).clamp(0.0, 1.0);
            buf.put(
                p.x.floor() as i16,
                p.y.floor() as i16,
                p.ch,
                Some(p.color.scaled(fade)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter(rate: f32) -> EmitterConfig {
        EmitterConfig {
            x: 5.0,
            y: 5.0,
            rate,
            lifetime: 10.0,
            vx: (0.0, 0.0),
            vy: (0.0, 0.0),
            ..EmitterConfig::default()
        }
    }

    #[test]
    fn test_fractional_emission_debt() {
        let mut sys = ParticleSystem::with_seed(1000, 7);
        sys.add_emitter(emitter(10.0));

        // 10/s at 0.05s per update: one particle every other update
        sys.update(0.05);
        assert_eq!(sys.len(), 0);
        sys.update(0.05);
        assert_eq!(sys.len(), 1);
        for _ in 0..18 {
            sys.update(0.05);
        }
        assert_eq!(sys.len(), 10);
    }

    #[test]
    fn test_burst_fires_once_and_removes_emitter() {
        let mut sys = ParticleSystem::with_seed(1000, 7);
        sys.add_emitter(EmitterConfig {
            burst: Some(25),
            ..emitter(0.0)
        });
        assert_eq!(sys.emitter_count(), 1);

        sys.update(0.016);
        assert_eq!(sys.len(), 25);
        assert_eq!(sys.emitter_count(), 0);

        sys.update(0.016);
        assert_eq!(sys.len(), 25);
    }

    #[test]
    fn test_global_cap_never_exceeded() {
        let mut sys = ParticleSystem::with_seed(30, 7);
        sys.add_emitter(EmitterConfig {
            burst: Some(100),
            ..emitter(0.0)
        });
        sys.add_emitter(emitter(10_000.0));

        for _ in 0..50 {
            sys.update(0.1);
            assert!(sys.len() <= 30, "cap exceeded: {}", sys.len());
        }
    }

    #[test]
    fn test_per_emitter_cap() {
        let mut sys = ParticleSystem::with_seed(1000, 7);
        sys.add_emitter(EmitterConfig {
            max_particles: Some(5),
            ..emitter(1000.0)
        });
        sys.update(0.1);
        assert_eq!(sys.len(), 5);
    }

    #[test]
    fn test_expiry_compacts() {
        let mut sys = ParticleSystem::with_seed(100, 7);
        sys.add_emitter(EmitterConfig {
            lifetime: 0.1,
            burst: Some(10),
            ..emitter(0.0)
        });
        sys.update(0.016);
        assert_eq!(sys.len(), 10);

        sys.update(0.2);
        assert_eq!(sys.len(), 0);
    }

    #[test]
    fn test_integration_applies_velocity_then_acceleration() {
        let mut sys = ParticleSystem::with_seed(10, 7);
        sys.add_emitter(EmitterConfig {
            burst: Some(1),
            vx: (2.0, 2.0),
            vy: (0.0, 0.0),
            ay: 10.0,
            ..emitter(0.0)
        });
        sys.update(0.0); // spawn at rest position
        let before = (sys.particles[0].x, sys.particles[0].y, sys.particles[0].vy);
        assert_eq!(before, (5.0, 5.0, 0.0));

        sys.update(1.0);
        let p = &sys.particles[0];
        // First step: position moved by the initial velocity only,
        // acceleration lands on the velocity afterwards.
        assert!((p.x - 7.0).abs() < 1e-5);
        assert!((p.y - 5.0).abs() < 1e-5);
        assert!((p.vy - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_render_fades_with_life() {
        let mut sys = ParticleSystem::with_seed(10, 7);
        sys.add_emitter(EmitterConfig {
            burst: Some(1),
            lifetime: 1.0,
            color_range: (Color::new(200, 200, 200), Color::new(200, 200, 200)),
            ..emitter(0.0)
        });
        sys.update(0.0);
        sys.update(0.5);

        let mut buf = Buffer::new(Size::new(10, 10));
        let _ = buf.diff();
        sys.render(&mut buf, Size::new(10, 10));
        let cell = buf.get(5, 5).unwrap();
        let c = cell.color.unwrap();
        assert!(c.r < 110 && c.r > 90, "expected ~half fade, got {:?}", c);
    }
}
