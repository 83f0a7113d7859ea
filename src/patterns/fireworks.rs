// (C) 2025 - Enzo Lombardi

//! Fireworks - particle-system driven rockets and sparkle.
//!
//! A continuous ember emitter glows at the baseline while rockets burst
//! at random intervals. Clicking launches a burst at the pointer.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::core::buffer::Buffer;
use crate::core::geometry::{Point, Size};
use crate::core::theme::Theme;
use crate::scene::{EmitterConfig, ParticleSystem};

use super::{Pattern, PresetInfo};

pub static PRESETS: &[PresetInfo] = &[
    PresetInfo { id: 1, name: "sparse", description: "occasional single bursts" },
    PresetInfo { id: 2, name: "festive", description: "regular bursts plus embers" },
    PresetInfo { id: 3, name: "finale", description: "continuous barrage" },
    PresetInfo { id: 4, name: "fountain", description: "ground fountain only" },
    PresetInfo { id: 5, name: "heavy", description: "big slow shells" },
    PresetInfo { id: 6, name: "crackle", description: "small fast pops" },
];

const PARTICLE_CAP: usize = 2000;

pub struct Fireworks {
    theme: Theme,
    particles: ParticleSystem,
    burst_count: u32,
    burst_interval: f32, // mean seconds between rockets; 0 = none
    fountain_rate: f32,
    gravity: f32,
    until_next_burst: f32,
    fountain_installed: bool,
    pending_clicks: Vec<Point>,
    last_time: f64,
    rng: StdRng,
}

impl Fireworks {
    pub fn new(theme: Theme) -> Self {
        let mut fw = Self {
            theme,
            particles: ParticleSystem::new(PARTICLE_CAP),
            burst_count: 0,
            burst_interval: 0.0,
            fountain_rate: 0.0,
            gravity: 9.0,
            until_next_burst: 0.5,
            fountain_installed: false,
            pending_clicks: Vec::new(),
            last_time: 0.0,
            rng: StdRng::from_entropy(),
        };
        fw.apply_preset(2);
        fw
    }

    fn burst_config(&self, x: f32, y: f32) -> EmitterConfig {
        let lo = self.theme.color_for(0.55);
        let hi = self.theme.color_for(1.0);
        EmitterConfig {
            x,
            y,
            lifetime: 1.6,
            vx: (-9.0, 9.0),
            vy: (-7.0, 3.0),
            ax: 0.0,
            ay: self.gravity,
            color_range: (lo, hi),
            chars: vec!['*', '+', '.', 'x'],
            burst: Some(self.burst_count),
            ..EmitterConfig::default()
        }
    }

    fn install_fountain(&mut self, size: Size) {
        let lo = self.theme.color_for(0.3);
        let hi = self.theme.color_for(0.8);
        self.particles.add_emitter(EmitterConfig {
            x: size.width as f32 / 2.0,
            y: size.height as f32 - 1.0,
            rate: self.fountain_rate,
            lifetime: 1.2,
            vx: (-3.0, 3.0),
            vy: (-10.0, -4.0),
            ax: 0.0,
            ay: self.gravity,
            color_range: (lo, hi),
            chars: vec!['\'', '.', '`'],
            burst: None,
            max_particles: Some(400),
        });
        self.fountain_installed = true;
    }
}

impl Pattern for Fireworks {
    fn name(&self) -> &'static str {
        "fireworks"
    }

    fn render(&mut self, buf: &mut Buffer, time_ms: f64, size: Size, _mouse: Option<Point>) {
        if size.is_empty() {
            return;
        }
        let dt = if self.last_time > 0.0 {
            ((time_ms - self.last_time) / 1000.0).clamp(0.0, 0.25) as f32
        } else {
            0.0
        };
        self.last_time = time_ms;

        if self.fountain_rate > 0.0 && !self.fountain_installed {
            self.install_fountain(size);
        }

        // Clicked bursts fire exactly where the pointer was, even in
        // fountain-only presets
        let clicks: Vec<Point> = self.pending_clicks.drain(..).collect();
        for click in clicks {
            let mut cfg = self.burst_config(click.x as f32, click.y as f32);
            cfg.burst = Some(self.burst_count.max(30));
            self.particles.add_emitter(cfg);
        }

        if self.burst_interval > 0.0 {
            self.until_next_burst -= dt;
            if self.until_next_burst <= 0.0 {
                let x = self.rng.gen_range(0.1..0.9) * size.width as f32;
                let y = self.rng.gen_range(0.1..0.5) * size.height as f32;
                let cfg = self.burst_config(x, y);
                self.particles.add_emitter(cfg);
                self.until_next_burst = self.rng.gen_range(0.5..1.5) * self.burst_interval;
            }
        }

        self.particles.update(dt);
        self.particles.render(buf, size);
    }

    fn reset(&mut self) {
        self.particles.clear();
        self.pending_clicks.clear();
        self.fountain_installed = false;
        self.until_next_burst = 0.5;
        self.last_time = 0.0;
    }

    fn on_mouse_click(&mut self, pos: Point) {
        self.pending_clicks.push(pos);
    }

    fn apply_preset(&mut self, id: u32) -> bool {
        let (burst_count, burst_interval, fountain_rate, gravity) = match id {
            1 => (40, 3.0, 0.0, 9.0),
            2 => (60, 1.5, 30.0, 9.0),
            3 => (80, 0.4, 60.0, 9.0),
            4 => (0, 0.0, 120.0, 11.0),
            5 => (140, 2.5, 0.0, 5.0),
            6 => (25, 0.6, 0.0, 14.0),
            _ => return false,
        };
        self.burst_count = burst_count;
        self.burst_interval = burst_interval;
        self.fountain_rate = fountain_rate;
        self.gravity = gravity;
        // Emitters re-install with the new parameters
        self.particles.clear();
        self.fountain_installed = false;
        true
    }

    fn metrics(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("particles", self.particles.len() as f64),
            ("emitters", self.particles.emitter_count() as f64),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::theme::ThemeSet;

    fn fireworks() -> Fireworks {
        let themes = ThemeSet::builtin();
        let mut fw = Fireworks::new(themes.get(1).unwrap().clone());
        fw.rng = StdRng::seed_from_u64(42);
        fw
    }

    #[test]
    fn test_click_spawns_burst() {
        let mut fw = fireworks();
        fw.apply_preset(1); // no fountain, slow auto bursts
        let mut buf = Buffer::new(Size::new(60, 24));
        fw.render(&mut buf, 16.0, Size::new(60, 24), None);
        let before = fw.particles.len();

        fw.on_mouse_click(Point::new(30, 10));
        fw.render(&mut buf, 32.0, Size::new(60, 24), None);
        assert!(fw.particles.len() >= before + 40);
    }

    #[test]
    fn test_cap_respected_under_finale() {
        let mut fw = fireworks();
        fw.apply_preset(3);
        let mut buf = Buffer::new(Size::new(80, 24));
        let mut t = 0.0;
        for _ in 0..120 {
            t += 33.0;
            fw.render(&mut buf, t, Size::new(80, 24), None);
            assert!(fw.particles.len() <= PARTICLE_CAP);
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut fw = fireworks();
        let mut buf = Buffer::new(Size::new(60, 24));
        fw.on_mouse_click(Point::new(5, 5));
        fw.render(&mut buf, 16.0, Size::new(60, 24), None);
        fw.reset();
        assert_eq!(fw.particles.len(), 0);
        assert_eq!(fw.particles.emitter_count(), 0);
        assert_eq!(fw.last_time, 0.0);
        fw.reset();
        assert_eq!(fw.particles.len(), 0);
    }

    #[test]
    fn test_fountain_preset_installs_emitter() {
        let mut fw = fireworks();
        fw.apply_preset(4);
        let mut buf = Buffer::new(Size::new(60, 24));
        fw.render(&mut buf, 16.0, Size::new(60, 24), None);
        assert_eq!(fw.particles.emitter_count(), 1);
    }
}
