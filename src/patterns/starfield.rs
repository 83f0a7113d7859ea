// (C) 2025 - Enzo Lombardi

//! Starfield - perspective-projected star travel.
//!
//! Stars live in a unit cube in front of the camera and stream past;
//! mouse movement steers the vanishing point. Integrates with dt so
//! travel speed is fps-independent.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::core::buffer::Buffer;
use crate::core::geometry::{Point, Size};
use crate::core::theme::Theme;

use super::{Pattern, PresetInfo};

pub static PRESETS: &[PresetInfo] = &[
    PresetInfo { id: 1, name: "drift", description: "slow sparse drift" },
    PresetInfo { id: 2, name: "cruise", description: "steady cruise" },
    PresetInfo { id: 3, name: "warp", description: "fast and dense" },
    PresetInfo { id: 4, name: "hyper", description: "streaking hyperspace" },
    PresetInfo { id: 5, name: "dust", description: "dense slow dust" },
    PresetInfo { id: 6, name: "comets", description: "few bright streaks" },
];

struct Star {
    x: f32, // [-1, 1] camera plane
    y: f32,
    z: f32, // depth, 0 = at camera
}

pub struct Starfield {
    theme: Theme,
    stars: Vec<Star>,
    count: usize,
    speed: f32,
    streak: bool,
    center: Option<Point>,
    last_time: f64,
    rng: StdRng,
}

impl Starfield {
    pub fn new(theme: Theme) -> Self {
        let mut field = Self {
            theme,
            stars: Vec::new(),
            count: 0,
            speed: 0.0,
            streak: false,
            center: None,
            last_time: 0.0,
            rng: StdRng::from_entropy(),
        };
        field.apply_preset(2);
        field
    }

    fn spawn_star(&mut self, z: f32) -> Star {
        Star {
            x: self.rng.gen_range(-1.0..1.0),
            y: self.rng.gen_range(-1.0..1.0),
            z,
        }
    }

    fn glyph(depth: f32, streak: bool) -> char {
        if streak && depth < 0.25 {
            return '|';
        }
        match depth {
            d if d < 0.3 => '@',
            d if d < 0.55 => '*',
            d if d < 0.8 => '+',
            _ => '.',
        }
    }
}

impl Pattern for Starfield {
    fn name(&self) -> &'static str {
        "starfield"
    }

    fn render(&mut self, buf: &mut Buffer, time_ms: f64, size: Size, mouse: Option<Point>) {
        if size.is_empty() {
            return;
        }
        let dt = if self.last_time > 0.0 {
            ((time_ms - self.last_time) / 1000.0).clamp(0.0, 0.25) as f32
        } else {
            0.0
        };
        self.last_time = time_ms;

        if let Some(pos) = mouse {
            self.center = Some(pos);
        }

        while self.stars.len() < self.count {
            let z = self.rng.gen_range(0.05..1.0);
            let star = self.spawn_star(z);
            self.stars.push(star);
        }
        self.stars.truncate(self.count);

        let (cx, cy) = match self.center {
            Some(p) => (p.x as f32, p.y as f32),
            None => (size.width as f32 / 2.0, size.height as f32 / 2.0),
        };
        let scale = size.width.min(size.height * 2) as f32 / 2.0;

        let speed = self.speed;
        for star in &mut self.stars {
            star.z -= speed * dt;
        }
        // Respawn stars that flew past the camera
        for i in 0..self.stars.len() {
            if self.stars[i].z <= 0.01 {
                let replacement = self.spawn_star(1.0);
                self.stars[i] = replacement;
            }
        }

        for star in &self.stars {
            let px = cx + star.x / star.z * scale;
            let py = cy + star.y / star.z * scale * 0.5;
            let brightness = (1.0 - star.z).clamp(0.0, 1.0);
            let ch = Self::glyph(star.z, self.streak);
            buf.put(
                px.floor() as i16,
                py.floor() as i16,
                ch,
                Some(self.theme.color_for(brightness)),
            );
        }
    }

    fn reset(&mut self) {
        self.stars.clear();
        self.center = None;
        self.last_time = 0.0;
    }

    fn on_mouse_move(&mut self, pos: Point) {
        self.center = Some(pos);
    }

    fn apply_preset(&mut self, id: u32) -> bool {
        let (count, speed, streak) = match id {
            1 => (60, 0.08, false),
            2 => (140, 0.20, false),
            3 => (260, 0.45, false),
            4 => (200, 0.80, true),
            5 => (400, 0.06, false),
            6 => (30, 0.55, true),
            _ => return false,
        };
        self.count = count;
        self.speed = speed;
        self.streak = streak;
        true
    }

    fn metrics(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("stars", self.stars.len() as f64),
            ("speed", self.speed as f64),
        ]
    }
}
