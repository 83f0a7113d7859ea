// (C) 2025 - Enzo Lombardi

//! Waves - interference field of travelling sine waves.
//!
//! Purely periodic: samples the wave field directly from the absolute
//! timestamp, so it needs no dt bookkeeping. Mouse movement plants a
//! ripple center that adds a radial component.

use crate::core::buffer::Buffer;
use crate::core::geometry::{Point, Size};
use crate::core::theme::Theme;

use super::{Pattern, PresetInfo};

const RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

pub static PRESETS: &[PresetInfo] = &[
    PresetInfo { id: 1, name: "calm", description: "long slow swells" },
    PresetInfo { id: 2, name: "choppy", description: "short fast waves" },
    PresetInfo { id: 3, name: "cross", description: "two crossing wavefronts" },
    PresetInfo { id: 4, name: "swell", description: "tall rolling swell" },
    PresetInfo { id: 5, name: "ripple", description: "radial ripples only" },
    PresetInfo { id: 6, name: "storm", description: "everything at once" },
];

pub struct Waves {
    theme: Theme,
    freq_x: f32,
    freq_y: f32,
    speed: f32,
    cross: f32,
    ripple: f32,
    ripple_center: Option<Point>,
}

impl Waves {
    pub fn new(theme: Theme) -> Self {
        let mut waves = Self {
            theme,
            freq_x: 0.0,
            freq_y: 0.0,
            speed: 0.0,
            cross: 0.0,
            ripple: 0.0,
            ripple_center: None,
        };
        waves.apply_preset(1);
        waves
    }

    fn intensity(&self, x: f32, y: f32, t: f32) -> f32 {
        let mut v = (x * self.freq_x + t * self.speed).sin()
            + (y * self.freq_y + t * self.speed * 0.7).sin();
        if self.cross > 0.0 {
            v += self.cross * ((x + y) * self.freq_x * 0.6 - t * self.speed * 1.3).sin();
        }
        if self.ripple > 0.0 {
            if let Some(center) = self.ripple_center {
                let dx = x - center.x as f32;
                let dy = (y - center.y as f32) * 2.0; // cells are ~2:1
                let dist = (dx * dx + dy * dy).sqrt();
                v += self.ripple * (dist * 0.5 - t * self.speed * 2.0).sin();
            }
        }
        // Normalize the sum of up to four unit waves into [0, 1]
        (v / 4.0 + 0.5).clamp(0.0, 1.0)
    }
}

impl Pattern for Waves {
    fn name(&self) -> &'static str {
        "waves"
    }

    fn render(&mut self, buf: &mut Buffer, time_ms: f64, size: Size, mouse: Option<Point>) {
        if size.is_empty() {
            return;
        }
        if let Some(pos) = mouse {
            self.ripple_center = Some(pos);
        }
        let t = (time_ms / 1000.0) as f32;
        for y in 0..size.height {
            for x in 0..size.width {
                let v = self.intensity(x as f32, y as f32, t);
                let ch = RAMP[((v * (RAMP.len() - 1) as f32) as usize).min(RAMP.len() - 1)];
                if ch != ' ' {
                    buf.put(x, y, ch, Some(self.theme.color_for(v)));
                }
            }
        }
    }

    fn reset(&mut self) {
        self.ripple_center = None;
    }

    fn on_mouse_move(&mut self, pos: Point) {
        self.ripple_center = Some(pos);
    }

    fn apply_preset(&mut self, id: u32) -> bool {
        let (freq_x, freq_y, speed, cross, ripple) = match id {
            1 => (0.10, 0.22, 0.8, 0.0, 0.0),
            2 => (0.35, 0.55, 2.4, 0.0, 0.0),
            3 => (0.18, 0.30, 1.2, 1.0, 0.0),
            4 => (0.06, 0.14, 1.6, 0.0, 0.0),
            5 => (0.12, 0.20, 1.0, 0.0, 1.4),
            6 => (0.28, 0.40, 2.0, 0.8, 1.0),
            _ => return false,
        };
        self.freq_x = freq_x;
        self.freq_y = freq_y;
        self.speed = speed;
        self.cross = cross;
        self.ripple = ripple;
        true
    }

    fn metrics(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("freq_x", self.freq_x as f64),
            ("speed", self.speed as f64),
        ]
    }
}
