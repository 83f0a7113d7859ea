// (C) 2025 - Enzo Lombardi

//! Rain - falling glyph columns with fading trails.
//!
//! Frame-rate independent: integrates column positions from the dt
//! between render timestamps, so the fall speed survives fps changes.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::core::buffer::Buffer;
use crate::core::geometry::{Point, Size};
use crate::core::theme::Theme;

use super::{Pattern, PresetInfo};

const GLYPHS: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

pub static PRESETS: &[PresetInfo] = &[
    PresetInfo { id: 1, name: "drizzle", description: "sparse slow columns" },
    PresetInfo { id: 2, name: "steady", description: "medium density" },
    PresetInfo { id: 3, name: "downpour", description: "dense and fast" },
    PresetInfo { id: 4, name: "comet", description: "long bright trails" },
    PresetInfo { id: 5, name: "sleet", description: "fast short streaks" },
    PresetInfo { id: 6, name: "glitch", description: "jittery glyph churn" },
];

struct Column {
    head: f32,
    speed: f32,
    trail: u16,
    glyph_seed: u64,
}

pub struct Rain {
    theme: Theme,
    columns: Vec<Column>,
    density: f32,
    speed_range: (f32, f32),
    trail_range: (u16, u16),
    churn: f32,
    last_time: f64,
    rng: StdRng,
}

impl Rain {
    pub fn new(theme: Theme) -> Self {
        let mut rain = Self {
            theme,
            columns: Vec::new(),
            density: 0.0,
            speed_range: (0.0, 0.0),
            trail_range: (0, 0),
            churn: 0.0,
            last_time: 0.0,
            rng: StdRng::from_entropy(),
        };
        rain.apply_preset(2);
        rain
    }

    fn respawn(&mut self, width: usize, height: i16) {
        self.columns.clear();
        // At most one column per screen column
        let count = ((width as f32 * self.density) as usize).min(width);
        for _ in 0..count {
            let head = -self.rng.gen_range(0.0..height.max(1) as f32);
            let col = self.new_column(head);
            self.columns.push(col);
        }
    }

    fn new_column(&mut self, head: f32) -> Column {
        Column {
            head,
            speed: self.rng.gen_range(self.speed_range.0..=self.speed_range.1),
            trail: self.rng.gen_range(self.trail_range.0..=self.trail_range.1),
            glyph_seed: self.rng.r#gen(),
        }
    }

    fn glyph_at(seed: u64, y: i16, churn_tick: u64) -> char {
        // Cheap stateless hash so trails shimmer without storing glyphs
        let mut h = seed ^ (y as u64).wrapping_mul(0x9E3779B97F4A7C15) ^ churn_tick;
        h ^= h >> 33;
        h = h.wrapping_mul(0xFF51AFD7ED558CCD);
        h ^= h >> 33;
        GLYPHS[(h % GLYPHS.len() as u64) as usize]
    }
}

impl Pattern for Rain {
    fn name(&self) -> &'static str {
        "rain"
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

        let width = size.width as usize;
        if self.columns.is_empty() || self.columns.len() > width {
            self.respawn(width, size.height);
            if self.columns.is_empty() {
                return;
            }
        }

        let churn_tick = if self.churn > 0.0 {
            (time_ms / (1000.0 / self.churn as f64)) as u64
        } else {
            0
        };

        let height = size.height;
        let spacing = (width.max(1) / self.columns.len().max(1)).max(1);
        for (i, col) in self.columns.iter_mut().enumerate() {
            col.head += col.speed * dt;
            let x = (i * spacing) as i16;
            let head_y = col.head.floor() as i16;

            for k in 0..=col.trail as i16 {
                let y = head_y - k;
                if y < 0 || y >= height {
                    continue;
                }
                let fade = 1.0 - k as f32 / (col.trail + 1) as f32;
                let ch = Self::glyph_at(col.glyph_seed, y, churn_tick);
                buf.put(x, y, ch, Some(self.theme.color_for(fade)));
            }

            if head_y - col.trail as i16 > height {
                let trail = self.trail_range;
                let speed = self.speed_range;
                col.head = 0.0;
                col.speed = self.rng.gen_range(speed.0..=speed.1);
                col.trail = self.rng.gen_range(trail.0..=trail.1);
                col.glyph_seed = self.rng.r#gen();
            }
        }
    }

    fn reset(&mut self) {
        self.columns.clear();
        self.last_time = 0.0;
    }

    fn on_resize(&mut self, _size: Size) {
        // Columns respawn lazily on the next render
        self.columns.clear();
    }

    fn apply_preset(&mut self, id: u32) -> bool {
        let (density, speed, trail, churn) = match id {
            1 => (0.15, (3.0, 8.0), (3, 6), 0.0),
            2 => (0.40, (6.0, 14.0), (4, 10), 2.0),
            3 => (0.85, (12.0, 26.0), (6, 14), 4.0),
            4 => (0.30, (8.0, 12.0), (14, 24), 1.0),
            5 => (0.60, (20.0, 34.0), (2, 4), 0.0),
            6 => (0.50, (6.0, 18.0), (4, 8), 16.0),
            _ => return false,
        };
        self.density = density;
        self.speed_range = speed;
        self.trail_range = trail;
        self.churn = churn;
        self.columns.clear();
        true
    }

    fn metrics(&self) -> Vec<(&'static str, f64)> {
        vec![("columns", self.columns.len() as f64)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::theme::ThemeSet;

    fn rain() -> Rain {
        let themes = ThemeSet::builtin();
        Rain::new(themes.get(3).unwrap().clone())
    }

    #[test]
    fn test_render_spawns_columns() {
        let mut r = rain();
        let mut buf = Buffer::new(Size::new(40, 20));
        let _ = buf.diff();
        r.render(&mut buf, 16.0, Size::new(40, 20), None);
        assert!(!r.columns.is_empty());
    }

    #[test]
    fn test_dt_integration_moves_heads() {
        let mut r = rain();
        let mut buf = Buffer::new(Size::new(40, 20));
        r.render(&mut buf, 1000.0, Size::new(40, 20), None);
        let before: Vec<f32> = r.columns.iter().map(|c| c.head).collect();
        r.render(&mut buf, 1100.0, Size::new(40, 20), None);
        let moved = r
            .columns
            .iter()
            .zip(&before)
            .any(|(c, b)| c.head > *b);
        assert!(moved);
    }

    #[test]
    fn test_reset_clears_time_and_columns() {
        let mut r = rain();
        let mut buf = Buffer::new(Size::new(40, 20));
        r.render(&mut buf, 1000.0, Size::new(40, 20), None);
        r.reset();
        assert!(r.columns.is_empty());
        assert_eq!(r.last_time, 0.0);
        r.reset();
        assert!(r.columns.is_empty());
    }

    #[test]
    fn test_presets() {
        let mut r = rain();
        for id in 1..=6 {
            assert!(r.apply_preset(id));
        }
        assert!(!r.apply_preset(9));
    }

    #[test]
    fn test_degenerate_size_noop() {
        let mut r = rain();
        let mut buf = Buffer::new(Size::new(0, 0));
        let _ = buf.diff();
        r.render(&mut buf, 10.0, Size::new(0, -1), None);
        assert!(buf.diff().is_empty());
    }
}
