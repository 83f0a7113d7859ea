// (C) 2025 - Enzo Lombardi

//! Aquarium - layered scene-graph composition with sprite-driven fish.
//!
//! Three layers composited bottom-up: water shading, swaying weeds,
//! and a school of animated fish sprites that wrap around the tank.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::core::buffer::Buffer;
use crate::core::color::Color;
use crate::core::geometry::{Point, Size};
use crate::core::theme::Theme;
use crate::scene::{Layer, SceneGraph, Sprite, SpriteManager};

use super::{Pattern, PresetInfo};

pub static PRESETS: &[PresetInfo] = &[
    PresetInfo { id: 1, name: "pond", description: "a few lazy fish" },
    PresetInfo { id: 2, name: "tank", description: "small busy school" },
    PresetInfo { id: 3, name: "reef", description: "dense school, thick weeds" },
    PresetInfo { id: 4, name: "deep", description: "slow fish, no weeds" },
    PresetInfo { id: 5, name: "stream", description: "fast one-way current" },
    PresetInfo { id: 6, name: "fry", description: "many tiny darting fish" },
];

struct WaterLayer {
    phase: f32,
    color: Color,
}

impl Layer for WaterLayer {
    fn update(&mut self, dt: f32, _size: Size) {
        self.phase += dt * 0.8;
    }

    fn render(&self, buf: &mut Buffer, size: Size) {
        // Surface line with a slow travelling ripple
        for x in 0..size.width {
            let lift = ((x as f32 * 0.3 + self.phase).sin() > 0.6) as i16;
            buf.put(x, 1 - lift, '~', Some(self.color));
        }
    }
}

struct WeedLayer {
    phase: f32,
    density: f32,
    color: Color,
}

impl Layer for WeedLayer {
    fn update(&mut self, dt: f32, _size: Size) {
        self.phase += dt * 1.7;
    }

    fn render(&self, buf: &mut Buffer, size: Size) {
        if self.density <= 0.0 || size.height < 4 {
            return;
        }
        let step = (1.0 / self.density).max(2.0) as i16;
        let floor = size.height - 1;
        let mut x = step / 2;
        while x < size.width {
            let height = 2 + (x % 3);
            for k in 0..height {
                let sway = ((self.phase + x as f32 * 0.7 + k as f32 * 0.5).sin() * 1.2) as i16;
                let ch = if k == height - 1 { ')' } else { '(' };
                buf.put(x + sway, floor - k, ch, Some(self.color));
            }
            x += step;
        }
    }
}

struct FishLayer {
    sprites: SpriteManager,
}

impl Layer for FishLayer {
    fn update(&mut self, dt: f32, size: Size) {
        self.sprites.update(dt, size);
        // Wrap horizontally with a margin so fish glide off one edge
        // and back in the other
        let margin = 4.0;
        let width = size.width as f32;
        for fish in self.sprites.iter_mut() {
            if fish.vx > 0.0 && fish.x > width + margin {
                fish.x = -margin;
            } else if fish.vx < 0.0 && fish.x < -margin {
                fish.x = width + margin;
            }
        }
    }

    fn render(&self, buf: &mut Buffer, size: Size) {
        self.sprites.render(buf, size);
    }
}

pub struct Aquarium {
    theme: Theme,
    graph: Option<SceneGraph>,
    fish_count: usize,
    speed: (f32, f32),
    weed_density: f32,
    one_way: bool,
    built_for: Size,
    last_time: f64,
    rng: StdRng,
}

impl Aquarium {
    pub fn new(theme: Theme) -> Self {
        let mut aq = Self {
            theme,
            graph: None,
            fish_count: 0,
            speed: (0.0, 0.0),
            weed_density: 0.0,
            one_way: false,
            built_for: Size::zero(),
            last_time: 0.0,
            rng: StdRng::from_entropy(),
        };
        aq.apply_preset(2);
        aq
    }

    fn fish_frames(facing_right: bool) -> Vec<Vec<String>> {
        if facing_right {
            vec![vec!["><>".to_string()], vec!["}<>".to_string()]]
        } else {
            vec![vec!["<><".to_string()], vec!["<>{".to_string()]]
        }
    }

    fn build(&mut self, size: Size) -> SceneGraph {
        let mut graph = SceneGraph::new();
        let water = WaterLayer {
            phase: 0.0,
            color: self.theme.color_for(0.45),
        };
        let weeds = WeedLayer {
            phase: 0.0,
            density: self.weed_density,
            color: self.theme.color_for(0.25),
        };

        let mut sprites = SpriteManager::new();
        for i in 0..self.fish_count {
            let rightward = self.one_way || self.rng.r#gen::<bool>();
            let speed = self.rng.gen_range(self.speed.0..=self.speed.1);
            let y = self.rng.gen_range(3.0..(size.height.max(6) as f32 - 2.0));
            let x = self.rng.gen_range(0.0..size.width.max(1) as f32);
            let mut fish = Sprite::new(x, y, Self::fish_frames(rightward));
            fish.vx = if rightward { speed } else { -speed };
            fish.frame_duration = 0.4;
            fish.color = Some(self.theme.color_for(0.5 + 0.5 * (i as f32 / self.fish_count.max(1) as f32)));
            sprites.add(fish);
        }
        let fish = FishLayer { sprites };

        // Names are fixed per build; duplicates cannot happen here
        let _ = graph.add_layer("water", 0, Box::new(water));
        let _ = graph.add_layer("weeds", 1, Box::new(weeds));
        let _ = graph.add_layer("fish", 2, Box::new(fish));
        graph
    }
}

impl Pattern for Aquarium {
    fn name(&self) -> &'static str {
        "aquarium"
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

        if self.graph.is_none() || self.built_for != size {
            self.graph = Some(self.build(size));
            self.built_for = size;
        }
        if let Some(graph) = &mut self.graph {
            graph.update(dt, size);
            graph.render(buf, size);
        }
    }

    fn reset(&mut self) {
        self.graph = None;
        self.built_for = Size::zero();
        self.last_time = 0.0;
    }

    fn on_resize(&mut self, _size: Size) {
        // Rebuilt lazily on the next render with the new tank bounds
        self.graph = None;
    }

    fn apply_preset(&mut self, id: u32) -> bool {
        let (fish, speed, weeds, one_way) = match id {
            1 => (4, (2.0, 4.0), 0.08, false),
            2 => (10, (3.0, 7.0), 0.12, false),
            3 => (22, (3.0, 8.0), 0.25, false),
            4 => (8, (1.0, 2.5), 0.0, false),
            5 => (14, (8.0, 14.0), 0.06, true),
            6 => (30, (6.0, 12.0), 0.10, false),
            _ => return false,
        };
        self.fish_count = fish;
        self.speed = speed;
        self.weed_density = weeds;
        self.one_way = one_way;
        self.graph = None;
        true
    }

    fn metrics(&self) -> Vec<(&'static str, f64)> {
        vec![("fish", self.fish_count as f64)]
    }
}
