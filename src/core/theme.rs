// (C) 2025 - Enzo Lombardi

//! Theme palettes - named color gradients sampled by intensity.
//!
//! A [`Theme`] is an immutable ordered list of gradient stops. Patterns
//! sample it with [`Theme::color_for`], mapping an intensity in `[0, 1]`
//! to a color; sampling is total and monotone over the stop positions.
//! The built-in set is registered in a [`ThemeSet`] addressable by
//! 1-based index or case-insensitive name.

use super::color::Color;

/// A gradient stop: position in [0, 1] plus the color at that position.
#[derive(Debug, Clone, Copy)]
struct Stop {
    at: f32,
    color: Color,
}

/// A named, immutable color gradient.
#[derive(Debug, Clone)]
pub struct Theme {
    name: &'static str,
    stops: Vec<Stop>,
}

impl Theme {
    /// Build a theme from `(position, color)` stops.
    ///
    /// Stops are sorted by position; the first and last stop define the
    /// endpoint colors for out-of-range intensities.
    pub fn new(name: &'static str, stops: &[(f32, Color)]) -> Self {
        let mut stops: Vec<Stop> = stops
            .iter()
            .map(|&(at, color)| Stop { at: at.clamp(0.0, 1.0), color })
            .collect();
        stops.sort_by(|a, b| a.at.total_cmp(&b.at));
        debug_assert!(!stops.is_empty());
        Self { name, stops }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Sample the gradient at `intensity`, clamped to [0, 1].
    pub fn color_for(&self, intensity: f32) -> Color {
        let t = if intensity.is_finite() { intensity.clamp(0.0, 1.0) } else { 0.0 };
        let first = self.stops[0];
        if t <= first.at {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t <= hi.at {
                let span = hi.at - lo.at;
                let local = if span > 0.0 { (t - lo.at) / span } else { 1.0 };
                return lo.color.lerp(hi.color, local);
            }
        }
        self.stops[self.stops.len() - 1].color
    }
}

/// The registered theme catalogue.
pub struct ThemeSet {
    themes: Vec<Theme>,
}

impl ThemeSet {
    /// Construct the built-in catalogue.
    pub fn builtin() -> Self {
        let themes = vec![
            Theme::new(
                "classic",
                &[
                    (0.0, Color::new(0, 32, 64)),
                    (0.5, Color::new(0, 128, 192)),
                    (1.0, Color::new(224, 244, 255)),
                ],
            ),
            Theme::new(
                "fire",
                &[
                    (0.0, Color::new(32, 0, 0)),
                    (0.35, Color::new(180, 32, 0)),
                    (0.7, Color::new(255, 140, 0)),
                    (1.0, Color::new(255, 255, 160)),
                ],
            ),
            Theme::new(
                "ocean",
                &[
                    (0.0, Color::new(0, 16, 48)),
                    (0.5, Color::new(0, 96, 144)),
                    (1.0, Color::new(144, 224, 232)),
                ],
            ),
            Theme::new(
                "matrix",
                &[
                    (0.0, Color::new(0, 24, 0)),
                    (0.6, Color::new(0, 160, 48)),
                    (1.0, Color::new(180, 255, 180)),
                ],
            ),
            Theme::new(
                "mono",
                &[(0.0, Color::new(24, 24, 24)), (1.0, Color::new(235, 235, 235))],
            ),
            Theme::new(
                "sunset",
                &[
                    (0.0, Color::new(48, 0, 64)),
                    (0.4, Color::new(192, 48, 96)),
                    (0.75, Color::new(255, 128, 64)),
                    (1.0, Color::new(255, 224, 128)),
                ],
            ),
        ];
        Self { themes }
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Get a theme by 0-based index.
    pub fn get(&self, index: usize) -> Option<&Theme> {
        self.themes.get(index)
    }

    /// Resolve a theme by 1-based index or case-insensitive name
    /// (partial prefix match, like pattern resolution).
    pub fn resolve(&self, key: &str) -> Option<usize> {
        if let Ok(n) = key.parse::<usize>() {
            if n >= 1 && n <= self.themes.len() {
                return Some(n - 1);
            }
            return None;
        }
        let needle = key.to_lowercase();
        // Exact match wins over prefix match
        if let Some(i) = self.themes.iter().position(|t| t.name() == needle) {
            return Some(i);
        }
        self.themes.iter().position(|t| t.name().starts_with(&needle))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.themes.iter().map(Theme::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_for_endpoints() {
        let set = ThemeSet::builtin();
        let fire = set.get(set.resolve("fire").unwrap()).unwrap();
        assert_eq!(fire.color_for(0.0), Color::new(32, 0, 0));
        assert_eq!(fire.color_for(1.0), Color::new(255, 255, 160));
    }

    #[test]
    fn test_color_for_clamps_out_of_range() {
        let set = ThemeSet::builtin();
        let mono = set.get(set.resolve("mono").unwrap()).unwrap();
        assert_eq!(mono.color_for(-3.0), mono.color_for(0.0));
        assert_eq!(mono.color_for(42.0), mono.color_for(1.0));
        assert_eq!(mono.color_for(f32::NAN), mono.color_for(0.0));
    }

    #[test]
    fn test_color_for_monotone_brightness() {
        // mono is a black->white ramp; red channel must never decrease
        let set = ThemeSet::builtin();
        let mono = set.get(set.resolve("mono").unwrap()).unwrap();
        let mut last = 0u8;
        for i in 0..=20 {
            let c = mono.color_for(i as f32 / 20.0);
            assert!(c.r >= last);
            last = c.r;
        }
    }

    #[test]
    fn test_resolve_by_index_and_name() {
        let set = ThemeSet::builtin();
        assert_eq!(set.resolve("1"), Some(0));
        assert_eq!(set.resolve("FIRE"), Some(1));
        assert_eq!(set.resolve("oc"), Some(2)); // prefix match
        assert_eq!(set.resolve("0"), None);
        assert_eq!(set.resolve("99"), None);
        assert_eq!(set.resolve("nosuch"), None);
    }
}
