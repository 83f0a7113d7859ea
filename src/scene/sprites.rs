// (C) 2025 - Enzo Lombardi

//! Sprite manager - animated multi-frame sprites with velocity
//! integration and transparent-space rendering.

use crate::core::buffer::Buffer;
use crate::core::color::Color;
use crate::core::geometry::Size;

/// An animated sprite. Frames are row arrays of equal-width strings;
/// space characters are transparent when rendered.
pub struct Sprite {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub frames: Vec<Vec<String>>,
    pub current_frame: usize,
    pub frame_time: f32,
    pub frame_duration: f32,
    pub color: Option<Color>,
    pub scale: u16,
    pub active: bool,
}

impl Sprite {
    pub fn new(x: f32, y: f32, frames: Vec<Vec<String>>) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            frames,
            current_frame: 0,
            frame_time: 0.0,
            frame_duration: 0.25,
            color: None,
            scale: 1,
            active: true,
        }
    }

    fn frame(&self) -> Option<&[String]> {
        self.frames.get(self.current_frame).map(Vec::as_slice)
    }
}

/// Owns a list of sprites, advancing animation frames and positions.
pub struct SpriteManager {
    sprites: Vec<Sprite>,
}

impl SpriteManager {
    pub fn new() -> Self {
        Self { sprites: Vec::new() }
    }

    pub fn add(&mut self, sprite: Sprite) -> usize {
        self.sprites.push(sprite);
        self.sprites.len() - 1
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Sprite> {
        self.sprites.get_mut(index)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Sprite> {
        self.sprites.iter_mut()
    }

    pub fn clear(&mut self) {
        self.sprites.clear();
    }

    /// Advance frame timers and integrate positions. `dt` is seconds.
    pub fn update(&mut self, dt: f32, _size: Size) {
        for sprite in &mut self.sprites {
            if !sprite.active {
                continue;
            }
            sprite.frame_time += dt;
            if sprite.frame_duration > 0.0 && sprite.frame_time >= sprite.frame_duration {
                sprite.frame_time -= sprite.frame_duration;
                let count = sprite.frames.len().max(1);
                sprite.current_frame = (sprite.current_frame + 1) % count;
            }
            sprite.x += sprite.vx * dt;
            sprite.y += sprite.vy * dt;
        }
    }

    /// Draw each active sprite centered on its position. Spaces are
    /// transparent; writes outside the buffer clip silently.
    pub fn render(&self, buf: &mut Buffer, _size: Size) {
        for sprite in &self.sprites {
            if !sprite.active {
                continue;
            }
            let Some(rows) = sprite.frame() else { continue };
            let scale = sprite.scale.max(1) as i16;
            let frame_h = rows.len() as i16 * scale;
            let frame_w = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i16 * scale;
            let x0 = sprite.x.floor() as i16 - frame_w / 2;
            let y0 = sprite.y.floor() as i16 - frame_h / 2;

            for (ry, row) in rows.iter().enumerate() {
                for (rx, ch) in row.chars().enumerate() {
                    if ch == ' ' {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            buf.put(
                                x0 + rx as i16 * scale + sx,
                                y0 + ry as i16 * scale + sy,
                                ch,
                                sprite.color,
                            );
                        }
                    }
                }
            }
        }
    }

    /// Drop sprites whose `active` flag was cleared.
    pub fn remove_inactive(&mut self) {
        self.sprites.retain(|s| s.active);
    }
}

impl Default for SpriteManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph_frames() -> Vec<Vec<String>> {
        vec![vec!["A".to_string()], vec!["B".to_string()]]
    }

    #[test]
    fn test_frame_advance_wraps() {
        let mut mgr = SpriteManager::new();
        let mut sprite = Sprite::new(5.0, 5.0, glyph_frames());
        sprite.frame_duration = 0.1;
        mgr.add(sprite);

        mgr.update(0.1, Size::new(10, 10));
        assert_eq!(mgr.sprites[0].current_frame, 1);
        mgr.update(0.1, Size::new(10, 10));
        assert_eq!(mgr.sprites[0].current_frame, 0);
    }

    #[test]
    fn test_velocity_integration() {
        let mut mgr = SpriteManager::new();
        let mut sprite = Sprite::new(0.0, 0.0, glyph_frames());
        sprite.vx = 10.0;
        sprite.vy = -4.0;
        mgr.add(sprite);

        mgr.update(0.5, Size::new(40, 20));
        assert!((mgr.sprites[0].x - 5.0).abs() < f32::EPSILON);
        assert!((mgr.sprites[0].y + 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_render_transparent_spaces() {
        let mut mgr = SpriteManager::new();
        let frames = vec![vec!["X X".to_string()]];
        mgr.add(Sprite::new(5.0, 2.0, frames));

        let mut buf = Buffer::new(Size::new(10, 5));
        let _ = buf.diff();
        // Background cell under the sprite's transparent middle
        buf.put(5, 2, '.', None);
        mgr.render(&mut buf, Size::new(10, 5));

        assert_eq!(buf.get(4, 2).unwrap().ch, 'X');
        assert_eq!(buf.get(5, 2).unwrap().ch, '.');
        assert_eq!(buf.get(6, 2).unwrap().ch, 'X');
    }

    #[test]
    fn test_render_clips_out_of_bounds() {
        let mut mgr = SpriteManager::new();
        mgr.add(Sprite::new(-5.0, -5.0, glyph_frames()));
        let mut buf = Buffer::new(Size::new(4, 4));
        let _ = buf.diff();
        mgr.render(&mut buf, Size::new(4, 4));
        assert!(buf.diff().is_empty());
    }

    #[test]
    fn test_remove_inactive_compacts() {
        let mut mgr = SpriteManager::new();
        mgr.add(Sprite::new(0.0, 0.0, glyph_frames()));
        mgr.add(Sprite::new(1.0, 1.0, glyph_frames()));
        mgr.sprites[0].active = false;

        mgr.remove_inactive();
        assert_eq!(mgr.len(), 1);
        assert!((mgr.sprites[0].x - 1.0).abs() < f32::EPSILON);
    }
}
