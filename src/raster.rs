//! Rasterizes animated bolts into a brightness grid, then into terminal cells.

use crate::colors::{intensity_level, scheme_color};
use crate::lightning::LiveBolt;
use crate::projection::{OrbitCamera, ScreenPoint};
use crate::terminal::Terminal;
use crate::vec3::Vec3;

/// Bolt thickness limits and keyboard step
pub const MIN_THICKNESS: f32 = 0.2;
pub const MAX_THICKNESS: f32 = 3.0;
pub const THICKNESS_STEP: f32 = 0.2;
pub const DEFAULT_THICKNESS: f32 = 0.5;

/// Glow characters from faint to bright
const GLOW_CHARS: [char; 4] = ['.', ':', '+', '*'];
const EDGE_CHAR: char = '@';
/// Leading-edge intensity that maps to full brightness
const EDGE_FULL_INTENSITY: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pixel {
    pub brightness: f32,
    pub ch: char,
}

impl Default for Pixel {
    fn default() -> Self {
        Self { brightness: 0.0, ch: ' ' }
    }
}

/// Brightness grid the size of the terminal; brighter writes win
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl Canvas {
    pub fn new(width: u16, height: u16) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self {
            width,
            height,
            pixels: vec![Pixel::default(); width * height],
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width as u16, self.height as u16)
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        *self = Canvas::new(width, height);
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Pixel::default());
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&Pixel> {
        if x < self.width && y < self.height {
            self.pixels.get(y * self.width + x)
        } else {
            None
        }
    }

    pub fn lit(&self) -> usize {
        self.pixels.iter().filter(|p| p.brightness > 0.0).count()
    }

    fn plot(&mut self, x: i32, y: i32, brightness: f32, ch: char) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height || brightness <= 0.0 {
            return;
        }
        let px = &mut self.pixels[y as usize * self.width + x as usize];
        if brightness > px.brightness {
            *px = Pixel { brightness, ch };
        }
    }

    /// Unconditional write that never dims the cell
    fn stamp(&mut self, x: i32, y: i32, brightness: f32, ch: char) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let px = &mut self.pixels[y as usize * self.width + x as usize];
        *px = Pixel { brightness: brightness.max(px.brightness), ch };
    }

    fn line(&mut self, a: ScreenPoint, b: ScreenPoint, brightness: f32, ch: char) {
        let (w, h) = (self.width as f32, self.height as f32);
        if (a.x < 0.0 && b.x < 0.0) || (a.y < 0.0 && b.y < 0.0) || (a.x >= w && b.x >= w) || (a.y >= h && b.y >= h) {
            return;
        }
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        // Segments grazing the near plane can project absurdly long
        let steps = dx.abs().max(dy.abs()).ceil().clamp(1.0, (w + h) * 4.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.plot((a.x + dx * t).floor() as i32, (a.y + dy * t).floor() as i32, brightness, ch);
        }
    }

    /// Draw every visible segment, its glow halo and the leading-edge marker
    pub fn draw_bolt(&mut self, camera: &OrbitCamera, bolt: &LiveBolt, thickness: f32) {
        let glow_radius = thickness.clamp(MIN_THICKNESS, MAX_THICKNESS).floor() as i32;

        for (index, frame) in bolt.frames() {
            if !frame.is_visible() {
                continue;
            }
            let segments = bolt.structure.branch_segments(index);
            let core = frame.core_opacity.max(frame.line_opacity * 0.5);

            for segment in &segments[frame.visible.clone()] {
                let (Some(a), Some(b)) = (camera.project(segment.start), camera.project(segment.end)) else {
                    continue;
                };
                // Tips and deep branches read dimmer
                let weight = (if segment.is_tip { 0.6 } else { 1.0 }) * (1.0 - segment.depth as f32 * 0.1);
                if glow_radius > 0 && frame.glow_opacity > 0.0 {
                    self.halo(a, b, glow_radius, frame.glow_opacity * thickness.min(1.5) * weight);
                }
                self.line(a, b, core * weight, stroke_char(a, b));
            }
        }

        for (_, frame) in bolt.frames() {
            if let Some(edge) = frame.leading_edge {
                self.marker(camera, edge, frame.leading_edge_intensity);
            }
        }
    }

    fn halo(&mut self, a: ScreenPoint, b: ScreenPoint, radius: i32, brightness: f32) {
        for oy in -radius..=radius {
            for ox in -radius..=radius {
                if ox == 0 && oy == 0 {
                    continue;
                }
                let falloff = 1.0 - (ox.abs().max(oy.abs()) as f32) / (radius as f32 + 1.0);
                let shifted = |p: ScreenPoint| ScreenPoint { x: p.x + ox as f32, y: p.y + oy as f32, ..p };
                let level = brightness * falloff;
                let ch = GLOW_CHARS[(level * GLOW_CHARS.len() as f32).clamp(0.0, 3.0) as usize];
                self.line(shifted(a), shifted(b), level, ch);
            }
        }
    }

    fn marker(&mut self, camera: &OrbitCamera, point: Vec3, intensity: f32) {
        if intensity <= 0.0 {
            return;
        }
        if let Some(p) = camera.project(point) {
            let brightness = (intensity / EDGE_FULL_INTENSITY).min(1.0);
            self.stamp(p.x.floor() as i32, p.y.floor() as i32, brightness, EDGE_CHAR);
        }
    }

    /// Copy the grid into the terminal back buffer using a color scheme
    pub fn blit(&self, term: &mut Terminal, scheme: u8) {
        for y in 0..self.height {
            for x in 0..self.width {
                let px = self.pixels[y * self.width + x];
                if px.brightness <= 0.0 {
                    term.set(x as i32, y as i32, ' ', None, false);
                    continue;
                }
                let level = intensity_level(px.brightness);
                let (color, bold) = scheme_color(scheme, level, px.brightness > 0.85);
                term.set(x as i32, y as i32, px.ch, Some(color), bold);
            }
        }
    }
}

/// Line glyph following the on-screen slope of a segment
fn stroke_char(a: ScreenPoint, b: ScreenPoint) -> char {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if dx.abs() > dy.abs() * 2.0 {
        '-'
    } else if dy.abs() > dx.abs() * 2.0 {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        '\\'
    } else {
        '/'
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lightning::{BoltField, BoltMode, FieldConfig};

    fn sp(x: f32, y: f32) -> ScreenPoint {
        ScreenPoint { x, y, depth: 1.0 }
    }

    #[test]
    fn stroke_follows_slope() {
        assert_eq!(stroke_char(sp(0.0, 0.0), sp(10.0, 1.0)), '-');
        assert_eq!(stroke_char(sp(0.0, 0.0), sp(1.0, 10.0)), '|');
        assert_eq!(stroke_char(sp(0.0, 0.0), sp(5.0, 5.0)), '\\');
        assert_eq!(stroke_char(sp(0.0, 5.0), sp(5.0, 0.0)), '/');
    }

    #[test]
    fn brighter_writes_win() {
        let mut canvas = Canvas::new(4, 4);
        canvas.plot(1, 1, 0.3, '.');
        canvas.plot(1, 1, 0.8, '|');
        canvas.plot(1, 1, 0.5, ':');
        assert_eq!(canvas.get(1, 1).map(|p| p.ch), Some('|'));
        canvas.plot(9, 9, 1.0, 'x');
        assert_eq!(canvas.lit(), 1);
    }

    #[test]
    fn growing_bolt_lights_cells() {
        let mut field = BoltField::new(FieldConfig::default(), 4);
        field.spawn_mode(Vec3::new(0.0, 12.0, 0.0), BoltMode::Directional);
        for t in 0..60 {
            field.tick(t as f64 * 16.0);
        }
        let camera = OrbitCamera::new(80, 24);
        let mut canvas = Canvas::new(80, 24);
        for bolt in field.iter() {
            canvas.draw_bolt(&camera, bolt, DEFAULT_THICKNESS);
        }
        assert!(canvas.lit() > 10);

        let mut term = Terminal::headless(80, 24);
        canvas.blit(&mut term, 0);
        assert!(term.to_ansi_string().contains('@'));
    }
}
