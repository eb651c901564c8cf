//! Minimal raster primitives over a [`Frame`]'s bytes.

use crate::shared::frame::{ChannelOrder, Frame};

/// An RGB color.
pub type Rgb = [u8; 3];

/// Mutable drawing surface; colors are given in RGB and written in the
/// frame's own channel order. Out-of-bounds pixels are ignored.
pub struct Canvas<'a> {
    frame: &'a mut Frame,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut Frame) -> Self {
        Self { frame }
    }

    pub fn put(&mut self, x: i64, y: i64, color: Rgb) {
        self.blend(x, y, color, 1.0);
    }

    /// Mixes `color` into the pixel: `alpha * color + (1 - alpha) * pixel`.
    pub fn blend(&mut self, x: i64, y: i64, color: Rgb, alpha: f64) {
        let (w, h) = (self.frame.width() as i64, self.frame.height() as i64);
        if x < 0 || y < 0 || x >= w || y >= h {
            return;
        }
        let c = self.frame.channels() as usize;
        if c < 3 {
            return;
        }
        let px = native(self.frame.channel_order(), color);
        let offset = (y as usize * w as usize + x as usize) * c;
        let dst = &mut self.frame.data_mut()[offset..offset + 3];
        if alpha >= 1.0 {
            dst.copy_from_slice(&px);
            return;
        }
        for (d, s) in dst.iter_mut().zip(px) {
            *d = (alpha * s as f64 + (1.0 - alpha) * *d as f64)
                .round()
                .clamp(0.0, 255.0) as u8;
        }
    }

    /// Blends `color` over every pixel.
    pub fn tint(&mut self, color: Rgb, alpha: f64) {
        let (w, h) = (self.frame.width() as i64, self.frame.height() as i64);
        for y in 0..h {
            for x in 0..w {
                self.blend(x, y, color, alpha);
            }
        }
    }

    pub fn fill_circle(&mut self, cx: i64, cy: i64, radius: i64, color: Rgb) {
        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= r2 {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Circle outline between `radius - width` and `radius`.
    pub fn ring(&mut self, cx: i64, cy: i64, radius: i64, width: i64, color: Rgb) {
        let outer = radius * radius;
        let inner = (radius - width).max(0).pow(2);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let d2 = dx * dx + dy * dy;
                if d2 <= outer && d2 > inner {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Bresenham line stamped with a square brush of `thickness` pixels.
    pub fn line(&mut self, from: (i64, i64), to: (i64, i64), thickness: i64, color: Rgb) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        let half = (thickness.max(1) - 1) / 2;

        loop {
            for oy in -half..=half {
                for ox in -half..=half {
                    self.put(x + ox, y + oy, color);
                }
            }
            if x == to.0 && y == to.1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn rect(&mut self, x1: i64, y1: i64, x2: i64, y2: i64, thickness: i64, color: Rgb) {
        self.line((x1, y1), (x2, y1), thickness, color);
        self.line((x2, y1), (x2, y2), thickness, color);
        self.line((x2, y2), (x1, y2), thickness, color);
        self.line((x1, y2), (x1, y1), thickness, color);
    }

    /// Draws `text` with its top-left corner at `(x, y)` in the built-in
    /// 3x5 font, each font pixel a `scale` x `scale` block. Lowercase is
    /// drawn as uppercase; unknown characters leave a gap.
    pub fn text(&mut self, x: i64, y: i64, text: &str, scale: i64, color: Rgb) {
        let scale = scale.max(1);
        for (i, ch) in text.chars().enumerate() {
            let origin_x = x + i as i64 * GLYPH_ADVANCE * scale;
            for (row, bits) in glyph(ch).iter().enumerate() {
                for col in 0..3 {
                    if (bits >> (2 - col)) & 1 == 0 {
                        continue;
                    }
                    let px = origin_x + col * scale;
                    let py = y + row as i64 * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            self.put(px + dx, py + dy, color);
                        }
                    }
                }
            }
        }
    }
}

/// Horizontal distance between glyph origins, in font pixels.
pub const GLYPH_ADVANCE: i64 = 4;
/// Glyph height, in font pixels.
pub const GLYPH_HEIGHT: i64 = 5;

fn native(order: ChannelOrder, color: Rgb) -> [u8; 3] {
    match order {
        ChannelOrder::Rgb => color,
        ChannelOrder::Bgr => [color[2], color[1], color[0]],
    }
}

/// Rows of a 3x5 glyph, top to bottom, most significant bit leftmost.
fn glyph(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        _ => [0; 5],
    }
}
