//! Overlay rendering
//!
//! Draws guide lines onto a raster so a collaborator can display committed
//! lines and the in-progress preview on top of the source image.

use super::{PixMut, PixelDepth};
use crate::error::Result;
use crate::geometry::Segment;

/// RGB color for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Create a new color
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Black color
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    /// White color
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };
    /// Red color
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
    /// Green color
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0 };
    /// Blue color
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255 };

    /// Convert to grayscale value (0-255)
    pub fn to_gray(&self) -> u8 {
        crate::color::luma(self.r, self.g, self.b)
    }

    /// Compose as 32-bit RGBA pixel
    pub fn to_pixel32(&self) -> u32 {
        crate::color::compose_rgb(self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Generate the pixels of a line using Bresenham's integer algorithm.
///
/// The line connects `(x1, y1)` to `(x2, y2)` with 8-connectivity.
pub fn generate_line_pts(x1: i32, y1: i32, x2: i32, y2: i32) -> Vec<(i32, i32)> {
    if x1 == x2 && y1 == y2 {
        return vec![(x1, y1)];
    }

    let dx = (x2 - x1).abs();
    let dy = (y2 - y1).abs();
    let sx = if x2 > x1 { 1i32 } else { -1 };
    let sy = if y2 > y1 { 1i32 } else { -1 };

    let npts = dx.max(dy) + 1;
    let mut pts = Vec::with_capacity(npts as usize);

    let mut x = x1;
    let mut y = y1;

    if dx >= dy {
        let mut err = dx / 2;
        for _ in 0..npts {
            pts.push((x, y));
            err -= dy;
            if err < 0 {
                y += sy;
                err += dx;
            }
            x += sx;
        }
    } else {
        let mut err = dy / 2;
        for _ in 0..npts {
            pts.push((x, y));
            err -= dx;
            if err < 0 {
                x += sx;
                err += dy;
            }
            y += sy;
        }
    }

    pts
}

/// Clip a segment to the rectangle `[0, w-1] x [0, h-1]` (Liang-Barsky).
///
/// Returns `None` when the segment lies entirely outside.
pub fn clip_segment(seg: &Segment, w: u32, h: u32) -> Option<Segment> {
    let (xmin, ymin) = (0.0, 0.0);
    let (xmax, ymax) = (w as f64 - 1.0, h as f64 - 1.0);
    let (dx, dy) = (seg.dx(), seg.dy());
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (p, q) in [
        (-dx, seg.p1.x - xmin),
        (dx, xmax - seg.p1.x),
        (-dy, seg.p1.y - ymin),
        (dy, ymax - seg.p1.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    let at = |t: f64| crate::Point::new(seg.p1.x + t * dx, seg.p1.y + t * dy);
    Some(Segment::new(at(t0), at(t1)))
}

impl PixMut {
    /// Render a segment with a specific color and stroke width.
    ///
    /// The segment is clipped to the image first, so extended guide lines
    /// with steep slopes stay cheap to draw. For 8 bpp images the color is
    /// converted to gray.
    pub fn render_segment_color(&mut self, seg: &Segment, width: u32, color: Color) -> Result<()> {
        if !seg.p1.is_finite() || !seg.p2.is_finite() {
            return Err(crate::Error::InvalidParameter(
                "segment endpoints must be finite".to_string(),
            ));
        }
        let Some(clipped) = clip_segment(seg, self.width(), self.height()) else {
            return Ok(());
        };

        let pixel_val = match self.depth() {
            PixelDepth::Bit8 => color.to_gray() as u32,
            PixelDepth::Bit32 => color.to_pixel32(),
        };

        let x1 = clipped.p1.x.round() as i32;
        let y1 = clipped.p1.y.round() as i32;
        let x2 = clipped.p2.x.round() as i32;
        let y2 = clipped.p2.y.round() as i32;
        let horizontal = (x2 - x1).abs() > (y2 - y1).abs();
        let (w, h) = (self.width() as i32, self.height() as i32);

        for i in 0..width.max(1) {
            // 0, -1, +1, -2, +2, ...
            let offset = ((i + 1) / 2) as i32 * if i % 2 == 1 { -1 } else { 1 };
            let (ox, oy) = if horizontal { (0, offset) } else { (offset, 0) };
            for (x, y) in generate_line_pts(x1 + ox, y1 + oy, x2 + ox, y2 + oy) {
                if x < 0 || x >= w || y < 0 || y >= h {
                    continue;
                }
                self.set_pixel_unchecked(x as u32, y as u32, pixel_val);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pix, Point};

    #[test]
    fn test_line_pts_horizontal() {
        let pts = generate_line_pts(0, 0, 4, 0);
        assert_eq!(pts, vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]);
    }

    #[test]
    fn test_line_pts_diagonal_reversed() {
        let pts = generate_line_pts(3, 3, 0, 0);
        assert_eq!(pts.len(), 4);
        assert_eq!(pts[0], (3, 3));
        assert_eq!(pts[3], (0, 0));
    }

    #[test]
    fn test_clip_segment_outside() {
        let seg = Segment::new(Point::new(-10.0, -5.0), Point::new(-1.0, -1.0));
        assert!(clip_segment(&seg, 10, 10).is_none());
    }

    #[test]
    fn test_clip_segment_steep() {
        let seg = Segment::new(Point::new(0.0, -1000.0), Point::new(2.0, 1000.0));
        let c = clip_segment(&seg, 10, 10).unwrap();
        assert!(c.p1.y >= 0.0 && c.p2.y <= 9.0);
        assert!((c.p1.x - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_render_segment_rgb() {
        let mut pm = Pix::new(10, 5, PixelDepth::Bit32).unwrap().to_mut();
        let seg = Segment::new(Point::new(-5.0, 2.0), Point::new(20.0, 2.0));
        pm.render_segment_color(&seg, 1, Color::RED).unwrap();
        let pix: Pix = pm.into();
        for x in 0..10 {
            assert_eq!(pix.get_rgb(x, 2), Some((255, 0, 0)));
            assert_eq!(pix.get_rgb(x, 1), Some((0, 0, 0)));
        }
    }

    #[test]
    fn test_render_segment_wide_gray() {
        let mut pm = Pix::new(10, 10, PixelDepth::Bit8).unwrap().to_mut();
        let seg = Segment::new(Point::new(0.0, 5.0), Point::new(9.0, 5.0));
        pm.render_segment_color(&seg, 3, Color::WHITE).unwrap();
        let pix: Pix = pm.into();
        assert_eq!(pix.get_pixel(4, 4), Some(255));
        assert_eq!(pix.get_pixel(4, 5), Some(255));
        assert_eq!(pix.get_pixel(4, 6), Some(255));
        assert_eq!(pix.get_pixel(4, 7), Some(0));
    }
}
