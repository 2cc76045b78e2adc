//! Synthetic test images
//!
//! Deterministic rasters with enough structure to make resampling errors
//! visible: smooth gradients for interpolation, hard edges for nearest
//! neighbour and bounds handling.

use crate::error::TestResult;
use dewarp_core::{Color, Pix, PixelDepth, color};

/// 32 bpp gradient: red grows with x, green grows with y, blue is constant.
pub fn gradient_rgb(width: u32, height: u32) -> TestResult<Pix> {
    let mut pm = Pix::new(width, height, PixelDepth::Bit32)?.to_mut();
    for y in 0..height {
        for x in 0..width {
            let r = scale(x, width);
            let g = scale(y, height);
            pm.set_pixel_unchecked(x, y, color::compose_rgb(r, g, 96));
        }
    }
    Ok(pm.into())
}

/// 8 bpp horizontal ramp from 0 at the left edge to 255 at the right edge.
pub fn gray_ramp(width: u32, height: u32) -> TestResult<Pix> {
    let mut pm = Pix::new(width, height, PixelDepth::Bit8)?.to_mut();
    for y in 0..height {
        for x in 0..width {
            pm.set_pixel_unchecked(x, y, scale(x, width) as u32);
        }
    }
    Ok(pm.into())
}

/// 32 bpp checkerboard alternating between two colors.
pub fn checkerboard(width: u32, height: u32, cell: u32, a: Color, b: Color) -> TestResult<Pix> {
    let cell = cell.max(1);
    let mut pm = Pix::new(width, height, PixelDepth::Bit32)?.to_mut();
    for y in 0..height {
        for x in 0..width {
            let c = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
            pm.set_pixel_unchecked(x, y, c.to_pixel32());
        }
    }
    Ok(pm.into())
}

/// 32 bpp white page with dark horizontal text-like stripes every `period`
/// rows.
pub fn ruled_page(width: u32, height: u32, period: u32) -> TestResult<Pix> {
    let period = period.max(2);
    let mut pm = Pix::new(width, height, PixelDepth::Bit32)?.to_mut();
    pm.set_all(Color::WHITE.to_pixel32());
    for y in (period / 2..height).step_by(period as usize) {
        for x in 0..width {
            pm.set_pixel_unchecked(x, y, Color::new(20, 20, 40).to_pixel32());
        }
    }
    Ok(pm.into())
}

fn scale(v: u32, extent: u32) -> u8 {
    if extent <= 1 {
        0
    } else {
        ((v as u64 * 255) / (extent as u64 - 1)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_corners() {
        let pix = gradient_rgb(11, 5).unwrap();
        assert_eq!(pix.get_rgb(0, 0), Some((0, 0, 96)));
        assert_eq!(pix.get_rgb(10, 4), Some((255, 255, 96)));
    }

    #[test]
    fn test_gray_ramp_edges() {
        let pix = gray_ramp(256, 2).unwrap();
        assert_eq!(pix.get_pixel(0, 1), Some(0));
        assert_eq!(pix.get_pixel(255, 1), Some(255));
        assert_eq!(pix.get_pixel(128, 0), Some(128));
    }

    #[test]
    fn test_checkerboard_cells() {
        let pix = checkerboard(8, 8, 4, Color::BLACK, Color::WHITE).unwrap();
        assert_eq!(pix.get_rgb(0, 0), Some((0, 0, 0)));
        assert_eq!(pix.get_rgb(4, 0), Some((255, 255, 255)));
        assert_eq!(pix.get_rgb(4, 4), Some((0, 0, 0)));
    }

    #[test]
    fn test_ruled_page_stripe_rows() {
        let pix = ruled_page(4, 10, 4).unwrap();
        assert_eq!(pix.get_rgb(0, 2), Some((20, 20, 40)));
        assert_eq!(pix.get_rgb(0, 3), Some((255, 255, 255)));
        assert_eq!(pix.get_rgb(0, 6), Some((20, 20, 40)));
    }
}
