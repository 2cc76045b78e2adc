//! Image comparison
//!
//! Channel-wise difference measures used to check resampling results
//! against a reference within an interpolation tolerance.

use super::{Pix, PixelDepth};
use crate::color;
use crate::error::{Error, Result};

/// Summary of a pixel-wise comparison between two images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelDiff {
    /// Largest per-channel absolute difference
    pub max_diff: u8,
    /// Number of pixels whose largest channel difference exceeds the tolerance
    pub count_over: u64,
    /// Total number of compared pixels
    pub total: u64,
}

impl PixelDiff {
    /// Fraction of pixels over tolerance.
    pub fn fraction_over(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count_over as f64 / self.total as f64
        }
    }
}

impl Pix {
    /// Compare with another image of identical size and depth.
    ///
    /// For 32 bpp images the red, green and blue channels are compared
    /// individually; alpha is compared only when either image carries it
    /// (`spp == 4`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] or [`Error::IncompatibleDepths`]
    /// if the images cannot be compared.
    pub fn diff(&self, other: &Pix, tolerance: u8) -> Result<PixelDiff> {
        if self.width() != other.width() || self.height() != other.height() {
            return Err(Error::DimensionMismatch {
                expected: (self.width(), self.height()),
                actual: (other.width(), other.height()),
            });
        }
        if self.depth() != other.depth() {
            return Err(Error::IncompatibleDepths(
                self.depth().bits(),
                other.depth().bits(),
            ));
        }

        let with_alpha = self.spp() == 4 || other.spp() == 4;
        let mut out = PixelDiff {
            total: self.width() as u64 * self.height() as u64,
            ..PixelDiff::default()
        };
        for y in 0..self.height() {
            for x in 0..self.width() {
                let a = self.get_pixel_unchecked(x, y);
                let b = other.get_pixel_unchecked(x, y);
                let d = match self.depth() {
                    PixelDepth::Bit8 => (a as i32 - b as i32).unsigned_abs() as u8,
                    PixelDepth::Bit32 => channel_diff(a, b, with_alpha),
                };
                out.max_diff = out.max_diff.max(d);
                if d > tolerance {
                    out.count_over += 1;
                }
            }
        }
        Ok(out)
    }

    /// Pixel-identical comparison. Images that differ in size or depth are
    /// never equal.
    pub fn equals(&self, other: &Pix) -> bool {
        self.diff(other, 0).is_ok_and(|d| d.count_over == 0)
    }
}

fn channel_diff(a: u32, b: u32, with_alpha: bool) -> u8 {
    let (ar, ag, ab, aa) = color::extract_rgba(a);
    let (br, bg, bb, ba) = color::extract_rgba(b);
    let rgb = ar.abs_diff(br).max(ag.abs_diff(bg)).max(ab.abs_diff(bb));
    if with_alpha {
        rgb.max(aa.abs_diff(ba))
    } else {
        rgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_images() {
        let pix = Pix::from_gray_bytes(3, 1, &[1, 2, 3]).unwrap();
        assert!(pix.equals(&pix.deep_clone()));
    }

    #[test]
    fn test_diff_counts_over_tolerance() {
        let a = Pix::from_gray_bytes(4, 1, &[10, 10, 10, 10]).unwrap();
        let b = Pix::from_gray_bytes(4, 1, &[10, 12, 20, 0]).unwrap();
        let d = a.diff(&b, 2).unwrap();
        assert_eq!(d.max_diff, 10);
        assert_eq!(d.count_over, 2);
        assert_eq!(d.total, 4);
        assert!((d.fraction_over() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_diff_rgba_channels() {
        let a = Pix::from_rgba_bytes(1, 1, &[0, 0, 0, 255]).unwrap();
        let b = Pix::from_rgba_bytes(1, 1, &[0, 7, 0, 250]).unwrap();
        assert_eq!(a.diff(&b, 0).unwrap().max_diff, 7);
    }

    #[test]
    fn test_diff_ignores_alpha_without_spp4() {
        let mut a = Pix::new(1, 1, PixelDepth::Bit32).unwrap().to_mut();
        a.set_pixel(0, 0, color::compose_rgba(1, 2, 3, 0)).unwrap();
        let a: Pix = a.into();
        let mut b = Pix::from_rgba_bytes(1, 1, &[1, 2, 3, 255]).unwrap().to_mut();
        b.set_spp(3);
        let b: Pix = b.into();
        assert!(a.equals(&b));
    }

    #[test]
    fn test_diff_size_mismatch() {
        let a = Pix::new(2, 2, PixelDepth::Bit8).unwrap();
        let b = Pix::new(3, 2, PixelDepth::Bit8).unwrap();
        assert!(matches!(a.diff(&b, 0), Err(Error::DimensionMismatch { .. })));
        assert!(!a.equals(&b));
    }
}
