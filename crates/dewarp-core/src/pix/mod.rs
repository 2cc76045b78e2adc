//! PIX - The raster container
//!
//! # Pixel layout
//!
//! - Image data is stored in 32-bit words
//! - Every row starts on a 32-bit boundary
//! - 8 bpp pixels are packed MSB to LSB, four per word
//! - 32 bpp pixels are `0xRRGGBBAA`, one per word
//!
//! # Ownership model
//!
//! `Pix` uses `Arc` for cheap cloning (shared, read-only ownership). This is
//! what lets a finalize job hand the source raster to a worker thread without
//! copying it. To modify pixel data, convert to `PixMut` via
//! [`Pix::try_into_mut`] or [`Pix::to_mut`], then convert back with
//! `Into<Pix>`.

mod access;
pub mod compare;
pub mod graphics;

pub use graphics::{Color, generate_line_pts};

use crate::error::{Error, Result};
use std::sync::Arc;

/// Pixel depth (bits per pixel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PixelDepth {
    /// 8-bit grayscale
    Bit8 = 8,
    /// 32-bit RGB or RGBA
    Bit32 = 32,
}

impl PixelDepth {
    /// Create `PixelDepth` from a raw bit count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDepth`] if `bits` is not 8 or 32.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(PixelDepth::Bit8),
            32 => Ok(PixelDepth::Bit32),
            _ => Err(Error::InvalidDepth(bits)),
        }
    }

    /// Get the number of bits per pixel.
    pub fn bits(self) -> u32 {
        self as u32
    }
}

/// Image file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    /// Unknown format (synthesized rasters)
    #[default]
    Unknown,
    /// JFIF JPEG format
    Jpeg,
    /// PNG format
    Png,
}

impl ImageFormat {
    /// Get the file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Unknown => "dat",
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    /// Guess a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            _ => Self::Unknown,
        }
    }
}

/// Internal PIX data
#[derive(Debug)]
struct PixData {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Depth in bits per pixel
    depth: PixelDepth,
    /// Samples per pixel (1 for grayscale, 3 for RGB, 4 for RGBA)
    spp: u32,
    /// 32-bit words per line
    wpl: u32,
    /// Input file format
    informat: ImageFormat,
    /// The image data (packed 32-bit words)
    data: Vec<u32>,
}

impl PixData {
    fn duplicate(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            depth: self.depth,
            spp: self.spp,
            wpl: self.wpl,
            informat: self.informat,
            data: self.data.clone(),
        }
    }
}

/// PIX - Raster container
///
/// # Examples
///
/// ```
/// use dewarp_core::{Pix, PixelDepth};
///
/// let pix = Pix::new(640, 480, PixelDepth::Bit32).unwrap();
/// assert_eq!(pix.width(), 640);
/// assert_eq!(pix.height(), 480);
/// ```
#[derive(Debug, Clone)]
pub struct Pix {
    inner: Arc<PixData>,
}

impl Pix {
    /// Create a new PIX with the specified dimensions and depth.
    ///
    /// The image data is initialized to zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0, or if a
    /// row would not fit in `u32` words.
    pub fn new(width: u32, height: u32, depth: PixelDepth) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }

        let wpl = Self::compute_wpl(width, depth)
            .ok_or(Error::InvalidDimension { width, height })?;
        let data_size = (wpl as usize) * (height as usize);

        let spp = match depth {
            PixelDepth::Bit32 => 3,
            PixelDepth::Bit8 => 1,
        };

        let inner = PixData {
            width,
            height,
            depth,
            spp,
            wpl,
            informat: ImageFormat::Unknown,
            data: vec![0u32; data_size],
        };

        Ok(Pix {
            inner: Arc::new(inner),
        })
    }

    /// Create a 32 bpp image from tightly packed RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] if `rgba.len() != width * height * 4`.
    pub fn from_rgba_bytes(width: u32, height: u32, rgba: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(Error::BufferLength {
                expected,
                actual: rgba.len(),
            });
        }
        let mut pm = Pix::new(width, height, PixelDepth::Bit32)?.to_mut();
        pm.set_spp(4);
        for (i, px) in rgba.chunks_exact(4).enumerate() {
            let x = (i % width as usize) as u32;
            let y = (i / width as usize) as u32;
            pm.set_pixel_unchecked(
                x,
                y,
                crate::color::compose_rgba(px[0], px[1], px[2], px[3]),
            );
        }
        Ok(pm.into())
    }

    /// Create an 8 bpp image from tightly packed gray bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] if `gray.len() != width * height`.
    pub fn from_gray_bytes(width: u32, height: u32, gray: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize;
        if gray.len() != expected {
            return Err(Error::BufferLength {
                expected,
                actual: gray.len(),
            });
        }
        let mut pm = Pix::new(width, height, PixelDepth::Bit8)?.to_mut();
        for (i, &v) in gray.iter().enumerate() {
            let x = (i % width as usize) as u32;
            let y = (i / width as usize) as u32;
            pm.set_pixel_unchecked(x, y, v as u32);
        }
        Ok(pm.into())
    }

    /// Compute words per line for given width and depth.
    #[inline]
    fn compute_wpl(width: u32, depth: PixelDepth) -> Option<u32> {
        let bits_per_line = u64::from(width) * u64::from(depth.bits());
        u32::try_from(bits_per_line.div_ceil(32)).ok()
    }

    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the pixel depth.
    #[inline]
    pub fn depth(&self) -> PixelDepth {
        self.inner.depth
    }

    /// Get the samples per pixel.
    #[inline]
    pub fn spp(&self) -> u32 {
        self.inner.spp
    }

    /// Get the words per line.
    #[inline]
    pub fn wpl(&self) -> u32 {
        self.inner.wpl
    }

    /// Get the input file format.
    #[inline]
    pub fn informat(&self) -> ImageFormat {
        self.inner.informat
    }

    /// Get raw access to the image data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get the number of strong references to this PIX.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Get the words of a specific row.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data(&self, y: u32) -> &[u32] {
        let start = (y * self.inner.wpl) as usize;
        let end = start + self.inner.wpl as usize;
        &self.inner.data[start..end]
    }

    /// Create a new zeroed PIX with the same dimensions, depth and spp.
    pub fn create_template(&self) -> Self {
        Self::create_template_sized(self, self.inner.width, self.inner.height)
    }

    /// Create a new zeroed PIX with this image's depth and spp but a
    /// different size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if either dimension is 0.
    pub fn create_sized(&self, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(Self::create_template_sized(self, width, height))
    }

    fn create_template_sized(&self, width: u32, height: u32) -> Self {
        let wpl = Self::compute_wpl(width, self.inner.depth).unwrap_or(0);
        let inner = PixData {
            width,
            height,
            depth: self.inner.depth,
            spp: self.inner.spp,
            wpl,
            informat: self.inner.informat,
            data: vec![0u32; wpl as usize * height as usize],
        };
        Pix {
            inner: Arc::new(inner),
        }
    }

    /// Create a deep copy of this PIX.
    ///
    /// Unlike `clone()` which shares data via Arc, this creates
    /// a completely independent copy.
    pub fn deep_clone(&self) -> Self {
        Pix {
            inner: Arc::new(self.inner.duplicate()),
        }
    }

    /// Try to get mutable access to the image data.
    ///
    /// Succeeds only if there is exactly one reference to the data.
    pub fn try_into_mut(self) -> std::result::Result<PixMut, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(data) => Ok(PixMut { inner: data }),
            Err(arc) => Err(Pix { inner: arc }),
        }
    }

    /// Create a mutable copy of this PIX.
    pub fn to_mut(&self) -> PixMut {
        PixMut {
            inner: self.inner.duplicate(),
        }
    }

    /// Convert to a 32 bpp image. 32 bpp input is returned as a shared clone.
    pub fn convert_to_32(&self) -> Pix {
        if self.inner.depth == PixelDepth::Bit32 {
            return self.clone();
        }
        let mut pm = PixMut {
            inner: PixData {
                width: self.inner.width,
                height: self.inner.height,
                depth: PixelDepth::Bit32,
                spp: 3,
                wpl: self.inner.width,
                informat: self.inner.informat,
                data: vec![0u32; self.inner.width as usize * self.inner.height as usize],
            },
        };
        for y in 0..self.inner.height {
            for x in 0..self.inner.width {
                let v = self.get_pixel_unchecked(x, y) as u8;
                pm.set_pixel_unchecked(x, y, crate::color::compose_rgb(v, v, v));
            }
        }
        pm.into()
    }
}

/// Mutable PIX
///
/// Allows modification of image data. Convert back to an immutable
/// [`Pix`] using `Into<Pix>`.
#[derive(Debug)]
pub struct PixMut {
    inner: PixData,
}

impl PixMut {
    /// Get the image width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the pixel depth.
    #[inline]
    pub fn depth(&self) -> PixelDepth {
        self.inner.depth
    }

    /// Get samples per pixel.
    #[inline]
    pub fn spp(&self) -> u32 {
        self.inner.spp
    }

    /// Get words per line.
    #[inline]
    pub fn wpl(&self) -> u32 {
        self.inner.wpl
    }

    /// Set the input format.
    pub fn set_informat(&mut self, format: ImageFormat) {
        self.inner.informat = format;
    }

    /// Set samples per pixel (3 = RGB, 4 = RGBA for 32 bpp).
    pub fn set_spp(&mut self, spp: u32) {
        self.inner.spp = spp;
    }

    /// Get raw access to the image data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get mutable access to a specific row.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data_mut(&mut self, y: u32) -> &mut [u32] {
        let start = (y * self.inner.wpl) as usize;
        let end = start + self.inner.wpl as usize;
        &mut self.inner.data[start..end]
    }

    /// Set every pixel to `val`.
    pub fn set_all(&mut self, val: u32) {
        match self.inner.depth {
            PixelDepth::Bit32 => self.inner.data.fill(val),
            PixelDepth::Bit8 => {
                let b = val & 0xff;
                self.inner.data.fill((b << 24) | (b << 16) | (b << 8) | b);
            }
        }
    }

    /// Clear all pixels to zero.
    pub fn clear(&mut self) {
        self.inner.data.fill(0);
    }
}

impl From<PixMut> for Pix {
    fn from(pix_mut: PixMut) -> Self {
        Pix {
            inner: Arc::new(pix_mut.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pix_creation() {
        let pix = Pix::new(100, 200, PixelDepth::Bit8).unwrap();
        assert_eq!(pix.width(), 100);
        assert_eq!(pix.height(), 200);
        assert_eq!(pix.depth(), PixelDepth::Bit8);
        assert_eq!(pix.spp(), 1);
        assert_eq!(pix.wpl(), 25);
    }

    #[test]
    fn test_pix_invalid_dimensions() {
        assert!(Pix::new(0, 100, PixelDepth::Bit8).is_err());
        assert!(Pix::new(100, 0, PixelDepth::Bit32).is_err());
    }

    #[test]
    fn test_depth_from_bits() {
        assert_eq!(PixelDepth::from_bits(32).unwrap(), PixelDepth::Bit32);
        assert!(matches!(PixelDepth::from_bits(4), Err(Error::InvalidDepth(4))));
    }

    #[test]
    fn test_pix_clone_shares_data() {
        let pix1 = Pix::new(10, 10, PixelDepth::Bit8).unwrap();
        let pix2 = pix1.clone();
        assert_eq!(pix1.ref_count(), 2);
        assert_eq!(pix1.data().as_ptr(), pix2.data().as_ptr());
    }

    #[test]
    fn test_pix_deep_clone() {
        let pix1 = Pix::new(10, 10, PixelDepth::Bit8).unwrap();
        let pix2 = pix1.deep_clone();
        assert_eq!(pix1.ref_count(), 1);
        assert_ne!(pix1.data().as_ptr(), pix2.data().as_ptr());
    }

    #[test]
    fn test_try_into_mut_fails_when_shared() {
        let pix1 = Pix::new(4, 4, PixelDepth::Bit32).unwrap();
        let _held = pix1.clone();
        assert!(pix1.try_into_mut().is_err());
    }

    #[test]
    fn test_set_all_gray() {
        let mut pm = Pix::new(5, 3, PixelDepth::Bit8).unwrap().to_mut();
        pm.set_all(200);
        let pix: Pix = pm.into();
        for y in 0..3 {
            for x in 0..5 {
                assert_eq!(pix.get_pixel(x, y), Some(200));
            }
        }
    }

    #[test]
    fn test_from_rgba_bytes() {
        let bytes = [1, 2, 3, 4, 5, 6, 7, 8];
        let pix = Pix::from_rgba_bytes(2, 1, &bytes).unwrap();
        assert_eq!(pix.spp(), 4);
        assert_eq!(pix.get_rgba(1, 0), Some((5, 6, 7, 8)));
        assert!(matches!(
            Pix::from_rgba_bytes(2, 2, &bytes),
            Err(Error::BufferLength { expected: 16, actual: 8 })
        ));
    }

    #[test]
    fn test_convert_to_32() {
        let pix = Pix::from_gray_bytes(2, 1, &[10, 250]).unwrap();
        let rgb = pix.convert_to_32();
        assert_eq!(rgb.depth(), PixelDepth::Bit32);
        assert_eq!(rgb.get_rgb(1, 0), Some((250, 250, 250)));
    }

    #[test]
    fn test_create_sized() {
        let pix = Pix::new(3, 3, PixelDepth::Bit32).unwrap();
        let big = pix.create_sized(7, 2).unwrap();
        assert_eq!((big.width(), big.height()), (7, 2));
        assert_eq!(big.depth(), PixelDepth::Bit32);
        assert!(pix.create_sized(0, 2).is_err());
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(ImageFormat::from_extension("JPEG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("png"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_extension("tif"), ImageFormat::Unknown);
        assert_eq!(ImageFormat::Png.extension(), "png");
    }
}
