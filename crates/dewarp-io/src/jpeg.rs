//! JPEG image format support
//!
//! Reads JPEG images with the `jpeg-decoder` crate and writes them with the
//! `jpeg-encoder` crate. Grayscale JPEGs become 8 bpp images; color JPEGs
//! (RGB or CMYK) become 32 bpp RGB images.

use crate::{IoError, IoResult};
use dewarp_core::{ImageFormat, Pix, PixelDepth, color};
use jpeg_decoder::{Decoder, PixelFormat};
use jpeg_encoder::{ColorType, Encoder};
use std::io::{Read, Write};

/// Default JPEG quality (1-100)
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Read a JPEG image from a reader.
///
/// The reader must be positioned at the JPEG SOI marker (`FF D8`).
pub fn read_jpeg<R: Read>(reader: R) -> IoResult<Pix> {
    let mut decoder = Decoder::new(reader);
    let data = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(format!("JPEG decode error: {}", e)))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("JPEG header missing".to_string()))?;

    let width = info.width as u32;
    let height = info.height as u32;
    let (depth, samples) = match info.pixel_format {
        PixelFormat::L8 => (PixelDepth::Bit8, 1),
        PixelFormat::L16 => (PixelDepth::Bit8, 2),
        PixelFormat::RGB24 => (PixelDepth::Bit32, 3),
        PixelFormat::CMYK32 => (PixelDepth::Bit32, 4),
    };

    let expected = width as usize * height as usize * samples;
    if data.len() < expected {
        return Err(IoError::InvalidData(format!(
            "JPEG buffer too small: {} < {}",
            data.len(),
            expected
        )));
    }

    let mut pix_mut = Pix::new(width, height, depth)?.to_mut();
    pix_mut.set_informat(ImageFormat::Jpeg);

    for (i, px) in data[..expected].chunks_exact(samples).enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        let pixel = match info.pixel_format {
            PixelFormat::L8 => px[0] as u32,
            // 16-bit samples are big-endian; keep the high byte
            PixelFormat::L16 => px[0] as u32,
            PixelFormat::RGB24 => color::compose_rgb(px[0], px[1], px[2]),
            PixelFormat::CMYK32 => {
                let (r, g, b) = cmyk_to_rgb(px[0], px[1], px[2], px[3]);
                color::compose_rgb(r, g, b)
            }
        };
        pix_mut.set_pixel_unchecked(x, y, pixel);
    }

    Ok(pix_mut.into())
}

/// Adobe CMYK JPEGs store inverted ink values.
fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> (u8, u8, u8) {
    let k = k as u32;
    let conv = |v: u8| ((v as u32 * k + 127) / 255) as u8;
    (conv(c), conv(m), conv(y))
}

/// Write a JPEG image.
///
/// Alpha is dropped. `quality` is clamped to `1..=100`.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedFormat`] if either dimension exceeds
/// 65535, the JPEG limit.
pub fn write_jpeg<W: Write>(pix: &Pix, writer: W, quality: u8) -> IoResult<()> {
    let width = u16::try_from(pix.width()).map_err(|_| {
        IoError::UnsupportedFormat(format!("JPEG width {} exceeds 65535", pix.width()))
    })?;
    let height = u16::try_from(pix.height()).map_err(|_| {
        IoError::UnsupportedFormat(format!("JPEG height {} exceeds 65535", pix.height()))
    })?;

    let (color_type, samples) = match pix.depth() {
        PixelDepth::Bit8 => (ColorType::Luma, 1),
        PixelDepth::Bit32 => (ColorType::Rgb, 3),
    };

    let mut data = Vec::with_capacity(pix.width() as usize * pix.height() as usize * samples);
    for y in 0..pix.height() {
        for x in 0..pix.width() {
            let pixel = pix.get_pixel_unchecked(x, y);
            match pix.depth() {
                PixelDepth::Bit8 => data.push(pixel as u8),
                PixelDepth::Bit32 => {
                    let (r, g, b) = color::extract_rgb(pixel);
                    data.extend_from_slice(&[r, g, b]);
                }
            }
        }
    }

    let encoder = Encoder::new(writer, quality.clamp(1, 100));
    encoder
        .encode(&data, width, height, color_type)
        .map_err(|e| IoError::EncodeError(format!("JPEG encode error: {}", e)))?;

    Ok(())
}
