//! dewarp-io - Image I/O for the perspective correction engine
//!
//! Reads and writes PNG and JPEG images. Formats are detected from magic
//! bytes on read and chosen explicitly (or from a file extension) on write.
//!
//! # Examples
//!
//! ```no_run
//! use dewarp_io::{read_image, write_image, ImageFormat};
//!
//! let pix = read_image("photo.jpg").unwrap();
//! write_image(&pix, "photo.png", ImageFormat::Png).unwrap();
//! ```

mod error;
pub mod format;
pub mod jpeg;
pub mod png;

pub use dewarp_core::ImageFormat;
pub use error::{IoError, IoResult};
pub use format::{detect_format, detect_format_from_bytes, format_from_path};
pub use jpeg::DEFAULT_JPEG_QUALITY;

use dewarp_core::Pix;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::Path;

/// Read an image from a file path.
///
/// The format is detected from the file header, not the extension.
pub fn read_image<P: AsRef<Path>>(path: P) -> IoResult<Pix> {
    let path = path.as_ref();
    let format = detect_format(path)?;
    let file = File::open(path)?;
    let pix = read_image_format(BufReader::new(file), format)?;
    tracing::debug!(
        path = %path.display(),
        ?format,
        width = pix.width(),
        height = pix.height(),
        "read image"
    );
    Ok(pix)
}

/// Read an image from an in-memory buffer.
pub fn read_image_mem(data: &[u8]) -> IoResult<Pix> {
    let format = detect_format_from_bytes(data)?;
    read_image_format(Cursor::new(data), format)
}

fn read_image_format<R: std::io::BufRead + std::io::Seek>(
    reader: R,
    format: ImageFormat,
) -> IoResult<Pix> {
    match format {
        ImageFormat::Png => png::read_png(reader),
        ImageFormat::Jpeg => jpeg::read_jpeg(reader),
        ImageFormat::Unknown => Err(IoError::UnsupportedFormat(
            "unknown image format".to_string(),
        )),
    }
}

/// Write an image to a file path in the given format.
///
/// JPEG output uses [`DEFAULT_JPEG_QUALITY`].
pub fn write_image<P: AsRef<Path>>(pix: &Pix, path: P, format: ImageFormat) -> IoResult<()> {
    write_image_quality(pix, path, format, DEFAULT_JPEG_QUALITY)
}

/// Write an image to a file path with an explicit JPEG quality.
pub fn write_image_quality<P: AsRef<Path>>(
    pix: &Pix,
    path: P,
    format: ImageFormat,
    jpeg_quality: u8,
) -> IoResult<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_image_format(pix, &mut writer, format, jpeg_quality)?;
    writer.flush()?;
    tracing::debug!(path = %path.display(), ?format, "wrote image");
    Ok(())
}

/// Encode an image into an in-memory buffer.
pub fn write_image_mem(pix: &Pix, format: ImageFormat) -> IoResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_image_format(pix, &mut buffer, format, DEFAULT_JPEG_QUALITY)?;
    Ok(buffer)
}

fn write_image_format<W: Write>(
    pix: &Pix,
    writer: W,
    format: ImageFormat,
    jpeg_quality: u8,
) -> IoResult<()> {
    match format {
        ImageFormat::Png => png::write_png(pix, writer),
        ImageFormat::Jpeg => jpeg::write_jpeg(pix, writer, jpeg_quality),
        ImageFormat::Unknown => Err(IoError::UnsupportedFormat(
            "cannot write unknown format".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dewarp_core::PixelDepth;

    #[test]
    fn test_mem_roundtrip_png() {
        let pix = Pix::from_gray_bytes(3, 2, &[0, 50, 100, 150, 200, 250]).unwrap();
        let bytes = write_image_mem(&pix, ImageFormat::Png).unwrap();
        let pix2 = read_image_mem(&bytes).unwrap();
        assert!(pix.equals(&pix2));
    }

    #[test]
    fn test_write_unknown_format_rejected() {
        let pix = Pix::new(2, 2, PixelDepth::Bit8).unwrap();
        assert!(matches!(
            write_image_mem(&pix, ImageFormat::Unknown),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_read_mem_garbage() {
        assert!(read_image_mem(b"not an image").is_err());
    }
}
