//! Projective warping
//!
//! Renders a destination raster by inverse mapping: every destination pixel
//! `(x, y)` is mapped through `H^-1` into the source and sampled there.
//! Destination pixels whose preimage falls outside the source get the fill
//! value. The output has exactly the requested size; nothing is cropped or
//! padded automatically.

use crate::error::{TransformError, TransformResult};
use crate::homography::Homography;
use dewarp_core::{Pix, PixelDepth, Point, color};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Sampling method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Nearest source pixel
    Nearest,
    /// Bilinear interpolation of the four neighbours
    #[default]
    Bilinear,
}

/// Value written where the source has no data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarpFill {
    /// Opaque black
    #[default]
    Black,
    /// Opaque white
    White,
    /// Fully transparent (the output carries alpha)
    Transparent,
    /// A specific pixel value (interpretation depends on depth)
    Color(u32),
}

impl WarpFill {
    /// Get the fill value for a specific pixel depth
    pub fn to_value(self, depth: PixelDepth) -> u32 {
        match (self, depth) {
            (WarpFill::Black, PixelDepth::Bit8) => 0,
            (WarpFill::Black, PixelDepth::Bit32) => color::compose_rgba(0, 0, 0, 255),
            (WarpFill::White, PixelDepth::Bit8) => 255,
            (WarpFill::White, PixelDepth::Bit32) => color::compose_rgba(255, 255, 255, 255),
            (WarpFill::Transparent, _) => 0,
            (WarpFill::Color(val), PixelDepth::Bit8) => val & 0xff,
            (WarpFill::Color(val), PixelDepth::Bit32) => val,
        }
    }
}

/// Options for warping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WarpOptions {
    /// Sampling method
    pub interpolation: Interpolation,
    /// Background fill
    pub fill: WarpFill,
}

/// Warp `pix` through `h` into an `out_w x out_h` raster.
///
/// The source is never modified.
///
/// # Errors
///
/// Returns [`TransformError::WarpFailure`] if the output has zero area or
/// `h` cannot be inverted.
pub fn warp(
    pix: &Pix,
    h: &Homography,
    out_w: u32,
    out_h: u32,
    opts: &WarpOptions,
) -> TransformResult<Pix> {
    warp_cancellable(pix, h, out_w, out_h, opts, &AtomicBool::new(false))
}

/// Warp like [`warp`], checking `cancel` before each destination row.
///
/// # Errors
///
/// Returns [`TransformError::Cancelled`] once `cancel` is observed set, in
/// addition to the errors of [`warp`].
pub fn warp_cancellable(
    pix: &Pix,
    h: &Homography,
    out_w: u32,
    out_h: u32,
    opts: &WarpOptions,
    cancel: &AtomicBool,
) -> TransformResult<Pix> {
    if out_w == 0 || out_h == 0 {
        return Err(TransformError::WarpFailure(format!(
            "zero-area output {}x{}",
            out_w, out_h
        )));
    }
    let inv = h
        .inverse()
        .map_err(|e| TransformError::WarpFailure(format!("homography not invertible: {}", e)))?;

    // Transparency needs an alpha channel
    let src = if opts.fill == WarpFill::Transparent {
        pix.convert_to_32()
    } else {
        pix.clone()
    };
    let depth = src.depth();
    let spp = if opts.fill == WarpFill::Transparent {
        4
    } else {
        src.spp()
    };

    let mut out = src
        .create_sized(out_w, out_h)
        .map_err(|e| TransformError::WarpFailure(e.to_string()))?
        .to_mut();
    out.set_spp(spp);

    let fill = opts.fill.to_value(depth);
    let (w, h_src) = (src.width(), src.height());
    let (wf, hf) = (w as f64, h_src as f64);

    tracing::debug!(
        src_w = w,
        src_h = h_src,
        out_w,
        out_h,
        interpolation = ?opts.interpolation,
        "warping"
    );

    for y in 0..out_h {
        if cancel.load(Ordering::Relaxed) {
            tracing::debug!(row = y, "warp cancelled");
            return Err(TransformError::Cancelled);
        }
        for x in 0..out_w {
            let val = match inv.transform_point(Point::new(x as f64, y as f64)) {
                Some(p) if p.is_finite() && in_bounds(p, wf, hf) => match opts.interpolation {
                    Interpolation::Nearest => sample_nearest(&src, p),
                    Interpolation::Bilinear => sample_bilinear(&src, depth, p),
                },
                _ => fill,
            };
            out.set_pixel_unchecked(x, y, val);
        }
    }

    Ok(out.into())
}

/// A source pixel covers `[i - 0.5, i + 0.5)` around its center `i`.
#[inline]
fn in_bounds(p: Point, w: f64, h: f64) -> bool {
    p.x >= -0.5 && p.x < w - 0.5 && p.y >= -0.5 && p.y < h - 0.5
}

#[inline]
fn sample_nearest(src: &Pix, p: Point) -> u32 {
    let x = (p.x.round().max(0.0) as u32).min(src.width() - 1);
    let y = (p.y.round().max(0.0) as u32).min(src.height() - 1);
    src.get_pixel_unchecked(x, y)
}

fn sample_bilinear(src: &Pix, depth: PixelDepth, p: Point) -> u32 {
    let max_x = src.width() as i64 - 1;
    let max_y = src.height() as i64 - 1;
    let xf = p.x.floor();
    let yf = p.y.floor();
    let fx = (p.x - xf) as f32;
    let fy = (p.y - yf) as f32;

    // Neighbours past an edge repeat the edge pixel
    let x0 = (xf as i64).clamp(0, max_x) as u32;
    let x1 = (xf as i64 + 1).clamp(0, max_x) as u32;
    let y0 = (yf as i64).clamp(0, max_y) as u32;
    let y1 = (yf as i64 + 1).clamp(0, max_y) as u32;

    interpolate_pixel(src, depth, x0, y0, x1, y1, fx, fy)
}

/// Bilinear interpolation between four pixels
#[allow(clippy::too_many_arguments)]
fn interpolate_pixel(
    src: &Pix,
    depth: PixelDepth,
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
    fx: f32,
    fy: f32,
) -> u32 {
    let p00 = src.get_pixel_unchecked(x0, y0);
    let p10 = src.get_pixel_unchecked(x1, y0);
    let p01 = src.get_pixel_unchecked(x0, y1);
    let p11 = src.get_pixel_unchecked(x1, y1);

    match depth {
        PixelDepth::Bit32 => {
            let channel = |shift: u32| {
                interpolate_channel(
                    (p00 >> shift) & 0xff,
                    (p10 >> shift) & 0xff,
                    (p01 >> shift) & 0xff,
                    (p11 >> shift) & 0xff,
                    fx,
                    fy,
                )
            };
            (channel(color::RED_SHIFT) << color::RED_SHIFT)
                | (channel(color::GREEN_SHIFT) << color::GREEN_SHIFT)
                | (channel(color::BLUE_SHIFT) << color::BLUE_SHIFT)
                | (channel(color::ALPHA_SHIFT) << color::ALPHA_SHIFT)
        }
        PixelDepth::Bit8 => interpolate_channel(p00, p10, p01, p11, fx, fy),
    }
}

/// Interpolate a single channel value
fn interpolate_channel(p00: u32, p10: u32, p01: u32, p11: u32, fx: f32, fy: f32) -> u32 {
    let top = p00 as f32 * (1.0 - fx) + p10 as f32 * fx;
    let bottom = p01 as f32 * (1.0 - fx) + p11 as f32 * fx;
    let result = top * (1.0 - fy) + bottom * fy;
    (result.round() as u32).min(255)
}
