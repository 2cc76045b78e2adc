//! dewarp-transform - Projective geometry for the perspective correction engine
//!
//! This crate provides:
//!
//! - [`Homography`] - a non-singular 3x3 projective transform
//! - [`estimate`] / [`estimate_with`] - normalized DLT with least-squares
//!   refinement from four or more point correspondences
//! - [`warp`] / [`warp_cancellable`] - inverse-mapped resampling of a raster
//!   through a homography

mod error;
pub mod homography;
pub mod warp;

pub use dewarp_core::Point;
pub use error::{TransformError, TransformResult};
pub use homography::{EstimateOptions, Homography, estimate, estimate_with};
pub use warp::{Interpolation, WarpFill, WarpOptions, warp, warp_cancellable};
