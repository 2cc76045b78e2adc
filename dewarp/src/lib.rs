//! dewarp - Perspective correction from guide lines
//!
//! A photographed page is rectified by drawing lines over it that should be
//! horizontal. Each line is extended across the image, a homography is
//! fitted to the resulting correspondences, and the image is warped.
//!
//! # Example
//!
//! ```
//! use dewarp::{Pix, PixelDepth, Point, Segment};
//! use dewarp::correct::{build_pairs, extend, split_pairs};
//! use dewarp::transform::estimate;
//!
//! let lines = [
//!     extend(&Segment::new(Point::new(0.0, 100.0), Point::new(400.0, 120.0)), 400).unwrap(),
//!     extend(&Segment::new(Point::new(0.0, 250.0), Point::new(400.0, 230.0)), 400).unwrap(),
//! ];
//! let (src, dst) = split_pairs(&build_pairs(&lines, 400));
//! let h = estimate(&src, &dst).unwrap();
//! let p = h.transform_point(Point::new(400.0, 120.0)).unwrap();
//! assert!((p.y - 100.0).abs() < 1e-6);
//!
//! let pix = Pix::new(400, 300, PixelDepth::Bit8).unwrap();
//! assert_eq!(pix.width(), 400);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use dewarp_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use dewarp_correct as correct;
pub use dewarp_io as io;
pub use dewarp_transform as transform;
