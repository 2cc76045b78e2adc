//! Line extension
//!
//! A drawn segment is stretched across the whole canvas: the slope and
//! intercept of its supporting line are computed once, and both endpoints
//! of the committed line are evaluated from them at `x = 0` and
//! `x = width`.

use crate::error::{CorrectionError, CorrectionResult};
use dewarp_core::{Point, Segment};
use serde::{Deserialize, Serialize};

/// A guide line spanning the canvas from `x = 0` to `x = width`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommittedLine {
    /// Slope `dy / dx`
    pub slope: f64,
    /// Value of `y` at `x = 0`
    pub intercept: f64,
    /// Left endpoint `(0, intercept)`
    pub p1: Point,
    /// Right endpoint `(width, y_at(width))`
    pub p2: Point,
}

impl CommittedLine {
    /// Evaluate the line at `x`.
    #[inline]
    pub fn y_at(&self, x: f64) -> f64 {
        line_y(self.slope, self.intercept, x)
    }

    /// The canvas width this line was extended to.
    pub fn width(&self) -> f64 {
        self.p2.x
    }

    /// The committed line as a segment between its endpoints.
    pub fn segment(&self) -> Segment {
        Segment::new(self.p1, self.p2)
    }
}

#[inline]
fn line_y(slope: f64, intercept: f64, x: f64) -> f64 {
    slope * x + intercept
}

/// Extend `segment` to span `[0, width]`.
///
/// # Errors
///
/// Returns [`CorrectionError::DegenerateSegment`] when the endpoints share
/// an x coordinate (including zero-length segments) or when the slope or
/// intercept is not finite.
pub fn extend(segment: &Segment, width: u32) -> CorrectionResult<CommittedLine> {
    let Segment { p1, p2 } = *segment;
    let dx = p2.x - p1.x;
    if dx == 0.0 || !dx.is_finite() {
        return Err(CorrectionError::DegenerateSegment);
    }

    let slope = (p2.y - p1.y) / dx;
    let intercept = p1.y - slope * p1.x;
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(CorrectionError::DegenerateSegment);
    }

    let w = width as f64;
    let right = line_y(slope, intercept, w);
    if !right.is_finite() {
        return Err(CorrectionError::DegenerateSegment);
    }

    Ok(CommittedLine {
        slope,
        intercept,
        p1: Point::new(0.0, line_y(slope, intercept, 0.0)),
        p2: Point::new(w, right),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment {
        Segment::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    #[test]
    fn test_extend_full_width() {
        let line = extend(&seg(100.0, 105.0, 300.0, 115.0), 400).unwrap();
        assert!((line.slope - 0.05).abs() < 1e-12);
        assert!((line.intercept - 100.0).abs() < 1e-12);
        assert_eq!(line.p1.x, 0.0);
        assert_eq!(line.p2.x, 400.0);
        assert!((line.p1.y - 100.0).abs() < 1e-12);
        assert!((line.p2.y - 120.0).abs() < 1e-12);
        assert_eq!(line.width(), 400.0);
    }

    #[test]
    fn test_endpoints_lie_on_line() {
        let line = extend(&seg(13.5, 77.25, 211.0, 19.0), 640).unwrap();
        assert_eq!(line.y_at(0.0), line.p1.y);
        assert_eq!(line.y_at(640.0), line.p2.y);
    }

    #[test]
    fn test_direction_does_not_matter() {
        let a = extend(&seg(0.0, 100.0, 400.0, 120.0), 400).unwrap();
        let b = extend(&seg(400.0, 120.0, 0.0, 100.0), 400).unwrap();
        assert!((a.slope - b.slope).abs() < 1e-12);
        assert!((a.intercept - b.intercept).abs() < 1e-9);
    }

    #[test]
    fn test_horizontal_segment() {
        let line = extend(&seg(10.0, 50.0, 20.0, 50.0), 100).unwrap();
        assert_eq!(line.slope, 0.0);
        assert_eq!(line.p1.y, 50.0);
        assert_eq!(line.p2.y, 50.0);
    }

    #[test]
    fn test_vertical_rejected() {
        assert!(matches!(
            extend(&seg(50.0, 10.0, 50.0, 90.0), 100),
            Err(CorrectionError::DegenerateSegment)
        ));
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            extend(&seg(50.0, 10.0, 50.0, 10.0), 100),
            Err(CorrectionError::DegenerateSegment)
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(
            extend(&seg(0.0, f64::NAN, 10.0, 1.0), 100),
            Err(CorrectionError::DegenerateSegment)
        ));
        assert!(matches!(
            extend(&seg(0.0, 0.0, 1e-300, 1e300), 100),
            Err(CorrectionError::DegenerateSegment)
        ));
    }
}
