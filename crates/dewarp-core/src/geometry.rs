//! Canvas-space geometry
//!
//! Pure value types with no identity beyond their coordinates. The canvas
//! coordinate system has its origin at the top-left pixel center, x growing
//! to the right and y growing downward.

use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Whether both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// An ordered pair of points: a raw drag from `p1` to `p2`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub p1: Point,
    pub p2: Point,
}

impl Segment {
    /// Create a segment from its two endpoints
    pub const fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    /// Horizontal run `x2 - x1`
    pub fn dx(&self) -> f64 {
        self.p2.x - self.p1.x
    }

    /// Vertical rise `y2 - y1`
    pub fn dy(&self) -> f64 {
        self.p2.y - self.p1.y
    }

    /// Euclidean length
    pub fn length(&self) -> f64 {
        self.p1.distance(&self.p2)
    }

    /// A segment whose endpoints share an x coordinate has no slope.
    pub fn is_vertical(&self) -> bool {
        self.p1.x == self.p2.x
    }
}
