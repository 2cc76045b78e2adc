//! Correspondence building
//!
//! Each committed line contributes two point pairs. Its left endpoint maps
//! onto itself and its right endpoint maps to the canvas' right edge at the
//! height of the left endpoint, so the line becomes horizontal after
//! rectification.

use crate::extend::CommittedLine;
use dewarp_core::Point;

/// A source point and where it should land after rectification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrespondencePair {
    pub source: Point,
    pub target: Point,
}

/// Build `2 * lines.len()` pairs in commit order.
pub fn build_pairs(lines: &[CommittedLine], width: u32) -> Vec<CorrespondencePair> {
    let w = width as f64;
    lines
        .iter()
        .flat_map(|line| {
            [
                CorrespondencePair {
                    source: line.p1,
                    target: Point::new(line.p1.x, line.p1.y),
                },
                CorrespondencePair {
                    source: line.p2,
                    target: Point::new(w, line.p1.y),
                },
            ]
        })
        .collect()
}

/// Separate pairs into parallel source and target lists.
pub fn split_pairs(pairs: &[CorrespondencePair]) -> (Vec<Point>, Vec<Point>) {
    pairs.iter().map(|p| (p.source, p.target)).unzip()
}

/// Committed lines in commit order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSet {
    lines: Vec<CommittedLine>,
}

impl LineSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line
    pub fn push(&mut self, line: CommittedLine) {
        self.lines.push(line);
    }

    /// Number of committed lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no line has been committed
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate over the lines in commit order
    pub fn iter(&self) -> std::slice::Iter<'_, CommittedLine> {
        self.lines.iter()
    }

    /// The lines as a slice
    pub fn as_slice(&self) -> &[CommittedLine] {
        &self.lines
    }

    /// Remove every line
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Correspondence pairs for all lines
    pub fn pairs(&self, width: u32) -> Vec<CorrespondencePair> {
        build_pairs(&self.lines, width)
    }
}

impl<'a> IntoIterator for &'a LineSet {
    type Item = &'a CommittedLine;
    type IntoIter = std::slice::Iter<'a, CommittedLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extend::extend;
    use dewarp_core::Segment;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64, width: u32) -> CommittedLine {
        extend(&Segment::new(Point::new(x1, y1), Point::new(x2, y2)), width).unwrap()
    }

    #[test]
    fn test_pairs_per_line() {
        let lines = [
            line(0.0, 100.0, 400.0, 120.0, 400),
            line(0.0, 250.0, 400.0, 230.0, 400),
        ];
        let pairs = build_pairs(&lines, 400);
        assert_eq!(pairs.len(), 4);

        assert_eq!(pairs[0].source, Point::new(0.0, 100.0));
        assert_eq!(pairs[0].target, Point::new(0.0, 100.0));
        assert_eq!(pairs[1].source, Point::new(400.0, 120.0));
        assert_eq!(pairs[1].target, Point::new(400.0, 100.0));
        assert_eq!(pairs[2].source, Point::new(0.0, 250.0));
        assert_eq!(pairs[2].target, Point::new(0.0, 250.0));
        assert_eq!(pairs[3].source, Point::new(400.0, 230.0));
        assert_eq!(pairs[3].target, Point::new(400.0, 250.0));
    }

    #[test]
    fn test_empty() {
        assert!(build_pairs(&[], 100).is_empty());
        let (src, dst) = split_pairs(&[]);
        assert!(src.is_empty() && dst.is_empty());
    }

    #[test]
    fn test_split_keeps_order() {
        let lines = [
            line(0.0, 10.0, 50.0, 20.0, 100),
            line(0.0, 80.0, 50.0, 70.0, 100),
            line(0.0, 40.0, 50.0, 45.0, 100),
        ];
        let pairs = build_pairs(&lines, 100);
        let (src, dst) = split_pairs(&pairs);
        assert_eq!(src.len(), 6);
        assert_eq!(dst.len(), 6);
        for (i, p) in pairs.iter().enumerate() {
            assert_eq!(src[i], p.source);
            assert_eq!(dst[i], p.target);
        }
        // Targets of each line share its left height
        for k in 0..3 {
            assert_eq!(dst[2 * k].y, dst[2 * k + 1].y);
            assert_eq!(dst[2 * k + 1].x, 100.0);
        }
    }

    #[test]
    fn test_line_set() {
        let mut set = LineSet::new();
        assert!(set.is_empty());
        set.push(line(0.0, 10.0, 50.0, 20.0, 100));
        set.push(line(0.0, 80.0, 50.0, 70.0, 100));
        assert_eq!(set.len(), 2);
        assert_eq!(set.pairs(100).len(), 4);
        assert_eq!(set.iter().count(), 2);
        assert_eq!((&set).into_iter().next().map(|l| l.p1.y), Some(10.0));
        set.clear();
        assert!(set.is_empty());
    }
}
