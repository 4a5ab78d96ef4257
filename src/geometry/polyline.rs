//! Polyline type for open paths.
//!
//! Unlike a [`Polygon`](super::Polygon), a polyline is not implicitly closed;
//! it is a path from the first point to the last. Closed loops are
//! represented as polylines whose first point is repeated at the end.

use super::{BoundingBox, Point};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An open polyline defined by a sequence of points.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

/// A collection of polylines.
pub type Polylines = Vec<Polyline>;

impl Polyline {
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.points
    }

    #[inline]
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    #[inline]
    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Get the first point, panicking if empty.
    #[inline]
    pub fn first_point(&self) -> Point {
        self.points[0]
    }

    /// Get the last point, panicking if empty.
    #[inline]
    pub fn last_point(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Total length in scaled units.
    pub fn length(&self) -> CoordF {
        if self.points.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for i in 0..(self.points.len() - 1) {
            total += self.points[i].distance(&self.points[i + 1]);
        }
        total
    }

    /// Total length in millimeters.
    #[inline]
    pub fn length_mm(&self) -> CoordF {
        self.length() / crate::SCALING_FACTOR
    }

    /// Whether the first point equals the last.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 2 && self.points.first() == self.points.last()
    }

    /// Ensure the path is closed by repeating the first point if needed.
    /// Idempotent.
    pub fn close(&mut self) {
        if let Some(first) = self.points.first().copied() {
            if self.points.last() != Some(&first) {
                self.points.push(first);
            }
        }
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    pub fn reversed(&self) -> Self {
        let mut copy = self.clone();
        copy.reverse();
        copy
    }

    /// Append another polyline, skipping its first point.
    pub fn append_skip_first(&mut self, other: &Polyline) {
        self.points.extend(other.points.iter().skip(1).copied());
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    pub fn translate(&mut self, dx: Coord, dy: Coord) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }
}

impl fmt::Debug for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polyline[{} pts]", self.points.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale;

    #[test]
    fn test_length() {
        let pl = Polyline::from_points(vec![
            Point::new(0, 0),
            Point::new(scale(3.0), 0),
            Point::new(scale(3.0), scale(4.0)),
        ]);
        assert!((pl.length_mm() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_close_idempotent() {
        let mut pl = Polyline::from_points(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
        ]);
        pl.close();
        assert!(pl.is_closed());
        let len = pl.len();
        pl.close();
        assert_eq!(pl.len(), len);
    }

    #[test]
    fn test_append_skip_first() {
        let mut a = Polyline::from_points(vec![Point::new(0, 0), Point::new(10, 0)]);
        let b = Polyline::from_points(vec![Point::new(10, 0), Point::new(10, 10)]);
        a.append_skip_first(&b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.last_point(), Point::new(10, 10));
    }
}
