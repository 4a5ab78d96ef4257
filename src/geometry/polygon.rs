//! Polygon type for closed boundaries.
//!
//! A polygon is an implicitly closed ring: the edge from the last point back
//! to the first is not stored. Orientation convention throughout the slicer:
//! outer contours wind counter-clockwise, holes clockwise.

use super::{BoundingBox, Point, Polyline};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed polygon defined by its vertices (implicit closing edge).
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

/// A collection of polygons.
pub type Polygons = Vec<Polygon>;

impl Polygon {
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Axis-aligned rectangle from two corners.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::from_points(vec![
            min,
            Point::new(max.x, min.y),
            max,
            Point::new(min.x, max.y),
        ])
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
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn push(&mut self, p: Point) {
        self.points.push(p);
    }

    /// Signed area in scaled² units (shoelace). Positive for counter-clockwise.
    pub fn signed_area(&self) -> CoordF {
        if self.points.len() < 3 {
            return 0.0;
        }
        let mut sum: i128 = 0;
        for i in 0..self.points.len() {
            let a = self.points[i];
            let b = self.points[(i + 1) % self.points.len()];
            sum += a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128;
        }
        sum as CoordF / 2.0
    }

    /// Absolute area in scaled² units.
    #[inline]
    pub fn area(&self) -> CoordF {
        self.signed_area().abs()
    }

    /// Absolute area in mm².
    #[inline]
    pub fn area_mm2(&self) -> CoordF {
        self.area() / (crate::SCALING_FACTOR * crate::SCALING_FACTOR)
    }

    /// Whether the ring winds counter-clockwise.
    #[inline]
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Reverse the winding.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Ring circumference in scaled units, including the closing edge.
    pub fn perimeter(&self) -> CoordF {
        if self.points.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for i in 0..self.points.len() {
            let a = self.points[i];
            let b = self.points[(i + 1) % self.points.len()];
            total += a.distance(&b);
        }
        total
    }

    /// Ring circumference in millimeters.
    #[inline]
    pub fn perimeter_mm(&self) -> CoordF {
        self.perimeter() / crate::SCALING_FACTOR
    }

    /// Point-in-polygon by odd winding (ray cast along +X).
    pub fn contains_point(&self, pt: &Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > pt.y) != (b.y > pt.y) {
                let t = (pt.y - a.y) as f64 / (b.y - a.y) as f64;
                let x_cross = a.x as f64 + t * (b.x - a.x) as f64;
                if (pt.x as f64) < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Rotate the ring so the vertex at `start` becomes the first point.
    pub fn rotate_start(&mut self, start: usize) {
        if !self.points.is_empty() {
            let n = self.points.len();
            self.points.rotate_left(start % n);
        }
    }

    /// Open polyline over the same vertices (closing edge dropped).
    pub fn to_polyline(&self) -> Polyline {
        Polyline::from_points(self.points.clone())
    }

    /// Closed polyline: first point repeated at the end.
    pub fn to_closed_polyline(&self) -> Polyline {
        let mut points = self.points.clone();
        if let Some(first) = points.first().copied() {
            if points.last() != Some(&first) {
                points.push(first);
            }
        }
        Polyline::from_points(points)
    }

    /// Translate all vertices.
    pub fn translate(&mut self, dx: Coord, dy: Coord) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }
}

impl fmt::Debug for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polygon[{} pts]", self.points.len())
    }
}
