//! ExPolygon: a polygon with holes.
//!
//! The contour winds counter-clockwise and every hole clockwise. This is the
//! canonical region representation consumed by the boolean/offset layer.

use super::{BoundingBox, Point, Polygon, Polyline};
use crate::CoordF;
use serde::{Deserialize, Serialize};

/// A polygon with holes (exterior contour + interior contours).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExPolygon {
    /// Outer boundary, counter-clockwise.
    pub contour: Polygon,
    /// Holes, clockwise.
    pub holes: Vec<Polygon>,
}

/// A collection of ExPolygons.
pub type ExPolygons = Vec<ExPolygon>;

impl ExPolygon {
    pub fn new(contour: Polygon) -> Self {
        Self {
            contour,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(contour: Polygon, holes: Vec<Polygon>) -> Self {
        Self { contour, holes }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contour.len() < 3
    }

    /// Net area (contour minus holes) in scaled² units.
    pub fn area(&self) -> CoordF {
        let mut area = self.contour.area();
        for hole in &self.holes {
            area -= hole.area();
        }
        area
    }

    /// Net area in mm².
    #[inline]
    pub fn area_mm2(&self) -> CoordF {
        self.area() / (crate::SCALING_FACTOR * crate::SCALING_FACTOR)
    }

    /// Point containment: inside the contour and outside every hole.
    pub fn contains_point(&self, pt: &Point) -> bool {
        if !self.contour.contains_point(pt) {
            return false;
        }
        !self.holes.iter().any(|h| h.contains_point(pt))
    }

    /// Enforce the winding convention (CCW contour, CW holes).
    pub fn orient(&mut self) {
        if !self.contour.is_ccw() {
            self.contour.reverse();
        }
        for hole in &mut self.holes {
            if hole.is_ccw() {
                hole.reverse();
            }
        }
    }

    /// All rings of this region: the contour followed by the holes.
    pub fn all_rings(&self) -> impl Iterator<Item = &Polygon> {
        std::iter::once(&self.contour).chain(self.holes.iter())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }

    /// All rings as closed polylines (first point repeated at the end).
    pub fn to_closed_polylines(&self) -> Vec<Polyline> {
        self.all_rings().map(|r| r.to_closed_polyline()).collect()
    }
}

impl From<Polygon> for ExPolygon {
    fn from(polygon: Polygon) -> Self {
        ExPolygon::new(polygon)
    }
}

/// Total net area of a region set in scaled² units.
pub fn total_area(expolygons: &[ExPolygon]) -> CoordF {
    expolygons.iter().map(|e| e.area()).sum()
}

/// Bounding box of an entire region set.
pub fn expolygons_bounds(expolygons: &[ExPolygon]) -> BoundingBox {
    let mut bb = BoundingBox::empty();
    for e in expolygons {
        bb.merge(&e.bounding_box());
    }
    bb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale;

    fn square(x: f64, y: f64, size: f64) -> Polygon {
        Polygon::rectangle(
            Point::new(scale(x), scale(y)),
            Point::new(scale(x + size), scale(y + size)),
        )
    }

    #[test]
    fn test_area_with_hole() {
        let mut hole = square(2.0, 2.0, 6.0);
        hole.reverse();
        let ex = ExPolygon::with_holes(square(0.0, 0.0, 10.0), vec![hole]);
        assert!((ex.area_mm2() - 64.0).abs() < 1e-6);
    }

    #[test]
    fn test_contains_point_respects_holes() {
        let mut hole = square(2.0, 2.0, 6.0);
        hole.reverse();
        let ex = ExPolygon::with_holes(square(0.0, 0.0, 10.0), vec![hole]);
        assert!(ex.contains_point(&Point::new(scale(1.0), scale(1.0))));
        assert!(!ex.contains_point(&Point::new(scale(5.0), scale(5.0))));
    }

    #[test]
    fn test_orient_idempotent() {
        let mut contour = square(0.0, 0.0, 10.0);
        contour.reverse(); // wrong winding on purpose
        let mut ex = ExPolygon::new(contour);
        ex.orient();
        assert!(ex.contour.is_ccw());
        let snapshot = ex.clone();
        ex.orient();
        assert_eq!(ex, snapshot);
    }
}
