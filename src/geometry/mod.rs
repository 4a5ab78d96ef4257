//! Geometry primitives for the slicer.
//!
//! This module provides the fundamental geometric types used throughout the
//! slicing pipeline:
//! - [`Point`] - 2D point with scaled integer coordinates
//! - [`PointF`] - 2D point with floating-point millimeter coordinates
//! - [`Point3`] - 3D point in millimeters (mesh side)
//! - [`Polygon`] - closed ring
//! - [`Polyline`] - open path
//! - [`ExPolygon`] - polygon with holes (CCW contour, CW holes)
//! - [`BoundingBox`] / [`BoundingBox3`] - axis-aligned bounds
//!
//! ## Coordinate System
//!
//! 2D layer geometry uses scaled integer coordinates to avoid floating-point
//! precision issues; coordinates are scaled by `SCALING_FACTOR` (1,000,000),
//! so 1 unit = 1 nanometer. Use `scale()` / `unscale()` to convert. The 3D
//! mesh side stays in f64 millimeters with quantized interning keys.

mod bounding_box;
mod expolygon;
mod point;
mod polygon;
mod polyline;

pub use bounding_box::{BoundingBox, BoundingBox3};
pub use expolygon::{expolygons_bounds, total_area, ExPolygon, ExPolygons};
pub use point::{Point, Point3, PointF, QuantKey};
pub use polygon::{Polygon, Polygons};
pub use polyline::{Polyline, Polylines};

use crate::CoordF;

/// Cross product of two 2D vectors (scalar z-component).
#[inline]
pub fn cross2(v1: PointF, v2: PointF) -> CoordF {
    v1.x * v2.y - v1.y * v2.x
}

/// Dot product of two 2D vectors.
#[inline]
pub fn dot2(v1: PointF, v2: PointF) -> CoordF {
    v1.x * v2.x + v1.y * v2.y
}

/// Linear interpolation between two points.
#[inline]
pub fn lerp(a: PointF, b: PointF, t: CoordF) -> PointF {
    PointF::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Which side of the directed segment a→b the point p lies on.
/// Positive: left, negative: right, zero: collinear.
#[inline]
pub fn side_of(a: PointF, b: PointF, p: PointF) -> CoordF {
    cross2(b - a, p - a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross2() {
        let v1 = PointF::new(1.0, 0.0);
        let v2 = PointF::new(0.0, 1.0);
        assert!(cross2(v1, v2) > 0.0);
        let v3 = PointF::new(0.0, -1.0);
        assert!(cross2(v1, v3) < 0.0);
    }

    #[test]
    fn test_side_of() {
        let a = PointF::new(0.0, 0.0);
        let b = PointF::new(10.0, 0.0);
        assert!(side_of(a, b, PointF::new(5.0, 1.0)) > 0.0); // left
        assert!(side_of(a, b, PointF::new(5.0, -1.0)) < 0.0); // right
    }

    #[test]
    fn test_lerp() {
        let mid = lerp(PointF::new(0.0, 0.0), PointF::new(10.0, 10.0), 0.5);
        assert!((mid.x - 5.0).abs() < 1e-12);
    }
}
