//! Axis-aligned bounding boxes for 2D (scaled) and 3D (mm) geometry.

use super::{Point, Point3};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box over scaled 2D points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// An empty box, ready to be extended.
    pub fn empty() -> Self {
        Self {
            min: Point::new(Coord::MAX, Coord::MAX),
            max: Point::new(Coord::MIN, Coord::MIN),
        }
    }

    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Build the box enclosing a point set. Returns an empty box for no points.
    pub fn from_points(points: &[Point]) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.extend(*p);
        }
        bb
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn extend(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn merge(&mut self, other: &BoundingBox) {
        if !other.is_empty() {
            self.extend(other.min);
            self.extend(other.max);
        }
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            self.min.x + (self.max.x - self.min.x) / 2,
            self.min.y + (self.max.y - self.min.y) / 2,
        )
    }

    #[inline]
    pub fn width(&self) -> Coord {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> Coord {
        self.max.y - self.min.y
    }

    /// Length of the diagonal in scaled units.
    pub fn diagonal(&self) -> CoordF {
        self.min.distance(&self.max)
    }
}

/// Axis-aligned bounding box over 3D millimeter points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3 {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingBox3 {
    pub fn empty() -> Self {
        Self {
            min: Point3::new(CoordF::INFINITY, CoordF::INFINITY, CoordF::INFINITY),
            max: Point3::new(CoordF::NEG_INFINITY, CoordF::NEG_INFINITY, CoordF::NEG_INFINITY),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn extend(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn size(&self) -> Point3 {
        self.max - self.min
    }

    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }
}
