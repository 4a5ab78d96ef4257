//! Point types.
//!
//! 2D layer geometry uses [`Point`] with scaled integer coordinates and
//! [`PointF`] for unscaled intermediate math. The 3D mesh side uses
//! [`Point3`] in plain millimeters; mesh deduplication works on quantized
//! coordinate keys rather than exact float equality.

use crate::{scale, unscale, Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// A 2D point with scaled integer coordinates.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    #[inline]
    pub fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Construct from millimeter coordinates.
    #[inline]
    pub fn from_mm(x: CoordF, y: CoordF) -> Self {
        Self::new(scale(x), scale(y))
    }

    /// Euclidean distance to another point, in scaled units.
    #[inline]
    pub fn distance(&self, other: &Point) -> CoordF {
        let dx = (other.x - self.x) as CoordF;
        let dy = (other.y - self.y) as CoordF;
        (dx * dx + dy * dy).sqrt()
    }

    /// Euclidean distance to another point, in millimeters.
    #[inline]
    pub fn distance_mm(&self, other: &Point) -> CoordF {
        self.distance(other) / crate::SCALING_FACTOR
    }

    /// Convert to an unscaled floating-point point (mm).
    #[inline]
    pub fn to_f(&self) -> PointF {
        PointF::new(unscale(self.x), unscale(self.y))
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A 2D point with floating-point millimeter coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: CoordF,
    pub y: CoordF,
}

impl PointF {
    #[inline]
    pub fn new(x: CoordF, y: CoordF) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn to_scaled(&self) -> Point {
        Point::from_mm(self.x, self.y)
    }

    #[inline]
    pub fn distance(&self, other: &PointF) -> CoordF {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Vector length.
    #[inline]
    pub fn norm(&self) -> CoordF {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for PointF {
    type Output = PointF;
    #[inline]
    fn add(self, rhs: PointF) -> PointF {
        PointF::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PointF {
    type Output = PointF;
    #[inline]
    fn sub(self, rhs: PointF) -> PointF {
        PointF::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A 3D point in millimeters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: CoordF,
    pub y: CoordF,
    pub z: CoordF,
}

/// Quantized coordinate key for vertex interning. XY are rounded to 1e-4 mm;
/// Z is assumed to be pre-snapped to the Z quantum before the key is taken.
pub type QuantKey = (i64, i64, i64);

/// Number of decimal digits kept for the XY interning key.
const XY_KEY_SCALE: CoordF = 10_000.0;

impl Point3 {
    #[inline]
    pub fn new(x: CoordF, y: CoordF, z: CoordF) -> Self {
        Self { x, y, z }
    }

    /// Snap a Z coordinate onto the given quantum grid.
    #[inline]
    pub fn quantize_z(z: CoordF, quantum: CoordF) -> CoordF {
        (z / quantum + 0.5).floor() * quantum
    }

    /// Return a copy with Z snapped onto the quantum grid.
    #[inline]
    pub fn with_quantized_z(&self, quantum: CoordF) -> Point3 {
        Point3::new(self.x, self.y, Self::quantize_z(self.z, quantum))
    }

    /// The interning key: coordinates rounded to 1e-4 mm.
    #[inline]
    pub fn quant_key(&self) -> QuantKey {
        (
            (self.x * XY_KEY_SCALE).round() as i64,
            (self.y * XY_KEY_SCALE).round() as i64,
            (self.z * XY_KEY_SCALE).round() as i64,
        )
    }

    #[inline]
    pub fn distance(&self, other: &Point3) -> CoordF {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Vector length.
    #[inline]
    pub fn norm(&self) -> CoordF {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Dot product.
    #[inline]
    pub fn dot(&self, other: &Point3) -> CoordF {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[inline]
    pub fn cross(&self, other: &Point3) -> Point3 {
        Point3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Normalized copy, or a zero vector when the length is (near) zero.
    pub fn normalized(&self) -> Point3 {
        let n = self.norm();
        if n < 1e-12 {
            Point3::default()
        } else {
            Point3::new(self.x / n, self.y / n, self.z / n)
        }
    }

    /// Angle to another vector in radians.
    pub fn angle_to(&self, other: &Point3) -> CoordF {
        let denom = self.norm() * other.norm();
        if denom < 1e-12 {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(-1.0, 1.0).acos()
    }

    /// Drop the Z coordinate.
    #[inline]
    pub fn to_2d(&self) -> PointF {
        PointF::new(self.x, self.y)
    }
}

impl Add for Point3 {
    type Output = Point3;
    #[inline]
    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;
    #[inline]
    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}
