//! Facet-plane intersection.
//!
//! Intersecting a facet with the plane z=k yields an oriented 2D segment:
//! the direction is chosen so that the facet's 2D-projected normal points to
//! the right of the segment. With all facets of a closed surface sliced this
//! way, the segments of one layer chain into loops whose material side is
//! consistent, which is what lets the assembler recover outer contours and
//! holes.

use crate::geometry::{side_of, PointF};
use crate::mesh::{FacetId, Mesh};
use crate::CoordF;

/// Vertices are considered on the plane within this tolerance (mm).
const ON_PLANE_EPS: CoordF = 1e-9;

/// Facets whose projected normal is shorter than this are horizontal and
/// produce no segment.
const FLAT_NORMAL_EPS: CoordF = 1e-6;

/// An oriented 2D intersection segment in millimeters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliceSegment {
    pub a: PointF,
    pub b: PointF,
}

/// Snap a slicing plane onto the quantum grid, offset by half a quantum so
/// planes fall between quantized vertex heights.
#[inline]
pub fn snap_plane(z: CoordF, quantum: CoordF) -> CoordF {
    (z / quantum + 0.5).floor() * quantum + quantum / 2.0
}

/// Intersect a facet with the plane z=k (already snapped via [`snap_plane`]).
pub fn slice_facet(mesh: &Mesh, id: FacetId, z: CoordF) -> Option<SliceSegment> {
    let pts = mesh.facet_points(id);
    let normal = mesh.facet(id).normal;

    let min_z = pts[0].z.min(pts[1].z).min(pts[2].z);
    let max_z = pts[0].z.max(pts[1].z).max(pts[2].z);
    if z < min_z || z > max_z {
        return None;
    }

    let n2d = PointF::new(normal.x, normal.y);
    if n2d.norm() < FLAT_NORMAL_EPS {
        // Nearly horizontal facet: no usable cross-section direction.
        return None;
    }

    let on_plane: Vec<usize> = (0..3).filter(|&i| (pts[i].z - z).abs() < ON_PLANE_EPS).collect();

    let segment = match on_plane.len() {
        3 => return None, // fully coplanar, but FLAT_NORMAL_EPS already rejects
        2 => {
            // An edge lies exactly on the plane: that edge is the segment.
            let a = pts[on_plane[0]].to_2d();
            let b = pts[on_plane[1]].to_2d();
            SliceSegment { a, b }
        }
        1 => {
            // One vertex on the plane; intersect the opposite edge.
            let vi = on_plane[0];
            let pj = pts[(vi + 1) % 3];
            let pk = pts[(vi + 2) % 3];
            if (pj.z - z) * (pk.z - z) > 0.0 {
                // Opposite edge entirely above or below: point contact only.
                return None;
            }
            let u = (z - pj.z) / (pk.z - pj.z);
            let hit = PointF::new(pj.x + (pk.x - pj.x) * u, pj.y + (pk.y - pj.y) * u);
            SliceSegment {
                a: pts[vi].to_2d(),
                b: hit,
            }
        }
        _ => {
            // General case: exactly two edges cross the plane.
            let mut hits = [PointF::new(0.0, 0.0); 2];
            let mut found = 0usize;
            for i in 0..3 {
                let p1 = pts[i];
                let p2 = pts[(i + 1) % 3];
                if (p1.z - z) * (p2.z - z) < 0.0 {
                    let u = (z - p1.z) / (p2.z - p1.z);
                    if found < 2 {
                        hits[found] =
                            PointF::new(p1.x + (p2.x - p1.x) * u, p1.y + (p2.y - p1.y) * u);
                        found += 1;
                    }
                }
            }
            if found != 2 {
                return None;
            }
            SliceSegment {
                a: hits[0],
                b: hits[1],
            }
        }
    };

    Some(orient(segment, n2d))
}

/// Enforce the orientation rule: a probe point displaced from the midpoint by
/// the projected normal must lie to the right of the directed segment.
fn orient(seg: SliceSegment, n2d: PointF) -> SliceSegment {
    let mid = PointF::new((seg.a.x + seg.b.x) / 2.0, (seg.a.y + seg.b.y) / 2.0);
    let probe = mid + n2d;
    if side_of(seg.a, seg.b, probe) > 0.0 {
        SliceSegment {
            a: seg.b,
            b: seg.a,
        }
    } else {
        seg
    }
}
