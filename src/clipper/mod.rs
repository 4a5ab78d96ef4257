//! Polygon boolean and offset operations.
//!
//! This module wraps the geo-clipper library behind the small interface the
//! pipeline needs:
//! - union / intersection / difference over region sets
//! - inflate/deflate offsets (square joins)
//! - clipping open polylines to regions
//! - reorienting loose rings into contours-with-holes by containment
//!
//! These operations drive perimeter offsets, top/bottom mask differences,
//! support mask algebra and infill clipping.

use crate::geometry::{ExPolygon, ExPolygons, Point, Polygon, Polyline};
use crate::{unscale, CoordF};
use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};

/// Join type for offset corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetJoinType {
    /// Square corners — the default for shell and mask offsets.
    #[default]
    Square,
    /// Round corners.
    Round,
    /// Mitered corners.
    Miter,
}

impl From<OffsetJoinType> for JoinType {
    fn from(jt: OffsetJoinType) -> Self {
        match jt {
            OffsetJoinType::Square => JoinType::Square,
            OffsetJoinType::Round => JoinType::Round(0.25),
            OffsetJoinType::Miter => JoinType::Miter(2.0),
        }
    }
}

/// Clipper's integer grid resolution for f64 inputs.
const CLIPPER_FACTOR: f64 = 1000.0;

fn ring_to_geo(points: &[Point]) -> LineString<f64> {
    let mut ring: Vec<GeoCoord<f64>> = points
        .iter()
        .map(|p| GeoCoord {
            x: unscale(p.x),
            y: unscale(p.y),
        })
        .collect();
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(*first);
        }
    }
    LineString::new(ring)
}

fn expolygon_to_geo(expoly: &ExPolygon) -> GeoPolygon<f64> {
    let exterior = ring_to_geo(expoly.contour.points());
    let holes: Vec<LineString<f64>> = expoly
        .holes
        .iter()
        .map(|hole| ring_to_geo(hole.points()))
        .collect();
    GeoPolygon::new(exterior, holes)
}

fn geo_ring_to_polygon(ring: &LineString<f64>) -> Polygon {
    let mut points: Vec<Point> = ring
        .coords()
        .map(|c| Point::new(crate::scale(c.x), crate::scale(c.y)))
        .collect();
    // Drop the closing point; our Polygon does not store it.
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Polygon::from_points(points)
}

fn geo_to_expolygon(geo_poly: &GeoPolygon<f64>) -> ExPolygon {
    let contour = geo_ring_to_polygon(geo_poly.exterior());
    let holes: Vec<Polygon> = geo_poly.interiors().iter().map(geo_ring_to_polygon).collect();
    let mut ex = ExPolygon::with_holes(contour, holes);
    ex.orient();
    ex
}

fn geo_multi_to_expolygons(multi: &MultiPolygon<f64>) -> ExPolygons {
    multi
        .0
        .iter()
        .map(geo_to_expolygon)
        .filter(|e| !e.is_empty())
        .collect()
}

fn expolygons_to_geo_multi(expolys: &[ExPolygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(expolys.iter().map(expolygon_to_geo).collect())
}

// ============================================================================
// Boolean Operations
// ============================================================================

/// Union of two region sets.
pub fn union(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return clip.to_vec();
    }
    if clip.is_empty() {
        return subject.to_vec();
    }
    let result = expolygons_to_geo_multi(subject).union(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Union of a single set of potentially overlapping regions.
pub fn union_all(expolygons: &[ExPolygon]) -> ExPolygons {
    match expolygons.len() {
        0 => vec![],
        1 => expolygons.to_vec(),
        _ => {
            let mut result = vec![expolygons[0].clone()];
            for poly in expolygons.iter().skip(1) {
                result = union(&result, std::slice::from_ref(poly));
            }
            result
        }
    }
}

/// Intersection of two region sets.
pub fn intersection(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() || clip.is_empty() {
        return vec![];
    }
    let result =
        expolygons_to_geo_multi(subject).intersection(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Difference of two region sets (subject − clip).
pub fn difference(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return vec![];
    }
    if clip.is_empty() {
        return subject.to_vec();
    }
    let result =
        expolygons_to_geo_multi(subject).difference(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

// ============================================================================
// Offset Operations
// ============================================================================

/// Offset a region set by a distance in millimeters.
/// Positive delta inflates, negative deflates.
pub fn offset_expolygons(
    expolygons: &[ExPolygon],
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if expolygons.is_empty() {
        return vec![];
    }
    let result = expolygons_to_geo_multi(expolygons).offset(
        delta,
        join_type.into(),
        EndType::ClosedPolygon,
        CLIPPER_FACTOR,
    );
    geo_multi_to_expolygons(&result)
}

/// Offset with the default square joins.
#[inline]
pub fn offset(expolygons: &[ExPolygon], delta: CoordF) -> ExPolygons {
    offset_expolygons(expolygons, delta, OffsetJoinType::Square)
}

// ============================================================================
// Ring Orientation
// ============================================================================

/// Point-in-region test over a loose ring set by odd winding count.
pub fn paths_contain(pt: &Point, rings: &[Polygon]) -> bool {
    let mut windings = 0usize;
    for ring in rings {
        if ring.contains_point(pt) {
            windings += 1;
        }
    }
    windings % 2 == 1
}

/// Reorient a loose set of closed rings into regions.
///
/// A ring contained in an even number of the *other* rings is an outer
/// contour (forced CCW); odd-depth rings are holes (forced CW) and are
/// attached to the smallest containing contour. Containment is evaluated
/// against all other rings, never against a partially drained list, so the
/// result does not depend on input order.
pub fn orient_paths(rings: Vec<Polygon>) -> ExPolygons {
    let rings: Vec<Polygon> = rings.into_iter().filter(|r| r.len() >= 3).collect();
    if rings.is_empty() {
        return vec![];
    }

    // Containment depth of each ring among the others.
    let depths: Vec<usize> = (0..rings.len())
        .map(|i| {
            let probe = rings[i].points()[0];
            rings
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && other.contains_point(&probe))
                .count()
        })
        .collect();

    let mut contours: Vec<ExPolygon> = Vec::new();
    let mut holes: Vec<Polygon> = Vec::new();

    for (i, mut ring) in rings.into_iter().enumerate() {
        if depths[i] % 2 == 0 {
            if !ring.is_ccw() {
                ring.reverse();
            }
            contours.push(ExPolygon::new(ring));
        } else {
            if ring.is_ccw() {
                ring.reverse();
            }
            holes.push(ring);
        }
    }

    // Attach each hole to the smallest contour that contains it.
    for hole in holes {
        let probe = hole.points()[0];
        let mut best: Option<usize> = None;
        let mut best_area = CoordF::INFINITY;
        for (k, contour) in contours.iter().enumerate() {
            if contour.contour.contains_point(&probe) {
                let area = contour.contour.area();
                if area < best_area {
                    best_area = area;
                    best = Some(k);
                }
            }
        }
        if let Some(k) = best {
            contours[k].holes.push(hole);
        }
        // A hole with no containing contour is dropped as degenerate input.
    }

    contours
}

// ============================================================================
// Polyline Clipping
// ============================================================================

/// Sampling step for polyline clipping: 0.1 mm in scaled units.
const CLIP_SAMPLE_STEP: f64 = 100_000.0;

/// Clip open polylines to a region set, keeping the inside portions.
///
/// Each input polyline may produce zero, one, or several output polylines
/// depending on how it crosses the region boundary.
pub fn clip_polylines(polylines: &[Polyline], clip: &[ExPolygon]) -> Vec<Polyline> {
    if polylines.is_empty() || clip.is_empty() {
        return vec![];
    }
    let mut result = Vec::new();
    for polyline in polylines {
        clip_one_polyline(polyline, clip, &mut result);
    }
    result
}

fn point_in_expolygons(pt: Point, expolygons: &[ExPolygon]) -> bool {
    expolygons.iter().any(|e| e.contains_point(&pt))
}

fn clip_one_polyline(polyline: &Polyline, clip: &[ExPolygon], out: &mut Vec<Polyline>) {
    let points = polyline.points();
    if points.len() < 2 {
        return;
    }

    let mut current: Vec<Point> = Vec::new();
    for i in 0..points.len() - 1 {
        for segment in clip_segment(points[i], points[i + 1], clip) {
            if segment.len() < 2 {
                continue;
            }
            if let Some(last) = current.last().copied() {
                let first = segment[0];
                if (last.x - first.x).abs() <= 1 && (last.y - first.y).abs() <= 1 {
                    current.extend(segment.into_iter().skip(1));
                    continue;
                }
                if current.len() >= 2 {
                    out.push(Polyline::from_points(std::mem::take(&mut current)));
                } else {
                    current.clear();
                }
            }
            current = segment;
        }
    }
    if current.len() >= 2 {
        out.push(Polyline::from_points(current));
    }
}

/// Portions of the segment p1→p2 inside the clip regions, found by sampling
/// at 0.1 mm intervals.
fn clip_segment(p1: Point, p2: Point, clip: &[ExPolygon]) -> Vec<Vec<Point>> {
    let dx = (p2.x - p1.x) as f64;
    let dy = (p2.y - p1.y) as f64;
    let len = (dx * dx + dy * dy).sqrt();

    if len < 1.0 {
        if point_in_expolygons(p1, clip) {
            return vec![vec![p1, p2]];
        }
        return vec![];
    }

    let num_samples = ((len / CLIP_SAMPLE_STEP).ceil() as usize).max(2);
    let mut result = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for i in 0..=num_samples {
        let t = i as f64 / num_samples as f64;
        let pt = Point::new(
            (p1.x as f64 + dx * t).round() as i64,
            (p1.y as f64 + dy * t).round() as i64,
        );
        if point_in_expolygons(pt, clip) {
            current.push(pt);
        } else if current.len() >= 2 {
            result.push(std::mem::take(&mut current));
        } else {
            current.clear();
        }
    }
    if current.len() >= 2 {
        result.push(current);
    }
    result
}
