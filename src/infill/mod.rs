//! Infill pattern generation.
//!
//! Infill fills the interior of a layer after perimeters have been traced.
//! Solid regions (top/bottom masks) always fill with dense lines at ±45°;
//! sparse regions fill with the configured pattern.
//!
//! # Algorithm
//!
//! 1. Tile straight line families across the bounding rectangle of the mask,
//!    rotated by `base_angle + rot` for each rotation in the pattern's set
//!    and centered on the snapped midpoint of the bounds
//! 2. Clip the lines to the mask with the boolean layer
//!
//! The per-pattern line spacing compensates for the number of line families
//! so the requested density holds: Lines w/d, Grid 2w/d, Triangles 3w/d.
//! Hexagons tile zig-zag walls on a column/row grid instead.

use crate::clipper::{clip_polylines, difference, offset};
use crate::geometry::{expolygons_bounds, BoundingBox, ExPolygon, Point, PointF, Polyline};
use crate::CoordF;

/// Sparse infill pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InfillPattern {
    /// Parallel lines, direction alternating per layer.
    Lines,
    /// Three line families at 60° to each other.
    Triangles,
    /// Crossing lines at 90°.
    #[default]
    Grid,
    /// Hexagonal (honeycomb) walls.
    Hexagons,
}

impl InfillPattern {
    /// Parse the configuration option value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Lines" => Some(InfillPattern::Lines),
            "Triangles" => Some(InfillPattern::Triangles),
            "Grid" => Some(InfillPattern::Grid),
            "Hexagons" => Some(InfillPattern::Hexagons),
            _ => None,
        }
    }

    /// Base angle for a layer, in degrees.
    pub fn base_angle(&self, layer: usize) -> CoordF {
        match self {
            InfillPattern::Lines | InfillPattern::Grid => {
                if layer % 2 == 0 {
                    135.0
                } else {
                    45.0
                }
            }
            InfillPattern::Triangles => 60.0 * (layer % 3) as CoordF,
            InfillPattern::Hexagons => 120.0 * (layer % 3) as CoordF,
        }
    }

    /// The rotation set of line families.
    fn rotations(&self) -> &'static [CoordF] {
        match self {
            InfillPattern::Lines => &[0.0],
            InfillPattern::Grid => &[0.0, 90.0],
            InfillPattern::Triangles => &[0.0, 60.0, 120.0],
            InfillPattern::Hexagons => &[0.0],
        }
    }

    /// Line spacing at the given density and extrusion width.
    fn spacing(&self, width: CoordF, density: CoordF) -> CoordF {
        match self {
            InfillPattern::Lines => width / density,
            InfillPattern::Grid => 2.0 * width / density,
            InfillPattern::Triangles => 3.0 * width / density,
            InfillPattern::Hexagons => 4.0 / 3.0 * width / density,
        }
    }
}

/// Midpoint of the bounds snapped onto the spacing grid, in millimeters.
fn snapped_center(bounds: &BoundingBox, spacing: CoordF) -> PointF {
    let c = bounds.center().to_f();
    PointF::new(
        (c.x / spacing).round() * spacing,
        (c.y / spacing).round() * spacing,
    )
}

/// Generate one family of parallel lines covering `bounds`, rotated by
/// `angle_deg` and spaced `spacing` mm apart.
pub fn fill_lines(bounds: &BoundingBox, angle_deg: CoordF, spacing: CoordF) -> Vec<Polyline> {
    if bounds.is_empty() || spacing <= 0.0 {
        return vec![];
    }
    let center = snapped_center(bounds, spacing);
    let half = bounds.diagonal() / crate::SCALING_FACTOR / 2.0 + spacing;

    let theta = angle_deg.to_radians();
    let u = PointF::new(theta.cos(), theta.sin());
    let v = PointF::new(-theta.sin(), theta.cos());

    let count = (half / spacing).ceil() as i64;
    let mut lines = Vec::with_capacity((2 * count + 1) as usize);
    for k in -count..=count {
        let dist = k as CoordF * spacing;
        let mid = PointF::new(center.x + v.x * dist, center.y + v.y * dist);
        let a = PointF::new(mid.x - u.x * half, mid.y - u.y * half);
        let b = PointF::new(mid.x + u.x * half, mid.y + u.y * half);
        lines.push(Polyline::from_points(vec![a.to_scaled(), b.to_scaled()]));
    }
    lines
}

/// Hexagonal walls: zig-zag columns on a (4/3)w/d column grid.
fn hexagon_lines(
    bounds: &BoundingBox,
    angle_deg: CoordF,
    width: CoordF,
    density: CoordF,
) -> Vec<Polyline> {
    let col = 4.0 / 3.0 * width / density;
    let row = col * 3.0 / 60f64.to_radians().sin();
    if bounds.is_empty() || col <= 0.0 {
        return vec![];
    }

    let center = snapped_center(bounds, col);
    let half = bounds.diagonal() / crate::SCALING_FACTOR / 2.0 + row;
    let theta = angle_deg.to_radians();
    let (sin_t, cos_t) = (theta.sin(), theta.cos());
    let rotate = |p: PointF| -> Point {
        PointF::new(
            center.x + p.x * cos_t - p.y * sin_t,
            center.y + p.x * sin_t + p.y * cos_t,
        )
        .to_scaled()
    };

    let amplitude = col / 4.0;
    let half_row = row / 2.0;
    let cols = (half / col).ceil() as i64;
    let rows = (2.0 * half / half_row).ceil() as i64;

    let mut walls = Vec::new();
    for i in -cols..=cols {
        let x = i as CoordF * col;
        // Alternate the wave phase per column so adjacent walls mesh into
        // hexagon cells.
        let phase = if i.rem_euclid(2) == 0 { 0 } else { 2 };
        let mut points = Vec::with_capacity(rows as usize + 1);
        for j in 0..=rows {
            let y = -half + j as CoordF * half_row;
            // Trapezoid wave: +, +, -, - over successive half-rows.
            let s = match (j + phase).rem_euclid(4) {
                0 | 1 => 1.0,
                _ => -1.0,
            };
            points.push(rotate(PointF::new(x + s * amplitude, y)));
        }
        walls.push(Polyline::from_points(points));
    }
    walls
}

/// All line families of a pattern tiled over `bounds` (unclipped).
pub fn pattern_lines(
    pattern: InfillPattern,
    bounds: &BoundingBox,
    base_angle: CoordF,
    width: CoordF,
    density: CoordF,
) -> Vec<Polyline> {
    if density <= 0.0 {
        return vec![];
    }
    match pattern {
        InfillPattern::Hexagons => hexagon_lines(bounds, base_angle, width, density),
        _ => {
            let spacing = pattern.spacing(width, density);
            let mut lines = Vec::new();
            for rot in pattern.rotations() {
                lines.extend(fill_lines(bounds, base_angle + rot, spacing));
            }
            lines
        }
    }
}

/// Line infill for an arbitrary region (supports, raft, skirt priming).
/// Lines at `angle_deg` with density `density` clipped to the region.
pub fn fill_region(
    region: &[ExPolygon],
    angle_deg: CoordF,
    density: CoordF,
    width: CoordF,
) -> Vec<Polyline> {
    if region.is_empty() || density <= 0.0 {
        return vec![];
    }
    let bounds = expolygons_bounds(region);
    let lines = fill_lines(&bounds, angle_deg, width / density);
    clip_polylines(&lines, region)
}

/// Solid infill for a layer: dense lines alternating +45°/−45°.
pub fn solid_infill(
    solid_mask: &[ExPolygon],
    layer: usize,
    width: CoordF,
    overlap: CoordF,
) -> Vec<Polyline> {
    if solid_mask.is_empty() {
        return vec![];
    }
    let angle = if layer % 2 == 0 { 45.0 } else { -45.0 };
    let clip = offset(solid_mask, overlap - width);
    if clip.is_empty() {
        return vec![];
    }
    let lines = fill_lines(&expolygons_bounds(solid_mask), angle, width);
    clip_polylines(&lines, &clip)
}

/// Sparse infill for a layer.
///
/// The fill mask is the innermost perimeter pulled in by `width - overlap`,
/// minus the solid regions. Densities of 0.99 and above promote to Lines.
pub fn sparse_infill(
    innermost: &[ExPolygon],
    solid_mask: &[ExPolygon],
    layer: usize,
    pattern: InfillPattern,
    density: CoordF,
    width: CoordF,
    overlap: CoordF,
) -> Vec<Polyline> {
    if density <= 0.0 || innermost.is_empty() {
        return vec![];
    }
    let pattern = if density >= 0.99 {
        InfillPattern::Lines
    } else {
        pattern
    };
    let density = density.min(1.0);

    let region = difference(&offset(innermost, overlap - width), solid_mask);
    if region.is_empty() {
        return vec![];
    }

    let lines = pattern_lines(
        pattern,
        &expolygons_bounds(&region),
        pattern.base_angle(layer),
        width,
        density,
    );
    clip_polylines(&lines, &region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ExPolygons, Polygon};
    use crate::scale;

    fn square(size: f64) -> ExPolygons {
        vec![ExPolygon::new(Polygon::rectangle(
            Point::new(0, 0),
            Point::new(scale(size), scale(size)),
        ))]
    }

    #[test]
    fn test_fill_lines_cover_bounds() {
        let bounds = expolygons_bounds(&square(10.0));
        let lines = fill_lines(&bounds, 0.0, 1.0);
        // At 1 mm spacing over a 10 mm square, at least 10 lines cross it.
        assert!(lines.len() >= 10);
        for line in &lines {
            assert_eq!(line.len(), 2);
        }
    }

    #[test]
    fn test_zero_density_empty() {
        let region = square(10.0);
        assert!(sparse_infill(&region, &[], 0, InfillPattern::Grid, 0.0, 0.5, 0.1).is_empty());
        assert!(fill_region(&region, 0.0, 0.0, 0.5).is_empty());
    }

    #[test]
    fn test_high_density_promotes_to_lines() {
        let region = square(10.0);
        let promoted = sparse_infill(&region, &[], 4, InfillPattern::Hexagons, 0.995, 0.5, 0.1);
        let lines = sparse_infill(&region, &[], 4, InfillPattern::Lines, 0.995, 0.5, 0.1);
        // Both go through the Lines generator with the same base angle.
        assert_eq!(promoted.len(), lines.len());
        assert!(!promoted.is_empty());
    }

    #[test]
    fn test_solid_infill_clipped_inside() {
        let mask = square(10.0);
        let paths = solid_infill(&mask, 0, 0.5, 0.1);
        assert!(!paths.is_empty());
        let bounds = expolygons_bounds(&mask);
        for path in &paths {
            for p in path.points() {
                assert!(p.x >= bounds.min.x - scale(0.2) && p.x <= bounds.max.x + scale(0.2));
                assert!(p.y >= bounds.min.y - scale(0.2) && p.y <= bounds.max.y + scale(0.2));
            }
        }
    }

    #[test]
    fn test_solid_infill_angle_alternates() {
        let mask = square(10.0);
        let even = solid_infill(&mask, 0, 0.5, 0.1);
        let odd = solid_infill(&mask, 1, 0.5, 0.1);
        assert!(!even.is_empty() && !odd.is_empty());
        // +45 and -45 line directions differ.
        let dir = |p: &Polyline| {
            let a = p.points()[0];
            let b = p.points()[p.len() - 1];
            ((b.y - a.y) as f64).signum() * ((b.x - a.x) as f64).signum()
        };
        assert!(dir(&even[0]) != dir(&odd[0]));
    }

    #[test]
    fn test_sparse_infill_avoids_solid_mask() {
        let region = square(20.0);
        // Solid mask covering the left half.
        let solid = vec![ExPolygon::new(Polygon::rectangle(
            Point::new(0, 0),
            Point::new(scale(10.0), scale(20.0)),
        ))];
        let paths = sparse_infill(&region, &solid, 0, InfillPattern::Lines, 0.5, 0.5, 0.1);
        assert!(!paths.is_empty());
        // No sparse line reaches deep into the solid half.
        for path in &paths {
            for p in path.points() {
                assert!(p.x > scale(9.0));
            }
        }
    }

    #[test]
    fn test_grid_has_two_families() {
        let bounds = expolygons_bounds(&square(10.0));
        let lines_single = pattern_lines(InfillPattern::Lines, &bounds, 0.0, 0.5, 0.5);
        let grid = pattern_lines(InfillPattern::Grid, &bounds, 0.0, 0.5, 0.5);
        // Grid doubles the spacing but adds a second family.
        assert!(grid.len() > lines_single.len() / 2);
        assert!(!grid.is_empty());
    }

    #[test]
    fn test_hexagon_walls_generated() {
        let region = square(20.0);
        let paths = sparse_infill(&region, &[], 0, InfillPattern::Hexagons, 0.3, 0.5, 0.1);
        assert!(!paths.is_empty());
        // Hexagon walls are polylines with many vertices, not straight lines.
        assert!(paths.iter().any(|p| p.len() > 2));
    }

    #[test]
    fn test_pattern_from_name() {
        assert_eq!(InfillPattern::from_name("Grid"), Some(InfillPattern::Grid));
        assert_eq!(
            InfillPattern::from_name("Hexagons"),
            Some(InfillPattern::Hexagons)
        );
        assert_eq!(InfillPattern::from_name("bogus"), None);
    }
}
