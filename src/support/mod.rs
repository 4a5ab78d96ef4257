//! Support structure generation.
//!
//! Support anchors overhanging features to the bed (or to the model, in
//! `Everywhere` mode). The computation runs in two sweeps over the layers:
//!
//! 1. **Top-down overhang accumulation.** Facet footprints steeper than the
//!    overhang threshold are unioned into a falling drop mask; footprints of
//!    printable facets are subtracted — they catch whatever falls on them.
//! 2. **Bottom-up shadow expansion.** Each layer's printed outline (grown by
//!    an outset, plus the layer above so support never crowds the surface it
//!    supports) is subtracted from the drop mask. `External` mode keeps the
//!    running union of all shadows, so overhangs enclosed by prior model
//!    extents are left unsupported.
//!
//! The remaining overhang regions are cleaned with an open-close morphology,
//! inset by half a bead for the outline, and filled with lines at the
//! support density.

use crate::clipper::{clip_polylines, difference, offset, orient_paths, union, union_all};
use crate::geometry::{expolygons_bounds, ExPolygons, Point3, Polygon, Polyline};
use crate::infill::fill_lines;
use crate::mesh::Mesh;
use crate::CoordF;

/// Where support material may be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupportType {
    /// No support.
    #[default]
    None,
    /// Support resting on the model as well as the bed.
    Everywhere,
    /// Support only outside the model's footprint.
    External,
}

impl SupportType {
    /// Parse the configuration option value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "None" => Some(SupportType::None),
            "Everywhere" => Some(SupportType::Everywhere),
            "External" => Some(SupportType::External),
            _ => None,
        }
    }
}

/// Configuration for support generation.
#[derive(Debug, Clone)]
pub struct SupportConfig {
    pub support_type: SupportType,

    /// Overhang threshold in degrees; facets at or past it get support.
    pub overhang_angle: CoordF,

    /// How far the printed shadow mask is grown around each layer (mm).
    pub outset: CoordF,

    /// Support infill density (0-1).
    pub density: CoordF,

    /// Extrusion width for support paths (mm).
    pub extrusion_width: CoordF,

    /// Overlap between support infill and its outline (mm).
    pub infill_overlap: CoordF,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            support_type: SupportType::None,
            overhang_angle: 45.0,
            outset: 0.5,
            density: 0.33,
            extrusion_width: 0.5,
            infill_overlap: 0.1,
        }
    }
}

/// Per-layer support geometry.
#[derive(Clone, Debug, Default)]
pub struct SupportResult {
    /// Support region outline rings per layer.
    pub outline: Vec<ExPolygons>,
    /// Support infill lines per layer.
    pub infill: Vec<Vec<Polyline>>,
}

impl SupportResult {
    fn empty(layer_count: usize) -> Self {
        Self {
            outline: vec![Vec::new(); layer_count],
            infill: vec![Vec::new(); layer_count],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.outline.iter().all(|o| o.is_empty())
    }
}

/// The overhang angle of a facet: 90° minus the angle between its normal and
/// straight down. 90° for a face pointing at the bed, 0° for a vertical
/// wall, negative for upward faces.
pub fn overhang_angle(normal: &Point3) -> CoordF {
    let down = Point3::new(0.0, 0.0, -1.0);
    90.0 - normal.angle_to(&down).to_degrees()
}

/// The 2D footprint of a facet, wound counter-clockwise.
fn facet_footprint(mesh: &Mesh, id: crate::mesh::FacetId) -> Option<Polygon> {
    let pts = mesh.facet_points(id);
    let mut ring = Polygon::from_points(vec![
        pts[0].to_2d().to_scaled(),
        pts[1].to_2d().to_scaled(),
        pts[2].to_2d().to_scaled(),
    ]);
    if ring.area_mm2() < 1e-6 {
        // Vertical facets project to nothing.
        return None;
    }
    if !ring.is_ccw() {
        ring.reverse();
    }
    Some(ring)
}

/// Build support for the whole model.
///
/// `layer_paths` are the assembled slice outlines per layer; the result is
/// indexed the same way.
pub fn build_support(
    mesh: &Mesh,
    layer_paths: &[ExPolygons],
    layer_height: CoordF,
    config: &SupportConfig,
) -> SupportResult {
    let n = layer_paths.len();
    if config.support_type == SupportType::None || n == 0 {
        return SupportResult::empty(n);
    }

    // Facet-per-layer index over ceil(minz/h) ..= floor(maxz/h).
    let mut facets_by_layer: Vec<Vec<crate::mesh::FacetId>> = vec![Vec::new(); n];
    for id in mesh.facet_ids() {
        let (min_z, max_z) = mesh.facet_z_range(id);
        let start = (min_z / layer_height).ceil() as i64;
        let end = (max_z / layer_height).floor() as i64;
        for layer in start.max(0)..=end.min(n as i64 - 1) {
            facets_by_layer[layer as usize].push(id);
        }
    }

    // Top-down overhang accumulation.
    let mut drop_mask: ExPolygons = Vec::new();
    let mut drop_paths: Vec<ExPolygons> = vec![Vec::new(); n];
    for layer in (0..n).rev() {
        let mut adds: Vec<Polygon> = Vec::new();
        let mut diffs: Vec<Polygon> = Vec::new();
        for &id in &facets_by_layer[layer] {
            let normal = mesh.facet(id).normal;
            if normal.norm() < 0.5 {
                continue;
            }
            let Some(footprint) = facet_footprint(mesh, id) else {
                continue;
            };
            if overhang_angle(&normal) >= config.overhang_angle {
                adds.push(footprint);
            } else {
                diffs.push(footprint);
            }
        }
        drop_mask = union(&drop_mask, &merge_footprints(adds));
        drop_mask = difference(&drop_mask, &merge_footprints(diffs));
        drop_paths[layer] = drop_mask.clone();
    }

    // Bottom-up shadow expansion and fill.
    let w = config.extrusion_width;
    let mut result = SupportResult::empty(n);
    let mut cumulative: ExPolygons = Vec::new();
    for layer in 0..n {
        let mut shadow = offset(&layer_paths[layer], config.outset);
        if layer + 1 < n {
            shadow = union(&shadow, &layer_paths[layer + 1]);
        }
        if config.support_type == SupportType::Everywhere && layer > 0 {
            shadow = union(&shadow, &layer_paths[layer - 1]);
        }
        let mask = if config.support_type == SupportType::External {
            cumulative = union(&cumulative, &shadow);
            &cumulative
        } else {
            &shadow
        };

        let overhang = difference(&drop_paths[layer], mask);
        if overhang.is_empty() {
            continue;
        }
        // Open-close to drop slivers narrower than a bead.
        let cleaned = offset(&offset(&offset(&overhang, w), -2.0 * w), w);
        if cleaned.is_empty() {
            continue;
        }

        let outline = offset(&cleaned, -w / 2.0);
        if outline.is_empty() {
            continue;
        }
        let clip = offset(&outline, config.infill_overlap - w);
        let lines = fill_lines(
            &expolygons_bounds(&outline),
            0.0,
            w / config.density.max(1e-3),
        );
        result.infill[layer] = clip_polylines(&lines, &clip);
        result.outline[layer] = outline;
    }
    result
}

/// Union a pile of triangle footprints into regions.
fn merge_footprints(rings: Vec<Polygon>) -> ExPolygons {
    let regions: ExPolygons = rings
        .into_iter()
        .flat_map(|ring| orient_paths(vec![ring]))
        .collect();
    union_all(&regions)
}
