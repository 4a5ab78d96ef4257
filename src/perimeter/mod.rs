//! Perimeter shell generation.
//!
//! Perimeters are the concentric walls that define the shape of each layer.
//! Shell k is the slice outline offset inward by (k+0.5)·w, where w is the
//! extrusion width — the half-width term puts the outermost centerline half
//! a bead inside the model surface. Shells are ordered outermost first.
//!
//! With random starts enabled, inner shells rotate their starting vertex by
//! a uniform random fraction of the ring length, which spreads the seam
//! across the surface instead of stacking it into a visible line.

use crate::clipper::offset;
use crate::geometry::ExPolygons;
use crate::CoordF;
use rand::rngs::StdRng;
use rand::Rng;

/// Configuration for perimeter generation.
#[derive(Debug, Clone)]
pub struct PerimeterConfig {
    /// Number of shells to trace.
    pub shells: usize,

    /// Extrusion width (mm).
    pub extrusion_width: CoordF,

    /// Rotate the starting vertex of inner shells randomly.
    pub random_starts: bool,
}

impl Default for PerimeterConfig {
    fn default() -> Self {
        Self {
            shells: 2,
            extrusion_width: 0.5,
            random_starts: false,
        }
    }
}

/// Perimeter shells of one layer, outermost (index 0) first.
pub type LayerPerimeters = Vec<ExPolygons>;

/// Generate the perimeter shells for one layer's slice regions.
pub fn generate_perimeters(
    slice: &ExPolygons,
    config: &PerimeterConfig,
    rng: &mut StdRng,
) -> LayerPerimeters {
    let mut shells = Vec::with_capacity(config.shells);
    for k in 0..config.shells {
        let inset = -(k as CoordF + 0.5) * config.extrusion_width;
        let mut shell = offset(slice, inset);
        if config.random_starts && k > 0 {
            randomize_starts(&mut shell, rng);
        }
        shells.push(shell);
    }
    shells
}

/// Rotate every ring of the shell by a uniform random fraction of its length.
fn randomize_starts(shell: &mut ExPolygons, rng: &mut StdRng) {
    for expoly in shell.iter_mut() {
        rotate_ring(&mut expoly.contour, rng);
        for hole in &mut expoly.holes {
            rotate_ring(hole, rng);
        }
    }
}

fn rotate_ring(ring: &mut crate::geometry::Polygon, rng: &mut StdRng) {
    let n = ring.len();
    if n > 1 {
        let r: CoordF = rng.gen_range(0.0..1.0);
        ring.rotate_start((r * (n - 1) as CoordF).floor() as usize);
    }
}

/// The innermost non-empty shell, used as the infill boundary.
pub fn innermost_shell(perimeters: &LayerPerimeters) -> &ExPolygons {
    static EMPTY: Vec<crate::geometry::ExPolygon> = Vec::new();
    perimeters
        .iter()
        .rev()
        .find(|shell| !shell.is_empty())
        .unwrap_or(&EMPTY)
}
