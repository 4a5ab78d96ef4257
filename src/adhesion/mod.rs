//! Bed adhesion structures: skirt, brim and raft.
//!
//! The skirt is a detached priming loop drawn around everything on the
//! first layer. A brim widens the first-layer footprint with concentric
//! rings joined to the model. A raft is a sacrificial multi-layer pad
//! printed under the model; the model (and its support) is lifted by the
//! raft height and printed on top.

use crate::clipper::{offset, union};
use crate::geometry::{ExPolygon, ExPolygons, Polyline};
use crate::infill::fill_region;
use crate::CoordF;

/// Bed adhesion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdhesionType {
    /// Skirt only.
    #[default]
    None,
    /// Concentric rings joined to the first layer.
    Brim,
    /// Multi-layer pad under the whole print.
    Raft,
}

impl AdhesionType {
    /// Parse the configuration option value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "None" => Some(AdhesionType::None),
            "Brim" => Some(AdhesionType::Brim),
            "Raft" => Some(AdhesionType::Raft),
            _ => None,
        }
    }
}

/// Configuration for adhesion structures.
#[derive(Debug, Clone)]
pub struct AdhesionConfig {
    pub adhesion_type: AdhesionType,

    /// Distance from the model to the skirt (mm).
    pub skirt_outset: CoordF,

    /// Total width of the brim band (mm).
    pub brim_width: CoordF,

    /// Number of raft layers under the model.
    pub raft_layers: usize,

    /// Extra margin of the raft pad around the first layer (mm).
    pub raft_outset: CoordF,

    /// Extrusion width (mm).
    pub extrusion_width: CoordF,
}

impl Default for AdhesionConfig {
    fn default() -> Self {
        Self {
            adhesion_type: AdhesionType::None,
            skirt_outset: 3.0,
            brim_width: 3.0,
            raft_layers: 2,
            raft_outset: 3.0,
            extrusion_width: 0.5,
        }
    }
}

/// Adhesion geometry for the print.
#[derive(Clone, Debug, Default)]
pub struct AdhesionResult {
    /// Skirt rings, closed, printed on the first layer on the bed.
    pub skirt: Vec<Polyline>,
    /// Brim rings, closed, printed on the first model layer.
    pub brim: Vec<Polyline>,
    /// The raft pad outline.
    pub raft_outline: ExPolygons,
    /// Fill paths for each raft layer, bottom first.
    pub raft_fill: Vec<Vec<Polyline>>,
}

/// Build the adhesion structures from the first model layer and the first
/// support outline.
pub fn build_adhesion(
    layer0: &[ExPolygon],
    support0: &[ExPolygon],
    config: &AdhesionConfig,
) -> AdhesionResult {
    let w = config.extrusion_width;
    let base = union(layer0, support0);
    let mut result = AdhesionResult::default();

    // Skirt: one loop around everything, clear of the brim band.
    let skirt_mask = offset(&base, config.skirt_outset);
    let skirt_offset = config.brim_width + config.skirt_outset + w / 2.0;
    for region in offset(&skirt_mask, skirt_offset) {
        result.skirt.extend(region.to_closed_polylines());
    }

    match config.adhesion_type {
        AdhesionType::None => {}
        AdhesionType::Brim => {
            let rings = (config.brim_width / w).ceil() as usize;
            for i in 0..rings {
                for region in offset(layer0, (i as CoordF + 0.5) * w) {
                    result.brim.extend(region.to_closed_polylines());
                }
            }
        }
        AdhesionType::Raft => {
            // Keeps the historical outset arithmetic (raft_outset counted
            // twice) so raft pads match earlier output.
            let outset_val = config.raft_outset
                + (config.skirt_outset + w).max(config.raft_outset + w);
            result.raft_outline = offset(&base, outset_val);

            for i in 0..config.raft_layers {
                let (angle, density) = if i == 0 {
                    (0.0, 0.75)
                } else if i % 2 == 1 {
                    (90.0, 1.0)
                } else {
                    (0.0, 1.0)
                };
                result
                    .raft_fill
                    .push(fill_region(&result.raft_outline, angle, density, w));
            }
        }
    }
    result
}
