//! Top/bottom solid-region detection.
//!
//! A region of layer i must print solid when no layer above (top) or below
//! (bottom) covers it. The masks come from cross-layer boolean differences
//! of the outermost perimeter shells; boundary layers are compared against
//! empty neighbors, so the first layer is all bottom and the last all top.

use crate::clipper::{difference, intersection, union};
use crate::geometry::{ExPolygon, ExPolygons};

/// Per-layer top and bottom solid masks.
#[derive(Clone, Debug, Default)]
pub struct SolidMasks {
    /// `top[i] = perim0[i] − perim0[i+1]`
    pub top: Vec<ExPolygons>,
    /// `bottom[i] = perim0[i] − perim0[i−1]`
    pub bottom: Vec<ExPolygons>,
}

/// Build the solid masks from the outermost perimeter shell of every layer.
pub fn build_solid_masks(perim0: &[ExPolygons]) -> SolidMasks {
    let n = perim0.len();
    let empty: ExPolygons = Vec::new();
    let mut masks = SolidMasks {
        top: Vec::with_capacity(n),
        bottom: Vec::with_capacity(n),
    };
    for i in 0..n {
        let above = perim0.get(i + 1).unwrap_or(&empty);
        let below = if i > 0 { &perim0[i - 1] } else { &empty };
        masks.top.push(difference(&perim0[i], above));
        masks.bottom.push(difference(&perim0[i], below));
    }
    masks
}

/// The solid region of layer `l`: the union of top masks over
/// `[l, l+top_layers-1]` and bottom masks over `[l-bottom_layers+1, l]`,
/// clipped to the given innermost perimeter.
pub fn solid_mask_for_layer(
    masks: &SolidMasks,
    l: usize,
    top_layers: usize,
    bottom_layers: usize,
    innermost: &[ExPolygon],
) -> ExPolygons {
    let n = masks.top.len();
    let mut solid: ExPolygons = Vec::new();

    if top_layers > 0 {
        let hi = (l + top_layers - 1).min(n.saturating_sub(1));
        for i in l..=hi {
            solid = union(&solid, &masks.top[i]);
        }
    }
    if bottom_layers > 0 {
        let lo = (l + 1).saturating_sub(bottom_layers);
        for i in lo..=l {
            solid = union(&solid, &masks.bottom[i]);
        }
    }

    intersection(&solid, innermost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ExPolygon, Point, Polygon};
    use crate::scale;

    fn square(size: f64) -> ExPolygons {
        vec![ExPolygon::new(Polygon::rectangle(
            Point::new(0, 0),
            Point::new(scale(size), scale(size)),
        ))]
    }

    #[test]
    fn test_uniform_stack_masks() {
        // Three identical layers: only the boundaries are solid.
        let perim0 = vec![square(10.0), square(10.0), square(10.0)];
        let masks = build_solid_masks(&perim0);

        // Bottom layer: nothing below, whole layer is bottom mask.
        let area: f64 = masks.bottom[0].iter().map(|e| e.area_mm2()).sum();
        assert!((area - 100.0).abs() < 1.0);
        // Middle layer covered both ways.
        assert!(masks.top[1].is_empty() || masks.top[1].iter().all(|e| e.area_mm2() < 1.0));
        assert!(masks.bottom[1].is_empty() || masks.bottom[1].iter().all(|e| e.area_mm2() < 1.0));
        // Top layer: nothing above.
        let area: f64 = masks.top[2].iter().map(|e| e.area_mm2()).sum();
        assert!((area - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_shrinking_stack_exposes_top() {
        // Layer 1 is smaller than layer 0: the overhang ring of layer 0 is
        // a top surface.
        let perim0 = vec![square(10.0), square(6.0)];
        let masks = build_solid_masks(&perim0);
        let area: f64 = masks.top[0].iter().map(|e| e.area_mm2()).sum();
        assert!((area - 64.0).abs() < 2.0);
    }

    #[test]
    fn test_solid_mask_propagates() {
        let perim0 = vec![square(10.0); 5];
        let masks = build_solid_masks(&perim0);
        let innermost = square(10.0);
        // With 2 top layers, layer 3 sees layer 4's top mask.
        let solid = solid_mask_for_layer(&masks, 3, 2, 2, &innermost);
        let area: f64 = solid.iter().map(|e| e.area_mm2()).sum();
        assert!((area - 100.0).abs() < 2.0);
        // An interior layer out of range of both boundaries stays sparse.
        let solid = solid_mask_for_layer(&masks, 2, 2, 2, &innermost);
        let area: f64 = solid.iter().map(|e| e.area_mm2()).sum();
        assert!(area < 1.0);
    }
}
