//! Layer assembly: stitching slice segments into closed, oriented loops.
//!
//! Facets are assigned to the layers their Z range covers; each layer's
//! segments are stitched into closed polygons by hashing endpoints on a
//! 1e-3 mm grid. Open chains that cannot be closed are counted as dead paths
//! and dropped with a warning — a symptom of non-manifold input.

use super::facet::{slice_facet, snap_plane, SliceSegment};
use crate::clipper::orient_paths;
use crate::geometry::{ExPolygons, Point, PointF, Polygon};
use crate::mesh::{FacetId, Mesh};
use crate::CoordF;
use log::warn;
use std::collections::{BTreeMap, VecDeque};

/// Endpoint hash key: coordinates rounded to 1e-3 mm.
type EndKey = (i64, i64);

#[inline]
fn end_key(p: &PointF) -> EndKey {
    ((p.x * 1000.0).round() as i64, (p.y * 1000.0).round() as i64)
}

/// Assign facets to the layers whose planes they span.
///
/// A facet covers layers `floor(minz/h + 0.01) ..= ceil(maxz/h - 0.01) - 1`
/// counted from the model bottom (which the pipeline translates to z=0).
pub fn assign_facets_to_layers(mesh: &Mesh, layer_height: CoordF, layer_count: usize) -> Vec<Vec<FacetId>> {
    let mut assignment = vec![Vec::new(); layer_count];
    for id in mesh.facet_ids() {
        let (min_z, max_z) = mesh.facet_z_range(id);
        let start = (min_z / layer_height + 0.01).floor() as i64;
        let end = (max_z / layer_height - 0.01).ceil() as i64;
        for layer in start.max(0)..end.min(layer_count as i64) {
            assignment[layer as usize].push(id);
        }
    }
    assignment
}

/// The slicing plane height of a layer (before quantum snapping).
#[inline]
pub fn layer_plane_z(layer: usize, layer_height: CoordF) -> CoordF {
    (layer as CoordF + 0.5) * layer_height
}

/// Slice all facets assigned to a layer and stitch the segments into
/// oriented regions.
pub fn assemble_layer(
    mesh: &Mesh,
    facets: &[FacetId],
    layer: usize,
    layer_height: CoordF,
) -> ExPolygons {
    let z = snap_plane(layer_plane_z(layer, layer_height), mesh.z_quantum());
    let segments: Vec<SliceSegment> = facets
        .iter()
        .filter_map(|&id| slice_facet(mesh, id, z))
        .collect();

    let (rings, dead) = stitch_segments(&segments);
    if dead > 0 {
        warn!("layer {}: {} incomplete polygons discarded", layer, dead);
    }
    orient_paths(rings)
}

/// Stitch oriented segments into closed rings by endpoint hashing.
///
/// Returns the closed rings plus the number of dead (unclosable) chains.
/// The key map is ordered, so identical segment sets stitch identically
/// regardless of process or layer.
pub fn stitch_segments(segments: &[SliceSegment]) -> (Vec<Polygon>, usize) {
    let mut queues: BTreeMap<EndKey, VecDeque<Vec<PointF>>> = BTreeMap::new();
    for seg in segments {
        queues
            .entry(end_key(&seg.a))
            .or_default()
            .push_back(vec![seg.a, seg.b]);
    }

    let mut rings = Vec::new();
    let mut dead = 0usize;

    loop {
        // Pop one open chain at an arbitrary key.
        let Some(&key) = queues.keys().next() else {
            break;
        };
        let mut chain = {
            let queue = queues.get_mut(&key).expect("key just observed");
            let chain = queue.pop_front().expect("non-empty queue");
            if queue.is_empty() {
                queues.remove(&key);
            }
            chain
        };

        loop {
            let head = end_key(&chain[0]);
            let tail = end_key(chain.last().expect("chain has points"));

            if head == tail && chain.len() > 2 {
                if let Some(ring) = chain_to_ring(&chain) {
                    rings.push(ring);
                }
                break;
            }

            // Extend forward: another chain starts where this one ends.
            if let Some(queue) = queues.get_mut(&tail) {
                let next = queue.pop_front().expect("non-empty queue");
                if queue.is_empty() {
                    queues.remove(&tail);
                }
                chain.extend(next.into_iter().skip(1));
                continue;
            }

            // Extend backward: another chain starts where this one starts;
            // reverse it and prepend.
            if let Some(queue) = queues.get_mut(&head) {
                let mut prev = queue.pop_front().expect("non-empty queue");
                if queue.is_empty() {
                    queues.remove(&head);
                }
                prev.reverse();
                prev.extend(chain.into_iter().skip(1));
                chain = prev;
                continue;
            }

            dead += 1;
            break;
        }
    }

    (rings, dead)
}

/// Convert a closed chain (first == last on the hash grid) to a polygon,
/// dropping the duplicate closing point and collapsing grid-equal neighbors.
fn chain_to_ring(chain: &[PointF]) -> Option<Polygon> {
    let mut points: Vec<Point> = Vec::with_capacity(chain.len());
    for p in &chain[..chain.len() - 1] {
        let scaled = p.to_scaled();
        if points.last() != Some(&scaled) {
            points.push(scaled);
        }
    }
    if points.len() < 3 {
        return None;
    }
    Some(Polygon::from_points(points))
}
