//! Deduplicated vertex/edge/facet mesh store.
//!
//! The mesh is three arenas indexed by integer handles; every cross-reference
//! is a handle, never a pointer. Interning tables map canonicalized keys to
//! handles:
//! - vertices are keyed by their coordinates quantized to 1e-4 mm (Z is
//!   snapped to the Z quantum on insert),
//! - edges by their endpoint ids in sorted order, so (a,b) and (b,a) intern
//!   to the same edge,
//! - facets by their vertex triple rotated so the smallest id comes first.
//!
//! Edges and facets carry reference counts. In a manifold mesh every edge is
//! shared by exactly two facets and every facet appears exactly once;
//! [`Mesh::check_manifold`] reports the violations.

use crate::geometry::{BoundingBox3, Point3, QuantKey};
use crate::CoordF;
use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;

/// Handle of an interned vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

/// Handle of an interned edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u32);

/// Handle of an interned facet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FacetId(pub u32);

/// An interned edge: endpoint ids in sorted order plus a reference count.
#[derive(Clone, Debug)]
pub struct Edge {
    pub a: VertexId,
    pub b: VertexId,
    /// Number of facets bordering this edge. 2 in a manifold mesh.
    pub count: u32,
}

/// An interned facet: vertex triple (smallest id first), unit normal,
/// reference count.
#[derive(Clone, Debug)]
pub struct Facet {
    pub vertices: [VertexId; 3],
    pub normal: Point3,
    /// Number of times this facet was inserted. 1 in a manifold mesh.
    pub count: u32,
}

/// Collinearity threshold for zero-area facet rejection, in radians.
const COLLINEAR_EPS: CoordF = 1e-8;

/// The deduplicated mesh store.
pub struct Mesh {
    vertices: Vec<Point3>,
    edges: Vec<Edge>,
    facets: Vec<Facet>,

    vertex_index: HashMap<QuantKey, VertexId>,
    edge_index: HashMap<(VertexId, VertexId), EdgeId>,
    facet_index: HashMap<[VertexId; 3], FacetId>,

    vertex_edges: Vec<Vec<EdgeId>>,
    vertex_facets: Vec<Vec<FacetId>>,
    edge_facets: HashMap<(VertexId, VertexId), Vec<FacetId>>,

    bounds: BoundingBox3,
    z_quantum: CoordF,
}

impl Mesh {
    /// Create an empty mesh with the given Z quantum (mm).
    pub fn new(z_quantum: CoordF) -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            facets: Vec::new(),
            vertex_index: HashMap::new(),
            edge_index: HashMap::new(),
            facet_index: HashMap::new(),
            vertex_edges: Vec::new(),
            vertex_facets: Vec::new(),
            edge_facets: HashMap::new(),
            bounds: BoundingBox3::empty(),
            z_quantum,
        }
    }

    #[inline]
    pub fn z_quantum(&self) -> CoordF {
        self.z_quantum
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Axis-aligned bounds of all interned vertices.
    #[inline]
    pub fn bounds(&self) -> &BoundingBox3 {
        &self.bounds
    }

    #[inline]
    pub fn vertex(&self, id: VertexId) -> Point3 {
        self.vertices[id.0 as usize]
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0 as usize]
    }

    #[inline]
    pub fn facet(&self, id: FacetId) -> &Facet {
        &self.facets[id.0 as usize]
    }

    pub fn facet_ids(&self) -> impl Iterator<Item = FacetId> {
        (0..self.facets.len() as u32).map(FacetId)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len() as u32).map(EdgeId)
    }

    /// The three vertex positions of a facet.
    pub fn facet_points(&self, id: FacetId) -> [Point3; 3] {
        let f = &self.facets[id.0 as usize];
        [
            self.vertex(f.vertices[0]),
            self.vertex(f.vertices[1]),
            self.vertex(f.vertices[2]),
        ]
    }

    /// The Z extent of a facet.
    pub fn facet_z_range(&self, id: FacetId) -> (CoordF, CoordF) {
        let [a, b, c] = self.facet_points(id);
        (a.z.min(b.z).min(c.z), a.z.max(b.z).max(c.z))
    }

    /// Edges incident to a vertex.
    pub fn edges_at(&self, v: VertexId) -> &[EdgeId] {
        &self.vertex_edges[v.0 as usize]
    }

    /// Facets incident to a vertex.
    pub fn facets_at(&self, v: VertexId) -> &[FacetId] {
        &self.vertex_facets[v.0 as usize]
    }

    /// Facets bordering an (unordered) edge.
    pub fn facets_at_edge(&self, a: VertexId, b: VertexId) -> &[FacetId] {
        static EMPTY: [FacetId; 0] = [];
        let key = if a <= b { (a, b) } else { (b, a) };
        self.edge_facets.get(&key).map(|v| v.as_slice()).unwrap_or(&EMPTY)
    }

    /// Intern a vertex. Z is snapped to the quantum; the same quantized
    /// coordinates always yield the same handle.
    pub fn add_vertex(&mut self, p: Point3) -> VertexId {
        let p = p.with_quantized_z(self.z_quantum);
        let key = p.quant_key();
        if let Some(&id) = self.vertex_index.get(&key) {
            return id;
        }
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(p);
        self.vertex_edges.push(Vec::new());
        self.vertex_facets.push(Vec::new());
        self.vertex_index.insert(key, id);
        self.bounds.extend(&p);
        id
    }

    /// Intern an edge, incrementing its reference count.
    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> EdgeId {
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(&id) = self.edge_index.get(&key) {
            self.edges[id.0 as usize].count += 1;
            return id;
        }
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            a: key.0,
            b: key.1,
            count: 1,
        });
        self.edge_index.insert(key, id);
        self.vertex_edges[key.0 .0 as usize].push(id);
        self.vertex_edges[key.1 .0 as usize].push(id);
        id
    }

    /// Add a triangle with its normal. Vertices are quantized and interned;
    /// the facet is canonicalized and its winding reconciled with the normal.
    ///
    /// Returns `None` for zero-area input: two vertices coincide after
    /// quantization, or the edges at the second vertex are collinear within
    /// 1e-8 rad.
    pub fn add_triangle(&mut self, normal: Point3, pts: [Point3; 3]) -> Option<FacetId> {
        let v0 = self.add_vertex(pts[0]);
        let v1 = self.add_vertex(pts[1]);
        let v2 = self.add_vertex(pts[2]);
        if v0 == v1 || v1 == v2 || v0 == v2 {
            return None;
        }

        let p0 = self.vertex(v0);
        let p1 = self.vertex(v1);
        let p2 = self.vertex(v2);
        let u = p0 - p1;
        let w = p2 - p1;
        let cross = u.cross(&w);
        if cross.norm() <= COLLINEAR_EPS * u.norm() * w.norm() {
            return None;
        }

        // Winding normal by the right-hand rule over (v0, v1, v2).
        let winding = (p1 - p0).cross(&(p2 - p0));
        let mut verts = [v0, v1, v2];
        let mut normal = normal.normalized();
        if normal.norm() < 0.5 {
            // Degenerate input normal: recompute from the winding.
            normal = winding.normalized();
        } else if normal.dot(&winding) < 0.0 {
            // Stored winding must match the normal.
            verts.swap(1, 2);
        }
        rotate_smallest_first(&mut verts);

        if let Some(&id) = self.facet_index.get(&verts) {
            self.facets[id.0 as usize].count += 1;
            return Some(id);
        }

        let id = FacetId(self.facets.len() as u32);
        self.facets.push(Facet {
            vertices: verts,
            normal,
            count: 1,
        });
        self.facet_index.insert(verts, id);

        for i in 0..3 {
            let a = verts[i];
            let b = verts[(i + 1) % 3];
            self.add_edge(a, b);
            let key = if a <= b { (a, b) } else { (b, a) };
            self.edge_facets.entry(key).or_default().push(id);
        }
        for v in verts {
            self.vertex_facets[v.0 as usize].push(id);
        }
        Some(id)
    }

    /// Translate every vertex and rebuild the interning index and bounds.
    pub fn translate(&mut self, dx: CoordF, dy: CoordF, dz: CoordF) {
        for p in &mut self.vertices {
            p.x += dx;
            p.y += dy;
            p.z = Point3::quantize_z(p.z + dz, self.z_quantum);
        }
        self.vertex_index.clear();
        self.bounds = BoundingBox3::empty();
        for (i, p) in self.vertices.iter().enumerate() {
            self.vertex_index.insert(p.quant_key(), VertexId(i as u32));
            self.bounds.extend(p);
        }
    }

    /// Check the mesh for manifold violations.
    pub fn check_manifold(&self) -> ManifoldReport {
        let mut report = ManifoldReport::default();
        for id in self.facet_ids() {
            let f = self.facet(id);
            if f.count != 1 {
                debug!(
                    "duplicate facet {:?}: inserted {} times",
                    f.vertices, f.count
                );
                report.duplicate_facets.push(id);
            }
        }
        for id in self.edge_ids() {
            let e = self.edge(id);
            if e.count == 1 {
                debug!("hole edge {:?}-{:?}", e.a, e.b);
                report.hole_edges.push(id);
            } else if e.count > 2 {
                debug!("excess edge {:?}-{:?}: {} facets", e.a, e.b, e.count);
                report.excess_edges.push(id);
            }
        }
        if !report.is_manifold() {
            warn!("mesh is not manifold: {}", report);
        }
        report
    }
}

fn rotate_smallest_first(verts: &mut [VertexId; 3]) {
    let smallest = (0..3).min_by_key(|&i| verts[i]).unwrap_or(0);
    verts.rotate_left(smallest);
}

/// Result of [`Mesh::check_manifold`].
#[derive(Clone, Debug, Default)]
pub struct ManifoldReport {
    /// Facets inserted more than once.
    pub duplicate_facets: Vec<FacetId>,
    /// Edges bordered by a single facet.
    pub hole_edges: Vec<EdgeId>,
    /// Edges bordered by more than two facets.
    pub excess_edges: Vec<EdgeId>,
}

impl ManifoldReport {
    pub fn is_manifold(&self) -> bool {
        self.duplicate_facets.is_empty()
            && self.hole_edges.is_empty()
            && self.excess_edges.is_empty()
    }
}

impl fmt::Display for ManifoldReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} duplicate facets, {} hole edges, {} excess edges",
            self.duplicate_facets.len(),
            self.hole_edges.len(),
            self.excess_edges.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> Mesh {
        let mut mesh = Mesh::new(0.001);
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(10.0, 0.0, 0.0);
        let c = Point3::new(5.0, 10.0, 0.0);
        let d = Point3::new(5.0, 5.0, 10.0);
        let zero = Point3::default();
        let _ = mesh.add_triangle(zero, [a, c, b]);
        let _ = mesh.add_triangle(zero, [a, b, d]);
        let _ = mesh.add_triangle(zero, [b, c, d]);
        let _ = mesh.add_triangle(zero, [c, a, d]);
        mesh
    }

    #[test]
    fn test_vertex_interning_is_identity() {
        let mut mesh = Mesh::new(0.001);
        let v1 = mesh.add_vertex(Point3::new(1.0, 2.0, 3.0));
        let v2 = mesh.add_vertex(Point3::new(1.0, 2.0, 3.0));
        assert_eq!(v1, v2);
        // Nearby within the 1e-4 quantum also merges.
        let v3 = mesh.add_vertex(Point3::new(1.00001, 2.0, 3.0));
        assert_eq!(v1, v3);
        assert_eq!(mesh.vertex_count(), 1);
    }

    #[test]
    fn test_edge_canonical_order() {
        let mut mesh = Mesh::new(0.001);
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let e1 = mesh.add_edge(a, b);
        let e2 = mesh.add_edge(b, a);
        assert_eq!(e1, e2);
        assert_eq!(mesh.edge(e1).count, 2);
    }

    #[test]
    fn test_tetrahedron_is_manifold() {
        let mesh = tetrahedron();
        assert_eq!(mesh.facet_count(), 4);
        assert_eq!(mesh.edge_count(), 6);
        let report = mesh.check_manifold();
        assert!(report.is_manifold());
        // Invariant: every edge borders exactly two facets.
        for id in mesh.edge_ids() {
            let e = mesh.edge(id);
            assert_eq!(e.count, 2);
            assert_eq!(mesh.facets_at_edge(e.a, e.b).len(), 2);
        }
    }

    #[test]
    fn test_duplicate_facet_detected() {
        let mut mesh = tetrahedron();
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(10.0, 0.0, 0.0);
        let c = Point3::new(5.0, 10.0, 0.0);
        let _ = mesh.add_triangle(Point3::default(), [a, c, b]);
        let report = mesh.check_manifold();
        assert_eq!(report.duplicate_facets.len(), 1);
        assert!(!report.is_manifold());
    }

    #[test]
    fn test_hole_edge_detected() {
        let mut mesh = Mesh::new(0.001);
        // A single dangling triangle: all three edges are hole edges.
        let _ = mesh.add_triangle(
            Point3::default(),
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(5.0, 10.0, 0.0),
            ],
        );
        let report = mesh.check_manifold();
        assert_eq!(report.hole_edges.len(), 3);
    }

    #[test]
    fn test_zero_area_facets_rejected() {
        let mut mesh = Mesh::new(0.001);
        // Coincident vertices.
        let r = mesh.add_triangle(
            Point3::default(),
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(5.0, 10.0, 0.0),
            ],
        );
        assert!(r.is_none());
        // Collinear edges.
        let r = mesh.add_triangle(
            Point3::default(),
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(5.0, 0.0, 0.0),
                Point3::new(10.0, 0.0, 0.0),
            ],
        );
        assert!(r.is_none());
        assert_eq!(mesh.facet_count(), 0);
    }

    #[test]
    fn test_normal_winding_reconciled() {
        let mut mesh = Mesh::new(0.001);
        // Winding gives +Z, but the stated normal is -Z: vertices 2 and 3
        // must be swapped so the stored winding matches the normal.
        let id = mesh
            .add_triangle(
                Point3::new(0.0, 0.0, -1.0),
                [
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(10.0, 0.0, 0.0),
                    Point3::new(5.0, 10.0, 0.0),
                ],
            )
            .unwrap();
        let [a, b, c] = mesh.facet_points(id);
        let winding = (b - a).cross(&(c - a));
        assert!(winding.z < 0.0);
        assert!((mesh.facet(id).normal.z + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_normal_recomputed() {
        let mut mesh = Mesh::new(0.001);
        let id = mesh
            .add_triangle(
                Point3::default(),
                [
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(10.0, 0.0, 0.0),
                    Point3::new(5.0, 10.0, 0.0),
                ],
            )
            .unwrap();
        assert!((mesh.facet(id).normal.z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_translate_rehashes() {
        let mut mesh = tetrahedron();
        mesh.translate(5.0, -3.0, 1.0);
        let bounds = mesh.bounds();
        assert!((bounds.min.x - 5.0).abs() < 1e-9);
        assert!((bounds.min.z - 1.0).abs() < 1e-9);
        // Interning still resolves the moved coordinates.
        let before = mesh.vertex_count();
        let _ = mesh.add_vertex(Point3::new(5.0, -3.0, 1.0));
        assert_eq!(mesh.vertex_count(), before);
    }
}
