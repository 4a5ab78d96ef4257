//! Mesh loading and storage.
//!
//! - [`Mesh`] - deduplicated vertex/edge/facet store with manifold checking
//! - [`load_stl`] / [`write_stl_ascii`] - STL input/output

mod stl;
mod store;

pub use stl::{load_stl, read_stl_bytes, write_stl_ascii};
pub use store::{Edge, EdgeId, Facet, FacetId, ManifoldReport, Mesh, VertexId};
