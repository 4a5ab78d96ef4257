//! Slicing: converting the mesh into per-layer 2D regions.
//!
//! - [`facet`] - facet-plane intersection producing oriented segments
//! - [`assembler`] - layer assignment and segment stitching
//! - [`surface`] - top/bottom solid-mask detection

pub mod assembler;
pub mod facet;
pub mod surface;

pub use assembler::{assemble_layer, assign_facets_to_layers, layer_plane_z, stitch_segments};
pub use facet::{slice_facet, snap_plane, SliceSegment};
pub use surface::{build_solid_masks, solid_mask_for_layer, SolidMasks};
