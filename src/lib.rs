//! # Strata
//!
//! An STL → G-code slicer for cartesian and cylindrical-bed FDM printers.
//!
//! The library implements the complete slicing pipeline:
//! - STL mesh loading into a deduplicated vertex/edge/facet store
//! - Manifold validation
//! - Planar cross-sectioning and layer assembly
//! - Perimeter shell generation
//! - Top/bottom solid-mask detection
//! - Support, skirt, brim and raft generation
//! - Infill pattern generation (lines, triangles, grid, hexagons)
//! - Path chaining and Marlin G-code emission
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata::config::SlicerConfig;
//! use strata::mesh::load_stl;
//! use strata::pipeline::SlicePipeline;
//!
//! let mut mesh = load_stl("model.stl", 0.001)?;
//! let pipeline = SlicePipeline::new(SlicerConfig::default());
//! let gcode = pipeline.process(&mut mesh)?;
//! gcode.write_to_file("model.gcode")?;
//! ```

pub mod adhesion;
pub mod clipper;
pub mod config;
pub mod gcode;
pub mod geometry;
pub mod infill;
pub mod mesh;
pub mod perimeter;
pub mod pipeline;
pub mod progress;
pub mod slice;
pub mod support;

// Re-export commonly used types
pub use adhesion::{AdhesionResult, AdhesionType};
pub use config::{SlicerConfig, Value};
pub use gcode::{emit_gcode, EmitterConfig, ExtrusionState, GCode};
pub use geometry::{
    BoundingBox, BoundingBox3, ExPolygon, ExPolygons, Point, Point3, PointF, Polygon, Polyline,
};
pub use mesh::{load_stl, ManifoldReport, Mesh};
pub use pipeline::{RawLayerPaths, SlicePipeline, SliceSummary};
pub use progress::{NullThermometer, Thermometer};
pub use support::{SupportResult, SupportType};

/// Coordinate type used for 2D layer geometry.
/// Integer coordinates scaled by [`SCALING_FACTOR`] avoid floating-point drift
/// in the boolean and offset operations.
pub type Coord = i64;

/// Floating-point coordinate type for unscaled (mm) values.
pub type CoordF = f64;

/// Scaling factor: 2D coordinates are stored as integers scaled by this factor.
/// 1 unit = 1 nanometer, so 1 mm = 1_000_000 units.
pub const SCALING_FACTOR: f64 = 1_000_000.0;

/// Scale a floating-point millimeter coordinate to internal units.
#[inline]
pub fn scale(v: CoordF) -> Coord {
    (v * SCALING_FACTOR).round() as Coord
}

/// Unscale an internal coordinate back to millimeters.
#[inline]
pub fn unscale(v: Coord) -> CoordF {
    v as CoordF / SCALING_FACTOR
}

/// Result type used throughout the slicer.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for slicer operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("STL error: {0}")]
    Stl(String),

    #[error("Slicing error: {0}")]
    Slicing(String),

    #[error("G-code error: {0}")]
    GCode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid geometry: {0}")]
    Geometry(String),
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
