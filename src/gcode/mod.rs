//! G-code generation.
//!
//! The emitter turns the chained per-layer, per-nozzle path buffer into a
//! Marlin-dialect program: absolute coordinates and absolute extrusion, one
//! `;LAYER:n` marker per layer, `T<n>` tool changes guarded by retraction,
//! Z-lifted travels, and a prime/retract pair bracketing every polyline.
//!
//! Extrusion per move is the deposited bead volume over the filament
//! cross-section. The bead is modeled as an ellipse of width w and height h:
//! `ΔE = d · (π·w/2·h/2) / (π·(fil/2)²)`. Feed rates are emitted in mm/min.
//! Coordinates print with 2 decimals, E values with 3.

pub mod chain;
mod writer;

pub use chain::{chain_polylines, CHAIN_MAX_DIST_MM};
pub use writer::{GCode, GCodeStats};

use crate::geometry::Polyline;
use crate::{unscale, CoordF};
use std::f64::consts::PI;

/// Number of tools addressable by the emitter.
pub const NOZZLE_COUNT: usize = 4;

/// Paths and extrusion width for one nozzle on one layer.
#[derive(Clone, Debug, Default)]
pub struct NozzleBucket {
    pub paths: Vec<Polyline>,
    /// Extrusion width in mm for every path in this bucket.
    pub width: CoordF,
}

/// One print layer: a bucket per nozzle.
pub type LayerBuckets = [NozzleBucket; NOZZLE_COUNT];

/// The final buffer consumed by the emitter: raft layers first, then model
/// layers, each with per-nozzle chained paths.
pub type RawLayerPaths = Vec<LayerBuckets>;

/// Printer state threaded through emission.
#[derive(Clone, Debug)]
pub struct ExtrusionState {
    pub x: CoordF,
    pub y: CoordF,
    pub z: CoordF,
    /// Absolute extruder coordinate.
    pub e: CoordF,
    pub tool: usize,
    /// Cumulative build-time estimate in seconds.
    pub time_s: CoordF,
}

impl Default for ExtrusionState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            e: 0.0,
            tool: 0,
            time_s: 0.0,
        }
    }
}

/// Machine parameters for emission.
#[derive(Clone, Debug)]
pub struct EmitterConfig {
    /// Layer height (mm).
    pub layer_height: CoordF,
    /// Extrusion feed rate (mm/s).
    pub feed_rate: CoordF,
    /// XY travel rate (mm/s).
    pub travel_rate_xy: CoordF,
    /// Z travel rate (mm/s).
    pub travel_rate_z: CoordF,
    /// Retraction before travel (mm of filament).
    pub retract_dist: CoordF,
    /// Retraction speed (mm/s).
    pub retract_speed: CoordF,
    /// Z lift during travel (mm).
    pub retract_lift: CoordF,
    /// Extra retraction around tool changes (mm of filament).
    pub retract_extruder: CoordF,
    /// Per-nozzle filament diameter (mm).
    pub nozzle_filament: [CoordF; NOZZLE_COUNT],
    /// Per-nozzle speed ceiling (mm/s).
    pub nozzle_max_speed: [CoordF; NOZZLE_COUNT],
    /// Per-nozzle hotend temperature (°C).
    pub nozzle_temp: [u32; NOZZLE_COUNT],
    /// Bed temperature (°C); 0 disables the bed heater commands.
    pub bed_temp: u32,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            layer_height: 0.2,
            feed_rate: 60.0,
            travel_rate_xy: 100.0,
            travel_rate_z: 10.0,
            retract_dist: 4.0,
            retract_speed: 30.0,
            retract_lift: 0.0,
            retract_extruder: 10.0,
            nozzle_filament: [1.75; NOZZLE_COUNT],
            nozzle_max_speed: [100.0; NOZZLE_COUNT],
            nozzle_temp: [210, 0, 0, 0],
            bed_temp: 60,
        }
    }
}

impl EmitterConfig {
    /// Extrusion length for depositing a bead of length `dist_mm` and width
    /// `width` with the given nozzle.
    #[inline]
    fn extrusion_delta(&self, nozzle: usize, dist_mm: CoordF, width: CoordF) -> CoordF {
        let bead_area = PI * (width / 2.0) * (self.layer_height / 2.0);
        let filament_area = PI * (self.nozzle_filament[nozzle] / 2.0).powi(2);
        dist_mm * bead_area / filament_area
    }
}

/// Emit the complete program for a chained path buffer.
pub fn emit_gcode(raw: &RawLayerPaths, config: &EmitterConfig) -> GCode {
    let mut gcode = GCode::new();
    let mut state = ExtrusionState::default();

    prelude(&mut gcode, config, raw.len());
    state.z = 15.0; // prelude parks the nozzle at Z15

    for (layer, buckets) in raw.iter().enumerate() {
        gcode.push(format!(";LAYER:{}", layer));
        let z = (layer as CoordF + 1.0) * config.layer_height;

        for (nozzle, bucket) in buckets.iter().enumerate() {
            if bucket.paths.is_empty() {
                continue;
            }
            if state.tool != nozzle {
                tool_change(&mut gcode, config, &mut state, nozzle);
            }
            for path in &bucket.paths {
                emit_path(&mut gcode, config, &mut state, path, z, bucket.width);
            }
        }
    }

    epilogue(&mut gcode, config, &state);

    gcode.stats.layer_count = raw.len();
    gcode.stats.estimated_time_s = state.time_s;
    gcode
}

fn prelude(gcode: &mut GCode, config: &EmitterConfig, layer_count: usize) {
    gcode.push(";FLAVOR:Marlin");
    gcode.push(format!(";Generated by strata {}", crate::VERSION));
    gcode.push("M82");
    gcode.push("G21");
    gcode.push("G90");
    gcode.push("M107");
    if config.bed_temp > 0 {
        gcode.push(format!("M140 S{}", config.bed_temp));
        gcode.push(format!("M190 S{}", config.bed_temp));
    }
    gcode.push(format!("M104 S{}", config.nozzle_temp[0]));
    gcode.push(format!("M109 S{}", config.nozzle_temp[0]));
    gcode.push("G28 X0 Y0");
    gcode.push("G28 Z0");
    gcode.push(format!("G0 Z15.00 F{:.0}", config.travel_rate_z * 60.0));
    gcode.push("G92 E0");
    gcode.push(format!(";LAYER_COUNT:{}", layer_count));
}

fn epilogue(gcode: &mut GCode, config: &EmitterConfig, state: &ExtrusionState) {
    gcode.push("M107");
    gcode.push("M104 S0");
    if config.bed_temp > 0 {
        gcode.push("M140 S0");
    }
    gcode.push("G28 X0 Y0");
    gcode.push("M84");
    gcode.push(format!("; total build time: {:.0}s", state.time_s));
}

/// Retract, switch tools, prime back.
fn tool_change(gcode: &mut GCode, config: &EmitterConfig, state: &mut ExtrusionState, nozzle: usize) {
    let f = config.retract_speed * 60.0;
    state.e -= config.retract_extruder;
    gcode.push(format!("G1 E{:.3} F{:.0}", state.e, f));
    gcode.push(format!("T{}", nozzle));
    state.e += config.retract_extruder;
    gcode.push(format!("G1 E{:.3} F{:.0}", state.e, f));
    state.tool = nozzle;
}

fn emit_path(
    gcode: &mut GCode,
    config: &EmitterConfig,
    state: &mut ExtrusionState,
    path: &Polyline,
    z: CoordF,
    width: CoordF,
) {
    let points = path.points();
    if points.len() < 2 {
        return;
    }
    let nozzle = state.tool;
    let retract_f = config.retract_speed * 60.0;
    let travel_f = config.travel_rate_xy * 60.0;

    // Travel to the start, lifted when configured or when Z changes.
    let lifted_z = z + config.retract_lift;
    if config.retract_lift > 0.0 || (state.z - z).abs() > 1e-9 {
        gcode.push(format!("G1 Z{:.2} F{:.0}", lifted_z, config.travel_rate_z * 60.0));
        state.time_s += (lifted_z - state.z).abs() / config.travel_rate_z;
        state.z = lifted_z;
    }

    let start_x = unscale(points[0].x);
    let start_y = unscale(points[0].y);
    let travel = ((start_x - state.x).powi(2) + (start_y - state.y).powi(2)).sqrt();
    gcode.push(format!("G0 X{:.2} Y{:.2} F{:.0}", start_x, start_y, travel_f));
    state.time_s += travel / config.travel_rate_xy;
    state.x = start_x;
    state.y = start_y;

    if (state.z - z).abs() > 1e-9 {
        gcode.push(format!("G1 Z{:.2} F{:.0}", z, config.travel_rate_z * 60.0));
        state.time_s += (state.z - z).abs() / config.travel_rate_z;
        state.z = z;
    }

    // Prime.
    state.e += config.retract_dist;
    gcode.push(format!("G1 E{:.3} F{:.0}", state.e, retract_f));

    // Extrude.
    let speed = config.feed_rate.min(config.nozzle_max_speed[nozzle]);
    let f = speed * 60.0;
    for pair in points.windows(2) {
        let x = unscale(pair[1].x);
        let y = unscale(pair[1].y);
        let d = pair[0].distance(&pair[1]) / crate::SCALING_FACTOR;
        let delta = config.extrusion_delta(nozzle, d, width);
        state.e += delta;
        gcode.stats.filament_used_mm += delta;
        gcode.push(format!("G1 X{:.2} Y{:.2} E{:.3} F{:.0}", x, y, state.e, f));
        state.time_s += d / speed;
        state.x = x;
        state.y = y;
    }

    // Retract.
    state.e -= config.retract_dist;
    gcode.push(format!("G1 E{:.3} F{:.0}", state.e, retract_f));
}
