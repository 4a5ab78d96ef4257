//! Pipeline orchestration: mesh → layers → shells → masks → support →
//! adhesion → infill → chained paths → G-code.
//!
//! The stages run strictly in order; within the per-layer stages each layer
//! is independent, and the infill and chaining loops fan out across layers.
//! Progress is reported per stage through a `(stage, fraction)` callback or
//! a [`Thermometer`].

use crate::adhesion::{build_adhesion, AdhesionConfig, AdhesionType};
use crate::config::SlicerConfig;
use crate::gcode::{
    chain_polylines, emit_gcode, EmitterConfig, GCode, NozzleBucket, CHAIN_MAX_DIST_MM,
    NOZZLE_COUNT,
};
use crate::geometry::{ExPolygons, Polyline};
use crate::infill::{solid_infill, sparse_infill, InfillPattern};
use crate::mesh::Mesh;
use crate::perimeter::{generate_perimeters, innermost_shell, PerimeterConfig};
use crate::progress::Thermometer;
use crate::slice::{assemble_layer, assign_facets_to_layers, build_solid_masks, solid_mask_for_layer};
use crate::support::{build_support, SupportConfig, SupportResult, SupportType};
use crate::{CoordF, Result};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

pub use crate::gcode::RawLayerPaths;

/// Key figures of a finished slice.
#[derive(Clone, Debug, Default)]
pub struct SliceSummary {
    pub layer_count: usize,
    pub filament_used_mm: CoordF,
    pub estimated_time_s: CoordF,
}

impl SliceSummary {
    pub fn of(gcode: &GCode) -> Self {
        Self {
            layer_count: gcode.stats.layer_count,
            filament_used_mm: gcode.stats.filament_used_mm,
            estimated_time_s: gcode.stats.estimated_time_s,
        }
    }
}

/// The slicing pipeline, configured once and run per mesh.
pub struct SlicePipeline {
    config: SlicerConfig,
}

impl SlicePipeline {
    pub fn new(config: SlicerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SlicerConfig {
        &self.config
    }

    /// Run the full pipeline.
    pub fn process(&self, mesh: &mut Mesh) -> Result<GCode> {
        self.process_with_callback(mesh, |_, _| {})
    }

    /// Run the full pipeline, updating a thermometer scaled to 100 units.
    pub fn process_with_thermometer(
        &self,
        mesh: &mut Mesh,
        thermometer: &mut dyn Thermometer,
    ) -> Result<GCode> {
        thermometer.set_target(100);
        let result = self.process_with_callback(mesh, |stage, fraction| {
            let (base, range) = match stage {
                "slicing" => (0, 25),
                "perimeters" => (25, 15),
                "masks" => (40, 5),
                "support" => (45, 15),
                "adhesion" => (60, 5),
                "infill" => (65, 20),
                "chaining" => (85, 5),
                "gcode" => (90, 10),
                _ => (0, 0),
            };
            thermometer.update(base + (fraction * range as f64) as u64);
        });
        thermometer.clear();
        result
    }

    /// Run the full pipeline with a `(stage, fraction)` progress callback.
    pub fn process_with_callback<F>(&self, mesh: &mut Mesh, mut callback: F) -> Result<GCode>
    where
        F: FnMut(&str, f64),
    {
        let cfg = &self.config;
        let h = cfg.get_float("layer_height");

        self.position_on_bed(mesh);

        let layer_count = if mesh.is_empty() {
            0
        } else {
            ((mesh.bounds().max.z / h) - 1e-4).ceil().max(0.0) as usize
        };
        info!("slicing {} layers at {} mm", layer_count, h);

        // Stage D+E: cross-section every layer.
        callback("slicing", 0.0);
        let assignment = assign_facets_to_layers(mesh, h, layer_count);
        let mut layer_paths: Vec<ExPolygons> = Vec::with_capacity(layer_count);
        for layer in 0..layer_count {
            layer_paths.push(assemble_layer(mesh, &assignment[layer], layer, h));
            if layer % 16 == 0 {
                callback("slicing", layer as f64 / layer_count.max(1) as f64);
            }
        }
        callback("slicing", 1.0);

        // Stage F: perimeter shells.
        callback("perimeters", 0.0);
        let width = self.extrusion_width(0);
        let perimeter_config = PerimeterConfig {
            shells: cfg.get_int("shells") as usize,
            extrusion_width: width,
            random_starts: cfg.get_bool("shell_random_starts"),
        };
        let mut rng = StdRng::from_entropy();
        let perimeters: Vec<_> = layer_paths
            .iter()
            .map(|slice| generate_perimeters(slice, &perimeter_config, &mut rng))
            .collect();
        callback("perimeters", 1.0);

        // Stage G: top/bottom masks from the outermost shells.
        callback("masks", 0.0);
        let perim0: Vec<ExPolygons> = perimeters
            .iter()
            .map(|shells| shells.first().cloned().unwrap_or_default())
            .collect();
        let masks = build_solid_masks(&perim0);
        callback("masks", 1.0);

        // Stage H: support.
        callback("support", 0.0);
        let support_nozzle = cfg.get_int("support_nozzle") as usize % NOZZLE_COUNT;
        let support_config = SupportConfig {
            support_type: SupportType::from_name(cfg.get_str("support_type"))
                .unwrap_or(SupportType::None),
            overhang_angle: cfg.get_float("overhang_angle"),
            outset: cfg.get_float("support_outset"),
            density: cfg.get_float("support_density"),
            extrusion_width: self.extrusion_width(support_nozzle),
            infill_overlap: cfg.get_float("infill_overlap"),
        };
        let support = build_support(mesh, &layer_paths, h, &support_config);
        callback("support", 1.0);

        // Stage I: adhesion.
        callback("adhesion", 0.0);
        let adhesion_config = AdhesionConfig {
            adhesion_type: AdhesionType::from_name(cfg.get_str("adhesion_type"))
                .unwrap_or(AdhesionType::None),
            skirt_outset: cfg.get_float("skirt_outset"),
            brim_width: cfg.get_float("brim_width"),
            raft_layers: cfg.get_int("raft_layers") as usize,
            raft_outset: cfg.get_float("raft_outset"),
            extrusion_width: width,
        };
        let empty: ExPolygons = Vec::new();
        let adhesion = build_adhesion(
            layer_paths.first().unwrap_or(&empty),
            support.outline.first().unwrap_or(&empty),
            &adhesion_config,
        );
        callback("adhesion", 1.0);

        // Stage J: infill.
        callback("infill", 0.0);
        let pattern = InfillPattern::from_name(cfg.get_str("infill_type"))
            .unwrap_or(InfillPattern::Grid);
        let density = cfg.get_float("infill_density");
        let overlap = cfg.get_float("infill_overlap");
        let top_layers = cfg.get_int("top_layers") as usize;
        let bottom_layers = cfg.get_int("bottom_layers") as usize;
        let fills: Vec<(Vec<Polyline>, Vec<Polyline>)> = (0..layer_count)
            .into_par_iter()
            .map(|layer| {
                let innermost = innermost_shell(&perimeters[layer]);
                let solid_mask =
                    solid_mask_for_layer(&masks, layer, top_layers, bottom_layers, innermost);
                let solid = solid_infill(&solid_mask, layer, width, overlap);
                let sparse = sparse_infill(
                    innermost,
                    &solid_mask,
                    layer,
                    pattern,
                    density,
                    width,
                    overlap,
                );
                (solid, sparse)
            })
            .collect();
        callback("infill", 1.0);

        // Stage K: bucket assembly and chaining.
        callback("chaining", 0.0);
        let raft_layer_count = adhesion.raft_fill.len();
        let total_layers = raft_layer_count + layer_count;
        let mut raw: RawLayerPaths = Vec::with_capacity(total_layers);
        raw.resize_with(total_layers, Default::default);

        for (i, fill) in adhesion.raft_fill.iter().enumerate() {
            raw[i][0].paths.extend(fill.iter().cloned());
        }
        if let Some(first) = raw.first_mut() {
            // Skirt primes the nozzle at bed level.
            let mut paths = std::mem::take(&mut first[0].paths);
            let mut with_skirt = adhesion.skirt.clone();
            with_skirt.append(&mut paths);
            first[0].paths = with_skirt;
        }

        for (layer, (solid, sparse)) in fills.into_iter().enumerate() {
            let print_layer = raft_layer_count + layer;
            let bucket = &mut raw[print_layer][0];
            if layer == 0 {
                bucket.paths.extend(adhesion.brim.iter().cloned());
            }
            for shell in &perimeters[layer] {
                for region in shell {
                    bucket.paths.extend(region.to_closed_polylines());
                }
            }
            bucket.paths.extend(solid);
            bucket.paths.extend(sparse);

            let sup = &mut raw[print_layer][support_nozzle];
            append_support_layer(sup, &support, layer);
        }

        for buckets in raw.iter_mut() {
            for (nozzle, bucket) in buckets.iter_mut().enumerate() {
                bucket.width = self.extrusion_width(nozzle);
            }
        }
        raw.par_iter_mut().for_each(|buckets| {
            for bucket in buckets.iter_mut() {
                let paths = std::mem::take(&mut bucket.paths);
                bucket.paths = chain_polylines(paths, CHAIN_MAX_DIST_MM);
            }
        });
        callback("chaining", 1.0);

        // Stage L: emission.
        callback("gcode", 0.0);
        let gcode = emit_gcode(&raw, &self.emitter_config());
        callback("gcode", 1.0);

        Ok(gcode)
    }

    /// Extrusion width of a nozzle: bore diameter times the extrusion ratio.
    fn extrusion_width(&self, nozzle: usize) -> CoordF {
        self.config.get_nozzle_float("diam", nozzle) * self.config.get_float("extrusion_ratio")
    }

    /// Center the model on the bed and drop it onto z=0. A cylindrical bed
    /// centers on the origin; a rectangular bed on half its size.
    fn position_on_bed(&self, mesh: &mut Mesh) {
        if mesh.is_empty() {
            return;
        }
        let (cx, cy) = if self.config.get_str("bed_geometry") == "Cylindrical" {
            (0.0, 0.0)
        } else {
            (
                self.config.get_float("bed_size_x") / 2.0,
                self.config.get_float("bed_size_y") / 2.0,
            )
        };
        let bounds = *mesh.bounds();
        let center = bounds.center();
        mesh.translate(cx - center.x, cy - center.y, -bounds.min.z);
    }

    fn emitter_config(&self) -> EmitterConfig {
        let cfg = &self.config;
        let mut emitter = EmitterConfig {
            layer_height: cfg.get_float("layer_height"),
            feed_rate: cfg.get_float("feed_rate"),
            travel_rate_xy: cfg.get_float("travel_rate_xy"),
            travel_rate_z: cfg.get_float("travel_rate_z"),
            retract_dist: cfg.get_float("retract_dist"),
            retract_speed: cfg.get_float("retract_speed"),
            retract_lift: cfg.get_float("retract_lift"),
            retract_extruder: cfg.get_float("retract_extruder"),
            bed_temp: cfg.get_int("bed_temp") as u32,
            ..Default::default()
        };
        for n in 0..NOZZLE_COUNT {
            emitter.nozzle_filament[n] = cfg.get_nozzle_float("filament", n);
            emitter.nozzle_max_speed[n] = cfg.get_nozzle_float("max_speed", n);
            emitter.nozzle_temp[n] = cfg.get_nozzle_int("temp", n) as u32;
        }
        emitter
    }
}

fn append_support_layer(bucket: &mut NozzleBucket, support: &SupportResult, layer: usize) {
    if let Some(outline) = support.outline.get(layer) {
        for region in outline {
            bucket.paths.extend(region.to_closed_polylines());
        }
    }
    if let Some(fill) = support.infill.get(layer) {
        bucket.paths.extend(fill.iter().cloned());
    }
}
