//! Slicer configuration.
//!
//! The configuration is a compile-time schema — ordered sections, each an
//! ordered list of typed option descriptors — plus a value store addressed
//! by option name. All mutation goes through one validated setter: bools
//! accept `true|True|false|False`, numbers are parsed and bounds-checked,
//! enums must match one of their declared options. Bad values leave the
//! previous value in place with a diagnostic; unknown keys are ignored with
//! a diagnostic.
//!
//! On disk the configuration is UTF-8 `key=value` lines with `#` comments
//! and `# <Section>` headers, at `$HOME/.config/strata`.

use crate::CoordF;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Typed option descriptor.
#[derive(Clone, Copy, Debug)]
pub enum OptionSpec {
    Bool {
        default: bool,
    },
    Int {
        default: i64,
        min: i64,
        max: i64,
    },
    Float {
        default: CoordF,
        min: CoordF,
        max: CoordF,
    },
    Enum {
        default: &'static str,
        options: &'static [&'static str],
    },
}

/// One configuration option.
#[derive(Clone, Copy, Debug)]
pub struct OptionDescr {
    pub name: &'static str,
    pub spec: OptionSpec,
    pub help: &'static str,
}

/// A named group of options.
#[derive(Clone, Copy, Debug)]
pub struct Section {
    pub name: &'static str,
    pub options: &'static [OptionDescr],
}

const INFILL_TYPES: &[&str] = &["Lines", "Triangles", "Grid", "Hexagons"];
const SUPPORT_TYPES: &[&str] = &["None", "Everywhere", "External"];
const ADHESION_TYPES: &[&str] = &["None", "Brim", "Raft"];
const BED_GEOMETRIES: &[&str] = &["Rectangular", "Cylindrical"];
const MATERIAL_NAMES: &[&str] = &["PLA", "ABS", "PETG", "TPU", "Nylon", "HIPS", "PVA"];

macro_rules! opt {
    ($name:literal, bool, $default:expr, $help:literal) => {
        OptionDescr {
            name: $name,
            spec: OptionSpec::Bool { default: $default },
            help: $help,
        }
    };
    ($name:literal, int, $default:expr, $min:expr, $max:expr, $help:literal) => {
        OptionDescr {
            name: $name,
            spec: OptionSpec::Int {
                default: $default,
                min: $min,
                max: $max,
            },
            help: $help,
        }
    };
    ($name:literal, float, $default:expr, $min:expr, $max:expr, $help:literal) => {
        OptionDescr {
            name: $name,
            spec: OptionSpec::Float {
                default: $default,
                min: $min,
                max: $max,
            },
            help: $help,
        }
    };
    ($name:literal, enum, $default:literal, $options:expr, $help:literal) => {
        OptionDescr {
            name: $name,
            spec: OptionSpec::Enum {
                default: $default,
                options: $options,
            },
            help: $help,
        }
    };
}

/// The full configuration schema, in display order.
pub static SLICER_CONFIGS: &[Section] = &[
    Section {
        name: "Quality",
        options: &[
            opt!("layer_height", float, 0.2, 0.01, 0.5, "Layer height in mm"),
            opt!(
                "extrusion_ratio",
                float,
                1.25,
                0.5,
                2.0,
                "Extrusion width as a multiple of the nozzle diameter"
            ),
            opt!("shells", int, 2, 1, 10, "Number of perimeter shells"),
            opt!(
                "shell_random_starts",
                bool,
                false,
                "Randomize the starting vertex of inner shells"
            ),
            opt!("top_layers", int, 3, 0, 10, "Solid layers under top surfaces"),
            opt!(
                "bottom_layers",
                int,
                3,
                0,
                10,
                "Solid layers above bottom surfaces"
            ),
            opt!("infill_type", enum, "Grid", INFILL_TYPES, "Sparse infill pattern"),
            opt!("infill_density", float, 0.2, 0.0, 1.0, "Sparse infill density"),
            opt!(
                "infill_overlap",
                float,
                0.15,
                0.0,
                1.0,
                "Overlap between infill and perimeters in mm"
            ),
            opt!("feed_rate", float, 60.0, 1.0, 300.0, "Print feed rate in mm/s"),
        ],
    },
    Section {
        name: "Support",
        options: &[
            opt!("support_type", enum, "None", SUPPORT_TYPES, "Where to place support"),
            opt!(
                "overhang_angle",
                float,
                45.0,
                0.0,
                90.0,
                "Overhang angle threshold in degrees"
            ),
            opt!(
                "support_outset",
                float,
                0.5,
                0.0,
                5.0,
                "Clearance between support and the model in mm"
            ),
            opt!("support_density", float, 0.33, 0.0, 1.0, "Support infill density"),
            opt!("support_nozzle", int, 0, 0, 3, "Extruder used for support"),
        ],
    },
    Section {
        name: "Adhesion",
        options: &[
            opt!("adhesion_type", enum, "None", ADHESION_TYPES, "Bed adhesion structure"),
            opt!(
                "skirt_outset",
                float,
                3.0,
                0.0,
                20.0,
                "Distance from the model to the skirt in mm"
            ),
            opt!("brim_width", float, 3.0, 0.0, 20.0, "Total brim width in mm"),
            opt!("raft_layers", int, 2, 1, 5, "Number of raft layers"),
            opt!(
                "raft_outset",
                float,
                3.0,
                0.0,
                10.0,
                "Raft margin around the first layer in mm"
            ),
        ],
    },
    Section {
        name: "Retraction",
        options: &[
            opt!(
                "retract_dist",
                float,
                4.0,
                0.0,
                20.0,
                "Retraction before travel in mm of filament"
            ),
            opt!("retract_speed", float, 30.0, 1.0, 200.0, "Retraction speed in mm/s"),
            opt!("retract_lift", float, 0.0, 0.0, 10.0, "Z lift during travel in mm"),
            opt!(
                "retract_extruder",
                float,
                10.0,
                0.0,
                50.0,
                "Extra retraction around tool changes in mm"
            ),
        ],
    },
    Section {
        name: "Materials",
        options: &[
            opt!("bed_temp", int, 60, 0, 150, "Bed temperature in °C (0 disables)"),
            opt!("nozzle_0_temp", int, 210, 0, 350, "Extruder 0 temperature in °C"),
            opt!("nozzle_1_temp", int, 210, 0, 350, "Extruder 1 temperature in °C"),
            opt!("nozzle_2_temp", int, 210, 0, 350, "Extruder 2 temperature in °C"),
            opt!("nozzle_3_temp", int, 210, 0, 350, "Extruder 3 temperature in °C"),
            opt!("nozzle_0_material", enum, "PLA", MATERIAL_NAMES, "Extruder 0 material"),
            opt!("nozzle_1_material", enum, "PLA", MATERIAL_NAMES, "Extruder 1 material"),
            opt!("nozzle_2_material", enum, "PLA", MATERIAL_NAMES, "Extruder 2 material"),
            opt!("nozzle_3_material", enum, "PLA", MATERIAL_NAMES, "Extruder 3 material"),
        ],
    },
    Section {
        name: "Machine",
        options: &[
            opt!("bed_geometry", enum, "Rectangular", BED_GEOMETRIES, "Bed shape"),
            opt!("bed_size_x", float, 220.0, 50.0, 1000.0, "Bed size X in mm"),
            opt!("bed_size_y", float, 220.0, 50.0, 1000.0, "Bed size Y in mm"),
            opt!(
                "travel_rate_xy",
                float,
                100.0,
                1.0,
                500.0,
                "XY travel rate in mm/s"
            ),
            opt!("travel_rate_z", float, 10.0, 0.1, 50.0, "Z travel rate in mm/s"),
            opt!("nozzle_0_diam", float, 0.4, 0.1, 2.0, "Nozzle 0 bore diameter in mm"),
            opt!("nozzle_1_diam", float, 0.4, 0.1, 2.0, "Nozzle 1 bore diameter in mm"),
            opt!("nozzle_2_diam", float, 0.4, 0.1, 2.0, "Nozzle 2 bore diameter in mm"),
            opt!("nozzle_3_diam", float, 0.4, 0.1, 2.0, "Nozzle 3 bore diameter in mm"),
            opt!(
                "nozzle_0_filament",
                float,
                1.75,
                1.0,
                5.0,
                "Nozzle 0 filament diameter in mm"
            ),
            opt!(
                "nozzle_1_filament",
                float,
                1.75,
                1.0,
                5.0,
                "Nozzle 1 filament diameter in mm"
            ),
            opt!(
                "nozzle_2_filament",
                float,
                1.75,
                1.0,
                5.0,
                "Nozzle 2 filament diameter in mm"
            ),
            opt!(
                "nozzle_3_filament",
                float,
                1.75,
                1.0,
                5.0,
                "Nozzle 3 filament diameter in mm"
            ),
            opt!(
                "nozzle_0_max_speed",
                float,
                100.0,
                1.0,
                500.0,
                "Nozzle 0 speed ceiling in mm/s"
            ),
            opt!(
                "nozzle_1_max_speed",
                float,
                100.0,
                1.0,
                500.0,
                "Nozzle 1 speed ceiling in mm/s"
            ),
            opt!(
                "nozzle_2_max_speed",
                float,
                100.0,
                1.0,
                500.0,
                "Nozzle 2 speed ceiling in mm/s"
            ),
            opt!(
                "nozzle_3_max_speed",
                float,
                100.0,
                1.0,
                500.0,
                "Nozzle 3 speed ceiling in mm/s"
            ),
        ],
    },
];

/// A material preset applied by `--filament`.
#[derive(Clone, Copy, Debug)]
pub struct Material {
    pub name: &'static str,
    /// Hotend temperature in °C.
    pub hotend: i64,
    /// Bed temperature in °C.
    pub bed: i64,
}

/// Built-in material presets.
pub static MATERIALS: &[Material] = &[
    Material { name: "PLA", hotend: 210, bed: 60 },
    Material { name: "ABS", hotend: 245, bed: 100 },
    Material { name: "PETG", hotend: 240, bed: 80 },
    Material { name: "TPU", hotend: 230, bed: 50 },
    Material { name: "Nylon", hotend: 255, bed: 90 },
    Material { name: "HIPS", hotend: 240, bed: 100 },
    Material { name: "PVA", hotend: 190, bed: 60 },
];

/// A configuration value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(CoordF),
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{}", v),
        }
    }
}

/// What went wrong in a [`SlicerConfig::set`] call. The display form is the
/// user-facing diagnostic.
#[derive(Clone, Debug, PartialEq)]
pub enum SetError {
    UnknownKey(String),
    OutOfRangeFloat { min: CoordF, max: CoordF },
    OutOfRangeInt { min: i64, max: i64 },
    BadEnum { options: &'static [&'static str] },
    BadBool,
}

impl fmt::Display for SetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetError::UnknownKey(key) => {
                write!(f, "Ignoring unknown config option \"{}\"", key)
            }
            SetError::OutOfRangeFloat { min, max } => {
                write!(f, "Value should be between {:.2} and {:.2}", min, max)
            }
            SetError::OutOfRangeInt { min, max } => {
                write!(f, "Value should be between {} and {}", min, max)
            }
            SetError::BadEnum { options } => {
                write!(f, "Value should be one of {}", options.join(", "))
            }
            SetError::BadBool => write!(f, "Value should be true or false"),
        }
    }
}

impl std::error::Error for SetError {}

/// Look up an option descriptor by name.
pub fn find_option(name: &str) -> Option<&'static OptionDescr> {
    SLICER_CONFIGS
        .iter()
        .flat_map(|s| s.options.iter())
        .find(|o| o.name == name)
}

/// The live configuration: every schema option with its current value.
#[derive(Clone, Debug)]
pub struct SlicerConfig {
    values: HashMap<&'static str, Value>,
}

impl Default for SlicerConfig {
    fn default() -> Self {
        let mut values = HashMap::new();
        for section in SLICER_CONFIGS {
            for opt in section.options {
                values.insert(opt.name, default_value(&opt.spec));
            }
        }
        Self { values }
    }
}

fn default_value(spec: &OptionSpec) -> Value {
    match spec {
        OptionSpec::Bool { default } => Value::Bool(*default),
        OptionSpec::Int { default, .. } => Value::Int(*default),
        OptionSpec::Float { default, .. } => Value::Float(*default),
        OptionSpec::Enum { default, .. } => Value::Str((*default).to_string()),
    }
}

impl SlicerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validated setter: parse `raw` against the option's declared type and
    /// bounds. On error the previous value is untouched.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), SetError> {
        let opt = find_option(key).ok_or_else(|| SetError::UnknownKey(key.to_string()))?;
        let value = match &opt.spec {
            OptionSpec::Bool { .. } => match raw {
                "true" | "True" => Value::Bool(true),
                "false" | "False" => Value::Bool(false),
                _ => return Err(SetError::BadBool),
            },
            OptionSpec::Int { min, max, .. } => {
                let v: i64 = raw
                    .parse()
                    .map_err(|_| SetError::OutOfRangeInt { min: *min, max: *max })?;
                if v < *min || v > *max {
                    return Err(SetError::OutOfRangeInt { min: *min, max: *max });
                }
                Value::Int(v)
            }
            OptionSpec::Float { min, max, .. } => {
                let v: CoordF = raw
                    .parse()
                    .map_err(|_| SetError::OutOfRangeFloat { min: *min, max: *max })?;
                if !v.is_finite() || v < *min || v > *max {
                    return Err(SetError::OutOfRangeFloat { min: *min, max: *max });
                }
                Value::Float(v)
            }
            OptionSpec::Enum { options, .. } => {
                if !options.contains(&raw) {
                    return Err(SetError::BadEnum { options });
                }
                Value::Str(raw.to_string())
            }
        };
        self.values.insert(opt.name, value);
        Ok(())
    }

    /// Like [`set`](Self::set) but reporting problems as warnings, leaving
    /// the option at its previous value.
    pub fn set_or_warn(&mut self, key: &str, raw: &str) {
        if let Err(err) = self.set(key, raw) {
            warn!("{}", err);
            eprintln!("{}", err);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(v)) => *v,
            _ => false,
        }
    }

    pub fn get_int(&self, key: &str) -> i64 {
        match self.values.get(key) {
            Some(Value::Int(v)) => *v,
            _ => 0,
        }
    }

    pub fn get_float(&self, key: &str) -> CoordF {
        match self.values.get(key) {
            Some(Value::Float(v)) => *v,
            Some(Value::Int(v)) => *v as CoordF,
            _ => 0.0,
        }
    }

    pub fn get_str(&self, key: &str) -> &str {
        match self.values.get(key) {
            Some(Value::Str(v)) => v,
            _ => "",
        }
    }

    /// Per-nozzle float option, e.g. `get_nozzle_float("diam", 2)`.
    pub fn get_nozzle_float(&self, suffix: &str, nozzle: usize) -> CoordF {
        self.get_float(&format!("nozzle_{}_{}", nozzle, suffix))
    }

    /// Per-nozzle int option.
    pub fn get_nozzle_int(&self, suffix: &str, nozzle: usize) -> i64 {
        self.get_int(&format!("nozzle_{}_{}", nozzle, suffix))
    }

    /// Apply a material preset to one extruder. Returns false for an
    /// unknown material name.
    pub fn apply_material(&mut self, nozzle: usize, name: &str) -> bool {
        let Some(mat) = MATERIALS.iter().find(|m| m.name.eq_ignore_ascii_case(name)) else {
            return false;
        };
        self.set_or_warn(&format!("nozzle_{}_material", nozzle), mat.name);
        self.set_or_warn(&format!("nozzle_{}_temp", nozzle), &mat.hotend.to_string());
        self.set_or_warn("bed_temp", &mat.bed.to_string());
        true
    }

    /// The configuration file path: `$HOME/.config/strata`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("strata"))
    }

    /// Load `key=value` lines, ignoring comments and blank lines. Problems
    /// with individual lines are diagnostics, not errors.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> std::io::Result<()> {
        let text = fs::read_to_string(path)?;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => self.set_or_warn(key.trim(), value.trim()),
                None => warn!("Ignoring malformed config line: {}", line),
            }
        }
        Ok(())
    }

    /// Save all options, grouped by section with `# <Section>` headers.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let mut out = String::new();
        for section in SLICER_CONFIGS {
            out.push_str(&format!("# {}\n", section.name));
            for opt in section.options {
                if let Some(value) = self.values.get(opt.name) {
                    out.push_str(&format!("{}={}\n", opt.name, value));
                }
            }
            out.push('\n');
        }
        fs::write(path, out)
    }

    /// Render the schema with defaults and ranges, for `--help-configs`.
    pub fn help_text() -> String {
        let mut out = String::new();
        for section in SLICER_CONFIGS {
            out.push_str(&format!("{}:\n", section.name));
            for opt in section.options {
                let detail = match &opt.spec {
                    OptionSpec::Bool { default } => format!("bool, default {}", default),
                    OptionSpec::Int { default, min, max } => {
                        format!("int {}..{}, default {}", min, max, default)
                    }
                    OptionSpec::Float { default, min, max } => {
                        format!("float {}..{}, default {}", min, max, default)
                    }
                    OptionSpec::Enum { default, options } => {
                        format!("one of {}, default {}", options.join("|"), default)
                    }
                };
                out.push_str(&format!(
                    "  {:<22} {}\n      {}\n",
                    opt.name, detail, opt.help
                ));
            }
        }
        out
    }

    /// Render the current values, for `--show-configs`.
    pub fn show_text(&self) -> String {
        let mut out = String::new();
        for section in SLICER_CONFIGS {
            out.push_str(&format!("# {}\n", section.name));
            for opt in section.options {
                if let Some(value) = self.values.get(opt.name) {
                    out.push_str(&format!("{}={}\n", opt.name, value));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_schema() {
        let config = SlicerConfig::default();
        assert!((config.get_float("layer_height") - 0.2).abs() < 1e-12);
        assert_eq!(config.get_int("shells"), 2);
        assert_eq!(config.get_str("infill_type"), "Grid");
        assert!(!config.get_bool("shell_random_starts"));
        assert!((config.get_nozzle_float("diam", 3) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_set_valid_value() {
        let mut config = SlicerConfig::default();
        assert!(config.set("layer_height", "0.3").is_ok());
        assert!((config.get_float("layer_height") - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_set_unparsable_float_message() {
        let mut config = SlicerConfig::default();
        let err = config.set("layer_height", "abc").unwrap_err();
        assert_eq!(err.to_string(), "Value should be between 0.01 and 0.50");
        // Previous value untouched.
        assert!((config.get_float("layer_height") - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_set_out_of_range_float() {
        let mut config = SlicerConfig::default();
        let err = config.set("layer_height", "0.75").unwrap_err();
        assert_eq!(err.to_string(), "Value should be between 0.01 and 0.50");
    }

    #[test]
    fn test_unknown_key_message() {
        let mut config = SlicerConfig::default();
        let err = config.set("unknown_key", "5").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Ignoring unknown config option \"unknown_key\""
        );
    }

    #[test]
    fn test_bool_parsing() {
        let mut config = SlicerConfig::default();
        assert!(config.set("shell_random_starts", "True").is_ok());
        assert!(config.get_bool("shell_random_starts"));
        assert!(config.set("shell_random_starts", "false").is_ok());
        assert!(!config.get_bool("shell_random_starts"));
        assert_eq!(
            config.set("shell_random_starts", "yes").unwrap_err(),
            SetError::BadBool
        );
    }

    #[test]
    fn test_enum_must_match_exactly() {
        let mut config = SlicerConfig::default();
        assert!(config.set("infill_type", "Hexagons").is_ok());
        assert!(config.set("infill_type", "hexagons").is_err());
        assert_eq!(config.get_str("infill_type"), "Hexagons");
    }

    #[test]
    fn test_int_bounds() {
        let mut config = SlicerConfig::default();
        let err = config.set("shells", "11").unwrap_err();
        assert_eq!(err.to_string(), "Value should be between 1 and 10");
        assert_eq!(config.get_int("shells"), 2);
    }

    #[test]
    fn test_apply_material() {
        let mut config = SlicerConfig::default();
        assert!(config.apply_material(1, "abs"));
        assert_eq!(config.get_nozzle_int("temp", 1), 245);
        assert_eq!(config.get_int("bed_temp"), 100);
        assert_eq!(config.get_str("nozzle_1_material"), "ABS");
        assert!(!config.apply_material(0, "unobtainium"));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = std::env::temp_dir();
        let path = dir.join("strata_config_test");

        let mut config = SlicerConfig::default();
        config.set("layer_height", "0.3").unwrap();
        config.set("infill_type", "Triangles").unwrap();
        config.save(&path).unwrap();

        let mut loaded = SlicerConfig::default();
        loaded.load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!((loaded.get_float("layer_height") - 0.3).abs() < 1e-12);
        assert_eq!(loaded.get_str("infill_type"), "Triangles");
    }

    #[test]
    fn test_load_ignores_comments_and_bad_lines() {
        let dir = std::env::temp_dir();
        let path = dir.join("strata_config_test_comments");
        std::fs::write(
            &path,
            "# Quality\nlayer_height=0.3\n\n# a comment\nlayer_height=abc\nunknown_key=5\n",
        )
        .unwrap();

        let mut config = SlicerConfig::default();
        config.load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // The good assignment sticks; the bad one is ignored afterwards.
        assert!((config.get_float("layer_height") - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_option_count_and_sections() {
        let names: Vec<&str> = SLICER_CONFIGS.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            ["Quality", "Support", "Adhesion", "Retraction", "Materials", "Machine"]
        );
        let total: usize = SLICER_CONFIGS.iter().map(|s| s.options.len()).sum();
        assert_eq!(total, 50);
    }
}
