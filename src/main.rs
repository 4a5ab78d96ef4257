//! Strata CLI - slice STL models into G-code.
//!
//! Usage:
//!   strata model.stl -o model.gcode
//!   strata model.stl --brim --support
//!   strata model.stl --filament PLA,PETG --set-option layer_height=0.3
//!   strata --help-configs

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use std::path::PathBuf;
use strata::config::SlicerConfig;
use strata::mesh::load_stl;
use strata::pipeline::{SlicePipeline, SliceSummary};
use strata::progress::Thermometer;

/// Z quantum applied to every vertex on STL read (mm).
const Z_QUANTUM: f64 = 0.001;

/// Slice STL models into Marlin G-code for FDM printers.
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input STL file(s)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Output G-code file (single input only; default: input with .gcode)
    #[arg(short = 'o', long, value_name = "OUTPUT")]
    outfile: Option<PathBuf>,

    /// Slice even when the mesh is not manifold
    #[arg(short = 'n', long)]
    no_validation: bool,

    /// Show the sliced model in the GUI viewer
    #[arg(short = 'g', long)]
    gui_display: bool,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    /// Disable the raft
    #[arg(long)]
    no_raft: bool,

    /// Print a raft under the model
    #[arg(long)]
    raft: bool,

    /// Print a brim around the first layer
    #[arg(long)]
    brim: bool,

    /// Disable support structures
    #[arg(long)]
    no_support: bool,

    /// Generate support outside the model footprint
    #[arg(long)]
    support: bool,

    /// Generate support everywhere, including on the model
    #[arg(long)]
    support_all: bool,

    /// Per-extruder materials, comma separated (e.g. PLA,PETG)
    #[arg(long, value_name = "MAT,...")]
    filament: Option<String>,

    /// Set a configuration option (repeatable)
    #[arg(long = "set-option", value_name = "KEY=VALUE")]
    set_option: Vec<String>,

    /// Print a configuration option (repeatable)
    #[arg(long = "query-option", value_name = "KEY")]
    query_option: Vec<String>,

    /// Write the current configuration to the config file
    #[arg(long)]
    write_configs: bool,

    /// List all configuration options with ranges and defaults
    #[arg(long)]
    help_configs: bool,

    /// Show the current configuration values
    #[arg(long)]
    show_configs: bool,
}

/// Thermometer adapter over an indicatif progress bar.
struct BarThermometer {
    bar: ProgressBar,
}

impl BarThermometer {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl Thermometer for BarThermometer {
    fn set_target(&mut self, target: u64) {
        self.bar.set_length(target);
    }
    fn update(&mut self, done: u64) {
        self.bar.set_position(done);
    }
    fn clear(&mut self) {
        self.bar.finish_and_clear();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let mut config = SlicerConfig::default();
    if let Some(path) = SlicerConfig::default_path() {
        if path.exists() {
            info!("loading configuration from {}", path.display());
            config
                .load(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
        }
    }

    apply_cli_options(&cli, &mut config)?;

    let mut handled = false;
    if cli.help_configs {
        print!("{}", SlicerConfig::help_text());
        handled = true;
    }
    if cli.show_configs {
        print!("{}", config.show_text());
        handled = true;
    }
    for key in &cli.query_option {
        match config.get(key) {
            Some(value) => println!("{}={}", key, value),
            None => bail!("Unknown config option \"{}\"", key),
        }
        handled = true;
    }
    if cli.write_configs {
        let path = SlicerConfig::default_path()
            .context("Could not determine the configuration directory")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        config
            .save(&path)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        println!("Configuration written to {}", path.display());
        handled = true;
    }

    if cli.files.is_empty() {
        if handled {
            return Ok(());
        }
        bail!("No input files. Try --help.");
    }

    if cli.gui_display {
        warn!("GUI viewer is not available in this build");
    }
    if cli.outfile.is_some() && cli.files.len() > 1 {
        bail!("--outfile only applies to a single input file");
    }

    for file in &cli.files {
        slice_file(file, &cli, &config)?;
    }
    Ok(())
}

/// Apply material, option, adhesion and support flags onto the config.
fn apply_cli_options(cli: &Cli, config: &mut SlicerConfig) -> Result<()> {
    if let Some(filament) = &cli.filament {
        for (nozzle, name) in filament.split(',').enumerate() {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if nozzle >= 4 {
                bail!("At most 4 materials can be assigned");
            }
            if !config.apply_material(nozzle, name) {
                bail!("Unknown material \"{}\"", name);
            }
        }
    }

    for assignment in &cli.set_option {
        let Some((key, value)) = assignment.split_once('=') else {
            bail!("--set-option expects KEY=VALUE, got \"{}\"", assignment);
        };
        config
            .set(key.trim(), value.trim())
            .with_context(|| format!("Bad value for option \"{}\"", key.trim()))?;
    }

    if cli.raft {
        config.set("adhesion_type", "Raft").ok();
    } else if cli.brim {
        config.set("adhesion_type", "Brim").ok();
    } else if cli.no_raft {
        config.set("adhesion_type", "None").ok();
    }

    if cli.support_all {
        config.set("support_type", "Everywhere").ok();
    } else if cli.support {
        config.set("support_type", "External").ok();
    } else if cli.no_support {
        config.set("support_type", "None").ok();
    }

    Ok(())
}

fn slice_file(file: &PathBuf, cli: &Cli, config: &SlicerConfig) -> Result<()> {
    info!("loading {}", file.display());
    let mut mesh = load_stl(file, Z_QUANTUM)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    println!("{}: {} facets", file.display(), mesh.facet_count());

    let report = mesh.check_manifold();
    if !report.is_manifold() {
        if cli.no_validation {
            warn!("slicing non-manifold mesh anyway: {}", report);
        } else {
            bail!(
                "{} is not manifold ({}); use --no-validation to slice it anyway",
                file.display(),
                report
            );
        }
    }

    let output = cli
        .outfile
        .clone()
        .unwrap_or_else(|| file.with_extension("gcode"));

    let pipeline = SlicePipeline::new(config.clone());
    let mut thermometer = BarThermometer::new();
    let gcode = pipeline.process_with_thermometer(&mut mesh, &mut thermometer)?;

    gcode
        .write_to_file(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let summary = SliceSummary::of(&gcode);
    println!("  Output: {}", output.display());
    println!("  Layers: {}", summary.layer_count);
    println!("  Filament used: {:.2} m", summary.filament_used_mm / 1000.0);
    println!("  Estimated time: {}", format_duration(summary.estimated_time_s));
    println!("  G-code lines: {}", gcode.line_count());
    Ok(())
}

fn format_duration(seconds: f64) -> String {
    let total = seconds.round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}
