//! G-code buffer and statistics.

use crate::{CoordF, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Statistics accumulated while emitting a program.
#[derive(Clone, Debug, Default)]
pub struct GCodeStats {
    /// Number of layers in the program (including raft layers).
    pub layer_count: usize,
    /// Filament consumed, in millimeters of filament.
    pub filament_used_mm: CoordF,
    /// Estimated build time in seconds.
    pub estimated_time_s: CoordF,
}

/// An emitted G-code program.
#[derive(Clone, Debug, Default)]
pub struct GCode {
    lines: Vec<String>,
    pub stats: GCodeStats,
}

impl GCode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line (without the terminating newline).
    #[inline]
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The whole program as LF-terminated text.
    pub fn content(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Write the program to a file, flushed before return.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut w = BufWriter::new(file);
        for line in &self.lines {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
        }
        w.flush()?;
        Ok(())
    }
}
