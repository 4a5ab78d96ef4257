//! STL reading and writing.
//!
//! Both STL dialects are supported:
//! - **Binary**: 80-byte header, uint32 facet count, then 50-byte records of
//!   `{normal, v1, v2, v3}` as little-endian f32 triples plus a uint16
//!   attribute word.
//! - **ASCII**: whitespace-delimited `facet normal … outer loop … endfacet`
//!   blocks terminated by `endsolid`.
//!
//! Format sniffing follows the first 80 bytes: a (case-insensitive) `solid `
//! prefix on an otherwise human-readable buffer selects the ASCII parser.
//! Malformed ASCII facet blocks are skipped with a warning; the reader
//! resynchronizes at the next `facet` keyword. Zero-area facets are dropped
//! during insertion (see [`Mesh::add_triangle`]).

use super::store::Mesh;
use crate::geometry::Point3;
use crate::{CoordF, Error, Result};
use log::{info, warn};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Size of one binary facet record.
const BINARY_RECORD_SIZE: usize = 50;

/// Load an STL file into a mesh store, quantizing Z to `z_quantum` (mm).
pub fn load_stl<P: AsRef<Path>>(path: P, z_quantum: CoordF) -> Result<Mesh> {
    let mut file = File::open(path.as_ref())?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    let mesh = read_stl_bytes(&data, z_quantum)?;
    info!(
        "loaded {}: {} facets, {} vertices",
        path.as_ref().display(),
        mesh.facet_count(),
        mesh.vertex_count()
    );
    Ok(mesh)
}

/// Parse STL data from a byte buffer.
pub fn read_stl_bytes(data: &[u8], z_quantum: CoordF) -> Result<Mesh> {
    let mut mesh = Mesh::new(z_quantum);
    if looks_ascii(data) {
        read_ascii(data, &mut mesh)?;
    } else {
        read_binary(data, &mut mesh)?;
    }
    Ok(mesh)
}

/// Sniff the format: ASCII iff the prefix is `solid ` (case-insensitive) and
/// the first 80 bytes contain no unprintable characters.
fn looks_ascii(data: &[u8]) -> bool {
    let head = &data[..data.len().min(80)];
    let printable = head
        .iter()
        .all(|&b| b == b'\r' || b == b'\n' || b == b'\t' || (0x20..0x7f).contains(&b));
    if !printable {
        return false;
    }
    let text: String = head.iter().map(|&b| b as char).collect();
    text.trim_start().to_ascii_lowercase().starts_with("solid ")
}

// ============================================================================
// Binary
// ============================================================================

fn read_f32_le(data: &[u8], offset: usize) -> CoordF {
    let bytes: [u8; 4] = data[offset..offset + 4].try_into().unwrap_or([0; 4]);
    f32::from_le_bytes(bytes) as CoordF
}

fn read_binary(data: &[u8], mesh: &mut Mesh) -> Result<()> {
    if data.len() < 84 {
        return Err(Error::Stl("binary STL truncated before facet count".into()));
    }
    let count_bytes: [u8; 4] = data[80..84].try_into().unwrap_or([0; 4]);
    let facet_count = u32::from_le_bytes(count_bytes) as usize;

    let body = &data[84..];
    if body.len() < facet_count * BINARY_RECORD_SIZE {
        return Err(Error::Stl(format!(
            "binary STL truncated: {} facets declared, {} bytes of records",
            facet_count,
            body.len()
        )));
    }

    let mut skipped = 0usize;
    for i in 0..facet_count {
        let rec = i * BINARY_RECORD_SIZE;
        let mut values = [0.0; 12];
        for (j, value) in values.iter_mut().enumerate() {
            *value = read_f32_le(body, rec + j * 4);
        }
        let normal = Point3::new(values[0], values[1], values[2]);
        let pts = [
            Point3::new(values[3], values[4], values[5]),
            Point3::new(values[6], values[7], values[8]),
            Point3::new(values[9], values[10], values[11]),
        ];
        if mesh.add_triangle(normal, pts).is_none() {
            skipped += 1;
        }
    }
    if skipped > 0 {
        info!("dropped {} zero-area facets", skipped);
    }
    Ok(())
}

// ============================================================================
// ASCII
// ============================================================================

fn read_ascii(data: &[u8], mesh: &mut Mesh) -> Result<()> {
    let text = String::from_utf8_lossy(data);
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut pos = 0usize;
    let mut malformed = 0usize;
    let mut skipped = 0usize;

    while pos < tokens.len() {
        match tokens[pos].to_ascii_lowercase().as_str() {
            "endsolid" => break,
            "facet" => match parse_facet_block(&tokens, pos) {
                Some((normal, pts, next)) => {
                    if mesh.add_triangle(normal, pts).is_none() {
                        skipped += 1;
                    }
                    pos = next;
                }
                None => {
                    malformed += 1;
                    warn!("skipping malformed facet block");
                    pos = resync(&tokens, pos + 1);
                }
            },
            _ => pos += 1,
        }
    }

    if malformed > 0 {
        warn!("{} malformed facet blocks skipped", malformed);
    }
    if skipped > 0 {
        info!("dropped {} zero-area facets", skipped);
    }
    Ok(())
}

/// Advance to the next `facet` or `endsolid` keyword.
fn resync(tokens: &[&str], mut pos: usize) -> usize {
    while pos < tokens.len() {
        let t = tokens[pos].to_ascii_lowercase();
        if t == "facet" || t == "endsolid" {
            break;
        }
        pos += 1;
    }
    pos
}

fn expect_token(tokens: &[&str], p: &mut usize, word: &str) -> Option<()> {
    if tokens.get(*p)?.eq_ignore_ascii_case(word) {
        *p += 1;
        Some(())
    } else {
        None
    }
}

fn read_triple(tokens: &[&str], p: &mut usize) -> Option<Point3> {
    let x: CoordF = tokens.get(*p)?.parse().ok()?;
    let y: CoordF = tokens.get(*p + 1)?.parse().ok()?;
    let z: CoordF = tokens.get(*p + 2)?.parse().ok()?;
    *p += 3;
    Some(Point3::new(x, y, z))
}

/// Parse one `facet normal … endfacet` block starting at `pos` (which points
/// at the `facet` token). Returns the normal, the three vertices, and the
/// position just past `endfacet`.
fn parse_facet_block(tokens: &[&str], pos: usize) -> Option<(Point3, [Point3; 3], usize)> {
    let mut p = pos;
    expect_token(tokens, &mut p, "facet")?;
    expect_token(tokens, &mut p, "normal")?;
    let normal = read_triple(tokens, &mut p)?;
    expect_token(tokens, &mut p, "outer")?;
    expect_token(tokens, &mut p, "loop")?;

    let mut pts = [Point3::default(); 3];
    for v in &mut pts {
        expect_token(tokens, &mut p, "vertex")?;
        *v = read_triple(tokens, &mut p)?;
    }

    expect_token(tokens, &mut p, "endloop")?;
    expect_token(tokens, &mut p, "endfacet")?;
    Some((normal, pts, p))
}

// ============================================================================
// Writing
// ============================================================================

/// Write the mesh as ASCII STL.
pub fn write_stl_ascii<P: AsRef<Path>>(mesh: &Mesh, path: P, name: &str) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut w = BufWriter::new(file);
    writeln!(w, "solid {}", name)?;
    for id in mesh.facet_ids() {
        let f = mesh.facet(id);
        let [a, b, c] = mesh.facet_points(id);
        writeln!(
            w,
            "  facet normal {:e} {:e} {:e}",
            f.normal.x, f.normal.y, f.normal.z
        )?;
        writeln!(w, "    outer loop")?;
        for p in [a, b, c] {
            writeln!(w, "      vertex {:e} {:e} {:e}", p.x, p.y, p.z)?;
        }
        writeln!(w, "    endloop")?;
        writeln!(w, "  endfacet")?;
    }
    writeln!(w, "endsolid {}", name)?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q: CoordF = 0.001;

    fn ascii_triangle() -> String {
        "solid test\n\
         facet normal 0 0 1\n\
           outer loop\n\
             vertex 0 0 0\n\
             vertex 10 0 0\n\
             vertex 5 10 0\n\
           endloop\n\
         endfacet\n\
         endsolid test\n"
            .to_string()
    }

    fn binary_triangle() -> Vec<u8> {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&1u32.to_le_bytes());
        let floats: [f32; 12] = [
            0.0, 0.0, 1.0, // normal
            0.0, 0.0, 0.0, // v1
            10.0, 0.0, 0.0, // v2
            5.0, 10.0, 0.0, // v3
        ];
        for f in floats {
            data.extend_from_slice(&f.to_le_bytes());
        }
        data.extend_from_slice(&0u16.to_le_bytes());
        data
    }

    #[test]
    fn test_sniff_formats() {
        assert!(looks_ascii(ascii_triangle().as_bytes()));
        assert!(!looks_ascii(&binary_triangle()));
        // A binary file whose header happens to start with "solid" but
        // contains unprintable bytes is still binary.
        let mut tricky = binary_triangle();
        tricky[..6].copy_from_slice(b"solid ");
        tricky[40] = 0x01;
        assert!(!looks_ascii(&tricky));
    }

    #[test]
    fn test_read_ascii() {
        let mesh = read_stl_bytes(ascii_triangle().as_bytes(), Q).unwrap();
        assert_eq!(mesh.facet_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_read_binary() {
        let mesh = read_stl_bytes(&binary_triangle(), Q).unwrap();
        assert_eq!(mesh.facet_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_ascii_malformed_block_skipped() {
        let text = "solid test\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 0 0 zero\n\
              endloop\n\
            endfacet\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 0 0 0\n\
                vertex 10 0 0\n\
                vertex 5 10 0\n\
              endloop\n\
            endfacet\n\
            endsolid test\n";
        let mesh = read_stl_bytes(text.as_bytes(), Q).unwrap();
        // The broken block is skipped; the good one survives.
        assert_eq!(mesh.facet_count(), 1);
    }

    #[test]
    fn test_empty_solid() {
        let mesh = read_stl_bytes(b"solid empty\nendsolid empty\n", Q).unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_binary_truncated_is_error() {
        let mut data = binary_triangle();
        data.truncate(100);
        assert!(read_stl_bytes(&data, Q).is_err());
    }

    #[test]
    fn test_ascii_roundtrip() {
        let dir = std::env::temp_dir();
        let path = dir.join("strata_roundtrip_test.stl");

        let mesh = read_stl_bytes(ascii_triangle().as_bytes(), Q).unwrap();
        write_stl_ascii(&mesh, &path, "test").unwrap();

        let data = std::fs::read(&path).unwrap();
        let reread = read_stl_bytes(&data, Q).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(reread.facet_count(), mesh.facet_count());
        assert_eq!(reread.vertex_count(), mesh.vertex_count());
        // Same facet set up to winding normalization: bounds agree too.
        assert_eq!(reread.bounds().min, mesh.bounds().min);
        assert_eq!(reread.bounds().max, mesh.bounds().max);
    }

    #[test]
    fn test_z_quantization_applied() {
        let text = "solid q\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 0 0 0.00049\n\
                vertex 10 0 0.00049\n\
                vertex 5 10 0.00049\n\
              endloop\n\
            endfacet\n\
            endsolid q\n";
        let mesh = read_stl_bytes(text.as_bytes(), Q).unwrap();
        // 0.00049 snaps to the nearest 0.001 grid line (0.0).
        assert!(mesh.bounds().min.z.abs() < 1e-9);
    }
}
