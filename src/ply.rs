//! ASCII PLY serialisation of [`IsoMesh`].
//!
//! The writer emits the subset of PLY the rest of the toolchain expects:
//! `x y z nx ny nz` per vertex and a `3 a b c` list record per face, with
//! exact header keyword spelling so external viewers accept the files. The
//! reader parses the same subset back, for round trips and for feeding
//! previously extracted meshes to the plugin.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Read, Write},
    path::Path,
};

use tracing::debug;

use crate::{
    error::{IsoFieldError, Result},
    mesh::IsoMesh,
};

/// Writes `mesh` as ASCII PLY.
///
/// Fails only on count inconsistencies in `mesh` or on I/O errors; the mesh
/// itself is never modified.
pub fn write_ply<W: Write>(mesh: &IsoMesh, writer: W) -> Result<()> {
    mesh.validate()?;

    let mut w = BufWriter::new(writer);
    let vertex_count = mesh.vertices.len();
    let face_count = mesh.triangle_count();

    writeln!(w, "ply")?;
    writeln!(w, "format ascii 1.0")?;
    writeln!(w, "element vertex {vertex_count}")?;
    writeln!(w, "property float x")?;
    writeln!(w, "property float y")?;
    writeln!(w, "property float z")?;
    writeln!(w, "property float nx")?;
    writeln!(w, "property float ny")?;
    writeln!(w, "property float nz")?;
    writeln!(w, "element face {face_count}")?;
    writeln!(w, "property list uchar uint vertex_indices")?;
    writeln!(w, "end_header")?;

    for (v, n) in mesh.vertices.iter().zip(&mesh.normals) {
        writeln!(w, "{} {} {} {} {} {}", v[0], v[1], v[2], n[0], n[1], n[2])?;
    }

    for face in mesh.indices.chunks_exact(3) {
        writeln!(w, "3 {} {} {}", face[0], face[1], face[2])?;
    }

    w.flush()?;
    debug!(vertex_count, face_count, "wrote ply mesh");
    Ok(())
}

/// Writes `mesh` to the file at `path`, creating or truncating it.
pub fn write_ply_file<P: AsRef<Path>>(mesh: &IsoMesh, path: P) -> Result<()> {
    write_ply(mesh, File::create(path)?)
}

fn malformed(line: usize, reason: impl Into<String>) -> IsoFieldError {
    IsoFieldError::MalformedPly {
        line,
        reason: reason.into(),
    }
}

/// Reads a mesh written by [`write_ply`].
///
/// Only the subset this crate emits is accepted: ASCII format, the six
/// vertex properties in `x y z nx ny nz` order, and triangular faces.
pub fn read_ply<R: Read>(reader: R) -> Result<IsoMesh> {
    let mut lines = BufReader::new(reader).lines().enumerate();

    let mut next_line = |expected: &str| -> Result<(usize, String)> {
        match lines.next() {
            Some((n, line)) => Ok((n + 1, line?)),
            None => Err(malformed(0, format!("unexpected end of file, wanted {expected}"))),
        }
    };

    let (n, magic) = next_line("ply magic")?;
    if magic.trim() != "ply" {
        return Err(malformed(n, "missing ply magic"));
    }
    let (n, format) = next_line("format declaration")?;
    if format.trim() != "format ascii 1.0" {
        return Err(malformed(n, "only 'format ascii 1.0' is supported"));
    }

    // Header: collect element counts until end_header, ignore property lines.
    let mut vertex_count = None;
    let mut face_count = None;
    loop {
        let (n, line) = next_line("end_header")?;
        let line = line.trim();
        if line == "end_header" {
            break;
        }
        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["element", "vertex", count] => {
                vertex_count = Some(count.parse::<usize>().map_err(|_| {
                    malformed(n, format!("bad vertex count '{count}'"))
                })?);
            }
            ["element", "face", count] => {
                face_count = Some(count.parse::<usize>().map_err(|_| {
                    malformed(n, format!("bad face count '{count}'"))
                })?);
            }
            ["property", ..] | ["comment", ..] => {}
            _ => return Err(malformed(n, format!("unrecognised header line '{line}'"))),
        }
    }
    let vertex_count = vertex_count.ok_or_else(|| malformed(0, "no vertex element"))?;
    let face_count = face_count.ok_or_else(|| malformed(0, "no face element"))?;

    let mut vertices = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let (n, line) = next_line("vertex record")?;
        let fields: Vec<f32> = line
            .split_whitespace()
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| malformed(n, "non-numeric vertex field"))?;
        if fields.len() != 6 {
            return Err(malformed(n, format!("expected 6 vertex fields, got {}", fields.len())));
        }
        vertices.push([fields[0], fields[1], fields[2]]);
        normals.push([fields[3], fields[4], fields[5]]);
    }

    let mut indices = Vec::with_capacity(face_count * 3);
    for _ in 0..face_count {
        let (n, line) = next_line("face record")?;
        let fields: Vec<u32> = line
            .split_whitespace()
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| malformed(n, "non-numeric face field"))?;
        match fields.as_slice() {
            [3, a, b, c] => {
                for &idx in [a, b, c] {
                    if idx as usize >= vertex_count {
                        return Err(malformed(n, format!("vertex index {idx} out of range")));
                    }
                }
                indices.extend([*a, *b, *c]);
            }
            [count, ..] => {
                return Err(malformed(n, format!("only triangular faces supported, got {count}-gon")));
            }
            [] => return Err(malformed(n, "empty face record")),
        }
    }

    let mesh = IsoMesh {
        vertices,
        normals,
        indices,
    };
    mesh.validate()?;
    debug!(vertex_count, face_count, "read ply mesh");
    Ok(mesh)
}

/// Reads a mesh from the file at `path`.
pub fn read_ply_file<P: AsRef<Path>>(path: P) -> Result<IsoMesh> {
    read_ply(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extract::{ExtractParams, extract},
        field::Sphere,
        grid::GridBounds,
    };

    fn sample_mesh() -> IsoMesh {
        let params = ExtractParams::new(GridBounds::new(-2.0, 2.0, 0.5), 1.0);
        extract(&Sphere, &params)
    }

    #[test]
    fn header_matches_the_expected_spelling() {
        let mesh = sample_mesh();
        let mut out = Vec::new();
        write_ply(&mesh, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("ply"));
        assert_eq!(lines.next(), Some("format ascii 1.0"));
        assert_eq!(
            lines.next(),
            Some(format!("element vertex {}", mesh.vertices.len()).as_str())
        );
        assert!(text.contains("property float nx"));
        assert!(text.contains(&format!("element face {}", mesh.triangle_count())));
        assert!(text.contains("property list uchar uint vertex_indices"));
        assert!(text.contains("end_header"));
    }

    #[test]
    fn round_trip_preserves_the_mesh() {
        let mesh = sample_mesh();
        let mut out = Vec::new();
        write_ply(&mesh, &mut out).unwrap();

        let parsed = read_ply(out.as_slice()).unwrap();
        assert_eq!(parsed.vertices.len(), mesh.vertices.len());
        assert_eq!(parsed.triangle_count(), mesh.triangle_count());
        assert_eq!(parsed.indices, mesh.indices);
        // `{}` formatting of f32 round-trips exactly.
        assert_eq!(parsed.vertices, mesh.vertices);
        assert_eq!(parsed.normals, mesh.normals);
    }

    #[test]
    fn empty_mesh_round_trips() {
        let mesh = IsoMesh::default();
        let mut out = Vec::new();
        write_ply(&mesh, &mut out).unwrap();
        let parsed = read_ply(out.as_slice()).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn truncated_file_is_rejected() {
        let mesh = sample_mesh();
        let mut out = Vec::new();
        write_ply(&mesh, &mut out).unwrap();
        out.truncate(out.len() / 2);

        assert!(read_ply(out.as_slice()).is_err());
    }

    #[test]
    fn non_triangular_faces_are_rejected() {
        let text = "ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nproperty float y\nproperty float z\nproperty float nx\nproperty float ny\nproperty float nz\nelement face 1\nproperty list uchar uint vertex_indices\nend_header\n0 0 0 0 0 1\n1 0 0 0 0 1\n1 1 0 0 0 1\n0 1 0 0 0 1\n4 0 1 2 3\n";
        let err = read_ply(text.as_bytes()).unwrap_err();
        assert!(matches!(err, IsoFieldError::MalformedPly { .. }));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let text = "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nproperty float nx\nproperty float ny\nproperty float nz\nelement face 1\nproperty list uchar uint vertex_indices\nend_header\n0 0 0 0 0 1\n1 0 0 0 0 1\n1 1 0 0 0 1\n3 0 1 7\n";
        let err = read_ply(text.as_bytes()).unwrap_err();
        assert!(matches!(err, IsoFieldError::MalformedPly { line: 16, .. }));
    }
}
