// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! STL export and import
//!
//! Binary STL goes through `stl_io`; the ASCII variant is written by hand
//! since the format is trivial. Import welds the soup back into an indexed
//! mesh and validates it, so a file that does not describe a closed solid
//! is rejected at the door.

use crate::geometry::Mesh;
use anyhow::{Context, Result};
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Export a mesh to STL. `.stl` gets the binary encoding, anything else
/// the ASCII one.
pub fn export_stl(mesh: &Mesh, path: &str) -> Result<()> {
    let file_path = Path::new(path);
    if path.ends_with(".stl") {
        export_stl_binary(mesh, file_path)
    } else {
        export_stl_ascii(mesh, file_path)
    }
}

fn export_stl_binary(mesh: &Mesh, path: &Path) -> Result<()> {
    use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

    let triangles: Vec<StlTriangle> = (0..mesh.face_count())
        .map(|f| {
            let [v0, v1, v2] = mesh.face_points(f);
            let n = mesh.face_normal(f);
            StlTriangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    StlVertex::new([v0.x as f32, v0.y as f32, v0.z as f32]),
                    StlVertex::new([v1.x as f32, v1.y as f32, v1.z as f32]),
                    StlVertex::new([v2.x as f32, v2.y as f32, v2.z as f32]),
                ],
            }
        })
        .collect();

    let mut file = File::create(path).context("Failed to create STL file")?;
    stl_io::write_stl(&mut file, triangles.iter()).context("Failed to write STL file")?;
    Ok(())
}

fn export_stl_ascii(mesh: &Mesh, path: &Path) -> Result<()> {
    let file = File::create(path).context("Failed to create STL file")?;
    let mut out = BufWriter::new(file);

    writeln!(out, "solid solidcut")?;
    for f in 0..mesh.face_count() {
        let [v0, v1, v2] = mesh.face_points(f);
        let n = mesh.face_normal(f);
        writeln!(out, "  facet normal {} {} {}", n.x, n.y, n.z)?;
        writeln!(out, "    outer loop")?;
        for v in [v0, v1, v2] {
            writeln!(out, "      vertex {} {} {}", v.x, v.y, v.z)?;
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "  endfacet")?;
    }
    writeln!(out, "endsolid solidcut")?;
    Ok(())
}

/// Import a binary or ASCII STL file as a validated mesh. STL stores a
/// triangle soup, so identical corner positions are re-indexed into
/// shared vertices before validation.
pub fn import_stl(path: &str) -> Result<Mesh> {
    let mut file = File::open(path).context("Failed to open STL file")?;
    let stl = stl_io::read_stl(&mut file).context("Failed to read STL file")?;

    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();
    let faces: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|f| [f.vertices[0], f.vertices[1], f.vertices[2]])
        .collect();

    Mesh::new(vertices, faces).context("STL file does not describe a closed solid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives::cuboid;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use tempfile::tempdir;

    #[test]
    fn test_binary_roundtrip() -> Result<()> {
        let mesh = cuboid(Vector3::new(2.0, 3.0, 4.0));

        let dir = tempdir()?;
        let path = dir.path().join("box.stl");
        let path = path.to_str().unwrap();

        export_stl(&mesh, path)?;
        let back = import_stl(path)?;

        assert_eq!(back.face_count(), mesh.face_count());
        assert_relative_eq!(back.volume(), mesh.volume(), epsilon = 1e-3);
        Ok(())
    }

    #[test]
    fn test_ascii_export_structure() -> Result<()> {
        let mesh = cuboid(Vector3::new(1.0, 1.0, 1.0));

        let dir = tempdir()?;
        let path = dir.path().join("box.stla");
        export_stl(&mesh, path.to_str().unwrap())?;

        let text = std::fs::read_to_string(&path)?;
        assert!(text.starts_with("solid solidcut"));
        assert_eq!(text.matches("facet normal").count(), 12);
        assert!(text.trim_end().ends_with("endsolid solidcut"));
        Ok(())
    }
}
