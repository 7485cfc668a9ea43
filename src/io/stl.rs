// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL reader and writer

use crate::geometry::{IndexedMesh, Mesh};
use crate::utils::math::calculate_triangle_normal;
use anyhow::{Context, Result};
use nalgebra::Point3;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;
use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

/// STL triangles for `mesh`. Polygons are fanned from their first vertex.
pub fn mesh_triangles(mesh: &Mesh) -> Vec<StlTriangle> {
    let vertex = |p: &Point3<f64>| StlVertex::new([p.x as f32, p.y as f32, p.z as f32]);

    let mut triangles = Vec::with_capacity(mesh.face_count());
    for face in mesh.face_keys() {
        let positions = mesh.face_positions(face);
        for i in 1..positions.len() - 1 {
            let (p0, p1, p2) = (&positions[0], &positions[i], &positions[i + 1]);
            let n = calculate_triangle_normal(p0, p1, p2);
            triangles.push(StlTriangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [vertex(p0), vertex(p1), vertex(p2)],
            });
        }
    }
    triangles
}

pub fn write_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    let triangles = mesh_triangles(mesh);
    stl_io::write_stl(writer, triangles.iter()).context("Failed to write STL data")?;
    Ok(())
}

/// Read ASCII or binary STL. Identical corner positions share a vertex.
pub fn read_stl<R: Read + Seek>(reader: &mut R) -> Result<IndexedMesh> {
    let stl = stl_io::read_stl(reader).context("Failed to read STL data")?;

    let positions = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();
    let faces: Vec<Vec<usize>> = stl.faces.iter().map(|f| f.vertices.to_vec()).collect();
    let colors = vec![None; faces.len()];

    Ok(IndexedMesh {
        positions,
        faces,
        colors,
        flagged_edges: Vec::new(),
    })
}

pub fn export_stl(mesh: &Mesh, path: &Path) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create STL file: {}", path.display()))?;
    write_stl(mesh, &mut file)
}

pub fn import_stl(path: &Path) -> Result<IndexedMesh> {
    let mut file = File::open(path).with_context(|| format!("Failed to open STL file: {}", path.display()))?;
    read_stl(&mut file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Vector3;
    use std::io::Cursor;

    #[test]
    fn test_fans_polygons() {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = Mesh::from_indexed(&positions, &[vec![0, 1, 2, 3]]).unwrap();
        let triangles = mesh_triangles(&mesh);
        assert_eq!(triangles.len(), 2);
        for triangle in &triangles {
            assert!((triangle.normal[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_binary_round_trip_shares_vertices() {
        let mesh = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
        let mut buffer = Cursor::new(Vec::new());
        write_stl(&mesh, &mut buffer).unwrap();

        buffer.set_position(0);
        let indexed = read_stl(&mut buffer).unwrap();
        assert_eq!(indexed.faces.len(), 12);
        assert_eq!(indexed.positions.len(), 8);
    }
}
