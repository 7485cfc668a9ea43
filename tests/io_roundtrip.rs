// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Round-trip export/import tests

use anyhow::Result;
use meshmend::geometry::{Mesh, Primitive};
use meshmend::io::{self, MeshFormat};
use meshmend::split::{SegmentRecorder, Splitter};
use meshmend::weld::{CandidateEdges, Welder};
use meshmend::MeshStats;
use nalgebra::{Point3, Vector3};
use tempfile::TempDir;

#[test]
fn test_stl_round_trip_restores_shared_vertices() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("sphere.stl");

    let original = Primitive::sphere(5.0, 12).to_mesh();
    io::export_mesh(&original, &path)?;
    assert!(std::fs::metadata(&path)?.len() > 84);

    let loaded = io::import_mesh(&path)?;
    let before = MeshStats::analyze(&original);
    let after = MeshStats::analyze(&loaded);
    assert_eq!(after.vertex_count, before.vertex_count);
    assert_eq!(after.face_count, before.face_count);
    assert!(after.is_watertight);
    assert!((after.surface_area - before.surface_area).abs() < 1e-3);
    Ok(())
}

#[test]
fn test_stl_fans_quads() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("quad.stl");

    let positions = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(2.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let quad = meshmend::Mesh::from_indexed(&positions, &[vec![0, 1, 2, 3]])?;
    io::export_mesh(&quad, &path)?;

    let loaded = io::import_mesh(&path)?;
    assert_eq!(loaded.face_count(), 2);
    assert!(loaded.all_faces_are_triangles());
    assert!((loaded.surface_area() - 2.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_obj_round_trip_keeps_region_colors() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("pieces.obj");
    let output = dir.path().join("welded.obj");

    let mut mesh = Primitive::square_fan(2, 1.0).to_mesh();
    let mut right = Primitive::square_fan(2, 1.0).to_mesh();
    right.translate(&Vector3::new(2.0, 0.0, 0.0));
    mesh.append(&right);
    io::export_mesh(&mesh, &input)?;
    assert!(!dir.path().join("pieces.mtl").exists());

    let mut loaded = io::import_mesh(&input)?;
    let mut welder = Welder::new();
    welder.set_mark_regions(true);
    let summary = welder.weld(&mut loaded);
    assert_eq!(summary.regions, 2);
    assert_eq!(summary.removed_vertices, 3);
    io::export_mesh(&loaded, &output)?;
    assert!(dir.path().join("welded.mtl").exists());

    let reloaded = io::import_mesh(&output)?;
    assert_eq!(reloaded.vertex_count(), 15);
    assert_eq!(reloaded.face_count(), 16);
    let mut colors: Vec<_> = reloaded.face_keys().into_iter().filter_map(|f| reloaded.face_color(f)).collect();
    assert_eq!(colors.len(), 16);
    colors.dedup();
    assert_eq!(colors.len(), 2);
    Ok(())
}

#[test]
fn test_obj_reads_relative_indices_and_external_materials() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("paint.mtl"), "newmtl blue\nKd 0 0 1\n")?;
    let path = dir.path().join("tri.obj");
    std::fs::write(
        &path,
        "mtllib paint.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nusemtl blue\nf -4/1 -3/2 -2/3\nf 2//1 4//1 3//1\n",
    )?;

    let mesh = io::import_mesh(&path)?;
    assert_eq!(mesh.face_count(), 2);
    assert_eq!(mesh.edge_count(), 5);
    for face in mesh.face_keys() {
        assert_eq!(mesh.face_color(face), Some([0.0, 0.0, 1.0]));
    }
    Ok(())
}

/// Midpoints of flagged edges, sorted so meshes can be compared.
fn flagged_midpoints(mesh: &Mesh) -> Vec<Point3<f64>> {
    let mut midpoints: Vec<_> = mesh
        .edge_keys()
        .into_iter()
        .filter(|e| mesh.edge_flag(*e))
        .map(|e| {
            let [a, b] = mesh.edge_positions(e);
            Point3::from((a.coords + b.coords) / 2.0)
        })
        .collect();
    midpoints.sort_by(|p, q| {
        p.x.total_cmp(&q.x)
            .then(p.y.total_cmp(&q.y))
            .then(p.z.total_cmp(&q.z))
    });
    midpoints
}

#[test]
fn test_obj_keeps_split_flags() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("split.obj");

    let mut mesh = Primitive::square_fan(2, 1.0).to_mesh();
    let mut shifted = Primitive::square_fan(2, 1.0).to_mesh();
    shifted.translate(&Vector3::new(0.5, 0.25, 0.0));
    mesh.append(&shifted);

    let mut splitter = Splitter::new();
    splitter.set_flag_intersected_edges(true);
    let summary = splitter.split_faces(&mut mesh, &mut SegmentRecorder::new());
    assert!(summary.intersected_edges > 0);

    io::export_mesh(&mesh, &path)?;
    let loaded = io::import_mesh(&path)?;
    assert_eq!(loaded.edge_count(), mesh.edge_count());
    assert_eq!(flagged_midpoints(&loaded).len(), summary.intersected_edges);
    assert_eq!(flagged_midpoints(&loaded), flagged_midpoints(&mesh));
    Ok(())
}

#[test]
fn test_flagged_seam_welds_after_reload() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("seam.obj");

    let mut mesh = Primitive::square_fan(1, 1.0).to_mesh();
    let mut right = Primitive::square_fan(1, 1.0).to_mesh();
    right.translate(&Vector3::new(1.0 + 5e-5, 0.0, 0.0));
    mesh.append(&right);
    for edge in mesh.edge_keys() {
        let [a, b] = mesh.edge_positions(edge);
        if (a.x - 1.0).abs() < 1e-3 && (b.x - 1.0).abs() < 1e-3 {
            mesh.set_edge_flag(edge, true);
        }
    }
    assert_eq!(flagged_midpoints(&mesh).len(), 2);
    io::export_mesh(&mesh, &path)?;

    let mut loaded = io::import_mesh(&path)?;
    let mut welder = Welder::new();
    welder.set_candidate_edges(CandidateEdges::Flagged);
    let summary = welder.weld(&mut loaded);
    assert_eq!(summary.merged_edges, 1);
    assert_eq!(summary.removed_vertices, 2);
    assert_eq!(flagged_midpoints(&loaded).len(), 1);
    assert!(loaded.is_consistent());
    Ok(())
}

#[test]
fn test_unknown_extension_is_rejected() {
    let mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
    assert!(io::export_mesh(&mesh, "cube.ply").is_err());
    assert!(io::import_mesh("missing.obj").is_err());
    assert_eq!(MeshFormat::from_path("a.stl".as_ref()).unwrap(), MeshFormat::Stl);
}
