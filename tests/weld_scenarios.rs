// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end weld scenarios

use meshmend::geometry::{Mesh, Primitive};
use meshmend::weld::{CandidateEdges, Welder};
use meshmend::MeshStats;
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Two 3x3 fans side by side, the second nudged by less than the tolerance.
fn adjacent_fans() -> Mesh {
    let mut mesh = Primitive::square_fan(3, 1.0).to_mesh();
    let mut right = Primitive::square_fan(3, 1.0).to_mesh();
    right.translate(&Vector3::new(3.0 + 5e-5, 0.0, 0.0));
    mesh.append(&right);
    mesh
}

#[test]
fn test_adjacent_fans_weld_along_shared_column() {
    let mut mesh = adjacent_fans();
    assert_eq!(mesh.vertex_count(), 32);
    assert_eq!(mesh.edge_count(), 66);

    let mut welder = Welder::new();
    let summary = welder.weld(&mut mesh);

    assert_eq!(summary.regions, 2);
    assert_eq!(summary.merged_edges, 3);
    assert_eq!(summary.removed_vertices, 4);
    assert_eq!(summary.removed_edges, 3);
    assert_eq!(summary.removed_faces, 0);

    let stats = MeshStats::analyze(&mesh);
    assert_eq!(stats.vertex_count, 28);
    assert_eq!(stats.edge_count, 63);
    assert_eq!(stats.face_count, 36);
    assert_eq!(stats.boundary_edge_count, 18);
    assert_eq!(stats.non_manifold_edge_count, 0);
    assert!(stats.is_consistent());
}

#[test]
fn test_second_weld_finds_nothing() {
    let mut mesh = adjacent_fans();
    let mut welder = Welder::new();
    welder.weld(&mut mesh);

    let summary = welder.weld(&mut mesh);
    assert_eq!(summary.regions, 1);
    assert_eq!(summary.merged_edges, 0);
    assert_eq!(summary.removed_vertices, 0);
}

#[test]
fn test_gap_wider_than_tolerance_is_kept() {
    let mut mesh = Primitive::square_fan(3, 1.0).to_mesh();
    let mut right = Primitive::square_fan(3, 1.0).to_mesh();
    right.translate(&Vector3::new(3.01, 0.0, 0.0));
    mesh.append(&right);

    let summary = Welder::new().weld(&mut mesh);
    assert_eq!(summary.merged_edges, 0);
    assert_eq!(mesh.vertex_count(), 32);
}

#[test]
fn test_merge_any_fuses_stacked_closed_shells() {
    let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
    let copy = mesh.clone();
    mesh.append(&copy);

    let mut welder = Welder::new();
    assert_eq!(welder.weld(&mut mesh).merged_edges, 0);

    welder.set_merge_any(true);
    let summary = welder.weld(&mut mesh);
    assert_eq!(summary.merged_edges, 18);
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.edge_count(), 18);
    assert!(mesh.is_consistent());
}

#[test]
fn test_flagged_mode_skips_unflagged_seams() {
    let mut mesh = adjacent_fans();
    let mut welder = Welder::new();
    welder.set_candidate_edges(CandidateEdges::Flagged);

    let summary = welder.weld(&mut mesh);
    assert_eq!(summary.merged_edges, 0);
    assert_eq!(mesh.vertex_count(), 32);

    for edge in mesh.edge_keys() {
        mesh.set_edge_flag(edge, true);
    }
    let summary = welder.weld(&mut mesh);
    assert_eq!(summary.merged_edges, 3);
    assert_eq!(mesh.vertex_count(), 28);
    assert!(mesh.is_consistent());
}

#[test]
fn test_flagged_mode_reaches_closed_edges() {
    // A closed cube and an open copy of one of its sides.
    let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
    for edge in mesh.edge_keys() {
        mesh.set_edge_flag(edge, true);
    }
    let side = mesh.face_keys()[0];
    let corners: Vec<_> = mesh.face_vertices(side).iter().map(|v| mesh.position(*v)).collect();
    let patch = Mesh::from_indexed(&corners, &[vec![0, 1, 2]]).unwrap();
    mesh.append(&patch);

    // Closed edges are out of reach of the default mode.
    let mut perimeter = Welder::new();
    let mut only_open = mesh.clone();
    assert_eq!(perimeter.weld(&mut only_open).merged_edges, 0);

    // The patch edges are open but unflagged, so they match nothing yet.
    let mut welder = Welder::new();
    welder.set_candidate_edges(CandidateEdges::Flagged);
    let mut unflagged_patch = mesh.clone();
    assert_eq!(welder.weld(&mut unflagged_patch).merged_edges, 0);

    for edge in mesh.edge_keys() {
        mesh.set_edge_flag(edge, true);
    }
    let summary = welder.weld(&mut mesh);
    assert_eq!(summary.merged_edges, 3);
    assert_eq!(mesh.vertex_count(), 8);
    assert!(mesh.is_consistent());
}

/// Split a fan into loose triangles with jittered corners, shuffled.
fn triangle_soup(cells: u32, jitter: f64, rng: &mut StdRng) -> Mesh {
    let indexed = Primitive::square_fan(cells, 1.0).to_mesh().to_indexed();
    let mut faces = indexed.faces.clone();
    faces.shuffle(rng);

    let mut soup = Mesh::new();
    for face in faces {
        let corners: Vec<_> = face
            .iter()
            .map(|i| {
                let p = indexed.positions[*i];
                let offset = Vector3::new(
                    rng.gen_range(-jitter..=jitter),
                    rng.gen_range(-jitter..=jitter),
                    rng.gen_range(-jitter..=jitter),
                );
                soup.add_vertex(Point3::from(p.coords + offset))
            })
            .collect();
        soup.add_face(&corners).unwrap();
    }
    soup
}

#[test]
fn test_random_soups_weld_back_into_the_grid() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for cells in 1..=4u32 {
        let n = cells as usize;
        let mut mesh = triangle_soup(cells, 2e-5, &mut rng);
        assert_eq!(mesh.vertex_count(), 6 * n * n);

        let summary = Welder::new().weld(&mut mesh);
        assert_eq!(summary.regions, 2 * n * n);

        let stats = MeshStats::analyze(&mesh);
        assert_eq!(stats.vertex_count, (n + 1) * (n + 1), "cells = {cells}");
        assert_eq!(stats.edge_count, 2 * n * (n + 1) + n * n, "cells = {cells}");
        assert_eq!(stats.face_count, 2 * n * n);
        assert_eq!(stats.boundary_edge_count, 4 * n);
        assert!(stats.is_consistent(), "{:?}", stats.consistency_error);

        let again = Welder::new().weld(&mut mesh);
        assert_eq!(again.regions, 1);
        assert_eq!(again.merged_edges, 0);
    }
}
