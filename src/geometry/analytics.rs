// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh analytics and statistics

use super::Mesh;
use serde::{Deserialize, Serialize};

/// Topology and geometry summary of a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshStats {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub face_count: usize,
    /// Faces with exactly three vertices
    pub triangle_count: usize,
    /// Edges with fewer than two adjacent faces
    pub boundary_edge_count: usize,
    /// Edges with more than two adjacent faces
    pub non_manifold_edge_count: usize,
    pub is_watertight: bool,
    /// First adjacency defect, if any
    pub consistency_error: Option<String>,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    /// Length of the bounding box diagonal
    pub diameter: f64,
    pub surface_area: f64,
    /// Enclosed volume, meaningful only for closed meshes
    pub volume: f64,
}

impl MeshStats {
    pub fn empty() -> Self {
        Self {
            vertex_count: 0,
            edge_count: 0,
            face_count: 0,
            triangle_count: 0,
            boundary_edge_count: 0,
            non_manifold_edge_count: 0,
            is_watertight: false,
            consistency_error: None,
            bbox: [0.0; 6],
            diameter: 0.0,
            surface_area: 0.0,
            volume: 0.0,
        }
    }

    /// Analyze mesh topology and geometry
    pub fn analyze(mesh: &Mesh) -> Self {
        if mesh.vertex_count() == 0 {
            return Self::empty();
        }

        let bbox = mesh.bounding_box();
        Self {
            vertex_count: mesh.vertex_count(),
            edge_count: mesh.edge_count(),
            face_count: mesh.face_count(),
            triangle_count: mesh.faces.values().filter(|face| face.vertices.len() == 3).count(),
            boundary_edge_count: mesh.boundary_edge_count(),
            non_manifold_edge_count: mesh.non_manifold_edge_count(),
            is_watertight: mesh.is_watertight(),
            consistency_error: mesh.check_consistency().err().map(|e| e.to_string()),
            bbox: [bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z],
            diameter: bbox.diameter(),
            surface_area: mesh.surface_area(),
            volume: calculate_volume(mesh),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.consistency_error.is_none()
    }

    /// Pretty print statistics
    pub fn print(&self) {
        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║              MESH ANALYTICS                              ║");
        println!("╠══════════════════════════════════════════════════════════╣");
        println!("║ Vertices:        {:>10}                              ║", self.vertex_count);
        println!("║ Edges:           {:>10}                              ║", self.edge_count);
        println!("║ Faces:           {:>10}                              ║", self.face_count);
        println!("║ Triangles:       {:>10}                              ║", self.triangle_count);
        println!("║ Boundary edges:  {:>10}                              ║", self.boundary_edge_count);
        println!("║ Non-manifold:    {:>10}                              ║", self.non_manifold_edge_count);
        println!(
            "║ Watertight:      {:>10}                              ║",
            if self.is_watertight { "Yes" } else { "No" }
        );
        println!(
            "║ Consistent:      {:>10}                              ║",
            if self.is_consistent() { "Yes" } else { "No" }
        );
        println!("║                                                          ║");
        println!("║ Bounding Box:                                            ║");
        println!(
            "║   Min: ({:>10.4}, {:>10.4}, {:>10.4})             ║",
            self.bbox[0], self.bbox[1], self.bbox[2]
        );
        println!(
            "║   Max: ({:>10.4}, {:>10.4}, {:>10.4})             ║",
            self.bbox[3], self.bbox[4], self.bbox[5]
        );
        println!("║   Diameter:      {:>10.4}                              ║", self.diameter);
        println!("║                                                          ║");
        println!("║ Surface Area:    {:>10.4}                              ║", self.surface_area);
        println!("║ Volume:          {:>10.4}                              ║", self.volume);
        println!("╚══════════════════════════════════════════════════════════╝");
    }
}

/// Sum of signed tetrahedron volumes against the origin, polygons fanned
/// from their first vertex.
fn calculate_volume(mesh: &Mesh) -> f64 {
    let mut volume = 0.0;
    for key in mesh.faces.keys() {
        let points = mesh.face_positions(key);
        for i in 1..points.len() - 1 {
            let (v0, v1, v2) = (&points[0], &points[i], &points[i + 1]);
            volume += v0.coords.dot(&v1.coords.cross(&v2.coords)) / 6.0;
        }
    }
    volume.abs()
}
