// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Welder
//!
//! Runs in two phases. Region labeling flood fills the edge graph and can
//! paint each connected piece with its own color, which makes unwelded seams
//! easy to spot. Edge welding then builds a tree over the mergeable edges
//! and, visiting edges in creation order, merges every coincident match into
//! the query edge.
//!
//! The tree is built once and never updated while the mesh is edited, so
//! both the outer loop and the matcher check liveness before reading an
//! edge.

use super::edge_matcher::{EdgeMatcher, EdgeNode};
use super::regions::RegionLabels;
use crate::geometry::{BoundingVolumeTree, DeletedElementTracker, EdgeKey, Mesh};
use crate::utils::DEFAULT_TOLERANCE;
use serde::{Deserialize, Serialize};

/// Which edges may be merged when `merge_any` is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateEdges {
    /// Edges with fewer than two adjacent faces.
    #[default]
    Perimeter,
    /// Only edges carrying the flag, whatever their face count.
    Flagged,
}

/// Outcome of one [`Welder::weld`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeldSummary {
    pub regions: usize,
    pub merged_edges: usize,
    pub removed_vertices: usize,
    pub removed_edges: usize,
    pub removed_faces: usize,
}

#[derive(Debug, Clone)]
pub struct Welder {
    absolute_tolerance: f64,
    relative_tolerance: f64,
    merge_any: bool,
    candidate_edges: CandidateEdges,
    mark_regions: bool,
    merged_edges: usize,
}

impl Default for Welder {
    fn default() -> Self {
        Self::new()
    }
}

impl Welder {
    pub fn new() -> Self {
        Self {
            absolute_tolerance: DEFAULT_TOLERANCE,
            relative_tolerance: DEFAULT_TOLERANCE,
            merge_any: false,
            candidate_edges: CandidateEdges::Perimeter,
            mark_regions: false,
            merged_edges: 0,
        }
    }

    pub fn set_absolute_tolerance(&mut self, absolute_tolerance: f64) {
        self.absolute_tolerance = absolute_tolerance;
    }

    pub fn absolute_tolerance(&self) -> f64 {
        self.absolute_tolerance
    }

    pub fn set_relative_tolerance(&mut self, relative_tolerance: f64) {
        self.relative_tolerance = relative_tolerance;
    }

    pub fn relative_tolerance(&self) -> f64 {
        self.relative_tolerance
    }

    /// Treat every edge as mergeable, regardless of face count or flag.
    pub fn set_merge_any(&mut self, merge_any: bool) {
        self.merge_any = merge_any;
    }

    pub fn merge_any(&self) -> bool {
        self.merge_any
    }

    pub fn set_candidate_edges(&mut self, candidate_edges: CandidateEdges) {
        self.candidate_edges = candidate_edges;
    }

    pub fn candidate_edges(&self) -> CandidateEdges {
        self.candidate_edges
    }

    /// Color faces by connected region before welding.
    pub fn set_mark_regions(&mut self, mark_regions: bool) {
        self.mark_regions = mark_regions;
    }

    pub fn mark_regions(&self) -> bool {
        self.mark_regions
    }

    /// Edges removed by the last [`weld`](Self::weld).
    pub fn merged_edges(&self) -> usize {
        self.merged_edges
    }

    pub fn weld(&mut self, mesh: &mut Mesh) -> WeldSummary {
        let vertices_before = mesh.vertex_count();
        let edges_before = mesh.edge_count();
        let faces_before = mesh.face_count();
        tracing::info!(
            vertices = vertices_before,
            edges = edges_before,
            faces = faces_before,
            absolute_tolerance = self.absolute_tolerance,
            relative_tolerance = self.relative_tolerance,
            "Starting weld"
        );

        let regions = {
            let labels = RegionLabels::label(mesh);
            if self.mark_regions {
                labels.paint_faces(mesh);
            }
            labels.region_count()
        };
        tracing::debug!(regions, "Labeled connected regions");

        let tree = self.build_edge_tree(mesh);
        let tracker = self.weld_edges(mesh, &tree);
        self.merged_edges = tracker.edge_count();

        debug_assert!(
            mesh.check_consistency().is_ok(),
            "weld left an inconsistent mesh: {:?}",
            mesh.check_consistency()
        );

        let summary = WeldSummary {
            regions,
            merged_edges: self.merged_edges,
            removed_vertices: vertices_before - mesh.vertex_count(),
            removed_edges: edges_before - mesh.edge_count(),
            removed_faces: faces_before - mesh.face_count(),
        };
        tracing::info!(
            regions = summary.regions,
            merged_edges = summary.merged_edges,
            removed_vertices = summary.removed_vertices,
            removed_faces = summary.removed_faces,
            "Weld complete"
        );
        summary
    }

    fn edge_can_be_merged(&self, mesh: &Mesh, edge: EdgeKey) -> bool {
        if self.merge_any {
            return true;
        }
        match self.candidate_edges {
            CandidateEdges::Flagged => mesh.edge_flag(edge),
            CandidateEdges::Perimeter => mesh.edge_face_count(edge) < 2,
        }
    }

    fn build_edge_tree(&self, mesh: &Mesh) -> BoundingVolumeTree<EdgeNode> {
        let nodes: Vec<EdgeNode> = mesh
            .edge_keys()
            .into_iter()
            .filter(|edge| self.edge_can_be_merged(mesh, *edge))
            .map(|edge| EdgeNode::new(mesh, edge))
            .collect();
        tracing::debug!(candidates = nodes.len(), "Built edge tree");
        BoundingVolumeTree::build(nodes)
    }

    fn weld_edges(&self, mesh: &mut Mesh, tree: &BoundingVolumeTree<EdgeNode>) -> DeletedElementTracker {
        let mut tracker = DeletedElementTracker::new();
        let matcher = EdgeMatcher::new(self.absolute_tolerance, self.relative_tolerance);

        // Snapshot first; merging deletes edges as we go.
        for edge in mesh.edge_keys() {
            if !mesh.contains_edge(edge) || !self.edge_can_be_merged(mesh, edge) {
                continue;
            }

            let matches = matcher.find_matches(mesh, tree, edge, |other| self.edge_can_be_merged(mesh, other));
            for matching in matches {
                // An earlier merge in this batch may have removed it.
                if !mesh.contains_edge(matching) || !mesh.contains_edge(edge) {
                    continue;
                }

                let [v0, v1] = mesh.edge_vertices(edge);
                let [w0, w1] = mesh.edge_vertices(matching);
                if v0 == w0 || v1 == w1 {
                    // Already in merge order.
                } else if v0 == w1 || v1 == w0 {
                    mesh.swap_edge_vertices(matching);
                } else {
                    let p0 = mesh.position(v0);
                    if (p0 - mesh.position(w1)).norm() < (p0 - mesh.position(w0)).norm() {
                        mesh.swap_edge_vertices(matching);
                    }
                }

                tracing::trace!(source = ?matching, target = ?edge, "Merging edge");
                mesh.merge_edge_into_edge(matching, edge, &mut tracker);
            }
        }

        tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::{Point3, Vector3};

    /// Two triangles sharing a diagonal that was built twice.
    fn split_square() -> Mesh {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        Mesh::from_indexed(&positions, &[vec![0, 1, 2], vec![3, 4, 5]]).unwrap()
    }

    #[test]
    fn test_weld_split_square() {
        let mut mesh = split_square();
        let mut welder = Welder::new();
        let summary = welder.weld(&mut mesh);

        assert_eq!(summary.regions, 2);
        assert_eq!(summary.removed_vertices, 2);
        assert_eq!(summary.removed_edges, 1);
        assert_eq!(summary.removed_faces, 0);
        assert_eq!(welder.merged_edges(), 1);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.edge_count(), 5);
        assert!(mesh.is_consistent());
    }

    #[test]
    fn test_weld_is_idempotent() {
        let mut mesh = split_square();
        let mut welder = Welder::new();
        welder.weld(&mut mesh);

        welder.set_merge_any(true);
        let summary = welder.weld(&mut mesh);
        assert_eq!(welder.merged_edges(), 0);
        assert_eq!(summary.regions, 1);
    }

    #[test]
    fn test_closed_edges_are_left_alone() {
        // Two coincident closed cubes: nothing is open, so nothing merges.
        let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        let copy = mesh.clone();
        mesh.append(&copy);

        let mut welder = Welder::new();
        let summary = welder.weld(&mut mesh);
        assert_eq!(summary.merged_edges, 0);
        assert_eq!(summary.regions, 2);
        assert_eq!(mesh.vertex_count(), 16);
    }

    #[test]
    fn test_flag_survives_merge() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(0.0, 1e-5, 0.0));
        let d = mesh.add_vertex(Point3::new(1.0, 1e-5, 0.0));
        let first = mesh.add_edge(a, b).unwrap();
        let second = mesh.add_edge(c, d).unwrap();
        mesh.set_edge_flag(second, true);

        // Both edges are open, so the default mode merges them.
        let mut welder = Welder::new();
        welder.weld(&mut mesh);

        assert!(mesh.contains_edge(first));
        assert!(!mesh.contains_edge(second));
        assert!(mesh.edge_flag(first));
        assert_eq!(mesh.vertex_count(), 2);
    }

    #[test]
    fn test_flagged_mode_ignores_unflagged_open_edges() {
        let mut mesh = split_square();
        let mut welder = Welder::new();
        welder.set_candidate_edges(CandidateEdges::Flagged);
        let summary = welder.weld(&mut mesh);

        assert_eq!(summary.merged_edges, 0);
        assert_eq!(mesh.vertex_count(), 6);

        // Flagging one side of the doubled diagonal is not enough.
        let diagonal = mesh.edge_keys()[2];
        mesh.set_edge_flag(diagonal, true);
        assert_eq!(welder.weld(&mut mesh).merged_edges, 0);

        for edge in mesh.edge_keys() {
            mesh.set_edge_flag(edge, true);
        }
        assert_eq!(welder.weld(&mut mesh).merged_edges, 1);
        assert_eq!(mesh.vertex_count(), 4);
        assert!(mesh.is_consistent());
    }

    #[test]
    fn test_mark_regions_colors_faces() {
        let mut mesh = split_square();
        let mut welder = Welder::new();
        welder.set_mark_regions(true);
        welder.weld(&mut mesh);

        let colors: Vec<_> = mesh.face_keys().iter().map(|f| mesh.face_color(*f)).collect();
        assert_eq!(colors.len(), 2);
        assert!(colors.iter().all(Option::is_some));
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn test_tolerance_limits_matches() {
        let mut mesh = split_square();
        let face = mesh.face_keys()[1];
        let moved: Vec<_> = mesh.face_vertices(face).to_vec();
        for v in moved {
            mesh.vertices[v].position.z += 0.01;
        }

        let mut welder = Welder::new();
        welder.set_absolute_tolerance(1e-3);
        welder.set_relative_tolerance(0.0);
        let summary = welder.weld(&mut mesh);
        assert_eq!(summary.merged_edges, 0);

        welder.set_absolute_tolerance(0.1);
        let summary = welder.weld(&mut mesh);
        assert_eq!(summary.merged_edges, 1);
    }
}
