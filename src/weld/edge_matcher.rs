// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Coincident edge lookup

use crate::geometry::{Bounded, BoundingBox, BoundingVolumeTree, EdgeKey, Mesh};
use crate::utils::points_coincident;
use nalgebra::Point3;
use smallvec::SmallVec;

/// Tree payload: an edge handle and its box at build time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeNode {
    pub edge: EdgeKey,
    pub bbox: BoundingBox,
}

impl EdgeNode {
    pub fn new(mesh: &Mesh, edge: EdgeKey) -> Self {
        Self {
            edge,
            bbox: mesh.edge_bounding_box(edge),
        }
    }
}

impl Bounded for EdgeNode {
    fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
}

/// Finds edges whose endpoints coincide with a query edge's endpoints, in
/// either orientation.
#[derive(Debug, Clone, Copy)]
pub struct EdgeMatcher {
    absolute_tolerance: f64,
    relative_tolerance: f64,
}

impl EdgeMatcher {
    pub fn new(absolute_tolerance: f64, relative_tolerance: f64) -> Self {
        Self {
            absolute_tolerance,
            relative_tolerance,
        }
    }

    /// Live edges in `tree` matching `target`, in tree order. Nodes whose
    /// edge has been deleted since the tree was built are skipped, as are
    /// edges rejected by `is_candidate`.
    pub fn find_matches<P>(
        &self,
        mesh: &Mesh,
        tree: &BoundingVolumeTree<EdgeNode>,
        target: EdgeKey,
        is_candidate: P,
    ) -> SmallVec<[EdgeKey; 4]>
    where
        P: Fn(EdgeKey) -> bool,
    {
        let endpoints = mesh.edge_positions(target);
        let query = mesh
            .edge_bounding_box(target)
            .grown(self.absolute_tolerance, self.relative_tolerance);

        let mut matches = SmallVec::new();
        tree.apply_to_bounding_box_intersection(&query, &mut |node: &EdgeNode, _: &BoundingBox| {
            if node.edge == target || !mesh.contains_edge(node.edge) || !is_candidate(node.edge) {
                return false;
            }
            if self.endpoints_match(&endpoints, &mesh.edge_positions(node.edge)) {
                matches.push(node.edge);
            }
            // Keep going, there may be several matches.
            false
        });
        matches
    }

    pub fn endpoints_match(&self, a: &[Point3<f64>; 2], b: &[Point3<f64>; 2]) -> bool {
        let same = |p: &Point3<f64>, q: &Point3<f64>| {
            points_coincident(p, q, self.absolute_tolerance, self.relative_tolerance)
        };
        (same(&a[0], &b[0]) && same(&a[1], &b[1])) || (same(&a[0], &b[1]) && same(&a[1], &b[0]))
    }
}
