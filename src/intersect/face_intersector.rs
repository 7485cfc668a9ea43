// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face intersector
//!
//! Wraps a [`BoundingVolumeTree`] of face handles with exact ray/polygon
//! tests. The tree caches each face's box when [`FaceIntersector::initialize`]
//! runs; the mesh itself is borrowed per query, so faces deleted in between
//! are recognized by their stale keys and skipped.

use crate::geometry::bvh::{BoundingBoxListener, TriangleBatchListener};
use crate::geometry::triangle_intersection::ray_segment_intersects_polygon;
use crate::geometry::{Bounded, BoundingBox, BoundingVolumeTree, FaceKey, Mesh, QueryStatistics, SizeStatistics};
use nalgebra::Point3;

/// Tree payload: a face handle and its box at build time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceNode {
    pub face: FaceKey,
    pub bbox: BoundingBox,
}

impl Bounded for FaceNode {
    fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
}

/// Optional veto over geometric hits. Returning false hides the face from
/// that query as if it were absent.
pub trait FaceFilter {
    fn allow_face_intersection_test(&self, face: FaceKey, t: f64) -> bool;
}

impl<F> FaceFilter for F
where
    F: Fn(FaceKey, f64) -> bool,
{
    fn allow_face_intersection_test(&self, face: FaceKey, t: f64) -> bool {
        self(face, t)
    }
}

/// Nearest accepted hit along a ray segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceHit {
    pub face: FaceKey,
    pub point: Point3<f64>,
    pub t: f64,
}

#[derive(Default)]
pub struct FaceIntersector {
    tree: BoundingVolumeTree<FaceNode>,
    filter: Option<Box<dyn FaceFilter>>,
}

impl FaceIntersector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_filter(&mut self, filter: Option<Box<dyn FaceFilter>>) {
        self.filter = filter;
    }

    /// Snapshot every live face of `mesh`.
    pub fn initialize(&mut self, mesh: &Mesh) {
        let nodes = mesh
            .face_keys()
            .into_iter()
            .map(|face| FaceNode {
                face,
                bbox: mesh.face_bounding_box(face),
            })
            .collect();
        self.tree.initialize(nodes);
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// True if any accepted face crosses the segment.
    pub fn occludes_ray_segment(&self, mesh: &Mesh, origin: &Point3<f64>, endpoint: &Point3<f64>) -> bool {
        let listener = |node: &FaceNode, origin: &Point3<f64>, endpoint: &Point3<f64>| {
            self.face_hit(mesh, node.face, origin, endpoint)
                .map_or(false, |t| self.allows(node.face, t))
        };
        self.tree.occludes_ray_segment(origin, endpoint, &listener)
    }

    /// Nearest accepted face crossing the segment.
    pub fn intersects_ray_segment(
        &self,
        mesh: &Mesh,
        origin: &Point3<f64>,
        endpoint: &Point3<f64>,
    ) -> Option<FaceHit> {
        let listener = |node: &FaceNode, origin: &Point3<f64>, endpoint: &Point3<f64>, t: &mut f64| {
            let Some(hit) = self.face_hit(mesh, node.face, origin, endpoint) else {
                return false;
            };
            // Farther than the best so far; the filter is not consulted.
            if hit > *t || !self.allows(node.face, hit) {
                return false;
            }
            *t = hit;
            true
        };

        self.tree
            .intersects_ray_segment(origin, endpoint, &listener)
            .map(|hit| FaceHit {
                face: hit.object.face,
                point: hit.point,
                t: hit.t,
            })
    }

    /// Offers each face node whose box overlaps a triangle of the batch.
    /// Nodes may name faces deleted since [`initialize`](Self::initialize).
    pub fn apply_to_triangle_vector_intersection<L>(&self, triangles: &[[Point3<f64>; 3]], listener: &mut L) -> bool
    where
        L: TriangleBatchListener<FaceNode> + ?Sized,
    {
        self.tree.apply_to_triangle_vector_intersection(triangles, listener)
    }

    /// Offers every face node whose box overlaps `bbox`. Nodes may name faces
    /// deleted since [`initialize`](Self::initialize).
    pub fn apply_to_bounding_box_intersection<L>(&self, bbox: &BoundingBox, listener: &mut L) -> bool
    where
        L: BoundingBoxListener<FaceNode> + ?Sized,
    {
        self.tree.apply_to_bounding_box_intersection(bbox, listener)
    }

    pub fn size_statistics(&self) -> &SizeStatistics {
        self.tree.size_statistics()
    }

    pub fn query_statistics(&self) -> QueryStatistics {
        self.tree.query_statistics()
    }

    pub fn queries(&self) -> usize {
        self.tree.queries()
    }

    pub fn reset_query_statistics(&self) {
        self.tree.reset_query_statistics();
    }

    fn face_hit(&self, mesh: &Mesh, face: FaceKey, origin: &Point3<f64>, endpoint: &Point3<f64>) -> Option<f64> {
        if !mesh.contains_face(face) {
            return None;
        }
        ray_segment_intersects_polygon(&mesh.face_positions(face), origin, endpoint)
    }

    fn allows(&self, face: FaceKey, t: f64) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |filter| filter.allow_face_intersection_test(face, t))
    }
}

impl std::fmt::Debug for FaceIntersector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceIntersector")
            .field("faces", &self.tree.len())
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}
