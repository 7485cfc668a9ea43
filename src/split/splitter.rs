// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Splitter
//!
//! For every edge, looks up the faces whose boxes overlap the edge's
//! tolerance-grown box and clips the edge to each non-adjacent, coplanar
//! triangle. Each surviving piece is handed to the retriangulator as a cut
//! segment on the crossed face. Faces that share a vertex or an edge with the
//! scanned edge are never tested, so neighbors meeting at a crease are not
//! reported.

use super::endpoint::EndpointIdentifier;
use super::retriangulator::{FaceLineSegment, Retriangulator};
use crate::geometry::triangle_intersection::{clip_coplanar_segment, ClippedSegment};
use crate::geometry::{append_cylinder_between, BoundingBox, Color, EdgeKey, FaceKey, Mesh, VertexKey};
use crate::intersect::{FaceIntersector, FaceNode};
use crate::utils::DEFAULT_TOLERANCE;
use ahash::AHashSet;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

const MARKER_DIVISIONS: u32 = 6;
const MARKER_RADIUS_RATIO: f64 = 0.001;
const MARKER_COLOR: Color = [1.0, 0.0, 0.0];

/// Outcome of one [`Splitter::split_faces`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SplitSummary {
    pub segments: usize,
    pub intersected_edges: usize,
    pub intersected_faces: usize,
    pub debug_cylinders: usize,
}

#[derive(Debug, Clone)]
pub struct Splitter {
    absolute_tolerance: f64,
    relative_tolerance: f64,
    mark_intersections: bool,
    flag_intersected_edges: bool,
    next_endpoint_index: u32,
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Splitter {
    pub fn new() -> Self {
        Self {
            absolute_tolerance: DEFAULT_TOLERANCE,
            relative_tolerance: DEFAULT_TOLERANCE,
            mark_intersections: false,
            flag_intersected_edges: false,
            next_endpoint_index: 0,
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

    /// Append a thin red cylinder along every intersection segment.
    pub fn set_mark_intersections(&mut self, mark_intersections: bool) {
        self.mark_intersections = mark_intersections;
    }

    pub fn mark_intersections(&self) -> bool {
        self.mark_intersections
    }

    /// Set the flag on every edge found crossing a face.
    pub fn set_flag_intersected_edges(&mut self, flag_intersected_edges: bool) {
        self.flag_intersected_edges = flag_intersected_edges;
    }

    pub fn flag_intersected_edges(&self) -> bool {
        self.flag_intersected_edges
    }

    /// Record every edge/face crossing with `retriangulator`, then let it
    /// rebuild the mesh. The mesh must consist of triangles only.
    pub fn split_faces<R>(&mut self, mesh: &mut Mesh, retriangulator: &mut R) -> SplitSummary
    where
        R: Retriangulator + ?Sized,
    {
        debug_assert!(mesh.all_faces_are_triangles(), "Splitter needs a triangle mesh");
        tracing::info!(
            faces = mesh.face_count(),
            edges = mesh.edge_count(),
            "Starting intersection search"
        );

        let mut intersector = FaceIntersector::new();
        intersector.initialize(mesh);

        let mut summary = SplitSummary::default();
        let mut intersected_faces = AHashSet::new();
        let mut intersected_edges = Vec::new();
        let mut markers = Vec::new();

        for edge in mesh.edge_keys() {
            let hits = self.crossings(mesh, &intersector, edge);
            if hits.is_empty() {
                continue;
            }

            let ends = mesh.edge_vertices(edge);
            for (face, clipped) in hits {
                let endpoints = [
                    self.endpoint_identifier(mesh, face, ends[0], clipped.clipping_edges[0]),
                    self.endpoint_identifier(mesh, face, ends[1], clipped.clipping_edges[1]),
                ];
                tracing::debug!(?edge, ?face, "Edge crosses face");
                retriangulator.add_face_line_segment(face, FaceLineSegment::new(clipped.points, endpoints));

                summary.segments += 1;
                intersected_faces.insert(face);
                if self.mark_intersections {
                    markers.push(clipped.points);
                }
            }
            intersected_edges.push(edge);
        }

        summary.intersected_edges = intersected_edges.len();
        summary.intersected_faces = intersected_faces.len();
        tracing::debug!(
            bounding_box_tests = intersector.query_statistics().bounding_box_tests,
            queries = intersector.queries(),
            "Face tree queries"
        );

        if self.flag_intersected_edges {
            for edge in intersected_edges {
                mesh.set_edge_flag(edge, true);
            }
        }

        retriangulator.retriangulate(mesh);

        if !markers.is_empty() {
            summary.debug_cylinders = append_markers(mesh, &markers);
        }

        tracing::info!(
            segments = summary.segments,
            intersected_edges = summary.intersected_edges,
            intersected_faces = summary.intersected_faces,
            "Intersection search complete"
        );
        summary
    }

    /// Clipped pieces of `edge` on every non-adjacent candidate face.
    fn crossings(
        &self,
        mesh: &Mesh,
        intersector: &FaceIntersector,
        edge: EdgeKey,
    ) -> Vec<(FaceKey, ClippedSegment)> {
        let (absolute, relative) = (self.absolute_tolerance, self.relative_tolerance);
        let [v0, v1] = mesh.edge_vertices(edge);
        let segment = mesh.edge_positions(edge);
        let query = mesh.edge_bounding_box(edge).grown(absolute, relative);

        let mut hits = Vec::new();
        intersector.apply_to_bounding_box_intersection(&query, &mut |node: &FaceNode, _: &BoundingBox| {
            let face = node.face;
            if !mesh.contains_face(face)
                || mesh.face_has_edge(face, edge)
                || mesh.face_has_vertex(face, v0)
                || mesh.face_has_vertex(face, v1)
            {
                return false;
            }
            if let Some(clipped) = mesh
                .triangle_positions(face)
                .and_then(|triangle| clip_coplanar_segment(&triangle, &segment, absolute, relative))
            {
                hits.push((face, clipped));
            }
            false
        });
        hits
    }

    /// The mesh vertex itself when that end was not clipped, otherwise the
    /// clipping edge of `face` with a fresh index.
    fn endpoint_identifier(
        &mut self,
        mesh: &Mesh,
        face: FaceKey,
        vertex: VertexKey,
        clipping_edge: Option<usize>,
    ) -> EndpointIdentifier {
        match clipping_edge {
            Some(index) => {
                let id = EndpointIdentifier::EdgeAndIndex(mesh.face_edges(face)[index], self.next_endpoint_index);
                self.next_endpoint_index += 1;
                id
            }
            None => EndpointIdentifier::Vertex(vertex),
        }
    }
}

fn append_markers(mesh: &mut Mesh, markers: &[[Point3<f64>; 2]]) -> usize {
    let radius = mesh.bounding_box().diameter() * MARKER_RADIUS_RATIO;
    markers
        .iter()
        .filter(|[p0, p1]| {
            !append_cylinder_between(mesh, p0, p1, radius, MARKER_DIVISIONS, Some(MARKER_COLOR)).is_empty()
        })
        .count()
}
