// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Retriangulator interface and a recording implementation

use super::endpoint::EndpointIdentifier;
use crate::geometry::{FaceKey, Mesh};
use nalgebra::Point3;
use slotmap::SecondaryMap;

/// A segment on a face along which the face must be cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceLineSegment {
    pub points: [Point3<f64>; 2],
    pub endpoints: [EndpointIdentifier; 2],
}

impl FaceLineSegment {
    pub fn new(points: [Point3<f64>; 2], endpoints: [EndpointIdentifier; 2]) -> Self {
        Self { points, endpoints }
    }

    pub fn length(&self) -> f64 {
        (self.points[1] - self.points[0]).norm()
    }

    pub fn swap_endpoints(&mut self) {
        self.points.swap(0, 1);
        self.endpoints.swap(0, 1);
    }
}

/// Receives cut segments per face, then rebuilds the affected faces.
pub trait Retriangulator {
    fn add_face_line_segment(&mut self, face: FaceKey, segment: FaceLineSegment);

    /// Called once after every segment has been added.
    fn retriangulate(&mut self, mesh: &mut Mesh);
}

/// Keeps every segment it is given and leaves the mesh untouched.
#[derive(Debug, Clone, Default)]
pub struct SegmentRecorder {
    segments: SecondaryMap<FaceKey, Vec<FaceLineSegment>>,
    finalized: bool,
}

impl SegmentRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self, face: FaceKey) -> &[FaceLineSegment] {
        self.segments.get(face).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Faces with at least one segment.
    pub fn faces(&self) -> impl Iterator<Item = FaceKey> + '_ {
        self.segments.keys()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.values().map(Vec::len).sum()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl Retriangulator for SegmentRecorder {
    fn add_face_line_segment(&mut self, face: FaceKey, segment: FaceLineSegment) {
        if let Some(entry) = self.segments.entry(face) {
            entry.or_default().push(segment);
        }
    }

    fn retriangulate(&mut self, mesh: &mut Mesh) {
        self.finalized = true;
        let stale = self.segments.keys().filter(|face| !mesh.contains_face(*face)).count();
        tracing::info!(
            faces = self.segments.len(),
            segments = self.segment_count(),
            stale_faces = stale,
            "Recorded intersection segments"
        );
    }
}
