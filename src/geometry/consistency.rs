// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh validation utilities

use super::mesh::{EdgeKey, FaceKey, Mesh, VertexKey};
use ahash::AHashSet;
use std::hash::Hash;
use thiserror::Error;

/// First adjacency defect found by [`Mesh::check_consistency`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("vertex {0:?} lists edge {1:?}, which does not list it back")]
    VertexEdgeMismatch(VertexKey, EdgeKey),

    #[error("vertex {0:?} lists face {1:?}, which does not list it back")]
    VertexFaceMismatch(VertexKey, FaceKey),

    #[error("edge {0:?} lists face {1:?}, which does not list it back")]
    EdgeFaceMismatch(EdgeKey, FaceKey),

    #[error("edge {0:?} joins a vertex to itself")]
    DegenerateEdge(EdgeKey),

    #[error("face {0:?} has {1} vertices and {2} edges")]
    MalformedFace(FaceKey, usize, usize),

    #[error("face {0:?} edge {1} does not join consecutive face vertices")]
    FaceLoopMismatch(FaceKey, usize),

    #[error("duplicate adjacency on {0}")]
    DuplicateAdjacency(String),

    #[error("reference to a deleted element from {0}")]
    DanglingReference(String),
}

fn has_duplicates<K: Copy + Eq + Hash>(keys: &[K]) -> bool {
    let mut seen = AHashSet::with_capacity(keys.len());
    keys.iter().any(|key| !seen.insert(*key))
}

impl Mesh {
    /// Verify every back-reference, the absence of duplicate adjacency and
    /// the shape of every edge and face.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        for (vkey, vertex) in &self.vertices {
            if has_duplicates(&vertex.edges) || has_duplicates(&vertex.faces) {
                return Err(ConsistencyError::DuplicateAdjacency(format!("vertex {vkey:?}")));
            }
            for &e in &vertex.edges {
                let edge = self
                    .edges
                    .get(e)
                    .ok_or_else(|| ConsistencyError::DanglingReference(format!("vertex {vkey:?}")))?;
                if !edge.vertices.contains(&vkey) {
                    return Err(ConsistencyError::VertexEdgeMismatch(vkey, e));
                }
            }
            for &f in &vertex.faces {
                let face = self
                    .faces
                    .get(f)
                    .ok_or_else(|| ConsistencyError::DanglingReference(format!("vertex {vkey:?}")))?;
                if !face.vertices.contains(&vkey) {
                    return Err(ConsistencyError::VertexFaceMismatch(vkey, f));
                }
            }
        }

        for (ekey, edge) in &self.edges {
            let [a, b] = edge.vertices;
            if a == b {
                return Err(ConsistencyError::DegenerateEdge(ekey));
            }
            for v in edge.vertices {
                let vertex = self
                    .vertices
                    .get(v)
                    .ok_or_else(|| ConsistencyError::DanglingReference(format!("edge {ekey:?}")))?;
                if !vertex.edges.contains(&ekey) {
                    return Err(ConsistencyError::VertexEdgeMismatch(v, ekey));
                }
            }
            if has_duplicates(&edge.faces) {
                return Err(ConsistencyError::DuplicateAdjacency(format!("edge {ekey:?}")));
            }
            for &f in &edge.faces {
                let face = self
                    .faces
                    .get(f)
                    .ok_or_else(|| ConsistencyError::DanglingReference(format!("edge {ekey:?}")))?;
                if !face.edges.contains(&ekey) {
                    return Err(ConsistencyError::EdgeFaceMismatch(ekey, f));
                }
            }
        }

        for (fkey, face) in &self.faces {
            let count = face.vertices.len();
            if count < 3 || face.edges.len() != count {
                return Err(ConsistencyError::MalformedFace(fkey, count, face.edges.len()));
            }
            if has_duplicates(&face.vertices) || has_duplicates(&face.edges) {
                return Err(ConsistencyError::DuplicateAdjacency(format!("face {fkey:?}")));
            }
            for &v in &face.vertices {
                let vertex = self
                    .vertices
                    .get(v)
                    .ok_or_else(|| ConsistencyError::DanglingReference(format!("face {fkey:?}")))?;
                if !vertex.faces.contains(&fkey) {
                    return Err(ConsistencyError::VertexFaceMismatch(v, fkey));
                }
            }
            for (i, &e) in face.edges.iter().enumerate() {
                let edge = self
                    .edges
                    .get(e)
                    .ok_or_else(|| ConsistencyError::DanglingReference(format!("face {fkey:?}")))?;
                if !edge.faces.contains(&fkey) {
                    return Err(ConsistencyError::EdgeFaceMismatch(e, fkey));
                }
                let a = face.vertices[i];
                let b = face.vertices[(i + 1) % count];
                if edge.other_vertex(a) != Some(b) {
                    return Err(ConsistencyError::FaceLoopMismatch(fkey, i));
                }
            }
        }

        Ok(())
    }

    pub fn is_consistent(&self) -> bool {
        self.check_consistency().is_ok()
    }

    /// Edges shared by more than two faces
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edges.values().filter(|edge| edge.faces.len() > 2).count()
    }

    /// No edge is shared by more than two faces
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn triangle() -> Mesh {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        Mesh::from_indexed(&positions, &[vec![0, 1, 2]]).unwrap()
    }

    #[test]
    fn test_fresh_mesh_is_consistent() {
        let mesh = triangle();
        assert!(mesh.is_consistent());
        assert!(mesh.is_manifold());
        assert_eq!(Mesh::new().check_consistency(), Ok(()));
    }

    #[test]
    fn test_detects_missing_back_reference() {
        let mut mesh = triangle();
        let vertex = mesh.vertex_keys()[0];
        mesh.vertices[vertex].edges.clear();
        assert!(matches!(
            mesh.check_consistency(),
            Err(ConsistencyError::VertexEdgeMismatch(v, _)) if v == vertex
        ));
    }

    #[test]
    fn test_detects_duplicate_adjacency() {
        let mut mesh = triangle();
        let edge = mesh.edge_keys()[0];
        let face = mesh.face_keys()[0];
        mesh.edges[edge].faces.push(face);
        assert!(matches!(mesh.check_consistency(), Err(ConsistencyError::DuplicateAdjacency(_))));
    }

    #[test]
    fn test_detects_broken_face_loop() {
        let mut mesh = triangle();
        let face = mesh.face_keys()[0];
        mesh.faces[face].edges.swap(0, 1);
        assert!(matches!(
            mesh.check_consistency(),
            Err(ConsistencyError::FaceLoopMismatch(f, 0)) if f == face
        ));
    }
}
