// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Topological edit primitives
//!
//! Every primitive records the elements it removes into a
//! [`DeletedElementTracker`], so that a caller running nested edits can tell
//! what disappeared underneath it. Preconditions are checked with debug
//! assertions only.

use super::mesh::{EdgeKey, FaceKey, Mesh, VertexKey};
use ahash::AHashSet;
use smallvec::SmallVec;

/// Elements removed during one pass.
#[derive(Debug, Clone, Default)]
pub struct DeletedElementTracker {
    vertices: AHashSet<VertexKey>,
    edges: AHashSet<EdgeKey>,
    faces: AHashSet<FaceKey>,
}

impl DeletedElementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_vertex(&self, key: VertexKey) -> bool {
        self.vertices.contains(&key)
    }

    pub fn has_edge(&self, key: EdgeKey) -> bool {
        self.edges.contains(&key)
    }

    pub fn has_face(&self, key: FaceKey) -> bool {
        self.faces.contains(&key)
    }

    pub fn add_vertex(&mut self, key: VertexKey) {
        self.vertices.insert(key);
    }

    pub fn add_edge(&mut self, key: EdgeKey) {
        self.edges.insert(key);
    }

    pub fn add_face(&mut self, key: FaceKey) {
        self.faces.insert(key);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty() && self.faces.is_empty()
    }

    /// Fold another tracker's records into this one.
    pub fn extend(&mut self, other: &DeletedElementTracker) {
        self.vertices.extend(other.vertices.iter().copied());
        self.edges.extend(other.edges.iter().copied());
        self.faces.extend(other.faces.iter().copied());
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
    }
}

impl Mesh {
    /// Remove a face and every reference to it.
    pub fn delete_face(&mut self, face: FaceKey, tracker: &mut DeletedElementTracker) {
        debug_assert!(self.faces.contains_key(face), "deleting a dead face");
        let Some(data) = self.faces.remove(face) else {
            return;
        };
        for v in &data.vertices {
            if let Some(vertex) = self.vertices.get_mut(*v) {
                vertex.faces.retain(|f| *f != face);
            }
        }
        for e in &data.edges {
            if let Some(edge) = self.edges.get_mut(*e) {
                edge.faces.retain(|f| *f != face);
            }
        }
        tracker.add_face(face);
    }

    /// Remove an edge. Faces still using it are deleted first.
    pub fn delete_edge(&mut self, edge: EdgeKey, tracker: &mut DeletedElementTracker) {
        debug_assert!(self.edges.contains_key(edge), "deleting a dead edge");
        let Some(faces) = self.edges.get(edge).map(|data| data.faces.clone()) else {
            return;
        };
        for face in faces {
            self.delete_face(face, tracker);
        }
        if let Some(data) = self.edges.remove(edge) {
            for v in data.vertices {
                if let Some(vertex) = self.vertices.get_mut(v) {
                    vertex.edges.retain(|e| *e != edge);
                }
            }
            tracker.add_edge(edge);
        }
    }

    /// Remove a vertex together with its edges and faces.
    pub fn delete_vertex(&mut self, vertex: VertexKey, tracker: &mut DeletedElementTracker) {
        debug_assert!(self.vertices.contains_key(vertex), "deleting a dead vertex");
        let Some(data) = self.vertices.get(vertex) else {
            return;
        };
        let edges = data.edges.clone();
        let faces = data.faces.clone();
        for edge in edges {
            if self.edges.contains_key(edge) {
                self.delete_edge(edge, tracker);
            }
        }
        for face in faces {
            if self.faces.contains_key(face) {
                self.delete_face(face, tracker);
            }
        }
        self.vertices.remove(vertex);
        tracker.add_vertex(vertex);
    }

    pub fn swap_edge_vertices(&mut self, edge: EdgeKey) {
        if let Some(data) = self.edges.get_mut(edge) {
            data.vertices.swap(0, 1);
        }
    }

    /// Merge `source` into `target`. If an edge joins them it is collapsed,
    /// otherwise the vertices are merged as nonadjacent.
    pub fn merge_vertex_into_vertex(&mut self, source: VertexKey, target: VertexKey, tracker: &mut DeletedElementTracker) {
        debug_assert_ne!(source, target);
        let shared: SmallVec<[EdgeKey; 2]> = self.vertices[source]
            .edges
            .iter()
            .copied()
            .filter(|e| self.edges[*e].other_vertex(source) == Some(target))
            .collect();

        let Some((&first, rest)) = shared.split_first() else {
            self.merge_vertex_into_nonadjacent_vertex(source, target, tracker);
            return;
        };

        // collapse_edge cannot handle parallel edges.
        for &other in rest {
            self.merge_edge_into_edge_with_shared_vertices(other, first, tracker);
        }

        // collapse_edge merges the first vertex into the second.
        self.edges[first].vertices = [source, target];
        self.collapse_edge(first, tracker);
    }

    /// Move every edge and face reference from `source` to `target`, then
    /// delete `source`. The vertices must share no edge or face.
    pub fn merge_vertex_into_nonadjacent_vertex(
        &mut self,
        source: VertexKey,
        target: VertexKey,
        tracker: &mut DeletedElementTracker,
    ) {
        debug_assert_ne!(source, target);
        debug_assert!(self.vertices.contains_key(target), "merging into a dead vertex");
        let Some(data) = self.vertices.remove(source) else {
            return;
        };

        for e in &data.edges {
            debug_assert!(!self.vertices[target].edges.contains(e), "vertices share an edge");
            for v in self.edges[*e].vertices.iter_mut() {
                if *v == source {
                    *v = target;
                }
            }
            self.vertices[target].edges.push(*e);
        }

        for f in &data.faces {
            debug_assert!(!self.faces[*f].vertices.contains(&target), "vertices share a face");
            // In place, so the loop order of the face is kept.
            for v in self.faces[*f].vertices.iter_mut() {
                if *v == source {
                    *v = target;
                }
            }
            self.vertices[target].faces.push(*f);
        }

        tracker.add_vertex(source);
    }

    /// Merge `source` into `target`, first end into first end and second
    /// into second. The edges must not share a vertex in crossed position.
    pub fn merge_edge_into_edge(&mut self, source: EdgeKey, target: EdgeKey, tracker: &mut DeletedElementTracker) {
        debug_assert_ne!(source, target);
        let [s0, s1] = self.edges[source].vertices;
        let [t0, t1] = self.edges[target].vertices;
        debug_assert!(s0 != t1 && t0 != s1, "edges share a vertex in crossed position");

        let mut local = DeletedElementTracker::new();
        if s0 != t0 {
            self.merge_vertex_into_vertex(s0, t0, &mut local);
        }
        if s1 != t1 && self.vertices.contains_key(s1) {
            self.merge_vertex_into_vertex(s1, t1, &mut local);
        }
        tracker.extend(&local);

        // Collapsing may already have merged the source away.
        if !local.has_edge(source) && self.edges.contains_key(target) {
            self.merge_edge_into_edge_with_shared_vertices(source, target, tracker);
        }
    }

    /// Move the faces of `source` onto `target` and delete `source`. Both
    /// edges must join the same two vertices.
    pub fn merge_edge_into_edge_with_shared_vertices(
        &mut self,
        source: EdgeKey,
        target: EdgeKey,
        tracker: &mut DeletedElementTracker,
    ) {
        debug_assert_ne!(source, target);
        let faces = std::mem::take(&mut self.edges[source].faces);
        for f in faces {
            debug_assert!(!self.edges[target].faces.contains(&f), "edges share a face");
            for e in self.faces[f].edges.iter_mut() {
                if *e == source {
                    *e = target;
                }
            }
            self.edges[target].faces.push(f);
        }

        let flagged = self.edges[source].flagged;
        self.edges[target].flagged |= flagged;
        self.delete_edge(source, tracker);
    }

    /// Collapse an edge whose adjacent faces are all triangles: the faces
    /// are deleted, the first vertex is merged into the second and each pair
    /// of remaining triangle sides is fused. Returns the surviving vertex.
    pub fn collapse_edge(&mut self, edge: EdgeKey, tracker: &mut DeletedElementTracker) -> VertexKey {
        let [v0, v1] = self.edges[edge].vertices;
        let faces = self.edges[edge].faces.clone();

        let mut pairs: Vec<(EdgeKey, EdgeKey)> = Vec::with_capacity(faces.len());
        for &face in &faces {
            debug_assert_eq!(self.faces[face].vertices.len(), 3, "collapse_edge needs triangles");
            let Some((mut first, mut second)) = self.triangle_other_edges(face, edge) else {
                continue;
            };
            // Sides touching v0 merge into sides touching v1, like the vertices.
            if self.edges[second].other_vertex(v0).is_some() {
                std::mem::swap(&mut first, &mut second);
            }
            // Two faces over the same three edges.
            if pairs.contains(&(first, second)) {
                continue;
            }
            // Chain a side that would otherwise merge into two others.
            if let Some(&(_, previous)) = pairs.iter().find(|(existing, _)| *existing == first) {
                first = second;
                second = previous;
            }
            pairs.push((first, second));
        }

        for face in faces {
            if self.faces.contains_key(face) {
                self.delete_face(face, tracker);
            }
        }
        self.delete_edge(edge, tracker);
        self.merge_vertex_into_nonadjacent_vertex(v0, v1, tracker);

        for (first, second) in pairs {
            if first != second && self.edges.contains_key(first) && self.edges.contains_key(second) {
                self.merge_edge_into_edge_with_shared_vertices(first, second, tracker);
            }
        }

        v1
    }

    fn triangle_other_edges(&self, face: FaceKey, edge: EdgeKey) -> Option<(EdgeKey, EdgeKey)> {
        let mut others = self.faces[face].edges.iter().copied().filter(|e| *e != edge);
        let first = others.next()?;
        let second = others.next()?;
        Some((first, second))
    }
}
