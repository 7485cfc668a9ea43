// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygon mesh with explicit vertex/edge/face adjacency.
//!
//! Elements live in slot maps, so every key carries a generation: a key to an
//! element that has since been deleted is simply not `contains_*` any more,
//! even if its slot was reused. Every element is also stamped with a creation
//! serial, which gives passes a stable processing order independent of slot
//! reuse.

use super::BoundingBox;
use crate::error::{MeshError, Result};
use nalgebra::{Point3, Vector3};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Key for a mesh vertex.
    pub struct VertexKey;

    /// Key for an edge joining two vertices.
    pub struct EdgeKey;

    /// Key for a polygonal face.
    pub struct FaceKey;
}

/// RGB color with components in `[0, 1]`.
pub type Color = [f32; 3];

/// Vertex with position and upward adjacency
#[derive(Debug, Clone)]
pub struct VertexData {
    pub position: Point3<f64>,
    pub(crate) edges: SmallVec<[EdgeKey; 6]>,
    pub(crate) faces: SmallVec<[FaceKey; 6]>,
    pub(crate) serial: u64,
}

impl VertexData {
    pub fn edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    pub fn faces(&self) -> &[FaceKey] {
        &self.faces
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }
}

/// Edge with its two ordered end vertices and adjacent faces
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub(crate) vertices: [VertexKey; 2],
    pub(crate) faces: SmallVec<[FaceKey; 2]>,
    pub(crate) flagged: bool,
    pub(crate) serial: u64,
}

impl EdgeData {
    pub fn vertices(&self) -> [VertexKey; 2] {
        self.vertices
    }

    pub fn faces(&self) -> &[FaceKey] {
        &self.faces
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// The end opposite `vertex`, if `vertex` is an end of this edge.
    pub fn other_vertex(&self, vertex: VertexKey) -> Option<VertexKey> {
        match self.vertices {
            [a, b] if a == vertex => Some(b),
            [a, b] if b == vertex => Some(a),
            _ => None,
        }
    }
}

/// Face as a closed vertex loop. Edge `i` joins vertex `i` and vertex `i + 1`.
#[derive(Debug, Clone)]
pub struct FaceData {
    pub(crate) vertices: Vec<VertexKey>,
    pub(crate) edges: Vec<EdgeKey>,
    pub(crate) color: Option<Color>,
    pub(crate) serial: u64,
}

impl FaceData {
    pub fn vertices(&self) -> &[VertexKey] {
        &self.vertices
    }

    pub fn edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }
}

/// Flat, index-based copy of a mesh used by the file codecs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedMesh {
    pub positions: Vec<Point3<f64>>,
    pub faces: Vec<Vec<usize>>,
    pub colors: Vec<Option<Color>>,
    /// Vertex index pairs of flagged edges.
    pub flagged_edges: Vec<[usize; 2]>,
}

/// Polygon mesh with adjacency
#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) vertices: SlotMap<VertexKey, VertexData>,
    pub(crate) edges: SlotMap<EdgeKey, EdgeData>,
    pub(crate) faces: SlotMap<FaceKey, FaceData>,
    next_serial: u64,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            faces: SlotMap::with_key(),
            next_serial: 0,
        }
    }

    /// Build a mesh from positions and polygon index loops.
    pub fn from_indexed(positions: &[Point3<f64>], polygons: &[Vec<usize>]) -> Result<Self> {
        let mut mesh = Self::new();
        let keys: Vec<VertexKey> = positions.iter().map(|p| mesh.add_vertex(*p)).collect();
        for polygon in polygons {
            let loop_keys = polygon
                .iter()
                .map(|&index| {
                    keys.get(index).copied().ok_or(MeshError::InvalidVertexIndex {
                        index: index as i64,
                        count: keys.len(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            mesh.add_face(&loop_keys)?;
        }
        Ok(mesh)
    }

    /// Flatten into index form. Vertices and faces keep creation order;
    /// vertices referenced by no face are kept as well.
    pub fn to_indexed(&self) -> IndexedMesh {
        let vertex_keys = self.vertex_keys();
        let mut index_of = slotmap::SecondaryMap::with_capacity(vertex_keys.len());
        let mut positions = Vec::with_capacity(vertex_keys.len());
        for (index, key) in vertex_keys.iter().enumerate() {
            index_of.insert(*key, index);
            positions.push(self.vertices[*key].position);
        }

        let mut faces = Vec::with_capacity(self.faces.len());
        let mut colors = Vec::with_capacity(self.faces.len());
        for key in self.face_keys() {
            let face = &self.faces[key];
            faces.push(face.vertices.iter().map(|v| index_of[*v]).collect());
            colors.push(face.color);
        }

        let flagged_edges = self
            .edge_keys()
            .into_iter()
            .filter(|key| self.edges[*key].flagged)
            .map(|key| self.edges[key].vertices.map(|v| index_of[v]))
            .collect();

        IndexedMesh {
            positions,
            faces,
            colors,
            flagged_edges,
        }
    }

    fn next_serial(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }

    /// Add a vertex and return its key
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexKey {
        let serial = self.next_serial();
        self.vertices.insert(VertexData {
            position,
            edges: SmallVec::new(),
            faces: SmallVec::new(),
            serial,
        })
    }

    /// Return the edge joining `a` and `b`, creating it if needed.
    pub fn add_edge(&mut self, a: VertexKey, b: VertexKey) -> Result<EdgeKey> {
        if !self.vertices.contains_key(a) || !self.vertices.contains_key(b) {
            return Err(MeshError::DeadVertex);
        }
        if a == b {
            return Err(MeshError::RepeatedVertex);
        }
        Ok(self.find_edge(a, b).unwrap_or_else(|| self.create_edge(a, b)))
    }

    pub(crate) fn create_edge(&mut self, a: VertexKey, b: VertexKey) -> EdgeKey {
        let serial = self.next_serial();
        let edge = self.edges.insert(EdgeData {
            vertices: [a, b],
            faces: SmallVec::new(),
            flagged: false,
            serial,
        });
        self.vertices[a].edges.push(edge);
        self.vertices[b].edges.push(edge);
        edge
    }

    /// Add a face over a closed vertex loop. Edges between consecutive
    /// vertices are reused when they already exist.
    pub fn add_face(&mut self, vertices: &[VertexKey]) -> Result<FaceKey> {
        if vertices.len() < 3 {
            return Err(MeshError::DegenerateFace { vertices: vertices.len() });
        }
        if vertices.iter().any(|v| !self.vertices.contains_key(*v)) {
            return Err(MeshError::DeadVertex);
        }
        for (i, v) in vertices.iter().enumerate() {
            if vertices[i + 1..].contains(v) {
                return Err(MeshError::RepeatedVertex);
            }
        }

        let edges: Vec<EdgeKey> = (0..vertices.len())
            .map(|i| {
                let a = vertices[i];
                let b = vertices[(i + 1) % vertices.len()];
                self.find_edge(a, b).unwrap_or_else(|| self.create_edge(a, b))
            })
            .collect();

        let serial = self.next_serial();
        let face = self.faces.insert(FaceData {
            vertices: vertices.to_vec(),
            edges: edges.clone(),
            color: None,
            serial,
        });
        for v in vertices {
            self.vertices[*v].faces.push(face);
        }
        for e in edges {
            self.edges[e].faces.push(face);
        }
        Ok(face)
    }

    /// Copy every element of `other` into this mesh, keeping attributes.
    pub fn append(&mut self, other: &Mesh) {
        let mut vertex_map = slotmap::SecondaryMap::new();
        for key in other.vertex_keys() {
            vertex_map.insert(key, self.add_vertex(other.vertices[key].position));
        }
        for key in other.edge_keys() {
            let edge = &other.edges[key];
            let [a, b] = edge.vertices;
            let (a, b) = (vertex_map[a], vertex_map[b]);
            let new_edge = self.find_edge(a, b).unwrap_or_else(|| self.create_edge(a, b));
            self.edges[new_edge].flagged |= edge.flagged;
        }
        for key in other.face_keys() {
            let face = &other.faces[key];
            let loop_keys: Vec<VertexKey> = face.vertices.iter().map(|v| vertex_map[*v]).collect();
            // The source face was valid, so its image is too.
            if let Ok(new_face) = self.add_face(&loop_keys) {
                self.faces[new_face].color = face.color;
            }
        }
    }

    /// Translate every vertex by `offset`.
    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for vertex in self.vertices.values_mut() {
            vertex.position += *offset;
        }
    }

    /// Edge joining `a` and `b` in either orientation.
    pub fn find_edge(&self, a: VertexKey, b: VertexKey) -> Option<EdgeKey> {
        let vertex = self.vertices.get(a)?;
        vertex
            .edges
            .iter()
            .copied()
            .find(|e| self.edges.get(*e).is_some_and(|edge| edge.other_vertex(a) == Some(b)))
    }

    pub fn contains_vertex(&self, key: VertexKey) -> bool {
        self.vertices.contains_key(key)
    }

    pub fn contains_edge(&self, key: EdgeKey) -> bool {
        self.edges.contains_key(key)
    }

    pub fn contains_face(&self, key: FaceKey) -> bool {
        self.faces.contains_key(key)
    }

    pub fn vertex(&self, key: VertexKey) -> Option<&VertexData> {
        self.vertices.get(key)
    }

    pub fn edge(&self, key: EdgeKey) -> Option<&EdgeData> {
        self.edges.get(key)
    }

    pub fn face(&self, key: FaceKey) -> Option<&FaceData> {
        self.faces.get(key)
    }

    /// Position of a live vertex.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not live.
    pub fn position(&self, key: VertexKey) -> Point3<f64> {
        self.vertices[key].position
    }

    pub fn edge_vertices(&self, key: EdgeKey) -> [VertexKey; 2] {
        self.edges[key].vertices
    }

    pub fn edge_positions(&self, key: EdgeKey) -> [Point3<f64>; 2] {
        let [a, b] = self.edges[key].vertices;
        [self.position(a), self.position(b)]
    }

    pub fn edge_face_count(&self, key: EdgeKey) -> usize {
        self.edges[key].faces.len()
    }

    pub fn face_vertices(&self, key: FaceKey) -> &[VertexKey] {
        &self.faces[key].vertices
    }

    pub fn face_edges(&self, key: FaceKey) -> &[EdgeKey] {
        &self.faces[key].edges
    }

    pub fn face_positions(&self, key: FaceKey) -> Vec<Point3<f64>> {
        self.faces[key].vertices.iter().map(|v| self.position(*v)).collect()
    }

    /// Corner positions of a triangular face, `None` for other polygons.
    pub fn triangle_positions(&self, key: FaceKey) -> Option<[Point3<f64>; 3]> {
        match self.faces[key].vertices.as_slice() {
            [a, b, c] => Some([self.position(*a), self.position(*b), self.position(*c)]),
            _ => None,
        }
    }

    pub fn face_has_vertex(&self, face: FaceKey, vertex: VertexKey) -> bool {
        self.faces[face].vertices.contains(&vertex)
    }

    pub fn face_has_edge(&self, face: FaceKey, edge: EdgeKey) -> bool {
        self.faces[face].edges.contains(&edge)
    }

    pub fn edge_has_face(&self, edge: EdgeKey, face: FaceKey) -> bool {
        self.edges[edge].faces.contains(&face)
    }

    pub fn edge_flag(&self, key: EdgeKey) -> bool {
        self.edges.get(key).is_some_and(|edge| edge.flagged)
    }

    pub fn set_edge_flag(&mut self, key: EdgeKey, flagged: bool) {
        if let Some(edge) = self.edges.get_mut(key) {
            edge.flagged = flagged;
        }
    }

    pub fn face_color(&self, key: FaceKey) -> Option<Color> {
        self.faces.get(key).and_then(|face| face.color)
    }

    pub fn set_face_color(&mut self, key: FaceKey, color: Option<Color>) {
        if let Some(face) = self.faces.get_mut(key) {
            face.color = color;
        }
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get face count
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Live vertex keys in creation order
    pub fn vertex_keys(&self) -> Vec<VertexKey> {
        let mut keys: Vec<_> = self.vertices.iter().map(|(k, v)| (v.serial, k)).collect();
        keys.sort_unstable_by_key(|(serial, _)| *serial);
        keys.into_iter().map(|(_, k)| k).collect()
    }

    /// Live edge keys in creation order
    pub fn edge_keys(&self) -> Vec<EdgeKey> {
        let mut keys: Vec<_> = self.edges.iter().map(|(k, e)| (e.serial, k)).collect();
        keys.sort_unstable_by_key(|(serial, _)| *serial);
        keys.into_iter().map(|(_, k)| k).collect()
    }

    /// Live face keys in creation order
    pub fn face_keys(&self) -> Vec<FaceKey> {
        let mut keys: Vec<_> = self.faces.iter().map(|(k, f)| (f.serial, k)).collect();
        keys.sort_unstable_by_key(|(serial, _)| *serial);
        keys.into_iter().map(|(_, k)| k).collect()
    }

    pub fn edge_bounding_box(&self, key: EdgeKey) -> BoundingBox {
        BoundingBox::from_points(&self.edge_positions(key))
    }

    pub fn face_bounding_box(&self, key: FaceKey) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for v in &self.faces[key].vertices {
            bbox.expand_to_include(&self.vertices[*v].position);
        }
        bbox
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.values().map(|v| &v.position))
    }

    /// Edges with fewer than two adjacent faces
    pub fn boundary_edge_count(&self) -> usize {
        self.edges.values().filter(|edge| edge.faces.len() < 2).count()
    }

    /// Non-empty and free of boundary edges
    pub fn is_watertight(&self) -> bool {
        !self.faces.is_empty() && self.boundary_edge_count() == 0
    }

    pub fn all_faces_are_triangles(&self) -> bool {
        self.faces.values().all(|face| face.vertices.len() == 3)
    }

    /// Total area, with polygons fanned from their first vertex
    pub fn surface_area(&self) -> f64 {
        self.faces
            .keys()
            .map(|key| {
                let points = self.face_positions(key);
                (1..points.len() - 1)
                    .map(|i| (points[i] - points[0]).cross(&(points[i + 1] - points[0])).norm() * 0.5)
                    .sum::<f64>()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_pair() -> Mesh {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        Mesh::from_indexed(&positions, &[vec![0, 1, 2, 3], vec![1, 4, 5, 2]]).unwrap()
    }

    #[test]
    fn test_add_face_shares_edges() {
        let mesh = quad_pair();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.edge_count(), 7);
        assert_eq!(mesh.boundary_edge_count(), 6);
        assert!(!mesh.is_watertight());
        assert!(!mesh.all_faces_are_triangles());
    }

    #[test]
    fn test_face_edges_follow_vertex_order() {
        let mesh = quad_pair();
        let face = mesh.face_keys()[0];
        let vertices = mesh.face_vertices(face).to_vec();
        for (i, edge) in mesh.face_edges(face).iter().enumerate() {
            let expected = mesh.find_edge(vertices[i], vertices[(i + 1) % vertices.len()]);
            assert_eq!(expected, Some(*edge));
        }
    }

    #[test]
    fn test_add_face_rejects_bad_loops() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        assert!(matches!(mesh.add_face(&[a, b]), Err(MeshError::DegenerateFace { vertices: 2 })));
        assert!(matches!(mesh.add_face(&[a, b, a]), Err(MeshError::RepeatedVertex)));
        assert!(matches!(
            Mesh::from_indexed(&[Point3::origin()], &[vec![0, 1, 2]]),
            Err(MeshError::InvalidVertexIndex { index: 1, count: 1 })
        ));
    }

    #[test]
    fn test_keys_are_creation_ordered() {
        let mesh = quad_pair();
        let serials: Vec<u64> = mesh.edge_keys().iter().map(|e| mesh.edge(*e).unwrap().serial()).collect();
        let mut sorted = serials.clone();
        sorted.sort_unstable();
        assert_eq!(serials, sorted);
    }

    #[test]
    fn test_indexed_form_keeps_colors_and_flags() {
        let mut mesh = quad_pair();
        let face = mesh.face_keys()[1];
        mesh.set_face_color(face, Some([1.0, 0.0, 0.0]));
        let keys = mesh.vertex_keys();
        let shared = mesh.find_edge(keys[2], keys[1]).unwrap();
        mesh.set_edge_flag(shared, true);

        let indexed = mesh.to_indexed();
        assert_eq!(indexed.faces, vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]]);
        assert_eq!(indexed.colors, vec![None, Some([1.0, 0.0, 0.0])]);
        assert_eq!(indexed.flagged_edges, vec![[1, 2]]);
    }

    #[test]
    fn test_append_and_area() {
        let mut mesh = quad_pair();
        let mut other = quad_pair();
        other.translate(&Vector3::new(0.0, 0.0, 5.0));
        mesh.append(&other);

        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.face_count(), 4);
        assert!((mesh.surface_area() - 4.0).abs() < 1e-12);
        assert!((mesh.bounding_box().max.z - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_edge_flags() {
        let mut mesh = quad_pair();
        let edge = mesh.edge_keys()[0];
        assert!(!mesh.edge_flag(edge));
        mesh.set_edge_flag(edge, true);
        assert!(mesh.edge_flag(edge));
    }
}
