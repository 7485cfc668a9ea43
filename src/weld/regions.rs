// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Connected region labeling over the edge/vertex graph

use crate::geometry::{Color, EdgeKey, Mesh, VertexKey};
use slotmap::SecondaryMap;

/// Region id per edge and vertex, numbered from 1 in the creation order of
/// each region's first edge. Vertices without edges stay unlabeled.
#[derive(Debug, Clone, Default)]
pub struct RegionLabels {
    edges: SecondaryMap<EdgeKey, u32>,
    vertices: SecondaryMap<VertexKey, u32>,
    regions: u32,
}

impl RegionLabels {
    /// Flood fill every edge-connected component of `mesh`.
    pub fn label(mesh: &Mesh) -> Self {
        let mut labels = Self::default();
        let mut stack = Vec::new();

        for start in mesh.edge_keys() {
            if labels.edges.contains_key(start) {
                continue;
            }
            labels.regions += 1;
            let id = labels.regions;

            labels.edges.insert(start, id);
            stack.push(start);
            while let Some(edge) = stack.pop() {
                for vertex in mesh.edge_vertices(edge) {
                    if labels.vertices.contains_key(vertex) {
                        continue;
                    }
                    labels.vertices.insert(vertex, id);
                    for &next in mesh.vertices[vertex].edges() {
                        if !labels.edges.contains_key(next) {
                            labels.edges.insert(next, id);
                            stack.push(next);
                        }
                    }
                }
            }
        }

        labels
    }

    pub fn region_count(&self) -> usize {
        self.regions as usize
    }

    pub fn edge_region(&self, edge: EdgeKey) -> Option<u32> {
        self.edges.get(edge).copied()
    }

    pub fn vertex_region(&self, vertex: VertexKey) -> Option<u32> {
        self.vertices.get(vertex).copied()
    }

    /// Paint every face with the color of its region.
    pub fn paint_faces(&self, mesh: &mut Mesh) {
        for face in mesh.face_keys() {
            let region = mesh.face_edges(face).first().and_then(|e| self.edge_region(*e));
            if let Some(region) = region {
                mesh.set_face_color(face, Some(region_color(region)));
            }
        }
    }
}

/// Pseudorandom but stable pastel color for a region id.
pub fn region_color(region: u32) -> Color {
    let region = region as u64;
    let channel = |offset: u64, prime: u64| (((region + offset) * prime) % 128 + 128) as f32 / 255.0;
    [channel(7369, 7603), channel(5009, 4583), channel(7867, 3671)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Vector3;

    #[test]
    fn test_each_component_gets_one_region() {
        let mut mesh = Primitive::square_fan(2, 1.0).to_mesh();
        let mut other = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        other.translate(&Vector3::new(5.0, 0.0, 0.0));
        mesh.append(&other);
        mesh.add_vertex(nalgebra::Point3::new(9.0, 9.0, 9.0));

        let labels = RegionLabels::label(&mesh);
        assert_eq!(labels.region_count(), 2);

        let edges = mesh.edge_keys();
        let first = labels.edge_region(edges[0]).unwrap();
        let last = labels.edge_region(*edges.last().unwrap()).unwrap();
        assert_eq!(first, 1);
        assert_eq!(last, 2);
        assert!(edges.iter().all(|e| labels.edge_region(*e).is_some()));

        let isolated = *mesh.vertex_keys().last().unwrap();
        assert_eq!(labels.vertex_region(isolated), None);
    }

    #[test]
    fn test_region_color() {
        let [r, g, b] = region_color(1);
        assert_eq!(r, ((7370 * 7603) % 128 + 128) as f32 / 255.0);
        assert_eq!(g, ((5010 * 4583) % 128 + 128) as f32 / 255.0);
        assert_eq!(b, ((7868 * 3671) % 128 + 128) as f32 / 255.0);
        assert!([r, g, b].iter().all(|c| (0.5..=1.0).contains(c)));
    }

    #[test]
    fn test_paint_faces() {
        let mut mesh = Primitive::square_fan(1, 1.0).to_mesh();
        let labels = RegionLabels::label(&mesh);
        labels.paint_faces(&mut mesh);
        for face in mesh.face_keys() {
            assert_eq!(mesh.face_color(face), Some(region_color(1)));
        }
    }
}
