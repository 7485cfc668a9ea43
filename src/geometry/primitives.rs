// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator

use super::mesh::{Color, FaceKey, Mesh, VertexKey};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Geometric primitives. Every variant produces a closed or open triangle
/// mesh with shared vertices and outward (counter-clockwise) winding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Sphere { radius: f64, segments: u32 },
    Cylinder { height: f64, radius: f64, segments: u32 },
    /// Open `cells` x `cells` grid of squares in the XY plane, each square
    /// split into two triangles along its diagonal.
    SquareFan { cells: u32, cell_size: f64 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn sphere(radius: f64, segments: u32) -> Self {
        let segments = if segments > 0 { segments.max(3) } else { 32 };
        Self::Sphere { radius, segments }
    }

    pub fn cylinder(height: f64, radius: f64, segments: u32) -> Self {
        let segments = if segments > 0 { segments.max(3) } else { 32 };
        Self::Cylinder {
            height,
            radius,
            segments,
        }
    }

    pub fn square_fan(cells: u32, cell_size: f64) -> Self {
        Self::SquareFan {
            cells: cells.max(1),
            cell_size,
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        let (positions, triangles) = match *self {
            Self::Cube { size, center } => cube_geometry(size, center),
            Self::Sphere { radius, segments } => sphere_geometry(radius, segments.max(3)),
            Self::Cylinder {
                height,
                radius,
                segments,
            } => cylinder_geometry(
                &Point3::origin(),
                &Vector3::new(0.0, 0.0, height),
                &Vector3::x(),
                &Vector3::y(),
                radius,
                segments.max(3),
            ),
            Self::SquareFan { cells, cell_size } => square_fan_geometry(cells.max(1), cell_size),
        };

        let mut mesh = Mesh::new();
        append_triangles(&mut mesh, &positions, &triangles, None);
        mesh
    }
}

/// Append a capped cylinder whose axis runs from `p0` to `p1`. Returns the
/// new faces; nothing is added when the endpoints coincide.
pub fn append_cylinder_between(
    mesh: &mut Mesh,
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    radius: f64,
    divisions: u32,
    color: Option<Color>,
) -> Vec<FaceKey> {
    let axis = p1 - p0;
    let length = axis.norm();
    if length == 0.0 {
        return Vec::new();
    }
    let direction = axis / length;

    // Any vector not parallel to the axis seeds the cross-section frame.
    let seed = if direction.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = direction.cross(&seed).normalize();
    let v = direction.cross(&u);

    let (positions, triangles) = cylinder_geometry(p0, &axis, &u, &v, radius, divisions.max(3));
    append_triangles(mesh, &positions, &triangles, color)
}

fn append_triangles(
    mesh: &mut Mesh,
    positions: &[Point3<f64>],
    triangles: &[[usize; 3]],
    color: Option<Color>,
) -> Vec<FaceKey> {
    let keys: Vec<VertexKey> = positions.iter().map(|p| mesh.add_vertex(*p)).collect();
    let mut faces = Vec::with_capacity(triangles.len());
    for triangle in triangles {
        let loop_keys = [keys[triangle[0]], keys[triangle[1]], keys[triangle[2]]];
        // Generated index lists never repeat a vertex.
        if let Ok(face) = mesh.add_face(&loop_keys) {
            mesh.set_face_color(face, color);
            faces.push(face);
        }
    }
    faces
}

type Geometry = (Vec<Point3<f64>>, Vec<[usize; 3]>);

fn cube_geometry(size: Vector3<f64>, center: bool) -> Geometry {
    let min = if center { -size / 2.0 } else { Vector3::zeros() };
    let max = if center { size / 2.0 } else { size };

    let positions = vec![
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    let triangles = vec![
        // z+
        [4, 5, 6],
        [4, 6, 7],
        // z-
        [1, 0, 3],
        [1, 3, 2],
        // x+
        [5, 1, 2],
        [5, 2, 6],
        // x-
        [0, 4, 7],
        [0, 7, 3],
        // y+
        [7, 6, 2],
        [7, 2, 3],
        // y-
        [0, 1, 5],
        [0, 5, 4],
    ];

    (positions, triangles)
}

fn sphere_geometry(radius: f64, segments: u32) -> Geometry {
    let slices = segments as usize;
    let stacks = (segments as usize).max(2);

    let mut positions = vec![Point3::new(0.0, radius, 0.0)];
    for i in 1..stacks {
        let phi = PI * i as f64 / stacks as f64;
        let y = radius * phi.cos();
        let r = radius * phi.sin();
        for j in 0..slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            positions.push(Point3::new(r * theta.cos(), y, r * theta.sin()));
        }
    }
    let south = positions.len();
    positions.push(Point3::new(0.0, -radius, 0.0));

    let ring = |stack: usize, slice: usize| 1 + (stack - 1) * slices + slice % slices;

    let mut triangles = Vec::with_capacity(2 * slices * (stacks - 1));
    for j in 0..slices {
        triangles.push([0, ring(1, j + 1), ring(1, j)]);
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            let (u0, u1) = (ring(i, j), ring(i, j + 1));
            let (l0, l1) = (ring(i + 1, j), ring(i + 1, j + 1));
            triangles.push([u0, u1, l1]);
            triangles.push([u0, l1, l0]);
        }
    }
    for j in 0..slices {
        triangles.push([south, ring(stacks - 1, j), ring(stacks - 1, j + 1)]);
    }

    (positions, triangles)
}

/// Capped cylinder from `base` to `base + axis`. `(u, v, axis)` must form a
/// right-handed frame with `u` and `v` of unit length.
fn cylinder_geometry(
    base: &Point3<f64>,
    axis: &Vector3<f64>,
    u: &Vector3<f64>,
    v: &Vector3<f64>,
    radius: f64,
    segments: u32,
) -> Geometry {
    let n = segments as usize;
    let top = base + axis;

    let mut positions = vec![*base, top];
    for j in 0..n {
        let angle = 2.0 * PI * j as f64 / n as f64;
        let offset = (u * angle.cos() + v * angle.sin()) * radius;
        positions.push(base + offset);
        positions.push(top + offset);
    }

    let bottom = |j: usize| 2 + 2 * (j % n);
    let upper = |j: usize| 3 + 2 * (j % n);

    let mut triangles = Vec::with_capacity(4 * n);
    for j in 0..n {
        triangles.push([bottom(j), bottom(j + 1), upper(j + 1)]);
        triangles.push([bottom(j), upper(j + 1), upper(j)]);
        triangles.push([0, bottom(j + 1), bottom(j)]);
        triangles.push([1, upper(j), upper(j + 1)]);
    }

    (positions, triangles)
}

fn square_fan_geometry(cells: u32, cell_size: f64) -> Geometry {
    let n = cells as usize;
    let stride = n + 1;

    let mut positions = Vec::with_capacity(stride * stride);
    for j in 0..=n {
        for i in 0..=n {
            positions.push(Point3::new(i as f64 * cell_size, j as f64 * cell_size, 0.0));
        }
    }

    let mut triangles = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let a = j * stride + i;
            let b = a + 1;
            let c = a + stride + 1;
            let d = a + stride;
            triangles.push([a, b, c]);
            triangles.push([a, c, d]);
        }
    }

    (positions, triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_is_closed() {
        let mesh = Primitive::cube(Vector3::new(1.0, 2.0, 3.0), false).to_mesh();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.edge_count(), 18);
        assert_eq!(mesh.face_count(), 12);
        assert!(mesh.is_watertight());
        assert!(mesh.is_consistent());
        assert_relative_eq!(mesh.surface_area(), 22.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sphere_is_closed() {
        let mesh = Primitive::sphere(1.0, 8).to_mesh();
        assert_eq!(mesh.vertex_count(), 2 + 7 * 8);
        assert_eq!(mesh.face_count(), 2 * 8 * 7);
        assert!(mesh.is_watertight());
        assert!(mesh.is_consistent());
    }

    #[test]
    fn test_cylinder_is_closed() {
        let mesh = Primitive::cylinder(2.0, 0.5, 6).to_mesh();
        assert_eq!(mesh.vertex_count(), 14);
        assert_eq!(mesh.face_count(), 24);
        assert!(mesh.is_watertight());
        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.max.z, 2.0);
        assert_relative_eq!(bbox.max.x, 0.5);
    }

    #[test]
    fn test_square_fan() {
        let mesh = Primitive::square_fan(3, 1.0).to_mesh();
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.face_count(), 18);
        // 3 * 4 horizontal + 3 * 4 vertical + 9 diagonals
        assert_eq!(mesh.edge_count(), 33);
        assert_eq!(mesh.boundary_edge_count(), 12);
        assert!(mesh.all_faces_are_triangles());
    }

    #[test]
    fn test_cylinder_between_points() {
        let mut mesh = Mesh::new();
        let p0 = Point3::new(1.0, 1.0, 1.0);
        let p1 = Point3::new(1.0, 4.0, 1.0);
        let faces = append_cylinder_between(&mut mesh, &p0, &p1, 0.1, 6, Some([1.0, 0.0, 0.0]));

        assert_eq!(faces.len(), 24);
        assert!(mesh.is_watertight());
        assert!(faces.iter().all(|f| mesh.face_color(*f) == Some([1.0, 0.0, 0.0])));

        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.min.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(bbox.max.y, 4.0, epsilon = 1e-12);
        assert!(bbox.max.x <= 1.1 + 1e-12);

        assert!(append_cylinder_between(&mut mesh, &p0, &p0, 0.1, 6, None).is_empty());
    }
}
