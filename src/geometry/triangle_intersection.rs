// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Segment-polygon and segment-triangle intersection routines

use crate::utils::math::{dominant_axis, newell_normal, DEFAULT_TOLERANCE};
use nalgebra::{Point3, Vector3};

/// Intersect the segment `origin + s * (endpoint - origin)`, `s` in `[0, 1]`,
/// with a planar polygon. Returns the parameter `s` of the hit.
///
/// The polygon is projected onto the axis plane its normal is most
/// perpendicular to and tested as a fan of triangles around its first
/// vertex ("An Efficient Ray-Polygon Intersection", Graphics Gems I).
pub fn ray_segment_intersects_polygon(
    polygon: &[Point3<f64>],
    origin: &Point3<f64>,
    endpoint: &Point3<f64>,
) -> Option<f64> {
    if polygon.len() < 3 {
        return None;
    }

    let direction = endpoint - origin;
    let normal = newell_normal(polygon);

    let divisor = normal.dot(&direction);
    if divisor == 0.0 {
        return None;
    }

    let s = (polygon[0] - origin).dot(&normal) / divisor;
    if !(0.0..=1.0).contains(&s) {
        return None;
    }

    let (axis1, axis2) = match dominant_axis(&normal) {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };

    let hit = origin + direction * s;
    let start = &polygon[0];
    let u0 = hit[axis1] - start[axis1];
    let v0 = hit[axis2] - start[axis2];

    for window in polygon[1..].windows(2) {
        let u1 = window[0][axis1] - start[axis1];
        let v1 = window[0][axis2] - start[axis2];
        let u2 = window[1][axis1] - start[axis1];
        let v2 = window[1][axis2] - start[axis2];

        let (alpha, beta) = if u1 == 0.0 {
            if u2 == 0.0 || v1 == 0.0 {
                continue;
            }
            let beta = u0 / u2;
            (((v0 - beta * v2) / v1), beta)
        } else {
            let denominator = v2 * u1 - u2 * v1;
            if denominator == 0.0 {
                continue;
            }
            let beta = (v0 * u1 - u0 * v1) / denominator;
            (((u0 - beta * u2) / u1), beta)
        };

        if (0.0..=1.0).contains(&beta) && alpha >= 0.0 && alpha + beta <= 1.0 {
            return Some(s);
        }
    }

    None
}

/// Portion of a segment lying inside a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippedSegment {
    pub points: [Point3<f64>; 2],
    /// For each endpoint, the index of the triangle edge that trimmed it.
    /// Edge `i` runs from vertex `i` to vertex `i + 1`.
    pub clipping_edges: [Option<usize>; 2],
}

/// Clip a segment lying in the plane of a triangle to the triangle's interior.
///
/// Returns `None` when the triangle is degenerate, when either segment
/// endpoint is farther than epsilon from the triangle's plane, or when
/// nothing of the segment remains strictly inside. Epsilon is
/// `max(absolute, relative * largest coordinate magnitude of the triangle)`.
/// A segment running exactly along a triangle edge is clipped away.
pub fn clip_coplanar_segment(
    triangle: &[Point3<f64>; 3],
    segment: &[Point3<f64>; 2],
    absolute_tolerance: f64,
    relative_tolerance: f64,
) -> Option<ClippedSegment> {
    let magnitude = triangle
        .iter()
        .flat_map(|p| p.coords.iter().map(|c| c.abs()))
        .fold(0.0_f64, f64::max);
    let epsilon = absolute_tolerance.max(relative_tolerance * magnitude);

    let normal = (triangle[1] - triangle[0]).cross(&(triangle[2] - triangle[0]));
    if normal.norm() < DEFAULT_TOLERANCE {
        return None;
    }
    let normal = normal.normalize();

    if segment
        .iter()
        .any(|q| normal.dot(&(q - triangle[0])).abs() > epsilon)
    {
        return None;
    }

    let [mut r0, mut r1] = *segment;
    let mut clipping_edges = [None, None];
    for i in 0..3 {
        let start = triangle[i];
        let end = triangle[(i + 1) % 3];
        let inward = normal.cross(&(end - start)).normalize();

        let (before0, before1) = (r0, r1);
        if !clip_segment_against_plane(&mut r0, &mut r1, &start, &inward) {
            return None;
        }
        if r0 != before0 {
            clipping_edges[0] = Some(i);
        }
        if r1 != before1 {
            clipping_edges[1] = Some(i);
        }
    }

    Some(ClippedSegment {
        points: [r0, r1],
        clipping_edges,
    })
}

/// Keep the part of the segment on the positive side of the plane through
/// `point` with `normal`. Returns false if nothing strictly positive remains.
pub fn clip_segment_against_plane(
    p0: &mut Point3<f64>,
    p1: &mut Point3<f64>,
    point: &Point3<f64>,
    normal: &Vector3<f64>,
) -> bool {
    let delta = *p1 - *p0;
    let t0 = if *p0 == *point { 0.0 } else { (*p0 - point).dot(normal) };
    let t1 = if *p1 == *point { 0.0 } else { (*p1 - point).dot(normal) };

    if t0 <= 0.0 && t1 <= 0.0 {
        return false;
    }

    if t0 < 0.0 {
        *p0 += delta * (-t0 / (-t0 + t1));
    } else if t1 < 0.0 {
        *p1 -= delta * (-t1 / (-t1 + t0));
    }

    true
}
