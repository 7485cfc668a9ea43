// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point3, Vector3};

/// Default absolute and relative tolerance used by the repair passes.
pub const DEFAULT_TOLERANCE: f64 = 3.452_669_8e-4;

/// Returns true if two scalars lie within tolerance of each other.
///
/// The relative term scales with the difference of the magnitudes,
/// `||a| - |b||`, not with the larger magnitude.
pub fn scalars_coincident(a: f64, b: f64, absolute_tolerance: f64, relative_tolerance: f64) -> bool {
    let delta = (a - b).abs();
    if delta <= absolute_tolerance {
        return true;
    }
    let magnitude_delta = (a.abs() - b.abs()).abs();
    delta <= magnitude_delta * relative_tolerance
}

/// Returns true if every coordinate of the two points is coincident.
pub fn points_coincident(
    a: &Point3<f64>,
    b: &Point3<f64>,
    absolute_tolerance: f64,
    relative_tolerance: f64,
) -> bool {
    (0..3).all(|axis| scalars_coincident(a[axis], b[axis], absolute_tolerance, relative_tolerance))
}

/// Index of the component with the largest magnitude.
pub fn dominant_axis(v: &Vector3<f64>) -> usize {
    let (x, y, z) = (v.x.abs(), v.y.abs(), v.z.abs());
    if x >= y && x >= z {
        0
    } else if y >= z {
        1
    } else {
        2
    }
}

/// Unit normal of a triangle, or zero when the triangle is degenerate
pub fn calculate_triangle_normal(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Vector3<f64> {
    let v1 = p1 - p0;
    let v2 = p2 - p0;
    v1.cross(&v2).try_normalize(0.0).unwrap_or_else(Vector3::zeros)
}

/// Newell normal of a polygon loop, not normalized.
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}
