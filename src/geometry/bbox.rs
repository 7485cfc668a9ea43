// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding box utilities

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut bbox = Self::empty();
        for point in points {
            bbox.expand_to_include(point);
        }
        bbox
    }

    /// True if no point has been added yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);

        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut result = *self;
        result.expand_to_include(&other.min);
        result.expand_to_include(&other.max);
        result
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Length of the box diagonal.
    pub fn diameter(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.size().norm()
    }

    pub fn longest_axis(&self) -> usize {
        let size = self.size();
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    pub fn contains_point(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    /// Closed-interval overlap test; touching boxes intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        (0..3).all(|axis| {
            self.min[axis].max(other.min[axis]) <= self.max[axis].min(other.max[axis])
        })
    }

    /// Grows each face outward by `max(absolute, |coordinate| * relative)`.
    pub fn grown(&self, absolute_tolerance: f64, relative_tolerance: f64) -> BoundingBox {
        let mut result = *self;
        for axis in 0..3 {
            result.min[axis] -= absolute_tolerance.max(self.min[axis].abs() * relative_tolerance);
            result.max[axis] += absolute_tolerance.max(self.max[axis].abs() * relative_tolerance);
        }
        result
    }

    /// Parametric entry point of the segment `origin + t * (endpoint - origin)`,
    /// `t` in `[0, 1]`, into the box. Returns `Some(0.0)` when the origin lies
    /// inside and `None` when the segment misses.
    ///
    /// Based on "Fast Ray-Box Intersection", Graphics Gems I, with the
    /// published errata applied.
    pub fn ray_segment_entry(&self, origin: &Point3<f64>, endpoint: &Point3<f64>) -> Option<f64> {
        let direction = endpoint - origin;

        let mut outside = [false; 3];
        let mut candidate_plane = [0.0; 3];
        let mut inside = true;
        for axis in 0..3 {
            if origin[axis] < self.min[axis] {
                candidate_plane[axis] = self.min[axis];
                outside[axis] = true;
                inside = false;
            } else if origin[axis] > self.max[axis] {
                candidate_plane[axis] = self.max[axis];
                outside[axis] = true;
                inside = false;
            }
        }

        if inside {
            return Some(0.0);
        }

        let mut max_t = [-1.0; 3];
        for axis in 0..3 {
            if outside[axis] && direction[axis] != 0.0 {
                max_t[axis] = (candidate_plane[axis] - origin[axis]) / direction[axis];
            }
        }

        let mut plane = 0;
        for axis in 1..3 {
            if max_t[axis] > max_t[plane] {
                plane = axis;
            }
        }

        let t = max_t[plane];
        if !(0.0..=1.0).contains(&t) {
            return None;
        }

        for axis in 0..3 {
            if axis != plane {
                let x = origin[axis] + t * direction[axis];
                if x < self.min[axis] || x > self.max[axis] {
                    return None;
                }
            }
        }

        Some(t)
    }

    /// Separating-axis overlap test between the box and a triangle.
    pub fn intersects_triangle(&self, triangle: &[Point3<f64>; 3]) -> bool {
        let center = self.center();
        let half = self.size() * 0.5;

        let v = [triangle[0] - center, triangle[1] - center, triangle[2] - center];
        let edges = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];

        let separated = |axis: &Vector3<f64>| {
            let p0 = axis.dot(&v[0]);
            let p1 = axis.dot(&v[1]);
            let p2 = axis.dot(&v[2]);
            let radius = half.x * axis.x.abs() + half.y * axis.y.abs() + half.z * axis.z.abs();
            p0.min(p1).min(p2) > radius || p0.max(p1).max(p2) < -radius
        };

        for edge in &edges {
            for i in 0..3 {
                let axis = Vector3::ith(i, 1.0).cross(edge);
                if separated(&axis) {
                    return false;
                }
            }
        }

        for i in 0..3 {
            let lo = v[0][i].min(v[1][i]).min(v[2][i]);
            let hi = v[0][i].max(v[1][i]).max(v[2][i]);
            if lo > half[i] || hi < -half[i] {
                return false;
            }
        }

        let normal = edges[0].cross(&edges[1]);
        !separated(&normal)
    }

    /// Check if two bounding boxes are approximately equal within tolerance
    pub fn approx_eq(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (0..3).all(|axis| {
            (self.min[axis] - other.min[axis]).abs() < tolerance
                && (self.max[axis] - other.max[axis]).abs() < tolerance
        })
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_bounding_box() {
        let mut bbox = BoundingBox::empty();
        assert!(bbox.is_empty());
        bbox.expand_to_include(&Point3::new(1.0, 2.0, 3.0));
        bbox.expand_to_include(&Point3::new(-1.0, -2.0, -3.0));

        assert_eq!(bbox.min, Point3::new(-1.0, -2.0, -3.0));
        assert_eq!(bbox.max, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(bbox.center(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.longest_axis(), 2);
    }

    #[test]
    fn test_grown_uses_larger_of_absolute_and_relative() {
        let bbox = BoundingBox::new(Point3::new(-100.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let grown = bbox.grown(0.01, 0.001);
        assert!((grown.min.x - -100.1).abs() < 1e-12);
        assert!((grown.min.y - -0.01).abs() < 1e-12);
        assert!((grown.max.x - 1.01).abs() < 1e-12);
    }

    #[test]
    fn test_intersects_is_closed() {
        let a = unit_box();
        let touching = BoundingBox::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let apart = BoundingBox::new(Point3::new(1.5, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&touching));
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn test_ray_segment_entry() {
        let bbox = unit_box();
        let t = bbox
            .ray_segment_entry(&Point3::new(-1.0, 0.5, 0.5), &Point3::new(3.0, 0.5, 0.5))
            .unwrap();
        assert!((t - 0.25).abs() < 1e-12);

        let inside = bbox.ray_segment_entry(&Point3::new(0.5, 0.5, 0.5), &Point3::new(5.0, 5.0, 5.0));
        assert_eq!(inside, Some(0.0));

        // Stops short of the box.
        assert!(bbox
            .ray_segment_entry(&Point3::new(-3.0, 0.5, 0.5), &Point3::new(-1.0, 0.5, 0.5))
            .is_none());
        // Passes beside it.
        assert!(bbox
            .ray_segment_entry(&Point3::new(-1.0, 2.0, 0.5), &Point3::new(3.0, 2.0, 0.5))
            .is_none());
    }

    #[test]
    fn test_ray_segment_entry_into_flat_box() {
        let flat = BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0));
        let t = flat
            .ray_segment_entry(&Point3::new(0.5, 0.5, 1.0), &Point3::new(0.5, 0.5, -1.0))
            .unwrap();
        assert!((t - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_intersects_triangle() {
        let bbox = unit_box();
        let crossing = [
            Point3::new(-1.0, 0.5, 0.5),
            Point3::new(2.0, 0.5, 0.5),
            Point3::new(0.5, 3.0, 0.5),
        ];
        assert!(bbox.intersects_triangle(&crossing));

        let far = [
            Point3::new(5.0, 5.0, 5.0),
            Point3::new(6.0, 5.0, 5.0),
            Point3::new(5.0, 6.0, 5.0),
        ];
        assert!(!bbox.intersects_triangle(&far));

        // Bounding boxes overlap but the triangle's plane misses the box corner.
        let diagonal = [
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
            Point3::new(0.0, 0.0, 4.0),
        ];
        assert!(!bbox.intersects_triangle(&diagonal));
    }
}
