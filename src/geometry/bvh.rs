// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding Volume Hierarchy (BVH) for spatial acceleration
//!
//! A tree of axis-aligned boxes built once from a snapshot of objects. Objects
//! are never owned by reference: callers store lightweight handles (mesh keys)
//! whose boxes are cached at insertion. Queries dispatch to a listener, one
//! listener trait per query kind, and every trait is implemented for plain
//! closures of the matching shape.

use super::BoundingBox;
use nalgebra::Point3;
use std::cell::Cell;
use std::fmt;
use std::ops::Range;

/// Objects whose extent along the node's longest axis exceeds this fraction
/// of the node's extent stay in the node instead of descending.
const LARGE_OBJECT_RATIO: f64 = 0.9999;

/// Anything that can report a bounding box.
pub trait Bounded {
    fn bounding_box(&self) -> BoundingBox;
}

/// Ray segment occlusion listener. Returning `true` ends the query.
pub trait OcclusionListener<T> {
    fn object_occludes_ray_segment(&self, object: &T, origin: &Point3<f64>, endpoint: &Point3<f64>) -> bool;
}

impl<T, F> OcclusionListener<T> for F
where
    F: Fn(&T, &Point3<f64>, &Point3<f64>) -> bool,
{
    fn object_occludes_ray_segment(&self, object: &T, origin: &Point3<f64>, endpoint: &Point3<f64>) -> bool {
        self(object, origin, endpoint)
    }
}

/// Nearest-hit listener. Implementations lower `t` and return `true` only
/// for a hit no farther than the current `t`.
pub trait IntersectionListener<T> {
    fn object_intersects_ray_segment(
        &self,
        object: &T,
        origin: &Point3<f64>,
        endpoint: &Point3<f64>,
        t: &mut f64,
    ) -> bool;
}

impl<T, F> IntersectionListener<T> for F
where
    F: Fn(&T, &Point3<f64>, &Point3<f64>, &mut f64) -> bool,
{
    fn object_intersects_ray_segment(
        &self,
        object: &T,
        origin: &Point3<f64>,
        endpoint: &Point3<f64>,
        t: &mut f64,
    ) -> bool {
        self(object, origin, endpoint, t)
    }
}

/// Triangle batch listener. Returning `true` halts the traversal.
pub trait TriangleBatchListener<T> {
    fn apply_object_to_triangles(&mut self, object: &T, triangles: &[[Point3<f64>; 3]]) -> bool;
}

impl<T, F> TriangleBatchListener<T> for F
where
    F: FnMut(&T, &[[Point3<f64>; 3]]) -> bool,
{
    fn apply_object_to_triangles(&mut self, object: &T, triangles: &[[Point3<f64>; 3]]) -> bool {
        self(object, triangles)
    }
}

/// Bounding box region listener. Every overlapping object is visited; the
/// return values are OR-ed into the query result.
pub trait BoundingBoxListener<T> {
    fn apply_object_to_bounding_box(&mut self, object: &T, bbox: &BoundingBox) -> bool;
}

impl<T, F> BoundingBoxListener<T> for F
where
    F: FnMut(&T, &BoundingBox) -> bool,
{
    fn apply_object_to_bounding_box(&mut self, object: &T, bbox: &BoundingBox) -> bool {
        self(object, bbox)
    }
}

/// Nearest hit returned by [`BoundingVolumeTree::intersects_ray_segment`].
#[derive(Debug, Clone, Copy)]
pub struct RayHit<'a, T> {
    pub object: &'a T,
    pub point: Point3<f64>,
    pub t: f64,
}

/// Node count and node size (extent along the longest axis) for one level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelStatistics {
    pub nodes: usize,
    pub min_size: f64,
    pub max_size: f64,
    total_size: f64,
}

impl LevelStatistics {
    fn new() -> Self {
        Self {
            nodes: 0,
            min_size: f64::MAX,
            max_size: 0.0,
            total_size: 0.0,
        }
    }

    fn record(&mut self, size: f64) {
        self.nodes += 1;
        self.min_size = self.min_size.min(size);
        self.max_size = self.max_size.max(size);
        self.total_size += size;
    }

    pub fn average_size(&self) -> f64 {
        if self.nodes == 0 {
            return 0.0;
        }
        self.total_size / self.nodes as f64
    }
}

/// Shape of the tree, one entry per level from the root down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeStatistics {
    pub levels: Vec<LevelStatistics>,
}

impl SizeStatistics {
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn node_count(&self) -> usize {
        self.levels.iter().map(|level| level.nodes).sum()
    }
}

impl fmt::Display for SizeStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, level) in self.levels.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "Level {}: {} node{}, average size = {}, min size = {}, max size = {}",
                index,
                level.nodes,
                if level.nodes != 1 { "s" } else { "" },
                level.average_size(),
                level.min_size,
                level.max_size
            )?;
        }
        Ok(())
    }
}

/// Per-query work counters accumulated since the tree was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryStatistics {
    pub queries: usize,
    pub bounding_box_tests: usize,
    pub object_tests: usize,
    min_bounding_box_tests: usize,
    pub max_bounding_box_tests_per_query: usize,
    min_object_tests: usize,
    pub max_object_tests_per_query: usize,
}

impl QueryStatistics {
    fn new() -> Self {
        Self {
            queries: 0,
            bounding_box_tests: 0,
            object_tests: 0,
            min_bounding_box_tests: usize::MAX,
            max_bounding_box_tests_per_query: 0,
            min_object_tests: usize::MAX,
            max_object_tests_per_query: 0,
        }
    }

    fn record(&mut self, query: QueryCounter) {
        self.queries += 1;
        self.bounding_box_tests += query.bounding_box_tests;
        self.object_tests += query.object_tests;
        self.min_bounding_box_tests = self.min_bounding_box_tests.min(query.bounding_box_tests);
        self.max_bounding_box_tests_per_query = self.max_bounding_box_tests_per_query.max(query.bounding_box_tests);
        self.min_object_tests = self.min_object_tests.min(query.object_tests);
        self.max_object_tests_per_query = self.max_object_tests_per_query.max(query.object_tests);
    }

    pub fn average_bounding_box_tests_per_query(&self) -> usize {
        self.bounding_box_tests.checked_div(self.queries).unwrap_or(0)
    }

    pub fn min_bounding_box_tests_per_query(&self) -> usize {
        if self.queries == 0 {
            0
        } else {
            self.min_bounding_box_tests
        }
    }

    pub fn average_object_tests_per_query(&self) -> usize {
        self.object_tests.checked_div(self.queries).unwrap_or(0)
    }

    pub fn min_object_tests_per_query(&self) -> usize {
        if self.queries == 0 {
            0
        } else {
            self.min_object_tests
        }
    }
}

impl Default for QueryStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Queries: {}", self.queries)?;
        writeln!(
            f,
            "Average bounding box tests per query: {}",
            self.average_bounding_box_tests_per_query()
        )?;
        writeln!(f, "Min bounding box tests per query: {}", self.min_bounding_box_tests_per_query())?;
        writeln!(f, "Max bounding box tests per query: {}", self.max_bounding_box_tests_per_query)?;
        writeln!(f, "Average object tests per query: {}", self.average_object_tests_per_query())?;
        writeln!(f, "Min object tests per query: {}", self.min_object_tests_per_query())?;
        write!(f, "Max object tests per query: {}", self.max_object_tests_per_query)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct QueryCounter {
    bounding_box_tests: usize,
    object_tests: usize,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    object: T,
    bbox: BoundingBox,
}

impl<T> Entry<T> {
    fn extent(&self, axis: usize) -> f64 {
        self.bbox.max[axis] - self.bbox.min[axis]
    }

    fn midpoint(&self, axis: usize) -> f64 {
        (self.bbox.min[axis] + self.bbox.max[axis]) * 0.5
    }
}

/// BVH node. Objects live in a contiguous range of the entry array.
#[derive(Debug, Clone)]
struct TreeNode {
    bbox: BoundingBox,
    objects: Range<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

/// Running state of a nearest-hit query.
struct NearestHit {
    t: f64,
    entry: Option<usize>,
}

/// Bounding Volume Hierarchy over a fixed set of objects
#[derive(Debug)]
pub struct BoundingVolumeTree<T> {
    entries: Vec<Entry<T>>,
    nodes: Vec<TreeNode>,
    size_statistics: SizeStatistics,
    query_statistics: Cell<QueryStatistics>,
}

impl<T> Default for BoundingVolumeTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BoundingVolumeTree<T> {
    /// Create an empty tree. Every query on it misses.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            nodes: Vec::new(),
            size_statistics: SizeStatistics::default(),
            query_statistics: Cell::new(QueryStatistics::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All objects in tree order.
    pub fn objects(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| &entry.object)
    }

    pub fn size_statistics(&self) -> &SizeStatistics {
        &self.size_statistics
    }

    pub fn query_statistics(&self) -> QueryStatistics {
        self.query_statistics.get()
    }

    pub fn queries(&self) -> usize {
        self.query_statistics.get().queries
    }

    pub fn reset_query_statistics(&self) {
        self.query_statistics.set(QueryStatistics::new());
    }

    /// Returns true if any listener call reports occlusion. Stops at the first.
    pub fn occludes_ray_segment<L>(&self, origin: &Point3<f64>, endpoint: &Point3<f64>, listener: &L) -> bool
    where
        L: OcclusionListener<T> + ?Sized,
    {
        if self.nodes.is_empty() {
            return false;
        }
        let mut counter = QueryCounter::default();
        let result = self.occludes_subtree(0, origin, endpoint, listener, &mut counter);
        self.record_query(counter);
        result
    }

    /// Nearest object along the segment, as judged by the listener.
    pub fn intersects_ray_segment<L>(
        &self,
        origin: &Point3<f64>,
        endpoint: &Point3<f64>,
        listener: &L,
    ) -> Option<RayHit<'_, T>>
    where
        L: IntersectionListener<T> + ?Sized,
    {
        if self.nodes.is_empty() {
            return None;
        }
        let mut counter = QueryCounter::default();
        let mut nearest = NearestHit { t: 1.0, entry: None };
        self.intersects_subtree(0, origin, endpoint, listener, &mut nearest, &mut counter);
        self.record_query(counter);

        let index = nearest.entry?;
        let t = nearest.t;
        Some(RayHit {
            object: &self.entries[index].object,
            point: origin + (endpoint - origin) * t,
            t,
        })
    }

    /// Offers every object in a node whose box overlaps any of the triangles.
    /// Returns true if the listener halted the traversal.
    pub fn apply_to_triangle_vector_intersection<L>(&self, triangles: &[[Point3<f64>; 3]], listener: &mut L) -> bool
    where
        L: TriangleBatchListener<T> + ?Sized,
    {
        if self.nodes.is_empty() {
            return false;
        }
        let mut counter = QueryCounter::default();
        let halted = self.triangles_subtree(0, triangles, listener, &mut counter);
        self.record_query(counter);
        halted
    }

    /// Visits every object whose box overlaps `bbox` and returns the OR of the
    /// listener results. There is no early exit.
    pub fn apply_to_bounding_box_intersection<L>(&self, bbox: &BoundingBox, listener: &mut L) -> bool
    where
        L: BoundingBoxListener<T> + ?Sized,
    {
        if self.nodes.is_empty() {
            return false;
        }
        let mut counter = QueryCounter::default();
        let result = self.bounding_box_subtree(0, bbox, listener, &mut counter);
        self.record_query(counter);
        result
    }

    fn record_query(&self, counter: QueryCounter) {
        let mut stats = self.query_statistics.get();
        stats.record(counter);
        self.query_statistics.set(stats);
    }

    fn occludes_subtree<L>(
        &self,
        node_index: usize,
        origin: &Point3<f64>,
        endpoint: &Point3<f64>,
        listener: &L,
        counter: &mut QueryCounter,
    ) -> bool
    where
        L: OcclusionListener<T> + ?Sized,
    {
        let node = &self.nodes[node_index];
        counter.bounding_box_tests += 1;
        if node.bbox.ray_segment_entry(origin, endpoint).is_none() {
            return false;
        }

        for entry in &self.entries[node.objects.clone()] {
            counter.object_tests += 1;
            if listener.object_occludes_ray_segment(&entry.object, origin, endpoint) {
                return true;
            }
        }

        node.left
            .is_some_and(|left| self.occludes_subtree(left, origin, endpoint, listener, counter))
            || node
                .right
                .is_some_and(|right| self.occludes_subtree(right, origin, endpoint, listener, counter))
    }

    fn intersects_subtree<L>(
        &self,
        node_index: usize,
        origin: &Point3<f64>,
        endpoint: &Point3<f64>,
        listener: &L,
        nearest: &mut NearestHit,
        counter: &mut QueryCounter,
    ) where
        L: IntersectionListener<T> + ?Sized,
    {
        let node = &self.nodes[node_index];
        counter.bounding_box_tests += 1;
        let Some(entry_t) = node.bbox.ray_segment_entry(origin, endpoint) else {
            return;
        };

        // Nothing inside can beat the current best.
        if entry_t > nearest.t || (nearest.entry.is_some() && entry_t >= nearest.t) {
            return;
        }

        for index in node.objects.clone() {
            counter.object_tests += 1;
            if listener.object_intersects_ray_segment(&self.entries[index].object, origin, endpoint, &mut nearest.t) {
                nearest.entry = Some(index);
            }
        }

        if let Some(left) = node.left {
            self.intersects_subtree(left, origin, endpoint, listener, nearest, counter);
        }
        if let Some(right) = node.right {
            self.intersects_subtree(right, origin, endpoint, listener, nearest, counter);
        }
    }

    fn triangles_subtree<L>(
        &self,
        node_index: usize,
        triangles: &[[Point3<f64>; 3]],
        listener: &mut L,
        counter: &mut QueryCounter,
    ) -> bool
    where
        L: TriangleBatchListener<T> + ?Sized,
    {
        let node = &self.nodes[node_index];
        counter.bounding_box_tests += 1;
        if !triangles.iter().any(|triangle| node.bbox.intersects_triangle(triangle)) {
            return false;
        }

        for entry in &self.entries[node.objects.clone()] {
            counter.object_tests += 1;
            if listener.apply_object_to_triangles(&entry.object, triangles) {
                return true;
            }
        }

        if let Some(left) = node.left {
            if self.triangles_subtree(left, triangles, listener, counter) {
                return true;
            }
        }
        match node.right {
            Some(right) => self.triangles_subtree(right, triangles, listener, counter),
            None => false,
        }
    }

    fn bounding_box_subtree<L>(
        &self,
        node_index: usize,
        bbox: &BoundingBox,
        listener: &mut L,
        counter: &mut QueryCounter,
    ) -> bool
    where
        L: BoundingBoxListener<T> + ?Sized,
    {
        let node = &self.nodes[node_index];
        counter.bounding_box_tests += 1;
        if !node.bbox.intersects(bbox) {
            return false;
        }

        let mut result = false;
        for entry in &self.entries[node.objects.clone()] {
            counter.object_tests += 1;
            if entry.bbox.intersects(bbox) {
                result |= listener.apply_object_to_bounding_box(&entry.object, bbox);
            }
        }

        if let Some(left) = node.left {
            result |= self.bounding_box_subtree(left, bbox, listener, counter);
        }
        if let Some(right) = node.right {
            result |= self.bounding_box_subtree(right, bbox, listener, counter);
        }
        result
    }
}

impl<T: Bounded> BoundingVolumeTree<T> {
    /// Build a tree over `objects`, caching each object's box.
    pub fn build(objects: Vec<T>) -> Self {
        let mut tree = Self::new();
        tree.initialize(objects);
        tree
    }

    /// Rebuild from scratch over `objects`. Resets all statistics.
    pub fn initialize(&mut self, objects: Vec<T>) {
        self.entries = objects
            .into_iter()
            .map(|object| {
                let bbox = object.bounding_box();
                debug_assert!(!bbox.is_empty(), "tree objects need a non-empty bounding box");
                Entry { object, bbox }
            })
            .collect();
        self.nodes.clear();
        self.size_statistics = SizeStatistics::default();
        self.query_statistics.set(QueryStatistics::new());

        if !self.entries.is_empty() {
            self.build_subtree(0, self.entries.len(), 0);
        }
    }

    fn build_subtree(&mut self, first: usize, last: usize, level: usize) -> usize {
        let bbox = self.entries[first..last]
            .iter()
            .fold(BoundingBox::empty(), |acc, entry| acc.union(&entry.bbox));
        let axis = bbox.longest_axis();
        let extent = bbox.size()[axis];

        if self.size_statistics.levels.len() <= level {
            self.size_statistics.levels.push(LevelStatistics::new());
        }
        self.size_statistics.levels[level].record(extent);

        // Largest first, so objects spanning the whole node stay near the root.
        self.entries[first..last].sort_by(|a, b| b.extent(axis).total_cmp(&a.extent(axis)));
        let mut split = first;
        while split < last && self.entries[split].extent(axis) / extent > LARGE_OBJECT_RATIO {
            split += 1;
        }

        let node_index = self.nodes.len();
        self.nodes.push(TreeNode {
            bbox,
            objects: first..split,
            left: None,
            right: None,
        });

        if last - split <= 1 {
            self.nodes[node_index].objects = first..last;
            return node_index;
        }

        self.entries[split..last].sort_by(|a, b| a.midpoint(axis).total_cmp(&b.midpoint(axis)));
        let median = split + (last - split) / 2;

        let left = self.build_subtree(split, median, level + 1);
        let right = self.build_subtree(median, last, level + 1);
        let node = &mut self.nodes[node_index];
        node.left = Some(left);
        node.right = Some(right);
        node_index
    }
}
