// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation and operations

mod analytics;
mod bbox;
pub mod bvh;
mod consistency;
mod edit;
mod mesh;
mod primitives;
pub mod triangle_intersection;

pub use analytics::MeshStats;
pub use bbox::BoundingBox;
pub use bvh::{Bounded, BoundingVolumeTree, QueryStatistics, SizeStatistics};
pub use consistency::ConsistencyError;
pub use edit::DeletedElementTracker;
pub use mesh::{Color, EdgeData, EdgeKey, FaceData, FaceKey, IndexedMesh, Mesh, VertexData, VertexKey};
pub use primitives::{append_cylinder_between, Primitive};
