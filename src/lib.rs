// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Meshmend
//!
//! Batch repair passes for polygon meshes built on a shared bounding volume
//! tree: welding of coincident open edges, and discovery of edges that cut
//! through coplanar faces so the faces can be retriangulated.

pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod intersect;
pub mod io;
pub mod split;
pub mod utils;
pub mod weld;

pub use config::RepairConfig;
pub use error::{MeshError, Result};
pub use geometry::{BoundingBox, BoundingVolumeTree, Mesh, MeshStats, Primitive};
pub use intersect::FaceIntersector;
pub use io::{export_mesh, import_mesh};
pub use split::{Retriangulator, SegmentRecorder, SplitSummary, Splitter};
pub use weld::{WeldSummary, Welder};
