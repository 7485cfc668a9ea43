// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Perimeter welding
//!
//! Fuses open edges that lie on top of each other within tolerance, so that
//! separately built pieces of a surface become one connected mesh.

mod edge_matcher;
mod regions;
mod welder;

pub use edge_matcher::{EdgeMatcher, EdgeNode};
pub use regions::{region_color, RegionLabels};
pub use welder::{CandidateEdges, WeldSummary, Welder};
