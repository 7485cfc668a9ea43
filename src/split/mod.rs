// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Self-intersection discovery
//!
//! [`Splitter`] finds where mesh edges run across non-adjacent faces and
//! hands each crossing to a [`Retriangulator`] as a segment on the crossed
//! face.

mod endpoint;
mod retriangulator;
mod splitter;

pub use endpoint::EndpointIdentifier;
pub use retriangulator::{FaceLineSegment, Retriangulator, SegmentRecorder};
pub use splitter::{SplitSummary, Splitter};
