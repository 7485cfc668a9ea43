// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Endpoint identity for intersection segments

use crate::geometry::{EdgeKey, VertexKey};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_UNIQUE: AtomicU64 = AtomicU64::new(0);

/// Where an intersection segment endpoint came from. Two endpoints with equal
/// identifiers are the same point, whatever their computed coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EndpointIdentifier {
    /// The endpoint is an existing mesh vertex.
    Vertex(VertexKey),
    /// The endpoint lies on a mesh edge; the index tells apart several
    /// points on the same edge.
    EdgeAndIndex(EdgeKey, u32),
    /// Synthesized; never equal to any other identifier.
    Unique(u64),
}

impl EndpointIdentifier {
    pub fn unique() -> Self {
        Self::Unique(NEXT_UNIQUE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn vertex(&self) -> Option<VertexKey> {
        match self {
            Self::Vertex(vertex) => Some(*vertex),
            _ => None,
        }
    }

    pub fn edge(&self) -> Option<EdgeKey> {
        match self {
            Self::EdgeAndIndex(edge, _) => Some(*edge),
            _ => None,
        }
    }
}

impl fmt::Display for EndpointIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex(vertex) => write!(f, "vertex {vertex:?}"),
            Self::EdgeAndIndex(edge, index) => write!(f, "edge {edge:?} #{index}"),
            Self::Unique(id) => write!(f, "unique #{id}"),
        }
    }
}
