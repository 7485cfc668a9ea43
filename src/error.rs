// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for mesh construction and parsing

use thiserror::Error;

/// Errors raised while building or loading a mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("face needs at least 3 vertices, got {vertices}")]
    DegenerateFace { vertices: usize },

    #[error("face repeats a vertex in its loop")]
    RepeatedVertex,

    #[error("vertex index {index} out of range for {count} vertices")]
    InvalidVertexIndex { index: i64, count: usize },

    #[error("face references a vertex that is not in the mesh")]
    DeadVertex,

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, MeshError>;
