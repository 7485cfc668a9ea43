// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - reading and writing meshes by file extension

pub mod obj;
pub mod stl;

use crate::geometry::{IndexedMesh, Mesh, VertexKey};
use ahash::AHashMap;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
    Stl,
}

impl MeshFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "obj" => Ok(Self::Obj),
            "stl" => Ok(Self::Stl),
            other => Err(anyhow!("Unsupported mesh format '{}': {}", other, path.display())),
        }
    }
}

/// Load a mesh, picking the reader from the file extension.
pub fn import_mesh(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let indexed = match MeshFormat::from_path(path)? {
        MeshFormat::Obj => import_obj(path)?,
        MeshFormat::Stl => stl::import_stl(path)?,
    };
    let mesh = build_mesh(&indexed);
    tracing::info!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "Imported mesh"
    );
    Ok(mesh)
}

/// Save a mesh, picking the writer from the file extension.
pub fn export_mesh(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match MeshFormat::from_path(path)? {
        MeshFormat::Obj => export_obj(mesh, path)?,
        MeshFormat::Stl => {
            let flagged = mesh.edge_keys().into_iter().filter(|e| mesh.edge_flag(*e)).count();
            if flagged > 0 {
                tracing::warn!(path = %path.display(), flagged, "STL cannot store edge flags; they are dropped");
            }
            stl::export_stl(mesh, path)?
        }
    }
    tracing::info!(path = %path.display(), faces = mesh.face_count(), "Exported mesh");
    Ok(())
}

pub fn import_obj(path: &Path) -> Result<IndexedMesh> {
    let source =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read OBJ file: {}", path.display()))?;
    let document = obj::parse_obj(&source).with_context(|| format!("Failed to parse OBJ file: {}", path.display()))?;

    let mut library = AHashMap::new();
    let directory = path.parent().unwrap_or_else(|| Path::new(""));
    for name in &document.material_libraries {
        let mtl_path = directory.join(name);
        match std::fs::read_to_string(&mtl_path) {
            Ok(text) => library.extend(obj::parse_mtl(&text)),
            Err(err) => tracing::warn!(path = %mtl_path.display(), error = %err, "Skipping material library"),
        }
    }
    Ok(document.into_indexed(&library))
}

/// Write `path` and, when any face is colored, a `.mtl` next to it.
pub fn export_obj(mesh: &Mesh, path: &Path) -> Result<()> {
    let mtl = obj::write_mtl(mesh);
    let library = if mtl.is_empty() {
        None
    } else {
        let mtl_path = path.with_extension("mtl");
        std::fs::write(&mtl_path, mtl)
            .with_context(|| format!("Failed to write material file: {}", mtl_path.display()))?;
        mtl_path.file_name().and_then(|n| n.to_str()).map(str::to_owned)
    };

    std::fs::write(path, obj::write_obj(mesh, library.as_deref()))
        .with_context(|| format!("Failed to write OBJ file: {}", path.display()))
}

/// Build an adjacency mesh from index form. Faces the mesh rejects
/// (fewer than three corners, repeated corners) are dropped with a warning,
/// as are flagged edges with a bad or repeated index. A flagged edge no face
/// uses becomes a loose edge.
pub fn build_mesh(indexed: &IndexedMesh) -> Mesh {
    let mut mesh = Mesh::new();
    let keys: Vec<VertexKey> = indexed.positions.iter().map(|p| mesh.add_vertex(*p)).collect();

    let mut skipped = 0;
    for (index, polygon) in indexed.faces.iter().enumerate() {
        let corners: Option<Vec<VertexKey>> = polygon.iter().map(|i| keys.get(*i).copied()).collect();
        let result = corners
            .ok_or_else(|| anyhow!("vertex index out of range"))
            .and_then(|corners| mesh.add_face(&corners).map_err(Into::into));
        match result {
            Ok(face) => mesh.set_face_color(face, indexed.colors.get(index).copied().flatten()),
            Err(err) => {
                skipped += 1;
                tracing::debug!(face = index, error = %err, "Dropping face");
            }
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "Dropped invalid faces");
    }

    let mut dropped_flags = 0;
    for (index, [a, b]) in indexed.flagged_edges.iter().enumerate() {
        let edge = match (keys.get(*a), keys.get(*b)) {
            (Some(a), Some(b)) => mesh.add_edge(*a, *b).ok(),
            _ => None,
        };
        match edge {
            Some(edge) => mesh.set_edge_flag(edge, true),
            None => {
                dropped_flags += 1;
                tracing::debug!(edge = index, "Dropping flagged edge");
            }
        }
    }
    if dropped_flags > 0 {
        tracing::warn!(dropped = dropped_flags, "Dropped invalid flagged edges");
    }
    mesh
}
