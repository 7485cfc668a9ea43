// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Wavefront OBJ reader and writer
//!
//! Geometry, per-face diffuse color and edge flags survive a round trip.
//! Colors are written as materials named `rgb_RRGGBB`, so a file can be read
//! back without its `.mtl` companion. Flagged edges are written as `l` line
//! records; every segment of an `l` record reads back as a flagged edge.

use crate::error::{MeshError, Result};
use crate::geometry::{Color, IndexedMesh, Mesh};
use ahash::AHashMap;
use nalgebra::Point3;
use std::fmt::Write as _;

/// Parsed OBJ content. `material_libraries` lists `mtllib` references in
/// file order; `face_materials` names the active material of each face.
/// `lines` holds every segment of the `l` polylines.
#[derive(Debug, Clone, Default)]
pub struct ObjDocument {
    pub positions: Vec<Point3<f64>>,
    pub faces: Vec<Vec<usize>>,
    pub face_materials: Vec<Option<String>>,
    pub material_libraries: Vec<String>,
    pub lines: Vec<[usize; 2]>,
}

impl ObjDocument {
    /// Resolve material names to colors. Names of the form `rgb_RRGGBB`
    /// decode directly; others are looked up in `library`.
    pub fn into_indexed(self, library: &AHashMap<String, Color>) -> IndexedMesh {
        let colors = self
            .face_materials
            .iter()
            .map(|name| {
                name.as_deref()
                    .and_then(|name| parse_material_color(name).or_else(|| library.get(name).copied()))
            })
            .collect();
        IndexedMesh {
            positions: self.positions,
            faces: self.faces,
            colors,
            flagged_edges: self.lines,
        }
    }
}

pub fn parse_obj(source: &str) -> Result<ObjDocument> {
    let mut document = ObjDocument::default();
    let mut material: Option<String> = None;

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = content.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let mut coords = [0.0; 3];
                for coord in coords.iter_mut() {
                    let token = tokens.next().ok_or_else(|| parse_error(line, "vertex needs 3 coordinates"))?;
                    *coord = token
                        .parse()
                        .map_err(|_| parse_error(line, format!("bad coordinate '{token}'")))?;
                }
                document.positions.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            "f" => {
                let face = tokens
                    .map(|token| resolve_index(token, document.positions.len(), line))
                    .collect::<Result<Vec<_>>>()?;
                document.faces.push(face);
                document.face_materials.push(material.clone());
            }
            "l" => {
                let polyline = tokens
                    .map(|token| resolve_index(token, document.positions.len(), line))
                    .collect::<Result<Vec<_>>>()?;
                if polyline.len() < 2 {
                    return Err(parse_error(line, "line needs at least 2 vertices"));
                }
                document.lines.extend(polyline.windows(2).map(|pair| [pair[0], pair[1]]));
            }
            // A bare usemtl selects the default material.
            "usemtl" => material = tokens.next().map(str::to_owned),
            "mtllib" => document.material_libraries.extend(tokens.map(str::to_owned)),
            _ => {}
        }
    }

    tracing::debug!(
        vertices = document.positions.len(),
        faces = document.faces.len(),
        lines = document.lines.len(),
        "Parsed OBJ"
    );
    Ok(document)
}

/// Turn one face token (`i`, `i/t`, `i/t/n` or `i//n`) into a zero-based
/// vertex index. Negative indices count back from the latest vertex.
fn resolve_index(token: &str, vertex_count: usize, line: usize) -> Result<usize> {
    let head = token.split('/').next().unwrap_or(token);
    let index: i64 = head
        .parse()
        .map_err(|_| parse_error(line, format!("bad face index '{token}'")))?;

    let resolved = match index {
        0 => None,
        i if i > 0 => Some(i - 1),
        i => Some(vertex_count as i64 + i),
    };
    match resolved {
        Some(i) if i >= 0 && (i as usize) < vertex_count => Ok(i as usize),
        _ => Err(MeshError::Parse {
            line,
            message: format!("vertex index {index} out of range for {vertex_count} vertices"),
        }),
    }
}

/// Diffuse colors by material name from `.mtl` source.
pub fn parse_mtl(source: &str) -> AHashMap<String, Color> {
    let mut colors = AHashMap::new();
    let mut current: Option<String> = None;
    for raw in source.lines() {
        let mut tokens = raw.split_whitespace();
        match tokens.next() {
            Some("newmtl") => current = tokens.next().map(str::to_owned),
            Some("Kd") => {
                let values: Vec<f32> = tokens.take(3).filter_map(|t| t.parse().ok()).collect();
                if let (Some(name), [r, g, b]) = (&current, values.as_slice()) {
                    colors.insert(name.clone(), [*r, *g, *b]);
                }
            }
            _ => {}
        }
    }
    colors
}

pub fn material_name(color: Color) -> String {
    let [r, g, b] = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    format!("rgb_{r:02x}{g:02x}{b:02x}")
}

pub fn parse_material_color(name: &str) -> Option<Color> {
    let hex = name.strip_prefix("rgb_")?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok().map(|c| c as f32 / 255.0);
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// OBJ text for `mesh`. When `material_library` is given it is referenced
/// with `mtllib` and colored faces switch materials with `usemtl`.
pub fn write_obj(mesh: &Mesh, material_library: Option<&str>) -> String {
    let indexed = mesh.to_indexed();
    let mut out = String::new();
    let _ = writeln!(out, "# meshmend");
    if let Some(library) = material_library {
        let _ = writeln!(out, "mtllib {library}");
    }
    for p in &indexed.positions {
        let _ = writeln!(out, "v {} {} {}", p.x, p.y, p.z);
    }

    let mut active: Option<Color> = None;
    for (face, color) in indexed.faces.iter().zip(&indexed.colors) {
        if material_library.is_some() && *color != active {
            match color {
                Some(c) => {
                    let _ = writeln!(out, "usemtl {}", material_name(*c));
                }
                None => out.push_str("usemtl\n"),
            }
            active = *color;
        }
        out.push('f');
        for index in face {
            let _ = write!(out, " {}", index + 1);
        }
        out.push('\n');
    }

    for [a, b] in &indexed.flagged_edges {
        let _ = writeln!(out, "l {} {}", a + 1, b + 1);
    }
    out
}

/// `.mtl` text with one material per distinct face color, in first-use
/// order. Empty when no face is colored.
pub fn write_mtl(mesh: &Mesh) -> String {
    let mut seen = Vec::new();
    for face in mesh.face_keys() {
        if let Some(color) = mesh.face_color(face) {
            if !seen.contains(&color) {
                seen.push(color);
            }
        }
    }

    let mut out = String::new();
    for color in seen {
        let _ = writeln!(out, "newmtl {}", material_name(color));
        let _ = writeln!(out, "Kd {} {} {}", color[0], color[1], color[2]);
        out.push('\n');
    }
    out
}

fn parse_error(line: usize, message: impl Into<String>) -> MeshError {
    MeshError::Parse {
        line,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    #[test]
    fn test_parse_index_forms() {
        let source = "\
# quad and triangle
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1/1 2/2/2 3//3 4
f -4 -2 -1
";
        let document = parse_obj(source).unwrap();
        assert_eq!(document.positions.len(), 4);
        assert_eq!(document.faces, vec![vec![0, 1, 2, 3], vec![0, 2, 3]]);
        assert_eq!(document.face_materials, vec![None, None]);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2 7\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 3, .. }));

        let err = parse_obj("v 0 zero 0\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 1, .. }));

        assert!(parse_obj("v 0 0 0\nf 0 1 1\n").is_err());
    }

    #[test]
    fn test_materials_resolve_to_colors() {
        let source = "\
mtllib scene.mtl
v 0 0 0
v 1 0 0
v 0 1 0
usemtl rgb_ff0000
f 1 2 3
usemtl steel
f 1 2 3
usemtl
f 1 2 3
";
        let document = parse_obj(source).unwrap();
        assert_eq!(document.material_libraries, vec!["scene.mtl".to_string()]);

        let library = parse_mtl("newmtl steel\nKd 0.5 0.5 0.5\n");
        let indexed = document.into_indexed(&library);
        assert_eq!(indexed.colors, vec![Some([1.0, 0.0, 0.0]), Some([0.5, 0.5, 0.5]), None]);
    }

    #[test]
    fn test_line_records_become_segments() {
        let source = "v 0 0 0\nv 1 0 0\nv 1 1 0\nl 1 2 3\nl -1/1 -3/3\n";
        let document = parse_obj(source).unwrap();
        assert_eq!(document.lines, vec![[0, 1], [1, 2], [2, 0]]);
        assert!(document.faces.is_empty());

        let err = parse_obj("v 0 0 0\nl 1\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_flagged_edges_written_as_lines() {
        let mut mesh = Primitive::square_fan(1, 1.0).to_mesh();
        assert!(!write_obj(&mesh, None).contains("\nl "));

        let edge = mesh.edge_keys()[1];
        mesh.set_edge_flag(edge, true);
        let [a, b] = mesh.to_indexed().flagged_edges[0];

        let text = write_obj(&mesh, None);
        let lines: Vec<_> = text.lines().filter(|l| l.starts_with("l ")).collect();
        assert_eq!(lines, vec![format!("l {} {}", a + 1, b + 1)]);
        assert_eq!(parse_obj(&text).unwrap().lines, vec![[a, b]]);
    }

    #[test]
    fn test_material_names() {
        assert_eq!(material_name([1.0, 0.0, 0.5]), "rgb_ff0080");
        assert_eq!(parse_material_color("rgb_ff0080"), Some([1.0, 0.0, 128.0 / 255.0]));
        assert_eq!(parse_material_color("rgb_zz0000"), None);
        assert_eq!(parse_material_color("steel"), None);
    }

    #[test]
    fn test_write_switches_materials() {
        let mut mesh = Primitive::square_fan(1, 1.0).to_mesh();
        let faces = mesh.face_keys();
        mesh.set_face_color(faces[1], Some([0.0, 1.0, 0.0]));

        let text = write_obj(&mesh, Some("out.mtl"));
        assert!(text.contains("mtllib out.mtl"));
        assert_eq!(text.matches("usemtl rgb_00ff00").count(), 1);
        assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 2);

        let mtl = write_mtl(&mesh);
        assert!(mtl.contains("newmtl rgb_00ff00"));
        assert!(mtl.contains("Kd 0 1 0"));

        let plain = write_obj(&mesh, None);
        assert!(!plain.contains("usemtl"));
    }
}
