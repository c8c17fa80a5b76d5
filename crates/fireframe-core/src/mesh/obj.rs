//! Wavefront OBJ import, reduced to a wireframe.
//!
//! Only `v` and `f` records matter; everything else (normals, texture
//! coordinates, groups, materials) is skipped. Face vertices may use the
//! `v`, `v/vt`, `v//vn` or `v/vt/vn` forms and negative (relative) indices.
//! Each polygon contributes its boundary edges; an edge shared by two faces
//! is emitted once regardless of direction. Y is negated so the model's
//! "up" points toward the top of the screen.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::{Mesh, MeshError};
use crate::geometry::Vec3;

/// Meshes compiled into the binary, by name.
pub const EMBEDDED: &[(&str, &str)] = &[("Gem", include_str!("../../assets/meshes/gem.obj"))];

/// Load an embedded mesh by (case-insensitive) name.
pub fn load_resource(name: &str) -> Result<Mesh, MeshError> {
    let (_, text) = EMBEDDED
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .ok_or_else(|| MeshError::MissingResource(name.to_string()))?;
    parse(text)
}

pub fn load_file(path: &Path) -> Result<Mesh, MeshError> {
    let text = fs::read_to_string(path).map_err(|source| MeshError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

pub fn parse(text: &str) -> Result<Mesh, MeshError> {
    let mut vertices = Vec::new();
    let mut lines = Vec::new();
    let mut seen = HashSet::new();
    let mut face = Vec::new();

    for (line_no, raw) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let record = raw.split('#').next().unwrap_or_default();
        let mut parts = record.split_whitespace();
        match parts.next() {
            Some("v") => {
                let mut coord = || -> Result<f64, MeshError> {
                    let tok = parts.next().ok_or_else(|| MeshError::Parse {
                        line: line_no,
                        message: "vertex needs three coordinates".into(),
                    })?;
                    tok.parse().map_err(|_| MeshError::Parse {
                        line: line_no,
                        message: format!("bad coordinate {tok:?}"),
                    })
                };
                let (x, y, z) = (coord()?, coord()?, coord()?);
                vertices.push(Vec3::new(x, -y, z));
            }
            Some("f") => {
                face.clear();
                for tok in parts {
                    face.push(resolve_index(tok, vertices.len(), line_no)?);
                }
                if face.len() < 2 {
                    continue;
                }
                for (i, &a) in face.iter().enumerate() {
                    let b = face[(i + 1) % face.len()];
                    if a != b && seen.insert((a.min(b), a.max(b))) {
                        lines.push([a, b]);
                    }
                }
            }
            _ => {}
        }
    }

    let mesh = Mesh::new(vertices, lines);
    mesh.validate()?;
    Ok(mesh)
}

/// Turn a 1-based (or negative, relative) face index into a 0-based one.
fn resolve_index(tok: &str, vertex_count: usize, line: usize) -> Result<usize, MeshError> {
    let head = tok.split('/').next().unwrap_or_default();
    let n: i64 = head.parse().map_err(|_| MeshError::Parse {
        line,
        message: format!("bad face index {tok:?}"),
    })?;
    let resolved = match n {
        0 => None,
        n if n > 0 => usize::try_from(n - 1).ok(),
        n => usize::try_from(vertex_count as i64 + n).ok(),
    };
    resolved.ok_or_else(|| MeshError::Parse {
        line,
        message: format!("face index {n} does not name a vertex"),
    })
}
