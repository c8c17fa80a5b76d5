//! Static line geometry.
//!
//! A [`Mesh`] is a vertex list plus index pairs. Meshes come from the
//! procedural generators in [`generators`] or from OBJ data via [`obj`], and
//! are run through [`normalize`] before use so every shape has the same
//! bounding-sphere diameter.

pub mod generators;
pub mod normalize;
pub mod obj;

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::geometry::Vec3;

pub use normalize::normalize;

/// Vertices and line segments referencing them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub lines: Vec<[usize; 2]>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vec3>, lines: Vec<[usize; 2]>) -> Self {
        Self { vertices, lines }
    }

    /// Mesh with nothing to draw.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from flat `x, y, z` triples.
    pub fn from_flat(raw: &[f64], lines: Vec<[usize; 2]>) -> Self {
        let vertices = raw
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0], c[1], c[2]))
            .collect();
        Self { vertices, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Segment endpoints; lines referencing missing vertices are skipped.
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.lines.iter().filter_map(|&[a, b]| {
            Some((*self.vertices.get(a)?, *self.vertices.get(b)?))
        })
    }

    /// Sum of all segment lengths.
    pub fn total_line_length(&self) -> f64 {
        self.segments().map(|(a, b)| (b - a).length()).sum()
    }

    /// Check every line index against the vertex count.
    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.vertices.len();
        match self.lines.iter().flatten().find(|&&i| i >= vertex_count) {
            Some(&index) => Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            }),
            None => Ok(()),
        }
    }
}

/// Errors from loading a mesh.
#[derive(Debug)]
pub enum MeshError {
    Io { path: PathBuf, source: io::Error },
    Parse { line: usize, message: String },
    IndexOutOfRange { index: usize, vertex_count: usize },
    MissingResource(String),
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::Parse { line, message } => write!(f, "line {line}: {message}"),
            Self::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(
                f,
                "vertex index {index} out of range ({vertex_count} vertices)"
            ),
            Self::MissingResource(name) => write!(f, "no embedded mesh named {name:?}"),
        }
    }
}

impl std::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
