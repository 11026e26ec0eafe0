//! Loader for the small subset of the Wavefront OBJ format the engine draws.
//!
//! Recognized lines are `v x y z`, `vt u v`, `vn x y z` and triangular faces
//! `f p/t/n p/t/n p/t/n` with 1-based indices. Everything else is skipped.
//! The output is flattened: every face corner becomes its own vertex, ready
//! to be uploaded and drawn as a triangle list without an index buffer.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use thiserror::Error;

/// Flat, index-free geometry. The three streams always have the same length,
/// a multiple of 3.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub normals: Vec<Vec3>,
}

impl MeshGeometry {
    #[inline(always)]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline(always)]
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// The table a face index points into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Position,
    TextureCoordinate,
    Normal,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Position => write!(f, "position"),
            AttributeKind::TextureCoordinate => write!(f, "texture coordinate"),
            AttributeKind::Normal => write!(f, "normal"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("the model {path:?} does not exist or cannot be opened")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: could not read model data")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: '{keyword}' needs {expected} components, found {found}")]
    MissingComponent {
        line: usize,
        keyword: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: '{token}' is not a number")]
    InvalidNumber { line: usize, token: String },
    #[error("line {line}: face lists {found} vertices, only triangles are supported")]
    MalformedFace { line: usize, found: usize },
    #[error("line {line}: vertex reference '{token}' is not of the form position/uv/normal")]
    MalformedVertexRef { line: usize, token: String },
    #[error("line {line}: '{token}' is not a valid 1-based index")]
    InvalidIndex { line: usize, token: String },
    #[error("line {line}: {kind} index {index} is out of range ({available} declared)")]
    IndexOutOfRange {
        line: usize,
        kind: AttributeKind,
        index: usize,
        available: usize,
    },
}

/// One face corner, still 1-based
#[derive(Debug, Clone, Copy)]
struct VertexRef {
    line: usize,
    position: usize,
    uv: usize,
    normal: usize,
}

/// Load and flatten the OBJ file at `path`
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshGeometry, ModelError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let geometry = parse_obj(BufReader::new(file))?;
    log::info!(
        "Loaded model {:?}: {} triangles",
        path,
        geometry.triangle_count()
    );
    Ok(geometry)
}

/// Parse OBJ text from any buffered reader
pub fn parse_obj<R: BufRead>(reader: R) -> Result<MeshGeometry, ModelError> {
    let mut positions: Vec<Vec3> = vec![];
    let mut uvs: Vec<Vec2> = vec![];
    let mut normals: Vec<Vec3> = vec![];
    let mut corners: Vec<VertexRef> = vec![];

    for (i, line) in reader.lines().enumerate() {
        let line_number = i + 1;
        let line = line.map_err(|source| ModelError::Read {
            line: line_number,
            source,
        })?;
        let mut words = line.split_whitespace();

        match words.next() {
            Some("v") => {
                let [x, y, z] = parse_floats::<3>(words, "v", line_number)?;
                positions.push(Vec3::new(x, y, z));
            }
            Some("vt") => {
                let [u, v] = parse_floats::<2>(words, "vt", line_number)?;
                uvs.push(Vec2::new(u, v));
            }
            Some("vn") => {
                let [x, y, z] = parse_floats::<3>(words, "vn", line_number)?;
                normals.push(Vec3::new(x, y, z));
            }
            Some("f") => {
                let references: Vec<&str> = words.collect();
                if references.len() != 3 {
                    return Err(ModelError::MalformedFace {
                        line: line_number,
                        found: references.len(),
                    });
                }
                for reference in references {
                    corners.push(parse_vertex_ref(reference, line_number)?);
                }
            }
            // Blank lines, comments and everything we don't draw
            _ => {}
        }
    }

    // Resolve after the scan: faces may point at vertices declared below them
    let mut geometry = MeshGeometry {
        positions: Vec::with_capacity(corners.len()),
        uvs: Vec::with_capacity(corners.len()),
        normals: Vec::with_capacity(corners.len()),
    };
    for corner in corners.iter() {
        geometry.positions.push(resolve(
            &positions,
            corner.position,
            AttributeKind::Position,
            corner.line,
        )?);
        geometry.uvs.push(resolve(
            &uvs,
            corner.uv,
            AttributeKind::TextureCoordinate,
            corner.line,
        )?);
        geometry.normals.push(resolve(
            &normals,
            corner.normal,
            AttributeKind::Normal,
            corner.line,
        )?);
    }

    Ok(geometry)
}

/// Parse OBJ text held in memory
pub fn parse_obj_str(source: &str) -> Result<MeshGeometry, ModelError> {
    parse_obj(source.as_bytes())
}

fn parse_floats<'a, const N: usize>(
    mut words: impl Iterator<Item = &'a str>,
    keyword: &'static str,
    line: usize,
) -> Result<[f32; N], ModelError> {
    let mut values = [0.0; N];
    for (found, value) in values.iter_mut().enumerate() {
        let token = words.next().ok_or(ModelError::MissingComponent {
            line,
            keyword,
            expected: N,
            found,
        })?;
        *value = token.parse().map_err(|_| ModelError::InvalidNumber {
            line,
            token: token.to_string(),
        })?;
    }
    Ok(values)
}

fn parse_vertex_ref(token: &str, line: usize) -> Result<VertexRef, ModelError> {
    let parts: Vec<&str> = token.split('/').collect();
    if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
        return Err(ModelError::MalformedVertexRef {
            line,
            token: token.to_string(),
        });
    }

    let index = |part: &str| -> Result<usize, ModelError> {
        match part.parse::<usize>() {
            Ok(index) if index > 0 => Ok(index),
            _ => Err(ModelError::InvalidIndex {
                line,
                token: part.to_string(),
            }),
        }
    };

    Ok(VertexRef {
        line,
        position: index(parts[0])?,
        uv: index(parts[1])?,
        normal: index(parts[2])?,
    })
}

/// Look up a 1-based `index` in `table`
fn resolve<T: Copy>(
    table: &[T],
    index: usize,
    kind: AttributeKind,
    line: usize,
) -> Result<T, ModelError> {
    table
        .get(index - 1)
        .copied()
        .ok_or(ModelError::IndexOutOfRange {
            line,
            kind,
            index,
            available: table.len(),
        })
}
