//! Error types for stlmesh.
//!
//! Errors fall into two disjoint categories. Read and input-validation
//! failures ([`MeshError::Io`], [`MeshError::Read`], ...) describe bad data
//! handed to the crate. [`MeshError::Consistency`] means a mesh invariant was
//! broken during construction or export; those are never recoverable.

use std::path::PathBuf;

use nalgebra::Point3;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while reading, welding, building or exporting meshes.
#[derive(Error, Debug)]
pub enum MeshError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or truncated triangle soup data.
    #[error("failed to read triangle soup: {message}")]
    Read {
        /// Description of the problem.
        message: String,
    },

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A triangle references an invalid point index.
    #[error("triangle {triangle} references invalid point index {index}")]
    InvalidVertexIndex {
        /// The triangle index.
        triangle: usize,
        /// The invalid point index.
        index: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// A mesh invariant was violated.
    #[error("internal consistency violation: {0}")]
    Consistency(#[from] ConsistencyError),
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a read error from anything printable.
    pub fn read<T: std::fmt::Display>(message: T) -> Self {
        MeshError::Read {
            message: message.to_string(),
        }
    }

    /// Returns `true` if this error signals a broken mesh invariant rather
    /// than bad input.
    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, MeshError::Consistency(_))
    }
}

/// Broken invariants detected by the mesh engine.
///
/// None of these can be triggered by well-formed triangle input through the
/// public construction API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsistencyError {
    /// A point was present in the position index with no half-edges.
    #[error("empty half-edge bucket for point {point:?}")]
    EmptyPositionBucket {
        /// The indexed point.
        point: Point3<f64>,
    },

    /// Half-edges indexed under one point start at different vertices.
    #[error("half-edges at point {point:?} disagree on their start vertex")]
    VertexMismatch {
        /// The indexed point.
        point: Point3<f64>,
    },

    /// An indexed half-edge has no start vertex.
    #[error("half-edge at point {point:?} has no start vertex")]
    NullVertex {
        /// The indexed point.
        point: Point3<f64>,
    },

    /// A symmetric pairing was found whose end point does not match.
    #[error("symmetric half-edge ends at {found:?}, expected {expected:?}")]
    SymmetricPointMismatch {
        /// The point the pairing had to end at.
        expected: Point3<f64>,
        /// The point it actually ends at.
        found: Point3<f64>,
    },

    /// A facet vertex could not be located in the mesh's vertex list.
    #[error("facet vertex {point:?} is missing from the vertex list")]
    ExportVertexMissing {
        /// The facet point.
        point: Point3<f64>,
    },
}
