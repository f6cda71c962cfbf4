//! MeshError: unified error type for mesh-connectivity public APIs
//!
//! Every fallible construction step returns this type. All variants are fatal
//! for the mesh being built: there is no partial-success mode, so callers get
//! either a complete table set or one of these diagnostics naming the
//! offending entity.

use thiserror::Error;

/// Unified error type for mesh construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// A node or element source could not be opened or read.
    #[error("I/O error on `{path}`: {message}")]
    Io { path: String, message: String },
    /// A line of an input file could not be parsed or is inconsistent.
    #[error("format error in {file} data, line {line}: {message}")]
    Format {
        file: &'static str,
        line: usize,
        message: String,
    },
    /// The element header declares a different per-cell variable count than
    /// the caller expects.
    #[error("element data declares {declared} variables per cell, expected {expected}")]
    VariableCount { expected: usize, declared: usize },
    /// A cell's node list is not counter-clockwise (2D) or right-handed (3D).
    #[error("winding error: cell {cell} has signed measure {measure} (must be > 0)")]
    Winding { cell: usize, measure: f64 },
    /// An edge is shared by more than two cells.
    #[error(
        "topology error: edge {edge:?} of cell {cell} (slot {slot}) is shared with {matches} other cells"
    )]
    NonManifoldEdge {
        cell: usize,
        slot: usize,
        edge: (usize, usize),
        matches: usize,
    },
    /// A slot of an adjacency table was never discovered.
    #[error("topology error: `{table}` slot of entity {entity} was never filled")]
    UnfilledSlot { table: &'static str, entity: usize },
    /// More incidences were inserted into a bucket than it was sized for.
    #[error("topology error: `{table}` bucket of entity {entity} overflowed")]
    BucketOverflow { table: &'static str, entity: usize },
    /// A node flagged as boundary lies on no boundary edge.
    #[error("topology error: boundary node {node} lies on no boundary edge")]
    DetachedBoundaryNode { node: usize },
    /// A node's incidence list names a cell that does not contain it.
    #[error("topology error: node {node} is not a vertex of incident cell {cell}")]
    NodeNotInCell { node: usize, cell: usize },
    /// Structured grid or boundary geometry is unusable.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// A rank decomposition request cannot be satisfied.
    #[error("invalid decomposition: {0}")]
    InvalidDecomposition(String),
    /// A built table set violates one of its structural invariants.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl MeshError {
    /// Shorthand for a [`MeshError::Format`] on the given input file kind.
    pub(crate) fn format(file: &'static str, line: usize, message: impl Into<String>) -> Self {
        MeshError::Format {
            file,
            line,
            message: message.into(),
        }
    }

    /// True for the topology family (`TopologyError` in the error taxonomy).
    pub fn is_topology(&self) -> bool {
        matches!(
            self,
            MeshError::NonManifoldEdge { .. }
                | MeshError::UnfilledSlot { .. }
                | MeshError::BucketOverflow { .. }
                | MeshError::DetachedBoundaryNode { .. }
                | MeshError::NodeNotInCell { .. }
        )
    }
}

impl From<std::io::Error> for MeshError {
    fn from(err: std::io::Error) -> Self {
        MeshError::Io {
            path: "<stream>".into(),
            message: err.to_string(),
        }
    }
}
