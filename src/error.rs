//! Error types for lathwork.
//!
//! All fallible operations in the crate return [`Result`], an alias over
//! [`SubdivError`].

use thiserror::Error;

/// Result type alias using [`SubdivError`].
pub type Result<T> = std::result::Result<T, SubdivError>;

/// Errors that can occur while building, refining or dicing a subdivision mesh.
#[derive(Error, Debug)]
pub enum SubdivError {
    /// The mesh has no facets.
    #[error("mesh has no facets")]
    EmptyMesh,

    /// A facet references a vertex outside the declared vertex range.
    #[error("facet {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The facet index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A facet has fewer than three corners or repeats a vertex.
    #[error("facet {face} is degenerate")]
    DegenerateFace {
        /// The facet index.
        face: usize,
    },

    /// The laths around a vertex could not be linked into one fan.
    #[error("non-manifold vertex {vertex}: linked {linked} of {total} laths")]
    NonManifold {
        /// The offending vertex.
        vertex: usize,
        /// Number of laths reached by the forward and backward walks.
        linked: usize,
        /// Number of laths referencing the vertex.
        total: usize,
    },

    /// The topology has not been finalised.
    #[error("topology has not been finalised")]
    NotFinalised,

    /// A lath handle does not refer to a lath in the arena.
    #[error("invalid lath handle {0}")]
    InvalidLath(usize),

    /// A facet index is out of range.
    #[error("invalid facet index {0}")]
    InvalidFacet(usize),

    /// A traversal needed a vertex link that does not exist.
    #[error("vertex ring open at lath {lath}")]
    OpenVertexRing {
        /// The lath whose vertex link was missing.
        lath: usize,
    },

    /// No facet contains the requested edge.
    #[error("no facet contains edge ({v0}, {v1})")]
    UnknownEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// Attribute arrays disagree with each other or with the vertex count.
    #[error("attribute mismatch: {0}")]
    AttributeMismatch(String),

    /// Refinement would exceed the maximum subdivision level.
    #[error("subdivision level {level} exceeds the limit of {limit}")]
    DepthLimit {
        /// The level that was requested.
        level: u32,
        /// The configured maximum.
        limit: u32,
    },

    /// The lath or vertex arena has outgrown the handle's integer type.
    #[error("index {index} exceeds the capacity of {limit} for this index type")]
    IndexOverflow {
        /// The index that was requested.
        index: usize,
        /// The largest index the type can hold.
        limit: usize,
    },

    /// A thread panicked while holding the topology lock.
    #[error("topology lock poisoned")]
    LockPoisoned,

    /// I/O error while writing a diagnostic dump.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

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
}

impl SubdivError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        SubdivError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for SubdivError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        SubdivError::LockPoisoned
    }
}
