//! Error types for proxima.

use thiserror::Error;

/// Errors that can occur while running a nearest-neighbor query.
#[derive(Debug, Error)]
pub enum SearchError {
    /// `k` (the requested result count) was zero.
    #[error("topN must be at least 1; got {0}")]
    InvalidTopN(usize),

    /// The query origin was empty.
    #[error("query origin must have at least one dimension")]
    EmptyOrigin,

    /// The query origin contained a NaN coordinate.
    #[error("query origin has NaN at dimension {0}")]
    NanOrigin(usize),

    /// Dimension mismatch between the query origin and a segment.
    #[error("dimension mismatch: origin has {origin_dims} dimensions, segment has {segment_dims}")]
    DimensionMismatch {
        origin_dims: usize,
        segment_dims: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The index holds no points.
    #[error("index is empty")]
    EmptyIndex,

    /// The index was queried before being built.
    #[error("index not built")]
    NotBuilt,

    /// The index violated a structural invariant (e.g. an empty leaf block,
    /// or a bounding box with min above max). The query is abandoned rather
    /// than returning a possibly wrong result.
    #[error("corrupt point index: {0}")]
    CorruptIndex(String),

    /// I/O error propagated from a disk-backed tree cursor.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for proxima operations.
pub type Result<T> = std::result::Result<T, SearchError>;
