//! Error types for mesh decimation operations.

use mesh_types::BufferError;
use thiserror::Error;

/// Errors that can occur during decimation.
///
/// Strategy failures are recoverable: the pipeline records them and moves on
/// to the next strategy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecimateError {
    /// Mesh has no triangles.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// Invalid target triangle count.
    #[error("invalid target triangle count: {0}")]
    InvalidTargetCount(usize),

    /// The exchange buffers are malformed.
    #[error("invalid mesh buffers: {0}")]
    Buffer(#[from] BufferError),

    /// A strategy reported an error or panicked.
    #[error("{strategy} failed: {reason}")]
    ExternalToolFailure {
        /// Strategy name.
        strategy: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// A strategy returned no triangles.
    #[error("{strategy} returned an empty mesh")]
    EmptyOutput {
        /// Strategy name.
        strategy: &'static str,
    },

    /// A strategy returned more triangles than it was given.
    #[error("{strategy} grew the mesh from {before} to {after} triangles")]
    Grew {
        /// Strategy name.
        strategy: &'static str,
        /// Triangles in.
        before: usize,
        /// Triangles out.
        after: usize,
    },

    /// A strategy removed nothing although the mesh was over budget.
    #[error("{strategy} made no progress at {triangles} triangles")]
    NoProgress {
        /// Strategy name.
        strategy: &'static str,
        /// Triangle count it stalled at.
        triangles: usize,
    },

    /// Geometry too degenerate for a strategy to work with.
    #[error("{strategy}: numeric degeneracy: {details}")]
    NumericDegeneracy {
        /// Strategy name.
        strategy: &'static str,
        /// What was being computed.
        details: String,
    },

    /// Every strategy in the chain failed.
    #[error("all {attempts} simplification strategies failed; last error: {last}")]
    AllStrategiesFailed {
        /// Number of strategies tried.
        attempts: usize,
        /// Message of the last failure.
        last: String,
    },
}

/// Result type for decimation operations.
pub type DecimateResult<T> = std::result::Result<T, DecimateError>;
