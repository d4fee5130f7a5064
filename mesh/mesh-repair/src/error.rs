//! Error types for mesh repair operations.

use mesh_types::BufferError;
use thiserror::Error;

/// Result type for repair operations.
pub type RepairResult<T> = Result<T, RepairError>;

/// Errors that can occur during mesh repair and cleanup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepairError {
    /// Mesh is empty (no vertices or faces).
    #[error("mesh is empty")]
    EmptyMesh,

    /// The exchange buffers are malformed.
    #[error("invalid mesh buffers: {0}")]
    Buffer(#[from] BufferError),

    /// A geometric quantity came out NaN or infinite.
    #[error("numeric degeneracy: {details}")]
    NumericDegeneracy {
        /// What was being computed.
        details: String,
    },
}
