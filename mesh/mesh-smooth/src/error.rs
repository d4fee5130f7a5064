//! Error types for smoothing.

use mesh_types::BufferError;
use thiserror::Error;

/// Errors that can occur during smoothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SmoothError {
    /// Mesh has no triangles.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// The exchange buffers are malformed.
    #[error("invalid mesh buffers: {0}")]
    Buffer(#[from] BufferError),

    /// Mesh is too large to smooth.
    #[error("{vertices} vertices exceeds the smoothing limit of {limit}")]
    ResourceLimitExceeded {
        /// Vertex slots in the mesh.
        vertices: usize,
        /// Configured ceiling.
        limit: usize,
    },

    /// Parameters or geometry produced non-finite values.
    #[error("numeric degeneracy: {details}")]
    NumericDegeneracy {
        /// What went wrong.
        details: String,
    },
}

/// Result type for smoothing operations.
pub type SmoothResult<T> = std::result::Result<T, SmoothError>;
