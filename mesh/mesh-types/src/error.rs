//! Validation errors for exchange buffers.

use thiserror::Error;

/// Result type for buffer validation.
pub type BufferResult<T> = Result<T, BufferError>;

/// A malformed [`MeshBuffers`](crate::MeshBuffers).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Position buffer length is not a multiple of three.
    #[error("position buffer length {len} is not a multiple of 3")]
    PositionLength {
        /// Length of the position buffer.
        len: usize,
    },

    /// A non-indexed mesh whose vertex count is not a multiple of three.
    #[error("non-indexed mesh has {vertices} vertices, not a multiple of 3")]
    SoupVertexCount {
        /// Number of vertex slots.
        vertices: usize,
    },

    /// Normal buffer length differs from the position buffer length.
    #[error("normal buffer length {normals} does not match position buffer length {positions}")]
    NormalLength {
        /// Length of the normal buffer.
        normals: usize,
        /// Length of the position buffer.
        positions: usize,
    },

    /// Index buffer length is not a multiple of three.
    #[error("index buffer length {len} is not a multiple of 3")]
    IndexLength {
        /// Length of the index buffer.
        len: usize,
    },

    /// An index references a slot past the end of the position buffer.
    #[error("invalid vertex index {index} (mesh has {vertex_count} vertices)")]
    IndexOutOfRange {
        /// The invalid index.
        index: u32,
        /// Total number of vertex slots.
        vertex_count: usize,
    },

    /// A position component is NaN or infinite.
    #[error("vertex {slot} has a non-finite coordinate")]
    NonFinitePosition {
        /// The offending vertex slot.
        slot: usize,
    },
}
