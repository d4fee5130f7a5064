//! Core mesh types for the fixture mesh pipeline.
//!
//! This crate provides the foundational types shared by every pipeline stage:
//!
//! - [`MeshBuffers`] - The exchange format at the importer/viewer boundary:
//!   flat `f32` positions, optional normals, optional `u32` indices
//! - [`IndexedMesh`] - A welded, `f64` triangle mesh used by simplifiers
//! - [`Triangle`] - A concrete triangle with vertex positions
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`ProgressReporter`] - Monotonic progress events for long-running stages
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Storage modes
//!
//! A [`MeshBuffers`] is either *indexed* (an index buffer references shared
//! position slots) or a *triangle soup* (every three consecutive position
//! slots form one triangle). The mode is fixed at construction and exposed
//! through [`MeshTopology::corners`], so algorithms never probe buffers to
//! find out how to read a triangle.
//!
//! # Coordinate System
//!
//! Coordinates are unit-agnostic. Height-aware algorithms default to **Y up**,
//! matching the viewer that produces and consumes these buffers.
//!
//! # Example
//!
//! ```
//! use mesh_types::{MeshBuffers, MeshTopology};
//!
//! let mesh = MeshBuffers::soup(vec![
//!     0.0, 0.0, 0.0,
//!     1.0, 0.0, 0.0,
//!     0.0, 1.0, 0.0,
//! ]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert_eq!(mesh.vertex_count(), 3);
//! assert!(!mesh.is_indexed());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bounds;
mod buffers;
mod error;
mod mesh;
mod normals;
mod progress;
mod traits;
mod triangle;
mod vertex;

pub use bounds::Aabb;
pub use buffers::MeshBuffers;
pub use error::{BufferError, BufferResult};
pub use mesh::{IndexedMesh, unit_cube};
pub use normals::accumulate_vertex_normals;
pub use progress::{ProgressFn, ProgressReporter, ProgressStage};
pub use traits::MeshTopology;
pub use triangle::Triangle;
pub use vertex::Vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
