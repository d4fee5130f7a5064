//! Topology analysis, repair and CSG cleanup for fixture meshes.
//!
//! This crate provides:
//! - [`VertexGraph`] - position-deduplicated vertex groups and their edges
//! - [`analyze`] - read-only diagnostics: counts, degenerate faces, edge
//!   classification, manifold verdict
//! - [`repair`] - degenerate triangle removal with normal recomputation
//! - [`cleanup_csg`] - connected-component filtering of boolean results
//! - Vertex welding and index cleanup for [`IndexedMesh`](mesh_types::IndexedMesh)
//!
//! Every operation takes a [`MeshBuffers`](mesh_types::MeshBuffers) by
//! reference and returns new buffers inside a report.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Example
//!
//! ```
//! use mesh_repair::{CleanupParams, analyze, cleanup_csg, repair};
//! use mesh_types::{MeshBuffers, unit_cube};
//!
//! let mesh = MeshBuffers::from_indexed_mesh(&unit_cube());
//!
//! let analysis = analyze(&mesh, None);
//! println!("{analysis}");
//!
//! let repaired = repair(&mesh);
//! let cleaned = repaired
//!     .geometry
//!     .map(|g| cleanup_csg(&g, &CleanupParams::default()));
//! assert!(cleaned.is_some_and(|c| c.success()));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod adjacency;
mod analyze;
pub mod components;
mod error;
mod graph;
mod repair;
mod weld;

pub use adjacency::MeshAdjacency;
pub use analyze::{
    AnalysisResult, AnalyzeOptions, DEFAULT_DEGENERATE_EPSILON, analyze, analyze_with_options,
    is_degenerate_face,
};
pub use components::{
    CleanupParams, CleanupReport, ComponentStats, RemovalReason, UnionFind, cleanup_csg,
};
pub use error::{RepairError, RepairResult};
pub use graph::{DEFAULT_PRECISION, MAX_PRECISION, VertexGraph};
pub use repair::{RepairReport, repair, repair_with_epsilon};
pub use weld::{
    remove_degenerate_faces, remove_duplicate_faces, remove_unreferenced_vertices, weld_buffers,
    weld_vertices,
};
