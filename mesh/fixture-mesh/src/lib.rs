//! Mesh processing pipeline for fixture design.
//!
//! This umbrella crate re-exports the mesh-* crates and adds [`process`],
//! which runs the stages in their fixed order with a single progress stream.
//!
//! # Quick Start
//!
//! ```
//! use fixture_mesh::prelude::*;
//!
//! let mesh = MeshBuffers::from_indexed_mesh(&fixture_mesh::types::unit_cube());
//!
//! // Read-only diagnostics
//! let analysis = analyze(&mesh, None);
//! assert!(analysis.is_manifold);
//!
//! // Everything at once
//! let options = ProcessOptions::for_csg()
//!     .with_target_triangles(8)
//!     .with_smoothing(SmoothParams::taubin(2));
//! let report = process(&mesh, &options);
//! assert!(report.triangle_count() <= 12);
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - `MeshBuffers` exchange format, `IndexedMesh`, progress
//! - [`repair`] - Vertex graph, topology analysis, repair, CSG cleanup
//! - [`decimate`] - QEM edge collapse and the fallback pipeline
//! - [`smooth`] - Taubin/Laplacian, heightmap and contour smoothing
//!
//! # Stage Order
//!
//! analyze → repair → cleanup → decimate → smooth. Each stage is optional
//! except analysis, and each reads the previous stage's output.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod process;

// =============================================================================
// Re-exports
// =============================================================================

/// Core data structures: `MeshBuffers`, `IndexedMesh`, `Aabb`, progress.
pub use mesh_types as types;

/// Vertex graph, analysis, repair and CSG cleanup.
pub use mesh_repair as repair;

/// Mesh simplification with fallback strategies.
pub use mesh_decimate as decimate;

/// Vertex relocation smoothing.
pub use mesh_smooth as smooth;

pub use mesh_smooth::SmoothParams;
pub use process::{
    ProcessError, ProcessOptions, ProcessReport, process, process_with_pipeline,
    process_with_progress,
};

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for mesh processing.
///
/// # Usage
///
/// ```
/// use fixture_mesh::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use mesh_types::{
        Aabb, IndexedMesh, MeshBuffers, MeshTopology, ProgressReporter, ProgressStage,
    };

    // Analysis, repair, cleanup
    pub use mesh_repair::{
        AnalysisResult, CleanupParams, CleanupReport, RepairReport, VertexGraph, analyze,
        cleanup_csg, repair,
    };

    // Decimation
    pub use mesh_decimate::{DecimationPipeline, DecimationReport, Simplifier, decimate};

    // Smoothing
    pub use mesh_smooth::{SmoothMode, SmoothParams, SmoothReport, smooth};

    // Pipeline
    pub use crate::{ProcessOptions, ProcessReport, process};
}

// =============================================================================
// Tests
// =============================================================================
