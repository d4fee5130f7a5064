//! Mesh simplification to a triangle budget.
//!
//! This crate reduces triangle counts with quadric error metric (QEM) edge
//! collapse and wraps it in a [`DecimationPipeline`] that falls back to more
//! forgiving strategies when a stage fails, so a caller always gets usable
//! geometry back.
//!
//! # Features
//!
//! - **Edge collapse**: [`decimate_mesh`] collapses the cheapest edge first,
//!   with link-condition and face-flip checks
//! - **Boundary preservation**: open boundaries are locked by default
//! - **Sharp feature preservation**: optionally keep creases
//! - **Strategies**: [`QemSimplifier`], [`RepairingSimplifier`],
//!   [`ClusteringSimplifier`] and the [`MeshoptSimplifier`] coarse pass share
//!   the [`Simplifier`] trait
//! - **Pipeline**: ordered trial loop with per-attempt diagnostics in a
//!   [`DecimationReport`]
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use mesh_decimate::{decimate, decimate_mesh, DecimateParams};
//! use mesh_types::{MeshBuffers, unit_cube};
//!
//! // Edge collapse on an indexed mesh
//! let cube = unit_cube();
//! let result = decimate_mesh(&cube, &DecimateParams::with_target_ratio(0.5));
//! println!("{result}");
//!
//! // Full pipeline on exchange buffers
//! let buffers = MeshBuffers::from_indexed_mesh(&cube);
//! let report = decimate(&buffers, 8);
//! assert!(report.final_triangles <= report.original_triangles);
//! ```
//!
//! # Algorithm
//!
//! 1. Each vertex accumulates the area-weighted plane quadrics of its faces
//! 2. Each edge is priced at the point minimizing the combined quadric
//! 3. The cheapest valid edge is collapsed and its neighborhood re-priced
//! 4. Stop at the target or when no valid collapse remains

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod coarse;
mod decimate;
mod error;
mod params;
mod pipeline;
mod quadric;
mod result;
mod simplifier;

pub use coarse::MeshoptSimplifier;
pub use decimate::decimate_mesh;
pub use error::{DecimateError, DecimateResult};
pub use params::{DecimateParams, PipelineParams};
pub use pipeline::{DecimationPipeline, decimate, decimate_with_progress};
pub use quadric::Quadric;
pub use result::{DecimationReport, DecimationResult, StageAttempt};
pub use simplifier::{ClusteringSimplifier, QemSimplifier, RepairingSimplifier, Simplifier};
