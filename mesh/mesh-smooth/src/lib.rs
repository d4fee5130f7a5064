//! Vertex relocation smoothing for stair-stepped meshes.
//!
//! Every mode moves deduplicated vertex groups toward a weighted centroid of
//! their neighbors and copies the result to each member, so triangle soups
//! stay watertight and the index buffer is never touched.
//!
//! # Modes
//!
//! - [`SmoothMode::Surface`]: blend between Taubin (volume preserving) and
//!   Laplacian (stronger, shrinks) per iteration via
//!   [`SmoothParams::strength`]
//! - [`SmoothMode::Heightmap`]: floor vertices are frozen, the rest move only
//!   horizontally, and neighbors across a vertical step are ignored
//! - [`SmoothMode::Contour`]: Chaikin corner cutting along the height-level
//!   contours of walls
//!
//! Neighbors are weighted uniformly or by clamped [`cotangent_weights`].
//!
//! # Example
//!
//! ```
//! use mesh_smooth::{smooth, Axis, NeighborWeighting, SmoothParams};
//! use mesh_types::{MeshBuffers, MeshTopology, unit_cube};
//!
//! let mesh = MeshBuffers::from_indexed_mesh(&unit_cube());
//! let params = SmoothParams::heightmap()
//!     .with_height_axis(Axis::Z)
//!     .with_weighting(NeighborWeighting::Cotangent);
//!
//! let report = smooth(&mesh, &params);
//! println!("{report}");
//! assert_eq!(report.geometry.face_count(), mesh.face_count());
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod blend;
mod contour;
mod cotangent;
mod error;
mod heightmap;
mod params;
mod relocate;
mod result;
mod smooth;

pub use blend::{LAPLACIAN_LAMBDA, TAUBIN_LAMBDA, TAUBIN_MU};
pub use cotangent::{MAX_COTANGENT_WEIGHT, MIN_COTANGENT_WEIGHT, cotangent, cotangent_weights};
pub use error::{SmoothError, SmoothResult};
pub use params::{Axis, DEFAULT_MAX_VERTICES, NeighborWeighting, SmoothMode, SmoothParams};
pub use result::SmoothReport;
pub use smooth::{smooth, smooth_with_progress};
