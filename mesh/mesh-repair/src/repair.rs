//! Degenerate triangle removal.
//!
//! [`repair`] is the one pipeline stage allowed to fail without handing back
//! geometry: if the input cannot be read, the report carries the error and no
//! mesh.

use std::fmt;

use mesh_types::{MeshBuffers, MeshTopology};
use tracing::{info, warn};

use crate::analyze::{DEFAULT_DEGENERATE_EPSILON, is_degenerate_face};
use crate::error::{RepairError, RepairResult};

/// Outcome of [`repair`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairReport {
    /// Repaired mesh, or `None` when the input could not be processed.
    pub geometry: Option<MeshBuffers>,
    /// Triangles in the input.
    pub original_triangles: usize,
    /// Triangles in the output.
    pub triangle_count: usize,
    /// Degenerate triangles removed.
    pub removed_triangles: usize,
    /// What was done, in order.
    pub actions: Vec<String>,
    /// Why the repair failed, if it did.
    pub error: Option<RepairError>,
}

impl RepairReport {
    /// Whether the repair produced geometry.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.error.is_none()
    }

    fn failed(original_triangles: usize, error: RepairError) -> Self {
        Self {
            original_triangles,
            error: Some(error),
            ..Self::default()
        }
    }
}

impl fmt::Display for RepairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(e) => write!(f, "Repair failed: {e}"),
            None => write!(
                f,
                "Repair: {} -> {} triangles ({} degenerate removed)",
                self.original_triangles, self.triangle_count, self.removed_triangles
            ),
        }
    }
}

/// Remove degenerate triangles with the default threshold.
///
/// The output keeps the input's storage mode and triangle order, drops
/// triangles whose squared cross-product length is below `1e-12`, and has
/// freshly accumulated vertex normals. Removing every triangle is not an
/// error.
///
/// # Example
///
/// ```
/// use mesh_repair::repair;
/// use mesh_types::{MeshBuffers, MeshTopology};
///
/// // Collinear corners.
/// let mesh = MeshBuffers::soup(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
/// let report = repair(&mesh);
///
/// assert!(report.success());
/// assert_eq!(report.triangle_count, 0);
/// assert_eq!(report.geometry.map(|g| g.face_count()), Some(0));
/// ```
#[must_use]
pub fn repair(mesh: &MeshBuffers) -> RepairReport {
    repair_with_epsilon(mesh, DEFAULT_DEGENERATE_EPSILON)
}

/// Remove degenerate triangles below `epsilon` (squared cross length).
#[must_use]
pub fn repair_with_epsilon(mesh: &MeshBuffers, epsilon: f64) -> RepairReport {
    let original_triangles = mesh.face_count();
    info!(triangles = original_triangles, epsilon, "Starting repair");

    match try_repair(mesh, epsilon) {
        Ok((geometry, removed)) => {
            let triangle_count = geometry.face_count();
            let mut actions = Vec::new();
            if removed > 0 {
                actions.push(format!("removed {removed} degenerate triangle(s)"));
            }
            actions.push("recomputed vertex normals".to_owned());

            info!(
                original = original_triangles,
                result = triangle_count,
                removed,
                "Repair complete"
            );

            RepairReport {
                geometry: Some(geometry),
                original_triangles,
                triangle_count,
                removed_triangles: removed,
                actions,
                error: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "Repair failed");
            RepairReport::failed(original_triangles, e)
        }
    }
}

fn try_repair(mesh: &MeshBuffers, epsilon: f64) -> RepairResult<(MeshBuffers, usize)> {
    mesh.validate()?;
    if mesh.is_empty() {
        return Err(RepairError::EmptyMesh);
    }
    if !epsilon.is_finite() || epsilon < 0.0 {
        return Err(RepairError::NumericDegeneracy {
            details: format!("degenerate threshold {epsilon} is not a finite non-negative number"),
        });
    }

    let keep: Vec<bool> = (0..mesh.face_count())
        .map(|face| !is_degenerate_face(mesh, face, epsilon))
        .collect();
    let removed = keep.iter().filter(|&&k| !k).count();

    Ok((mesh.select_faces(&keep), removed))
}
