//! Smoothing report.

use std::fmt;

use mesh_types::MeshBuffers;

use crate::error::SmoothError;

/// Outcome of [`smooth`](crate::smooth).
///
/// `geometry` is always usable: on error it is a copy of the input.
#[derive(Debug, Clone, Default)]
pub struct SmoothReport {
    /// Output mesh.
    pub geometry: MeshBuffers,
    /// Iterations performed (Chaikin rounds in contour mode).
    pub iterations: u32,
    /// Vertex groups whose position changed.
    pub vertices_smoothed: usize,
    /// Largest distance any vertex moved.
    pub max_displacement: f64,
    /// Human-readable remarks, such as why smoothing was skipped.
    pub notes: Vec<String>,
    /// Set when smoothing did not run.
    pub error: Option<SmoothError>,
}

impl SmoothReport {
    /// Whether smoothing ran.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.error.is_none()
    }

    /// Report that returns `input` unchanged.
    pub(crate) fn unchanged(input: &MeshBuffers, error: SmoothError) -> Self {
        Self {
            geometry: input.clone(),
            notes: vec![format!("smoothing skipped: {error}")],
            error: Some(error),
            ..Self::default()
        }
    }
}

impl fmt::Display for SmoothReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Smoothing: {} iterations, {} vertices moved (max {:.4})",
            self.iterations, self.vertices_smoothed, self.max_displacement
        )?;
        for note in &self.notes {
            writeln!(f, "  {note}")?;
        }
        if let Some(e) = &self.error {
            writeln!(f, "  Error: {e}")?;
        }
        Ok(())
    }
}
