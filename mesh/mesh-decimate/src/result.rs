//! Result types for decimation operations.

// Triangle counts don't overflow in practice
#![allow(clippy::cast_precision_loss)]

use std::fmt;

use mesh_types::{IndexedMesh, MeshBuffers};

use crate::error::DecimateError;

/// Result of a single edge-collapse run.
#[derive(Debug, Clone)]
pub struct DecimationResult {
    /// The decimated mesh.
    pub mesh: IndexedMesh,

    /// Number of triangles in original mesh.
    pub original_triangles: usize,

    /// Number of triangles in decimated mesh.
    pub final_triangles: usize,

    /// Number of edge collapses performed.
    pub collapses_performed: usize,

    /// Number of edge collapses rejected (link condition, face flip or error
    /// bound).
    pub collapses_rejected: usize,
}

impl DecimationResult {
    /// Get the reduction ratio (final / original).
    #[must_use]
    pub fn reduction_ratio(&self) -> f64 {
        ratio(self.original_triangles, self.final_triangles)
    }

    /// Get the percentage of triangles removed.
    #[must_use]
    pub fn reduction_percent(&self) -> f64 {
        (1.0 - self.reduction_ratio()) * 100.0
    }

    /// Check if any decimation occurred.
    #[must_use]
    pub const fn was_decimated(&self) -> bool {
        self.collapses_performed > 0
    }
}

impl fmt::Display for DecimationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Decimation: {} → {} triangles ({:.1}% reduction, {} collapses)",
            self.original_triangles,
            self.final_triangles,
            self.reduction_percent(),
            self.collapses_performed
        )
    }
}

/// One strategy invocation inside the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct StageAttempt {
    /// Strategy name.
    pub strategy: &'static str,
    /// Triangles handed to the strategy.
    pub input_triangles: usize,
    /// Triangle count produced, or why the output was rejected.
    pub outcome: Result<usize, DecimateError>,
}

impl StageAttempt {
    /// Whether the output was accepted.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl fmt::Display for StageAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(out) => write!(f, "{}: {} → {}", self.strategy, self.input_triangles, out),
            Err(e) => write!(f, "{}: failed ({e})", self.strategy),
        }
    }
}

/// Outcome of [`DecimationPipeline::run`](crate::DecimationPipeline::run).
///
/// `geometry` is always usable: on total failure it holds the best
/// intermediate mesh (possibly the input itself) and `error` says why.
#[derive(Debug, Clone, Default)]
pub struct DecimationReport {
    /// Output mesh.
    pub geometry: MeshBuffers,
    /// Triangles in the input.
    pub original_triangles: usize,
    /// Triangles in `geometry`.
    pub final_triangles: usize,
    /// Requested budget.
    pub target_triangles: usize,
    /// Strategy whose output was kept, `None` when nothing ran or all failed.
    pub strategy: Option<&'static str>,
    /// Every strategy invocation in order.
    pub attempts: Vec<StageAttempt>,
    /// Set when the budget could not be met cleanly.
    pub error: Option<DecimateError>,
}

impl DecimationReport {
    /// Whether the pipeline finished without error.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.error.is_none()
    }

    /// Percentage of triangles removed.
    #[must_use]
    pub fn reduction_percent(&self) -> f64 {
        (1.0 - ratio(self.original_triangles, self.final_triangles)) * 100.0
    }
}

impl fmt::Display for DecimationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Decimation: {} → {} triangles (target {}, {:.1}% reduction)",
            self.original_triangles,
            self.final_triangles,
            self.target_triangles,
            self.reduction_percent()
        )?;
        for attempt in &self.attempts {
            writeln!(f, "  {attempt}")?;
        }
        if let Some(e) = &self.error {
            writeln!(f, "  Error: {e}")?;
        }
        Ok(())
    }
}

fn ratio(original: usize, last: usize) -> f64 {
    if original == 0 {
        1.0
    } else {
        last as f64 / original as f64
    }
}
