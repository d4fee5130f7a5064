//! The full processing pipeline.
//!
//! Stages always run in the same order: analyze, repair, cleanup, decimate,
//! smooth. Each stage reads the previous stage's output. Every stage except
//! repair hands back usable geometry even when it fails, so the pipeline
//! only stops early when repair cannot produce a mesh.

use mesh_decimate::{DecimateError, DecimationPipeline, DecimationReport, PipelineParams};
use mesh_repair::{
    AnalysisResult, AnalyzeOptions, CleanupParams, CleanupReport, RepairError, RepairReport,
    analyze_with_options, cleanup_csg, repair_with_epsilon,
};
use mesh_smooth::{SmoothError, SmoothParams, SmoothReport, smooth_with_progress};
use mesh_types::{MeshBuffers, MeshTopology, ProgressReporter, ProgressStage};
use thiserror::Error;
use tracing::{info, warn};

/// Which stages to run and how.
///
/// Analysis and repair run by default; cleanup, decimation and smoothing
/// are opt-in.
///
/// # Example
///
/// ```
/// use fixture_mesh::{ProcessOptions, SmoothParams};
///
/// let options = ProcessOptions::for_csg()
///     .with_target_triangles(20_000)
///     .with_smoothing(SmoothParams::heightmap());
/// assert!(options.repair);
/// assert!(options.cleanup.is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
    /// Analysis options. The degenerate threshold is shared with repair.
    pub analyze: AnalyzeOptions,
    /// Strip degenerate triangles.
    pub repair: bool,
    /// Connected-component cleanup policy.
    pub cleanup: Option<CleanupParams>,
    /// Triangle budget for decimation.
    pub target_triangles: Option<usize>,
    /// Decimation pipeline parameters.
    pub pipeline: PipelineParams,
    /// Smoothing parameters.
    pub smooth: Option<SmoothParams>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            analyze: AnalyzeOptions::welded(),
            repair: true,
            cleanup: None,
            target_triangles: None,
            pipeline: PipelineParams::default(),
            smooth: None,
        }
    }
}

impl ProcessOptions {
    /// Repair plus fragment cleanup tuned for boolean results.
    #[must_use]
    pub fn for_csg() -> Self {
        Self {
            cleanup: Some(CleanupParams::for_csg()),
            ..Self::default()
        }
    }

    /// Skip the repair stage.
    #[must_use]
    pub const fn without_repair(mut self) -> Self {
        self.repair = false;
        self
    }

    /// Run component cleanup with `params`.
    #[must_use]
    pub fn with_cleanup(mut self, params: CleanupParams) -> Self {
        self.cleanup = Some(params);
        self
    }

    /// Decimate to at most `target` triangles.
    #[must_use]
    pub const fn with_target_triangles(mut self, target: usize) -> Self {
        self.target_triangles = Some(target);
        self
    }

    /// Use custom decimation pipeline parameters.
    #[must_use]
    pub fn with_pipeline(mut self, params: PipelineParams) -> Self {
        self.pipeline = params;
        self
    }

    /// Smooth the result with `params`.
    #[must_use]
    pub fn with_smoothing(mut self, params: SmoothParams) -> Self {
        self.smooth = Some(params);
        self
    }
}

/// A stage error, tagged with the stage it came from.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessError {
    /// Repair produced no geometry. Later stages did not run.
    #[error("repair failed: {0}")]
    Repair(#[source] RepairError),

    /// Cleanup failed and kept its input.
    #[error("cleanup failed: {0}")]
    Cleanup(#[source] RepairError),

    /// Decimation fell short of the budget.
    #[error("decimation failed: {0}")]
    Decimate(#[from] DecimateError),

    /// Smoothing was skipped.
    #[error("smoothing failed: {0}")]
    Smooth(#[from] SmoothError),
}

/// Everything the pipeline did, stage by stage.
#[derive(Debug, Clone)]
pub struct ProcessReport {
    /// Final mesh.
    pub geometry: MeshBuffers,
    /// Diagnostics of the input mesh.
    pub analysis: AnalysisResult,
    /// Repair outcome, if repair ran.
    pub repair: Option<RepairReport>,
    /// Cleanup outcome, if cleanup ran.
    pub cleanup: Option<CleanupReport>,
    /// Decimation outcome, if decimation ran.
    pub decimation: Option<DecimationReport>,
    /// Smoothing outcome, if smoothing ran.
    pub smoothing: Option<SmoothReport>,
}

impl ProcessReport {
    /// Errors of every stage that ran, in stage order.
    #[must_use]
    pub fn errors(&self) -> Vec<ProcessError> {
        let mut errors = Vec::new();
        if let Some(e) = self.repair.as_ref().and_then(|r| r.error.clone()) {
            errors.push(ProcessError::Repair(e));
        }
        if let Some(e) = self.cleanup.as_ref().and_then(|r| r.error.clone()) {
            errors.push(ProcessError::Cleanup(e));
        }
        if let Some(e) = self.decimation.as_ref().and_then(|r| r.error.clone()) {
            errors.push(e.into());
        }
        if let Some(e) = self.smoothing.as_ref().and_then(|r| r.error.clone()) {
            errors.push(e.into());
        }
        errors
    }

    /// Whether every stage that ran succeeded.
    #[must_use]
    pub fn success(&self) -> bool {
        self.errors().is_empty()
    }

    /// Triangles in the final mesh.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.geometry.face_count()
    }
}

/// Run the configured stages on `mesh`.
///
/// # Example
///
/// ```
/// use fixture_mesh::{ProcessOptions, process};
/// use mesh_types::{MeshBuffers, unit_cube};
///
/// let cube = MeshBuffers::from_indexed_mesh(&unit_cube());
/// let report = process(&cube, &ProcessOptions::default());
///
/// assert!(report.analysis.is_manifold);
/// assert!(report.success());
/// assert_eq!(report.triangle_count(), 12);
/// ```
#[must_use]
pub fn process(mesh: &MeshBuffers, options: &ProcessOptions) -> ProcessReport {
    process_with_progress(mesh, options, &mut ProgressReporter::silent())
}

/// Run the configured stages, forwarding progress from each.
///
/// A final [`ProgressStage::Complete`] event is always sent.
pub fn process_with_progress(
    mesh: &MeshBuffers,
    options: &ProcessOptions,
    progress: &mut ProgressReporter<'_>,
) -> ProcessReport {
    process_with_pipeline(
        mesh,
        options,
        &DecimationPipeline::new(options.pipeline.clone()),
        progress,
    )
}

/// Like [`process_with_progress`], decimating with a caller-built pipeline.
///
/// `options.pipeline` is ignored in favor of `pipeline`.
pub fn process_with_pipeline(
    mesh: &MeshBuffers,
    options: &ProcessOptions,
    pipeline: &DecimationPipeline,
    progress: &mut ProgressReporter<'_>,
) -> ProcessReport {
    info!(
        triangles = mesh.face_count(),
        repair = options.repair,
        cleanup = options.cleanup.is_some(),
        target = ?options.target_triangles,
        smooth = options.smooth.is_some(),
        "Processing mesh"
    );

    progress.report(ProgressStage::Analyzing, 0.0, "analyzing topology");
    let analysis = analyze_with_options(mesh, &options.analyze);
    progress.report(ProgressStage::Analyzing, 100.0, "analysis done");

    let mut report = ProcessReport {
        geometry: mesh.clone(),
        analysis,
        repair: None,
        cleanup: None,
        decimation: None,
        smoothing: None,
    };

    if options.repair {
        progress.report(ProgressStage::Repairing, 0.0, "removing degenerate triangles");
        let repaired = repair_with_epsilon(&report.geometry, options.analyze.degenerate_epsilon);
        let geometry = repaired.geometry.clone();
        report.repair = Some(repaired);
        match geometry {
            Some(geometry) => report.geometry = geometry,
            None => {
                warn!("Repair produced no geometry, stopping");
                progress.report(ProgressStage::Complete, 100.0, "stopped after repair");
                return report;
            }
        }
    }

    if let Some(params) = &options.cleanup {
        progress.report(ProgressStage::Repairing, 50.0, "removing CSG fragments");
        let cleaned = cleanup_csg(&report.geometry, params);
        report.geometry = cleaned.geometry.clone();
        report.cleanup = Some(cleaned);
    }
    if options.repair || options.cleanup.is_some() {
        progress.report(ProgressStage::Repairing, 100.0, "repair done");
    }

    if let Some(target) = options.target_triangles {
        let decimated = pipeline.run(&report.geometry, target, progress);
        report.geometry = decimated.geometry.clone();
        report.decimation = Some(decimated);
    }

    if let Some(params) = &options.smooth {
        let smoothed = smooth_with_progress(&report.geometry, params, progress);
        report.geometry = smoothed.geometry.clone();
        report.smoothing = Some(smoothed);
    }

    let errors = report.errors();
    if errors.is_empty() {
        info!(triangles = report.triangle_count(), "Processing complete");
    } else {
        warn!(
            triangles = report.triangle_count(),
            errors = errors.len(),
            "Processing complete with errors"
        );
    }
    progress.report(ProgressStage::Complete, 100.0, "done");
    report
}
