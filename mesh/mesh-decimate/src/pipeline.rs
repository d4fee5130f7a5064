//! Cascading decimation to a triangle budget.
//!
//! The pipeline runs an optional coarse pass for very large meshes, then
//! tries each strategy of its chain in order until the mesh fits the budget.
//! A strategy that errors, panics, or returns unusable output is recorded
//! and skipped. Whatever happens, the caller gets geometry back.

// Strategy counts are tiny
#![allow(clippy::cast_precision_loss)]

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use mesh_repair::weld_buffers;
use mesh_types::{IndexedMesh, MeshBuffers, MeshTopology, ProgressReporter, ProgressStage};
use tracing::{debug, info, warn};

use crate::coarse::MeshoptSimplifier;
use crate::error::{DecimateError, DecimateResult};
use crate::params::PipelineParams;
use crate::result::{DecimationReport, StageAttempt};
use crate::simplifier::{ClusteringSimplifier, QemSimplifier, RepairingSimplifier, Simplifier};

const PREPARED_PERCENT: f32 = 5.0;
const COARSE_DONE_PERCENT: f32 = 30.0;
const CHAIN_END_PERCENT: f32 = 98.0;

/// Ordered chain of simplification strategies.
///
/// The default chain is quadric edge collapse, then a repairing collapse,
/// then vertex clustering, with meshoptimizer as the coarse pass.
///
/// # Example
///
/// ```
/// use mesh_decimate::DecimationPipeline;
/// use mesh_types::{MeshBuffers, ProgressReporter, unit_cube};
///
/// let cube = MeshBuffers::from_indexed_mesh(&unit_cube());
/// let report = DecimationPipeline::default().run(&cube, 100, &mut ProgressReporter::silent());
///
/// // Already within budget.
/// assert!(report.success());
/// assert_eq!(report.final_triangles, 12);
/// ```
pub struct DecimationPipeline {
    params: PipelineParams,
    coarse: Option<Box<dyn Simplifier>>,
    chain: Vec<Box<dyn Simplifier>>,
}

impl Default for DecimationPipeline {
    fn default() -> Self {
        Self::new(PipelineParams::default())
    }
}

impl fmt::Debug for DecimationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecimationPipeline")
            .field("params", &self.params)
            .field("coarse", &self.coarse.as_ref().map(|s| s.name()))
            .field("chain", &self.strategy_names())
            .finish()
    }
}

impl DecimationPipeline {
    /// The default strategies with the given parameters.
    #[must_use]
    pub fn new(params: PipelineParams) -> Self {
        let coarse: Box<dyn Simplifier> =
            Box::new(MeshoptSimplifier::with_target_error(params.coarse_target_error));
        let chain: Vec<Box<dyn Simplifier>> = vec![
            Box::new(QemSimplifier::new(params.qem.clone())),
            Box::new(RepairingSimplifier::default()),
            Box::new(ClusteringSimplifier),
        ];
        Self {
            params,
            coarse: Some(coarse),
            chain,
        }
    }

    /// Custom strategies. `coarse` runs only above the coarse threshold.
    #[must_use]
    pub fn with_strategies(
        params: PipelineParams,
        coarse: Option<Box<dyn Simplifier>>,
        chain: Vec<Box<dyn Simplifier>>,
    ) -> Self {
        Self {
            params,
            coarse,
            chain,
        }
    }

    /// Pipeline parameters.
    #[must_use]
    pub const fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Names of the chained strategies, in trial order.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(|s| s.name()).collect()
    }

    /// Reduce `mesh` to at most `target` triangles.
    ///
    /// The input is never modified. The report's geometry is the input
    /// unchanged when nothing could be done, otherwise the last accepted
    /// strategy output as indexed buffers with recomputed normals.
    pub fn run(
        &self,
        mesh: &MeshBuffers,
        target: usize,
        progress: &mut ProgressReporter<'_>,
    ) -> DecimationReport {
        let original = mesh.face_count();
        let mut report = DecimationReport {
            geometry: mesh.clone(),
            original_triangles: original,
            final_triangles: original,
            target_triangles: target,
            ..DecimationReport::default()
        };

        progress.report(ProgressStage::Decimating, 0.0, "checking input");
        if let Err(e) = Self::check_input(mesh, target) {
            warn!(error = %e, "Decimation skipped");
            report.error = Some(e);
            progress.report(ProgressStage::Decimating, 100.0, "nothing to do");
            return report;
        }

        if original <= target {
            debug!(original, target, "Mesh already within budget");
            progress.report(ProgressStage::Decimating, 100.0, "already within budget");
            return report;
        }

        info!(original, target, "Starting decimation pipeline");

        let mut working = if mesh.is_indexed() {
            mesh.to_indexed_mesh()
        } else {
            weld_buffers(mesh, self.params.weld_precision)
        };
        if working.faces.is_empty() {
            report.error = Some(DecimateError::NumericDegeneracy {
                strategy: "weld",
                details: "every triangle collapsed while welding".to_owned(),
            });
            progress.report(ProgressStage::Decimating, 100.0, "nothing to do");
            return report;
        }
        let mut improved = false;
        progress.report(ProgressStage::Decimating, PREPARED_PERCENT, "prepared mesh");

        if let Some(coarse) = &self.coarse {
            if working.faces.len() > self.params.coarse_threshold {
                progress.report(
                    ProgressStage::Decimating,
                    PREPARED_PERCENT,
                    &format!("coarse pass with {}", coarse.name()),
                );
                let stage_target = self.params.coarse_threshold.max(target);
                if let Some(out) = Self::attempt(coarse.as_ref(), &working, stage_target, &mut report) {
                    working = out;
                    improved = true;
                    report.strategy = Some(coarse.name());
                }
            }
        }
        progress.report(ProgressStage::Decimating, COARSE_DONE_PERCENT, "coarse pass done");

        let span = (CHAIN_END_PERCENT - COARSE_DONE_PERCENT) / self.chain.len().max(1) as f32;
        for (i, strategy) in self.chain.iter().enumerate() {
            let current = working.faces.len();
            if current <= target {
                break;
            }
            if i > 0 {
                warn!(strategy = strategy.name(), "Falling back");
            }
            progress.report(
                ProgressStage::Decimating,
                COARSE_DONE_PERCENT + span * i as f32,
                &format!("trying {}", strategy.name()),
            );

            let stage_target = self.params.stage_target(current, target);
            if let Some(out) = Self::attempt(strategy.as_ref(), &working, stage_target, &mut report) {
                working = out;
                improved = true;
                report.strategy = Some(strategy.name());
            }
        }

        if improved {
            report.geometry = MeshBuffers::from_indexed_mesh(&working).with_recomputed_normals();
            report.final_triangles = working.faces.len();
            if report.final_triangles > target {
                warn!(
                    final_triangles = report.final_triangles,
                    target, "Budget not reached; keeping best result"
                );
            }
        } else {
            let last = report
                .attempts
                .last()
                .and_then(|a| a.outcome.as_ref().err())
                .map_or_else(|| "no strategy ran".to_owned(), ToString::to_string);
            let error = DecimateError::AllStrategiesFailed {
                attempts: report.attempts.len(),
                last,
            };
            warn!(error = %error, "Returning input unchanged");
            report.error = Some(error);
        }

        info!(
            original,
            final_triangles = report.final_triangles,
            strategy = report.strategy.unwrap_or("none"),
            "Decimation pipeline complete"
        );
        progress.report(
            ProgressStage::Decimating,
            100.0,
            &format!("{} triangles", report.final_triangles),
        );
        report
    }

    fn check_input(mesh: &MeshBuffers, target: usize) -> DecimateResult<()> {
        mesh.validate()?;
        if mesh.is_empty() {
            return Err(DecimateError::EmptyMesh);
        }
        if target == 0 {
            return Err(DecimateError::InvalidTargetCount(target));
        }
        Ok(())
    }

    /// Run one strategy, record the attempt, and return its output if usable.
    fn attempt(
        strategy: &dyn Simplifier,
        input: &IndexedMesh,
        target: usize,
        report: &mut DecimationReport,
    ) -> Option<IndexedMesh> {
        let name = strategy.name();
        let before = input.faces.len();

        let outcome = catch_unwind(AssertUnwindSafe(|| strategy.simplify(input, target)))
            .unwrap_or_else(|payload| {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "panicked".to_owned());
                Err(DecimateError::ExternalToolFailure {
                    strategy: name,
                    reason,
                })
            })
            .and_then(|out| check_output(name, before, out));

        let (recorded, output) = match outcome {
            Ok(out) => (Ok(out.faces.len()), Some(out)),
            Err(e) => (Err(e), None),
        };
        match &recorded {
            Ok(after) => debug!(strategy = name, before, after, "Strategy accepted"),
            Err(e) => warn!(strategy = name, error = %e, "Strategy failed"),
        }
        report.attempts.push(StageAttempt {
            strategy: name,
            input_triangles: before,
            outcome: recorded,
        });
        output
    }
}

/// Reject outputs that would break the pipeline's guarantees.
fn check_output(
    strategy: &'static str,
    before: usize,
    out: IndexedMesh,
) -> DecimateResult<IndexedMesh> {
    let after = out.faces.len();
    if after == 0 {
        return Err(DecimateError::EmptyOutput { strategy });
    }
    if after > before {
        return Err(DecimateError::Grew {
            strategy,
            before,
            after,
        });
    }
    if after == before {
        return Err(DecimateError::NoProgress {
            strategy,
            triangles: after,
        });
    }
    let n = out.vertices.len();
    if out.faces.iter().flatten().any(|&v| v as usize >= n) {
        return Err(DecimateError::ExternalToolFailure {
            strategy,
            reason: "output references a missing vertex".to_owned(),
        });
    }
    Ok(out)
}

/// Decimate with the default pipeline.
///
/// # Example
///
/// ```
/// use mesh_decimate::decimate;
/// use mesh_types::{MeshBuffers, unit_cube};
///
/// let cube = MeshBuffers::from_indexed_mesh(&unit_cube());
/// let report = decimate(&cube, 12);
/// assert!(report.reduction_percent().abs() < 1e-9);
/// ```
#[must_use]
pub fn decimate(mesh: &MeshBuffers, target: usize) -> DecimationReport {
    decimate_with_progress(mesh, target, &mut ProgressReporter::silent())
}

/// Decimate with the default pipeline, reporting progress.
pub fn decimate_with_progress(
    mesh: &MeshBuffers,
    target: usize,
    progress: &mut ProgressReporter<'_>,
) -> DecimationReport {
    DecimationPipeline::default().run(mesh, target, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::Vertex;

    /// Strategy that always fails the same way.
    struct Failing(&'static str);

    impl Simplifier for Failing {
        fn name(&self) -> &'static str {
            self.0
        }

        fn simplify(&self, _: &IndexedMesh, _: usize) -> DecimateResult<IndexedMesh> {
            Err(DecimateError::ExternalToolFailure {
                strategy: self.0,
                reason: "stubbed".to_owned(),
            })
        }
    }

    struct Panicking;

    impl Simplifier for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn simplify(&self, _: &IndexedMesh, _: usize) -> DecimateResult<IndexedMesh> {
            panic!("simplifier blew up")
        }
    }

    /// Returns the input with one extra face.
    struct Growing;

    impl Simplifier for Growing {
        fn name(&self) -> &'static str {
            "growing"
        }

        fn simplify(&self, mesh: &IndexedMesh, _: usize) -> DecimateResult<IndexedMesh> {
            let mut out = mesh.clone();
            out.faces.push(mesh.faces[0]);
            Ok(out)
        }
    }

    fn grid(n: u32) -> MeshBuffers {
        let mut mesh = IndexedMesh::new();
        for y in 0..=n {
            for x in 0..=n {
                mesh.vertices
                    .push(Vertex::from_coords(f64::from(x), f64::from(y), 0.0));
            }
        }
        let row = n + 1;
        for y in 0..n {
            for x in 0..n {
                let v = y * row + x;
                mesh.faces.push([v, v + 1, v + row + 1]);
                mesh.faces.push([v, v + row + 1, v + row]);
            }
        }
        MeshBuffers::from_indexed_mesh(&mesh)
    }

    fn pipeline(chain: Vec<Box<dyn Simplifier>>) -> DecimationPipeline {
        DecimationPipeline::with_strategies(PipelineParams::default(), None, chain)
    }

    #[test]
    fn within_budget_is_untouched() {
        let mesh = grid(4);
        let report = decimate(&mesh, 1000);
        assert!(report.success());
        assert_eq!(report.geometry, mesh);
        assert_eq!(report.final_triangles, report.original_triangles);
        assert!(report.attempts.is_empty());
    }

    #[test]
    fn zero_target_is_rejected() {
        let mesh = grid(2);
        let report = decimate(&mesh, 0);
        assert_eq!(report.error, Some(DecimateError::InvalidTargetCount(0)));
        assert_eq!(report.geometry, mesh);
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let report = decimate(&MeshBuffers::soup(Vec::new()), 10);
        assert_eq!(report.error, Some(DecimateError::EmptyMesh));
    }

    #[test]
    fn primary_strategy_reaches_target() {
        let mesh = grid(12);
        let report = decimate(&mesh, 100);

        assert!(report.success());
        assert!(report.final_triangles < report.original_triangles);
        assert_eq!(report.attempts[0].strategy, "qem");
        assert!(report.geometry.normals.is_some());
        assert!(report.geometry.validate().is_ok());
    }

    #[test]
    fn coarse_pass_hands_off_to_qem() {
        let mesh = grid(60);
        assert_eq!(mesh.face_count(), 7200);
        let params = PipelineParams::default().with_coarse_threshold(2000);
        let report =
            DecimationPipeline::new(params).run(&mesh, 500, &mut ProgressReporter::silent());

        assert!(report.success());
        assert_eq!(report.attempts[0].strategy, "meshopt");
        assert_eq!(report.attempts[0].input_triangles, 7200);
        let coarse_out = report.attempts[0].outcome.clone().unwrap();
        assert!(coarse_out <= 2000);

        assert_eq!(report.attempts[1].strategy, "qem");
        assert_eq!(report.attempts[1].input_triangles, coarse_out);
        assert!(report.final_triangles <= 500);
        assert_eq!(report.geometry.face_count(), report.final_triangles);
    }

    #[test]
    fn coarse_stage_never_aims_below_target() {
        // Threshold below the target: the coarse pass stops at the target.
        let mesh = grid(20);
        let params = PipelineParams::default().with_coarse_threshold(100);
        let report =
            DecimationPipeline::new(params).run(&mesh, 400, &mut ProgressReporter::silent());

        assert_eq!(report.attempts[0].strategy, "meshopt");
        let coarse_out = report.attempts[0].outcome.clone().unwrap();
        assert!(coarse_out > 200 && coarse_out < 800);
        assert!(report.final_triangles <= 400);
    }

    #[test]
    fn failures_fall_through_to_clustering() {
        let p = pipeline(vec![
            Box::new(Failing("qem")),
            Box::new(Panicking),
            Box::new(Growing),
            Box::new(ClusteringSimplifier),
        ]);
        let mesh = grid(40);
        let report = p.run(&mesh, 20, &mut ProgressReporter::silent());

        assert!(report.success());
        assert_eq!(report.strategy, Some("clustering"));
        assert_eq!(report.attempts.len(), 4);
        assert!(matches!(
            report.attempts[1].outcome,
            Err(DecimateError::ExternalToolFailure { ref reason, .. }) if reason.contains("blew up")
        ));
        assert!(matches!(report.attempts[2].outcome, Err(DecimateError::Grew { .. })));
        assert!(report.final_triangles <= report.original_triangles);
    }

    #[test]
    fn total_failure_returns_input() {
        let p = pipeline(vec![Box::new(Failing("a")), Box::new(Failing("b"))]);
        let mesh = grid(5);
        let report = p.run(&mesh, 10, &mut ProgressReporter::silent());

        assert!(!report.success());
        assert_eq!(report.geometry, mesh);
        assert_eq!(report.final_triangles, report.original_triangles);
        assert!(matches!(
            report.error,
            Some(DecimateError::AllStrategiesFailed { attempts: 2, .. })
        ));
    }

    #[test]
    fn soup_input_is_welded_first() {
        let indexed = grid(10);
        let positions = (0..indexed.face_count())
            .flat_map(|f| indexed.corners(f))
            .flat_map(|s| indexed.position_f32(s as usize))
            .collect();
        let soup = MeshBuffers::soup(positions);

        let report = decimate(&soup, 60);
        assert!(report.success());
        assert!(report.geometry.is_indexed());
        assert!(report.final_triangles < 200);
    }

    #[test]
    fn progress_is_monotonic_and_finishes() {
        let mesh = grid(10);
        let mut seen = Vec::new();
        {
            let mut record = |stage: ProgressStage, pct: f32, _: &str| seen.push((stage, pct));
            let mut progress = ProgressReporter::new(&mut record);
            let _ = decimate_with_progress(&mesh, 50, &mut progress);
        }

        assert!(seen.iter().all(|(s, _)| *s == ProgressStage::Decimating));
        assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(seen.last().map(|s| s.1), Some(100.0));
    }

    #[test]
    fn debug_lists_strategies() {
        let text = format!("{:?}", DecimationPipeline::default());
        assert!(text.contains("qem-repair"));
        assert!(text.contains("meshopt"));
    }
}
