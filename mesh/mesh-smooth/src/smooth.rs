//! Smoothing entry points.

// Positions are stored as f32 at the exchange boundary
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use mesh_repair::VertexGraph;
use mesh_types::{MeshBuffers, MeshTopology, ProgressReporter, ProgressStage};
use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::blend::{blend_strength, step};
use crate::contour::{MAX_CHAIKIN_ROUNDS, extract_contours, find_walls, smooth_contours};
use crate::cotangent::cotangent_weights;
use crate::error::{SmoothError, SmoothResult};
use crate::heightmap::{HeightProfile, census, classify, heightmap_plan};
use crate::params::{NeighborWeighting, SmoothMode, SmoothParams};
use crate::relocate::{EdgeWeights, RelocationPlan, group_positions};
use crate::result::SmoothReport;

/// Smooth a mesh.
///
/// Only positions change: the index buffer, triangle order and winding are
/// kept, and normals are recomputed. In heightmap and contour modes the
/// height coordinate of every vertex is copied through bit for bit.
///
/// Meshes with more vertex slots than [`SmoothParams::max_vertices`] are
/// returned unchanged with a note.
///
/// # Example
///
/// ```
/// use mesh_smooth::{smooth, SmoothParams};
/// use mesh_types::{MeshBuffers, unit_cube};
///
/// let cube = MeshBuffers::from_indexed_mesh(&unit_cube());
/// let report = smooth(&cube, &SmoothParams::taubin(2));
/// assert!(report.success());
/// assert_eq!(report.geometry.indices, cube.indices);
/// ```
#[must_use]
pub fn smooth(mesh: &MeshBuffers, params: &SmoothParams) -> SmoothReport {
    smooth_with_progress(mesh, params, &mut ProgressReporter::silent())
}

/// Smooth a mesh, reporting progress once per iteration.
pub fn smooth_with_progress(
    mesh: &MeshBuffers,
    params: &SmoothParams,
    progress: &mut ProgressReporter<'_>,
) -> SmoothReport {
    progress.report(ProgressStage::Smoothing, 0.0, "checking input");
    let report = match try_smooth(mesh, params, progress) {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "Smoothing skipped");
            SmoothReport::unchanged(mesh, e)
        }
    };
    progress.report(ProgressStage::Smoothing, 100.0, "smoothing done");
    report
}

fn try_smooth(
    mesh: &MeshBuffers,
    params: &SmoothParams,
    progress: &mut ProgressReporter<'_>,
) -> SmoothResult<SmoothReport> {
    mesh.validate()?;
    if mesh.face_count() == 0 {
        return Err(SmoothError::EmptyMesh);
    }
    let vertices = mesh.vertex_count();
    if vertices > params.max_vertices {
        return Err(SmoothError::ResourceLimitExceeded {
            vertices,
            limit: params.max_vertices,
        });
    }
    let strength = blend_strength(params.strength)?;

    info!(
        vertices,
        triangles = mesh.face_count(),
        mode = ?params.mode,
        iterations = params.iterations,
        strength,
        "Starting smoothing"
    );

    let graph = VertexGraph::with_precision(mesh, params.precision);
    let start = group_positions(mesh, &graph);
    let weights = match params.weighting {
        NeighborWeighting::Uniform => EdgeWeights::Uniform,
        NeighborWeighting::Cotangent => EdgeWeights::Cotangent(cotangent_weights(mesh, &graph)),
    };
    let axis = params.height_axis.index();

    let (smoothed, iterations) = match params.mode {
        SmoothMode::Surface => {
            let plan = RelocationPlan::free(&graph, weights);
            (iterate(&plan, &start, strength, params.iterations, progress), params.iterations)
        }
        SmoothMode::Heightmap => {
            let profile = HeightProfile::new(&start, axis);
            let types = classify(&graph, &start, &profile);
            let (top, bottom, wall) = census(&types);
            debug!(top, bottom, wall, range = profile.range, "Classified vertex groups");
            let plan = heightmap_plan(&graph, weights, &types, &profile);
            (iterate(&plan, &start, strength, params.iterations, progress), params.iterations)
        }
        SmoothMode::Contour => {
            let profile = HeightProfile::new(&start, axis);
            let wall = find_walls(&graph, &start, &profile);
            let contours = extract_contours(&graph, &start, &profile, &wall);
            let rounds = params.iterations.min(MAX_CHAIKIN_ROUNDS);
            debug!(
                walls = wall.iter().filter(|w| **w).count(),
                contours = contours.len(),
                rounds,
                "Extracted wall contours"
            );
            let out = smooth_contours(&start, &contours, params.height_axis.horizontal(), rounds);
            progress.report(ProgressStage::Smoothing, 95.0, "contours smoothed");
            (out, rounds)
        }
    };

    if let Some(g) = smoothed.iter().position(|p| !p.coords.iter().all(|c| c.is_finite())) {
        return Err(SmoothError::NumericDegeneracy {
            details: format!("vertex group {g} moved to a non-finite position"),
        });
    }

    let keep_height = params.mode != SmoothMode::Surface;
    let geometry = write_back(mesh, &graph, &start, &smoothed, keep_height.then_some(axis));

    let moved: Vec<f64> = start
        .iter()
        .zip(&smoothed)
        .filter(|(a, b)| a != b)
        .map(|(a, b)| (b - a).norm())
        .collect();
    let max_displacement = moved.iter().copied().fold(0.0, f64::max);

    info!(
        iterations,
        vertices_smoothed = moved.len(),
        max_displacement,
        "Smoothing complete"
    );

    Ok(SmoothReport {
        geometry,
        iterations,
        vertices_smoothed: moved.len(),
        max_displacement,
        notes: Vec::new(),
        error: None,
    })
}

fn iterate(
    plan: &RelocationPlan<'_>,
    start: &[Point3<f64>],
    strength: f64,
    iterations: u32,
    progress: &mut ProgressReporter<'_>,
) -> Vec<Point3<f64>> {
    let mut positions = start.to_vec();
    for i in 0..iterations {
        positions = step(plan, &positions, strength);
        let pct = 95.0 * (i + 1) as f32 / iterations as f32;
        progress.report(ProgressStage::Smoothing, pct, "smoothing");
    }
    positions
}

/// Copy group positions back to every slot.
///
/// Slots of unmoved groups keep their original bits. With `height_axis`
/// set, that coordinate always comes from the input.
fn write_back(
    mesh: &MeshBuffers,
    graph: &VertexGraph,
    start: &[Point3<f64>],
    smoothed: &[Point3<f64>],
    height_axis: Option<usize>,
) -> MeshBuffers {
    let mut positions = mesh.positions.clone();
    for (slot, xyz) in positions.chunks_exact_mut(3).enumerate() {
        let g = graph.group_of(slot);
        if start[g] == smoothed[g] {
            continue;
        }
        for (axis, c) in xyz.iter_mut().enumerate() {
            if height_axis != Some(axis) {
                *c = smoothed[g][axis] as f32;
            }
        }
    }

    MeshBuffers {
        positions,
        normals: None,
        indices: mesh.indices.clone(),
    }
    .with_recomputed_normals()
}
