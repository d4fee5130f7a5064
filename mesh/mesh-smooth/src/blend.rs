//! Taubin and Laplacian iterations and their blend.

use nalgebra::Point3;

use crate::error::{SmoothError, SmoothResult};
use crate::relocate::RelocationPlan;

/// Shrink factor of the Taubin pass pair.
pub const TAUBIN_LAMBDA: f64 = 0.5;

/// Inflate factor of the Taubin pass pair.
pub const TAUBIN_MU: f64 = -0.53;

/// Factor of the single Laplacian pass.
pub const LAPLACIAN_LAMBDA: f64 = 0.5;

/// Clamp the blend to `[0, 1]`, rejecting NaN and infinities.
pub(crate) fn blend_strength(strength: f64) -> SmoothResult<f64> {
    if !strength.is_finite() {
        return Err(SmoothError::NumericDegeneracy {
            details: format!("smoothing strength {strength} is not finite"),
        });
    }
    Ok(strength.clamp(0.0, 1.0))
}

/// Taubin shrink then inflate.
pub(crate) fn taubin(plan: &RelocationPlan<'_>, positions: &[Point3<f64>]) -> Vec<Point3<f64>> {
    let shrunk = plan.pass(positions, TAUBIN_LAMBDA);
    plan.pass(&shrunk, TAUBIN_MU)
}

/// One Laplacian pass.
pub(crate) fn laplacian(plan: &RelocationPlan<'_>, positions: &[Point3<f64>]) -> Vec<Point3<f64>> {
    plan.pass(positions, LAPLACIAN_LAMBDA)
}

/// One iteration at blend `s`.
///
/// Between the endpoints both results are computed from the same start and
/// mixed per vertex. `t + (l - t) * s` keeps coordinates the two agree on
/// bit-identical.
pub(crate) fn step(plan: &RelocationPlan<'_>, positions: &[Point3<f64>], s: f64) -> Vec<Point3<f64>> {
    if s <= 0.0 {
        return taubin(plan, positions);
    }
    if s >= 1.0 {
        return laplacian(plan, positions);
    }

    let t = taubin(plan, positions);
    let l = laplacian(plan, positions);
    t.iter().zip(&l).map(|(t, l)| t + (l - t) * s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relocate::{EdgeWeights, Mobility, group_positions};
    use approx::assert_relative_eq;
    use mesh_repair::VertexGraph;
    use mesh_types::MeshBuffers;

    /// Vertex 0 above the middle of a square rim.
    fn pyramid() -> MeshBuffers {
        MeshBuffers::indexed(
            vec![
                0.0, 1.0, 0.0, //
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0, -1.0,
            ],
            vec![0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 1],
        )
    }

    fn apex_only(graph: &VertexGraph) -> RelocationPlan<'_> {
        let mut plan = RelocationPlan::free(graph, EdgeWeights::Uniform);
        for m in plan.mobility.iter_mut().skip(1) {
            *m = Mobility::Frozen;
        }
        plan
    }

    #[test]
    fn strength_is_clamped() {
        assert_relative_eq!(blend_strength(-1.0).unwrap(), 0.0);
        assert_relative_eq!(blend_strength(2.5).unwrap(), 1.0);
        assert!(matches!(
            blend_strength(f64::NAN),
            Err(SmoothError::NumericDegeneracy { .. })
        ));
    }

    #[test]
    fn laplacian_halves_distance_to_centroid() {
        let mesh = pyramid();
        let graph = VertexGraph::build(&mesh);
        let out = step(&apex_only(&graph), &group_positions(&mesh, &graph), 1.0);
        assert_relative_eq!(out[0].y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn taubin_shrinks_then_inflates() {
        let mesh = pyramid();
        let graph = VertexGraph::build(&mesh);
        let out = step(&apex_only(&graph), &group_positions(&mesh, &graph), 0.0);

        // Rim is frozen at height 0: 1.0 -> 0.5 -> 0.5 - 0.53 * (0 - 0.5).
        assert_relative_eq!(out[0].y, 0.765, epsilon = 1e-12);
    }

    #[test]
    fn blend_interpolates() {
        let mesh = pyramid();
        let graph = VertexGraph::build(&mesh);
        let plan = apex_only(&graph);
        let out = step(&plan, &group_positions(&mesh, &graph), 0.25);
        assert_relative_eq!(out[0].y, 0.765 + (0.5 - 0.765) * 0.25, epsilon = 1e-12);
        // Frozen rim agrees in both results and stays exact.
        assert_eq!(out[1], Point3::new(1.0, 0.0, 0.0));
    }
}
