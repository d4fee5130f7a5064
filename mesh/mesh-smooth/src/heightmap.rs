//! Height-aware smoothing for stair-stepped heightmap meshes.
//!
//! Vertex groups are classified against the global height range. The floor
//! never moves, everything else slides only horizontally, and neighbors on
//! the far side of a vertical step are ignored when averaging.

use mesh_repair::VertexGraph;
use nalgebra::Point3;

use crate::relocate::{EdgeWeights, Mobility, RelocationPlan};

/// Bottom band as a fraction of the height range.
const BOTTOM_BAND: f64 = 0.01;

/// Neighbor height filter as a fraction of the height range.
const NEIGHBOR_BAND: f64 = 0.15;

/// Heights closer than this fraction of the range count as level.
const LEVEL_TOLERANCE: f64 = 1e-3;

/// Absolute floor for the level tolerance.
const MIN_LEVEL_TOLERANCE: f64 = 1e-9;

/// Where a vertex group sits on the height profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SurfaceType {
    Top,
    Bottom,
    Wall,
}

/// Height extent of a mesh along the up axis.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HeightProfile {
    pub axis: usize,
    pub min: f64,
    pub range: f64,
    /// Two heights within this distance are the same level.
    pub tolerance: f64,
}

impl HeightProfile {
    pub fn new(positions: &[Point3<f64>], axis: usize) -> Self {
        let (min, max) = positions
            .iter()
            .map(|p| p[axis])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), h| (lo.min(h), hi.max(h)));
        let (min, range) = if min.is_finite() && max.is_finite() {
            (min, max - min)
        } else {
            (0.0, 0.0)
        };
        Self {
            axis,
            min,
            range,
            tolerance: (range * LEVEL_TOLERANCE).max(MIN_LEVEL_TOLERANCE),
        }
    }

    /// Within the bottom band.
    pub fn near_bottom(&self, h: f64) -> bool {
        h - self.min <= BOTTOM_BAND * self.range
    }

    /// Quantized height level.
    #[allow(clippy::cast_possible_truncation)]
    pub fn level(&self, h: f64) -> i64 {
        ((h - self.min) / self.tolerance).round() as i64
    }
}

/// Classify every group.
pub(crate) fn classify(
    graph: &VertexGraph,
    positions: &[Point3<f64>],
    profile: &HeightProfile,
) -> Vec<SurfaceType> {
    let axis = profile.axis;
    positions
        .iter()
        .enumerate()
        .map(|(g, p)| {
            let h = p[axis];
            let deltas = || {
                graph
                    .neighbors(g)
                    .iter()
                    .map(move |&n| positions[n as usize][axis] - h)
            };
            if profile.near_bottom(h) && deltas().all(|d| d.abs() <= profile.tolerance) {
                SurfaceType::Bottom
            } else if deltas().any(|d| d > profile.tolerance) {
                SurfaceType::Wall
            } else {
                SurfaceType::Top
            }
        })
        .collect()
}

/// Group counts per surface type, `(top, bottom, wall)`.
pub(crate) fn census(types: &[SurfaceType]) -> (usize, usize, usize) {
    types.iter().fold((0, 0, 0), |(t, b, w), ty| match ty {
        SurfaceType::Top => (t + 1, b, w),
        SurfaceType::Bottom => (t, b + 1, w),
        SurfaceType::Wall => (t, b, w + 1),
    })
}

/// Relocation plan that freezes the floor and filters step neighbors.
pub(crate) fn heightmap_plan<'g>(
    graph: &'g VertexGraph,
    weights: EdgeWeights,
    types: &[SurfaceType],
    profile: &HeightProfile,
) -> RelocationPlan<'g> {
    let mobility = types
        .iter()
        .map(|ty| match ty {
            SurfaceType::Bottom => Mobility::Frozen,
            SurfaceType::Top | SurfaceType::Wall => Mobility::Horizontal,
        })
        .collect();

    RelocationPlan {
        graph,
        weights,
        mobility,
        height_axis: profile.axis,
        max_height_delta: Some(NEIGHBOR_BAND * profile.range),
    }
}
