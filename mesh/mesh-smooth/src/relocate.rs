//! The shared relocation pass.
//!
//! Every smoothing mode is built from one primitive: move each vertex group
//! to `p + f * (weighted_centroid(neighbors) - p)`. Groups can be frozen or
//! restricted to horizontal motion, and neighbors can be filtered by height.

use hashbrown::HashMap;
use mesh_repair::VertexGraph;
use mesh_types::{MeshBuffers, MeshTopology};
use nalgebra::{Point3, Vector3};

/// Neighbor weights for the centroid.
#[derive(Debug, Clone, Default)]
pub(crate) enum EdgeWeights {
    #[default]
    Uniform,
    /// Clamped cotangent weight per `(min, max)` group pair.
    Cotangent(HashMap<(u32, u32), f64>),
}

impl EdgeWeights {
    fn weight(&self, a: u32, b: u32) -> f64 {
        match self {
            Self::Uniform => 1.0,
            Self::Cotangent(w) => w.get(&(a.min(b), a.max(b))).copied().unwrap_or(0.0),
        }
    }
}

/// How a vertex group may move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mobility {
    Free,
    /// Height coordinate is copied through unchanged.
    Horizontal,
    Frozen,
}

/// Everything a relocation pass needs besides the positions.
#[derive(Debug)]
pub(crate) struct RelocationPlan<'g> {
    pub graph: &'g VertexGraph,
    pub weights: EdgeWeights,
    pub mobility: Vec<Mobility>,
    pub height_axis: usize,
    /// Ignore neighbors whose height differs by more than this.
    pub max_height_delta: Option<f64>,
}

impl<'g> RelocationPlan<'g> {
    /// Every group free, no filtering.
    pub fn free(graph: &'g VertexGraph, weights: EdgeWeights) -> Self {
        Self {
            graph,
            weights,
            mobility: vec![Mobility::Free; graph.group_count()],
            height_axis: 1,
            max_height_delta: None,
        }
    }

    /// One relocation pass with blend factor `factor`.
    pub fn pass(&self, positions: &[Point3<f64>], factor: f64) -> Vec<Point3<f64>> {
        positions
            .iter()
            .enumerate()
            .map(|(g, &p)| self.relocate(positions, g, p, factor))
            .collect()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn relocate(&self, positions: &[Point3<f64>], g: usize, p: Point3<f64>, factor: f64) -> Point3<f64> {
        let mobility = self.mobility[g];
        if mobility == Mobility::Frozen {
            return p;
        }

        let axis = self.height_axis;
        let mut sum = Vector3::zeros();
        let mut total = 0.0;
        for &n in self.graph.neighbors(g) {
            let q = positions[n as usize];
            if let Some(limit) = self.max_height_delta {
                if (q[axis] - p[axis]).abs() > limit {
                    continue;
                }
            }
            let w = self.weights.weight(g as u32, n);
            sum += q.coords * w;
            total += w;
        }
        if total <= 0.0 {
            return p;
        }

        let centroid = sum / total;
        let mut moved = p + (centroid - p.coords) * factor;
        if mobility == Mobility::Horizontal {
            moved[axis] = p[axis];
        }
        moved
    }
}

/// Position of each group's representative slot.
pub(crate) fn group_positions(mesh: &MeshBuffers, graph: &VertexGraph) -> Vec<Point3<f64>> {
    (0..graph.group_count())
        .map(|g| mesh.position(graph.representative(g)))
        .collect()
}
