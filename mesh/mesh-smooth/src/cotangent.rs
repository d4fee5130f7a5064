//! Cotangent edge weights.
//!
//! For each triangle corner the cotangent of its angle is added to the
//! weight of the opposite edge. Weights are computed once from the input
//! geometry and clamped so sliver triangles cannot dominate a centroid.

use hashbrown::HashMap;
use mesh_repair::VertexGraph;
use mesh_types::{MeshBuffers, MeshTopology};
use nalgebra::Vector3;

/// Smallest weight an edge can carry.
pub const MIN_COTANGENT_WEIGHT: f64 = 0.01;

/// Largest weight an edge can carry.
pub const MAX_COTANGENT_WEIGHT: f64 = 10.0;

/// `cot θ = (a·b) / |a×b|` for the angle between `a` and `b`.
///
/// Returns `None` when the vectors are parallel or either is zero.
///
/// # Example
///
/// ```
/// use mesh_smooth::cotangent;
/// use mesh_types::Vector3;
///
/// let cot = cotangent(&Vector3::x(), &Vector3::new(1.0, 1.0, 0.0)).unwrap();
/// assert!((cot - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn cotangent(a: &Vector3<f64>, b: &Vector3<f64>) -> Option<f64> {
    let sin = a.cross(b).norm();
    if sin <= f64::EPSILON * a.norm() * b.norm() {
        return None;
    }
    Some(a.dot(b) / sin)
}

/// Clamped cotangent weight of every edge between vertex groups.
///
/// Keys are `(min, max)` group pairs.
#[must_use]
pub fn cotangent_weights(mesh: &MeshBuffers, graph: &VertexGraph) -> HashMap<(u32, u32), f64> {
    let mut weights: HashMap<(u32, u32), f64> = HashMap::new();

    for face in 0..mesh.face_count() {
        let groups = graph.face_groups(mesh, face);
        let tri = mesh.triangle(face);
        let corners = [tri.v0, tri.v1, tri.v2];

        for i in 0..3 {
            let (j, k) = ((i + 1) % 3, (i + 2) % 3);
            let (gj, gk) = (groups[j], groups[k]);
            if gj == gk {
                continue;
            }
            let key = (gj.min(gk), gj.max(gk));
            let entry = weights.entry(key).or_insert(0.0);
            if let Some(cot) = cotangent(&(corners[j] - corners[i]), &(corners[k] - corners[i])) {
                *entry += cot;
            }
        }
    }

    for w in weights.values_mut() {
        *w = w.clamp(MIN_COTANGENT_WEIGHT, MAX_COTANGENT_WEIGHT);
    }
    weights
}
