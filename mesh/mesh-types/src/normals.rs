//! Vertex normal recomputation.

#![allow(clippy::cast_possible_truncation)] // normals are emitted as f32 for the exchange buffers

use crate::MeshTopology;
use nalgebra::Vector3;

/// Accumulate area-weighted face normals onto every vertex slot and
/// normalize.
///
/// Returns a flat `f32` buffer with three components per vertex slot. Slots
/// referenced by no triangle, or only by zero-area triangles, get a zero
/// normal. On a triangle soup every slot belongs to exactly one triangle, so
/// the result is flat shading.
///
/// # Example
///
/// ```
/// use mesh_types::{MeshBuffers, accumulate_vertex_normals};
///
/// let mesh = MeshBuffers::soup(vec![
///     0.0, 0.0, 0.0,
///     1.0, 0.0, 0.0,
///     0.0, 1.0, 0.0,
/// ]);
/// let normals = accumulate_vertex_normals(&mesh);
/// assert_eq!(normals.len(), 9);
/// assert!((normals[2] - 1.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn accumulate_vertex_normals<M: MeshTopology>(mesh: &M) -> Vec<f32> {
    let mut sums = vec![Vector3::<f64>::zeros(); mesh.vertex_count()];

    for face in 0..mesh.face_count() {
        let weighted = mesh.triangle(face).cross();
        for slot in mesh.corners(face) {
            sums[slot as usize] += weighted;
        }
    }

    let mut out = Vec::with_capacity(sums.len() * 3);
    for sum in sums {
        let len = sum.norm();
        if len > f64::EPSILON {
            let n = sum / len;
            out.extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
        } else {
            out.extend_from_slice(&[0.0, 0.0, 0.0]);
        }
    }
    out
}
