//! Fast coarse pass through meshoptimizer.
//!
//! Very large meshes are first brought down with meshoptimizer's edge
//! collapse, which trades quality for speed, before the quadric strategies
//! run on the smaller result.

// Mesh indices and counts don't overflow in practice
#![allow(clippy::cast_possible_truncation)]

use meshopt::{SimplifyOptions, VertexDataAdapter, typed_to_bytes};
use mesh_repair::remove_unreferenced_vertices;
use mesh_types::IndexedMesh;
use tracing::debug;

use crate::error::{DecimateError, DecimateResult};
use crate::simplifier::Simplifier;

/// meshoptimizer edge collapse with border vertices locked.
#[derive(Debug, Clone, Copy)]
pub struct MeshoptSimplifier {
    /// Relative error budget (fraction of the mesh extent).
    pub target_error: f32,
    /// Keep open-boundary vertices in place.
    pub lock_border: bool,
}

impl Default for MeshoptSimplifier {
    fn default() -> Self {
        Self {
            target_error: 0.05,
            lock_border: true,
        }
    }
}

impl MeshoptSimplifier {
    /// Coarse simplifier with the given error budget.
    #[must_use]
    pub const fn with_target_error(target_error: f32) -> Self {
        Self {
            target_error,
            lock_border: true,
        }
    }
}

impl Simplifier for MeshoptSimplifier {
    fn name(&self) -> &'static str {
        "meshopt"
    }

    fn simplify(&self, mesh: &IndexedMesh, target: usize) -> DecimateResult<IndexedMesh> {
        if mesh.faces.is_empty() {
            return Err(DecimateError::EmptyMesh);
        }

        let vertex_count = mesh.vertices.len();
        let indices: Vec<u32> = mesh.faces.iter().flatten().copied().collect();
        if indices.iter().any(|&i| i as usize >= vertex_count) {
            return Err(DecimateError::ExternalToolFailure {
                strategy: self.name(),
                reason: "index out of range".to_owned(),
            });
        }

        let vertex_data: Vec<f32> = mesh
            .vertices
            .iter()
            .flat_map(|v| {
                [
                    v.position.x as f32,
                    v.position.y as f32,
                    v.position.z as f32,
                ]
            })
            .collect();

        let options = if self.lock_border {
            SimplifyOptions::LockBorder
        } else {
            SimplifyOptions::empty()
        };
        let adapter = VertexDataAdapter::new(
            typed_to_bytes(&vertex_data),
            std::mem::size_of::<[f32; 3]>(),
            0,
        )
        .map_err(|e| DecimateError::ExternalToolFailure {
            strategy: self.name(),
            reason: format!("{e:?}"),
        })?;

        let mut result_error = 0.0f32;
        let dest = meshopt::simplify(
            &indices,
            &adapter,
            target.saturating_mul(3),
            self.target_error,
            options,
            Some(&mut result_error),
        );
        let written = dest.len();

        if written > indices.len() || written % 3 != 0 {
            return Err(DecimateError::ExternalToolFailure {
                strategy: self.name(),
                reason: format!("returned {written} indices for {} input", indices.len()),
            });
        }

        debug!(
            triangles = written / 3,
            error = f64::from(result_error),
            "meshopt simplification finished"
        );

        let faces = dest
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();
        let mut out = IndexedMesh::from_parts(mesh.vertices.clone(), faces);
        remove_unreferenced_vertices(&mut out);
        Ok(out)
    }
}
