//! Simplification strategies the pipeline can chain.
//!
//! Each [`Simplifier`] takes an indexed mesh and a triangle budget and returns
//! a new mesh. Strategies may fail; the
//! [`DecimationPipeline`](crate::DecimationPipeline) records the failure and
//! moves on to the next one.

// Mesh indices and counts don't overflow in practice
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

use hashbrown::{HashMap, HashSet};
use mesh_repair::{
    DEFAULT_DEGENERATE_EPSILON, remove_degenerate_faces, remove_duplicate_faces,
    remove_unreferenced_vertices, weld_vertices,
};
use mesh_types::{Aabb, IndexedMesh, Point3, Vertex};
use tracing::debug;

use crate::decimate::decimate_mesh;
use crate::error::{DecimateError, DecimateResult};
use crate::params::DecimateParams;

/// A mesh simplification strategy.
pub trait Simplifier {
    /// Short name used in reports and logs.
    fn name(&self) -> &'static str;

    /// Simplify `mesh` toward `target` triangles.
    ///
    /// # Errors
    ///
    /// Returns an error when the strategy cannot produce a mesh.
    fn simplify(&self, mesh: &IndexedMesh, target: usize) -> DecimateResult<IndexedMesh>;
}

/// Quadric edge collapse with the configured [`DecimateParams`].
#[derive(Debug, Clone, Default)]
pub struct QemSimplifier {
    /// Collapse settings. The target is overridden per call.
    pub params: DecimateParams,
}

impl QemSimplifier {
    /// Edge collapse with explicit settings.
    #[must_use]
    pub const fn new(params: DecimateParams) -> Self {
        Self { params }
    }
}

impl Simplifier for QemSimplifier {
    fn name(&self) -> &'static str {
        "qem"
    }

    fn simplify(&self, mesh: &IndexedMesh, target: usize) -> DecimateResult<IndexedMesh> {
        if mesh.faces.is_empty() {
            return Err(DecimateError::EmptyMesh);
        }
        let result = decimate_mesh(mesh, &self.params.clone().with_target(target));
        debug!(strategy = self.name(), "{result}");
        Ok(result.mesh)
    }
}

/// Cleans the mesh up first, then collapses with relaxed settings.
///
/// Welds near-coincident vertices and drops degenerate and duplicate faces so
/// edge collapse sees a consistent surface, then decimates with boundaries
/// free to move and no face-flip check.
#[derive(Debug, Clone)]
pub struct RepairingSimplifier {
    /// Weld distance as a fraction of the average bounding dimension.
    pub relative_weld_tolerance: f64,
}

impl Default for RepairingSimplifier {
    fn default() -> Self {
        Self {
            relative_weld_tolerance: 1e-6,
        }
    }
}

impl Simplifier for RepairingSimplifier {
    fn name(&self) -> &'static str {
        "qem-repair"
    }

    fn simplify(&self, mesh: &IndexedMesh, target: usize) -> DecimateResult<IndexedMesh> {
        if mesh.faces.is_empty() {
            return Err(DecimateError::EmptyMesh);
        }

        let mut work = mesh.clone();
        let extent = bounds(&work).average_extent();
        let welded = weld_vertices(&mut work, extent * self.relative_weld_tolerance);
        let degenerate = remove_degenerate_faces(&mut work, DEFAULT_DEGENERATE_EPSILON);
        let duplicate = remove_duplicate_faces(&mut work);
        remove_unreferenced_vertices(&mut work);
        debug!(welded, degenerate, duplicate, "Prepared mesh for repairing collapse");

        if work.faces.is_empty() {
            return Err(DecimateError::EmptyOutput {
                strategy: self.name(),
            });
        }

        let params = DecimateParams::aggressive().with_target(target);
        Ok(decimate_mesh(&work, &params).mesh)
    }
}

/// Vertex clustering on a uniform grid.
///
/// Cell size is `average_extent / (100 / sqrt(current / target))`: the
/// further the mesh is over budget, the coarser the grid. Each occupied cell
/// becomes one vertex at the mean of its members. A face is dropped as soon
/// as two of its corners share a cell, not only when all three do, since it
/// would be degenerate otherwise. Faces that snap onto an already emitted
/// face are dropped as duplicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusteringSimplifier;

impl ClusteringSimplifier {
    /// Grid cell size for reducing `current` triangles toward `target`.
    #[must_use]
    pub fn cell_size(bounds: &Aabb, current: usize, target: usize) -> f64 {
        let divisions = 100.0 / (current as f64 / target.max(1) as f64).sqrt();
        bounds.average_extent() / divisions
    }
}

impl Simplifier for ClusteringSimplifier {
    fn name(&self) -> &'static str {
        "clustering"
    }

    fn simplify(&self, mesh: &IndexedMesh, target: usize) -> DecimateResult<IndexedMesh> {
        if mesh.faces.is_empty() {
            return Err(DecimateError::EmptyMesh);
        }

        let bounds = bounds(mesh);
        let cell = Self::cell_size(&bounds, mesh.faces.len(), target);
        if !(cell.is_finite() && cell > 0.0) {
            return Err(DecimateError::NumericDegeneracy {
                strategy: self.name(),
                details: format!("cell size {cell}"),
            });
        }

        let mut cell_of: HashMap<[i64; 3], u32> = HashMap::new();
        let mut sums: Vec<(Point3<f64>, f64)> = Vec::new();
        let remap: Vec<u32> = mesh
            .vertices
            .iter()
            .map(|v| {
                let key = ((v.position - bounds.min) / cell).map(|c| c.floor() as i64);
                let id = *cell_of.entry([key.x, key.y, key.z]).or_insert_with(|| {
                    sums.push((Point3::origin(), 0.0));
                    (sums.len() - 1) as u32
                });
                let (sum, count) = &mut sums[id as usize];
                *sum += v.position.coords;
                *count += 1.0;
                id
            })
            .collect();

        let mut seen = HashSet::new();
        let faces: Vec<[u32; 3]> = mesh
            .faces
            .iter()
            .map(|face| face.map(|v| remap[v as usize]))
            .filter(|&[a, b, c]| a != b && b != c && a != c)
            .filter(|face| {
                let mut key = *face;
                key.sort_unstable();
                seen.insert(key)
            })
            .collect();

        let vertices = sums
            .into_iter()
            .map(|(sum, count)| Vertex::new(sum / count))
            .collect();
        let mut out = IndexedMesh::from_parts(vertices, faces);
        remove_unreferenced_vertices(&mut out);

        debug!(
            cell_size = cell,
            cells = cell_of.len(),
            faces = out.faces.len(),
            "Clustered vertices"
        );
        Ok(out)
    }
}

fn bounds(mesh: &IndexedMesh) -> Aabb {
    Aabb::from_points(mesh.vertices.iter().map(|v| &v.position))
}
