//! Connected-component cleanup of CSG output.
//!
//! Boolean operations leave behind slivers, floating fragments and zero-area
//! faces along the cut. [`cleanup_csg`] splits the result into components
//! that share a (quantized) vertex and keeps the ones that pass a
//! [`CleanupParams`] policy.

use std::fmt;

use hashbrown::HashMap;
use mesh_types::{Aabb, MeshBuffers, MeshTopology};
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{RepairError, RepairResult};
use crate::graph::{PositionKey, quantize};

/// Policy for [`cleanup_csg`].
///
/// All thresholds are in mesh units (typically millimeters).
///
/// # Example
///
/// ```
/// use mesh_repair::CleanupParams;
///
/// let params = CleanupParams::for_csg().with_min_volume(0.5);
/// assert_eq!(params.min_volume, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CleanupParams {
    /// Components with less enclosed volume are removed.
    ///
    /// Default: `1e-3`
    pub min_volume: f64,

    /// Components with fewer triangles are removed.
    ///
    /// Default: `4` (a tetrahedron)
    pub min_triangles: usize,

    /// Triangles with less area are dropped before segmentation.
    ///
    /// Default: `1e-10`
    pub min_triangle_area: f64,

    /// Grid size used to decide that two corners are the same vertex.
    ///
    /// Default: `1e-4`
    pub vertex_merge_tolerance: f64,

    /// Keep at most this many components, largest volume first. `0` keeps all.
    ///
    /// Default: `0`
    pub keep_largest_n: usize,

    /// Components whose smallest bounding-box dimension is thinner are
    /// removed.
    ///
    /// Default: `0.0` (disabled)
    pub min_thickness: f64,
}

impl Default for CleanupParams {
    fn default() -> Self {
        Self {
            min_volume: 1e-3,
            min_triangles: 4,
            min_triangle_area: 1e-10,
            vertex_merge_tolerance: 1e-4,
            keep_largest_n: 0,
            min_thickness: 0.0,
        }
    }
}

impl CleanupParams {
    /// Tuned for boolean results in millimeters: removes sub-0.01 mm³
    /// fragments and slivers thinner than 0.01 mm.
    #[must_use]
    pub fn for_csg() -> Self {
        Self {
            min_volume: 0.01,
            min_triangles: 4,
            min_triangle_area: 1e-8,
            vertex_merge_tolerance: 1e-4,
            keep_largest_n: 0,
            min_thickness: 0.01,
        }
    }

    /// Keep only the single largest component.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            keep_largest_n: 1,
            ..Self::for_csg()
        }
    }

    /// Set the minimum component volume.
    #[must_use]
    pub const fn with_min_volume(mut self, min_volume: f64) -> Self {
        self.min_volume = min_volume;
        self
    }

    /// Set the minimum component triangle count.
    #[must_use]
    pub const fn with_min_triangles(mut self, min_triangles: usize) -> Self {
        self.min_triangles = min_triangles;
        self
    }

    /// Keep at most `n` components.
    #[must_use]
    pub const fn with_keep_largest(mut self, n: usize) -> Self {
        self.keep_largest_n = n;
        self
    }

    /// Set the minimum component thickness.
    #[must_use]
    pub const fn with_min_thickness(mut self, min_thickness: f64) -> Self {
        self.min_thickness = min_thickness;
        self
    }
}

/// Measurements of one connected component.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComponentStats {
    /// Triangle indices in the input mesh, ascending.
    pub triangles: Vec<usize>,
    /// Absolute divergence-theorem volume. Approximate for open components.
    pub volume: f64,
    /// Bounding box of the component's corners.
    pub bounds: Aabb,
    /// Smallest bounding-box dimension.
    pub min_dimension: f64,
}

impl ComponentStats {
    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// Why a component was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RemovalReason {
    /// Below `min_volume`.
    Volume,
    /// Below `min_triangles`.
    TriangleCount,
    /// Below `min_thickness`.
    Thickness,
    /// Outside the `keep_largest_n` largest.
    NotLargest,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Volume => "below minimum volume",
            Self::TriangleCount => "below minimum triangle count",
            Self::Thickness => "thinner than minimum thickness",
            Self::NotLargest => "not among the largest components",
        })
    }
}

/// Outcome of [`cleanup_csg`].
///
/// `geometry` is always usable: on failure it is a copy of the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    /// Cleaned mesh.
    pub geometry: MeshBuffers,
    /// Components found after dropping tiny triangles.
    pub components_found: usize,
    /// Components removed by the policy.
    pub components_removed: usize,
    /// Triangles dropped for being below `min_triangle_area`.
    pub degenerate_triangles_removed: usize,
    /// Components kept, largest volume first.
    pub retained: Vec<ComponentStats>,
    /// What was done, in order.
    pub actions: Vec<String>,
    /// Why cleanup fell back to the input, if it did.
    pub error: Option<RepairError>,
}

impl CleanupReport {
    /// Whether cleanup ran to completion.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.error.is_none()
    }

    /// Components kept.
    #[must_use]
    pub const fn components_retained(&self) -> usize {
        self.components_found - self.components_removed
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cleanup: {} components found, {} removed, {} tiny triangles dropped",
            self.components_found, self.components_removed, self.degenerate_triangles_removed
        )?;
        if let Some(e) = &self.error {
            write!(f, " (failed: {e})")?;
        }
        Ok(())
    }
}

/// Disjoint-set forest with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<u32>,
    rank: Vec<u8>,
}

impl UnionFind {
    /// `n` singleton sets.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
            rank: vec![0; n],
        }
    }

    /// Representative of the set containing `x`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] as usize != root {
            root = self.parent[root] as usize;
        }
        let mut node = x;
        while self.parent[node] as usize != root {
            let next = self.parent[node] as usize;
            self.parent[node] = root as u32;
            node = next;
        }
        root
    }

    /// Merge the sets containing `a` and `b`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb as u32,
            std::cmp::Ordering::Greater => self.parent[rb] = ra as u32,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra as u32;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Remove CSG artifacts from a mesh.
///
/// Steps:
/// 1. Drop triangles with area below `min_triangle_area`.
/// 2. Group triangles that share a corner (at `vertex_merge_tolerance`).
/// 3. Measure each component's volume, triangle count and thickness.
/// 4. Keep components passing every threshold, then at most
///    `keep_largest_n` of them.
///
/// A mesh with a single component skips step 4. If the policy would remove
/// every component, the largest one is kept. Triangle order is preserved and
/// normals are recomputed. Never fails worse than returning the input.
///
/// # Example
///
/// ```
/// use mesh_repair::{CleanupParams, cleanup_csg};
/// use mesh_types::{MeshBuffers, unit_cube};
///
/// let cube = MeshBuffers::from_indexed_mesh(&unit_cube());
/// let report = cleanup_csg(&cube, &CleanupParams::default());
///
/// assert!(report.success());
/// assert_eq!(report.components_found, 1);
/// assert_eq!(report.components_removed, 0);
/// ```
#[must_use]
pub fn cleanup_csg(mesh: &MeshBuffers, params: &CleanupParams) -> CleanupReport {
    info!(
        triangles = mesh.face_count(),
        min_volume = params.min_volume,
        min_triangles = params.min_triangles,
        "Starting CSG cleanup"
    );

    match try_cleanup(mesh, params) {
        Ok(report) => {
            info!(
                found = report.components_found,
                removed = report.components_removed,
                tiny_triangles = report.degenerate_triangles_removed,
                "CSG cleanup complete"
            );
            report
        }
        Err(e) => {
            warn!(error = %e, "CSG cleanup failed, returning input unchanged");
            CleanupReport {
                geometry: mesh.clone(),
                actions: vec!["cleanup skipped; input returned unchanged".to_owned()],
                error: Some(e),
                ..CleanupReport::default()
            }
        }
    }
}

fn try_cleanup(mesh: &MeshBuffers, params: &CleanupParams) -> RepairResult<CleanupReport> {
    mesh.validate()?;
    if mesh.is_empty() {
        return Err(RepairError::EmptyMesh);
    }
    if !(params.vertex_merge_tolerance > 0.0 && params.vertex_merge_tolerance.is_finite()) {
        return Err(RepairError::NumericDegeneracy {
            details: format!(
                "vertex merge tolerance {} must be positive",
                params.vertex_merge_tolerance
            ),
        });
    }

    let face_count = mesh.face_count();
    let mut actions = Vec::new();

    // 1. Tiny triangles.
    let alive: Vec<bool> = (0..face_count)
        .map(|face| mesh.triangle(face).area() >= params.min_triangle_area)
        .collect();
    let degenerate_removed = alive.iter().filter(|&&a| !a).count();
    if degenerate_removed > 0 {
        actions.push(format!(
            "dropped {degenerate_removed} triangle(s) below {} area",
            params.min_triangle_area
        ));
    }

    // 2. Segment.
    let mut components = find_components(mesh, &alive, params.vertex_merge_tolerance);
    let components_found = components.len();
    debug!(components = components_found, "Segmented mesh");

    if let Some(bad) = components.iter().find(|c| !c.volume.is_finite()) {
        return Err(RepairError::NumericDegeneracy {
            details: format!(
                "component of {} triangles has non-finite volume",
                bad.triangle_count()
            ),
        });
    }

    // Largest volume first; ties keep discovery order.
    components.sort_by(|a, b| b.volume.total_cmp(&a.volume));

    if components_found <= 1 {
        if components_found == 1 {
            actions.push("single component; filtering skipped".to_owned());
        }
        return Ok(CleanupReport {
            geometry: mesh.select_faces(&alive),
            components_found,
            components_removed: 0,
            degenerate_triangles_removed: degenerate_removed,
            retained: components,
            actions,
            error: None,
        });
    }

    // 3-4. Filter.
    let mut removed_by: HashMap<RemovalReason, usize> = HashMap::new();
    let mut retained = Vec::with_capacity(components.len());
    for component in &components {
        match rejection_reason(component, params) {
            Some(reason) => {
                debug!(
                    triangles = component.triangle_count(),
                    volume = component.volume,
                    thickness = component.min_dimension,
                    %reason,
                    "Removing component"
                );
                *removed_by.entry(reason).or_insert(0) += 1;
            }
            None => retained.push(component.clone()),
        }
    }
    if params.keep_largest_n > 0 && retained.len() > params.keep_largest_n {
        let dropped = retained.len() - params.keep_largest_n;
        retained.truncate(params.keep_largest_n);
        *removed_by.entry(RemovalReason::NotLargest).or_insert(0) += dropped;
    }

    for reason in [
        RemovalReason::Volume,
        RemovalReason::TriangleCount,
        RemovalReason::Thickness,
        RemovalReason::NotLargest,
    ] {
        if let Some(&n) = removed_by.get(&reason) {
            actions.push(format!("removed {n} component(s) {reason}"));
        }
    }

    if retained.is_empty() {
        if let Some(largest) = components.first() {
            warn!(
                volume = largest.volume,
                triangles = largest.triangle_count(),
                "Every component failed the policy; keeping the largest"
            );
            actions.push(format!(
                "every component failed the policy; kept the largest ({} triangles)",
                largest.triangle_count()
            ));
            retained.push(largest.clone());
        }
    }

    let mut keep = vec![false; face_count];
    for component in &retained {
        for &face in &component.triangles {
            keep[face] = true;
        }
    }

    Ok(CleanupReport {
        geometry: mesh.select_faces(&keep),
        components_found,
        components_removed: components_found - retained.len(),
        degenerate_triangles_removed: degenerate_removed,
        retained,
        actions,
        error: None,
    })
}

fn rejection_reason(component: &ComponentStats, params: &CleanupParams) -> Option<RemovalReason> {
    if component.volume < params.min_volume {
        Some(RemovalReason::Volume)
    } else if component.triangle_count() < params.min_triangles {
        Some(RemovalReason::TriangleCount)
    } else if component.min_dimension < params.min_thickness {
        Some(RemovalReason::Thickness)
    } else {
        None
    }
}

/// Split the alive faces of a mesh into components sharing a quantized
/// corner. Components are returned in order of their first triangle.
#[must_use]
pub fn find_components<M: MeshTopology>(
    mesh: &M,
    alive: &[bool],
    tolerance: f64,
) -> Vec<ComponentStats> {
    let scale = 1.0 / tolerance;
    let face_count = mesh.face_count();
    let alive = |face: usize| alive.get(face).copied().unwrap_or(false);

    // Quantized key per slot, so shared slots of an indexed mesh hash once.
    let mut key_of_slot: Vec<Option<PositionKey>> = vec![None; mesh.vertex_count()];
    let mut first_face: HashMap<PositionKey, usize> = HashMap::new();
    let mut uf = UnionFind::new(face_count);

    for face in (0..face_count).filter(|&f| alive(f)) {
        for slot in mesh.corners(face) {
            let slot = slot as usize;
            let key = *key_of_slot[slot].get_or_insert_with(|| quantize(&mesh.position(slot), scale));
            match first_face.get(&key) {
                Some(&other) => uf.union(face, other),
                None => {
                    first_face.insert(key, face);
                }
            }
        }
    }

    let mut index_of_root: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<ComponentStats> = Vec::new();
    for face in (0..face_count).filter(|&f| alive(f)) {
        let root = uf.find(face);
        let idx = *index_of_root.entry(root).or_insert_with(|| {
            components.push(ComponentStats {
                triangles: Vec::new(),
                volume: 0.0,
                bounds: Aabb::empty(),
                min_dimension: 0.0,
            });
            components.len() - 1
        });

        let tri = mesh.triangle(face);
        let component = &mut components[idx];
        component.triangles.push(face);
        component.volume += tri.signed_volume_term();
        for v in [&tri.v0, &tri.v1, &tri.v2] {
            component.bounds.expand_to_include(v);
        }
    }

    for component in &mut components {
        component.volume = component.volume.abs() / 6.0;
        component.min_dimension = component.bounds.min_extent();
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{IndexedMesh, Vertex, unit_cube};

    /// Unit cube scaled by `size` and moved by `offset`.
    fn cube_at(size: f64, offset: [f64; 3]) -> IndexedMesh {
        let mut cube = unit_cube();
        for v in &mut cube.vertices {
            v.position.x = v.position.x * size + offset[0];
            v.position.y = v.position.y * size + offset[1];
            v.position.z = v.position.z * size + offset[2];
        }
        cube
    }

    fn merge(meshes: &[IndexedMesh]) -> MeshBuffers {
        let mut out = IndexedMesh::new();
        for mesh in meshes {
            #[allow(clippy::cast_possible_truncation)]
            let base = out.vertices.len() as u32;
            out.vertices.extend(mesh.vertices.iter().cloned());
            out.faces
                .extend(mesh.faces.iter().map(|f| f.map(|v| v + base)));
        }
        MeshBuffers::from_indexed_mesh(&out)
    }

    #[test]
    fn union_find_merges_transitively() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(3, 4);
        uf.union(1, 4);
        assert_eq!(uf.find(0), uf.find(3));
        assert_ne!(uf.find(0), uf.find(2));
    }

    #[test]
    fn removes_small_fragment() {
        let mesh = merge(&[cube_at(10.0, [0.0; 3]), cube_at(0.1, [20.0, 0.0, 0.0])]);
        let params = CleanupParams::default().with_min_volume(0.01);
        let report = cleanup_csg(&mesh, &params);

        assert!(report.success());
        assert_eq!(report.components_found, 2);
        assert_eq!(report.components_removed, 1);
        assert_eq!(report.geometry.face_count(), 12);
        assert_relative_eq!(report.retained[0].volume, 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn accounting_holds() {
        let mesh = merge(&[
            cube_at(1.0, [0.0; 3]),
            cube_at(2.0, [5.0, 0.0, 0.0]),
            cube_at(3.0, [10.0, 0.0, 0.0]),
        ]);
        let report = cleanup_csg(&mesh, &CleanupParams::default().with_keep_largest(2));

        assert_eq!(report.components_found, 3);
        assert_eq!(
            report.components_found,
            report.components_removed + report.components_retained()
        );
        assert_eq!(report.components_retained(), 2);
        assert!(report.actions.iter().any(|a| a.contains("largest")));
    }

    #[test]
    fn keeps_largest_when_everything_fails() {
        let mesh = merge(&[cube_at(1.0, [0.0; 3]), cube_at(2.0, [5.0, 0.0, 0.0])]);
        let report = cleanup_csg(&mesh, &CleanupParams::default().with_min_volume(1e6));

        assert!(report.success());
        assert_eq!(report.components_removed, 1);
        assert_relative_eq!(report.retained[0].volume, 8.0, epsilon = 1e-9);
        assert_eq!(report.geometry.face_count(), 12);
    }

    #[test]
    fn single_component_skips_filtering() {
        let mesh = merge(&[cube_at(0.01, [0.0; 3])]);
        let report = cleanup_csg(&mesh, &CleanupParams::default().with_min_volume(1.0));
        assert_eq!(report.components_removed, 0);
        assert_eq!(report.geometry.face_count(), 12);
    }

    #[test]
    fn thin_sliver_is_removed() {
        let mut sliver = IndexedMesh::new();
        for [x, y, z] in [[0.0, 0.0, 0.0], [9.0, 0.0, 0.0], [0.0, 9.0, 0.0], [0.0, 0.0, 0.001]] {
            sliver
                .vertices
                .push(Vertex::from_coords(x + 20.0, y, z));
        }
        sliver.faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];

        let mesh = merge(&[cube_at(5.0, [0.0; 3]), sliver]);
        let params = CleanupParams::default()
            .with_min_volume(0.0)
            .with_min_thickness(0.01);
        let report = cleanup_csg(&mesh, &params);

        assert_eq!(report.components_removed, 1);
        assert!(report.actions.iter().any(|a| a.contains("thinner")));
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn soup_corners_connect_through_tolerance() {
        let cube = cube_at(1.0, [0.0; 3]);
        let positions = cube
            .faces
            .iter()
            .flatten()
            .flat_map(|&v| {
                let p = cube.vertices[v as usize].position;
                [p.x as f32, p.y as f32, p.z as f32]
            })
            .collect();
        let soup = MeshBuffers::soup(positions);

        let report = cleanup_csg(&soup, &CleanupParams::default());
        assert_eq!(report.components_found, 1);
        assert!(!report.geometry.is_indexed());
    }

    #[test]
    fn tiny_triangles_dropped_before_segmentation() {
        let mut cube = unit_cube();
        cube.faces.push([0, 0, 1]);
        let report = cleanup_csg(
            &MeshBuffers::from_indexed_mesh(&cube),
            &CleanupParams::default(),
        );
        assert_eq!(report.degenerate_triangles_removed, 1);
        assert_eq!(report.geometry.face_count(), 12);
    }

    #[test]
    fn invalid_input_returns_copy() {
        let mesh = MeshBuffers::indexed(vec![0.0; 9], vec![0, 1, 9]);
        let report = cleanup_csg(&mesh, &CleanupParams::default());
        assert!(!report.success());
        assert_eq!(report.geometry, mesh);
    }
}
