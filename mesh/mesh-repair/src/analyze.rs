//! Read-only topology diagnostics.
//!
//! [`analyze`] reports counts, degenerate faces, edge classification and a
//! manifold verdict without touching the input. It never fails: malformed
//! buffers show up as an issue in the report.

use std::fmt;

use mesh_types::{Aabb, MeshBuffers, MeshTopology};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::adjacency::MeshAdjacency;
use crate::graph::{DEFAULT_PRECISION, VertexGraph};

/// Default threshold on the squared cross-product length below which a
/// triangle is degenerate.
pub const DEFAULT_DEGENERATE_EPSILON: f64 = 1e-12;

/// Options for [`analyze_with_options`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalyzeOptions {
    /// Squared cross-product length below which a face is degenerate.
    pub degenerate_epsilon: f64,
    /// Classify soup edges by welded position instead of by slot.
    ///
    /// Without welding, every edge of a soup is a boundary edge.
    pub weld_soup: bool,
    /// Decimal places used when welding a soup.
    pub weld_precision: u32,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            degenerate_epsilon: DEFAULT_DEGENERATE_EPSILON,
            weld_soup: false,
            weld_precision: DEFAULT_PRECISION,
        }
    }
}

impl AnalyzeOptions {
    /// Options that weld soups before classifying edges.
    #[must_use]
    pub fn welded() -> Self {
        Self {
            weld_soup: true,
            ..Self::default()
        }
    }

    /// Set the degenerate threshold.
    #[must_use]
    pub const fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.degenerate_epsilon = epsilon;
        self
    }
}

/// Snapshot of a mesh's topology.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisResult {
    /// No boundary edges, no non-manifold edges and no degenerate faces.
    pub is_manifold: bool,
    /// No boundary edges.
    pub is_watertight: bool,
    /// Whether the input carried an index buffer.
    pub is_indexed: bool,
    /// Number of triangles.
    pub triangle_count: usize,
    /// Number of vertex slots.
    pub vertex_count: usize,
    /// Number of distinct undirected edges.
    pub edge_count: usize,
    /// Edges used by exactly one face.
    pub boundary_edge_count: usize,
    /// Edges used by more than two faces.
    pub non_manifold_edge_count: usize,
    /// Faces below the degenerate threshold.
    pub degenerate_face_count: usize,
    /// Whether any face is degenerate.
    pub has_degenerate_faces: bool,
    /// Bounding box over every vertex slot.
    pub bounds: Aabb,
    /// Human-readable findings. Advisory only.
    pub issues: Vec<String>,
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Analysis:")?;
        writeln!(
            f,
            "  {} triangles, {} vertices, {} edges ({})",
            self.triangle_count,
            self.vertex_count,
            self.edge_count,
            if self.is_indexed { "indexed" } else { "soup" }
        )?;
        writeln!(
            f,
            "  Manifold: {}",
            if self.is_manifold { "Yes" } else { "No" }
        )?;
        writeln!(
            f,
            "  Watertight: {}",
            if self.is_watertight { "Yes" } else { "No" }
        )?;
        if !self.issues.is_empty() {
            writeln!(f, "  Issues:")?;
            for issue in &self.issues {
                writeln!(f, "    - {issue}")?;
            }
        }
        Ok(())
    }
}

/// Check whether `face` is degenerate under `epsilon`.
#[inline]
#[must_use]
pub fn is_degenerate_face<M: MeshTopology>(mesh: &M, face: usize, epsilon: f64) -> bool {
    mesh.triangle(face).is_degenerate(epsilon)
}

/// Analyze a mesh.
///
/// `epsilon` overrides the degenerate threshold (squared cross-product
/// length, default `1e-12`).
///
/// # Example
///
/// ```
/// use mesh_repair::analyze;
/// use mesh_types::{MeshBuffers, unit_cube};
///
/// let cube = MeshBuffers::from_indexed_mesh(&unit_cube());
/// let result = analyze(&cube, None);
///
/// assert!(result.is_manifold);
/// assert_eq!(result.boundary_edge_count, 0);
/// assert_eq!(result.edge_count, 18);
/// ```
#[must_use]
pub fn analyze(mesh: &MeshBuffers, epsilon: Option<f64>) -> AnalysisResult {
    let options = AnalyzeOptions {
        degenerate_epsilon: epsilon.unwrap_or(DEFAULT_DEGENERATE_EPSILON),
        ..AnalyzeOptions::default()
    };
    analyze_with_options(mesh, &options)
}

/// Analyze a mesh with explicit options.
#[must_use]
pub fn analyze_with_options(mesh: &MeshBuffers, options: &AnalyzeOptions) -> AnalysisResult {
    let mut result = AnalysisResult {
        is_indexed: mesh.is_indexed(),
        ..AnalysisResult::default()
    };

    if let Err(e) = mesh.validate() {
        result.issues.push(format!("invalid buffers: {e}"));
        return result;
    }

    result.triangle_count = mesh.face_count();
    result.vertex_count = mesh.vertex_count();
    result.bounds = mesh.bounds();

    if mesh.is_empty() {
        result.issues.push("mesh has no triangles".to_owned());
        return result;
    }

    result.degenerate_face_count = (0..mesh.face_count())
        .filter(|&face| is_degenerate_face(mesh, face, options.degenerate_epsilon))
        .count();
    result.has_degenerate_faces = result.degenerate_face_count > 0;

    let welded = options.weld_soup && !mesh.is_indexed();
    let adjacency = if welded {
        let graph = VertexGraph::with_precision(mesh, options.weld_precision);
        MeshAdjacency::build((0..mesh.face_count()).map(|face| graph.face_groups(mesh, face)))
    } else {
        MeshAdjacency::build((0..mesh.face_count()).map(|face| mesh.corners(face)))
    };

    result.edge_count = adjacency.edge_count();
    result.boundary_edge_count = adjacency.boundary_edge_count();
    result.non_manifold_edge_count = adjacency.non_manifold_edge_count();
    result.is_watertight = result.boundary_edge_count == 0;
    result.is_manifold = result.non_manifold_edge_count == 0
        && result.boundary_edge_count == 0
        && !result.has_degenerate_faces;

    if result.has_degenerate_faces {
        result.issues.push(format!(
            "{} degenerate face(s) with near-zero area",
            result.degenerate_face_count
        ));
    }
    if result.boundary_edge_count > 0 {
        result.issues.push(format!(
            "{} boundary edge(s): surface is open",
            result.boundary_edge_count
        ));
        if !mesh.is_indexed() && !welded {
            result
                .issues
                .push("non-indexed mesh: corners are not shared until welded".to_owned());
        }
    }
    if result.non_manifold_edge_count > 0 {
        result.issues.push(format!(
            "{} non-manifold edge(s) shared by more than two faces",
            result.non_manifold_edge_count
        ));
    }

    debug!(
        triangles = result.triangle_count,
        edges = result.edge_count,
        boundary = result.boundary_edge_count,
        non_manifold = result.non_manifold_edge_count,
        degenerate = result.degenerate_face_count,
        "Analyzed mesh topology"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::unit_cube;

    #[allow(clippy::cast_possible_truncation)]
    fn cube_soup() -> MeshBuffers {
        let cube = unit_cube();
        let positions = cube
            .faces
            .iter()
            .flatten()
            .flat_map(|&v| {
                let p = cube.vertices[v as usize].position;
                [p.x as f32, p.y as f32, p.z as f32]
            })
            .collect();
        MeshBuffers::soup(positions)
    }

    #[test]
    fn degenerate_single_triangle() {
        let mesh = MeshBuffers::soup(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        let result = analyze(&mesh, None);

        assert!(!result.is_manifold);
        assert_eq!(result.degenerate_face_count, 1);
        assert!(result.has_degenerate_faces);
        assert_eq!(result.triangle_count, 1);
        assert_eq!(result.vertex_count, 3);
    }

    #[test]
    fn soup_cube_edges_are_boundary_until_welded() {
        let soup = cube_soup();

        let raw = analyze(&soup, None);
        assert_eq!(raw.boundary_edge_count, 36);
        assert!(!raw.is_manifold);

        let welded = analyze_with_options(&soup, &AnalyzeOptions::welded());
        assert_eq!(welded.boundary_edge_count, 0);
        assert_eq!(welded.edge_count, 18);
        assert!(welded.is_manifold);
    }

    #[test]
    fn open_surface_reports_boundary() {
        let mut cube = unit_cube();
        cube.faces.pop();
        let result = analyze(&MeshBuffers::from_indexed_mesh(&cube), None);

        assert_eq!(result.boundary_edge_count, 3);
        assert!(!result.is_watertight);
        assert!(result.issues.iter().any(|i| i.contains("boundary")));
    }

    #[test]
    fn non_manifold_fan() {
        let mesh = MeshBuffers::indexed(
            vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, -1.0, 0.0,
            ],
            vec![0, 1, 2, 0, 1, 3, 0, 1, 4],
        );
        let result = analyze(&mesh, None);
        assert_eq!(result.non_manifold_edge_count, 1);
        assert!(!result.is_manifold);
    }

    #[test]
    fn malformed_buffers_become_an_issue() {
        let mesh = MeshBuffers::indexed(vec![0.0; 9], vec![0, 1, 7]);
        let result = analyze(&mesh, None);
        assert!(!result.is_manifold);
        assert_eq!(result.triangle_count, 0);
        assert!(result.issues[0].starts_with("invalid buffers"));
    }

    #[test]
    fn epsilon_override() {
        // Cross length 1e-4, squared 1e-8.
        let mesh = MeshBuffers::soup(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1e-4, 0.0]);
        assert_eq!(analyze(&mesh, None).degenerate_face_count, 0);
        assert_eq!(analyze(&mesh, Some(1e-6)).degenerate_face_count, 1);
    }

    #[test]
    fn display_lists_issues() {
        let mesh = MeshBuffers::soup(vec![0.0; 9]);
        let text = analyze(&mesh, None).to_string();
        assert!(text.contains("Manifold: No"));
        assert!(text.contains("degenerate"));
    }
}
