//! Property-based tests for analysis, repair and cleanup.
//!
//! These tests use proptest to generate random meshes and verify invariants.
//!
//! Run with: cargo test -p mesh-repair -- proptest

use mesh_repair::{
    CleanupParams, VertexGraph, analyze, cleanup_csg, repair, weld_buffers, weld_vertices,
};
use mesh_types::{IndexedMesh, MeshBuffers, MeshTopology};
use proptest::prelude::*;

// =============================================================================
// Strategies for generating random meshes
// =============================================================================

/// Coordinates on a coarse grid so corners coincide often.
fn arb_grid_coord() -> impl Strategy<Value = f32> {
    (-4i32..=4).prop_map(|v| v as f32 * 0.5)
}

/// A triangle soup with `min..=max` triangles.
fn arb_soup(min: usize, max: usize) -> impl Strategy<Value = MeshBuffers> {
    prop::collection::vec(arb_grid_coord(), min * 9..=max * 9).prop_map(|mut positions| {
        positions.truncate(positions.len() / 9 * 9);
        MeshBuffers::soup(positions)
    })
}

/// An indexed mesh with valid indices.
fn arb_indexed(max_vertices: u32, max_faces: usize) -> impl Strategy<Value = MeshBuffers> {
    (3..=max_vertices).prop_flat_map(move |n| {
        (
            prop::collection::vec(arb_grid_coord(), n as usize * 3),
            prop::collection::vec(0..n, 3..=max_faces * 3),
        )
            .prop_map(|(positions, mut indices)| {
                indices.truncate(indices.len() / 3 * 3);
                MeshBuffers::indexed(positions, indices)
            })
    })
}

fn arb_mesh() -> impl Strategy<Value = MeshBuffers> {
    prop_oneof![arb_soup(1, 40), arb_indexed(30, 40)]
}

// =============================================================================
// Property Tests: Analysis
// =============================================================================

proptest! {
    /// A soup with T triangles has 3T vertex slots.
    #[test]
    fn soup_counts(mesh in arb_soup(0, 40)) {
        let result = analyze(&mesh, None);
        prop_assert_eq!(result.vertex_count, result.triangle_count * 3);
    }

    /// Manifold implies watertight and free of degenerate faces.
    #[test]
    fn manifold_verdict_is_consistent(mesh in arb_mesh()) {
        let result = analyze(&mesh, None);
        if result.is_manifold {
            prop_assert!(result.is_watertight);
            prop_assert_eq!(result.degenerate_face_count, 0);
            prop_assert_eq!(result.non_manifold_edge_count, 0);
        }
    }

    /// Analysis is deterministic.
    #[test]
    fn analysis_is_deterministic(mesh in arb_mesh()) {
        prop_assert_eq!(analyze(&mesh, None), analyze(&mesh, None));
    }
}

// =============================================================================
// Property Tests: Vertex graph
// =============================================================================

proptest! {
    /// Adjacency is symmetric and group members share neighbors.
    #[test]
    fn graph_is_symmetric(mesh in arb_mesh()) {
        let graph = VertexGraph::build(&mesh);
        prop_assert_eq!(graph.slot_count(), mesh.vertex_count());

        for g in 0..graph.group_count() {
            for &other in graph.neighbors(g) {
                prop_assert!(graph.neighbors(other as usize).contains(&(g as u32)));
            }
            for &slot in graph.members(g) {
                prop_assert_eq!(graph.group_of(slot as usize), g);
            }
        }
    }
}

// =============================================================================
// Property Tests: Repair
// =============================================================================

proptest! {
    /// Repairing twice gives the same mesh as repairing once.
    #[test]
    fn repair_is_idempotent(mesh in arb_mesh()) {
        let once = repair(&mesh);
        prop_assume!(once.success() && once.triangle_count > 0);
        let once = once.geometry.unwrap_or_default();

        let twice = repair(&once);
        prop_assert!(twice.success());
        prop_assert_eq!(twice.removed_triangles, 0);
        prop_assert_eq!(twice.geometry.unwrap_or_default(), once);
    }

    /// Repaired meshes carry no degenerate faces and keep their storage mode.
    #[test]
    fn repair_removes_all_degenerates(mesh in arb_mesh()) {
        let report = repair(&mesh);
        prop_assume!(report.success());
        let geometry = report.geometry.unwrap_or_default();

        prop_assert_eq!(geometry.is_indexed(), mesh.is_indexed());
        prop_assert!(!analyze(&geometry, None).has_degenerate_faces);
        prop_assert_eq!(
            report.triangle_count + report.removed_triangles,
            mesh.face_count()
        );
    }
}

// =============================================================================
// Property Tests: Cleanup
// =============================================================================

proptest! {
    /// Every component found is either removed or retained.
    #[test]
    fn cleanup_accounting(mesh in arb_mesh(), keep in 0usize..3, min_volume in 0.0f64..2.0) {
        let params = CleanupParams::default()
            .with_min_volume(min_volume)
            .with_keep_largest(keep);
        let report = cleanup_csg(&mesh, &params);

        prop_assert!(report.success());
        prop_assert_eq!(
            report.components_found,
            report.components_removed + report.retained.len()
        );
        prop_assert!(report.geometry.face_count() <= mesh.face_count());
        if report.components_found > 0 {
            prop_assert!(!report.retained.is_empty());
        }
    }
}

// =============================================================================
// Property Tests: Welding
// =============================================================================

proptest! {
    /// Welded soups reference valid vertices and never gain triangles.
    #[test]
    fn weld_buffers_produces_valid_indices(mesh in arb_soup(1, 40)) {
        let welded = weld_buffers(&mesh, 6);
        let n = welded.vertices.len() as u32;

        prop_assert!(welded.faces.len() <= mesh.face_count());
        prop_assert!(welded.faces.iter().flatten().all(|&v| v < n));
    }

    /// Tolerance welding never increases the vertex count.
    #[test]
    fn weld_never_increases_vertices(mesh in arb_indexed(30, 40)) {
        let mut welded: IndexedMesh = mesh.to_indexed_mesh();
        let before = welded.vertices.len();
        weld_vertices(&mut welded, 0.001);
        prop_assert!(welded.vertices.len() <= before);
    }
}
