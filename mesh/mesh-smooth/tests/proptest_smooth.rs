//! Property-based tests for smoothing.
//!
//! These tests use proptest to generate stair-stepped terrain and verify
//! that smoothing only ever moves vertices, and only the way each mode
//! allows.
//!
//! Run with: cargo test -p mesh-smooth -- proptest

use mesh_repair::VertexGraph;
use mesh_smooth::{NeighborWeighting, SmoothMode, SmoothParams, smooth};
use mesh_types::{MeshBuffers, MeshTopology};
use proptest::prelude::*;

// =============================================================================
// Strategies for generating terrain
// =============================================================================

/// Grid of `n x n` vertices on the XZ plane with integer step heights.
fn terrain(n: u32, heights: &[u8], jitter: &[f32]) -> MeshBuffers {
    let mut positions = Vec::with_capacity((n * n * 3) as usize);
    for j in 0..n {
        for i in 0..n {
            let k = (j * n + i) as usize;
            positions.extend_from_slice(&[
                i as f32 + jitter[2 * k],
                f32::from(heights[k]),
                j as f32 + jitter[2 * k + 1],
            ]);
        }
    }
    let mut indices = Vec::new();
    for j in 0..n - 1 {
        for i in 0..n - 1 {
            let a = j * n + i;
            let (b, c, d) = (a + 1, a + n, a + n + 1);
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }
    MeshBuffers::indexed(positions, indices)
}

fn to_soup(mesh: &MeshBuffers) -> MeshBuffers {
    let positions = (0..mesh.face_count())
        .flat_map(|f| mesh.corners(f))
        .flat_map(|s| mesh.position_f32(s as usize))
        .collect();
    MeshBuffers::soup(positions)
}

fn arb_terrain() -> impl Strategy<Value = MeshBuffers> {
    (3u32..=8).prop_flat_map(|n| {
        let count = (n * n) as usize;
        (
            prop::collection::vec(0u8..=3, count),
            prop::collection::vec(-0.2f32..0.2, count * 2),
            any::<bool>(),
        )
            .prop_map(move |(heights, jitter, soup)| {
                let mesh = terrain(n, &heights, &jitter);
                if soup { to_soup(&mesh) } else { mesh }
            })
    })
}

fn arb_params() -> impl Strategy<Value = SmoothParams> {
    (
        prop_oneof![
            Just(SmoothMode::Surface),
            Just(SmoothMode::Heightmap),
            Just(SmoothMode::Contour),
        ],
        prop_oneof![Just(NeighborWeighting::Uniform), Just(NeighborWeighting::Cotangent)],
        0u32..=3,
        0.0f64..=1.0,
    )
        .prop_map(|(mode, weighting, iterations, strength)| SmoothParams {
            mode,
            weighting,
            iterations,
            strength,
            ..SmoothParams::default()
        })
}

/// Slots whose group sits on the floor with only level neighbors.
fn bottom_slots(mesh: &MeshBuffers) -> Vec<usize> {
    let graph = VertexGraph::build(mesh);
    let height = |g: usize| mesh.position(graph.representative(g)).y;
    let (min, max) = (0..graph.group_count())
        .map(height)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), h| (lo.min(h), hi.max(h)));
    let range = max - min;
    let tol = (range * 1e-3).max(1e-9);

    (0..mesh.vertex_count())
        .filter(|&slot| {
            let g = graph.group_of(slot);
            let h = height(g);
            h - min <= 0.01 * range
                && graph
                    .neighbors(g)
                    .iter()
                    .all(|&n| (height(n as usize) - h).abs() <= tol)
        })
        .collect()
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Smoothing never changes topology.
    #[test]
    fn proptest_topology_is_preserved(mesh in arb_terrain(), params in arb_params()) {
        let report = smooth(&mesh, &params);
        prop_assert!(report.success());
        prop_assert_eq!(report.geometry.face_count(), mesh.face_count());
        prop_assert_eq!(report.geometry.positions.len(), mesh.positions.len());
        prop_assert_eq!(&report.geometry.indices, &mesh.indices);
        prop_assert!(report.geometry.positions.iter().all(|c| c.is_finite()));
    }

    /// Heightmap and contour modes never touch the height coordinate.
    #[test]
    fn proptest_heights_are_bit_identical(mesh in arb_terrain(), params in arb_params()) {
        prop_assume!(params.mode != SmoothMode::Surface);
        let report = smooth(&mesh, &params);
        for (a, b) in mesh.positions.chunks(3).zip(report.geometry.positions.chunks(3)) {
            prop_assert_eq!(a[1].to_bits(), b[1].to_bits());
        }
    }

    /// Floor vertices are frozen in heightmap mode.
    #[test]
    fn proptest_bottom_vertices_are_frozen(
        mesh in arb_terrain(),
        iterations in 1u32..=3,
        strength in 0.0f64..=1.0,
    ) {
        let params = SmoothParams::heightmap()
            .with_iterations(iterations)
            .with_strength(strength);
        let report = smooth(&mesh, &params);
        for slot in bottom_slots(&mesh) {
            let before = mesh.position_f32(slot).map(f32::to_bits);
            let after = report.geometry.position_f32(slot).map(f32::to_bits);
            prop_assert_eq!(before, after);
        }
    }

    /// Identical input gives identical output.
    #[test]
    fn proptest_smoothing_is_deterministic(mesh in arb_terrain(), params in arb_params()) {
        let a = smooth(&mesh, &params);
        let b = smooth(&mesh, &params);
        prop_assert_eq!(a.geometry, b.geometry);
        prop_assert_eq!(a.vertices_smoothed, b.vertices_smoothed);
    }

    /// Coincident soup corners stay coincident.
    #[test]
    fn proptest_soup_stays_watertight(mesh in arb_terrain(), params in arb_params()) {
        prop_assume!(!mesh.is_indexed());
        let report = smooth(&mesh, &params);
        let graph = VertexGraph::build(&mesh);
        for g in 0..graph.group_count() {
            let members = graph.members(g);
            let first = report.geometry.position_f32(members[0] as usize);
            for &m in &members[1..] {
                prop_assert_eq!(report.geometry.position_f32(m as usize), first);
            }
        }
    }
}
