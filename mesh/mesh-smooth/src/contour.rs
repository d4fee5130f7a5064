//! Contour smoothing of thin stair-stepped walls.
//!
//! Wall groups are found by growing outward from the floor, cut into
//! polylines per height level, and rounded with Chaikin corner cutting in
//! the horizontal plane. Each original vertex follows the first sub-point
//! generated from it, so the vertex count never changes.

// Mesh indices and counts don't overflow in practice
#![allow(clippy::cast_possible_truncation)]

use std::collections::BTreeMap;

use mesh_repair::VertexGraph;
use nalgebra::Point3;
use tracing::debug;

use crate::heightmap::HeightProfile;

/// Bound on wall propagation rounds.
const MAX_PROPAGATION_ROUNDS: usize = 100;

/// Bound on Chaikin rounds; each round doubles the polyline.
pub(crate) const MAX_CHAIKIN_ROUNDS: u32 = 8;

/// Weight of the near endpoint in each cut.
const CUT_NEAR: f64 = 7.0 / 8.0;

/// Weight of the far endpoint in each cut.
const CUT_FAR: f64 = 1.0 / 8.0;

/// A walk through one height level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Contour {
    pub groups: Vec<u32>,
    pub closed: bool,
}

/// Mark wall groups.
///
/// Seeds are floor groups with a higher neighbor. A group joins when it
/// touches a wall group and has a neighbor at a different level.
pub(crate) fn find_walls(
    graph: &VertexGraph,
    positions: &[Point3<f64>],
    profile: &HeightProfile,
) -> Vec<bool> {
    let axis = profile.axis;
    let tol = profile.tolerance;
    let height = |g: u32| positions[g as usize][axis];

    let mut wall: Vec<bool> = (0..positions.len())
        .map(|g| {
            let h = positions[g][axis];
            profile.near_bottom(h) && graph.neighbors(g).iter().any(|&n| height(n) - h > tol)
        })
        .collect();

    let vertical: Vec<bool> = (0..positions.len())
        .map(|g| {
            let h = positions[g][axis];
            graph.neighbors(g).iter().any(|&n| (height(n) - h).abs() > tol)
        })
        .collect();

    for round in 0..MAX_PROPAGATION_ROUNDS {
        let joined: Vec<usize> = (0..positions.len())
            .filter(|&g| !wall[g] && vertical[g])
            .filter(|&g| graph.neighbors(g).iter().any(|&n| wall[n as usize]))
            .collect();
        if joined.is_empty() {
            debug!(rounds = round, "Wall propagation converged");
            break;
        }
        for g in joined {
            wall[g] = true;
        }
    }
    wall
}

/// Split wall groups into polylines, one or more per height level.
///
/// Walks start at the smallest unvisited group and follow the smallest
/// unvisited neighbor on the same level, then extend backward from the
/// start.
pub(crate) fn extract_contours(
    graph: &VertexGraph,
    positions: &[Point3<f64>],
    profile: &HeightProfile,
    wall: &[bool],
) -> Vec<Contour> {
    let mut levels: BTreeMap<i64, Vec<u32>> = BTreeMap::new();
    for (g, _) in wall.iter().enumerate().filter(|(_, w)| **w) {
        levels
            .entry(profile.level(positions[g][profile.axis]))
            .or_default()
            .push(g as u32);
    }

    let mut level_of = vec![None; positions.len()];
    for (&level, groups) in &levels {
        for &g in groups {
            level_of[g as usize] = Some(level);
        }
    }

    let mut visited = vec![false; positions.len()];
    let mut contours = Vec::new();
    for (&level, groups) in &levels {
        let next_on_level = |from: u32, visited: &mut [bool]| {
            let next = graph
                .neighbors(from as usize)
                .iter()
                .copied()
                .find(|&n| !visited[n as usize] && level_of[n as usize] == Some(level));
            if let Some(n) = next {
                visited[n as usize] = true;
            }
            next
        };

        for &start in groups {
            if visited[start as usize] {
                continue;
            }
            visited[start as usize] = true;

            let mut forward = vec![start];
            let mut head = start;
            while let Some(n) = next_on_level(head, &mut visited) {
                forward.push(n);
                head = n;
            }
            let mut backward = Vec::new();
            let mut tail = start;
            while let Some(n) = next_on_level(tail, &mut visited) {
                backward.push(n);
                tail = n;
            }

            backward.reverse();
            backward.extend(forward);
            let path = backward;
            if path.len() < 3 {
                continue;
            }
            let closed = graph.neighbors(path[path.len() - 1] as usize).contains(&path[0]);
            contours.push(Contour { groups: path, closed });
        }
    }
    contours
}

/// Chaikin-smooth a polyline and return the new position of each input
/// point.
///
/// Open polylines keep their endpoints.
pub(crate) fn chaikin(points: &[[f64; 2]], closed: bool, rounds: u32) -> Vec<[f64; 2]> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let mut current = points.to_vec();
    let mut index: Vec<usize> = (0..n).collect();

    for _ in 0..rounds.min(MAX_CHAIKIN_ROUNDS) {
        let len = current.len();
        let mut next = Vec::with_capacity(2 * len);
        if closed {
            for i in 0..len {
                let (a, b) = (current[i], current[(i + 1) % len]);
                next.push(cut(a, b, CUT_NEAR));
                next.push(cut(a, b, CUT_FAR));
            }
            for k in &mut index {
                *k *= 2;
            }
        } else {
            next.push(current[0]);
            for i in 0..len - 1 {
                let (a, b) = (current[i], current[i + 1]);
                next.push(cut(a, b, CUT_NEAR));
                next.push(cut(a, b, CUT_FAR));
            }
            next.push(current[len - 1]);
            let last = next.len() - 1;
            for k in &mut index {
                *k = if *k == 0 {
                    0
                } else if *k == len - 1 {
                    last
                } else {
                    1 + 2 * *k
                };
            }
        }
        current = next;
    }

    index.into_iter().map(|k| current[k]).collect()
}

/// `near * a + (1 - near) * b`.
fn cut(a: [f64; 2], b: [f64; 2], near: f64) -> [f64; 2] {
    let far = 1.0 - near;
    [near * a[0] + far * b[0], near * a[1] + far * b[1]]
}

/// Smooth every contour and return the new group positions.
///
/// Only the horizontal coordinates change.
pub(crate) fn smooth_contours(
    positions: &[Point3<f64>],
    contours: &[Contour],
    horizontal: [usize; 2],
    rounds: u32,
) -> Vec<Point3<f64>> {
    let [u, v] = horizontal;
    let mut out = positions.to_vec();
    for contour in contours {
        let points: Vec<[f64; 2]> = contour
            .groups
            .iter()
            .map(|&g| {
                let p = positions[g as usize];
                [p[u], p[v]]
            })
            .collect();
        let smoothed = chaikin(&points, contour.closed, rounds);
        for (&g, q) in contour.groups.iter().zip(smoothed) {
            let p = &mut out[g as usize];
            p[u] = q[0];
            p[v] = q[1];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relocate::group_positions;
    use approx::assert_relative_eq;
    use mesh_types::MeshBuffers;

    /// Square tower of height 1 on a 4x4 floor, walls are vertical.
    ///
    /// Floor ring at y=0 and top ring at y=1 share x/z, the top is capped
    /// by a center vertex and the floor extends outward.
    fn tower() -> MeshBuffers {
        let ring = [(1.0, 1.0), (2.0, 1.0), (3.0, 1.0), (3.0, 2.0), (3.0, 3.0), (2.0, 3.0), (1.0, 3.0), (1.0, 2.0)];
        let outer = [(0.0, 0.0), (2.0, 0.0), (4.0, 0.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0), (0.0, 4.0), (0.0, 2.0)];
        let mut positions = Vec::new();
        // 0..8 floor ring, 8..16 top ring, 16..24 outer floor, 24 cap.
        for (x, z) in ring {
            positions.extend_from_slice(&[x, 0.0, z]);
        }
        for (x, z) in ring {
            positions.extend_from_slice(&[x, 1.0, z]);
        }
        for (x, z) in outer {
            positions.extend_from_slice(&[x, 0.0, z]);
        }
        positions.extend_from_slice(&[2.0, 1.0, 2.0]);

        let mut indices = Vec::new();
        for i in 0..8u32 {
            let j = (i + 1) % 8;
            // Wall quad.
            indices.extend_from_slice(&[i, j, 8 + i, j, 8 + j, 8 + i]);
            // Floor quad to the outer ring.
            indices.extend_from_slice(&[16 + i, 16 + j, i, 16 + j, j, i]);
            // Cap fan.
            indices.extend_from_slice(&[8 + i, 8 + j, 24]);
        }
        MeshBuffers::indexed(positions, indices)
    }

    #[test]
    fn walls_seed_and_propagate() {
        let mesh = tower();
        let graph = VertexGraph::build(&mesh);
        let positions = group_positions(&mesh, &graph);
        let profile = HeightProfile::new(&positions, 1);
        let wall = find_walls(&graph, &positions, &profile);

        assert!(wall[..16].iter().all(|w| *w));
        assert!(wall[16..].iter().all(|w| !*w));
    }

    #[test]
    fn extracts_one_closed_loop_per_level() {
        let mesh = tower();
        let graph = VertexGraph::build(&mesh);
        let positions = group_positions(&mesh, &graph);
        let profile = HeightProfile::new(&positions, 1);
        let wall = find_walls(&graph, &positions, &profile);
        let contours = extract_contours(&graph, &positions, &profile, &wall);

        assert_eq!(contours.len(), 2);
        for c in &contours {
            assert_eq!(c.groups.len(), 8);
            assert!(c.closed);
        }
        assert!(contours[0].groups.iter().all(|&g| g < 8));
    }

    #[test]
    fn chaikin_closed_maps_to_first_cut() {
        let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let out = chaikin(&square, true, 1);
        assert_eq!(out.len(), 4);
        assert_relative_eq!(out[0][0], 0.125);
        assert_relative_eq!(out[0][1], 0.0);
        assert_relative_eq!(out[1][0], 1.0);
        assert_relative_eq!(out[1][1], 0.125);
    }

    #[test]
    fn chaikin_open_keeps_endpoints() {
        let line = [[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]];
        let out = chaikin(&line, false, 3);
        assert_eq!(out[0], [0.0, 0.0]);
        assert_eq!(out[2], [2.0, 0.0]);
        assert!(out[1][1] < 1.0);
    }

    #[test]
    fn zero_rounds_is_identity() {
        let line = [[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]];
        assert_eq!(chaikin(&line, true, 0), line.to_vec());
    }

    #[test]
    fn smoothing_rounds_the_tower_corners() {
        let mesh = tower();
        let graph = VertexGraph::build(&mesh);
        let positions = group_positions(&mesh, &graph);
        let profile = HeightProfile::new(&positions, 1);
        let wall = find_walls(&graph, &positions, &profile);
        let contours = extract_contours(&graph, &positions, &profile, &wall);
        let out = smooth_contours(&positions, &contours, [0, 2], 2);

        for (a, b) in positions.iter().zip(&out) {
            assert_eq!(a.y.to_bits(), b.y.to_bits());
        }
        // Corner (1, 1) is pulled inward along its contour.
        assert!(out[0].x > 1.0 || out[0].z > 1.0);
        // Non-wall groups are untouched.
        assert_eq!(out[16..], positions[16..]);
    }

    #[test]
    fn contour_mode_applies_requested_rounds() {
        use crate::{SmoothParams, smooth};

        let mesh = tower();
        let once = smooth(&mesh, &SmoothParams::contour().with_iterations(1));
        let thrice = smooth(&mesh, &SmoothParams::contour().with_iterations(3));
        assert!(once.success() && thrice.success());
        assert_eq!(once.iterations, 1);
        assert_eq!(thrice.iterations, 3);
        assert_ne!(once.geometry.positions, thrice.geometry.positions);

        let capped = smooth(&mesh, &SmoothParams::contour().with_iterations(20));
        assert_eq!(capped.iterations, MAX_CHAIKIN_ROUNDS);
        assert_eq!(SmoothParams::contour().iterations, 2);
    }
}
