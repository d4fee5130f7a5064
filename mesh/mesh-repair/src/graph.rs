//! Position-deduplicated vertex graph.
//!
//! A triangle soup stores every corner in its own slot, so the three copies of
//! a shared corner know nothing about each other. [`VertexGraph`] groups slots
//! whose positions agree after quantization and records which groups are
//! joined by a triangle edge. Smoothing and component cleanup work on these
//! groups and write results back to every member slot.
//!
//! Storage is an arena: group membership and adjacency are flat arrays with
//! offset tables, so a million-vertex soup needs a handful of allocations.

#![allow(clippy::cast_possible_truncation)] // u32 slot and group ids, i64 quantization keys

use hashbrown::HashMap;
use mesh_types::{MeshBuffers, MeshTopology};
use nalgebra::Point3;

/// Default quantization precision in decimal places.
pub const DEFAULT_PRECISION: u32 = 6;

/// Highest precision accepted; larger values are clamped so keys stay in
/// `i64` range for coordinates up to about one million units.
pub const MAX_PRECISION: u32 = 12;

/// Integer key of a quantized position.
pub(crate) type PositionKey = [i64; 3];

/// Quantize a position onto a grid with `scale` cells per unit.
#[inline]
pub(crate) fn quantize(p: &Point3<f64>, scale: f64) -> PositionKey {
    [
        (p.x * scale).round() as i64,
        (p.y * scale).round() as i64,
        (p.z * scale).round() as i64,
    ]
}

/// Grid scale for a precision in decimal places.
#[inline]
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn precision_scale(precision: u32) -> f64 {
    10f64.powi(precision.min(MAX_PRECISION) as i32)
}

/// Vertex groups and the edges between them.
///
/// Groups are numbered in order of their first slot, members of a group are
/// listed in ascending slot order, and every neighbor list is sorted,
/// free of duplicates and symmetric.
///
/// Indexed meshes already share corners through their index buffer, so each
/// slot forms its own group. Only triangle soups are grouped by position.
///
/// # Example
///
/// ```
/// use mesh_repair::VertexGraph;
/// use mesh_types::MeshBuffers;
///
/// // Two soup triangles sharing the edge (1,0,0)-(0,1,0).
/// let soup = MeshBuffers::soup(vec![
///     0.0, 0.0, 0.0,  1.0, 0.0, 0.0,  0.0, 1.0, 0.0,
///     1.0, 0.0, 0.0,  1.0, 1.0, 0.0,  0.0, 1.0, 0.0,
/// ]);
/// let graph = VertexGraph::build(&soup);
///
/// assert_eq!(graph.slot_count(), 6);
/// assert_eq!(graph.group_count(), 4);
/// assert_eq!(graph.members(graph.group_of(1)), &[1, 3]);
/// // (0,0,0) and (1,1,0) share no edge.
/// assert!(!graph.slot_neighbors(0).any(|s| s == 4));
/// ```
#[derive(Debug, Clone)]
pub struct VertexGraph {
    group_of: Vec<u32>,
    member_offsets: Vec<usize>,
    member_slots: Vec<u32>,
    neighbor_offsets: Vec<usize>,
    neighbor_groups: Vec<u32>,
}

impl VertexGraph {
    /// Build the graph at the default precision of six decimal places.
    #[must_use]
    pub fn build(mesh: &MeshBuffers) -> Self {
        Self::with_precision(mesh, DEFAULT_PRECISION)
    }

    /// Build the graph, grouping soup slots at `precision` decimal places.
    #[must_use]
    pub fn with_precision(mesh: &MeshBuffers, precision: u32) -> Self {
        let group_of = if mesh.is_indexed() {
            (0..mesh.vertex_count() as u32).collect()
        } else {
            group_by_position(mesh, precision_scale(precision))
        };
        Self::from_groups(mesh, group_of)
    }

    /// Build the graph over any topology from a precomputed slot-to-group map.
    ///
    /// Group ids must be dense, starting at zero.
    pub(crate) fn from_groups<M: MeshTopology>(mesh: &M, group_of: Vec<u32>) -> Self {
        let group_count = group_of.iter().map(|&g| g as usize + 1).max().unwrap_or(0);

        let (member_offsets, member_slots) = {
            let mut counts = vec![0usize; group_count + 1];
            for &g in &group_of {
                counts[g as usize + 1] += 1;
            }
            for i in 1..counts.len() {
                counts[i] += counts[i - 1];
            }
            let mut cursor = counts.clone();
            let mut slots = vec![0u32; group_of.len()];
            for (slot, &g) in group_of.iter().enumerate() {
                slots[cursor[g as usize]] = slot as u32;
                cursor[g as usize] += 1;
            }
            (counts, slots)
        };

        let mut edges: Vec<(u32, u32)> = Vec::with_capacity(mesh.face_count() * 6);
        for face in 0..mesh.face_count() {
            let [a, b, c] = mesh.corners(face).map(|s| group_of[s as usize]);
            for (u, v) in [(a, b), (b, c), (c, a)] {
                if u != v {
                    edges.push((u, v));
                    edges.push((v, u));
                }
            }
        }
        edges.sort_unstable();
        edges.dedup();

        let mut neighbor_offsets = vec![0usize; group_count + 1];
        for &(u, _) in &edges {
            neighbor_offsets[u as usize + 1] += 1;
        }
        for i in 1..neighbor_offsets.len() {
            neighbor_offsets[i] += neighbor_offsets[i - 1];
        }
        let neighbor_groups = edges.into_iter().map(|(_, v)| v).collect();

        Self {
            group_of,
            member_offsets,
            member_slots,
            neighbor_offsets,
            neighbor_groups,
        }
    }

    /// Number of vertex slots the graph was built from.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.group_of.len()
    }

    /// Number of distinct vertex groups.
    #[inline]
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.member_offsets.len() - 1
    }

    /// Group containing `slot`.
    #[inline]
    #[must_use]
    pub fn group_of(&self, slot: usize) -> usize {
        self.group_of[slot] as usize
    }

    /// Slots belonging to `group`, ascending.
    #[inline]
    #[must_use]
    pub fn members(&self, group: usize) -> &[u32] {
        &self.member_slots[self.member_offsets[group]..self.member_offsets[group + 1]]
    }

    /// Lowest slot of `group`, whose position stands for the whole group.
    #[inline]
    #[must_use]
    pub fn representative(&self, group: usize) -> usize {
        self.member_slots[self.member_offsets[group]] as usize
    }

    /// Groups sharing a triangle edge with `group`, sorted.
    #[inline]
    #[must_use]
    pub fn neighbors(&self, group: usize) -> &[u32] {
        &self.neighbor_groups[self.neighbor_offsets[group]..self.neighbor_offsets[group + 1]]
    }

    /// Slot-level neighbors of `slot`: every member of every neighboring
    /// group. All members of a group see the same neighbors.
    pub fn slot_neighbors(&self, slot: usize) -> impl Iterator<Item = u32> + '_ {
        self.neighbors(self.group_of(slot))
            .iter()
            .flat_map(move |&g| self.members(g as usize).iter().copied())
    }

    /// Expand to a per-slot adjacency list.
    ///
    /// This is the fully materialized form of [`VertexGraph::slot_neighbors`]
    /// and costs memory proportional to the squared group sizes; prefer the
    /// group view inside hot loops.
    #[must_use]
    pub fn slot_adjacency(&self) -> Vec<Vec<u32>> {
        (0..self.slot_count())
            .map(|slot| self.slot_neighbors(slot).collect())
            .collect()
    }

    /// Vertex groups with more than one member.
    pub fn shared_groups(&self) -> impl Iterator<Item = &[u32]> + '_ {
        (0..self.group_count())
            .map(|g| self.members(g))
            .filter(|m| m.len() > 1)
    }

    /// Corners of `face` mapped to group ids.
    #[inline]
    #[must_use]
    pub fn face_groups<M: MeshTopology>(&self, mesh: &M, face: usize) -> [u32; 3] {
        mesh.corners(face).map(|s| self.group_of[s as usize])
    }
}

/// Assign dense group ids to slots by quantized position, in slot order.
fn group_by_position<M: MeshTopology>(mesh: &M, scale: f64) -> Vec<u32> {
    let mut keys: HashMap<PositionKey, u32> = HashMap::with_capacity(mesh.vertex_count() / 4);
    (0..mesh.vertex_count())
        .map(|slot| {
            let next = keys.len() as u32;
            *keys.entry(quantize(&mesh.position(slot), scale)).or_insert(next)
        })
        .collect()
}
