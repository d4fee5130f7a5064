//! Edge usage counts.
//!
//! Classifies every undirected edge of a face list by how many triangles use
//! it: once (boundary), twice (interior) or more (non-manifold).

use hashbrown::HashMap;

/// Edge-to-face usage for a mesh.
///
/// Faces are given as vertex-id triplets. The ids can be raw vertex slots or
/// position groups from a [`VertexGraph`](crate::VertexGraph), which is how
/// the analyzer classifies edges of a welded triangle soup.
#[derive(Debug, Clone, Default)]
pub struct MeshAdjacency {
    /// Maps edge (v0, v1) to the number of faces using it. v0 <= v1.
    edge_uses: HashMap<(u32, u32), u32>,
    face_count: usize,
}

impl MeshAdjacency {
    /// Build edge usage from face triplets.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_repair::MeshAdjacency;
    ///
    /// let adj = MeshAdjacency::build([[0, 1, 2], [1, 3, 2]]);
    ///
    /// assert_eq!(adj.edge_count(), 5);
    /// assert_eq!(adj.boundary_edge_count(), 4);
    /// assert_eq!(adj.uses(2, 1), 2);
    /// ```
    #[must_use]
    pub fn build<I>(faces: I) -> Self
    where
        I: IntoIterator<Item = [u32; 3]>,
    {
        let faces = faces.into_iter();
        let mut edge_uses: HashMap<(u32, u32), u32> =
            HashMap::with_capacity(faces.size_hint().0 * 3 / 2);
        let mut face_count = 0;

        for [a, b, c] in faces {
            for edge in [normalize_edge(a, b), normalize_edge(b, c), normalize_edge(c, a)] {
                *edge_uses.entry(edge).or_insert(0) += 1;
            }
            face_count += 1;
        }

        Self {
            edge_uses,
            face_count,
        }
    }

    /// Number of faces using the edge between `v0` and `v1` (either direction).
    #[must_use]
    pub fn uses(&self, v0: u32, v1: u32) -> u32 {
        self.edge_uses
            .get(&normalize_edge(v0, v1))
            .copied()
            .unwrap_or(0)
    }

    /// Iterate over edges used by exactly one face.
    pub fn boundary_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edge_uses
            .iter()
            .filter(|&(_, &n)| n == 1)
            .map(|(&edge, _)| edge)
    }

    /// Count the edges used by exactly one face.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_uses.values().filter(|&&n| n == 1).count()
    }

    /// Count the edges used by more than two faces.
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_uses.values().filter(|&&n| n > 2).count()
    }

    /// Check that no edge is used by more than two faces.
    #[must_use]
    pub fn is_edge_manifold(&self) -> bool {
        self.edge_uses.values().all(|&n| n <= 2)
    }

    /// Check that every edge is used by at least two faces.
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.edge_uses.values().all(|&n| n >= 2)
    }

    /// Number of distinct undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_uses.len()
    }

    /// Number of faces the adjacency was built from.
    #[must_use]
    pub const fn face_count(&self) -> usize {
        self.face_count
    }
}

/// Normalize edge direction so v0 <= v1.
#[inline]
pub(crate) const fn normalize_edge(v0: u32, v1: u32) -> (u32, u32) {
    if v0 < v1 { (v0, v1) } else { (v1, v0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_triangle_is_all_boundary() {
        let adj = MeshAdjacency::build([[0, 1, 2]]);
        assert_eq!(adj.edge_count(), 3);
        assert_eq!(adj.boundary_edge_count(), 3);
        assert!(!adj.is_watertight());
        assert!(adj.is_edge_manifold());
    }

    #[test]
    fn shared_edge_is_interior() {
        let adj = MeshAdjacency::build([[0, 1, 2], [1, 3, 2]]);
        assert_eq!(adj.uses(1, 2), 2);
        assert_eq!(adj.uses(0, 1), 1);
        assert_eq!(adj.uses(0, 3), 0);
    }

    #[test]
    fn fan_edge_is_non_manifold() {
        // Three triangles sharing the same edge (0, 1)
        let adj = MeshAdjacency::build([[0, 1, 2], [0, 1, 3], [0, 1, 4]]);
        assert_eq!(adj.non_manifold_edge_count(), 1);
        assert!(!adj.is_edge_manifold());
        assert_eq!(adj.face_count(), 3);
    }

    #[test]
    fn tetrahedron_is_closed() {
        let adj = MeshAdjacency::build([[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]]);
        assert_eq!(adj.edge_count(), 6);
        assert!(adj.is_watertight());
        assert_eq!(adj.boundary_edges().count(), 0);
    }
}
