//! Flat-buffer mesh exchange format.

#![allow(clippy::cast_possible_truncation)] // f64 -> f32 at the exchange boundary; u32 slot indices

use crate::{BufferError, BufferResult, IndexedMesh, MeshTopology, Vertex, accumulate_vertex_normals};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mesh data as exchanged with the importer and viewer.
///
/// - `positions`: three `f32` per vertex slot
/// - `normals`: optional, three `f32` per vertex slot
/// - `indices`: optional, three `u32` per triangle
///
/// Without an index buffer the mesh is a triangle soup: slots `3t`, `3t+1`
/// and `3t+2` are the corners of triangle `t`.
///
/// Every pipeline operation takes a `&MeshBuffers` and returns a new one;
/// buffers are never modified in place.
///
/// # Example
///
/// ```
/// use mesh_types::{MeshBuffers, MeshTopology};
///
/// let quad = MeshBuffers::indexed(
///     vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
///     vec![0, 1, 2, 0, 2, 3],
/// );
///
/// assert!(quad.validate().is_ok());
/// assert_eq!(quad.face_count(), 2);
/// assert_eq!(quad.corners(1), [0, 2, 3]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshBuffers {
    /// Vertex positions, `[x0, y0, z0, x1, ...]`.
    pub positions: Vec<f32>,
    /// Vertex normals, same layout as `positions`.
    pub normals: Option<Vec<f32>>,
    /// Triangle indices, `[a0, b0, c0, a1, ...]`.
    pub indices: Option<Vec<u32>>,
}

impl MeshBuffers {
    /// Create a non-indexed triangle soup.
    #[must_use]
    pub const fn soup(positions: Vec<f32>) -> Self {
        Self {
            positions,
            normals: None,
            indices: None,
        }
    }

    /// Create an indexed mesh.
    #[must_use]
    pub const fn indexed(positions: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals: None,
            indices: Some(indices),
        }
    }

    /// Attach a normal buffer.
    #[must_use]
    pub fn with_normals(mut self, normals: Vec<f32>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Replace the normal buffer with freshly accumulated vertex normals.
    #[must_use]
    pub fn with_recomputed_normals(mut self) -> Self {
        self.normals = Some(accumulate_vertex_normals(&self));
        self
    }

    /// Whether triangles reference shared slots through an index buffer.
    #[inline]
    #[must_use]
    pub const fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Check the buffer invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`BufferError`] describing the first violated invariant:
    /// buffer lengths, index range, or non-finite coordinates.
    pub fn validate(&self) -> BufferResult<()> {
        if self.positions.len() % 3 != 0 {
            return Err(BufferError::PositionLength {
                len: self.positions.len(),
            });
        }
        let vertex_count = self.positions.len() / 3;

        if let Some(normals) = &self.normals {
            if normals.len() != self.positions.len() {
                return Err(BufferError::NormalLength {
                    normals: normals.len(),
                    positions: self.positions.len(),
                });
            }
        }

        match &self.indices {
            Some(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(BufferError::IndexLength { len: indices.len() });
                }
                if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(BufferError::IndexOutOfRange {
                        index,
                        vertex_count,
                    });
                }
            }
            None => {
                if vertex_count % 3 != 0 {
                    return Err(BufferError::SoupVertexCount {
                        vertices: vertex_count,
                    });
                }
            }
        }

        if let Some(slot) = self
            .positions
            .chunks_exact(3)
            .position(|p| p.iter().any(|c| !c.is_finite()))
        {
            return Err(BufferError::NonFinitePosition { slot });
        }

        Ok(())
    }

    /// Raw `f32` position of a slot.
    #[inline]
    #[must_use]
    pub fn position_f32(&self, slot: usize) -> [f32; 3] {
        let i = slot * 3;
        [self.positions[i], self.positions[i + 1], self.positions[i + 2]]
    }

    /// Build a new mesh containing only the faces for which `keep` is true.
    ///
    /// Face order is preserved. Indexed meshes stay indexed and drop slots no
    /// longer referenced (remaining slots keep their relative order); soups
    /// stay soups. Normals are recomputed. Faces without a flag are dropped.
    #[must_use]
    pub fn select_faces(&self, keep: &[bool]) -> Self {
        let keep = |face: usize| keep.get(face).copied().unwrap_or(false);

        let selected = match &self.indices {
            Some(indices) => {
                let mut remap = vec![u32::MAX; self.vertex_count()];
                let mut used = vec![false; self.vertex_count()];
                for (face, tri) in indices.chunks_exact(3).enumerate() {
                    if keep(face) {
                        for &slot in tri {
                            used[slot as usize] = true;
                        }
                    }
                }

                let mut positions = Vec::new();
                for (slot, _) in used.iter().enumerate().filter(|(_, u)| **u) {
                    remap[slot] = (positions.len() / 3) as u32;
                    positions.extend_from_slice(&self.position_f32(slot));
                }

                let new_indices = indices
                    .chunks_exact(3)
                    .enumerate()
                    .filter(|(face, _)| keep(*face))
                    .flat_map(|(_, tri)| tri.iter().map(|&slot| remap[slot as usize]))
                    .collect();

                Self::indexed(positions, new_indices)
            }
            None => {
                let positions = self
                    .positions
                    .chunks_exact(9)
                    .enumerate()
                    .filter(|(face, _)| keep(*face))
                    .flat_map(|(_, tri)| tri.iter().copied())
                    .collect();
                Self::soup(positions)
            }
        };

        selected.with_recomputed_normals()
    }

    /// Convert to an [`IndexedMesh`] without merging any slots.
    ///
    /// A soup becomes an indexed mesh where every corner owns its vertex;
    /// weld it before running edge-collapse algorithms.
    #[must_use]
    pub fn to_indexed_mesh(&self) -> IndexedMesh {
        let vertices = (0..self.vertex_count())
            .map(|slot| {
                let position = self.position(slot);
                match &self.normals {
                    Some(n) => {
                        let i = slot * 3;
                        let normal = Vector3::new(
                            f64::from(n[i]),
                            f64::from(n[i + 1]),
                            f64::from(n[i + 2]),
                        );
                        Vertex::with_normal(position, normal)
                    }
                    None => Vertex::new(position),
                }
            })
            .collect();

        let faces = (0..self.face_count()).map(|f| self.corners(f)).collect();
        IndexedMesh::from_parts(vertices, faces)
    }

    /// Convert an [`IndexedMesh`] to indexed exchange buffers.
    ///
    /// Normals are carried over only when every vertex has one.
    #[must_use]
    pub fn from_indexed_mesh(mesh: &IndexedMesh) -> Self {
        let positions = mesh
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
        let indices = mesh.faces.iter().flatten().copied().collect();

        let normals = mesh
            .vertices
            .iter()
            .map(|v| v.normal.map(|n| [n.x as f32, n.y as f32, n.z as f32]))
            .collect::<Option<Vec<_>>>()
            .map(|n| n.into_iter().flatten().collect());

        Self {
            positions,
            normals,
            indices: Some(indices),
        }
    }
}

impl MeshTopology for MeshBuffers {
    #[inline]
    fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    fn face_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 9,
        }
    }

    #[inline]
    fn corners(&self, face: usize) -> [u32; 3] {
        match &self.indices {
            Some(indices) => [indices[face * 3], indices[face * 3 + 1], indices[face * 3 + 2]],
            None => {
                let base = (face * 3) as u32;
                [base, base + 1, base + 2]
            }
        }
    }

    #[inline]
    fn position(&self, slot: usize) -> Point3<f64> {
        let [x, y, z] = self.position_f32(slot);
        Point3::new(f64::from(x), f64::from(y), f64::from(z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_cube;

    fn single_soup_triangle() -> MeshBuffers {
        MeshBuffers::soup(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
    }

    #[test]
    fn soup_counts() {
        let mesh = MeshBuffers::soup(vec![0.0; 18]);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.corners(1), [3, 4, 5]);
    }

    #[test]
    fn validate_rejects_bad_lengths() {
        let mesh = MeshBuffers::soup(vec![0.0; 10]);
        assert_eq!(mesh.validate(), Err(BufferError::PositionLength { len: 10 }));

        let mesh = MeshBuffers::soup(vec![0.0; 12]);
        assert_eq!(
            mesh.validate(),
            Err(BufferError::SoupVertexCount { vertices: 4 })
        );

        let mesh = single_soup_triangle().with_normals(vec![0.0; 3]);
        assert!(matches!(
            mesh.validate(),
            Err(BufferError::NormalLength { .. })
        ));
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let mesh = MeshBuffers::indexed(vec![0.0; 9], vec![0, 1, 3]);
        assert_eq!(
            mesh.validate(),
            Err(BufferError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn validate_rejects_nan() {
        let mut mesh = single_soup_triangle();
        mesh.positions[4] = f32::NAN;
        assert_eq!(
            mesh.validate(),
            Err(BufferError::NonFinitePosition { slot: 1 })
        );
    }

    #[test]
    fn select_faces_compacts_indexed() {
        let mesh = MeshBuffers::indexed(
            vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
                9.0, 9.0, 9.0, 8.0, 9.0, 9.0, 9.0, 8.0, 9.0,
            ],
            vec![0, 1, 2, 3, 4, 5],
        );
        let kept = mesh.select_faces(&[false, true]);
        assert_eq!(kept.vertex_count(), 3);
        assert_eq!(kept.indices, Some(vec![0, 1, 2]));
        assert_eq!(kept.position_f32(0), [9.0, 9.0, 9.0]);
        assert!(kept.normals.is_some());
    }

    #[test]
    fn select_faces_keeps_soup_order() {
        let mut positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        positions.extend([2.0, 0.0, 0.0, 3.0, 0.0, 0.0, 2.0, 1.0, 0.0]);
        positions.extend([4.0, 0.0, 0.0, 5.0, 0.0, 0.0, 4.0, 1.0, 0.0]);
        let mesh = MeshBuffers::soup(positions);

        let kept = mesh.select_faces(&[true, false, true]);
        assert!(!kept.is_indexed());
        assert_eq!(kept.face_count(), 2);
        assert_eq!(kept.position_f32(3), [4.0, 0.0, 0.0]);
    }

    #[test]
    fn indexed_mesh_round_trip_preserves_topology() {
        let cube = unit_cube();
        let buffers = MeshBuffers::from_indexed_mesh(&cube);
        assert_eq!(buffers.vertex_count(), 8);
        assert_eq!(buffers.face_count(), 12);
        assert!(buffers.normals.is_none());

        let back = buffers.to_indexed_mesh();
        assert_eq!(back.faces, cube.faces);
    }
}
