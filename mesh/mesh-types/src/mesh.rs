//! Indexed triangle mesh.

use crate::{MeshTopology, Vertex};
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed (welded) triangle mesh in `f64`.
///
/// This is the working representation for edge-collapse simplifiers, which
/// need shared vertices to find collapsible edges. Convert from and to the
/// exchange format with [`MeshBuffers::to_indexed_mesh`] and
/// [`MeshBuffers::from_indexed_mesh`].
///
/// [`MeshBuffers::to_indexed_mesh`]: crate::MeshBuffers::to_indexed_mesh
/// [`MeshBuffers::from_indexed_mesh`]: crate::MeshBuffers::from_indexed_mesh
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex, MeshTopology};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array, CCW winding.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Create a mesh from vertices and faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Signed volume by the divergence theorem.
    ///
    /// Only meaningful for closed meshes; positive when faces wind outward.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        self.triangles().map(|t| t.signed_volume_term()).sum::<f64>() / 6.0
    }

    /// Absolute value of [`IndexedMesh::signed_volume`].
    #[inline]
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Total surface area.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|t| t.area()).sum()
    }
}

impl MeshTopology for IndexedMesh {
    #[inline]
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    fn corners(&self, face: usize) -> [u32; 3] {
        self.faces[face]
    }

    #[inline]
    fn position(&self, slot: usize) -> Point3<f64> {
        self.vertices[slot].position
    }
}

/// Create a unit cube mesh from (0,0,0) to (1,1,1) with outward winding.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, MeshTopology};
///
/// let cube = unit_cube();
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.face_count(), 12);
/// ```
#[must_use]
pub fn unit_cube() -> IndexedMesh {
    let corners = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    let vertices = corners
        .iter()
        .map(|c| Vertex::from_coords(c[0], c[1], c[2]))
        .collect();

    let faces = vec![
        [0, 2, 1],
        [0, 3, 2], // z = 0
        [4, 5, 6],
        [4, 6, 7], // z = 1
        [0, 1, 5],
        [0, 5, 4], // y = 0
        [3, 7, 6],
        [3, 6, 2], // y = 1
        [0, 4, 7],
        [0, 7, 3], // x = 0
        [1, 2, 6],
        [1, 6, 5], // x = 1
    ];

    IndexedMesh::from_parts(vertices, faces)
}
