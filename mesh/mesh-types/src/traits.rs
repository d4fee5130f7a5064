//! Traits for mesh types.

use crate::{Aabb, Triangle};
use nalgebra::Point3;

/// Read access to triangle topology and vertex positions.
///
/// Implemented by both [`MeshBuffers`](crate::MeshBuffers) (indexed or soup)
/// and [`IndexedMesh`](crate::IndexedMesh). Whether corners share slots is a
/// property of the implementor, decided when it was built.
pub trait MeshTopology {
    /// Number of vertex slots.
    fn vertex_count(&self) -> usize;

    /// Number of triangles.
    fn face_count(&self) -> usize;

    /// Check if the mesh has no triangles or no vertices.
    fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.face_count() == 0
    }

    /// Vertex slots of the three corners of `face`, in winding order.
    ///
    /// # Panics
    ///
    /// Panics if `face >= self.face_count()`.
    fn corners(&self, face: usize) -> [u32; 3];

    /// Position of a vertex slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= self.vertex_count()`.
    fn position(&self, slot: usize) -> Point3<f64>;

    /// Resolve a face into a concrete triangle.
    fn triangle(&self, face: usize) -> Triangle {
        let [a, b, c] = self.corners(face);
        Triangle::new(
            self.position(a as usize),
            self.position(b as usize),
            self.position(c as usize),
        )
    }

    /// Iterate over all triangles with resolved vertex positions.
    fn triangles(&self) -> impl Iterator<Item = Triangle> + '_
    where
        Self: Sized,
    {
        (0..self.face_count()).map(move |face| self.triangle(face))
    }

    /// Bounding box over every vertex slot.
    fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for slot in 0..self.vertex_count() {
            aabb.expand_to_include(&self.position(slot));
        }
        aabb
    }
}
