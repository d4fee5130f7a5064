//! Quadric error metric implementation.
//!
//! The quadric error metric (QEM) measures the summed squared distance from a
//! point to a set of planes. It picks the position of a merged vertex during
//! edge collapse and prices the collapse.

use std::ops::{Add, AddAssign};

use nalgebra::{Matrix3, Point3, Vector3};

/// Symmetric 4x4 quadric stored as its upper triangle.
///
/// ```text
/// [a b c d]
/// [  e f g]
/// [    h i]
/// [      j]
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quadric([f64; 10]);

impl Quadric {
    /// Quadric of the plane `n·p + d = 0`, with `n` of unit length.
    #[must_use]
    pub fn from_plane(n: &Vector3<f64>, d: f64) -> Self {
        let (a, b, c) = (n.x, n.y, n.z);
        Self([
            a * a,
            a * b,
            a * c,
            a * d,
            b * b,
            b * c,
            b * d,
            c * c,
            c * d,
            d * d,
        ])
    }

    /// Quadric of the plane through a triangle, weighted by its area.
    ///
    /// Returns `None` for zero-area triangles.
    #[must_use]
    pub fn from_triangle(v0: &Point3<f64>, v1: &Point3<f64>, v2: &Point3<f64>) -> Option<Self> {
        let cross = (v1 - v0).cross(&(v2 - v0));
        let len = cross.norm();
        if len < 1e-20 {
            return None;
        }
        let n = cross / len;
        let d = -n.dot(&v0.coords);
        Some(Self::from_plane(&n, d).scaled(len * 0.5))
    }

    /// Multiply every coefficient by `w`.
    #[must_use]
    pub fn scaled(self, w: f64) -> Self {
        Self(self.0.map(|c| c * w))
    }

    /// `vᵀ Q v` with `v = [x, y, z, 1]`.
    #[must_use]
    pub fn evaluate(&self, p: &Point3<f64>) -> f64 {
        let [a, b, c, d, e, f, g, h, i, j] = self.0;
        let (x, y, z) = (p.x, p.y, p.z);
        x * (a * x + 2.0 * (b * y + c * z + d))
            + y * (e * y + 2.0 * (f * z + g))
            + z * (h * z + 2.0 * i)
            + j
    }

    /// Point minimizing the error, if the 3x3 system is well conditioned.
    #[must_use]
    pub fn optimal_point(&self) -> Option<Point3<f64>> {
        let [a, b, c, d, e, f, g, h, i, _] = self.0;
        let m = Matrix3::new(a, b, c, b, e, f, c, f, h);
        if m.determinant().abs() < 1e-10 {
            return None;
        }
        let inv = m.try_inverse()?;
        let p = inv * Vector3::new(-d, -g, -i);
        p.iter().all(|v| v.is_finite()).then(|| Point3::from(p))
    }
}

impl AddAssign for Quadric {
    fn add_assign(&mut self, rhs: Self) {
        for (l, r) in self.0.iter_mut().zip(rhs.0) {
            *l += r;
        }
    }
}

impl Add for Quadric {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_quadric_has_zero_error() {
        let q = Quadric::default();
        assert_relative_eq!(q.evaluate(&Point3::new(1.0, 2.0, 3.0)), 0.0);
    }

    #[test]
    fn plane_error_is_squared_distance() {
        let q = Quadric::from_plane(&Vector3::z(), 0.0);
        assert_relative_eq!(q.evaluate(&Point3::new(1.0, 2.0, 0.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.evaluate(&Point3::new(0.0, 0.0, 3.0)), 9.0, epsilon = 1e-12);
    }

    #[test]
    fn three_planes_meet_at_corner() {
        let q = Quadric::from_plane(&Vector3::x(), -1.0)
            + Quadric::from_plane(&Vector3::y(), -2.0)
            + Quadric::from_plane(&Vector3::z(), -3.0);

        let p = q.optimal_point().unwrap();
        assert_relative_eq!(p, Point3::new(1.0, 2.0, 3.0), epsilon = 1e-9);
        assert_relative_eq!(q.evaluate(&p), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn single_plane_is_singular() {
        let q = Quadric::from_plane(&Vector3::z(), 0.0);
        assert!(q.optimal_point().is_none());
    }

    #[test]
    fn triangle_quadric_weighted_by_area() {
        let q = Quadric::from_triangle(
            &Point3::origin(),
            &Point3::new(2.0, 0.0, 0.0),
            &Point3::new(0.0, 2.0, 0.0),
        )
        .unwrap();
        // Area 2, one unit above the plane.
        assert_relative_eq!(q.evaluate(&Point3::new(5.0, 5.0, 1.0)), 2.0, epsilon = 1e-12);

        assert!(
            Quadric::from_triangle(&Point3::origin(), &Point3::origin(), &Point3::new(1.0, 0.0, 0.0))
                .is_none()
        );
    }
}
