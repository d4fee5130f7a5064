//! Smoothing parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default vertex ceiling above which smoothing is skipped.
pub const DEFAULT_MAX_VERTICES: usize = 1_000_000;

/// Which relocation scheme to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SmoothMode {
    /// Every vertex moves freely in 3D.
    #[default]
    Surface,
    /// Bottom vertices stay put, everything else moves only horizontally,
    /// and neighbors across a vertical step are ignored.
    Heightmap,
    /// Chaikin corner cutting along the height-level contours of walls.
    Contour,
}

/// How neighbors are weighted in the centroid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NeighborWeighting {
    /// Every neighbor counts the same.
    #[default]
    Uniform,
    /// Cotangent weights from the original triangles.
    Cotangent,
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    #[default]
    Y,
    /// Z axis.
    Z,
}

impl Axis {
    /// Component index (`0`, `1` or `2`).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// The two axes perpendicular to this one, ascending.
    #[must_use]
    pub const fn horizontal(self) -> [usize; 2] {
        match self {
            Self::X => [1, 2],
            Self::Y => [0, 2],
            Self::Z => [0, 1],
        }
    }
}

/// Parameters for [`smooth`](crate::smooth).
///
/// # Example
///
/// ```
/// use mesh_smooth::{SmoothMode, SmoothParams};
///
/// let params = SmoothParams::heightmap()
///     .with_iterations(4)
///     .with_strength(0.25);
/// assert_eq!(params.mode, SmoothMode::Heightmap);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SmoothParams {
    /// Relocation iterations, or Chaikin rounds in contour mode (at most 8).
    ///
    /// Default: `3` (`2` for [`SmoothParams::contour`])
    pub iterations: u32,

    /// Blend between Taubin (`0.0`) and Laplacian (`1.0`).
    ///
    /// Default: `0.0`
    pub strength: f64,

    /// Neighbor weighting.
    ///
    /// Default: [`NeighborWeighting::Uniform`]
    pub weighting: NeighborWeighting,

    /// Relocation scheme.
    ///
    /// Default: [`SmoothMode::Surface`]
    pub mode: SmoothMode,

    /// Up axis for heightmap and contour modes.
    ///
    /// Default: [`Axis::Y`]
    pub height_axis: Axis,

    /// Decimal places used to group coincident soup corners.
    ///
    /// Default: `6`
    pub precision: u32,

    /// Meshes with more vertex slots than this are returned unchanged.
    ///
    /// Default: `1_000_000`
    pub max_vertices: usize,
}

impl Default for SmoothParams {
    fn default() -> Self {
        Self {
            iterations: 3,
            strength: 0.0,
            weighting: NeighborWeighting::Uniform,
            mode: SmoothMode::Surface,
            height_axis: Axis::Y,
            precision: mesh_repair::DEFAULT_PRECISION,
            max_vertices: DEFAULT_MAX_VERTICES,
        }
    }
}

impl SmoothParams {
    /// Volume-preserving Taubin smoothing.
    #[must_use]
    pub fn taubin(iterations: u32) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    /// Plain Laplacian smoothing. Stronger, but shrinks.
    #[must_use]
    pub fn laplacian(iterations: u32) -> Self {
        Self {
            iterations,
            strength: 1.0,
            ..Self::default()
        }
    }

    /// Stair-step removal for heightmap-derived meshes.
    #[must_use]
    pub fn heightmap() -> Self {
        Self {
            mode: SmoothMode::Heightmap,
            ..Self::default()
        }
    }

    /// Chaikin rounding of thin-wall contours.
    #[must_use]
    pub fn contour() -> Self {
        Self {
            iterations: 2,
            mode: SmoothMode::Contour,
            ..Self::default()
        }
    }

    /// Set the iteration count.
    #[must_use]
    pub const fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the Taubin/Laplacian blend.
    #[must_use]
    pub const fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    /// Set the neighbor weighting.
    #[must_use]
    pub const fn with_weighting(mut self, weighting: NeighborWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Set the up axis.
    #[must_use]
    pub const fn with_height_axis(mut self, axis: Axis) -> Self {
        self.height_axis = axis;
        self
    }

    /// Set the vertex ceiling.
    #[must_use]
    pub const fn with_max_vertices(mut self, limit: usize) -> Self {
        self.max_vertices = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = SmoothParams::default();
        assert_eq!(params.iterations, 3);
        assert!(params.strength.abs() < f64::EPSILON);
        assert_eq!(params.height_axis, Axis::Y);
        assert_eq!(params.max_vertices, 1_000_000);
    }

    #[test]
    fn presets() {
        assert!((SmoothParams::laplacian(2).strength - 1.0).abs() < f64::EPSILON);
        assert_eq!(SmoothParams::contour().mode, SmoothMode::Contour);
        assert_eq!(SmoothParams::contour().iterations, 2);
    }

    #[test]
    fn horizontal_axes() {
        assert_eq!(Axis::Y.horizontal(), [0, 2]);
        assert_eq!(Axis::Z.horizontal(), [0, 1]);
        assert_eq!(Axis::X.index(), 0);
    }
}
