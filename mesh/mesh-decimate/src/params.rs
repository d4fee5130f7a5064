//! Parameters for edge-collapse decimation and the fallback pipeline.

use std::f64::consts::FRAC_PI_6;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for [`decimate_mesh`](crate::decimate_mesh).
///
/// # Example
///
/// ```
/// use mesh_decimate::DecimateParams;
///
/// let params = DecimateParams::with_target_triangles(5_000)
///     .with_preserve_boundary(false);
/// assert_eq!(params.target_triangles, Some(5_000));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecimateParams {
    /// Target triangle count. Takes precedence over `target_ratio`.
    pub target_triangles: Option<usize>,

    /// Fraction of triangles to keep when no count is given.
    ///
    /// Default: `0.5`
    pub target_ratio: f64,

    /// Never collapse an edge on an open boundary, and never move a boundary
    /// vertex.
    ///
    /// Default: `true`
    pub preserve_boundary: bool,

    /// Never collapse an edge whose dihedral angle exceeds
    /// `sharp_angle_threshold`.
    ///
    /// Default: `false`
    pub preserve_sharp_features: bool,

    /// Dihedral angle in radians above which an edge is sharp.
    ///
    /// Default: 30 degrees
    pub sharp_angle_threshold: f64,

    /// Reject collapses whose quadric error exceeds this.
    pub max_error: Option<f64>,

    /// Cost multiplier for collapses touching the boundary when boundaries
    /// are not locked.
    ///
    /// Default: `10.0`
    pub boundary_penalty: f64,

    /// Reject collapses that turn a surviving face over.
    ///
    /// Default: `true`
    pub prevent_normal_flips: bool,
}

impl Default for DecimateParams {
    fn default() -> Self {
        Self {
            target_triangles: None,
            target_ratio: 0.5,
            preserve_boundary: true,
            preserve_sharp_features: false,
            sharp_angle_threshold: FRAC_PI_6,
            max_error: None,
            boundary_penalty: 10.0,
            prevent_normal_flips: true,
        }
    }
}

impl DecimateParams {
    /// Decimate to a triangle count.
    #[must_use]
    pub fn with_target_triangles(count: usize) -> Self {
        Self {
            target_triangles: Some(count),
            ..Default::default()
        }
    }

    /// Decimate to a fraction of the input, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_ratio: ratio.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Boundaries may move and no face-flip check. Used by the repairing
    /// fallback, whose input has already lost its original structure.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            target_ratio: 0.25,
            preserve_boundary: false,
            boundary_penalty: 1.0,
            prevent_normal_flips: false,
            ..Default::default()
        }
    }

    /// Keep boundaries and sharp edges.
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            target_ratio: 0.75,
            preserve_sharp_features: true,
            sharp_angle_threshold: 20f64.to_radians(),
            ..Default::default()
        }
    }

    /// Set the target triangle count.
    #[must_use]
    pub const fn with_target(mut self, count: usize) -> Self {
        self.target_triangles = Some(count);
        self
    }

    /// Set boundary preservation.
    #[must_use]
    pub const fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }

    /// Set sharp feature preservation.
    #[must_use]
    pub const fn with_preserve_sharp_features(mut self, preserve: bool) -> Self {
        self.preserve_sharp_features = preserve;
        self
    }

    /// Set the maximum collapse error.
    #[must_use]
    pub const fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = Some(max_error);
        self
    }
}

/// Parameters for the [`DecimationPipeline`](crate::DecimationPipeline).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineParams {
    /// Meshes above this many triangles get a coarse pass down to it first.
    ///
    /// Default: `500_000`
    pub coarse_threshold: usize,

    /// Relative error budget handed to the coarse simplifier.
    ///
    /// Default: `0.05`
    pub coarse_target_error: f32,

    /// Lower clamp on the per-stage keep ratio.
    ///
    /// Default: `0.01`
    pub min_ratio: f64,

    /// Upper clamp on the per-stage keep ratio.
    ///
    /// Default: `0.99`
    pub max_ratio: f64,

    /// Decimal places used to weld soup input.
    ///
    /// Default: `6`
    pub weld_precision: u32,

    /// Edge-collapse settings for the primary strategy.
    pub qem: DecimateParams,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            coarse_threshold: 500_000,
            coarse_target_error: 0.05,
            min_ratio: 0.01,
            max_ratio: 0.99,
            weld_precision: mesh_repair::DEFAULT_PRECISION,
            qem: DecimateParams::default(),
        }
    }
}

impl PipelineParams {
    /// Set the coarse pass threshold.
    #[must_use]
    pub const fn with_coarse_threshold(mut self, threshold: usize) -> Self {
        self.coarse_threshold = threshold;
        self
    }

    /// Triangle count a stage aims for when `current` must come down to
    /// `target`: `ceil(current * clamp(target / current))`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn stage_target(&self, current: usize, target: usize) -> usize {
        if current == 0 {
            return 0;
        }
        let ratio = (target as f64 / current as f64).clamp(self.min_ratio, self.max_ratio);
        ((current as f64 * ratio).ceil() as usize).max(1)
    }
}
