//! Cooperative progress reporting for long-running stages.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pipeline stage named in progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProgressStage {
    /// Topology analysis.
    Analyzing,
    /// Degenerate removal or component cleanup.
    Repairing,
    /// Simplification.
    Decimating,
    /// Vertex relocation smoothing.
    Smoothing,
    /// All requested stages finished.
    Complete,
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Analyzing => "analyzing",
            Self::Repairing => "repairing",
            Self::Decimating => "decimating",
            Self::Smoothing => "smoothing",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Progress callback: `(stage, percent in [0, 100], message)`.
pub type ProgressFn<'a> = dyn FnMut(ProgressStage, f32, &str) + 'a;

/// Forwards progress events to an optional callback.
///
/// Percentages are clamped to `[0, 100]` and never decrease while the stage
/// stays the same, so a host UI can render them directly.
///
/// # Example
///
/// ```
/// use mesh_types::{ProgressReporter, ProgressStage};
///
/// let mut seen = Vec::new();
/// {
///     let mut record = |_: ProgressStage, pct: f32, _: &str| seen.push(pct);
///     let mut progress = ProgressReporter::new(&mut record);
///     progress.report(ProgressStage::Decimating, 40.0, "primary pass");
///     progress.report(ProgressStage::Decimating, 10.0, "late message");
/// }
/// assert_eq!(seen, vec![40.0, 40.0]);
/// ```
pub struct ProgressReporter<'a> {
    callback: Option<&'a mut ProgressFn<'a>>,
    stage: Option<ProgressStage>,
    last_percent: f32,
}

impl<'a> ProgressReporter<'a> {
    /// Report to `callback`.
    pub fn new(callback: &'a mut ProgressFn<'a>) -> Self {
        Self {
            callback: Some(callback),
            stage: None,
            last_percent: 0.0,
        }
    }

    /// A reporter that drops every event.
    #[must_use]
    pub const fn silent() -> Self {
        Self {
            callback: None,
            stage: None,
            last_percent: 0.0,
        }
    }

    /// Emit an event.
    pub fn report(&mut self, stage: ProgressStage, percent: f32, message: &str) {
        let mut percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };

        if self.stage == Some(stage) {
            percent = percent.max(self.last_percent);
        } else {
            self.stage = Some(stage);
        }
        self.last_percent = percent;

        if let Some(callback) = self.callback.as_mut() {
            callback(stage, percent, message);
        }
    }
}

impl fmt::Debug for ProgressReporter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("attached", &self.callback.is_some())
            .field("stage", &self.stage)
            .field("last_percent", &self.last_percent)
            .finish()
    }
}

impl Default for ProgressReporter<'_> {
    fn default() -> Self {
        Self::silent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_resets_on_stage_change() {
        let mut events = Vec::new();
        {
            let mut record = |stage: ProgressStage, pct: f32, msg: &str| {
                events.push((stage, pct, msg.to_owned()));
            };
            let mut progress = ProgressReporter::new(&mut record);
            progress.report(ProgressStage::Repairing, 80.0, "a");
            progress.report(ProgressStage::Decimating, 5.0, "b");
            progress.report(ProgressStage::Decimating, 150.0, "c");
        }
        assert_eq!(events[1].1, 5.0);
        assert_eq!(events[2].1, 100.0);
        assert_eq!(events[2].2, "c");
    }

    #[test]
    fn silent_reporter_accepts_events() {
        let mut progress = ProgressReporter::silent();
        progress.report(ProgressStage::Complete, 100.0, "done");
    }

    #[test]
    fn stage_names() {
        assert_eq!(ProgressStage::Smoothing.to_string(), "smoothing");
    }
}
