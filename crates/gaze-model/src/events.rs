//! Behavioral gaze events produced by segmentation.

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// A sustained gaze within a small spatial radius.
///
/// The anchor is the fixation's first sample and stays fixed while the
/// fixation is open; it never re-centers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fixation {
    /// The fixed anchor point in screen pixels.
    pub anchor: Point2D,

    /// Accumulated duration in milliseconds.
    pub duration_ms: f64,
}

/// A rapid, large gaze displacement between consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Saccade {
    /// Gaze position before the jump.
    pub start: Point2D,

    /// Gaze position after the jump.
    pub end: Point2D,

    /// Jump length in pixels.
    pub length_px: f64,

    /// Elapsed time between the two samples in milliseconds.
    pub duration_ms: f64,
}
