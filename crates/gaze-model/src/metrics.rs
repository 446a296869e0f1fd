//! Aggregate eye-metrics snapshot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An immutable snapshot of a session's accumulated gaze statistics.
///
/// Produced on demand by the event segmenter; reading it has no side
/// effects on the accumulating state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EyeMetrics {
    /// Cumulative gaze duration in milliseconds (sum of inter-sample
    /// time deltas).
    pub gaze_duration_ms: f64,

    /// Cumulative dwell time in milliseconds (time spent continuously
    /// within one AOI).
    pub dwell_time_ms: f64,

    /// Mean saccade length in pixels; 0 when no saccades were logged.
    pub mean_saccade_length_px: f64,

    /// Saccades whose destination fell outside every AOI.
    pub distractor_saccade_count: u32,

    /// Committed fixations.
    pub fixation_count: u32,

    /// Refixations normalized by fixation count; 0 when no fixations.
    pub refixation_ratio: f64,

    /// Total saccades logged.
    pub saccade_count: u32,

    /// Mean committed-fixation duration in milliseconds; 0 when none.
    pub mean_fixation_duration_ms: f64,

    /// Total session time in milliseconds (first to last sample).
    pub total_session_time_ms: f64,

    /// Per-AOI visit counts.
    pub visited_areas: HashMap<String, u32>,
}
