//! Gaze-event segmentation.
//!
//! A per-session accumulator over a strictly time-ordered gaze stream.
//! Correctness of fixation and saccade detection depends on that
//! ordering; delivery must be sequenced upstream.
//!
//! # Event rules
//!
//! 1. **Fixation:** a sample within the spatial radius of the open
//!    fixation's anchor extends it; anything farther closes it. A closing
//!    fixation commits only if it lasted at least the minimum duration,
//!    and a new fixation opens at the new sample either way.
//! 2. **Saccade:** consecutive samples farther apart than the distance
//!    threshold within the rapid-movement window log a saccade.
//! 3. **Dwell:** consecutive samples inside the *same* AOI accumulate
//!    dwell time; any AOI change breaks the pair.
//! 4. **Refixation:** a sample inside an AOI bumps that AOI's visit
//!    counter; a bump past an already-positive counter is a refixation.

use std::collections::HashMap;

use gazekit_gaze_model::{AreaOfInterest, EyeMetrics, Fixation, GazePoint, Point2D, Rect, Saccade};

/// Thresholds for event classification.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Maximum distance from the fixation anchor that still extends the
    /// open fixation (pixels).
    pub fixation_radius_px: f64,

    /// Minimum accumulated duration for a closing fixation to commit
    /// (milliseconds).
    pub fixation_min_duration_ms: f64,

    /// Minimum displacement between consecutive samples to qualify as a
    /// saccade (pixels).
    pub saccade_min_distance_px: f64,

    /// Maximum elapsed time between consecutive samples for the jump to
    /// count as rapid movement (milliseconds).
    pub saccade_max_duration_ms: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            fixation_radius_px: 40.0,
            fixation_min_duration_ms: 100.0,
            saccade_min_distance_px: 150.0,
            saccade_max_duration_ms: 80.0,
        }
    }
}

/// The gaze-event segmenter and statistics accumulator.
pub struct GazeEventSegmenter {
    config: SegmenterConfig,
    aois: Vec<AreaOfInterest>,

    open_fixation: Option<Fixation>,
    fixation_count: u32,
    fixation_total_ms: f64,

    gaze_duration_ms: f64,
    dwell_time_ms: f64,

    saccades: Vec<Saccade>,
    saccade_total_length_px: f64,
    distractor_saccade_count: u32,

    refixation_count: u32,
    visited_areas: HashMap<String, u32>,

    first_timestamp_ns: Option<u64>,
    last_point: Option<GazePoint>,
}

impl GazeEventSegmenter {
    /// Create a segmenter with the given thresholds.
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            aois: Vec::new(),
            open_fixation: None,
            fixation_count: 0,
            fixation_total_ms: 0.0,
            gaze_duration_ms: 0.0,
            dwell_time_ms: 0.0,
            saccades: Vec::new(),
            saccade_total_length_px: 0.0,
            distractor_saccade_count: 0,
            refixation_count: 0,
            visited_areas: HashMap::new(),
            first_timestamp_ns: None,
            last_point: None,
        }
    }

    /// Create a segmenter with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(SegmenterConfig::default())
    }

    /// Register an area of interest. Statistics are unaffected.
    pub fn add_aoi(&mut self, id: impl Into<String>, rect: Rect) {
        self.aois.push(AreaOfInterest::new(id, rect));
    }

    /// Remove every area of interest. Statistics are unaffected.
    pub fn clear_aois(&mut self) {
        self.aois.clear();
    }

    /// The registered areas of interest.
    pub fn aois(&self) -> &[AreaOfInterest] {
        &self.aois
    }

    /// The AOI containing a point, if any. First registration wins when
    /// regions overlap.
    pub fn aoi_containing(&self, point: &Point2D) -> Option<&str> {
        self.aois
            .iter()
            .find(|aoi| aoi.rect.contains(point))
            .map(|aoi| aoi.id.as_str())
    }

    /// Saccades logged so far.
    pub fn saccades(&self) -> &[Saccade] {
        &self.saccades
    }

    /// Feed the next gaze point. Points must arrive in timestamp order.
    pub fn observe(&mut self, point: GazePoint) {
        let position = point.position();

        if let Some(last) = self.last_point {
            let elapsed_ms =
                point.timestamp_ns.saturating_sub(last.timestamp_ns) as f64 / 1_000_000.0;
            let last_position = last.position();
            let distance = last_position.distance_to(&position);

            self.gaze_duration_ms += elapsed_ms;
            self.detect_saccade(&last_position, &position, distance, elapsed_ms);
            self.accumulate_dwell(&last_position, &position, elapsed_ms);
            self.update_fixation(&position, distance_to_anchor(&self.open_fixation, &position), elapsed_ms);
        } else {
            self.first_timestamp_ns = Some(point.timestamp_ns);
            self.open_fixation = Some(Fixation {
                anchor: position,
                duration_ms: 0.0,
            });
        }

        self.track_visit(&position);
        self.last_point = Some(point);
    }

    fn detect_saccade(&mut self, start: &Point2D, end: &Point2D, distance: f64, elapsed_ms: f64) {
        if distance > self.config.saccade_min_distance_px
            && elapsed_ms < self.config.saccade_max_duration_ms
        {
            if self.aoi_containing(end).is_none() {
                self.distractor_saccade_count += 1;
            }
            self.saccade_total_length_px += distance;
            self.saccades.push(Saccade {
                start: *start,
                end: *end,
                length_px: distance,
                duration_ms: elapsed_ms,
            });
            tracing::debug!(length_px = distance, elapsed_ms, "Saccade logged");
        }
    }

    fn accumulate_dwell(&mut self, last: &Point2D, current: &Point2D, elapsed_ms: f64) {
        let last_aoi = self.aoi_containing(last);
        let current_aoi = self.aoi_containing(current);
        if let (Some(a), Some(b)) = (last_aoi, current_aoi) {
            if a == b {
                self.dwell_time_ms += elapsed_ms;
            }
        }
    }

    fn update_fixation(&mut self, position: &Point2D, anchor_distance: Option<f64>, elapsed_ms: f64) {
        match (&mut self.open_fixation, anchor_distance) {
            (Some(fixation), Some(distance)) if distance <= self.config.fixation_radius_px => {
                fixation.duration_ms += elapsed_ms;
            }
            (Some(fixation), _) => {
                if fixation.duration_ms >= self.config.fixation_min_duration_ms {
                    self.fixation_count += 1;
                    self.fixation_total_ms += fixation.duration_ms;
                    tracing::debug!(
                        duration_ms = fixation.duration_ms,
                        anchor_x = fixation.anchor.x,
                        anchor_y = fixation.anchor.y,
                        "Fixation committed"
                    );
                }
                self.open_fixation = Some(Fixation {
                    anchor: *position,
                    duration_ms: 0.0,
                });
            }
            (None, _) => {
                self.open_fixation = Some(Fixation {
                    anchor: *position,
                    duration_ms: 0.0,
                });
            }
        }
    }

    fn track_visit(&mut self, position: &Point2D) {
        let Some(aoi_id) = self.aoi_containing(position).map(str::to_owned) else {
            return;
        };
        let counter = self.visited_areas.entry(aoi_id).or_insert(0);
        if *counter > 0 {
            self.refixation_count += 1;
        }
        *counter += 1;
    }

    /// Snapshot the accumulated statistics. Pure read, no side effects.
    pub fn metrics(&self) -> EyeMetrics {
        let saccade_count = self.saccades.len() as u32;
        let mean_saccade_length_px = if saccade_count > 0 {
            self.saccade_total_length_px / saccade_count as f64
        } else {
            0.0
        };
        let refixation_ratio = if self.fixation_count > 0 {
            self.refixation_count as f64 / self.fixation_count as f64
        } else {
            0.0
        };
        let mean_fixation_duration_ms = if self.fixation_count > 0 {
            self.fixation_total_ms / self.fixation_count as f64
        } else {
            0.0
        };
        let total_session_time_ms = match (self.first_timestamp_ns, &self.last_point) {
            (Some(first), Some(last)) => {
                last.timestamp_ns.saturating_sub(first) as f64 / 1_000_000.0
            }
            _ => 0.0,
        };

        EyeMetrics {
            gaze_duration_ms: self.gaze_duration_ms,
            dwell_time_ms: self.dwell_time_ms,
            mean_saccade_length_px,
            distractor_saccade_count: self.distractor_saccade_count,
            fixation_count: self.fixation_count,
            refixation_ratio,
            saccade_count,
            mean_fixation_duration_ms,
            total_session_time_ms,
            visited_areas: self.visited_areas.clone(),
        }
    }

    /// Clear all accumulated statistics. The AOI set is untouched.
    pub fn reset(&mut self) {
        self.open_fixation = None;
        self.fixation_count = 0;
        self.fixation_total_ms = 0.0;
        self.gaze_duration_ms = 0.0;
        self.dwell_time_ms = 0.0;
        self.saccades.clear();
        self.saccade_total_length_px = 0.0;
        self.distractor_saccade_count = 0;
        self.refixation_count = 0;
        self.visited_areas.clear();
        self.first_timestamp_ns = None;
        self.last_point = None;
    }
}

fn distance_to_anchor(fixation: &Option<Fixation>, position: &Point2D) -> Option<f64> {
    fixation
        .as_ref()
        .map(|fixation| fixation.anchor.distance_to(position))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    fn point(t_ms: u64, x: f64, y: f64) -> GazePoint {
        GazePoint::new(t_ms * MS, x, y, 1.0)
    }

    #[test]
    fn test_single_fixation_commits_on_jump() {
        let mut segmenter = GazeEventSegmenter::with_defaults();

        // 20 samples jittering within the radius of (100, 100) over 150ms
        for i in 0..20u64 {
            let t = i * 150 / 19;
            let dx = (i % 3) as f64 * 5.0;
            let dy = (i % 2) as f64 * 5.0;
            segmenter.observe(point(t, 100.0 + dx, 100.0 + dy));
        }
        // Then a jump far away
        segmenter.observe(point(158, 500.0, 500.0));

        let metrics = segmenter.metrics();
        assert_eq!(metrics.fixation_count, 1);
        assert!((metrics.mean_fixation_duration_ms - 150.0).abs() < 1.0);
    }

    #[test]
    fn test_short_fixation_is_discarded() {
        let mut segmenter = GazeEventSegmenter::with_defaults();

        // Only 40ms inside the radius: below the minimum duration
        segmenter.observe(point(0, 100.0, 100.0));
        segmenter.observe(point(40, 110.0, 100.0));
        segmenter.observe(point(48, 500.0, 500.0));

        assert_eq!(segmenter.metrics().fixation_count, 0);
    }

    #[test]
    fn test_fixation_anchor_stays_fixed() {
        let mut segmenter = GazeEventSegmenter::new(SegmenterConfig {
            fixation_radius_px: 40.0,
            ..Default::default()
        });

        // Slow drift: every sample stays within 30px of its predecessor,
        // but the anchor is the first sample, so the fixation breaks as
        // soon as the cumulative drift passes the radius.
        segmenter.observe(point(0, 100.0, 100.0));
        segmenter.observe(point(60, 120.0, 100.0)); // 20px from anchor
        segmenter.observe(point(120, 130.0, 100.0)); // 30px from anchor
        segmenter.observe(point(180, 150.0, 100.0)); // 50px from anchor: breaks

        // The broken fixation lasted 120ms and commits
        assert_eq!(segmenter.metrics().fixation_count, 1);
    }

    #[test]
    fn test_saccade_detection_and_distractor() {
        let mut segmenter = GazeEventSegmenter::with_defaults();
        segmenter.add_aoi("A", Rect::new(0.0, 0.0, 150.0, 150.0));

        segmenter.observe(point(0, 100.0, 100.0));
        // 300px jump within 50ms, destination outside the AOI
        segmenter.observe(point(40, 400.0, 100.0));

        let metrics = segmenter.metrics();
        assert_eq!(metrics.saccade_count, 1);
        assert_eq!(metrics.distractor_saccade_count, 1);
        assert!((metrics.mean_saccade_length_px - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_saccade_into_aoi_is_not_distractor() {
        let mut segmenter = GazeEventSegmenter::with_defaults();
        segmenter.add_aoi("target", Rect::new(350.0, 50.0, 100.0, 100.0));

        segmenter.observe(point(0, 100.0, 100.0));
        segmenter.observe(point(40, 400.0, 100.0));

        let metrics = segmenter.metrics();
        assert_eq!(metrics.saccade_count, 1);
        assert_eq!(metrics.distractor_saccade_count, 0);
    }

    #[test]
    fn test_slow_displacement_is_not_a_saccade() {
        let mut segmenter = GazeEventSegmenter::with_defaults();

        segmenter.observe(point(0, 100.0, 100.0));
        // Same 300px displacement, but over 200ms
        segmenter.observe(point(200, 400.0, 100.0));

        assert_eq!(segmenter.metrics().saccade_count, 0);
    }

    #[test]
    fn test_dwell_accumulates_within_same_aoi() {
        let mut segmenter = GazeEventSegmenter::with_defaults();
        segmenter.add_aoi("panel", Rect::new(0.0, 0.0, 200.0, 200.0));

        segmenter.observe(point(0, 50.0, 50.0));
        segmenter.observe(point(30, 60.0, 55.0));
        segmenter.observe(point(60, 70.0, 60.0));
        // Leaves the AOI: pair no longer counts
        segmenter.observe(point(90, 500.0, 500.0));
        // Returns: the re-entry pair (outside -> inside) does not count either
        segmenter.observe(point(120, 50.0, 50.0));
        segmenter.observe(point(150, 55.0, 55.0));

        let metrics = segmenter.metrics();
        assert!((metrics.dwell_time_ms - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_visits_and_refixations() {
        let mut segmenter = GazeEventSegmenter::with_defaults();
        segmenter.add_aoi("A", Rect::new(0.0, 0.0, 100.0, 100.0));

        // Three visits to A interleaved with samples elsewhere
        segmenter.observe(point(0, 50.0, 50.0));
        segmenter.observe(point(100, 500.0, 500.0));
        segmenter.observe(point(200, 60.0, 60.0));
        segmenter.observe(point(300, 500.0, 500.0));
        segmenter.observe(point(400, 40.0, 40.0));

        let metrics = segmenter.metrics();
        assert_eq!(metrics.visited_areas.get("A"), Some(&3));
        // Second and third visits are refixations
        assert_eq!(segmenter.refixation_count, 2);
    }

    #[test]
    fn test_refixation_ratio_is_fixation_normalized() {
        let mut segmenter = GazeEventSegmenter::with_defaults();
        segmenter.add_aoi("A", Rect::new(0.0, 0.0, 200.0, 200.0));

        // One committed fixation inside A (150ms within radius)...
        for i in 0..10u64 {
            segmenter.observe(point(i * 15, 100.0 + (i % 2) as f64, 100.0));
        }
        // ...then bounce out and back in twice
        segmenter.observe(point(160, 600.0, 600.0));
        segmenter.observe(point(260, 100.0, 100.0));

        let metrics = segmenter.metrics();
        assert_eq!(metrics.fixation_count, 1);
        // 10 samples in A then 1 more: 9 refixations within the run plus
        // one from the return
        assert_eq!(metrics.visited_areas.get("A"), Some(&11));
        assert!((metrics.refixation_ratio - 10.0 / 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_gaze_duration_sums_deltas() {
        let mut segmenter = GazeEventSegmenter::with_defaults();
        segmenter.observe(point(0, 10.0, 10.0));
        segmenter.observe(point(33, 11.0, 10.0));
        segmenter.observe(point(66, 12.0, 10.0));

        let metrics = segmenter.metrics();
        assert!((metrics.gaze_duration_ms - 66.0).abs() < 1e-9);
        assert!((metrics.total_session_time_ms - 66.0).abs() < 1e-9);
    }

    #[test]
    fn test_metrics_read_has_no_side_effects() {
        let mut segmenter = GazeEventSegmenter::with_defaults();
        segmenter.observe(point(0, 10.0, 10.0));
        segmenter.observe(point(33, 300.0, 10.0));

        let first = segmenter.metrics();
        let second = segmenter.metrics();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reset_clears_stats_but_keeps_aois() {
        let mut segmenter = GazeEventSegmenter::with_defaults();
        segmenter.add_aoi("A", Rect::new(0.0, 0.0, 100.0, 100.0));
        segmenter.observe(point(0, 50.0, 50.0));
        segmenter.observe(point(100, 60.0, 60.0));

        segmenter.reset();

        let metrics = segmenter.metrics();
        assert_eq!(metrics.gaze_duration_ms, 0.0);
        assert_eq!(metrics.fixation_count, 0);
        assert!(metrics.visited_areas.is_empty());
        assert_eq!(segmenter.aois().len(), 1);
    }

    #[test]
    fn test_clear_aois_keeps_stats() {
        let mut segmenter = GazeEventSegmenter::with_defaults();
        segmenter.add_aoi("A", Rect::new(0.0, 0.0, 100.0, 100.0));
        segmenter.observe(point(0, 50.0, 50.0));
        segmenter.observe(point(100, 60.0, 60.0));
        let before = segmenter.metrics();

        segmenter.clear_aois();

        assert!(segmenter.aois().is_empty());
        assert_eq!(segmenter.metrics().gaze_duration_ms, before.gaze_duration_ms);
    }

    #[test]
    fn test_mean_saccade_length_zero_without_saccades() {
        let mut segmenter = GazeEventSegmenter::with_defaults();
        segmenter.observe(point(0, 10.0, 10.0));
        segmenter.observe(point(100, 12.0, 10.0));

        assert_eq!(segmenter.metrics().mean_saccade_length_px, 0.0);
    }

    use proptest::prelude::*;

    proptest! {
        /// Any time-ordered stream yields finite, consistent metrics.
        #[test]
        fn prop_metrics_stay_consistent(
            deltas in proptest::collection::vec(1u64..100, 1..60),
            coords in proptest::collection::vec((0.0f64..1920.0, 0.0f64..1080.0), 60),
        ) {
            let mut segmenter = GazeEventSegmenter::with_defaults();
            segmenter.add_aoi("A", Rect::new(0.0, 0.0, 600.0, 600.0));

            let mut t_ms = 1u64;
            let mut expected_duration = 0.0;
            let mut first = true;
            for (delta, (x, y)) in deltas.iter().zip(coords.iter()) {
                if !first {
                    t_ms += delta;
                    expected_duration += *delta as f64;
                }
                first = false;
                segmenter.observe(point(t_ms, *x, *y));
            }

            let metrics = segmenter.metrics();
            prop_assert!((metrics.gaze_duration_ms - expected_duration).abs() < 1e-6);
            prop_assert!(metrics.mean_saccade_length_px.is_finite());
            prop_assert!(metrics.refixation_ratio >= 0.0);
            prop_assert!(metrics.dwell_time_ms <= metrics.gaze_duration_ms + 1e-6);
            prop_assert!(metrics.total_session_time_ms <= metrics.gaze_duration_ms + 1e-6);
        }
    }
}
