//! Tracking session management.

use gazekit_analytics_engine::{GazeEventSegmenter, SegmenterConfig};
use gazekit_calibration_engine::{
    BackgroundTrainer, CalibrationSequencer, FeatureConfig, FeatureExtractor, FrameSkip,
    GazePredictor, IncrementalRegressionModel, MovingAverageWindow, PredictorConfig,
    RegressionConfig,
};
use gazekit_common::clock::SessionClock;
use gazekit_common::error::GazekitResult;
use gazekit_gaze_model::{
    EyeMetrics, FeatureVector, GazePoint, LandmarkFrame, Point2D, Rect, TargetPoint, TimestampNs,
};

/// Configuration for a tracking session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Viewport width in pixels, for mapping normalized targets and
    /// predictions to screen coordinates.
    pub viewport_width: u32,

    /// Viewport height in pixels.
    pub viewport_height: u32,

    /// Feature extraction settings.
    pub features: FeatureConfig,

    /// Regression and retraining settings.
    pub regression: RegressionConfig,

    /// Prediction cache and filter settings.
    pub predictor: PredictorConfig,

    /// Event segmentation thresholds.
    pub segmenter: SegmenterConfig,

    /// Moving-average window applied on top of predictions; values
    /// below 2 disable the stage.
    pub smoothing_window: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1920,
            viewport_height: 1080,
            features: FeatureConfig::default(),
            regression: RegressionConfig::default(),
            predictor: PredictorConfig::default(),
            segmenter: SegmenterConfig::default(),
            smoothing_window: 0,
        }
    }
}

/// State of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session created but no reference captured yet.
    Idle,
    /// Walking the calibration targets.
    Calibrating,
    /// Calibration finished; serving predictions.
    Tracking,
}

/// A tracking session owning one instance of every pipeline component.
pub struct TrackingSession {
    config: SessionConfig,
    state: SessionState,
    clock: SessionClock,
    extractor: FeatureExtractor,
    sequencer: CalibrationSequencer,
    model: IncrementalRegressionModel,
    trainer: BackgroundTrainer,
    predictor: GazePredictor,
    smoother: Option<MovingAverageWindow>,
    segmenter: GazeEventSegmenter,
}

impl TrackingSession {
    /// Create a session in the idle state.
    pub fn new(config: SessionConfig) -> Self {
        let model = IncrementalRegressionModel::new(config.regression.clone());
        let slot = model.slot();
        let trainer = BackgroundTrainer::new(model.slot());
        let predictor = GazePredictor::new(slot, config.predictor.clone());
        let smoother = (config.smoothing_window >= 2)
            .then(|| MovingAverageWindow::new(config.smoothing_window));
        let segmenter = GazeEventSegmenter::new(config.segmenter.clone());
        let extractor = FeatureExtractor::new(config.features.clone());

        Self {
            config,
            state: SessionState::Idle,
            clock: SessionClock::start(),
            extractor,
            sequencer: CalibrationSequencer::new(),
            model,
            trainer,
            predictor,
            smoother,
            segmenter,
        }
    }

    /// Create a session with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SessionConfig::default())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Start (or restart) the session from a reference frame.
    ///
    /// Clears all accumulated state, captures the reference head box,
    /// and enters calibration. An undetectable frame leaves the session
    /// idle; the caller retries with the next frame.
    pub fn start(&mut self, reference_frame: &LandmarkFrame) -> Result<(), FrameSkip> {
        self.reset();
        self.extractor.capture_reference(reference_frame)?;
        self.clock = SessionClock::start();
        self.state = SessionState::Calibrating;
        tracing::info!("Session started, calibrating");
        Ok(())
    }

    /// Return the session to idle and clear every component's state.
    pub fn reset(&mut self) {
        self.extractor.clear_reference();
        self.sequencer.reset();
        self.model.reset();
        self.predictor.reset();
        if let Some(smoother) = &mut self.smoother {
            smoother.reset();
        }
        self.segmenter.reset();
        self.state = SessionState::Idle;
    }

    /// The calibration target currently on screen, in pixels.
    pub fn current_calibration_point(&self) -> Point2D {
        self.sequencer
            .current_point(self.config.viewport_width, self.config.viewport_height)
    }

    /// Add a calibration sample for an explicit target.
    ///
    /// Schedules a background refit when the retrain policy says one is
    /// due. The one error is a feature-length mismatch.
    pub fn add_sample(&mut self, features: FeatureVector, target: TargetPoint) -> GazekitResult<()> {
        let sample = gazekit_gaze_model::CalibrationSample::new(features, target);
        if self.model.add(sample)? {
            self.trainer.request_refit(self.model.training_rows());
        }
        Ok(())
    }

    /// Extract features from a frame and add them against the current
    /// calibration target.
    ///
    /// Returns whether the frame contributed a sample; skipped frames
    /// (no detection, no reference) return `Ok(false)`.
    pub fn add_calibration_frame(&mut self, frame: &LandmarkFrame) -> GazekitResult<bool> {
        let features = match self.extractor.extract(frame) {
            Ok(features) => features,
            Err(skip) => {
                tracing::debug!(reason = %skip, "Calibration frame skipped");
                return Ok(false);
            }
        };
        self.add_sample(features, self.sequencer.current_target())?;
        Ok(true)
    }

    /// Lock in the current target's samples and move to the next target.
    ///
    /// Advancing past the last target completes calibration and enters
    /// tracking. Outside calibration this is a no-op.
    pub fn advance_calibration_point(&mut self) {
        if self.state != SessionState::Calibrating {
            return;
        }

        let was_finished = self.sequencer.is_finished();
        self.model.commit();
        self.trainer.request_refit(self.model.training_rows());

        if was_finished {
            self.state = SessionState::Tracking;
            tracing::info!(
                samples = self.model.sample_count(),
                "Calibration finished, tracking"
            );
        } else {
            self.sequencer.advance();
        }
    }

    /// Whether the sequencer sits at the last target.
    pub fn is_calibration_finished(&self) -> bool {
        self.sequencer.is_finished()
    }

    /// Whether a fitted model has been published.
    pub fn is_fitted(&self) -> bool {
        self.model.is_fitted()
    }

    /// Samples collected so far (committed plus staged).
    pub fn sample_count(&self) -> usize {
        self.model.sample_count()
    }

    /// Predict the gaze position in screen pixels for a feature vector.
    ///
    /// Absent until a fit has been published.
    pub fn predict(&mut self, features: &FeatureVector) -> GazekitResult<Option<Point2D>> {
        let Some((nx, ny)) = self.predictor.predict(features)? else {
            return Ok(None);
        };

        let mut x = nx * self.config.viewport_width as f64;
        let mut y = ny * self.config.viewport_height as f64;
        if let Some(smoother) = &mut self.smoother {
            (x, y) = smoother.push(x, y);
        }
        Ok(Some(Point2D::new(x, y)))
    }

    /// Run the full per-frame path: extract, predict, segment.
    ///
    /// Returns the predicted gaze point, absent when the frame was
    /// skipped or the model is not yet fitted. In both absent cases the
    /// caller keeps the last known gaze state.
    pub fn process_frame(
        &mut self,
        frame: &LandmarkFrame,
        timestamp_ns: TimestampNs,
    ) -> GazekitResult<Option<GazePoint>> {
        let features = match self.extractor.extract(frame) {
            Ok(features) => features,
            Err(skip) => {
                tracing::debug!(reason = %skip, "Frame skipped");
                return Ok(None);
            }
        };

        let Some(position) = self.predict(&features)? else {
            return Ok(None);
        };

        let point = GazePoint::new(timestamp_ns, position.x, position.y, frame.confidence);
        self.segmenter.observe(point);
        Ok(Some(point))
    }

    /// Register an area of interest with the segmenter.
    pub fn add_aoi(&mut self, id: impl Into<String>, rect: Rect) {
        self.segmenter.add_aoi(id, rect);
    }

    /// Remove every area of interest.
    pub fn clear_aois(&mut self) {
        self.segmenter.clear_aois();
    }

    /// Snapshot the accumulated eye metrics.
    pub fn metrics(&self) -> EyeMetrics {
        self.segmenter.metrics()
    }

    /// Clear accumulated metrics while keeping the fitted model and the
    /// AOI set.
    pub fn reset_metrics(&mut self) {
        self.segmenter.reset();
    }

    /// Monotonic timestamp for stamping the current frame.
    pub fn timestamp_now(&self) -> TimestampNs {
        self.clock.elapsed_ns()
    }

    /// Wait for an in-flight background refit to settle.
    ///
    /// Steady-state callers never need this; prediction reads whatever
    /// snapshot is currently published.
    pub async fn wait_for_refit(&mut self) {
        self.trainer.wait_idle().await;
    }
}
