//! gazekit Calibration Engine
//!
//! Maps raw facial-landmark frames to on-screen gaze coordinates:
//! - **Features:** Head-compensated eye geometry encoding
//! - **Sequencer:** Fixed-order calibration target walk
//! - **Regression:** Incremental per-axis ordinary-least-squares fitting
//! - **Trainer:** Off-path background refitting with atomic publication
//! - **Predictor:** Cached, Kalman-filtered gaze prediction
//!
//! This crate is pure computation plus one background task — no camera,
//! no rendering, no persistence. All inputs are data; all outputs are data.

pub mod features;
pub mod predictor;
pub mod regression;
pub mod sequencer;
pub mod trainer;

pub use features::{FeatureConfig, FeatureExtractor, FrameSkip};
pub use predictor::{GazePredictor, MovingAverageWindow, PredictorConfig};
pub use regression::{
    FitSkip, IncrementalRegressionModel, ModelCoefficients, RegressionConfig, RetrainPolicy,
};
pub use sequencer::CalibrationSequencer;
pub use trainer::{BackgroundTrainer, CoefficientSlot};
