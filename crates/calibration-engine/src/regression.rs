//! Incremental per-axis ordinary-least-squares regression.
//!
//! The model keeps two sample collections: a permanent **committed** set
//! and a bounded **staging** ring buffer of provisional samples for the
//! calibration target currently on screen. Fits run over the union. Both
//! screen axes are independent least-squares problems over the same
//! design matrix; they are solved from one factorization and published
//! together, so consumers never observe a half-updated coefficient pair.

use std::collections::VecDeque;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use gazekit_common::{GazekitError, GazekitResult};
use gazekit_gaze_model::{CalibrationSample, FeatureVector};

use crate::trainer::CoefficientSlot;

/// Fit-skip conditions. Neither mutates previously fitted coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FitSkip {
    /// Fewer rows than design-matrix columns; the system would be
    /// underdetermined.
    #[error("not enough samples to fit (rows must exceed feature length + 1)")]
    InsufficientData,

    /// The design matrix is numerically singular or ill-conditioned.
    #[error("design matrix is singular or ill-conditioned")]
    SingularDesignMatrix,
}

/// When to refit after new samples arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrainPolicy {
    /// Refit on every added sample. Lowest latency, highest cost.
    Always,

    /// Refit once `batch_size` new samples accumulate, or when the
    /// staging buffer fills. Recommended.
    Batched { batch_size: usize },
}

/// Configuration for the incremental model.
#[derive(Debug, Clone)]
pub struct RegressionConfig {
    /// Staging ring-buffer capacity, independent of the committed set.
    pub staging_capacity: usize,

    /// Retraining policy applied on `add`.
    pub retrain: RetrainPolicy,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            staging_capacity: 32,
            retrain: RetrainPolicy::Batched { batch_size: 8 },
        }
    }
}

/// A fitted coefficient snapshot for both screen axes.
///
/// Coefficient vectors are intercept-first with length feature-len + 1.
/// Snapshots are immutable; refits publish a new snapshot instead of
/// mutating this one.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCoefficients {
    /// X-axis coefficients, intercept first.
    pub x: Vec<f64>,

    /// Y-axis coefficients, intercept first.
    pub y: Vec<f64>,
}

impl ModelCoefficients {
    /// Feature length this snapshot was fitted for.
    pub fn feature_len(&self) -> usize {
        self.x.len() - 1
    }

    /// Apply the fitted coefficients to a feature vector.
    ///
    /// Returns the predicted normalized (x, y). A feature-length
    /// mismatch is a configuration defect and aborts the operation.
    pub fn predict(&self, features: &FeatureVector) -> GazekitResult<(f64, f64)> {
        if features.len() != self.feature_len() {
            return Err(GazekitError::DimensionMismatch {
                expected: self.feature_len(),
                actual: features.len(),
            });
        }

        let apply = |coeffs: &[f64]| {
            coeffs[0]
                + coeffs[1..]
                    .iter()
                    .zip(features.values())
                    .map(|(c, f)| c * f)
                    .sum::<f64>()
        };

        Ok((apply(&self.x), apply(&self.y)))
    }
}

/// Relative singular-value cutoff below which a design matrix counts as
/// degenerate.
const SINGULARITY_EPS: f64 = 1e-10;

/// Fit both axes by ordinary least squares over the given samples.
///
/// The design matrix is `[1 | features]`; the two target columns are the
/// normalized x and y of each sample's calibration target. Solved via
/// SVD so rank deficiency is detected instead of producing garbage
/// coefficients.
pub fn fit_ols(samples: &[CalibrationSample]) -> Result<ModelCoefficients, FitSkip> {
    let rows = samples.len();
    let Some(first) = samples.first() else {
        return Err(FitSkip::InsufficientData);
    };
    let cols = first.features.len() + 1;
    if rows <= cols {
        return Err(FitSkip::InsufficientData);
    }

    let mut design = DMatrix::<f64>::zeros(rows, cols);
    let mut targets = DMatrix::<f64>::zeros(rows, 2);
    for (i, sample) in samples.iter().enumerate() {
        design[(i, 0)] = 1.0;
        for (j, &value) in sample.features.values().iter().enumerate() {
            design[(i, j + 1)] = value;
        }
        targets[(i, 0)] = sample.target.x;
        targets[(i, 1)] = sample.target.y;
    }

    let svd = design.svd(true, true);

    let max_sv = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let min_sv = svd
        .singular_values
        .iter()
        .cloned()
        .fold(f64::INFINITY, f64::min);
    if !max_sv.is_finite() || max_sv <= 0.0 || min_sv <= max_sv * SINGULARITY_EPS {
        return Err(FitSkip::SingularDesignMatrix);
    }

    let solution = svd
        .solve(&targets, max_sv * SINGULARITY_EPS)
        .map_err(|_| FitSkip::SingularDesignMatrix)?;

    let x: DVector<f64> = solution.column(0).into_owned();
    let y: DVector<f64> = solution.column(1).into_owned();

    Ok(ModelCoefficients {
        x: x.iter().cloned().collect(),
        y: y.iter().cloned().collect(),
    })
}

/// The incremental regression model: growing sample store plus the
/// published coefficient snapshot.
pub struct IncrementalRegressionModel {
    config: RegressionConfig,
    committed: Vec<CalibrationSample>,
    staging: VecDeque<CalibrationSample>,
    feature_len: Option<usize>,
    new_since_trigger: usize,
    slot: Arc<CoefficientSlot>,
}

impl IncrementalRegressionModel {
    /// Create a model with the given configuration.
    pub fn new(config: RegressionConfig) -> Self {
        let staging_capacity = config.staging_capacity.max(1);
        Self {
            config: RegressionConfig {
                staging_capacity,
                ..config
            },
            committed: Vec::new(),
            staging: VecDeque::with_capacity(staging_capacity),
            feature_len: None,
            new_since_trigger: 0,
            slot: Arc::new(CoefficientSlot::new()),
        }
    }

    /// Create a model with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RegressionConfig::default())
    }

    /// The shared coefficient slot read by predictors and written by
    /// refits.
    pub fn slot(&self) -> Arc<CoefficientSlot> {
        Arc::clone(&self.slot)
    }

    /// Add a provisional sample to staging, evicting the oldest staged
    /// sample at capacity.
    ///
    /// Returns `Ok(true)` when the retrain policy says a refit is due.
    /// The one error is a feature-length mismatch against the first
    /// sample ever added.
    pub fn add(&mut self, sample: CalibrationSample) -> GazekitResult<bool> {
        match self.feature_len {
            None => self.feature_len = Some(sample.features.len()),
            Some(expected) if expected != sample.features.len() => {
                return Err(GazekitError::DimensionMismatch {
                    expected,
                    actual: sample.features.len(),
                });
            }
            Some(_) => {}
        }

        if self.staging.len() == self.config.staging_capacity {
            self.staging.pop_front();
        }
        self.staging.push_back(sample);
        self.new_since_trigger += 1;

        let due = match self.config.retrain {
            RetrainPolicy::Always => true,
            RetrainPolicy::Batched { batch_size } => {
                self.new_since_trigger >= batch_size.max(1)
                    || self.staging.len() == self.config.staging_capacity
            }
        };
        if due {
            self.new_since_trigger = 0;
        }
        Ok(due)
    }

    /// Move all staging samples into the committed set.
    ///
    /// Invoked when the calibration sequencer advances: the samples for
    /// the current target are locked in.
    pub fn commit(&mut self) {
        self.committed.extend(self.staging.drain(..));
    }

    /// Snapshot of committed ∪ staging, the rows a fit runs over.
    pub fn training_rows(&self) -> Vec<CalibrationSample> {
        let mut rows = self.committed.clone();
        rows.extend(self.staging.iter().cloned());
        rows
    }

    /// Total samples currently held.
    pub fn sample_count(&self) -> usize {
        self.committed.len() + self.staging.len()
    }

    /// Committed samples currently held.
    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }

    /// Staged samples currently held.
    pub fn staging_count(&self) -> usize {
        self.staging.len()
    }

    /// Fit synchronously on the calling thread and publish on success.
    ///
    /// Skip conditions leave the previously published snapshot (and the
    /// fitted state) untouched.
    pub fn refit_now(&mut self) -> Result<(), FitSkip> {
        let ticket = self.slot.next_ticket();
        let rows = self.training_rows();
        let coefficients = fit_ols(&rows)?;
        self.slot.publish_ticketed(coefficients, ticket);
        tracing::debug!(rows = rows.len(), "Coefficients refitted");
        Ok(())
    }

    /// Whether a fitted snapshot has been published.
    pub fn is_fitted(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Predict the normalized gaze position for a feature vector.
    ///
    /// `Ok(None)` until a fit has been published; `Err` only on a
    /// feature-length mismatch.
    pub fn predict(&self, features: &FeatureVector) -> GazekitResult<Option<(f64, f64)>> {
        match self.slot.load() {
            Some(coefficients) => coefficients.predict(features).map(Some),
            None => Ok(None),
        }
    }

    /// Clear all samples and the published snapshot (session reset).
    pub fn reset(&mut self) {
        self.committed.clear();
        self.staging.clear();
        self.feature_len = None;
        self.new_since_trigger = 0;
        self.slot.clear();
    }
}
