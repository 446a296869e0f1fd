//! Cached, filtered gaze prediction.
//!
//! Wraps the published coefficient snapshot with three independently
//! toggleable behaviors: an exact-match LRU cache over raw model
//! output, a per-axis scalar Kalman filter, and a moving-average window
//! the caller can apply as an extra smoothing stage.
//!
//! The cache sits below the filter and stores raw regression output,
//! which is deterministic for a given snapshot — so toggling the cache
//! changes cost, never values. It is invalidated in full whenever the
//! snapshot generation changes.

use std::collections::VecDeque;
use std::sync::Arc;

use gazekit_common::GazekitResult;
use gazekit_gaze_model::FeatureVector;

use crate::trainer::CoefficientSlot;

/// Configuration for the gaze predictor.
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Whether to cache raw predictions by exact feature value.
    pub cache_enabled: bool,

    /// Maximum cached entries; least-recently-used entries are evicted.
    pub cache_capacity: usize,

    /// Whether to Kalman-filter the prediction stream.
    pub kalman_enabled: bool,

    /// Kalman process noise Q. Larger values trust new measurements more.
    pub kalman_process_noise: f64,

    /// Kalman measurement noise R. Larger values smooth harder.
    pub kalman_measurement_noise: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_capacity: 64,
            kalman_enabled: true,
            kalman_process_noise: 0.005,
            kalman_measurement_noise: 0.02,
        }
    }
}

/// A 1D Kalman filter with identity transition and observation models.
///
/// Removes jitter with less lag than a fixed-window average.
#[derive(Debug, Clone)]
pub struct ScalarKalman {
    estimate: Option<f64>,
    covariance: f64,
    process_noise: f64,
    measurement_noise: f64,
}

impl ScalarKalman {
    pub fn new(process_noise: f64, measurement_noise: f64) -> Self {
        Self {
            estimate: None,
            covariance: 1.0,
            process_noise,
            measurement_noise,
        }
    }

    /// Fold in a measurement and return the filtered estimate.
    ///
    /// The first measurement initializes the state and passes through.
    pub fn update(&mut self, measurement: f64) -> f64 {
        match self.estimate {
            None => {
                self.estimate = Some(measurement);
                self.covariance = 1.0;
                measurement
            }
            Some(previous) => {
                self.covariance += self.process_noise;
                let gain = self.covariance / (self.covariance + self.measurement_noise);
                let filtered = previous + gain * (measurement - previous);
                self.covariance *= 1.0 - gain;
                self.estimate = Some(filtered);
                filtered
            }
        }
    }

    /// Forget the filter state.
    pub fn reset(&mut self) {
        self.estimate = None;
        self.covariance = 1.0;
    }
}

/// A trailing moving-average over the last `window` predictions.
///
/// An additional smoothing stage the caller may apply on top of raw or
/// Kalman-filtered output.
#[derive(Debug, Clone)]
pub struct MovingAverageWindow {
    window: usize,
    buffer: VecDeque<(f64, f64)>,
}

impl MovingAverageWindow {
    /// Create a window of the given size (at least 1).
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            buffer: VecDeque::with_capacity(window),
        }
    }

    /// Push a prediction and return the average over the current window.
    pub fn push(&mut self, x: f64, y: f64) -> (f64, f64) {
        if self.buffer.len() == self.window {
            self.buffer.pop_front();
        }
        self.buffer.push_back((x, y));

        let count = self.buffer.len() as f64;
        let sum_x: f64 = self.buffer.iter().map(|(x, _)| x).sum();
        let sum_y: f64 = self.buffer.iter().map(|(_, y)| y).sum();
        (sum_x / count, sum_y / count)
    }

    /// Drop all buffered predictions.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

/// Bounded exact-match cache with least-recently-used eviction.
///
/// Keys are the bit patterns of the feature values; nothing in the pack
/// needs more than this handful of entries, so lookup is a linear scan.
#[derive(Debug)]
struct LruCache {
    capacity: usize,
    entries: VecDeque<(Vec<u64>, (f64, f64))>,
}

impl LruCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    fn get(&mut self, key: &[u64]) -> Option<(f64, f64)> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(position)?;
        let value = entry.1;
        self.entries.push_front(entry);
        Some(value)
    }

    fn insert(&mut self, key: Vec<u64>, value: (f64, f64)) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front((key, value));
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Applies the published coefficients to feature vectors, with caching
/// and filtering per configuration.
pub struct GazePredictor {
    config: PredictorConfig,
    slot: Arc<CoefficientSlot>,
    cache: LruCache,
    cache_generation: u64,
    kalman_x: ScalarKalman,
    kalman_y: ScalarKalman,
}

impl GazePredictor {
    /// Create a predictor reading from the given coefficient slot.
    pub fn new(slot: Arc<CoefficientSlot>, config: PredictorConfig) -> Self {
        let kalman_x = ScalarKalman::new(config.kalman_process_noise, config.kalman_measurement_noise);
        let kalman_y = ScalarKalman::new(config.kalman_process_noise, config.kalman_measurement_noise);
        Self {
            cache: LruCache::new(config.cache_capacity),
            cache_generation: slot.generation(),
            config,
            slot,
            kalman_x,
            kalman_y,
        }
    }

    /// Predict the normalized gaze position for a feature vector.
    ///
    /// `Ok(None)` while no fit has been published. `Err` only on a
    /// feature-length mismatch against the fitted snapshot.
    pub fn predict(&mut self, features: &FeatureVector) -> GazekitResult<Option<(f64, f64)>> {
        // A refit invalidates every cached entry at once. The generation
        // is read before the snapshot: a publish racing between the two
        // reads then costs one spurious invalidation on the next call,
        // never a stale cached value.
        let generation = self.slot.generation();
        if generation != self.cache_generation {
            self.cache.clear();
            self.cache_generation = generation;
        }

        let Some(coefficients) = self.slot.load() else {
            return Ok(None);
        };

        let raw = if self.config.cache_enabled {
            let key = features.bit_key();
            match self.cache.get(&key) {
                Some(hit) => hit,
                None => {
                    let value = coefficients.predict(features)?;
                    self.cache.insert(key, value);
                    value
                }
            }
        } else {
            coefficients.predict(features)?
        };

        let output = if self.config.kalman_enabled {
            (self.kalman_x.update(raw.0), self.kalman_y.update(raw.1))
        } else {
            raw
        };

        Ok(Some(output))
    }

    /// Clear the cache and filter state (session reset).
    pub fn reset(&mut self) {
        self.cache.clear();
        self.kalman_x.reset();
        self.kalman_y.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::ModelCoefficients;

    fn fitted_slot(x: Vec<f64>, y: Vec<f64>) -> Arc<CoefficientSlot> {
        let slot = Arc::new(CoefficientSlot::new());
        let ticket = slot.next_ticket();
        slot.publish_ticketed(ModelCoefficients { x, y }, ticket);
        slot
    }

    fn raw_config() -> PredictorConfig {
        PredictorConfig {
            kalman_enabled: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_unfitted_slot_predicts_none() {
        let slot = Arc::new(CoefficientSlot::new());
        let mut predictor = GazePredictor::new(slot, PredictorConfig::default());
        let result = predictor.predict(&FeatureVector::new(vec![0.5, 0.5]));
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_cached_prediction_is_stable_and_cache_neutral() {
        let slot = fitted_slot(vec![0.1, 0.5, -0.2], vec![0.2, 0.3, 0.4]);
        let features = FeatureVector::new(vec![0.4, 0.6]);

        let mut cached = GazePredictor::new(Arc::clone(&slot), raw_config());
        let first = cached.predict(&features).unwrap().unwrap();
        let second = cached.predict(&features).unwrap().unwrap();
        assert_eq!(first, second);

        let mut uncached = GazePredictor::new(
            slot,
            PredictorConfig {
                cache_enabled: false,
                ..raw_config()
            },
        );
        let direct = uncached.predict(&features).unwrap().unwrap();
        assert_eq!(first, direct);
    }

    #[test]
    fn test_refit_invalidates_cache() {
        let slot = fitted_slot(vec![0.0, 1.0], vec![0.0, 1.0]);
        let features = FeatureVector::new(vec![0.5]);

        let mut predictor = GazePredictor::new(Arc::clone(&slot), raw_config());
        let before = predictor.predict(&features).unwrap().unwrap();
        assert!((before.0 - 0.5).abs() < 1e-9);

        // New snapshot doubles the slope; the cached entry must not survive
        let ticket = slot.next_ticket();
        slot.publish_ticketed(
            ModelCoefficients {
                x: vec![0.0, 2.0],
                y: vec![0.0, 2.0],
            },
            ticket,
        );

        let after = predictor.predict(&features).unwrap().unwrap();
        assert!((after.0 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_lru_eviction_keeps_recent_entries() {
        let mut cache = LruCache::new(2);
        cache.insert(vec![1], (1.0, 1.0));
        cache.insert(vec![2], (2.0, 2.0));

        // Touch key 1 so key 2 becomes the eviction candidate
        assert!(cache.get(&[1]).is_some());
        cache.insert(vec![3], (3.0, 3.0));

        assert!(cache.get(&[1]).is_some());
        assert!(cache.get(&[2]).is_none());
        assert!(cache.get(&[3]).is_some());
    }

    #[test]
    fn test_kalman_reduces_jitter() {
        let mut kalman = ScalarKalman::new(0.005, 0.04);

        // Jittery measurements around 0.5
        let measurements = [0.50, 0.53, 0.48, 0.52, 0.49, 0.51, 0.50];
        let mut filtered = Vec::new();
        for &m in &measurements {
            filtered.push(kalman.update(m));
        }

        // Filtered values hug the center tighter than the raw jitter
        for &f in &filtered[2..] {
            assert!((f - 0.5).abs() < 0.02, "filtered value {f} too far from center");
        }
    }

    #[test]
    fn test_kalman_first_measurement_passes_through() {
        let mut kalman = ScalarKalman::new(0.01, 0.01);
        assert_eq!(kalman.update(0.42), 0.42);
    }

    #[test]
    fn test_moving_average_window() {
        let mut window = MovingAverageWindow::new(3);
        assert_eq!(window.push(3.0, 30.0), (3.0, 30.0));
        assert_eq!(window.push(6.0, 60.0), (4.5, 45.0));
        let (x, y) = window.push(9.0, 90.0);
        assert!((x - 6.0).abs() < 1e-9);
        assert!((y - 60.0).abs() < 1e-9);

        // Window slides: oldest sample drops out
        let (x, _) = window.push(12.0, 120.0);
        assert!((x - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_mismatch_propagates() {
        let slot = fitted_slot(vec![0.0, 1.0], vec![0.0, 1.0]);
        let mut predictor = GazePredictor::new(slot, raw_config());
        let result = predictor.predict(&FeatureVector::new(vec![0.5, 0.6]));
        assert!(result.is_err());
    }
}
