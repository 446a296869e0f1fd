//! Feature vectors and calibration samples.
//!
//! A feature vector is the fixed-dimension numeric encoding of one
//! frame's eye geometry, already compensated for head position and
//! scale. Its length is constant for the lifetime of a session.

use serde::{Deserialize, Serialize};

use crate::geometry::TargetPoint;

/// A fixed-length real-valued feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw feature values.
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// A stable hash key over the exact bit patterns of the values.
    ///
    /// Two vectors produce the same key iff they are bitwise identical,
    /// which is what exact-match prediction caching needs (f64 itself is
    /// not `Eq`/`Hash`).
    pub fn bit_key(&self) -> Vec<u64> {
        self.0.iter().map(|v| v.to_bits()).collect()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// One calibration observation: the features seen while the user looked
/// at a known target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    /// Head-compensated eye features for the frame.
    pub features: FeatureVector,

    /// The normalized on-screen target the user was looking at.
    pub target: TargetPoint,
}

impl CalibrationSample {
    pub fn new(features: FeatureVector, target: TargetPoint) -> Self {
        Self { features, target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_key_distinguishes_values() {
        let a = FeatureVector::new(vec![1.0, 2.0]);
        let b = FeatureVector::new(vec![1.0, 2.0]);
        let c = FeatureVector::new(vec![1.0, 2.0 + 1e-15]);

        assert_eq!(a.bit_key(), b.bit_key());
        assert_ne!(a.bit_key(), c.bit_key());
    }

    #[test]
    fn test_sample_roundtrip() {
        let sample = CalibrationSample::new(
            FeatureVector::new(vec![0.1, 0.2, 0.3]),
            TargetPoint::new(0.5, 0.5),
        );
        let json = serde_json::to_string(&sample).unwrap();
        let parsed: CalibrationSample = serde_json::from_str(&json).unwrap();
        assert_eq!(sample, parsed);
    }
}
